//! Movie lifecycle status stored in `movies.status` (SMALLINT).

use marquee_core::types::StatusId;
use serde::{Deserialize, Serialize};

/// Soft-delete flag. Rows are never removed; deletion flips this to `Deleted`.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieStatus {
    #[default]
    Active = 1,
    Deleted = 2,
}

impl MovieStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }
}

impl From<MovieStatus> for StatusId {
    fn from(value: MovieStatus) -> Self {
        value as StatusId
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_match_check_constraint() {
        assert_eq!(MovieStatus::Active.id(), 1);
        assert_eq!(StatusId::from(MovieStatus::Deleted), 2);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(MovieStatus::Deleted).unwrap(),
            serde_json::json!("deleted")
        );
    }
}
