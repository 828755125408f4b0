use std::fmt;

use serde::Serialize;

/// One rejected input field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field-level validation messages carried by [`CoreError::Validation`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a single failing field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Append every error from `other`, prefixing its field names.
    ///
    /// Used for batch input where each record is validated on its own,
    /// e.g. prefix `[2]` turns `title` into `[2].title`.
    pub fn extend_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        for error in other.0 {
            self.0.push(FieldError {
                field: format!("{prefix}.{}", error.field),
                message: error.message,
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was collected, otherwise a validation error.
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

/// Translate `validator` output into field-level messages.
///
/// Fields are sorted by name so messages are stable across runs. When a rule
/// has no custom message, its code is used instead.
impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<(String, Vec<String>)> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = FieldErrors::new();
        for (field, messages) in fields {
            for message in messages {
                out.push(field.clone(), message);
            }
        }
        out
    }
}

/// Every failure the movie catalog reports to its callers.
///
/// Store and driver errors are always translated into one of these kinds
/// before leaving the data-access layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("{entity} with {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store temporarily unavailable: {0}")]
    TransientStore(String),

    #[error("Malformed search output: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Validation failure on a single field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "Name is required."))]
        name: String,
        #[validate(range(min = 0, max = 5))]
        score: i32,
    }

    #[test]
    fn display_joins_fields_in_order() {
        let mut errors = FieldErrors::new();
        errors.push("title", "Title is required.");
        errors.push("rating", "out of range");
        assert_eq!(
            errors.to_string(),
            "title: Title is required.; rating: out of range"
        );
    }

    #[test]
    fn prefixed_extension_qualifies_field_names() {
        let mut all = FieldErrors::new();
        all.extend_prefixed("[1]", FieldErrors::single("genre", "too long"));
        let first = all.iter().next().unwrap();
        assert_eq!(first.field, "[1].genre");
        assert_eq!(first.message, "too long");
    }

    #[test]
    fn empty_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn validator_errors_use_message_then_code() {
        let probe = Probe {
            name: String::new(),
            score: 9,
        };
        let errors: FieldErrors = probe.validate().unwrap_err().into();
        let collected: Vec<_> = errors
            .iter()
            .map(|e| (e.field.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(
            collected,
            vec![("name", "Name is required."), ("score", "range")]
        );
    }

    #[test]
    fn not_found_message_names_entity_and_key() {
        let err = CoreError::not_found("Movie", "SID 'MOV0000000'");
        assert_eq!(err.to_string(), "Movie with SID 'MOV0000000' not found");
    }
}
