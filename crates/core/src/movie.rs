//! Movie field rules, SID generation and timestamp helpers.
//!
//! Pure logic only, so the same rules back request validation at the HTTP
//! boundary and the checks the orchestrator runs before touching the store.

use std::borrow::Cow;
use std::collections::HashSet;

use chrono::{NaiveDate, SubsecRound, Utc};
use validator::ValidationError;

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Field limits
// ---------------------------------------------------------------------------

pub const TITLE_MAX_LEN: u64 = 255;
pub const GENRE_MAX_LEN: u64 = 100;
pub const DIRECTOR_MAX_LEN: u64 = 150;
pub const REVIEW_MAX_LEN: u64 = 1000;

pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 10.0;

// ---------------------------------------------------------------------------
// SID
// ---------------------------------------------------------------------------

/// Every public movie identifier starts with this prefix.
pub const SID_PREFIX: &str = "MOV";

/// Number of uppercase hex characters following [`SID_PREFIX`].
pub const SID_SUFFIX_LEN: usize = 7;

/// Total SID length; matches the `movies.sid` column width.
pub const SID_LEN: usize = SID_PREFIX.len() + SID_SUFFIX_LEN;

/// Generate a fresh public SID, e.g. `MOV3FA91C0`.
///
/// The suffix is taken from a random v4 UUID. Uniqueness is ultimately
/// enforced by the `uq_movies_sid` constraint.
pub fn generate_sid() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    format!("{SID_PREFIX}{}", &hex[..SID_SUFFIX_LEN])
}

/// Check that `sid` has the shape produced by [`generate_sid`].
pub fn is_valid_sid(sid: &str) -> bool {
    sid.len() == SID_LEN
        && sid.starts_with(SID_PREFIX)
        && sid[SID_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
}

// ---------------------------------------------------------------------------
// Custom validators (used by `#[validate(custom(...))]` on request DTOs)
// ---------------------------------------------------------------------------

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Reject values that are empty after trimming whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule_error("blank", "Value must not be blank."));
    }
    Ok(())
}

/// Release dates may not lie in the future (compared against today in UTC).
pub fn validate_release_date(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date > Utc::now().date_naive() {
        return Err(rule_error(
            "future_date",
            "Release date cannot be in the future.",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

/// Round a rating to the one fractional digit stored by `NUMERIC(3,1)`.
pub fn round_rating(rating: f64) -> f64 {
    (rating * 10.0).round() / 10.0
}

/// Key used to compare titles; matches the store's `lower(title)` index.
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Return the first title that occurs more than once (case-insensitive).
pub fn find_duplicate_title<'a, I>(titles: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    titles
        .into_iter()
        .find(|title| !seen.insert(title_key(title)))
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Current time truncated to the microsecond precision PostgreSQL stores.
pub fn now_micros() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Next `modified_at` value for a row last modified at `previous`.
///
/// Always strictly later than `previous`, even when the wall clock has not
/// moved past it at microsecond resolution.
pub fn next_modified_at(previous: Timestamp) -> Timestamp {
    let now = now_micros();
    let floor = previous + chrono::Duration::microseconds(1);
    if now > previous {
        now
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- SID ------------------------------------------------------------------

    #[test]
    fn generated_sid_has_prefix_and_length() {
        let sid = generate_sid();
        assert_eq!(sid.len(), SID_LEN);
        assert!(sid.starts_with("MOV"));
        assert!(is_valid_sid(&sid), "{sid} should be valid");
    }

    #[test]
    fn generated_sids_differ() {
        let sids: HashSet<String> = (0..200).map(|_| generate_sid()).collect();
        assert_eq!(sids.len(), 200);
    }

    #[test]
    fn sid_rejects_wrong_shape() {
        assert!(!is_valid_sid("MOV12345"));
        assert!(!is_valid_sid("XYZ1234567"));
        assert!(!is_valid_sid("MOV123456g"));
        assert!(!is_valid_sid("MOV12345678"));
        assert!(is_valid_sid("MOV0A1B2C3"));
    }

    // -- Validators -------------------------------------------------------------

    #[test]
    fn blank_values_rejected() {
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("Heat").is_ok());
    }

    #[test]
    fn future_release_date_rejected() {
        let tomorrow = Utc::now().date_naive() + chrono::Duration::days(1);
        let err = validate_release_date(&tomorrow).unwrap_err();
        assert_eq!(err.code, "future_date");

        let today = Utc::now().date_naive();
        assert!(validate_release_date(&today).is_ok());
    }

    // -- Normalisation ------------------------------------------------------------

    #[test]
    fn rating_rounds_to_one_digit() {
        assert_eq!(round_rating(8.84), 8.8);
        assert_eq!(round_rating(8.86), 8.9);
        assert_eq!(round_rating(10.0), 10.0);
    }

    #[test]
    fn duplicate_titles_detected_case_insensitively() {
        let titles = ["Heat", "Alien", " heat "];
        assert_eq!(find_duplicate_title(titles), Some(" heat "));
        assert_eq!(find_duplicate_title(["Heat", "Alien"]), None);
    }

    // -- Timestamps -----------------------------------------------------------------

    #[test]
    fn now_has_microsecond_precision() {
        let now = now_micros();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn next_modified_at_always_advances() {
        let future = now_micros() + chrono::Duration::seconds(60);
        let next = next_modified_at(future);
        assert!(next > future);

        let past = now_micros() - chrono::Duration::seconds(60);
        assert!(next_modified_at(past) > past);
    }
}
