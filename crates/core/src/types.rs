/// Internal row identifier (PostgreSQL BIGSERIAL). Never leaves the service.
pub type DbId = i64;

/// Status discriminant stored as SMALLINT.
pub type StatusId = i16;

/// All timestamps are UTC with microsecond precision once persisted.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
