/// Primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar day an alert or slot refers to (no time zone attached).
pub type BookDate = chrono::NaiveDate;

/// Wire format of dates exchanged with the reservation service.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
