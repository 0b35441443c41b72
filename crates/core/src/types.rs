/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque identifier the backend assigns to a queued generation job.
pub type JobId = String;
