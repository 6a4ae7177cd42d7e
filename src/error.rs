use uuid::Uuid;

/// Failures surfaced by a [`crate::backend::SchedulingBackend`].
///
/// Fetch failures are hard errors for the caller: slot resolution must not
/// run on partial data. A booking conflict is an expected outcome of a lost
/// race and maps to 409 at the HTTP layer.
#[derive(Debug)]
pub enum BackendError {
    RuleNotFound(Uuid),
    BookingConflict { existing: Uuid },
    Database(String),
    Connection(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::RuleNotFound(id) => write!(f, "availability rule not found: {id}"),
            BackendError::BookingConflict { existing } => {
                write!(f, "requested window overlaps existing booking {existing}")
            }
            BackendError::Database(e) => write!(f, "database error: {e}"),
            BackendError::Connection(e) => write!(f, "database connection error: {e}"),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<diesel::result::Error> for BackendError {
    fn from(e: diesel::result::Error) -> Self {
        BackendError::Database(e.to_string())
    }
}
