use thiserror::Error;

/// A record that cannot be identified or displayed; it is left out of the roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecordError {
    #[error("record is missing a student id")]
    MissingId,
    #[error("record {id} is missing a name")]
    MissingName { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no student with id {0}")]
    StudentNotFound(String),
}
