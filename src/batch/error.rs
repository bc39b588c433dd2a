use thiserror::Error;

// Everything except ValidationRejected fails the chunk and rolls back its transaction.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("unrecognized record type: {record}")]
    UnrecognizedRecordType { record: String },

    #[error("layout {pattern:?} expects {expected} fields but line {line_number} has {actual}")]
    IncorrectTokenCount {
        pattern: String,
        line_number: usize,
        expected: usize,
        actual: usize,
    },

    #[error("field {field:?} has malformed value {value:?}: {reason}")]
    MalformedField {
        field: String,
        value: String,
        reason: String,
    },

    #[error("field {field:?} is not declared by layout {pattern:?}")]
    MissingField { field: String, pattern: String },

    #[error("no writer registered for record kind {kind}")]
    UnroutableRecord { kind: String },

    #[error("{entity} id {id} was not found in reference data")]
    ValidationRejected { entity: &'static str, id: i64 },

    #[error("reference lookup for {entity} id {id} failed")]
    ReferenceLookup {
        entity: &'static str,
        id: i64,
        #[source]
        source: rusqlite::Error,
    },

    #[error("writer {writer} failed on item {index}")]
    WriteFailure {
        writer: &'static str,
        index: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("writer {writer} updated no rows for item {index}")]
    NoRowsAffected { writer: &'static str, index: usize },

    #[error("failed to {action} chunk transaction")]
    Transaction {
        action: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to read input")]
    Read(#[from] std::io::Error),

    #[error("input is not a valid JSON array")]
    InvalidJson(#[from] serde_json::Error),

    #[error("JSON array element {index} is invalid")]
    InvalidJsonElement {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid batch configuration: {0}")]
    InvalidConfig(String),

    #[error("step {step} aborted during chunk {chunk}")]
    Aborted { step: String, chunk: usize },
}

impl BatchError {
    pub fn is_chunk_fatal(&self) -> bool {
        !matches!(self, BatchError::ValidationRejected { .. })
    }

    pub(crate) fn malformed(field: &str, value: &str, reason: impl ToString) -> Self {
        BatchError::MalformedField {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type BatchResult<T> = Result<T, BatchError>;
