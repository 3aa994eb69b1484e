use thiserror::Error;

/// Errors produced while parsing a criteria payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    /// Payload was not a JSON object.
    #[error("criteria must be an object of boolean fields")]
    NotAnObject,

    /// Object contained none of the 30 criterion names.
    #[error("criteria object with 30 boolean fields is required")]
    NoRecognisedFields,

    /// A known criterion carried a non-boolean value.
    #[error("criterion '{field}' must be a boolean")]
    NotABoolean { field: String },

    /// Name did not match any criterion.
    #[error("unknown criterion: {name}")]
    UnknownCriterion { name: String },
}
