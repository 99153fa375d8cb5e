use refract_api::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExprError>;

#[derive(Debug, Error)]
pub enum ExprError {
    #[error("unknown operation \"{0}\"")]
    UnknownOperation(String),

    #[error("{op}: expected {expected}, got {got}")]
    Type {
        op: &'static str,
        expected: &'static str,
        got: String,
    },

    #[error("{op}: division by zero")]
    DivisionByZero { op: &'static str },

    #[error("{op}: integer overflow")]
    Overflow { op: &'static str },

    #[error("{op}: invalid pattern: {source}")]
    Pattern {
        op: &'static str,
        source: regex::Error,
    },

    #[error("arrays are not valid where clauses")]
    WhereArray,

    #[error("invalid where clause: {0}")]
    Where(String),
}

impl ExprError {
    /// Type error naming the operation and the violated expectation.
    pub fn type_error(op: &'static str, expected: &'static str, got: &Value) -> Self {
        ExprError::Type {
            op,
            expected,
            got: got.kind().to_string(),
        }
    }
}
