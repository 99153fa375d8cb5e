use serde::Serialize;
use thiserror::Error;

use crate::value::Value;

/// One entry in a validation report.
///
/// Validators return a (possibly empty) list of these instead of failing on
/// the first problem; a wrapper may convert a nonempty list into a hard error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub message: String,
    /// Path into the offending document, root first (e.g. `["select", "home"]`).
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            message: message.into(),
            path,
            code: None,
            value: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path.join("."), self.message)
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema document is not valid JSON for a schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("schema violates {} invariant(s): {}", .0.len(), format_list(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_list(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
