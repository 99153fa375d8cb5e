use chrono::Utc;
use refract_api::Value;

use crate::engine::Operation;
use crate::error::Result;

/// `{"now": null}` — the current instant as an RFC 3339 string.
pub struct Now;

impl Operation for Now {
    fn name(&self) -> &'static str {
        "now"
    }

    fn apply(&self, _operand: &Value, _input: &Value) -> Result<Value> {
        Ok(Value::String(Utc::now().to_rfc3339()))
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        self.apply(operand, &Value::Undefined)
    }
}

/// `{"timestamp": null}` — the current instant as epoch milliseconds.
pub struct Timestamp;

impl Operation for Timestamp {
    fn name(&self) -> &'static str {
        "timestamp"
    }

    fn apply(&self, _operand: &Value, _input: &Value) -> Result<Value> {
        Ok(Value::Int(Utc::now().timestamp_millis()))
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        self.apply(operand, &Value::Undefined)
    }
}
