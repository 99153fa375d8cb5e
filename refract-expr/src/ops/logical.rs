use refract_api::Value;

use crate::engine::{ControlOperation, Expr, ExpressionEngine, Operation};
use crate::error::{ExprError, Result};

/// `{"and": [..predicates]}`.
///
/// The input-threading form short-circuits: operand expressions are applied
/// left to right and evaluation stops at the first falsy result. The
/// self-contained form reduces the whole operand first and then folds the
/// resulting booleans — the two forms serve different call sites and are
/// deliberately not unified.
pub struct And;

impl ControlOperation for And {
    fn name(&self) -> &'static str {
        "and"
    }

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value> {
        let branches = expr_array(self.name(), operand)?;
        for branch in branches {
            if !engine.apply(branch, input)?.is_truthy() {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    }

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let reduced = engine.evaluate(operand)?;
        let booleans = reduced
            .as_array()
            .ok_or_else(|| ExprError::type_error(self.name(), "an array of booleans", &reduced))?;
        Ok(Value::Bool(booleans.iter().all(Value::is_truthy)))
    }

    fn normalize_where(
        &self,
        attribute: Option<&str>,
        operand: &serde_json::Value,
        engine: &ExpressionEngine,
    ) -> Option<Result<serde_json::Value>> {
        Some(distribute_branches(self.name(), attribute, operand, engine))
    }
}

/// `{"or": [..predicates]}` — see [`And`] for the two evaluation forms.
pub struct Or;

impl ControlOperation for Or {
    fn name(&self) -> &'static str {
        "or"
    }

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value> {
        let branches = expr_array(self.name(), operand)?;
        for branch in branches {
            if engine.apply(branch, input)?.is_truthy() {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    }

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let reduced = engine.evaluate(operand)?;
        let booleans = reduced
            .as_array()
            .ok_or_else(|| ExprError::type_error(self.name(), "an array of booleans", &reduced))?;
        Ok(Value::Bool(booleans.iter().any(Value::is_truthy)))
    }

    fn normalize_where(
        &self,
        attribute: Option<&str>,
        operand: &serde_json::Value,
        engine: &ExpressionEngine,
    ) -> Option<Result<serde_json::Value>> {
        Some(distribute_branches(self.name(), attribute, operand, engine))
    }
}

/// `{"not": predicate}` — truthiness negation of the reduced operand.
pub struct Not;

impl Operation for Not {
    fn name(&self) -> &'static str {
        "not"
    }

    fn apply(&self, operand: &Value, _input: &Value) -> Result<Value> {
        Ok(Value::Bool(!operand.is_truthy()))
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        Ok(Value::Bool(!operand.is_truthy()))
    }

    fn normalize_where(
        &self,
        attribute: Option<&str>,
        operand: &serde_json::Value,
        engine: &ExpressionEngine,
    ) -> Option<Result<serde_json::Value>> {
        Some(
            engine
                .normalize_where_node(operand, attribute)
                .map(|inner| serde_json::json!({ "not": inner })),
        )
    }
}

/// Distributes the attribute context of a where clause into every branch of
/// a logical operand array.
fn distribute_branches(
    op: &'static str,
    attribute: Option<&str>,
    operand: &serde_json::Value,
    engine: &ExpressionEngine,
) -> Result<serde_json::Value> {
    let branches = operand.as_array().ok_or(ExprError::Type {
        op,
        expected: "an array of where clauses",
        got: "non-array operand".to_string(),
    })?;
    let normalized = branches
        .iter()
        .map(|branch| engine.normalize_where_node(branch, attribute))
        .collect::<Result<Vec<_>>>()?;
    let mut out = serde_json::Map::new();
    out.insert(op.to_string(), serde_json::Value::Array(normalized));
    Ok(serde_json::Value::Object(out))
}

pub(crate) fn expr_array<'e>(op: &'static str, operand: &'e Expr) -> Result<&'e [Expr]> {
    match operand {
        Expr::Array(items) => Ok(items),
        _ => Err(ExprError::Type {
            op,
            expected: "an array of expressions",
            got: "non-array operand".to_string(),
        }),
    }
}
