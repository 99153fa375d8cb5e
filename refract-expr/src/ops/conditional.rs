use refract_api::{Value, values_equal};

use crate::engine::{ControlOperation, Expr, ExpressionEngine};
use crate::error::{ExprError, Result};

/// `{"if": {"if": cond, "then": a, "else": b}}` — only the taken branch is
/// evaluated. A missing `else` yields `Undefined`.
pub struct If;

impl If {
    fn branches<'e>(&self, operand: &'e Expr) -> Result<(&'e Expr, Option<&'e Expr>, Option<&'e Expr>)> {
        let Expr::Object(map) = operand else {
            return Err(ExprError::Type {
                op: self.name(),
                expected: "an {if, then, else} operand",
                got: "non-object operand".to_string(),
            });
        };
        let cond = map.get("if").ok_or(ExprError::Type {
            op: self.name(),
            expected: "an operand with an \"if\" branch",
            got: "object without \"if\"".to_string(),
        })?;
        Ok((cond, map.get("then"), map.get("else")))
    }
}

impl ControlOperation for If {
    fn name(&self) -> &'static str {
        "if"
    }

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value> {
        let (cond, then, otherwise) = self.branches(operand)?;
        let taken = if engine.apply(cond, input)?.is_truthy() {
            then
        } else {
            otherwise
        };
        taken.map_or(Ok(Value::Undefined), |branch| engine.apply(branch, input))
    }

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let (cond, then, otherwise) = self.branches(operand)?;
        let taken = if engine.evaluate(cond)?.is_truthy() {
            then
        } else {
            otherwise
        };
        taken.map_or(Ok(Value::Undefined), |branch| engine.evaluate(branch))
    }

    fn normalize_where(
        &self,
        attribute: Option<&str>,
        operand: &serde_json::Value,
        engine: &ExpressionEngine,
    ) -> Option<Result<serde_json::Value>> {
        Some(normalize_if(attribute, operand, engine))
    }
}

fn normalize_if(
    attribute: Option<&str>,
    operand: &serde_json::Value,
    engine: &ExpressionEngine,
) -> Result<serde_json::Value> {
    let map = operand
        .as_object()
        .ok_or_else(|| ExprError::Where("\"if\" takes an {if, then, else} operand".to_string()))?;
    let cond = map
        .get("if")
        .ok_or_else(|| ExprError::Where("\"if\" requires an \"if\" branch".to_string()))?;
    let mut out = serde_json::Map::new();
    out.insert("if".to_string(), engine.normalize_where_node(cond, attribute)?);
    for key in ["then", "else"] {
        if let Some(branch) = map.get(key) {
            out.insert(key.to_string(), normalize_branch(branch, attribute, engine)?);
        }
    }
    Ok(serde_json::json!({ "if": out }))
}

/// `then`/`else` pass through untouched unless they are themselves condition
/// objects (plain attribute-keyed objects), which are normalized in context.
fn normalize_branch(
    branch: &serde_json::Value,
    attribute: Option<&str>,
    engine: &ExpressionEngine,
) -> Result<serde_json::Value> {
    if branch.is_object() && !engine.is_expression(branch) {
        engine.normalize_where_node(branch, attribute)
    } else {
        Ok(branch.clone())
    }
}

/// `{"case": {"value": v, "cases": [{"when": w, "then": t}, ..], "default": d}}`.
///
/// The discriminant is applied first; each `when` is either an expression
/// (applied with the discriminant as input, truthiness decides) or a plain
/// value compared for deep equality. Only the matching `then` evaluates.
pub struct Case;

impl Case {
    fn parts<'e>(
        &self,
        operand: &'e Expr,
    ) -> Result<(&'e Expr, &'e [Expr], Option<&'e Expr>)> {
        let Expr::Object(map) = operand else {
            return Err(ExprError::Type {
                op: self.name(),
                expected: "a {value, cases, default} operand",
                got: "non-object operand".to_string(),
            });
        };
        let value = map.get("value").ok_or(ExprError::Type {
            op: self.name(),
            expected: "an operand with a \"value\" branch",
            got: "object without \"value\"".to_string(),
        })?;
        let cases = match map.get("cases") {
            Some(Expr::Array(items)) => items.as_slice(),
            Some(_) => {
                return Err(ExprError::Type {
                    op: self.name(),
                    expected: "\"cases\" to be an array",
                    got: "non-array cases".to_string(),
                });
            }
            None => &[],
        };
        Ok((value, cases, map.get("default")))
    }

    fn case_branches<'e>(&self, case: &'e Expr) -> Result<(&'e Expr, &'e Expr)> {
        let Expr::Object(map) = case else {
            return Err(ExprError::Type {
                op: self.name(),
                expected: "each case to be a {when, then} object",
                got: "non-object case".to_string(),
            });
        };
        match (map.get("when"), map.get("then")) {
            (Some(when), Some(then)) => Ok((when, then)),
            _ => Err(ExprError::Type {
                op: self.name(),
                expected: "each case to carry \"when\" and \"then\"",
                got: "incomplete case".to_string(),
            }),
        }
    }
}

impl ControlOperation for Case {
    fn name(&self) -> &'static str {
        "case"
    }

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value> {
        let (value, cases, default) = self.parts(operand)?;
        let discriminant = engine.apply(value, input)?;
        for case in cases {
            let (when, then) = self.case_branches(case)?;
            let matched = match when {
                Expr::Call { .. } => engine.apply(when, &discriminant)?.is_truthy(),
                _ => values_equal(&engine.apply(when, input)?, &discriminant),
            };
            if matched {
                return engine.apply(then, input);
            }
        }
        default.map_or(Ok(Value::Undefined), |branch| engine.apply(branch, input))
    }

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let (value, cases, default) = self.parts(operand)?;
        let discriminant = engine.evaluate(value)?;
        for case in cases {
            let (when, then) = self.case_branches(case)?;
            let matched = match when {
                Expr::Call { .. } => engine.apply(when, &discriminant)?.is_truthy(),
                _ => values_equal(&engine.evaluate(when)?, &discriminant),
            };
            if matched {
                return engine.evaluate(then);
            }
        }
        default.map_or(Ok(Value::Undefined), |branch| engine.evaluate(branch))
    }

    fn normalize_where(
        &self,
        attribute: Option<&str>,
        operand: &serde_json::Value,
        engine: &ExpressionEngine,
    ) -> Option<Result<serde_json::Value>> {
        Some(normalize_case(attribute, operand, engine))
    }
}

/// In where position, `case` gains its discriminant from context: an explicit
/// `value` passes through, otherwise the attribute getter becomes the value.
/// `cases` and `default` pass through untouched.
fn normalize_case(
    attribute: Option<&str>,
    operand: &serde_json::Value,
    _engine: &ExpressionEngine,
) -> Result<serde_json::Value> {
    let map = operand.as_object().ok_or_else(|| {
        ExprError::Where("\"case\" takes a {value, cases, default} operand".to_string())
    })?;
    let value = match (map.get("value"), attribute) {
        (Some(value), _) => value.clone(),
        (None, Some(attr)) => serde_json::json!({ "get": attr }),
        (None, None) => {
            return Err(ExprError::Where(
                "\"case\" at the root of a where clause requires a \"value\"".to_string(),
            ));
        }
    };
    let mut out = serde_json::Map::new();
    out.insert("value".to_string(), value);
    if let Some(cases) = map.get("cases") {
        out.insert("cases".to_string(), cases.clone());
    }
    if let Some(default) = map.get("default") {
        out.insert("default".to_string(), default.clone());
    }
    Ok(serde_json::json!({ "case": out }))
}
