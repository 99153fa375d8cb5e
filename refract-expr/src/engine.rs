use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use refract_api::Value;

use crate::error::{ExprError, Result};
use crate::ops;

/// A parsed expression tree.
///
/// Raw JSON is classified exactly once by [`ExpressionEngine::parse`]: a
/// one-key object whose key is a registered operation becomes [`Expr::Call`],
/// the `literal` escape hatch becomes [`Expr::Literal`] verbatim, and every
/// other composite is walked structurally. After parse, "is this an
/// expression" is a structural distinction, never a runtime heuristic.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A value used as-is. Operands of `literal` land here without being
    /// re-classified, so one-key data objects survive when wrapped.
    Literal(Value),
    /// A registered operation applied to an operand tree.
    Call { op: String, operand: Box<Expr> },
    Array(Vec<Expr>),
    Object(BTreeMap<String, Expr>),
}

/// An operation whose operand is reduced by the engine before the op runs.
///
/// `apply` receives the already-applied operand plus the threaded input;
/// `evaluate` defaults to the uniform self-contained convention of a
/// two-element `[input, operand]` pair (`{"eq": [3, 3]}`,
/// `{"add": [3, 4]}`), delegating to `apply`.
pub trait Operation: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value>;

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        let (input, operand) = split_pair(self.name(), operand)?;
        self.apply(operand, input)
    }

    /// Where-shorthand hook: rewrite `operand` (raw JSON, with the attribute
    /// context when in attribute position) into canonical where-clause JSON.
    /// `None` means the op takes no special part in where normalization.
    fn normalize_where(
        &self,
        attribute: Option<&str>,
        operand: &serde_json::Value,
        engine: &ExpressionEngine,
    ) -> Option<Result<serde_json::Value>> {
        let _ = (attribute, operand, engine);
        None
    }
}

/// An operation that controls evaluation of its own operand.
///
/// The engine hands over the raw operand tree so the op can decide how and
/// whether to recurse: `pipe`/`compose` thread a changing input through a
/// sequence, `if`/`case` evaluate only the taken branch, `and`/`or`
/// short-circuit.
pub trait ControlOperation: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value>;

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value>;

    fn normalize_where(
        &self,
        attribute: Option<&str>,
        operand: &serde_json::Value,
        engine: &ExpressionEngine,
    ) -> Option<Result<serde_json::Value>> {
        let _ = (attribute, operand, engine);
        None
    }
}

/// Registry entry: whether an operation controls its own operand evaluation
/// is a structural distinction, not a flag to forget.
#[derive(Clone)]
pub enum OpDef {
    Plain(Arc<dyn Operation>),
    Control(Arc<dyn ControlOperation>),
}

impl OpDef {
    pub(crate) fn normalize_where(
        &self,
        attribute: Option<&str>,
        operand: &serde_json::Value,
        engine: &ExpressionEngine,
    ) -> Option<Result<serde_json::Value>> {
        match self {
            OpDef::Plain(op) => op.normalize_where(attribute, operand, engine),
            OpDef::Control(op) => op.normalize_where(attribute, operand, engine),
        }
    }
}

/// The operation registry plus parse/apply/evaluate entry points.
///
/// Seeded with the fixed catalogue; callers may register additional
/// operations into the same namespace. Construct one explicitly and pass it
/// by reference wherever expressions are parsed or run — there is no ambient
/// default instance.
///
/// # Example
///
/// ```
/// use refract_expr::ExpressionEngine;
/// use serde_json::json;
///
/// let engine = ExpressionEngine::new();
/// let expr = engine.parse(&json!({"pipe": [{"get": "age"}, {"gt": 5}]}));
/// let out = engine.apply(&expr, &json!({"age": 6}).into()).unwrap();
/// assert_eq!(out, refract_api::Value::Bool(true));
/// ```
pub struct ExpressionEngine {
    ops: HashMap<String, OpDef>,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEngine {
    /// An engine seeded with the built-in catalogue.
    pub fn new() -> Self {
        let mut engine = Self {
            ops: HashMap::new(),
        };
        ops::register_catalogue(&mut engine);
        engine
    }

    /// Registers an operation. A later registration under the same name wins.
    pub fn register_operation(&mut self, op: Arc<dyn Operation>) {
        self.ops.insert(op.name().to_string(), OpDef::Plain(op));
    }

    pub fn register_control(&mut self, op: Arc<dyn ControlOperation>) {
        self.ops.insert(op.name().to_string(), OpDef::Control(op));
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    pub(crate) fn op(&self, name: &str) -> Result<&OpDef> {
        self.ops
            .get(name)
            .ok_or_else(|| ExprError::UnknownOperation(name.to_string()))
    }

    /// Structural expression test on raw JSON: a non-array composite with
    /// exactly one key, that key naming a registered operation.
    ///
    /// This is shape-based by necessity: a *data* object that happens to have
    /// exactly one key equal to an op name is indistinguishable from an
    /// expression and will be read as one. Wrap such values in `literal` to
    /// keep them inert. The ambiguity is confined to this boundary — after
    /// [`parse`](Self::parse), the distinction is carried by the [`Expr`]
    /// tree.
    pub fn is_expression(&self, raw: &serde_json::Value) -> bool {
        match raw.as_object() {
            Some(map) if map.len() == 1 => map.keys().next().is_some_and(|k| self.has_operation(k)),
            _ => false,
        }
    }

    /// Splits a raw expression node into its operation name and operand.
    pub(crate) fn expression_parts<'v>(
        &self,
        raw: &'v serde_json::Value,
    ) -> Option<(&'v str, &'v serde_json::Value)> {
        let map = raw.as_object()?;
        if map.len() != 1 {
            return None;
        }
        let (name, operand) = map.iter().next()?;
        self.has_operation(name).then_some((name.as_str(), operand))
    }

    /// Classifies raw JSON into a tagged [`Expr`] tree.
    pub fn parse(&self, raw: &serde_json::Value) -> Expr {
        if let Some((name, operand)) = self.expression_parts(raw) {
            if name == "literal" {
                return Expr::Literal(Value::from(operand));
            }
            return Expr::Call {
                op: name.to_string(),
                operand: Box::new(self.parse(operand)),
            };
        }
        match raw {
            serde_json::Value::Array(items) => {
                Expr::Array(items.iter().map(|item| self.parse(item)).collect())
            }
            serde_json::Value::Object(map) => Expr::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.parse(v)))
                    .collect(),
            ),
            scalar => Expr::Literal(Value::from(scalar)),
        }
    }

    /// Applies `expr` against `input`, recursing through non-expression
    /// composites and dispatching `Call` nodes to their operation.
    pub fn apply(&self, expr: &Expr, input: &Value) -> Result<Value> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.apply(item, input))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Expr::Object(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), self.apply(v, input)?)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Value::Object),
            Expr::Call { op, operand } => match self.op(op)? {
                OpDef::Control(def) => def.apply(operand, input, self),
                OpDef::Plain(def) => {
                    let reduced = self.apply(operand, input)?;
                    def.apply(&reduced, input)
                }
            },
        }
    }

    /// Reduces a self-contained `expr` with no external input.
    pub fn evaluate(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.evaluate(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Expr::Object(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), self.evaluate(v)?)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Value::Object),
            Expr::Call { op, operand } => match self.op(op)? {
                OpDef::Control(def) => def.evaluate(operand, self),
                OpDef::Plain(def) => {
                    let reduced = self.evaluate(operand)?;
                    def.evaluate(&reduced)
                }
            },
        }
    }

    /// Parse-then-apply convenience for raw JSON expressions.
    pub fn apply_value(&self, raw: &serde_json::Value, input: &Value) -> Result<Value> {
        self.apply(&self.parse(raw), input)
    }

    /// Parse-then-evaluate convenience for raw JSON expressions.
    pub fn evaluate_value(&self, raw: &serde_json::Value) -> Result<Value> {
        self.evaluate(&self.parse(raw))
    }
}

/// The uniform self-contained operand convention: `[input, operand]`.
pub(crate) fn split_pair<'v>(op: &'static str, operand: &'v Value) -> Result<(&'v Value, &'v Value)> {
    match operand {
        Value::Array(items) if items.len() == 2 => Ok((&items[0], &items[1])),
        other => Err(ExprError::type_error(op, "an [input, operand] pair", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn one_key_data_objects_need_the_literal_escape_hatch() {
        let engine = ExpressionEngine::new();
        // A data object with a single op-named key is read as an expression.
        assert!(engine.is_expression(&json!({"count": "residents"})));
        assert!(!engine.is_expression(&json!({"count": 1, "other": 2})));
        assert!(!engine.is_expression(&json!([{"count": 1}])));

        // Wrapped in literal, it stays inert data.
        let expr = engine.parse(&json!({"literal": {"count": 3}}));
        let out = engine.evaluate(&expr).unwrap();
        assert_eq!(
            out,
            Value::from(json!({"count": 3})),
            "literal operand must be returned verbatim"
        );
    }

    #[test]
    fn unknown_keys_parse_as_plain_objects() {
        let engine = ExpressionEngine::new();
        let expr = engine.parse(&json!({"name": "Tenderheart Bear"}));
        assert!(matches!(expr, Expr::Object(_)));
    }

    #[test]
    fn unknown_operation_errors_by_name() {
        let engine = ExpressionEngine::new();
        let err = engine
            .apply(
                &Expr::Call {
                    op: "warp".into(),
                    operand: Box::new(Expr::Literal(Value::Null)),
                },
                &Value::Null,
            )
            .unwrap_err();
        assert!(matches!(err, ExprError::UnknownOperation(name) if name == "warp"));
    }
}
