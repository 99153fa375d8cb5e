//! Compilation of the terse `where` shorthand into canonical expressions.
//!
//! Both the in-memory executor and any translating backend want exactly one
//! tree shape for filters, so the sugar is resolved once, up front:
//!
//! | shorthand | canonical |
//! |---|---|
//! | `{"age": 5}` | `{"pipe": [{"get": "age"}, {"eq": 5}]}` |
//! | `{"age": {"gt": 5}}` | `{"pipe": [{"get": "age"}, {"gt": 5}]}` |
//! | `{"age": {"or": [c1, c2]}}` | attribute context distributed into each branch |
//! | `{"a": 1, "b": 2}` | `{"and": [..each entry normalized..]}` |
//! | `{"if": …}` / `{"case": …}` | normalized via the ops' where hooks |
//!
//! Arrays are not valid where nodes at any position.

use serde_json::{Value as Json, json};

use crate::engine::ExpressionEngine;
use crate::error::{ExprError, Result};
use crate::{Expr, OpDef};

impl ExpressionEngine {
    /// Compiles a `where` clause into its canonical [`Expr`] form.
    ///
    /// # Example
    ///
    /// ```
    /// use refract_expr::ExpressionEngine;
    /// use serde_json::json;
    ///
    /// let engine = ExpressionEngine::new();
    /// let expr = engine.normalize_where_clause(&json!({"age": {"gt": 5}})).unwrap();
    /// let kept = engine.apply(&expr, &json!({"age": 6}).into()).unwrap();
    /// assert_eq!(kept, refract_api::Value::Bool(true));
    /// ```
    pub fn normalize_where_clause(&self, where_clause: &Json) -> Result<Expr> {
        let canonical = self.normalize_where_node(where_clause, None)?;
        Ok(self.parse(&canonical))
    }

    /// One normalization step. `attribute` carries the context when the node
    /// sits under an attribute key.
    pub(crate) fn normalize_where_node(
        &self,
        node: &Json,
        attribute: Option<&str>,
    ) -> Result<Json> {
        match node {
            Json::Array(_) => Err(ExprError::WhereArray),
            Json::Object(map) => {
                if let Some((name, operand)) = self.expression_parts(node) {
                    if let Some(hooked) = self.where_hook(name, attribute, operand) {
                        return hooked;
                    }
                    // A plain expression: already a predicate at the root,
                    // or piped behind the attribute getter in context.
                    return Ok(match attribute {
                        None => node.clone(),
                        Some(attr) => json!({"pipe": [{"get": attr}, node]}),
                    });
                }
                match attribute {
                    None => self.normalize_conjunction(map),
                    // A non-expression object under an attribute is data,
                    // compared wholesale.
                    Some(attr) => Ok(json!({"pipe": [{"get": attr}, {"eq": node}]})),
                }
            }
            scalar => match attribute {
                Some(attr) => Ok(json!({"pipe": [{"get": attr}, {"eq": scalar}]})),
                None => Err(ExprError::Where(format!(
                    "a where clause must be an object, got {scalar}"
                ))),
            },
        }
    }

    /// Attribute-keyed object: each entry normalizes in its attribute's
    /// context; multiple entries conjoin.
    fn normalize_conjunction(&self, map: &serde_json::Map<String, Json>) -> Result<Json> {
        let mut clauses = map
            .iter()
            .map(|(attr, value)| self.normalize_where_node(value, Some(attr)))
            .collect::<Result<Vec<_>>>()?;
        Ok(match clauses.len() {
            0 => json!({"literal": true}),
            1 => clauses.remove(0),
            _ => json!({"and": clauses}),
        })
    }

    fn where_hook(
        &self,
        name: &str,
        attribute: Option<&str>,
        operand: &Json,
    ) -> Option<Result<Json>> {
        match self.op(name) {
            Ok(OpDef::Plain(op)) => op.normalize_where(attribute, operand, self),
            Ok(OpDef::Control(op)) => op.normalize_where(attribute, operand, self),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract_api::Value;

    fn engine() -> ExpressionEngine {
        ExpressionEngine::new()
    }

    fn keeps(engine: &ExpressionEngine, where_clause: &Json, input: &Json) -> bool {
        let expr = engine.normalize_where_clause(where_clause).unwrap();
        engine
            .apply(&expr, &Value::from(input))
            .unwrap()
            .is_truthy()
    }

    #[test]
    fn scalar_shorthand_compiles_to_get_eq_pipe() {
        let engine = engine();
        let canonical = engine
            .normalize_where_node(&json!({"name": "Wish Bear"}), None)
            .unwrap();
        assert_eq!(
            canonical,
            json!({"pipe": [{"get": "name"}, {"eq": "Wish Bear"}]})
        );
    }

    #[test]
    fn multi_key_objects_conjoin() {
        let engine = engine();
        let canonical = engine
            .normalize_where_node(&json!({"a": 1, "b": 2}), None)
            .unwrap();
        assert_eq!(
            canonical,
            json!({"and": [
                {"pipe": [{"get": "a"}, {"eq": 1}]},
                {"pipe": [{"get": "b"}, {"eq": 2}]}
            ]})
        );
    }

    #[test]
    fn logical_branches_inherit_the_attribute_context() {
        let engine = engine();
        let canonical = engine
            .normalize_where_node(&json!({"age": {"or": [{"lt": 3}, {"gt": 30}]}}), None)
            .unwrap();
        assert_eq!(
            canonical,
            json!({"or": [
                {"pipe": [{"get": "age"}, {"lt": 3}]},
                {"pipe": [{"get": "age"}, {"gt": 30}]}
            ]})
        );
        assert!(keeps(&engine, &json!({"age": {"or": [{"lt": 3}, {"gt": 30}]}}), &json!({"age": 35})));
        assert!(!keeps(&engine, &json!({"age": {"or": [{"lt": 3}, {"gt": 30}]}}), &json!({"age": 10})));
    }

    #[test]
    fn arrays_are_fatal_anywhere() {
        let engine = engine();
        assert!(matches!(
            engine.normalize_where_node(&json!([1, 2]), None),
            Err(ExprError::WhereArray)
        ));
        assert!(matches!(
            engine.normalize_where_node(&json!({"age": [1, 2]}), None),
            Err(ExprError::WhereArray)
        ));
    }

    #[test]
    fn if_normalizes_condition_branches_only() {
        let engine = engine();
        let clause = json!({"if": {
            "if": {"age": {"gt": 30}},
            "then": true,
            "else": false
        }});
        let canonical = engine.normalize_where_node(&clause, None).unwrap();
        assert_eq!(
            canonical,
            json!({"if": {
                "if": {"pipe": [{"get": "age"}, {"gt": 30}]},
                "then": true,
                "else": false
            }})
        );
        assert!(keeps(&engine, &clause, &json!({"age": 35})));
        assert!(!keeps(&engine, &clause, &json!({"age": 10})));
    }

    #[test]
    fn case_in_attribute_position_gets_the_getter_value() {
        let engine = engine();
        let clause = json!({"fur_color": {"case": {
            "cases": [{"when": "pink", "then": true}],
            "default": false
        }}});
        let canonical = engine.normalize_where_node(&clause, None).unwrap();
        assert_eq!(
            canonical,
            json!({"case": {
                "value": {"get": "fur_color"},
                "cases": [{"when": "pink", "then": true}],
                "default": false
            }})
        );
        assert!(keeps(&engine, &clause, &json!({"fur_color": "pink"})));
        assert!(!keeps(&engine, &clause, &json!({"fur_color": "tan"})));
    }

    #[test]
    fn root_scalar_where_is_rejected() {
        let engine = engine();
        assert!(engine.normalize_where_node(&json!(7), None).is_err());
    }
}
