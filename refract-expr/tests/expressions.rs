//! Catalogue coverage for both evaluation modes.

use std::sync::Arc;

use refract_api::Value;
use refract_expr::{ExpressionEngine, ExprError, Operation};
use serde_json::json;

fn engine() -> ExpressionEngine {
    ExpressionEngine::new()
}

fn apply(raw: serde_json::Value, input: serde_json::Value) -> Value {
    engine().apply_value(&raw, &Value::from(input)).unwrap()
}

fn evaluate(raw: serde_json::Value) -> Value {
    engine().evaluate_value(&raw).unwrap()
}

#[test]
fn eq_laws_hold_in_both_modes() {
    assert_eq!(evaluate(json!({"eq": [3, 3]})), Value::Bool(true));
    assert_eq!(evaluate(json!({"eq": [3, 4]})), Value::Bool(false));
    assert_eq!(
        apply(json!({"pipe": [{"get": "age"}, {"gt": 5}]}), json!({"age": 6})),
        Value::Bool(true)
    );
    assert_eq!(
        apply(json!({"pipe": [{"get": "age"}, {"gt": 5}]}), json!({"age": 4})),
        Value::Bool(false)
    );
}

#[test]
fn relational_family_compares_numbers_and_strings() {
    assert_eq!(evaluate(json!({"gte": [3, 3.0]})), Value::Bool(true));
    assert_eq!(evaluate(json!({"lt": [2, 2.5]})), Value::Bool(true));
    assert_eq!(evaluate(json!({"lte": ["ant", "bat"]})), Value::Bool(true));
    assert_eq!(evaluate(json!({"ne": [3, "3"]})), Value::Bool(true));

    let err = engine()
        .evaluate_value(&json!({"gt": [3, "three"]}))
        .unwrap_err();
    assert!(matches!(err, ExprError::Type { op: "gt", .. }));
}

#[test]
fn membership_checks_use_deep_equality() {
    assert_eq!(apply(json!({"in": [1, 2, 3]}), json!(2)), Value::Bool(true));
    assert_eq!(apply(json!({"nin": [1, 2, 3]}), json!(5)), Value::Bool(true));
    assert_eq!(
        apply(json!({"in": {"literal": [[1, 2], [3]]}}), json!([1, 2])),
        Value::Bool(true)
    );
}

#[test]
fn pattern_matching_family() {
    assert_eq!(
        apply(json!({"matches_regex": "^Tender"}), json!("Tenderheart Bear")),
        Value::Bool(true)
    );
    assert_eq!(
        apply(json!({"matches_like": "%heart%"}), json!("Tenderheart Bear")),
        Value::Bool(true)
    );
    assert_eq!(
        apply(json!({"matches_like": "T_nder%"}), json!("Tenderheart Bear")),
        Value::Bool(true)
    );
    assert_eq!(
        apply(json!({"matches_glob": "*Bear"}), json!("Wish Bear")),
        Value::Bool(true)
    );
    assert_eq!(
        apply(json!({"matches_glob": "W?sh*"}), json!("Wash Bear")),
        Value::Bool(true)
    );
    // Regex metacharacters in a like/glob pattern are literal text.
    assert_eq!(
        apply(json!({"matches_like": "a.c"}), json!("abc")),
        Value::Bool(false)
    );
    assert_eq!(
        apply(json!({"matches_like": "a.c"}), json!("a.c")),
        Value::Bool(true)
    );
}

#[test]
fn logical_apply_form_short_circuits() {
    // The second branch would divide by zero if it were evaluated.
    assert_eq!(
        apply(
            json!({"and": [{"eq": 1}, {"pipe": [{"divide": 0}, {"gt": 0}]}]}),
            json!(2)
        ),
        Value::Bool(false)
    );
    assert_eq!(
        apply(
            json!({"or": [{"eq": 2}, {"pipe": [{"divide": 0}, {"gt": 0}]}]}),
            json!(2)
        ),
        Value::Bool(true)
    );
}

#[test]
fn logical_evaluate_form_folds_booleans() {
    assert_eq!(evaluate(json!({"and": [true, true]})), Value::Bool(true));
    assert_eq!(evaluate(json!({"and": [true, false]})), Value::Bool(false));
    assert_eq!(evaluate(json!({"or": [false, true]})), Value::Bool(true));
    assert_eq!(evaluate(json!({"not": true})), Value::Bool(false));
}

#[test]
fn conditionals_evaluate_only_the_taken_branch() {
    assert_eq!(
        apply(
            json!({"if": {
                "if": {"gt": 5},
                "then": {"literal": "big"},
                "else": {"pipe": [{"divide": 0}]}
            }}),
            json!(9)
        ),
        Value::String("big".into())
    );
    assert_eq!(
        evaluate(json!({"if": {"if": {"eq": [1, 2]}, "then": "yes", "else": "no"}})),
        Value::String("no".into())
    );
}

#[test]
fn case_matches_values_then_expressions() {
    let raw = json!({"case": {
        "value": {"get": "fur_color"},
        "cases": [
            {"when": "pink", "then": "Cheer Bear"},
            {"when": {"matches_regex": "^t"}, "then": "earth tones"}
        ],
        "default": "unknown"
    }});
    assert_eq!(
        apply(raw.clone(), json!({"fur_color": "pink"})),
        Value::String("Cheer Bear".into())
    );
    assert_eq!(
        apply(raw.clone(), json!({"fur_color": "tan"})),
        Value::String("earth tones".into())
    );
    assert_eq!(
        apply(raw, json!({"fur_color": "silver"})),
        Value::String("unknown".into())
    );
}

#[test]
fn aggregates_reduce_their_operand() {
    assert_eq!(evaluate(json!({"count": [1, 2, 3]})), Value::Int(3));
    assert_eq!(evaluate(json!({"sum": [1, 2, 3]})), Value::Int(6));
    assert_eq!(evaluate(json!({"mean": [1, 2, 3]})), Value::Float(2.0));
    assert_eq!(evaluate(json!({"median": [9, 1, 5]})), Value::Int(5));
    assert_eq!(evaluate(json!({"mode": [1, 2, 2, 3]})), Value::Int(2));
    assert_eq!(evaluate(json!({"min": [4, 1, 9]})), Value::Int(1));
    assert_eq!(evaluate(json!({"max": [4, 1, 9]})), Value::Int(9));
    assert_eq!(evaluate(json!({"min": []})), Value::Undefined);
    assert_eq!(evaluate(json!({"count": []})), Value::Int(0));
}

#[test]
fn iterative_family_threads_elements() {
    assert_eq!(
        apply(json!({"map": {"add": 10}}), json!([1, 2])),
        Value::from(json!([11, 12]))
    );
    assert_eq!(
        apply(json!({"filter": {"gt": 2}}), json!([1, 2, 3, 4])),
        Value::from(json!([3, 4]))
    );
    assert_eq!(
        apply(json!({"flat_map": {"concat": [0]}}), json!([[1], [2]])),
        Value::from(json!([1, 0, 2, 0]))
    );
    assert_eq!(apply(json!({"find": {"gt": 2}}), json!([1, 3, 5])), Value::Int(3));
    assert_eq!(
        apply(json!({"find": {"gt": 9}}), json!([1, 3, 5])),
        Value::Undefined
    );
    assert_eq!(apply(json!({"any": {"gt": 4}}), json!([1, 5])), Value::Bool(true));
    assert_eq!(apply(json!({"all": {"gt": 4}}), json!([1, 5])), Value::Bool(false));
    assert_eq!(
        evaluate(json!({"map": [[1, 2], {"multiply": 3}]})),
        Value::from(json!([3, 6]))
    );
}

#[test]
fn concat_join_reverse() {
    assert_eq!(
        apply(json!({"concat": [3, 4]}), json!([1, 2])),
        Value::from(json!([1, 2, 3, 4]))
    );
    assert_eq!(
        apply(json!({"join": ", "}), json!(["a", "b"])),
        Value::String("a, b".into())
    );
    assert_eq!(
        evaluate(json!({"reverse": [1, 2, 3]})),
        Value::from(json!([3, 2, 1]))
    );
}

#[test]
fn math_family_stays_integral_when_it_can() {
    assert_eq!(evaluate(json!({"add": [3, 4]})), Value::Int(7));
    assert_eq!(evaluate(json!({"subtract": [3, 4]})), Value::Int(-1));
    assert_eq!(evaluate(json!({"multiply": [3, 1.5]})), Value::Float(4.5));
    assert_eq!(evaluate(json!({"divide": [3, 2]})), Value::Float(1.5));
    assert_eq!(evaluate(json!({"modulo": [7, 3]})), Value::Int(1));
    assert_eq!(apply(json!({"add": 3}), json!(4)), Value::Int(7));

    let err = engine().evaluate_value(&json!({"divide": [1, 0]})).unwrap_err();
    assert!(matches!(err, ExprError::DivisionByZero { op: "divide" }));
    let err = engine().evaluate_value(&json!({"modulo": [1, 0]})).unwrap_err();
    assert!(matches!(err, ExprError::DivisionByZero { op: "modulo" }));
}

#[test]
fn generative_and_temporal_ops_produce_plausible_values() {
    let engine = engine();
    for _ in 0..20 {
        let Value::Float(x) = engine.evaluate_value(&json!({"random": null})).unwrap() else {
            panic!("random must produce a float");
        };
        assert!((0.0..1.0).contains(&x));
        let Value::Float(y) = engine
            .evaluate_value(&json!({"random": {"min": 5, "max": 6}}))
            .unwrap()
        else {
            panic!("random must produce a float");
        };
        assert!((5.0..6.0).contains(&y));
    }

    let Value::String(id) = engine.evaluate_value(&json!({"uuid": null})).unwrap() else {
        panic!("uuid must produce a string");
    };
    assert_eq!(id.len(), 36);

    let Value::String(now) = engine.evaluate_value(&json!({"now": null})).unwrap() else {
        panic!("now must produce a string");
    };
    assert!(now.contains('T'));

    let Value::Int(ts) = engine.evaluate_value(&json!({"timestamp": null})).unwrap() else {
        panic!("timestamp must produce an integer");
    };
    assert!(ts > 1_600_000_000_000);
}

#[test]
fn get_walks_nested_values() {
    assert_eq!(
        apply(json!({"get": "home.name"}), json!({"home": {"name": "Care-a-Lot"}})),
        Value::String("Care-a-Lot".into())
    );
    assert_eq!(
        apply(json!({"get": "home.name"}), json!({"home": null})),
        Value::Null
    );
    assert_eq!(
        apply(json!({"get": "missing.name"}), json!({"home": {}})),
        Value::Undefined
    );
    assert_eq!(apply(json!({"get": "1"}), json!(["a", "b"])), Value::String("b".into()));
}

#[test]
fn compose_runs_right_to_left() {
    assert_eq!(
        apply(json!({"compose": [{"add": 1}, {"multiply": 2}]}), json!(5)),
        Value::Int(11)
    );
    assert_eq!(
        apply(json!({"pipe": [{"add": 1}, {"multiply": 2}]}), json!(5)),
        Value::Int(12)
    );
}

#[test]
fn custom_operations_join_the_namespace() {
    struct Shout;

    impl Operation for Shout {
        fn name(&self) -> &'static str {
            "shout"
        }

        fn apply(&self, operand: &Value, input: &Value) -> refract_expr::Result<Value> {
            let base = input.as_str().or_else(|| operand.as_str()).unwrap_or("");
            Ok(Value::String(base.to_uppercase()))
        }
    }

    let mut engine = ExpressionEngine::new();
    engine.register_operation(Arc::new(Shout));
    assert!(engine.is_expression(&json!({"shout": null})));
    assert_eq!(
        engine
            .apply_value(&json!({"shout": null}), &Value::String("hello".into()))
            .unwrap(),
        Value::String("HELLO".into())
    );
}
