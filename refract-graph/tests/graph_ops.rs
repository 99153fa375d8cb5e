//! Inverse linking, merging, and tree extraction over a small fixture.

use refract_api::{Graph, Ref, RelValue, Schema, Value};
use refract_graph::{GraphError, graph_from_trees, link_inverses, merge_graphs};
use serde_json::json;

fn schema() -> Schema {
    Schema::from_value(&json!({
        "resources": {
            "bears": {
                "attributes": {
                    "id": {},
                    "name": { "type": "string" },
                    "year_introduced": { "type": "integer" }
                },
                "relationships": {
                    "home": { "type": "homes", "cardinality": "one", "inverse": "residents" },
                    "powers": { "type": "powers", "cardinality": "many", "inverse": "wielders" }
                }
            },
            "homes": {
                "attributes": { "id": {}, "name": { "type": "string" } },
                "relationships": {
                    "residents": { "type": "bears", "cardinality": "many", "inverse": "home" }
                }
            },
            "powers": {
                "attributes": { "id": {}, "name": { "type": "string" } },
                "relationships": {
                    "wielders": { "type": "bears", "cardinality": "many", "inverse": "powers" }
                }
            }
        }
    }))
    .unwrap()
}

fn care_a_lot_tree() -> serde_json::Value {
    json!({
        "id": "1",
        "name": "Care-a-Lot",
        "residents": [
            {
                "id": "1",
                "name": "Tenderheart Bear",
                "year_introduced": 1982,
                "powers": [{ "id": "careBearStare", "name": "Care Bear Stare" }]
            },
            {
                "id": "2",
                "name": "Cheer Bear",
                "year_introduced": 1982,
                "powers": ["careBearStare"]
            }
        ]
    })
}

#[test]
fn trees_extract_to_buckets_with_refs() {
    let schema = schema();
    let graph = graph_from_trees(&schema, "homes", &[care_a_lot_tree()]).unwrap();

    // Every declared type has a bucket, even untouched ones.
    assert!(graph.types.contains_key("powers"));
    assert_eq!(graph.types.keys().count(), 3);

    let home = graph.get("homes", "1").unwrap();
    assert_eq!(
        home.relationships.get("residents"),
        Some(&RelValue::Many(vec![
            Ref::new("bears", "1"),
            Ref::new("bears", "2"),
        ]))
    );

    let tenderheart = graph.get("bears", "1").unwrap();
    assert_eq!(
        tenderheart.attributes.get("name"),
        Some(&Value::String("Tenderheart Bear".into()))
    );
    assert_eq!(
        tenderheart.relationships.get("powers"),
        Some(&RelValue::Many(vec![Ref::new("powers", "careBearStare")]))
    );

    // The nested power was extracted once, and Cheer Bear's scalar id ref
    // resolved to the same entry rather than a second stub.
    let stare = graph.get("powers", "careBearStare").unwrap();
    assert_eq!(
        stare.attributes.get("name"),
        Some(&Value::String("Care Bear Stare".into()))
    );
}

#[test]
fn tree_round_trip_preserves_reachable_data() {
    let schema = schema();
    let tree = care_a_lot_tree();
    let graph = graph_from_trees(&schema, "homes", &[tree.clone()]).unwrap();

    // Re-embed relationships from the graph and compare against the source
    // tree, two levels deep.
    let home = graph.get("homes", "1").unwrap();
    let residents = match home.relationships.get("residents").unwrap() {
        RelValue::Many(refs) => refs,
        other => panic!("unexpected shape: {other:?}"),
    };
    let expected = tree["residents"].as_array().unwrap();
    assert_eq!(residents.len(), expected.len());
    for (r, source) in residents.iter().zip(expected) {
        let bear = graph.get_ref(r).unwrap();
        assert_eq!(
            bear.attributes.get("name"),
            Some(&Value::from(&source["name"]))
        );
        assert_eq!(
            bear.attributes.get("year_introduced"),
            Some(&Value::from(&source["year_introduced"]))
        );
    }
}

#[test]
fn scalar_relationship_values_create_resolvable_stubs() {
    let schema = schema();
    let graph = graph_from_trees(
        &schema,
        "bears",
        &[json!({ "id": "3", "name": "Wish Bear", "home": "2" })],
    )
    .unwrap();
    let wish = graph.get("bears", "3").unwrap();
    assert_eq!(
        wish.relationships.get("home"),
        Some(&RelValue::One(Some(Ref::new("homes", "2"))))
    );
    // Referential integrity: the scalar ref resolves.
    let stub = graph.get("homes", "2").unwrap();
    assert_eq!(stub.attributes.get("id"), Some(&Value::String("2".into())));
}

#[test]
fn tree_extraction_errors_are_specific() {
    let schema = schema();
    assert!(matches!(
        graph_from_trees(&schema, "castles", &[json!({})]),
        Err(GraphError::UnknownType(ty)) if ty == "castles"
    ));
    assert!(matches!(
        graph_from_trees(&schema, "bears", &[json!({ "name": "No Id Bear" })]),
        Err(GraphError::MissingId { .. })
    ));
    assert!(matches!(
        graph_from_trees(
            &schema,
            "bears",
            &[json!({ "id": "9", "home": [{ "id": "1" }] })]
        ),
        Err(GraphError::CardinalityMismatch { .. })
    ));
}

#[test]
fn link_inverses_is_additive_and_idempotent() {
    let schema = schema();
    let graph = graph_from_trees(&schema, "homes", &[care_a_lot_tree()]).unwrap();
    let linked = link_inverses(&schema, graph);

    // Forward residents produced bear -> home backrefs.
    for id in ["1", "2"] {
        assert_eq!(
            linked.get("bears", id).unwrap().relationships.get("home"),
            Some(&RelValue::One(Some(Ref::new("homes", "1"))))
        );
    }
    // Forward powers produced power -> wielders backrefs, deduped.
    assert_eq!(
        linked
            .get("powers", "careBearStare")
            .unwrap()
            .relationships
            .get("wielders"),
        Some(&RelValue::Many(vec![
            Ref::new("bears", "1"),
            Ref::new("bears", "2"),
        ]))
    );

    let relinked = link_inverses(&schema, linked.clone());
    assert_eq!(relinked, linked);
}

#[test]
fn merge_attributes_shallowly_right_wins() {
    let left = Graph::from_value(&json!({
        "bears": {
            "1": { "attributes": { "name": "X", "year_introduced": 1982 } }
        }
    }))
    .unwrap();
    let right = Graph::from_value(&json!({
        "bears": {
            "1": { "attributes": { "name": "Y" } }
        }
    }))
    .unwrap();
    let merged = merge_graphs(left, right);
    let bear = merged.get("bears", "1").unwrap();
    assert_eq!(bear.attributes.get("name"), Some(&Value::String("Y".into())));
    // Keys absent on the right survive from the left.
    assert_eq!(bear.attributes.get("year_introduced"), Some(&Value::Int(1982)));
}

#[test]
fn merge_replaces_relationships_wholesale() {
    let left = Graph::from_value(&json!({
        "homes": {
            "1": { "relationships": { "residents": [
                { "type": "bears", "id": "1" },
                { "type": "bears", "id": "2" }
            ] } }
        }
    }))
    .unwrap();
    let right = Graph::from_value(&json!({
        "homes": {
            "1": { "relationships": { "residents": [
                { "type": "bears", "id": "3" }
            ] } }
        }
    }))
    .unwrap();
    let merged = merge_graphs(left, right);
    assert_eq!(
        merged.get("homes", "1").unwrap().relationships.get("residents"),
        Some(&RelValue::Many(vec![Ref::new("bears", "3")]))
    );
}

#[test]
fn merge_on_disjoint_keys_is_commutative() {
    let left = Graph::from_value(&json!({
        "bears": { "1": { "attributes": { "name": "Tenderheart Bear" } } }
    }))
    .unwrap();
    let right = Graph::from_value(&json!({
        "bears": { "2": { "attributes": { "name": "Cheer Bear" } } },
        "homes": { "1": { "attributes": { "name": "Care-a-Lot" } } }
    }))
    .unwrap();
    assert_eq!(
        merge_graphs(left.clone(), right.clone()),
        merge_graphs(right, left)
    );
}
