use refract_api::{Cardinality, Graph, Ref, RelValue, Resource, Schema, Value, id_from_json};

use crate::error::{GraphError, Result};

/// Builds a normalized graph from tree-shaped resources — payloads whose
/// relationships are embedded inline as nested objects or arrays rather than
/// refs.
///
/// Fields naming a declared relationship are recursed into at arbitrary
/// depth: every embedded related object is extracted into its type's bucket
/// (deduped by id) and a typed [`Ref`] recorded on the parent. A scalar under
/// a relationship key is read as the related resource's id attribute, and a
/// stub resource is created so the ref resolves. Remaining fields become
/// attributes. Every type the schema declares is present in the output, even
/// when empty.
pub fn graph_from_trees(
    schema: &Schema,
    root_type: &str,
    trees: &[serde_json::Value],
) -> Result<Graph> {
    if schema.resource(root_type).is_none() {
        return Err(GraphError::UnknownType(root_type.to_string()));
    }
    let mut graph = Graph::empty_for(schema);
    for tree in trees {
        extract(schema, root_type, tree, &mut graph)?;
    }
    tracing::debug!(
        root = root_type,
        trees = trees.len(),
        resources = graph.resources().count(),
        "extracted tree payloads"
    );
    Ok(graph)
}

fn extract(
    schema: &Schema,
    ty: &str,
    tree: &serde_json::Value,
    graph: &mut Graph,
) -> Result<Ref> {
    let resource_schema = schema
        .resource(ty)
        .ok_or_else(|| GraphError::UnknownType(ty.to_string()))?;
    let fields = tree.as_object().ok_or_else(|| GraphError::NotAnObject {
        ty: ty.to_string(),
    })?;
    let id = fields
        .get(&resource_schema.id_attribute)
        .and_then(id_from_json)
        .ok_or_else(|| GraphError::MissingId {
            ty: ty.to_string(),
            id_attribute: resource_schema.id_attribute.clone(),
        })?;

    let mut resource = Resource::new(ty, id);
    for (key, value) in fields {
        match resource_schema.relationship(key) {
            Some(rel) => {
                let rel_value = embed(schema, ty, key, &rel.target, rel.cardinality, value, graph)?;
                resource.relationships.insert(key.clone(), rel_value);
            }
            None => {
                resource.attributes.insert(key.clone(), Value::from(value));
            }
        }
    }

    let reference = resource.to_ref();
    match graph
        .types
        .get_mut(ty)
        .and_then(|bucket| bucket.get_mut(&reference.id))
    {
        // Same id seen again: later occurrences win key by key.
        Some(existing) => {
            existing.attributes.extend(resource.attributes);
            existing.relationships.extend(resource.relationships);
        }
        None => graph.insert(resource),
    }
    Ok(reference)
}

fn embed(
    schema: &Schema,
    parent_ty: &str,
    rel_name: &str,
    target_ty: &str,
    cardinality: Cardinality,
    value: &serde_json::Value,
    graph: &mut Graph,
) -> Result<RelValue> {
    match (cardinality, value) {
        (Cardinality::One, serde_json::Value::Null) => Ok(RelValue::One(None)),
        (Cardinality::One, serde_json::Value::Array(_)) => Err(GraphError::CardinalityMismatch {
            ty: parent_ty.to_string(),
            relationship: rel_name.to_string(),
            expected: "one",
        }),
        (Cardinality::One, single) => Ok(RelValue::One(Some(embed_one(
            schema, parent_ty, rel_name, target_ty, single, graph,
        )?))),
        (Cardinality::Many, serde_json::Value::Null) => Ok(RelValue::Many(Vec::new())),
        (Cardinality::Many, serde_json::Value::Array(items)) => {
            let mut slot = RelValue::Many(Vec::new());
            for item in items {
                slot.push_unique(embed_one(
                    schema, parent_ty, rel_name, target_ty, item, graph,
                )?);
            }
            Ok(slot)
        }
        // A bare object under a to-many reads as a one-element collection.
        (Cardinality::Many, single) => {
            let mut slot = RelValue::Many(Vec::new());
            slot.push_unique(embed_one(
                schema, parent_ty, rel_name, target_ty, single, graph,
            )?);
            Ok(slot)
        }
    }
}

fn embed_one(
    schema: &Schema,
    parent_ty: &str,
    rel_name: &str,
    target_ty: &str,
    value: &serde_json::Value,
    graph: &mut Graph,
) -> Result<Ref> {
    if value.is_object() {
        return extract(schema, target_ty, value, graph);
    }
    // Scalar fallback: the value is the related type's id attribute.
    let Some(id) = id_from_json(value) else {
        return Err(GraphError::InvalidRelationshipValue {
            ty: parent_ty.to_string(),
            relationship: rel_name.to_string(),
        });
    };
    if graph.get(target_ty, &id).is_none() {
        let target_schema = schema
            .resource(target_ty)
            .ok_or_else(|| GraphError::UnknownType(target_ty.to_string()))?;
        let mut stub = Resource::new(target_ty, id.clone());
        stub.attributes
            .insert(target_schema.id_attribute.clone(), Value::from(value));
        graph.insert(stub);
    }
    Ok(Ref::new(target_ty, id))
}
