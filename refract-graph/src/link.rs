use refract_api::{Cardinality, Graph, Ref, RelValue, Schema};

/// Ensures every declared inverse relationship carries a back-reference for
/// each forward ref in the graph.
///
/// To-one inverses are overwritten, to-many inverses appended (deduped by id,
/// order preserved). The pass is additive only: a stale back-reference whose
/// forward counterpart disappeared is left alone — this is a repair pass for
/// monotonically grown graphs, not a consistency checker. Running it twice
/// is a no-op.
pub fn link_inverses(schema: &Schema, mut graph: Graph) -> Graph {
    // Plan first, then apply: back-references may land in the bucket being
    // walked.
    let mut planned: Vec<(Ref, String, Ref, Cardinality)> = Vec::new();

    for (type_name, resource_schema) in &schema.resources {
        for (rel_name, rel) in &resource_schema.relationships {
            let Some(inverse) = &rel.inverse else {
                continue;
            };
            let Some(target_schema) = schema.resource(&rel.target) else {
                continue;
            };
            let Some(inverse_rel) = target_schema.relationship(inverse) else {
                continue;
            };
            for resource in graph.resources_of(type_name) {
                let Some(forward) = resource.relationships.get(rel_name) else {
                    continue;
                };
                for target_ref in forward.refs() {
                    planned.push((
                        target_ref.clone(),
                        inverse.clone(),
                        resource.to_ref(),
                        inverse_rel.cardinality,
                    ));
                }
            }
        }
    }

    for (target, inverse_name, back, cardinality) in planned {
        let Some(resource) = graph
            .types
            .get_mut(&target.ty)
            .and_then(|bucket| bucket.get_mut(&target.id))
        else {
            // Dangling forward ref: nothing to link, and not ours to delete.
            tracing::trace!(target = %target.ty, id = %target.id, "skipping dangling ref");
            continue;
        };
        match cardinality {
            Cardinality::One => {
                resource
                    .relationships
                    .insert(inverse_name, RelValue::One(Some(back)));
            }
            Cardinality::Many => {
                let slot = resource
                    .relationships
                    .entry(inverse_name)
                    .or_insert_with(|| RelValue::Many(Vec::new()));
                slot.push_unique(back);
            }
        }
    }

    graph
}
