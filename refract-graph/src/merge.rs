use refract_api::Graph;

/// Unions two graphs keyed by `(type, id)`, the right side winning conflicts.
///
/// Attributes merge shallowly, key by key — right overwrites, keys absent on
/// one side survive from the other. Relationships are replaced wholesale by
/// whichever side defines them (right on conflict); there is no recursive
/// relationship merge.
pub fn merge_graphs(left: Graph, right: Graph) -> Graph {
    let mut merged = left;
    for (type_name, bucket) in right.types {
        let merged_bucket = merged.types.entry(type_name).or_default();
        for (id, resource) in bucket {
            match merged_bucket.get_mut(&id) {
                None => {
                    merged_bucket.insert(id, resource);
                }
                Some(existing) => {
                    existing.attributes.extend(resource.attributes);
                    existing.relationships.extend(resource.relationships);
                }
            }
        }
    }
    merged
}
