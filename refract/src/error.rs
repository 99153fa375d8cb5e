use refract_api::ValidationError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Facade error: everything a store operation can fail with.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid query ({} error(s)): {}", .0.len(), summarize(.0))]
    InvalidQuery(Vec<ValidationError>),

    #[error(transparent)]
    Schema(#[from] refract_api::SchemaError),

    #[error(transparent)]
    Graph(#[from] refract_graph::GraphError),

    #[error(transparent)]
    Query(#[from] refract_query::QueryError),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
