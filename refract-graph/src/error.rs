use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown resource type \"{0}\"")]
    UnknownType(String),

    #[error("{ty}: tree resources must be objects")]
    NotAnObject { ty: String },

    #[error("{ty}: resource is missing its id attribute \"{id_attribute}\"")]
    MissingId { ty: String, id_attribute: String },

    #[error("{ty}.{relationship}: expected a to-{expected} value")]
    CardinalityMismatch {
        ty: String,
        relationship: String,
        expected: &'static str,
    },

    #[error("{ty}.{relationship}: embedded relationship values must be objects, ids, or null")]
    InvalidRelationshipValue { ty: String, relationship: String },
}
