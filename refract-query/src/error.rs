use refract_api::Ref;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown resource type \"{0}\"")]
    UnknownType(String),

    #[error("limit must be at least 1, got {0}")]
    InvalidLimit(i64),

    #[error("offset must be at least 0, got {0}")]
    InvalidOffset(i64),

    #[error("first result lacks the sort attribute \"{0}\"")]
    MissingSortAttribute(String),

    #[error("{ty}/{id} has no relationship \"{relationship}\"")]
    UndefinedRelationship {
        ty: String,
        id: String,
        relationship: String,
    },

    #[error("ref {}/{} does not resolve to a resource", .0.ty, .0.id)]
    DanglingRef(Ref),

    #[error("malformed path \"{path}\": {reason}")]
    MalformedPath { path: String, reason: &'static str },

    #[error("query is not normalizable: {0}")]
    Malformed(String),

    #[error(transparent)]
    Expression(#[from] refract_expr::ExprError),
}
