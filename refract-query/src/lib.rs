//! Query validation, normalization, and execution for Refract.
//!
//! A raw query document passes through three stages:
//!
//! 1. [`QueryValidator`] — shape checks (schema-independent) and semantic
//!    checks (select keys, where attributes, order entries, pagination
//!    bounds), reported as a list, never thrown;
//! 2. [`normalize_query`] — shorthand expansion into the canonical
//!    [`NormalQuery`]: select always in map form, subqueries stamped with
//!    their relationship's target type, `where` compiled to an expression;
//! 3. [`run_query`] — the fixed filter → order → limit/offset → project
//!    pipeline over a [`PreparedGraph`] view.

mod error;
mod executor;
mod normalize;
mod prepared;
mod source;
mod validate;

pub use error::{QueryError, Result};
pub use executor::run_query;
pub use normalize::{Direction, NormalQuery, Projection, normalize_query};
pub use prepared::{PreparedGraph, prep_graph};
pub use source::GraphSource;
pub use validate::QueryValidator;
