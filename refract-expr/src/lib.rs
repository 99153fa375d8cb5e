//! Expression engine for Refract queries.
//!
//! Expressions are single-key tagged operation nodes (`{"eq": 3}`,
//! `{"pipe": [{"get": "age"}, {"gt": 5}]}`) drawn from a closed-but-extensible
//! registry. The engine parses raw JSON into a tagged [`Expr`] tree once, then
//! offers two evaluation modes:
//!
//! - [`ExpressionEngine::apply`] threads an input value through the tree
//!   (filters, projections);
//! - [`ExpressionEngine::evaluate`] reduces a self-contained tree with no
//!   external input.
//!
//! The engine also compiles the terse `where` shorthand into canonical
//! expression form (`normalize_where_clause`), so executors and any
//! translating backend consume one tree shape.

mod engine;
mod error;
mod ops;
mod where_clause;

pub use engine::{ControlOperation, Expr, ExpressionEngine, OpDef, Operation};
pub use error::{ExprError, Result};
