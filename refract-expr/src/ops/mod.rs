//! The built-in operation catalogue.
//!
//! Each family lives in its own module; `register_catalogue` seeds a fresh
//! engine with all of them. Callers extend the same namespace through
//! [`ExpressionEngine::register_operation`] /
//! [`ExpressionEngine::register_control`].

use std::sync::Arc;

use crate::engine::ExpressionEngine;

mod aggregative;
mod comparative;
mod conditional;
mod core;
mod generative;
mod iterative;
mod logical;
mod math;
mod temporal;

pub(crate) fn register_catalogue(engine: &mut ExpressionEngine) {
    // core
    engine.register_operation(Arc::new(core::Literal));
    engine.register_operation(Arc::new(core::Get));
    engine.register_control(Arc::new(core::Pipe));
    engine.register_control(Arc::new(core::Compose));
    engine.register_operation(Arc::new(core::Debug));

    // comparative
    engine.register_operation(Arc::new(comparative::Eq));
    engine.register_operation(Arc::new(comparative::Ne));
    engine.register_operation(Arc::new(comparative::Gt));
    engine.register_operation(Arc::new(comparative::Gte));
    engine.register_operation(Arc::new(comparative::Lt));
    engine.register_operation(Arc::new(comparative::Lte));
    engine.register_operation(Arc::new(comparative::In));
    engine.register_operation(Arc::new(comparative::Nin));
    engine.register_operation(Arc::new(comparative::MatchesRegex));
    engine.register_operation(Arc::new(comparative::MatchesLike));
    engine.register_operation(Arc::new(comparative::MatchesGlob));

    // logical
    engine.register_control(Arc::new(logical::And));
    engine.register_control(Arc::new(logical::Or));
    engine.register_operation(Arc::new(logical::Not));

    // conditional
    engine.register_control(Arc::new(conditional::If));
    engine.register_control(Arc::new(conditional::Case));

    // aggregative
    engine.register_operation(Arc::new(aggregative::Count));
    engine.register_operation(Arc::new(aggregative::Sum));
    engine.register_operation(Arc::new(aggregative::Mean));
    engine.register_operation(Arc::new(aggregative::Median));
    engine.register_operation(Arc::new(aggregative::Mode));
    engine.register_operation(Arc::new(aggregative::Min));
    engine.register_operation(Arc::new(aggregative::Max));

    // iterative
    engine.register_control(Arc::new(iterative::Map));
    engine.register_control(Arc::new(iterative::Filter));
    engine.register_control(Arc::new(iterative::FlatMap));
    engine.register_control(Arc::new(iterative::Find));
    engine.register_control(Arc::new(iterative::Any));
    engine.register_control(Arc::new(iterative::All));
    engine.register_operation(Arc::new(iterative::Concat));
    engine.register_operation(Arc::new(iterative::Join));
    engine.register_operation(Arc::new(iterative::Reverse));

    // generative
    engine.register_operation(Arc::new(generative::Random));
    engine.register_operation(Arc::new(generative::Uuid));

    // temporal
    engine.register_operation(Arc::new(temporal::Now));
    engine.register_operation(Arc::new(temporal::Timestamp));

    // math
    engine.register_operation(Arc::new(math::Add));
    engine.register_operation(Arc::new(math::Subtract));
    engine.register_operation(Arc::new(math::Multiply));
    engine.register_operation(Arc::new(math::Divide));
    engine.register_operation(Arc::new(math::Modulo));
}
