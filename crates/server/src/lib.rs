//! HTTP surface for the docforge job engine.

pub mod api;
pub mod metrics;
pub mod state;
