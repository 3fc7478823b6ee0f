//! CLI command implementations.

pub mod build;
pub mod overrides;
pub mod rules;
