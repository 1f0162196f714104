//! Named, schema-described capabilities agents may invoke.
//!
//! A [`Tool`] is a side-effecting operation (send an email, post to a CMS)
//! exposed to the planner by name and JSON parameter schema. The
//! [`ToolRegistry`] is the only discovery mechanism: steps reference tools
//! by name, and an unknown name at execution time is the caller's
//! `ToolNotFound` error.
//!
//! # Main types
//!
//! - [`Tool`] — Trait all capabilities implement.
//! - [`ToolDescriptor`] — Name, description, and parameter schema.
//! - [`ToolRegistry`] — Insert-ordered name → tool registry.

/// Tool registry.
pub mod registry;
/// Tool trait and descriptor.
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolDescriptor};
