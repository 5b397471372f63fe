//! Lowers portable neural-network graph operators onto a WebNN-style backend.
//!
//! The crate sits between a host graph compiler and a backend graph builder:
//!
//! ```text
//! Host graph (ir::Node + ir::GraphInfo)
//!         |
//!         | OpBuilder::supported  -- side-effect-free eligibility query
//!         v
//! OpBuilderRegistry (builder.rs)
//!         |
//!         | ModelBuilder::lower_node
//!         v
//! WebnnGraphBuilder (webnn-graph)  -- emitted operations + operand handles
//! ```
//!
//! Each operator builder decides statically, from shape and attribute
//! metadata, which backend operations to emit and with what parameters; no
//! tensor computation happens here. The normalization family (batch,
//! instance, layer) lives in [`normalization`].

pub mod builder;
pub mod ir;
pub mod normalization;

pub use builder::{ModelBuilder, OpBuilder, OpBuilderRegistry};
pub use normalization::{register_normalization_op_builders, NormalizationOpBuilder};
