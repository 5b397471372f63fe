//! Builder-facing contract for a WebNN-style neural-network backend.
//!
//! Lowering frontends talk to the backend's in-progress graph exclusively
//! through the [`WebnnGraphBuilder`] trait: they look up operand handles,
//! emit operations with strongly-typed options bags, and receive the handle
//! of each produced value. The [`trace`] module ships a recording builder
//! that backs the test suites and debugging tooling.

mod spec;

pub mod trace;

pub use spec::{
    BatchNormOptions, BuildError, BuildResult, DType, InstanceNormOptions, LayerNormOptions,
    OperandId, WebnnGraphBuilder,
};
