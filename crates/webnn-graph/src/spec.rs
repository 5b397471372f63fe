use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scalar element types a portable graph can declare for its tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    F16,
    F32,
    F64,
    I8,
    U8,
    I32,
    U32,
    I64,
    U64,
}

impl DType {
    /// Returns `true` when the dtype is a floating-point representation.
    pub fn is_float(self) -> bool {
        matches!(self, DType::F16 | DType::F32 | DType::F64)
    }

    /// Returns `true` when the dtype is a signed or unsigned integer.
    pub fn is_integer(self) -> bool {
        !self.is_float()
    }
}

/// Opaque handle naming a value in the backend's in-progress graph.
///
/// Handles are minted by the builder when an operation is emitted and have no
/// meaning outside the builder that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperandId(u32);

impl OperandId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Options bag for a `batchNormalization` emission.
///
/// Constructed freshly per call and handed to the builder by value; the
/// `label` is debug metadata only and need not be unique.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchNormOptions {
    pub scale: OperandId,
    pub bias: Option<OperandId>,
    pub epsilon: f32,
    pub label: String,
}

/// Options bag for an `instanceNormalization` emission.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceNormOptions {
    pub scale: OperandId,
    pub bias: Option<OperandId>,
    pub epsilon: f32,
    pub label: String,
}

/// Options bag for a `layerNormalization` emission.
///
/// `axes` lists the dimensions normalized over; the backend computes mean and
/// variance internally, so no statistics operands are taken.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerNormOptions {
    pub scale: OperandId,
    pub bias: Option<OperandId>,
    pub epsilon: f32,
    pub axes: Vec<u32>,
    pub label: String,
}

/// Failure emitting onto or validating against the backend graph.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// The upstream graph violated an operator invariant the eligibility
    /// phase is supposed to guarantee; compilation of the operator aborts.
    #[error("invalid graph: {message}")]
    InvalidGraph { message: String },

    /// An input name was never published into the operand registry.
    #[error("operand '{name}' is not registered")]
    MissingOperand { name: String },

    /// No builder is registered for the operator type.
    #[error("unsupported operator {op_type}: {reason}")]
    UnsupportedOp { op_type: String, reason: String },

    /// Internal-consistency bug, e.g. an operator kind reaching an emitter
    /// that never registered for it.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl BuildError {
    pub fn invalid_graph(message: impl Into<String>) -> Self {
        BuildError::InvalidGraph {
            message: message.into(),
        }
    }

    pub fn missing_operand(name: impl Into<String>) -> Self {
        BuildError::MissingOperand { name: name.into() }
    }

    pub fn unsupported_op(op_type: impl Into<String>, reason: impl Into<String>) -> Self {
        BuildError::UnsupportedOp {
            op_type: op_type.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        BuildError::Internal {
            message: message.into(),
        }
    }
}

pub type BuildResult<T> = Result<T, BuildError>;

/// Emission surface of a WebNN-style backend graph under construction.
///
/// Each method appends one operation and returns the operand holding its
/// result. Shape arguments use the backend's `u32` dimension type; callers
/// convert from the host graph's native width before emitting.
pub trait WebnnGraphBuilder {
    /// Reinterprets `input` with `new_shape` (same element count).
    fn reshape(&mut self, input: OperandId, new_shape: &[u32], label: &str)
        -> BuildResult<OperandId>;

    /// Inference-mode batch normalization with precomputed statistics.
    fn batch_normalization(
        &mut self,
        input: OperandId,
        mean: OperandId,
        variance: OperandId,
        options: BatchNormOptions,
    ) -> BuildResult<OperandId>;

    /// Instance normalization; the backend accepts rank-4 input only.
    fn instance_normalization(
        &mut self,
        input: OperandId,
        options: InstanceNormOptions,
    ) -> BuildResult<OperandId>;

    /// Layer normalization over the contiguous axes in the options bag.
    fn layer_normalization(
        &mut self,
        input: OperandId,
        options: LayerNormOptions,
    ) -> BuildResult<OperandId>;
}
