//! Recording reference implementation of [`WebnnGraphBuilder`].
//!
//! `TraceGraph` mints sequential operand ids and keeps every emitted
//! operation as a [`TraceOp`] record, so tests and debugging tools can assert
//! on the exact operation sequence a lowering produced without a real
//! backend being attached.

use crate::spec::{
    BatchNormOptions, BuildResult, InstanceNormOptions, LayerNormOptions, OperandId,
    WebnnGraphBuilder,
};

/// One operation recorded by [`TraceGraph`].
#[derive(Debug, Clone, PartialEq)]
pub enum TraceOp {
    Reshape {
        input: OperandId,
        new_shape: Vec<u32>,
        label: String,
        output: OperandId,
    },
    BatchNormalization {
        input: OperandId,
        mean: OperandId,
        variance: OperandId,
        options: BatchNormOptions,
        output: OperandId,
    },
    InstanceNormalization {
        input: OperandId,
        options: InstanceNormOptions,
        output: OperandId,
    },
    LayerNormalization {
        input: OperandId,
        options: LayerNormOptions,
        output: OperandId,
    },
}

impl TraceOp {
    /// Operand produced by the recorded operation.
    pub fn output(&self) -> OperandId {
        match self {
            TraceOp::Reshape { output, .. }
            | TraceOp::BatchNormalization { output, .. }
            | TraceOp::InstanceNormalization { output, .. }
            | TraceOp::LayerNormalization { output, .. } => *output,
        }
    }

    /// Label attached to the recorded operation.
    pub fn label(&self) -> &str {
        match self {
            TraceOp::Reshape { label, .. } => label,
            TraceOp::BatchNormalization { options, .. } => &options.label,
            TraceOp::InstanceNormalization { options, .. } => &options.label,
            TraceOp::LayerNormalization { options, .. } => &options.label,
        }
    }
}

/// In-memory graph builder that records emissions instead of compiling them.
#[derive(Debug, Default)]
pub struct TraceGraph {
    next_operand: u32,
    inputs: Vec<(String, OperandId)>,
    ops: Vec<TraceOp>,
}

impl TraceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&mut self) -> OperandId {
        let id = OperandId::new(self.next_operand);
        self.next_operand += 1;
        id
    }

    /// Mints a source operand, standing in for a graph input or constant.
    pub fn input(&mut self, label: &str) -> OperandId {
        let id = self.mint();
        self.inputs.push((label.to_string(), id));
        id
    }

    /// Source operands minted so far, in creation order.
    pub fn inputs(&self) -> &[(String, OperandId)] {
        &self.inputs
    }

    /// Operations emitted so far, in emission order.
    pub fn ops(&self) -> &[TraceOp] {
        &self.ops
    }
}

impl WebnnGraphBuilder for TraceGraph {
    fn reshape(
        &mut self,
        input: OperandId,
        new_shape: &[u32],
        label: &str,
    ) -> BuildResult<OperandId> {
        let output = self.mint();
        self.ops.push(TraceOp::Reshape {
            input,
            new_shape: new_shape.to_vec(),
            label: label.to_string(),
            output,
        });
        Ok(output)
    }

    fn batch_normalization(
        &mut self,
        input: OperandId,
        mean: OperandId,
        variance: OperandId,
        options: BatchNormOptions,
    ) -> BuildResult<OperandId> {
        let output = self.mint();
        self.ops.push(TraceOp::BatchNormalization {
            input,
            mean,
            variance,
            options,
            output,
        });
        Ok(output)
    }

    fn instance_normalization(
        &mut self,
        input: OperandId,
        options: InstanceNormOptions,
    ) -> BuildResult<OperandId> {
        let output = self.mint();
        self.ops.push(TraceOp::InstanceNormalization {
            input,
            options,
            output,
        });
        Ok(output)
    }

    fn layer_normalization(
        &mut self,
        input: OperandId,
        options: LayerNormOptions,
    ) -> BuildResult<OperandId> {
        let output = self.mint();
        self.ops.push(TraceOp::LayerNormalization {
            input,
            options,
            output,
        });
        Ok(output)
    }
}
