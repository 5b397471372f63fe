//! Lowering for the normalization operator family.
//!
//! One builder serves `BatchNormalization`, `InstanceNormalization`, and
//! `LayerNormalization`: the three kinds share their eligibility and
//! shape-validation rules and differ only in the emitted call. The backend's
//! `instanceNormalization` primitive accepts rank-4 input only, so inputs of
//! any other rank are funneled through a reshape pair that pads or folds the
//! shape to rank 4 and restores the original shape on the output.

use std::sync::Arc;

use tracing::debug;
use webnn_graph::{
    BatchNormOptions, BuildError, BuildResult, DType, InstanceNormOptions, LayerNormOptions,
};

use crate::builder::{ModelBuilder, OpBuilder, OpBuilderRegistry};
use crate::ir::{GraphInfo, Node};

/// Operator type names served by [`NormalizationOpBuilder`].
pub const NORMALIZATION_OP_TYPES: &[&str] = &[
    "BatchNormalization",
    "InstanceNormalization",
    "LayerNormalization",
];

const DEFAULT_EPSILON: f32 = 1e-5;

/// The backend's `instanceNormalization` primitive mandates rank-4 input.
const INSTANCE_NORM_RANK: usize = 4;

/// Lowers batch, instance, and layer normalization nodes.
#[derive(Debug, Default)]
pub struct NormalizationOpBuilder;

/// Maps the three normalization operator types to one shared builder
/// instance. Idempotent: types already present in the registry keep their
/// existing mapping.
pub fn register_normalization_op_builders(registry: &mut OpBuilderRegistry) {
    let builder: Arc<dyn OpBuilder> = Arc::new(NormalizationOpBuilder);
    for op_type in NORMALIZATION_OP_TYPES {
        registry.register(*op_type, Arc::clone(&builder));
    }
}

impl OpBuilder for NormalizationOpBuilder {
    fn is_op_supported(&self, graph: &GraphInfo, node: &Node) -> bool {
        let op_type = node.op_type();

        if node.inputs().len() < 2 {
            debug!(op_type, "requires at least two inputs");
            return false;
        }
        if graph.shape(node.inputs()[0].name()).is_none() {
            debug!(op_type, "cannot resolve input shape");
            return false;
        }
        if node.outputs().len() != 1 {
            debug!(op_type, "output count must be one");
            return false;
        }
        if op_type == "BatchNormalization" && node.i64_attr("training_mode", 0) != 0 {
            debug!("BatchNormalization with training_mode set is not supported");
            return false;
        }

        true
    }

    fn has_supported_inputs(&self, graph: &GraphInfo, node: &Node) -> bool {
        let op_type = node.op_type();
        let inputs = node.inputs();
        if inputs.len() < 2 {
            return false;
        }

        // Data, scale, and whichever of bias/mean/variance are present.
        let mut dtypes = Vec::with_capacity(5);
        for (index, input) in inputs.iter().take(5).enumerate() {
            if index >= 2 && !input.exists() {
                continue;
            }
            match graph.dtype(input.name()) {
                Some(dtype) => dtypes.push(dtype),
                None => {
                    debug!(op_type, input = input.name(), "cannot resolve input dtype");
                    return false;
                }
            }
        }

        let data_dtype = dtypes[0];
        if !matches!(data_dtype, DType::F32 | DType::F16) {
            debug!(op_type, ?data_dtype, "input dtype is not supported");
            return false;
        }
        if dtypes.iter().any(|dtype| *dtype != data_dtype) {
            debug!(op_type, "input dtypes must all match the data dtype");
            return false;
        }

        true
    }

    fn build(&self, model: &mut ModelBuilder<'_>, node: &Node) -> BuildResult<()> {
        build_normalization(model, node)
    }
}

fn build_normalization(model: &mut ModelBuilder<'_>, node: &Node) -> BuildResult<()> {
    let op_type = node.op_type();
    let inputs = node.inputs();
    if inputs.len() < 2 {
        return Err(BuildError::invalid_graph(format!(
            "{op_type} requires at least two inputs"
        )));
    }

    let input_shape = model
        .graph()
        .shape(inputs[0].name())
        .ok_or_else(|| BuildError::invalid_graph(format!("{op_type}: cannot resolve input shape")))?
        .to_vec();
    let rank = input_shape.len();

    let scale_shape = model
        .graph()
        .shape(inputs[1].name())
        .ok_or_else(|| BuildError::invalid_graph(format!("{op_type}: cannot resolve scale shape")))?
        .to_vec();
    let scale_rank = scale_shape.len();

    // Except LayerNormalization, the scale input must be one-dimensional.
    if op_type == "LayerNormalization" {
        if scale_rank < 1 || scale_rank > rank {
            return Err(BuildError::invalid_graph(format!(
                "{op_type}: scale rank {scale_rank} must be within 1..={rank}"
            )));
        }
    } else if scale_rank != 1 {
        return Err(BuildError::invalid_graph(format!(
            "{op_type}: scale must be one-dimensional"
        )));
    }

    let bias = if inputs.len() >= 3 && inputs[2].exists() {
        let bias_shape = model.graph().shape(inputs[2].name()).ok_or_else(|| {
            BuildError::invalid_graph(format!("{op_type}: cannot resolve bias shape"))
        })?;
        if bias_shape != scale_shape.as_slice() {
            return Err(BuildError::invalid_graph(format!(
                "{op_type}: bias shape must equal scale shape"
            )));
        }
        Some(model.operand(inputs[2].name())?)
    } else {
        None
    };

    let mut input = model.operand(inputs[0].name())?;
    let scale = model.operand(inputs[1].name())?;
    let epsilon = node.f32_attr("epsilon", DEFAULT_EPSILON);
    let label = node.name().to_string();

    let output = match op_type {
        "BatchNormalization" => {
            if inputs.len() != 5 {
                return Err(BuildError::invalid_graph(
                    "BatchNormalization requires five inputs",
                ));
            }
            let mean = model.operand(inputs[3].name())?;
            let variance = model.operand(inputs[4].name())?;
            model.backend().batch_normalization(
                input,
                mean,
                variance,
                BatchNormOptions {
                    scale,
                    bias,
                    epsilon,
                    label,
                },
            )?
        }
        "LayerNormalization" => {
            let axis = node.i64_attr("axis", -1);
            let axis = normalize_axis(axis, rank).ok_or_else(|| {
                BuildError::invalid_graph(format!(
                    "LayerNormalization: axis {axis} is out of range for rank {rank}"
                ))
            })?;
            let axes = (axis..rank).map(|axis| axis as u32).collect();
            model.backend().layer_normalization(
                input,
                LayerNormOptions {
                    scale,
                    bias,
                    epsilon,
                    axes,
                    label,
                },
            )?
        }
        "InstanceNormalization" => {
            if rank != INSTANCE_NORM_RANK {
                let working_shape = shape_to_u32(&instance_norm_working_shape(&input_shape))?;
                input = model.backend().reshape(
                    input,
                    &working_shape,
                    &format!("{}_reshape_input", node.name()),
                )?;
            }
            let mut output = model.backend().instance_normalization(
                input,
                InstanceNormOptions {
                    scale,
                    bias,
                    epsilon,
                    label,
                },
            )?;
            // Restore the original shape on the output.
            if rank != INSTANCE_NORM_RANK {
                let restored = shape_to_u32(&input_shape)?;
                output = model.backend().reshape(
                    output,
                    &restored,
                    &format!("{}reshape_output", node.name()),
                )?;
            }
            output
        }
        other => {
            return Err(BuildError::internal(format!(
                "unsupported normalization op {other}"
            )))
        }
    };

    model.register_operand(node.outputs()[0].clone(), output);
    Ok(())
}

/// Resolves a possibly-negative axis attribute against the input rank.
fn normalize_axis(axis: i64, rank: usize) -> Option<usize> {
    let rank = rank as i64;
    let adjusted = if axis < 0 { axis + rank } else { axis };
    (0..rank).contains(&adjusted).then_some(adjusted as usize)
}

/// Maps an arbitrary-rank shape onto the rank-4 working shape accepted by
/// the backend's `instanceNormalization`.
///
/// Shapes below rank 4 keep their last dimension last and fill the gap with
/// unit dims (`[2,3,5]` → `[2,3,1,5]`); shapes above rank 4 fold their
/// trailing dims into one product (`[2,3,4,5,6]` → `[2,3,4,30]`). Both cases
/// preserve the element count, so the round-trip reshape is lossless.
pub fn instance_norm_working_shape(dims: &[usize]) -> Vec<usize> {
    let rank = dims.len();
    if rank > INSTANCE_NORM_RANK {
        let folded = dims[INSTANCE_NORM_RANK - 1..].iter().product();
        let mut working = dims[..INSTANCE_NORM_RANK - 1].to_vec();
        working.push(folded);
        working
    } else if rank == 0 {
        vec![1; INSTANCE_NORM_RANK]
    } else {
        let mut working = dims[..rank - 1].to_vec();
        working.resize(INSTANCE_NORM_RANK - 1, 1);
        working.push(dims[rank - 1]);
        working
    }
}

fn shape_to_u32(dims: &[usize]) -> BuildResult<Vec<u32>> {
    dims.iter()
        .map(|dim| {
            u32::try_from(*dim).map_err(|_| {
                BuildError::invalid_graph(format!("dimension {dim} exceeds the backend shape range"))
            })
        })
        .collect()
}
