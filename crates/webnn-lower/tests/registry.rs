use std::sync::Arc;

use webnn_graph::trace::{TraceGraph, TraceOp};
use webnn_graph::{BuildError, BuildResult, DType};
use webnn_lower::builder::{ModelBuilder, OpBuilder, OpBuilderRegistry};
use webnn_lower::ir::{GraphInfo, Node};
use webnn_lower::normalization::{register_normalization_op_builders, NORMALIZATION_OP_TYPES};

/// Builder stub that refuses everything, used to probe registration rules.
struct RejectAll;

impl OpBuilder for RejectAll {
    fn is_op_supported(&self, _graph: &GraphInfo, _node: &Node) -> bool {
        false
    }

    fn has_supported_inputs(&self, _graph: &GraphInfo, _node: &Node) -> bool {
        false
    }

    fn build(&self, _model: &mut ModelBuilder<'_>, _node: &Node) -> BuildResult<()> {
        Err(BuildError::internal("RejectAll cannot build"))
    }
}

#[test]
fn registers_all_normalization_kinds_against_one_builder() {
    let mut registry = OpBuilderRegistry::new();
    register_normalization_op_builders(&mut registry);

    assert_eq!(registry.len(), 3);
    assert_eq!(
        registry.op_types(),
        vec![
            "BatchNormalization",
            "InstanceNormalization",
            "LayerNormalization"
        ]
    );

    let batch = registry.get("BatchNormalization").expect("registered");
    for op_type in NORMALIZATION_OP_TYPES {
        let builder = registry.get(op_type).expect("registered");
        assert!(Arc::ptr_eq(batch, builder), "{op_type} shares the instance");
    }
}

#[test]
fn registration_is_idempotent() {
    let mut registry = OpBuilderRegistry::new();
    register_normalization_op_builders(&mut registry);
    let before = Arc::clone(registry.get("InstanceNormalization").expect("registered"));

    register_normalization_op_builders(&mut registry);

    assert_eq!(registry.len(), 3);
    let after = registry.get("InstanceNormalization").expect("registered");
    assert!(Arc::ptr_eq(&before, after));
}

#[test]
fn registration_never_overwrites_an_existing_mapping() {
    let mut registry = OpBuilderRegistry::new();
    let stub: Arc<dyn OpBuilder> = Arc::new(RejectAll);
    registry.register("BatchNormalization", Arc::clone(&stub));

    register_normalization_op_builders(&mut registry);

    assert_eq!(registry.len(), 3);
    let mapped = registry.get("BatchNormalization").expect("registered");
    assert!(Arc::ptr_eq(&stub, mapped));
}

#[test]
fn lower_node_dispatches_by_op_type() {
    let mut registry = OpBuilderRegistry::new();
    register_normalization_op_builders(&mut registry);

    let node = Node::new("LayerNormalization", "ln0")
        .with_input("x")
        .with_input("scale")
        .with_output("y");
    let graph = GraphInfo::new()
        .with_tensor("x", vec![2, 8], DType::F32)
        .with_tensor("scale", vec![8], DType::F32);

    let mut trace = TraceGraph::new();
    let x = trace.input("x");
    let scale = trace.input("scale");

    let mut model = ModelBuilder::new(&graph, &mut trace);
    model.register_operand("x", x);
    model.register_operand("scale", scale);
    model
        .lower_node(&registry, &node)
        .expect("layer norm should lower");
    assert!(model.has_operand("y"));
    drop(model);

    assert!(matches!(
        trace.ops(),
        [TraceOp::LayerNormalization { .. }]
    ));
}

#[test]
fn lower_node_rejects_unmapped_op_type() {
    let registry = OpBuilderRegistry::new();
    let node = Node::new("Softmax", "sm0").with_input("x").with_output("y");
    let graph = GraphInfo::new().with_tensor("x", vec![2, 8], DType::F32);

    let mut trace = TraceGraph::new();
    let mut model = ModelBuilder::new(&graph, &mut trace);
    let err = model.lower_node(&registry, &node).unwrap_err();
    assert!(matches!(err, BuildError::UnsupportedOp { .. }));
}
