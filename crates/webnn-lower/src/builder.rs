//! Per-compilation lowering context and the operator-builder registry.
//!
//! A [`ModelBuilder`] is created once per graph compilation: it borrows the
//! host graph's shape/dtype catalog and the backend's in-progress graph, and
//! owns the name→operand registry operator builders publish into. The
//! [`OpBuilderRegistry`] maps operator type names to shared builder
//! instances; registration is insert-if-absent so repeated module
//! initialization is a no-op.

use std::collections::HashMap;
use std::sync::Arc;

use webnn_graph::{BuildError, BuildResult, OperandId, WebnnGraphBuilder};

use crate::ir::{GraphInfo, Node};

/// Compiles one operator kind (or family of kinds) onto the backend builder.
///
/// `is_op_supported` and `has_supported_inputs` are side-effect-free
/// predicates the caller runs before committing to this backend; `build`
/// emits the operation sequence and registers the node's output operand.
pub trait OpBuilder: Send + Sync {
    /// Structural eligibility: input/output arity, resolvable shapes, and
    /// attribute gating. Failures are reported at debug level, never as
    /// errors.
    fn is_op_supported(&self, graph: &GraphInfo, node: &Node) -> bool;

    /// Dtype eligibility across all present inputs.
    fn has_supported_inputs(&self, graph: &GraphInfo, node: &Node) -> bool;

    /// Combined support query the host runs per node.
    fn supported(&self, graph: &GraphInfo, node: &Node) -> bool {
        self.is_op_supported(graph, node) && self.has_supported_inputs(graph, node)
    }

    /// Emits the backend operations for an already-accepted node. Constraint
    /// violations here indicate an inconsistent upstream graph and abort
    /// compilation of the operator.
    fn build(&self, model: &mut ModelBuilder<'_>, node: &Node) -> BuildResult<()>;
}

/// Explicit operator-type → builder mapping, constructed during session
/// initialization and passed by reference to compilation.
#[derive(Default)]
pub struct OpBuilderRegistry {
    builders: HashMap<String, Arc<dyn OpBuilder>>,
}

impl OpBuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `op_type` to `builder` unless the type is already mapped;
    /// re-registration is a no-op.
    pub fn register(&mut self, op_type: impl Into<String>, builder: Arc<dyn OpBuilder>) {
        self.builders.entry(op_type.into()).or_insert(builder);
    }

    pub fn get(&self, op_type: &str) -> Option<&Arc<dyn OpBuilder>> {
        self.builders.get(op_type)
    }

    pub fn contains(&self, op_type: &str) -> bool {
        self.builders.contains_key(op_type)
    }

    /// Registered operator type names, sorted for stable output.
    pub fn op_types(&self) -> Vec<&str> {
        let mut op_types: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        op_types.sort_unstable();
        op_types
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

/// Mutable state for compiling one host graph onto one backend graph.
pub struct ModelBuilder<'a> {
    graph: &'a GraphInfo,
    backend: &'a mut dyn WebnnGraphBuilder,
    operands: HashMap<String, OperandId>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(graph: &'a GraphInfo, backend: &'a mut dyn WebnnGraphBuilder) -> Self {
        Self {
            graph,
            backend,
            operands: HashMap::new(),
        }
    }

    pub fn graph(&self) -> &GraphInfo {
        self.graph
    }

    pub fn backend(&mut self) -> &mut dyn WebnnGraphBuilder {
        &mut *self.backend
    }

    /// Looks up the operand registered under an input name.
    pub fn operand(&self, name: &str) -> BuildResult<OperandId> {
        self.operands
            .get(name)
            .copied()
            .ok_or_else(|| BuildError::missing_operand(name))
    }

    pub fn has_operand(&self, name: &str) -> bool {
        self.operands.contains_key(name)
    }

    /// Publishes an operand under a tensor name, making it visible to later
    /// operators in the same compilation.
    pub fn register_operand(&mut self, name: impl Into<String>, operand: OperandId) {
        self.operands.insert(name.into(), operand);
    }

    /// Dispatches one node to its registered builder.
    pub fn lower_node(&mut self, registry: &OpBuilderRegistry, node: &Node) -> BuildResult<()> {
        let builder = registry.get(node.op_type()).ok_or_else(|| {
            BuildError::unsupported_op(node.op_type(), "no registered builder")
        })?;
        builder.build(self, node)
    }
}
