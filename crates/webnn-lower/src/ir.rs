//! Read-only view of the host graph being compiled.
//!
//! The host graph owns its nodes, tensors, and initializers; this module
//! models just the slice of it operator builders consume: an immutable
//! [`Node`] (operator type, ordered input/output names, attributes) and a
//! [`GraphInfo`] catalog resolving tensor names to shapes and dtypes. An
//! unresolvable shape or dtype is a legitimate state and surfaces as `None`.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use webnn_graph::DType;

/// Attribute payload attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Float(f32),
    Int(i64),
    Ints(Vec<i64>),
    Str(String),
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        AttrValue::Float(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(value: Vec<i64>) -> Self {
        AttrValue::Ints(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

/// One slot in a node's ordered input list.
///
/// Optional inputs a model chose to omit keep their position with an empty
/// name, so later inputs stay at their documented indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInput {
    name: String,
}

impl NodeInput {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `false` for an omitted optional input.
    pub fn exists(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Immutable operator node view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    name: String,
    op_type: String,
    inputs: Vec<NodeInput>,
    outputs: Vec<String>,
    attributes: BTreeMap<String, AttrValue>,
}

impl Node {
    pub fn new(op_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op_type: op_type.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(NodeInput { name: name.into() });
        self
    }

    /// Appends an omitted optional input, holding its position in the list.
    pub fn with_omitted_input(mut self) -> Self {
        self.inputs.push(NodeInput {
            name: String::new(),
        });
        self
    }

    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(name.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn inputs(&self) -> &[NodeInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Float attribute with lenient int coercion, as the host's attribute
    /// helper behaves.
    pub fn f32_attr(&self, key: &str, default: f32) -> f32 {
        match self.attributes.get(key) {
            Some(AttrValue::Float(value)) => *value,
            Some(AttrValue::Int(value)) => *value as f32,
            _ => default,
        }
    }

    /// Integer attribute with lenient float coercion.
    pub fn i64_attr(&self, key: &str, default: i64) -> i64 {
        match self.attributes.get(key) {
            Some(AttrValue::Int(value)) => *value,
            Some(AttrValue::Float(value)) => *value as i64,
            _ => default,
        }
    }
}

/// Shape/dtype catalog plus the initializer name set for one host graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphInfo {
    shapes: HashMap<String, Vec<usize>>,
    dtypes: HashMap<String, DType>,
    initializers: HashSet<String>,
}

impl GraphInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tensor(self, name: impl Into<String>, shape: Vec<usize>, dtype: DType) -> Self {
        let name = name.into();
        self.with_shape(name.clone(), shape).with_dtype(name, dtype)
    }

    pub fn with_shape(mut self, name: impl Into<String>, shape: Vec<usize>) -> Self {
        self.shapes.insert(name.into(), shape);
        self
    }

    pub fn with_dtype(mut self, name: impl Into<String>, dtype: DType) -> Self {
        self.dtypes.insert(name.into(), dtype);
        self
    }

    pub fn with_initializer(mut self, name: impl Into<String>) -> Self {
        self.initializers.insert(name.into());
        self
    }

    /// Resolved shape of a tensor, or `None` when the host graph does not
    /// know it.
    pub fn shape(&self, name: &str) -> Option<&[usize]> {
        self.shapes.get(name).map(Vec::as_slice)
    }

    /// Resolved dtype of a tensor, or `None` when unknown.
    pub fn dtype(&self, name: &str) -> Option<DType> {
        self.dtypes.get(name).copied()
    }

    pub fn is_initializer(&self, name: &str) -> bool {
        self.initializers.contains(name)
    }
}
