use crate::format::ResolvedFormat;
use crate::serde_schema::SerdeSchema;
use regex::Regex;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

/// A handle to a node in a [`CompiledSchema`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// The resolved, immutable form of a schema.
///
/// Nodes live in an arena and refer to each other by [`NodeId`], so a
/// recursive `$ref` is a back-reference rather than a copy.
#[derive(Debug)]
pub struct CompiledSchema {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) root_required: bool,
}

impl CompiledSchema {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of compiled nodes, including nodes reached only through
    /// references.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

#[derive(Debug, Default)]
pub(crate) struct Node {
    /// Set when the node is a `$ref`. The executor validates against the
    /// target instead and ignores everything else here.
    pub ref_: Option<NodeId>,

    pub types: Option<Vec<Type>>,

    /// Names from `required: [..]` followed by properties flagged
    /// `required: true`, without duplicates.
    pub required: Vec<String>,

    pub properties: Vec<(String, NodeId)>,
    pub additional_properties: Extra,
    pub items: Option<Items>,

    /// Tuple positions whose schema is flagged `required: true`.
    pub required_items: Vec<usize>,

    pub additional_items: Extra,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub enum_: Option<Vec<Value>>,
    pub minimum: Option<Bound>,
    pub maximum: Option<Bound>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Regex>,
    pub format: Option<NodeFormat>,
}

impl Node {
    pub fn property(&self, name: &str) -> Option<NodeId> {
        self.properties
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, id)| *id)
    }
}

#[derive(Debug)]
pub(crate) enum Items {
    Single(NodeId),
    Tuple(Vec<NodeId>),
}

/// What to do with object keys or array elements the schema does not
/// declare.
#[derive(Debug)]
pub(crate) enum Extra {
    Allow,
    Deny,
    Schema(NodeId),
}

impl Default for Extra {
    fn default() -> Self {
        Extra::Allow
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Bound {
    pub limit: f64,
    pub exclusive: bool,
}

/// A format check together with the schema node that declared it, which
/// predicates receive as their second argument.
#[derive(Debug)]
pub(crate) struct NodeFormat {
    pub format: ResolvedFormat,
    pub node: Arc<SerdeSchema>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Type {
    Any,
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl Type {
    pub fn matches(self, instance: &Value) -> bool {
        match self {
            Type::Any => true,
            Type::Object => instance.is_object(),
            Type::Array => instance.is_array(),
            Type::String => instance.is_string(),
            Type::Number => instance.is_number(),
            Type::Integer => {
                instance.is_i64()
                    || instance.is_u64()
                    || instance.as_f64().map_or(false, |f| f.fract() == 0.0)
            }
            Type::Boolean => instance.is_boolean(),
            Type::Null => instance.is_null(),
        }
    }
}

impl FromStr for Type {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Self::Any),
            "object" => Ok(Self::Object),
            "array" => Ok(Self::Array),
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "integer" => Ok(Self::Integer),
            "boolean" => Ok(Self::Boolean),
            "null" => Ok(Self::Null),
            _ => Err(()),
        }
    }
}
