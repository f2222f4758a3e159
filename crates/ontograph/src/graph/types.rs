//! Core graph types: nodes, edges, IDs, and enums.

use super::key::{KindFamily, NodeKey, QualifiedName};
use super::property::{PropertyMap, PropertyValue};
use serde::{Deserialize, Serialize};

/// Arena slot of a node (monotonic counter, never reused).
pub type NodeId = u64;

/// Arena slot of an edge (monotonic counter, never reused).
pub type EdgeId = u64;

/// Kind of a declared entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// Namespace, including the implicit global namespace
    Namespace,
    /// `class` record type
    Class,
    /// `struct` record type
    Struct,
    /// Free function
    Function,
    /// Member function
    Method,
    /// Constructor of a record
    Constructor,
    /// Destructor of a record
    Destructor,
    /// `using X = T;` or `typedef T X;`
    TypeAlias,
    /// Data member of a record
    Field,
    /// Placeholder for a reference outside the analyzed corpus
    External,
}

impl NodeKind {
    /// Identity family this kind belongs to.
    pub fn family(self) -> KindFamily {
        match self {
            NodeKind::Namespace | NodeKind::Class | NodeKind::Struct => KindFamily::Scope,
            NodeKind::Function
            | NodeKind::Method
            | NodeKind::Constructor
            | NodeKind::Destructor => KindFamily::Callable,
            NodeKind::TypeAlias => KindFamily::Alias,
            NodeKind::Field => KindFamily::Field,
            NodeKind::External => KindFamily::External,
        }
    }

    /// Class or struct.
    pub fn is_record(self) -> bool {
        matches!(self, NodeKind::Class | NodeKind::Struct)
    }

    /// Function, method, constructor or destructor.
    pub fn is_callable(self) -> bool {
        self.family() == KindFamily::Callable
    }

    /// Kinds that may take part in overload groups; constructors of one
    /// class overload each other, destructors never do.
    pub fn is_overloadable(self) -> bool {
        matches!(
            self,
            NodeKind::Function | NodeKind::Method | NodeKind::Constructor
        )
    }

    /// Kinds that a type reference can resolve to.
    pub fn is_type(self) -> bool {
        matches!(self, NodeKind::Class | NodeKind::Struct | NodeKind::TypeAlias)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Namespace => write!(f, "Namespace"),
            NodeKind::Class => write!(f, "Class"),
            NodeKind::Struct => write!(f, "Struct"),
            NodeKind::Function => write!(f, "Function"),
            NodeKind::Method => write!(f, "Method"),
            NodeKind::Constructor => write!(f, "Constructor"),
            NodeKind::Destructor => write!(f, "Destructor"),
            NodeKind::TypeAlias => write!(f, "TypeAlias"),
            NodeKind::Field => write!(f, "Field"),
            NodeKind::External => write!(f, "External"),
        }
    }
}

/// Kind of relation between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Enclosing scope contains member (namespace → class, class → method)
    Contains,
    /// Derived record inherits from base record
    Inherits,
    /// Derived method overrides base method
    Overrides,
    /// Two callables share scope and simple name with different signatures
    Overloads,
    /// Function body calls another callable
    Calls,
    /// Record composes a value of the target type through a data member
    HasField,
    /// Parameter, return, field, local or alias type reference
    UsesType,
}

impl EdgeKind {
    /// All edge kinds, in declaration order.
    pub const ALL: [EdgeKind; 7] = [
        EdgeKind::Contains,
        EdgeKind::Inherits,
        EdgeKind::Overrides,
        EdgeKind::Overloads,
        EdgeKind::Calls,
        EdgeKind::HasField,
        EdgeKind::UsesType,
    ];
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeKind::Contains => write!(f, "Contains"),
            EdgeKind::Inherits => write!(f, "Inherits"),
            EdgeKind::Overrides => write!(f, "Overrides"),
            EdgeKind::Overloads => write!(f, "Overloads"),
            EdgeKind::Calls => write!(f, "Calls"),
            EdgeKind::HasField => write!(f, "HasField"),
            EdgeKind::UsesType => write!(f, "UsesType"),
        }
    }
}

/// Direction for neighbor queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Follow outgoing edges (from this node)
    Outgoing,
    /// Follow incoming edges (to this node)
    Incoming,
    /// Follow edges in both directions
    Both,
}

/// A declared entity.
///
/// One concrete type for every kind; kind-specific metadata lives in
/// [`Node::attributes`] under the keys listed in [`crate::attrs`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Arena slot assigned by the graph
    pub id: NodeId,
    /// Stable identity
    pub key: NodeKey,
    /// Kind of entity
    pub kind: NodeKind,
    /// Kind-specific metadata
    pub attributes: PropertyMap,
}

impl Node {
    /// Create a new node (ID will be assigned by graph).
    pub fn new(id: NodeId, key: NodeKey, kind: NodeKind, attributes: PropertyMap) -> Self {
        Self {
            id,
            key,
            kind,
            attributes,
        }
    }

    /// Fully qualified name.
    pub fn qualified_name(&self) -> &QualifiedName {
        &self.key.name
    }

    /// Simple (last) name; empty for the global namespace.
    pub fn name(&self) -> &str {
        self.key.name.simple()
    }

    /// Add or update an attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.attributes.insert(key, value);
    }

    /// Get an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&PropertyValue> {
        self.attributes.get(key)
    }

    /// Read a boolean flag, treating absence as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.attributes.get_bool(key).unwrap_or(false)
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.key.signature {
            Some(sig) => write!(f, "{} {}{}", self.kind, self.key.name, sig),
            None => write!(f, "{} {}", self.kind, self.key.name),
        }
    }
}

/// A directed edge in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Arena slot assigned by graph
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    /// Type of relationship
    pub kind: EdgeKind,
    /// Optional metadata (e.g., call lines, type roles)
    pub attributes: PropertyMap,
}

impl Edge {
    /// Create a new edge (ID will be assigned by graph).
    pub fn new(
        id: EdgeId,
        source: NodeId,
        target: NodeId,
        kind: EdgeKind,
        attributes: PropertyMap,
    ) -> Self {
        Self {
            id,
            source,
            target,
            kind,
            attributes,
        }
    }

    /// Add or update an attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.attributes.insert(key, value);
    }

    /// Get an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&PropertyValue> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_families() {
        assert_eq!(NodeKind::Class.family(), KindFamily::Scope);
        assert_eq!(NodeKind::Namespace.family(), KindFamily::Scope);
        assert_eq!(NodeKind::Constructor.family(), KindFamily::Callable);
        assert_eq!(NodeKind::TypeAlias.family(), KindFamily::Alias);
        assert!(NodeKind::Struct.is_record());
        assert!(!NodeKind::Namespace.is_record());
        assert!(NodeKind::Constructor.is_overloadable());
        assert!(!NodeKind::Destructor.is_overloadable());
    }

    #[test]
    fn test_node_display() {
        let key = NodeKey::callable(QualifiedName::parse("app::run"), "(int)");
        let node = Node::new(3, key, NodeKind::Function, PropertyMap::new());
        assert_eq!(node.to_string(), "Function app::run(int)");
        assert_eq!(node.name(), "run");
    }

    #[test]
    fn test_edge_attributes() {
        let mut edge = Edge::new(1, 10, 20, EdgeKind::Calls, PropertyMap::new());
        edge.set_attribute("call_lines", vec![4i64, 9i64]);
        assert_eq!(
            edge.attributes.get_int_list("call_lines"),
            Some(&[4i64, 9i64][..])
        );
    }
}
