//! # ontograph
//!
//! A typed entity-relationship graph of declared C++ entities: namespaces,
//! classes, structs, functions, methods, fields and type aliases, connected by
//! containment, inheritance, overriding, overloading, call, field and type-usage
//! relations.
//!
//! ## Core Principles
//!
//! - **Parser Agnostic**: front-ends produce declarations, the graph stores entities
//! - **Stable Identity**: nodes are keyed by qualified name + kind family + signature
//! - **Explicit Lifecycle**: construct empty, merge incrementally, freeze for reading
//! - **Zero Magic**: no global state, the graph is an owned value
//!
//! ## Architecture
//!
//! ```text
//! Front-ends (tree-sitter C++, hand-built records)
//!     ↓
//! Registry / Assembler (dedup, merge, link)
//!     ↓
//! Ontology (nodes, edges, invariants)
//!     ↓
//! Query Layer (kind filters, neighbors, fluent builder)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use ontograph::{EdgeKind, NodeKey, NodeKind, Ontology, PropertyMap, QualifiedName};
//!
//! let mut graph = Ontology::new();
//! let ns = graph
//!     .insert_node(NodeKey::scope(QualifiedName::parse("app")), NodeKind::Namespace, PropertyMap::new())
//!     .unwrap();
//! graph.connect(graph.root(), ns, EdgeKind::Contains, PropertyMap::new()).unwrap();
//!
//! let frozen = graph.freeze();
//! assert_eq!(frozen.nodes_of_kind(NodeKind::Namespace).len(), 2);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod graph;
pub mod query;

// Re-export main types
pub use error::{GraphError, Result};
pub use graph::{
    attrs, Direction, Edge, EdgeId, EdgeKind, FrozenOntology, KindFamily, Node, NodeId, NodeKey,
    NodeKind, Ontology, PropertyMap, PropertyValue, QualifiedName,
};
pub use query::QueryBuilder;
