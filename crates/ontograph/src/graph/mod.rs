//! Core graph types and operations.
//!
//! This module defines the fundamental building blocks:
//! - [`Node`]: one declared entity, tagged with a [`NodeKind`]
//! - [`Edge`]: a typed, directed relation between two nodes
//! - [`NodeKey`]: the stable identity used to deduplicate re-declarations
//! - [`Ontology`]: the owned arena holding both

pub mod attrs;
mod key;
mod ontology;
mod property;
mod types;

pub use key::{KindFamily, NodeKey, QualifiedName};
pub use ontology::{FrozenOntology, Ontology};
pub use property::{PropertyMap, PropertyValue};
pub use types::{Direction, Edge, EdgeId, EdgeKind, Node, NodeId, NodeKind};
