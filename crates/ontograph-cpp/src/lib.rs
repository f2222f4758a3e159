//! # ontograph-cpp
//!
//! C++ front-end and graph assembler for ontograph - builds an
//! entity-relationship graph of namespaces, records, callables, fields and
//! type aliases from C++ translation units.
//!
//! ## Features
//!
//! - tree-sitter based AST adapter implementing the `Frontend` trait
//! - Identity-keyed entity registry that merges forward declarations,
//!   in-class declarations and out-of-line definitions across units
//! - Containment, inheritance, override, overload, call, field and
//!   type-usage relations
//! - Parallel parsing with a deterministic single-writer merge
//! - Build summary listing skipped units, rejected units and unresolved names
//!
//! ## Quick Start
//!
//! ```rust
//! use ontograph::{EdgeKind, NodeKind};
//! use ontograph_cpp::OntologyBuilder;
//! use std::path::PathBuf;
//!
//! let source = r#"
//! namespace N {
//!     class C { public: virtual void m(int); };
//!     class D : public C { public: void m(int) override; };
//! }
//! "#;
//!
//! let output = OntologyBuilder::new()
//!     .build_sources(&[(PathBuf::from("n.h"), source.to_string())])
//!     .unwrap();
//! let graph = &output.ontology;
//!
//! assert_eq!(graph.nodes_of_kind(NodeKind::Class).len(), 2);
//! let overrides = graph.edges_of_kind(EdgeKind::Overrides);
//! assert_eq!(overrides.len(), 1);
//! let base = graph.node(overrides[0].target).unwrap();
//! assert_eq!(base.qualified_name().to_string(), "N::C::m");
//! ```
//!
//! Translation units built by other front-ends go through
//! [`OntologyBuilder::build_units`] or a [`GraphAssembler`] directly.

pub mod error;
pub mod types;

mod assembler;
mod builder;
mod extractor;
mod parser_impl;
mod registry;
mod relations;
mod summary;
mod visitor;

pub use assembler::GraphAssembler;
pub use builder::{CancellationFlag, OntologyBuilder};
pub use error::{BuildError, Result};
pub use parser_impl::CppFrontend;
pub use registry::{anonymous_namespace, Conflict, EntityRegistry, LookupContext, Resolution};
pub use relations::{extract_unit, EntityRecord, Reference, UnitDelta};
pub use summary::{
    BuildOutput, BuildSummary, ReferenceKind, RejectedUnit, SkippedUnit, UnresolvedReference,
};

// Re-export parser-api types for convenience
pub use ontograph_parser_api::{ExtractConfig, Frontend, ParserError, TranslationUnit};
