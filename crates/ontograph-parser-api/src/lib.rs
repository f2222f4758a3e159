//! ontograph Parser API
//!
//! Shared trait and types for building ontograph front-ends.
//!
//! A front-end (AST adapter) turns one translation unit into a list of
//! declaration records. It knows nothing about the graph; the build pipeline
//! merges the records of many units into one ontology. This crate defines:
//!
//! - **Frontend trait**: The interface every AST adapter implements
//! - **Declaration records**: Front-end independent description of one declaration
//! - **Configuration**: Customizable extraction behavior
//! - **Metrics**: Performance and success tracking
//! - **Error handling**: Unit-level parse failures
//!
//! # Example
//!
//! ```rust
//! use ontograph::NodeKind;
//! use ontograph_parser_api::{
//!     Declaration, Parameter, ScopeKind, ScopeSegment, Signature, TranslationUnit,
//! };
//!
//! // Records can be built by hand, without any parser
//! let unit = TranslationUnit::new("shapes.h")
//!     .with(Declaration::new(NodeKind::Namespace, "geo", 1).definition())
//!     .with(
//!         Declaration::new(NodeKind::Function, "area", 2)
//!             .with_scope(vec![ScopeSegment::new("geo", ScopeKind::Namespace)])
//!             .with_signature(Signature::new(vec![Parameter::new("double")]).returning("double")),
//!     );
//!
//! assert_eq!(unit.declaration_count(), 2);
//! assert_eq!(unit.declarations[1].key().to_string(), "Callable:geo::area(double)");
//! ```

pub mod config;
pub mod declarations;
pub mod errors;
pub mod metrics;
pub mod traits;

// Re-export commonly used types
pub use config::ExtractConfig;
pub use declarations::{
    Access, BaseSpecifier, Body, CallSite, CallStyle, Declaration, LocalBinding, Parameter,
    Receiver, ScopeKind, ScopeSegment, Signature, Specifiers, UsingDirective,
};
pub use errors::{ParserError, ParserResult};
pub use metrics::ExtractMetrics;
pub use traits::{Frontend, TranslationUnit};
