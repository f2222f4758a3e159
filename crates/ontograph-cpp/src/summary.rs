//! Build results: the frozen ontology plus what happened to every unit.

use ontograph::FrozenOntology;
use ontograph_parser_api::ExtractMetrics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A unit that never reached the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedUnit {
    pub path: PathBuf,
    pub reason: String,
}

/// A unit whose delta was rejected by the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedUnit {
    pub path: PathBuf,
    pub reason: String,
}

/// What kind of symbolic reference failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Base,
    AliasTarget,
    FieldType,
    ParameterType,
    ReturnType,
    LocalType,
    Call,
}

/// A name that resolved to an External placeholder instead of a declared entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    /// Unit holding the reference
    pub unit: PathBuf,
    /// Display form of the referencing node
    pub from: String,
    /// Name as looked up
    pub spelling: String,
    pub kind: ReferenceKind,
}

/// Diagnostics of one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Units merged into the graph, in merge order
    pub units_merged: Vec<PathBuf>,
    pub skipped: Vec<SkippedUnit>,
    pub rejected: Vec<RejectedUnit>,
    pub unresolved: Vec<UnresolvedReference>,
    pub metrics: ExtractMetrics,
    /// The build stopped early; only `units_merged` are in the graph
    pub cancelled: bool,
}

impl BuildSummary {
    /// Every input was parsed and merged.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.rejected.is_empty() && !self.cancelled
    }

    /// Unresolved references of one kind.
    pub fn unresolved_of(&self, kind: ReferenceKind) -> impl Iterator<Item = &UnresolvedReference> {
        self.unresolved.iter().filter(move |r| r.kind == kind)
    }
}

/// The result of a build: a read-only graph and its diagnostics.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub ontology: FrozenOntology,
    pub summary: BuildSummary,
}
