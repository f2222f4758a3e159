//! Graph assembler: merges per-unit deltas into one graph and links it.

use log::{debug, info};
use ontograph::{NodeKey, NodeKind, Ontology, QualifiedName};
use ontograph_parser_api::{ExtractConfig, TranslationUnit};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::error::{BuildError, Result};
use crate::registry::{compatible, EntityRegistry};
use crate::relations::{extract_unit, link, PendingUnit, UnitDelta};
use crate::summary::UnresolvedReference;

/// Accumulates unit deltas, then links them once every unit is known.
///
/// Each [`merge`](Self::merge) is transactional: a delta that conflicts with
/// the graph (or with itself) is rejected as a whole and leaves the graph
/// untouched. Merging the same unit path again replaces its pending
/// references and directives.
pub struct GraphAssembler {
    registry: EntityRegistry,
    config: ExtractConfig,
    pending: BTreeMap<PathBuf, PendingUnit>,
}

impl Default for GraphAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphAssembler {
    pub fn new() -> Self {
        Self::with_config(ExtractConfig::default())
    }

    pub fn with_config(config: ExtractConfig) -> Self {
        Self {
            registry: EntityRegistry::new(),
            config,
            pending: BTreeMap::new(),
        }
    }

    /// The graph as merged so far, before linking.
    pub fn graph(&self) -> &Ontology {
        self.registry.graph()
    }

    /// Paths of the units merged so far, in path order.
    pub fn merged_units(&self) -> impl Iterator<Item = &PathBuf> {
        self.pending.keys()
    }

    /// Extract the delta of `unit` and merge it.
    pub fn merge_unit(&mut self, unit: &TranslationUnit) -> Result<()> {
        let delta = extract_unit(unit, &self.config);
        self.merge(delta)
    }

    /// Merge one delta.
    ///
    /// # Errors
    ///
    /// [`BuildError::MergeConflict`] when a record redeclares a name
    /// incompatibly; nothing of the delta is applied in that case.
    pub fn merge(&mut self, mut delta: UnitDelta) -> Result<()> {
        self.validate(&delta)?;

        for record in &delta.entities {
            self.registry.register_or_merge(record)?;
        }
        debug!(
            "Merged {}: {} entities, {} references",
            delta.path.display(),
            delta.entity_count(),
            delta.reference_count()
        );
        let pending = PendingUnit::from_delta(&mut delta);
        self.pending.insert(delta.path, pending);
        Ok(())
    }

    /// Move scopes explained by `using namespace`, settle kinds, link every
    /// pending reference and check the invariants.
    pub fn finish(mut self) -> Result<(Ontology, Vec<UnresolvedReference>)> {
        for (path, unit) in &self.pending {
            if !unit.using_directives.is_empty() {
                self.registry
                    .relocate_implied(&unit.context(path), &unit.implied)?;
            }
        }
        self.registry.refine_kinds()?;
        let unresolved = link::link(&mut self.registry, &self.pending)?;
        let graph = self.registry.into_graph();
        graph.check_invariants()?;
        info!(
            "Assembled ontology from {} units: {} nodes, {} edges",
            self.pending.len(),
            graph.node_count(),
            graph.edge_count()
        );
        Ok((graph, unresolved))
    }

    /// Check every record against the graph and against the records before it.
    fn validate(&self, delta: &UnitDelta) -> Result<()> {
        let mut staged: HashMap<&QualifiedName, Vec<(&NodeKey, NodeKind, bool)>> = HashMap::new();
        for record in &delta.entities {
            let conflict = |existing: NodeKind| BuildError::MergeConflict {
                unit: delta.path.clone(),
                name: record.key.name.to_string(),
                existing,
                incoming: record.kind,
            };

            if let Err(found) = self.registry.check(record) {
                return Err(conflict(found.existing));
            }
            let earlier = staged.entry(&record.key.name).or_default();
            if let Some(&(_, kind, _)) = earlier
                .iter()
                .find(|(key, kind, implied)| !compatible(key, *kind, *implied, record))
            {
                return Err(conflict(kind));
            }
            earlier.push((&record.key, record.kind, record.implied));
        }
        Ok(())
    }
}
