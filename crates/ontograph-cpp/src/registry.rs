//! Entity registry: identity-keyed node creation, merging and name lookup.

use log::{debug, trace};
use ontograph::{
    attrs, EdgeKind, KindFamily, Node, NodeId, NodeKey, NodeKind, Ontology, PropertyMap,
    PropertyValue, QualifiedName,
};
use ontograph_parser_api::UsingDirective;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;

use crate::error::Result;
use crate::relations::EntityRecord;
use crate::types::strip_template_args;

/// Name given to the anonymous namespace of a unit.
pub fn anonymous_namespace(unit: &Path) -> String {
    format!("(anonymous {})", unit.display())
}

/// What a lookup made on behalf of one unit can see beyond declared names:
/// the unit's own anonymous namespaces and its `using namespace` directives.
#[derive(Debug, Clone, Copy)]
pub struct LookupContext<'a> {
    pub unit: &'a Path,
    pub using: &'a [UsingDirective],
}

impl<'a> LookupContext<'a> {
    pub fn new(unit: &'a Path, using: &'a [UsingDirective]) -> Self {
        Self { unit, using }
    }

    fn without_using(&self) -> LookupContext<'a> {
        LookupContext {
            unit: self.unit,
            using: &[],
        }
    }
}

/// Outcome of a name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Matches of the innermost scope that has any; several for overload sets
    Resolved(Vec<NodeId>),
    Unresolved,
}

impl Resolution {
    fn from_matches(matches: Vec<NodeId>) -> Self {
        if matches.is_empty() {
            Resolution::Unresolved
        } else {
            Resolution::Resolved(matches)
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Resolution::Resolved(nodes) => nodes,
            Resolution::Unresolved => &[],
        }
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes().first().copied()
    }
}

/// An incompatible redeclaration found before merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub name: QualifiedName,
    pub existing: NodeKind,
    pub incoming: NodeKind,
}

/// Whether an entity already known under `existing` may absorb `incoming`.
///
/// Only names equal to the incoming qualified name are compared.
pub(crate) fn compatible(
    existing: &NodeKey,
    existing_kind: NodeKind,
    existing_implied: bool,
    incoming: &EntityRecord,
) -> bool {
    if existing.family == KindFamily::External || incoming.key.family == KindFamily::External {
        return true;
    }
    if existing.family != incoming.key.family {
        // Overloads share a name but never a key
        return false;
    }
    if existing.family == KindFamily::Scope && !existing_implied && !incoming.implied {
        let namespace = |k: NodeKind| k == NodeKind::Namespace;
        return namespace(existing_kind) == namespace(incoming.kind);
    }
    true
}

/// Creates and deduplicates graph nodes keyed by declaration identity.
///
/// The registry owns the graph while it is being assembled and keeps a
/// member index per scope so lookups do not scan containment edges.
pub struct EntityRegistry {
    graph: Ontology,
    members: HashMap<NodeId, BTreeMap<String, Vec<NodeId>>>,
    /// Keys of nodes moved by [`EntityRegistry::relocate_implied`]
    moved: HashMap<NodeKey, NodeKey>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            graph: Ontology::new(),
            members: HashMap::new(),
            moved: HashMap::new(),
        }
    }

    pub fn graph(&self) -> &Ontology {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut Ontology {
        &mut self.graph
    }

    pub fn into_graph(self) -> Ontology {
        self.graph
    }

    /// Node currently registered under `key`, following relocations.
    pub fn node_by_key(&self, key: &NodeKey) -> Option<NodeId> {
        let mut key = key;
        let mut hops = 0;
        while let Some(next) = self.moved.get(key) {
            key = next;
            hops += 1;
            if hops > self.moved.len() {
                return None;
            }
        }
        self.graph.node_by_key(key)
    }

    /// Check `record` against every node already carrying its qualified name.
    pub fn check(&self, record: &EntityRecord) -> std::result::Result<(), Conflict> {
        for id in self.graph.find_by_qualified_name(&record.key.name) {
            let Ok(node) = self.graph.node(id) else {
                continue;
            };
            if !compatible(&node.key, node.kind, node.flag(attrs::IMPLIED), record) {
                return Err(Conflict {
                    name: record.key.name.clone(),
                    existing: node.kind,
                    incoming: record.kind,
                });
            }
        }
        Ok(())
    }

    /// Create the node for `record`, or merge it into the existing one.
    ///
    /// Merging is idempotent: registering the same record twice leaves the
    /// node unchanged.
    pub fn register_or_merge(&mut self, record: &EntityRecord) -> Result<NodeId> {
        let Some(id) = self.graph.node_by_key(&record.key) else {
            let mut attributes = record.attributes.clone();
            if record.implied {
                attributes.insert(attrs::IMPLIED, true);
            }
            let id = self
                .graph
                .insert_node(record.key.clone(), record.kind, attributes)?;
            if record.key.family != KindFamily::External {
                let parent = self.ensure_parent(&record.key.name)?;
                self.attach(parent, id)?;
            }
            return Ok(id);
        };

        let existing = self.graph.node(id)?.clone();
        let incoming_wins = incoming_wins(&existing, record);
        let merged = merged_attributes(&existing.attributes, &record.attributes, incoming_wins);
        let kind = merged_kind(&existing, record, incoming_wins);
        debug!("Merging {} into {existing}", record.key);

        *self.graph.attributes_mut(id)? = merged;
        if kind != existing.kind {
            self.graph.set_kind(id, kind)?;
        }
        Ok(id)
    }

    /// The External placeholder for a spelled name, created on first use.
    pub fn external(&mut self, spelling: &str) -> Result<NodeId> {
        let key = NodeKey::external(spelling);
        if let Some(id) = self.graph.node_by_key(&key) {
            return Ok(id);
        }
        trace!("Creating external placeholder {spelling}");
        Ok(self
            .graph
            .insert_node(key, NodeKind::External, PropertyMap::new())?)
    }

    /// The scope that encloses `node`, the global namespace for top-level nodes.
    pub fn scope_of(&self, node: NodeId) -> NodeId {
        self.graph
            .contains_parent(node)
            .unwrap_or_else(|| self.graph.root())
    }

    /// Record types `record` inherits from directly.
    pub fn bases(&self, record: NodeId) -> Vec<NodeId> {
        self.graph
            .outgoing(record, Some(EdgeKind::Inherits))
            .into_iter()
            .map(|e| e.target)
            .filter(|&t| self.kind_of(t).map_or(false, NodeKind::is_record))
            .collect()
    }

    /// Follow alias edges until a non-alias node (or a dangling alias).
    pub fn chase_alias(&self, node: NodeId) -> NodeId {
        let mut current = node;
        let mut seen = HashSet::new();
        while self.kind_of(current) == Some(NodeKind::TypeAlias) && seen.insert(current) {
            let next = self
                .graph
                .outgoing(current, Some(EdgeKind::UsesType))
                .into_iter()
                .find(|e| {
                    e.attributes
                        .get_string_list(attrs::ROLES)
                        .map_or(false, |roles| roles.iter().any(|r| r == "alias"))
                })
                .map(|e| e.target);
            match next {
                Some(target) => current = target,
                None => break,
            }
        }
        current
    }

    /// C++-style lookup of a spelled name from `scope`.
    ///
    /// Unqualified names search `scope` and then each enclosing scope; record
    /// scopes include their bases. Qualified names resolve the first component
    /// that way and descend through the rest. A leading `::` starts at the
    /// global namespace. Template arguments are ignored.
    ///
    /// Anonymous namespaces are not entered; use [`EntityRegistry::resolve_in`]
    /// for lookups made on behalf of a unit.
    pub fn resolve<F>(&self, spelled: &str, scope: NodeId, accept: F) -> Resolution
    where
        F: Fn(&Node) -> bool,
    {
        self.resolve_from(spelled, scope, None, &accept)
    }

    /// [`EntityRegistry::resolve`] as seen from the unit in `context`.
    ///
    /// Members of that unit's anonymous namespaces are visible in the
    /// enclosing scope, and unqualified lookup also searches the namespaces
    /// its `using namespace` directives nominate at each level.
    pub fn resolve_in<F>(
        &self,
        spelled: &str,
        scope: NodeId,
        context: &LookupContext<'_>,
        accept: F,
    ) -> Resolution
    where
        F: Fn(&Node) -> bool,
    {
        self.resolve_from(spelled, scope, Some(context), &accept)
    }

    fn resolve_from<F>(
        &self,
        spelled: &str,
        scope: NodeId,
        context: Option<&LookupContext<'_>>,
        accept: &F,
    ) -> Resolution
    where
        F: Fn(&Node) -> bool,
    {
        let stripped = strip_template_args(spelled);
        let from_root = stripped.starts_with("::");
        let name = QualifiedName::parse(&stripped);
        let Some((last, qualifiers)) = name.segments().split_last() else {
            return Resolution::Unresolved;
        };

        if qualifiers.is_empty() {
            let matches = if from_root {
                self.members_of(self.graph.root(), last, context, accept)
            } else {
                self.lookup_unqualified(last, scope, context, accept)
            };
            return Resolution::from_matches(matches);
        }

        let scope_like = |n: &Node| {
            matches!(
                n.kind,
                NodeKind::Namespace | NodeKind::Class | NodeKind::Struct | NodeKind::TypeAlias
            )
        };
        let (first, rest) = (&qualifiers[0], &qualifiers[1..]);
        let mut scopes = if from_root {
            self.members_of(self.graph.root(), first, context, &scope_like)
        } else {
            self.lookup_unqualified(first, scope, context, &scope_like)
        };
        for segment in rest {
            scopes = scopes
                .into_iter()
                .flat_map(|s| self.members_of(self.chase_alias(s), segment, context, &scope_like))
                .collect();
        }

        let mut matches = Vec::new();
        for s in scopes {
            for id in self.members_of(self.chase_alias(s), last, context, accept) {
                if !matches.contains(&id) {
                    matches.push(id);
                }
            }
        }
        trace!("Resolved {spelled} to {matches:?}");
        Resolution::from_matches(matches)
    }

    /// Members named `name` of `scope`; record scopes fall back to their
    /// bases, nearest first.
    pub fn lookup_member<F>(&self, scope: NodeId, name: &str, accept: &F) -> Vec<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.members_of(scope, name, None, accept)
    }

    fn members_of<F>(
        &self,
        scope: NodeId,
        name: &str,
        context: Option<&LookupContext<'_>>,
        accept: &F,
    ) -> Vec<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        let direct = self.direct_members(scope, name, context, accept);
        if !direct.is_empty() || !self.kind_of(scope).map_or(false, NodeKind::is_record) {
            return direct;
        }

        let mut seen = HashSet::from([scope]);
        let mut queue: VecDeque<NodeId> = self.bases(scope).into();
        while let Some(base) = queue.pop_front() {
            if !seen.insert(base) {
                continue;
            }
            let found = self.direct_members(base, name, context, accept);
            if !found.is_empty() {
                return found;
            }
            queue.extend(self.bases(base));
        }
        Vec::new()
    }

    /// Collapse implied scopes and settle callable kinds once every unit is merged.
    ///
    /// An implied scope that holds a constructor, destructor or const member
    /// function is a class; otherwise it stays a namespace. Callables directly
    /// inside a record are methods, callables elsewhere are functions.
    pub fn refine_kinds(&mut self) -> Result<()> {
        let implied: Vec<NodeId> = self
            .graph
            .nodes()
            .filter(|n| n.key.family == KindFamily::Scope && n.flag(attrs::IMPLIED))
            .map(|n| n.id)
            .collect();
        for scope in implied {
            let is_class = self.graph.children(scope).into_iter().any(|child| {
                self.graph.node(child).map_or(false, |n| {
                    matches!(n.kind, NodeKind::Constructor | NodeKind::Destructor | NodeKind::Field)
                        || (n.kind.is_callable() && n.flag(attrs::CONST_QUALIFIED))
                })
            });
            if is_class {
                debug!("Implied scope {scope} holds members, treating as Class");
                self.graph.set_kind(scope, NodeKind::Class)?;
            }
        }

        let callables: Vec<(NodeId, NodeKind)> = self
            .graph
            .nodes()
            .filter(|n| matches!(n.kind, NodeKind::Function | NodeKind::Method))
            .map(|n| (n.id, n.kind))
            .collect();
        for (id, kind) in callables {
            let in_record = self
                .graph
                .contains_parent(id)
                .and_then(|p| self.kind_of(p))
                .map_or(false, NodeKind::is_record);
            let refined = if in_record {
                NodeKind::Method
            } else {
                NodeKind::Function
            };
            if refined != kind {
                self.graph.set_kind(id, refined)?;
            }
        }
        Ok(())
    }

    /// Move implied scopes of one unit into the declared scopes its
    /// `using namespace` directives make them name.
    ///
    /// `int Person::getAge() const` after `using namespace E;` first lands
    /// under an implied top-level `Person`. When `E::Person` is declared, the
    /// implied scope and everything under it merge into `E::Person` and the
    /// old keys keep resolving through [`EntityRegistry::node_by_key`].
    /// Must run before any edge other than containment exists.
    pub fn relocate_implied(
        &mut self,
        context: &LookupContext<'_>,
        implied: &[QualifiedName],
    ) -> Result<()> {
        let mut implied: Vec<&QualifiedName> = implied.iter().collect();
        implied.sort_by_key(|name| name.len());

        for name in implied {
            let Some(id) = self.graph.node_by_key(&NodeKey::scope(name.clone())) else {
                continue;
            };
            if !self.graph.node(id)?.flag(attrs::IMPLIED) {
                continue;
            }
            let Some(target) = self.relocation_target(name, context) else {
                continue;
            };
            if target != *name {
                self.move_subtree(id, name, &target)?;
            }
        }
        Ok(())
    }

    /// Declared scope that `name` denotes through the unit's directives.
    fn relocation_target(
        &self,
        name: &QualifiedName,
        context: &LookupContext<'_>,
    ) -> Option<QualifiedName> {
        let parent = name.parent()?;
        let bare = context.without_using();
        for directive in context.using.iter().filter(|d| d.applies_to(&parent)) {
            let from = match self.graph.node_by_key(&NodeKey::scope(directive.scope.clone())) {
                Some(id) => id,
                None if directive.scope.is_global() => self.graph.root(),
                None => continue,
            };
            let namespaces = self.resolve_from(&directive.namespace, from, Some(&bare), &|n: &Node| {
                n.kind == NodeKind::Namespace
            });
            for &namespace in namespaces.nodes() {
                let Ok(node) = self.graph.node(namespace) else {
                    continue;
                };
                let candidate = node.qualified_name().child(name.simple());
                let declared = self
                    .graph
                    .node_by_key(&NodeKey::scope(candidate.clone()))
                    .and_then(|id| self.graph.node(id).ok())
                    .map_or(false, |n| !n.flag(attrs::IMPLIED));
                if declared {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn move_subtree(&mut self, id: NodeId, from: &QualifiedName, to: &QualifiedName) -> Result<()> {
        let mut order = vec![id];
        let mut next = 0;
        while next < order.len() {
            order.extend(self.graph.children(order[next]));
            next += 1;
        }

        let mut records = Vec::with_capacity(order.len());
        for &node_id in &order {
            let node = self.graph.node(node_id)?;
            let tail = &node.key.name.segments()[from.len()..];
            let mut name = to.clone();
            for segment in tail {
                name = name.child(segment.clone());
            }
            let record = EntityRecord {
                key: NodeKey {
                    family: node.key.family,
                    name,
                    signature: node.key.signature.clone(),
                },
                kind: node.kind,
                attributes: node.attributes.clone(),
                is_definition: node.flag(attrs::IS_DEFINITION),
                implied: node.flag(attrs::IMPLIED),
            };
            if let Err(conflict) = self.check(&record) {
                debug!(
                    "Not moving {from} to {to}: {} is already a {:?}",
                    conflict.name, conflict.existing
                );
                return Ok(());
            }
            records.push((node.key.clone(), record));
        }

        debug!("Moving implied scope {from} to {to}");
        for &node_id in order.iter().rev() {
            self.detach(node_id)?;
        }
        for (old, record) in records {
            self.register_or_merge(&record)?;
            self.moved.insert(old, record.key);
        }
        Ok(())
    }

    fn detach(&mut self, id: NodeId) -> Result<()> {
        if let Some(parent) = self.graph.contains_parent(id) {
            let name = self.graph.node(id)?.name().to_string();
            if let Some(index) = self.members.get_mut(&parent) {
                if let Some(ids) = index.get_mut(&name) {
                    ids.retain(|&member| member != id);
                    if ids.is_empty() {
                        index.remove(&name);
                    }
                }
            }
        }
        self.members.remove(&id);
        Ok(self.graph.remove_node(id)?)
    }

    fn lookup_unqualified<F>(
        &self,
        name: &str,
        scope: NodeId,
        context: Option<&LookupContext<'_>>,
        accept: &F,
    ) -> Vec<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        let mut current = Some(scope);
        while let Some(s) = current {
            let mut found = self.members_of(s, name, context, accept);
            if found.is_empty() {
                if let Some(context) = context {
                    for namespace in self.nominated(s, context) {
                        for id in self.members_of(namespace, name, Some(context), accept) {
                            if !found.contains(&id) {
                                found.push(id);
                            }
                        }
                    }
                }
            }
            if !found.is_empty() {
                return found;
            }
            current = self.graph.contains_parent(s);
        }
        Vec::new()
    }

    /// Namespaces nominated by directives written directly in `scope`.
    ///
    /// The nominated name is looked up from `scope` without directives.
    fn nominated(&self, scope: NodeId, context: &LookupContext<'_>) -> Vec<NodeId> {
        if context.using.is_empty() {
            return Vec::new();
        }
        let Ok(node) = self.graph.node(scope) else {
            return Vec::new();
        };
        let bare = context.without_using();
        let mut namespaces = Vec::new();
        for directive in context.using.iter().filter(|d| &d.scope == node.qualified_name()) {
            let found = self.resolve_from(&directive.namespace, scope, Some(&bare), &|n: &Node| {
                n.kind == NodeKind::Namespace
            });
            for &id in found.nodes() {
                if id != scope && !namespaces.contains(&id) {
                    namespaces.push(id);
                }
            }
        }
        namespaces
    }

    fn kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.graph.node(id).ok().map(|n| n.kind)
    }

    fn direct_members<F>(
        &self,
        scope: NodeId,
        name: &str,
        context: Option<&LookupContext<'_>>,
        accept: &F,
    ) -> Vec<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        let Some(index) = self.members.get(&scope) else {
            return Vec::new();
        };
        let mut found: Vec<NodeId> = index
            .get(name)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&id| self.graph.node(id).map_or(false, |n| accept(n)))
            .collect();

        // Members of the unit's own anonymous namespace are visible in the enclosing scope
        if found.is_empty() {
            if let Some(context) = context {
                let anonymous = anonymous_namespace(context.unit);
                for &anon in index.get(&anonymous).into_iter().flatten() {
                    found.extend(self.direct_members(anon, name, Some(context), accept));
                }
            }
        }
        found
    }

    /// Node of the scope that encloses `name`, created as implied when missing.
    fn ensure_parent(&mut self, name: &QualifiedName) -> Result<NodeId> {
        match name.parent() {
            None => Ok(self.graph.root()),
            Some(parent) => self.ensure_scope(&parent),
        }
    }

    fn ensure_scope(&mut self, name: &QualifiedName) -> Result<NodeId> {
        if name.is_global() {
            return Ok(self.graph.root());
        }
        let key = NodeKey::scope(name.clone());
        if let Some(id) = self.graph.node_by_key(&key) {
            return Ok(id);
        }
        let parent = self.ensure_parent(name)?;
        let id = self.graph.insert_node(
            key,
            NodeKind::Namespace,
            PropertyMap::new().with(attrs::IMPLIED, true),
        )?;
        self.attach(parent, id)?;
        Ok(id)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.graph
            .connect(parent, child, EdgeKind::Contains, PropertyMap::new())?;
        let name = self.graph.node(child)?.name().to_string();
        self.members
            .entry(parent)
            .or_default()
            .entry(name)
            .or_default()
            .push(child);
        Ok(())
    }
}

/// A definition beats a declaration; otherwise the lexicographically smaller
/// source file wins so the outcome does not depend on merge order.
fn incoming_wins(existing: &Node, record: &EntityRecord) -> bool {
    let existing_definition = existing.flag(attrs::IS_DEFINITION);
    if record.is_definition != existing_definition {
        return record.is_definition;
    }
    match (
        existing.attributes.get_string(attrs::SOURCE_FILE),
        record.attributes.get_string(attrs::SOURCE_FILE),
    ) {
        (Some(old), Some(new)) => new <= old,
        (None, Some(_)) => true,
        _ => false,
    }
}

/// Winner's attributes, with the loser filling absent keys and union keys merged.
///
/// Boolean flags are stored only when set, so filling amounts to a logical or.
/// A node stays implied only while every contributing record is implied.
fn merged_attributes(existing: &PropertyMap, incoming: &PropertyMap, incoming_wins: bool) -> PropertyMap {
    let (mut merged, loser) = if incoming_wins {
        (incoming.clone(), existing)
    } else {
        (existing.clone(), incoming)
    };

    for (key, value) in loser.iter() {
        if attrs::UNION_KEYS.contains(&key.as_str()) {
            if let PropertyValue::StringList(values) = value {
                merged.union_strings(key, values.iter().cloned());
            }
        } else if !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }

    let implied = existing.get_bool(attrs::IMPLIED).unwrap_or(false)
        && incoming.get_bool(attrs::IMPLIED).unwrap_or(false);
    if implied {
        merged.insert(attrs::IMPLIED, true);
    } else {
        merged.remove(attrs::IMPLIED);
    }
    merged
}

fn merged_kind(existing: &Node, record: &EntityRecord, incoming_wins: bool) -> NodeKind {
    match existing.key.family {
        KindFamily::Scope => {
            if existing.flag(attrs::IMPLIED) && !record.implied {
                record.kind
            } else if record.implied || !incoming_wins {
                existing.kind
            } else {
                record.kind
            }
        }
        KindFamily::Callable => match (existing.kind, record.kind) {
            (old, NodeKind::Function) => old,
            (NodeKind::Function, new) => new,
            (old, new) => {
                if incoming_wins {
                    new
                } else {
                    old
                }
            }
        },
        _ => existing.kind,
    }
}
