//! Owned ontology graph: node/edge arena, identity index and adjacency.

use super::key::{NodeKey, QualifiedName};
use super::property::PropertyMap;
use super::types::{Direction, Edge, EdgeId, EdgeKind, Node, NodeId, NodeKind};
use crate::error::{GraphError, Result};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Deref;
use std::sync::Arc;

/// The entity-relationship graph of one analyzed corpus.
///
/// `Ontology` is a plain owned value: construct it empty, mutate it through
/// explicit calls, then [`freeze`](Ontology::freeze) it for sharing. Iteration
/// over nodes and edges follows insertion order.
#[derive(Debug, Clone)]
pub struct Ontology {
    // Monotonic slot counters, never reused
    node_counter: NodeId,
    edge_counter: EdgeId,
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    // Identity indexes
    keys: HashMap<NodeKey, NodeId>,
    names: HashMap<QualifiedName, Vec<NodeId>>,
    edge_index: HashMap<(NodeId, NodeId, EdgeKind), EdgeId>,
    // Adjacency indexes for neighbor lookups
    adjacency_out: HashMap<NodeId, BTreeSet<EdgeId>>,
    adjacency_in: HashMap<NodeId, BTreeSet<EdgeId>>,
    root: NodeId,
}

impl Default for Ontology {
    fn default() -> Self {
        Self::new()
    }
}

impl Ontology {
    /// Create an empty ontology holding only the implicit global namespace.
    pub fn new() -> Self {
        let mut graph = Self {
            node_counter: 0,
            edge_counter: 0,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            keys: HashMap::new(),
            names: HashMap::new(),
            edge_index: HashMap::new(),
            adjacency_out: HashMap::new(),
            adjacency_in: HashMap::new(),
            root: 0,
        };

        let root = graph.next_node_id();
        let key = NodeKey::global();
        graph.keys.insert(key.clone(), root);
        graph.names.entry(key.name.clone()).or_default().push(root);
        graph
            .nodes
            .insert(root, Node::new(root, key, NodeKind::Namespace, PropertyMap::new()));
        graph.root = root;
        graph
    }

    /// The implicit global namespace node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Insert a node under a fresh identity key.
    ///
    /// # Errors
    ///
    /// - [`GraphError::DuplicateNode`] if `key` is already present
    /// - [`GraphError::InvalidOperation`] if `kind` is not in the key's family
    pub fn insert_node(
        &mut self,
        key: NodeKey,
        kind: NodeKind,
        attributes: PropertyMap,
    ) -> Result<NodeId> {
        if self.keys.contains_key(&key) {
            return Err(GraphError::DuplicateNode {
                key: key.to_string(),
            });
        }
        if kind.family() != key.family {
            return Err(GraphError::InvalidOperation {
                message: format!("{kind} cannot be stored under key {key}"),
            });
        }

        let node_id = self.next_node_id();
        debug!("Adding node: id={node_id}, kind={kind}, key={key}");
        self.keys.insert(key.clone(), node_id);
        self.names.entry(key.name.clone()).or_default().push(node_id);
        self.nodes
            .insert(node_id, Node::new(node_id, key, kind, attributes));
        Ok(node_id)
    }

    /// Look up a node by identity key.
    pub fn node_by_key(&self, key: &NodeKey) -> Option<NodeId> {
        self.keys.get(key).copied()
    }

    /// Get a node by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node doesn't exist.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or_else(|| GraphError::node_not_found(id))
    }

    /// Get a mutable reference to a node's attributes by ID.
    ///
    /// Key and kind are not reachable through this handle; use
    /// [`set_kind`](Ontology::set_kind) to change a kind.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node doesn't exist.
    pub fn attributes_mut(&mut self, id: NodeId) -> Result<&mut PropertyMap> {
        self.nodes
            .get_mut(&id)
            .map(|node| &mut node.attributes)
            .ok_or_else(|| GraphError::node_not_found(id))
    }

    /// Change the kind of a node within its identity family.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] if `kind` leaves the family.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| GraphError::node_not_found(id))?;
        if node.key.family != kind.family() {
            return Err(GraphError::InvalidOperation {
                message: format!("cannot change {} into {kind}", node.key),
            });
        }
        if node.kind != kind {
            trace!("Refining node {id}: {} -> {kind}", node.kind);
            node.kind = kind;
        }
        Ok(())
    }

    /// Delete a node and all its connected edges.
    ///
    /// # Errors
    ///
    /// Returns an error if the node doesn't exist or is the global namespace.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        debug!("Deleting node: id={id}");
        if id == self.root {
            return Err(GraphError::InvalidOperation {
                message: "Cannot remove the global namespace".to_string(),
            });
        }
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::node_not_found(id));
        }

        let mut edges_to_delete: BTreeSet<EdgeId> = BTreeSet::new();
        if let Some(out_edges) = self.adjacency_out.get(&id) {
            edges_to_delete.extend(out_edges.iter().copied());
        }
        if let Some(in_edges) = self.adjacency_in.get(&id) {
            edges_to_delete.extend(in_edges.iter().copied());
        }

        trace!("Deleting {} connected edges for node {id}", edges_to_delete.len());
        for edge_id in edges_to_delete {
            self.remove_edge(edge_id)?;
        }

        self.adjacency_out.remove(&id);
        self.adjacency_in.remove(&id);
        if let Some(node) = self.nodes.remove(&id) {
            self.keys.remove(&node.key);
            if let Some(ids) = self.names.get_mut(&node.key.name) {
                ids.retain(|n| *n != id);
                if ids.is_empty() {
                    self.names.remove(&node.key.name);
                }
            }
        }
        Ok(())
    }

    /// Add an edge, or merge `attributes` into the existing edge with the
    /// same (source, target, kind).
    ///
    /// List attributes are unioned; scalar attributes keep their first value.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if either endpoint doesn't exist.
    pub fn connect(
        &mut self,
        source: NodeId,
        target: NodeId,
        kind: EdgeKind,
        attributes: PropertyMap,
    ) -> Result<EdgeId> {
        self.node(source)?;
        self.node(target)?;

        if let Some(&edge_id) = self.edge_index.get(&(source, target, kind)) {
            trace!("Merging into edge {edge_id}: {source} -{kind}-> {target}");
            if let Some(edge) = self.edges.get_mut(&edge_id) {
                edge.attributes.absorb(&attributes);
            }
            return Ok(edge_id);
        }

        let edge_id = self.next_edge_id();
        debug!("Adding edge: source={source}, target={target}, kind={kind}");
        self.edges
            .insert(edge_id, Edge::new(edge_id, source, target, kind, attributes));
        self.edge_index.insert((source, target, kind), edge_id);
        self.adjacency_out.entry(source).or_default().insert(edge_id);
        self.adjacency_in.entry(target).or_default().insert(edge_id);
        Ok(edge_id)
    }

    /// Delete an edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EdgeNotFound`] if the edge doesn't exist.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<()> {
        debug!("Deleting edge: id={id}");
        let edge = self.edges.remove(&id).ok_or_else(|| GraphError::EdgeNotFound {
            edge_id: id.to_string(),
        })?;

        self.edge_index.remove(&(edge.source, edge.target, edge.kind));
        if let Some(out_edges) = self.adjacency_out.get_mut(&edge.source) {
            out_edges.remove(&id);
        }
        if let Some(in_edges) = self.adjacency_in.get_mut(&edge.target) {
            in_edges.remove(&id);
        }
        Ok(())
    }

    /// Get an edge by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EdgeNotFound`] if the edge doesn't exist.
    pub fn edge(&self, id: EdgeId) -> Result<&Edge> {
        self.edges.get(&id).ok_or_else(|| GraphError::EdgeNotFound {
            edge_id: id.to_string(),
        })
    }

    /// The edge of `kind` from `source` to `target`, if present.
    pub fn edge_between(&self, source: NodeId, target: NodeId, kind: EdgeKind) -> Option<&Edge> {
        self.edge_index
            .get(&(source, target, kind))
            .and_then(|id| self.edges.get(id))
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Get the total number of nodes in the graph, including the global namespace.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the total number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All nodes of `kind`, in insertion order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.kind == kind).collect()
    }

    /// All edges of `kind`, in insertion order.
    pub fn edges_of_kind(&self, kind: EdgeKind) -> Vec<&Edge> {
        self.edges.values().filter(|e| e.kind == kind).collect()
    }

    /// Outgoing edges of `node`, optionally restricted to one kind.
    pub fn outgoing(&self, node: NodeId, kind: Option<EdgeKind>) -> Vec<&Edge> {
        self.adjacent(self.adjacency_out.get(&node), kind)
    }

    /// Incoming edges of `node`, optionally restricted to one kind.
    pub fn incoming(&self, node: NodeId, kind: Option<EdgeKind>) -> Vec<&Edge> {
        self.adjacent(self.adjacency_in.get(&node), kind)
    }

    fn adjacent(&self, ids: Option<&BTreeSet<EdgeId>>, kind: Option<EdgeKind>) -> Vec<&Edge> {
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.edges.get(id))
            .filter(|edge| kind.map_or(true, |k| edge.kind == k))
            .collect()
    }

    /// Nodes reached from `node` over edges of `edge_kind` in `direction`.
    ///
    /// Results follow edge insertion order and hold each neighbor once.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node doesn't exist.
    pub fn neighbors(
        &self,
        node: NodeId,
        edge_kind: EdgeKind,
        direction: Direction,
    ) -> Result<Vec<NodeId>> {
        self.node(node)?;

        let mut pairs: Vec<(EdgeId, NodeId)> = Vec::new();
        if matches!(direction, Direction::Outgoing | Direction::Both) {
            pairs.extend(
                self.outgoing(node, Some(edge_kind))
                    .into_iter()
                    .map(|e| (e.id, e.target)),
            );
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            pairs.extend(
                self.incoming(node, Some(edge_kind))
                    .into_iter()
                    .map(|e| (e.id, e.source)),
            );
        }
        pairs.sort_by_key(|(edge_id, _)| *edge_id);

        let mut seen = BTreeSet::new();
        Ok(pairs
            .into_iter()
            .filter_map(|(_, n)| seen.insert(n).then_some(n))
            .collect())
    }

    /// The scope that contains `node`, `None` for roots.
    pub fn contains_parent(&self, node: NodeId) -> Option<NodeId> {
        self.incoming(node, Some(EdgeKind::Contains))
            .first()
            .map(|e| e.source)
    }

    /// Direct members of a scope, in insertion order.
    pub fn children(&self, scope: NodeId) -> Vec<NodeId> {
        self.outgoing(scope, Some(EdgeKind::Contains))
            .into_iter()
            .map(|e| e.target)
            .collect()
    }

    /// All nodes whose qualified name equals `name`, across every kind family.
    pub fn find_by_qualified_name(&self, name: &QualifiedName) -> Vec<NodeId> {
        self.names.get(name).cloned().unwrap_or_default()
    }

    /// Verify the structural invariants every finished ontology must satisfy.
    ///
    /// - every node has at most one incoming Contains edge
    /// - Contains edges never form a cycle
    /// - every Overloads edge has its reverse
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvariantViolation`] naming the first offending node.
    pub fn check_invariants(&self) -> Result<()> {
        for node in self.nodes.values() {
            let parents = self.incoming(node.id, Some(EdgeKind::Contains));
            if parents.len() > 1 {
                return Err(GraphError::invariant(format!(
                    "{node} has {} Contains parents",
                    parents.len()
                )));
            }
        }

        for node in self.nodes.values() {
            let mut seen = BTreeSet::from([node.id]);
            let mut current = node.id;
            while let Some(parent) = self.contains_parent(current) {
                if !seen.insert(parent) {
                    return Err(GraphError::invariant(format!(
                        "Contains cycle through {node}"
                    )));
                }
                current = parent;
            }
        }

        for edge in self.edges_of_kind(EdgeKind::Overloads) {
            if self
                .edge_between(edge.target, edge.source, EdgeKind::Overloads)
                .is_none()
            {
                return Err(GraphError::invariant(format!(
                    "Overloads edge {} -> {} has no reverse",
                    edge.source, edge.target
                )));
            }
        }

        Ok(())
    }

    /// Create a new query builder for this graph.
    pub fn query(&self) -> crate::query::QueryBuilder<'_> {
        crate::query::QueryBuilder::new(self)
    }

    /// Seal the graph into a cheaply clonable read-only handle.
    pub fn freeze(self) -> FrozenOntology {
        debug!(
            "Freezing ontology: {} nodes, {} edges",
            self.node_count(),
            self.edge_count()
        );
        FrozenOntology(Arc::new(self))
    }

    fn next_node_id(&mut self) -> NodeId {
        let id = self.node_counter;
        self.node_counter += 1;
        id
    }

    fn next_edge_id(&mut self) -> EdgeId {
        let id = self.edge_counter;
        self.edge_counter += 1;
        id
    }
}

/// Read-only, shareable view of a finished [`Ontology`].
#[derive(Debug, Clone)]
pub struct FrozenOntology(Arc<Ontology>);

impl Deref for FrozenOntology {
    type Target = Ontology;

    fn deref(&self) -> &Ontology {
        &self.0
    }
}
