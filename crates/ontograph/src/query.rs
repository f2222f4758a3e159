//! Query builder for fluent ontology queries.
//!
//! Chains filters over node kind, name, attributes, enclosing scope and
//! declaring file. Results follow node insertion order.

use crate::graph::{attrs, Node, NodeId, NodeKind, Ontology, PropertyValue, QualifiedName};

/// A filter predicate that can be applied to nodes.
type FilterFn<'a> = Box<dyn Fn(&Node) -> bool + 'a>;

/// Fluent query builder over an [`Ontology`].
///
/// # Examples
///
/// ```
/// use ontograph::{attrs, NodeKind, Ontology};
///
/// let graph = Ontology::new();
/// let virtual_methods = graph
///     .query()
///     .kind(NodeKind::Method)
///     .attribute(attrs::IS_VIRTUAL, true)
///     .execute();
/// assert!(virtual_methods.is_empty());
/// ```
pub struct QueryBuilder<'a> {
    graph: &'a Ontology,
    filters: Vec<FilterFn<'a>>,
    limit_value: Option<usize>,
}

impl<'a> QueryBuilder<'a> {
    /// Create a new query builder for the given graph.
    pub fn new(graph: &'a Ontology) -> Self {
        Self {
            graph,
            filters: Vec::new(),
            limit_value: None,
        }
    }

    /// Filter nodes by kind.
    pub fn kind(mut self, kind: NodeKind) -> Self {
        self.filters.push(Box::new(move |node| node.kind == kind));
        self
    }

    /// Filter nodes whose kind is any of `kinds`.
    pub fn kinds(mut self, kinds: &[NodeKind]) -> Self {
        let kinds = kinds.to_vec();
        self.filters.push(Box::new(move |node| kinds.contains(&node.kind)));
        self
    }

    /// Filter nodes by simple name containing a substring (case-insensitive).
    pub fn name_contains(mut self, substring: &str) -> Self {
        let substring = substring.to_lowercase();
        self.filters.push(Box::new(move |node| {
            node.name().to_lowercase().contains(&substring)
        }));
        self
    }

    /// Filter nodes by simple name with `^` / `$` anchors.
    pub fn name_matches(mut self, pattern: &str) -> Self {
        let pattern = pattern.to_string();
        self.filters
            .push(Box::new(move |node| anchored_match(&pattern, node.name())));
        self
    }

    /// Filter nodes by exact attribute match.
    ///
    /// A string value also matches a string list that contains it.
    pub fn attribute<V: Into<PropertyValue>>(mut self, key: &str, value: V) -> Self {
        let key = key.to_string();
        let value = value.into();

        self.filters.push(Box::new(move |node| {
            match (&value, node.attributes.get(&key)) {
                (PropertyValue::String(v), Some(PropertyValue::StringList(list))) => {
                    list.iter().any(|item| item == v)
                }
                (expected, Some(actual)) => expected == actual,
                (_, None) => false,
            }
        }));
        self
    }

    /// Filter nodes that carry an attribute (regardless of value).
    pub fn attribute_exists(mut self, key: &str) -> Self {
        let key = key.to_string();
        self.filters
            .push(Box::new(move |node| node.attributes.contains_key(&key)));
        self
    }

    /// Filter nodes nested (at any depth) inside the scope named `scope`.
    pub fn within(mut self, scope: &str) -> Self {
        let prefix = QualifiedName::parse(scope);
        self.filters.push(Box::new(move |node| {
            let name = node.qualified_name();
            name.len() > prefix.len() && name.starts_with(&prefix)
        }));
        self
    }

    /// Filter nodes declared in a file matching a glob pattern.
    ///
    /// Supports `*` within a path segment and `**` across directories.
    ///
    /// - `*.h` - headers in the current directory
    /// - `**/*.cpp` - all implementation files
    pub fn declared_in(mut self, pattern: &str) -> Self {
        let pattern = pattern.to_string();
        self.filters.push(Box::new(move |node| {
            node.attributes
                .get_string_list(attrs::DECLARED_IN)
                .map_or(false, |files| files.iter().any(|f| glob_match(&pattern, f)))
        }));
        self
    }

    /// Filter nodes using a custom predicate function.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ontograph::{attrs, NodeKind, Ontology};
    /// # let graph = Ontology::new();
    /// // Methods taking at least three parameters
    /// let results = graph
    ///     .query()
    ///     .kind(NodeKind::Method)
    ///     .custom(|node| {
    ///         node.attributes
    ///             .get_string_list(attrs::PARAMETER_TYPES)
    ///             .map_or(false, |params| params.len() >= 3)
    ///     })
    ///     .execute();
    /// # assert!(results.is_empty());
    /// ```
    pub fn custom<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Node) -> bool + 'a,
    {
        self.filters.push(Box::new(predicate));
        self
    }

    /// Limit the number of results returned.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit_value = Some(n);
        self
    }

    /// Execute the query and return matching node IDs.
    pub fn execute(&self) -> Vec<NodeId> {
        self.graph
            .nodes()
            .filter(|node| self.matches_filters(node))
            .take(self.limit_value.unwrap_or(usize::MAX))
            .map(|node| node.id)
            .collect()
    }

    /// Count the matching nodes, ignoring the limit.
    pub fn count(&self) -> usize {
        self.graph
            .nodes()
            .filter(|node| self.matches_filters(node))
            .count()
    }

    /// Check if any node matches the query (short-circuits on first match).
    pub fn exists(&self) -> bool {
        self.graph.nodes().any(|node| self.matches_filters(node))
    }

    fn matches_filters(&self, node: &Node) -> bool {
        self.filters.iter().all(|filter| filter(node))
    }
}

/// Glob match where `*` stays within a path segment and `**` spans segments.
fn glob_match(pattern: &str, path: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('/').collect();
    let path: Vec<&str> = path.split('/').collect();
    match_segments(&pattern, &path)
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => (0..=path.len()).any(|skip| match_segments(rest, &path[skip..])),
        Some((head, rest)) => match path.split_first() {
            Some((segment, path_rest)) => {
                wildcard_match(head, segment) && match_segments(rest, path_rest)
            }
            None => false,
        },
    }
}

fn wildcard_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !text.starts_with(part) {
                return false;
            }
            pos = part.len();
        } else if i == parts.len() - 1 {
            return text.len() >= pos + part.len() && text[pos..].ends_with(part);
        } else if let Some(index) = text[pos..].find(part) {
            pos += index + part.len();
        } else {
            return false;
        }
    }
    true
}

/// `^` anchors at the start, `$` at the end, otherwise substring.
fn anchored_match(pattern: &str, text: &str) -> bool {
    let starts_with = pattern.starts_with('^');
    let ends_with = pattern.ends_with('$');
    let pattern = pattern.trim_start_matches('^').trim_end_matches('$');

    match (starts_with, ends_with) {
        (true, true) => text == pattern,
        (true, false) => text.starts_with(pattern),
        (false, true) => text.ends_with(pattern),
        (false, false) => text.contains(pattern),
    }
}
