//! Stable identity keys for declared entities.
//!
//! Re-declarations of one entity across translation units must collapse into a
//! single node, so identity is a value (qualified name + kind family +
//! signature) rather than the arena slot the node happens to occupy.

use serde::{Deserialize, Serialize};

/// Ordered sequence of enclosing namespace/class names plus the simple name.
///
/// The empty sequence is the implicit global namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName(Vec<String>);

impl QualifiedName {
    /// The global namespace.
    pub fn global() -> Self {
        Self(Vec::new())
    }

    /// Build from already split segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a `::`-separated spelling.
    ///
    /// Separators nested inside template argument lists are not split, so
    /// `std::map<a::b, c>::iterator` yields `["std", "map<a::b, c>", "iterator"]`.
    /// A leading `::` is dropped.
    pub fn parse(spelling: &str) -> Self {
        Self(split_scoped(spelling))
    }

    /// Segments from outermost to innermost.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the global namespace.
    pub fn is_global(&self) -> bool {
        self.0.is_empty()
    }

    /// True when there are no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment, or `""` for the global namespace.
    pub fn simple(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }

    /// Enclosing scope, `None` for the global namespace.
    pub fn parent(&self) -> Option<QualifiedName> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Append a segment.
    pub fn child(&self, name: impl Into<String>) -> QualifiedName {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// True if `prefix` names this scope or one of its ancestors.
    pub fn starts_with(&self, prefix: &QualifiedName) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "::")
        } else {
            write!(f, "{}", self.0.join("::"))
        }
    }
}

/// Split on top-level `::`, ignoring separators inside `<...>` and `(...)`.
fn split_scoped(spelling: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut chars = spelling.trim().chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' | '(' => {
                depth += 1;
                current.push(c);
            }
            '>' | ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ':' if depth == 0 && chars.peek() == Some(&':') => {
                chars.next();
                let segment = current.trim().to_string();
                if !segment.is_empty() {
                    segments.push(segment);
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    let segment = current.trim().to_string();
    if !segment.is_empty() {
        segments.push(segment);
    }
    segments
}

/// Identity family of a node kind.
///
/// Kinds in one family share an identity space: a forward-declared `struct X`
/// and a defined `class X` are the same entity, while a class and a function
/// with the same qualified name are a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KindFamily {
    /// Namespaces and record types
    Scope,
    /// Functions, methods, constructors, destructors
    Callable,
    /// Type aliases
    Alias,
    /// Data members
    Field,
    /// Unresolved placeholders
    External,
}

impl std::fmt::Display for KindFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KindFamily::Scope => write!(f, "Scope"),
            KindFamily::Callable => write!(f, "Callable"),
            KindFamily::Alias => write!(f, "Alias"),
            KindFamily::Field => write!(f, "Field"),
            KindFamily::External => write!(f, "External"),
        }
    }
}

/// Stable identity of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    /// Identity family
    pub family: KindFamily,
    /// Fully qualified name
    pub name: QualifiedName,
    /// Normalized signature for callables, e.g. `(int,double)const`
    pub signature: Option<String>,
}

impl NodeKey {
    /// Key of a namespace, class or struct.
    pub fn scope(name: QualifiedName) -> Self {
        Self {
            family: KindFamily::Scope,
            name,
            signature: None,
        }
    }

    /// Key of the implicit global namespace.
    pub fn global() -> Self {
        Self::scope(QualifiedName::global())
    }

    /// Key of a callable with its normalized signature.
    pub fn callable(name: QualifiedName, signature: impl Into<String>) -> Self {
        Self {
            family: KindFamily::Callable,
            name,
            signature: Some(signature.into()),
        }
    }

    /// Key of a type alias.
    pub fn alias(name: QualifiedName) -> Self {
        Self {
            family: KindFamily::Alias,
            name,
            signature: None,
        }
    }

    /// Key of a data member.
    pub fn field(name: QualifiedName) -> Self {
        Self {
            family: KindFamily::Field,
            name,
            signature: None,
        }
    }

    /// Key of an external placeholder for an unresolved spelling.
    pub fn external(spelling: &str) -> Self {
        Self {
            family: KindFamily::External,
            name: QualifiedName::parse(spelling),
            signature: None,
        }
    }

    /// Key of the scope that contains this entity, `None` for the global namespace.
    pub fn parent_scope(&self) -> Option<NodeKey> {
        self.name.parent().map(NodeKey::scope)
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.signature {
            Some(sig) => write!(f, "{}:{}{}", self.family, self.name, sig),
            None => write!(f, "{}:{}", self.family, self.name),
        }
    }
}
