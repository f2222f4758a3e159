use super::body::Body;
use super::signature::Signature;
use ontograph::{NodeKey, NodeKind, QualifiedName};
use serde::{Deserialize, Serialize};

/// What the front-end knows about an enclosing scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    Namespace,
    Class,
    Struct,
    /// Known only from a qualifier such as `Person::` in `Person::getName`
    Unknown,
}

impl ScopeKind {
    pub fn is_record(self) -> bool {
        matches!(self, ScopeKind::Class | ScopeKind::Struct)
    }
}

/// One enclosing scope of a declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeSegment {
    pub name: String,
    pub kind: ScopeKind,
}

impl ScopeSegment {
    pub fn new(name: impl Into<String>, kind: ScopeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// `using namespace N;` written at namespace scope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsingDirective {
    /// Scope the directive appears in; global for file level
    pub scope: QualifiedName,
    /// Nominated namespace as spelled, possibly qualified
    pub namespace: String,
    pub line: usize,
}

impl UsingDirective {
    pub fn new(scope: QualifiedName, namespace: impl Into<String>, line: usize) -> Self {
        Self {
            scope,
            namespace: namespace.into(),
            line,
        }
    }

    /// The directive is in effect for lookups from `scope` or anything nested in it.
    pub fn applies_to(&self, scope: &QualifiedName) -> bool {
        scope.starts_with(&self.scope)
    }
}

/// Member access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    Public,
    Protected,
    Private,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        }
    }
}

/// A base class in a class/struct head
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseSpecifier {
    /// Spelled base name, possibly qualified or templated
    pub name: String,
    pub access: Access,
    pub is_virtual: bool,
}

impl BaseSpecifier {
    pub fn new(name: impl Into<String>, access: Access) -> Self {
        Self {
            name: name.into(),
            access,
            is_virtual: false,
        }
    }
}

/// Declaration specifiers and trailing qualifiers of a callable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Specifiers {
    pub is_virtual: bool,
    pub is_override: bool,
    pub is_final: bool,
    pub is_pure: bool,
    pub is_static: bool,
    pub is_defaulted: bool,
    pub is_deleted: bool,
}

/// One declaration record produced by an AST adapter.
///
/// A record describes what a single unit says about one entity: a forward
/// declaration, an in-class declaration, or a definition. Records for the same
/// entity from different units are merged by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Syntactic kind; callables declared out of line are `Function` until
    /// their enclosing scope turns out to be a record
    pub kind: NodeKind,

    /// Simple name (`getName`, `~Person`, `(anonymous Actions.cpp)`)
    pub name: String,

    /// Enclosing scopes, outermost first
    pub scope: Vec<ScopeSegment>,

    /// Callables only
    pub signature: Option<Signature>,

    /// Has a body (callables) or member list (records)
    pub is_definition: bool,

    /// 1-based line of the declarator
    pub line: usize,

    /// Access level inside a record
    pub access: Option<Access>,

    pub specifiers: Specifiers,

    /// Records only
    pub bases: Vec<BaseSpecifier>,

    /// Names of template parameters when declared under `template <...>`
    pub template_parameters: Vec<String>,

    /// Type aliases only
    pub underlying_type: Option<String>,

    /// Fields only
    pub field_type: Option<String>,

    /// Defined callables only
    pub body: Option<Body>,
}

impl Declaration {
    pub fn new(kind: NodeKind, name: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            scope: Vec::new(),
            signature: None,
            is_definition: false,
            line,
            access: None,
            specifiers: Specifiers::default(),
            bases: Vec::new(),
            template_parameters: Vec::new(),
            underlying_type: None,
            field_type: None,
            body: None,
        }
    }

    // Builder methods
    pub fn with_scope(mut self, scope: Vec<ScopeSegment>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn definition(mut self) -> Self {
        self.is_definition = true;
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_specifiers(mut self, specifiers: Specifiers) -> Self {
        self.specifiers = specifiers;
        self
    }

    pub fn with_bases(mut self, bases: Vec<BaseSpecifier>) -> Self {
        self.bases = bases;
        self
    }

    pub fn with_template_parameters(mut self, params: Vec<String>) -> Self {
        self.template_parameters = params;
        self
    }

    pub fn with_underlying_type(mut self, spelling: impl Into<String>) -> Self {
        self.underlying_type = Some(spelling.into());
        self
    }

    pub fn with_field_type(mut self, spelling: impl Into<String>) -> Self {
        self.field_type = Some(spelling.into());
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self.is_definition = true;
        self
    }

    /// Fully qualified name of the enclosing scope.
    pub fn scope_name(&self) -> QualifiedName {
        QualifiedName::from_segments(self.scope.iter().map(|s| s.name.clone()))
    }

    /// Fully qualified name of the declared entity.
    pub fn qualified_name(&self) -> QualifiedName {
        self.scope_name().child(self.name.clone())
    }

    /// Stable identity of the declared entity.
    ///
    /// A callable without a signature record is keyed as taking no parameters.
    pub fn key(&self) -> NodeKey {
        let name = self.qualified_name();
        match self.kind {
            NodeKind::Namespace | NodeKind::Class | NodeKind::Struct => NodeKey::scope(name),
            NodeKind::Function | NodeKind::Method | NodeKind::Constructor | NodeKind::Destructor => {
                let identity = self
                    .signature
                    .as_ref()
                    .map(Signature::identity)
                    .unwrap_or_else(|| "()".to_string());
                NodeKey::callable(name, identity)
            }
            NodeKind::TypeAlias => NodeKey::alias(name),
            NodeKind::Field => NodeKey::field(name),
            NodeKind::External => NodeKey::external(&name.to_string()),
        }
    }

    /// True if nested directly inside a class or struct body.
    pub fn is_member(&self) -> bool {
        self.scope.last().map_or(false, |s| s.kind.is_record())
    }

    /// Symbolic references carried by this record.
    pub fn reference_count(&self) -> usize {
        self.bases.len()
            + self
                .body
                .as_ref()
                .map_or(0, |b| b.calls.len() + b.locals.len())
    }
}
