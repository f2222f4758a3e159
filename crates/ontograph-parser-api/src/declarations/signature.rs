use serde::{Deserialize, Serialize};

/// A callable parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name (None when unnamed)
    pub name: Option<String>,

    /// Normalized type spelling, e.g. `const Entities::Person&`
    pub type_spelling: String,

    /// Has a default argument
    pub has_default: bool,
}

impl Parameter {
    pub fn new(type_spelling: impl Into<String>) -> Self {
        Self {
            name: None,
            type_spelling: type_spelling.into(),
            has_default: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }
}

/// Parameter list, return type and qualifiers of a callable
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// Declared parameters, in order
    pub parameters: Vec<Parameter>,

    /// Normalized return type (None for constructors and destructors)
    pub return_type: Option<String>,

    /// `const`-qualified member function
    pub is_const: bool,

    /// Ends with a C-style `...`
    pub is_variadic: bool,
}

impl Signature {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self {
            parameters,
            ..Default::default()
        }
    }

    pub fn returning(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn const_qualified(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }

    /// The identity string used to tell overloads apart: `(int,double)const`.
    ///
    /// Only parameter types and qualifiers participate; names, defaults and
    /// the return type do not.
    pub fn identity(&self) -> String {
        let mut types: Vec<&str> = self
            .parameters
            .iter()
            .map(|p| p.type_spelling.as_str())
            .collect();
        if self.is_variadic {
            types.push("...");
        }
        let mut identity = format!("({})", types.join(","));
        if self.is_const {
            identity.push_str("const");
        }
        identity
    }

    /// Parameters without a default argument.
    pub fn min_arity(&self) -> usize {
        self.parameters.iter().filter(|p| !p.has_default).count()
    }

    /// Upper bound on accepted arguments (None when variadic).
    pub fn max_arity(&self) -> Option<usize> {
        if self.is_variadic {
            None
        } else {
            Some(self.parameters.len())
        }
    }

    /// True if a call with `count` arguments is syntactically admissible.
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_arity() && self.max_arity().map_or(true, |max| count <= max)
    }

    pub fn parameter_types(&self) -> Vec<String> {
        self.parameters
            .iter()
            .map(|p| p.type_spelling.clone())
            .collect()
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters
            .iter()
            .map(|p| p.name.clone().unwrap_or_default())
            .collect()
    }
}
