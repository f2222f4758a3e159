use serde::{Deserialize, Serialize};

/// What a member call is invoked on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Receiver {
    /// Not a member call
    None,

    /// `this->f()` or an implicit member call inside a method
    This,

    /// `x.f()` / `x->f()` on a named variable, parameter or field
    Variable(String),

    /// Any other expression (`a.b.f()`, `make().f()`)
    Expression,
}

/// How a call site was spelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallStyle {
    /// `f(args)`, `ns::f(args)`, `T(args)`
    Plain,

    /// `x.f(args)`, `x->f(args)`, `this->f(args)`
    Member,

    /// `new T(args)` or `T x(args)`: always a constructor call
    Construct,
}

/// A call expression inside a function body
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSite {
    /// Spelled callee: `displayPersonInfo`, `Entities::Person`, `getName`
    pub callee: String,

    /// Receiver of a member call
    pub receiver: Receiver,

    /// Spelling style
    pub style: CallStyle,

    /// Number of arguments at the call site
    pub arg_count: usize,

    /// 1-based line of the call
    pub line: usize,
}

impl CallSite {
    pub fn plain(callee: impl Into<String>, arg_count: usize, line: usize) -> Self {
        Self {
            callee: callee.into(),
            receiver: Receiver::None,
            style: CallStyle::Plain,
            arg_count,
            line,
        }
    }

    pub fn member(
        receiver: Receiver,
        callee: impl Into<String>,
        arg_count: usize,
        line: usize,
    ) -> Self {
        Self {
            callee: callee.into(),
            receiver,
            style: CallStyle::Member,
            arg_count,
            line,
        }
    }

    pub fn construct(type_spelling: impl Into<String>, arg_count: usize, line: usize) -> Self {
        Self {
            callee: type_spelling.into(),
            receiver: Receiver::None,
            style: CallStyle::Construct,
            arg_count,
            line,
        }
    }
}

/// A local variable declared in a function body
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalBinding {
    /// Variable name
    pub name: String,

    /// Normalized declared type (`auto` when deduced)
    pub type_spelling: String,

    /// 1-based line of the declaration
    pub line: usize,
}

impl LocalBinding {
    pub fn new(name: impl Into<String>, type_spelling: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            type_spelling: type_spelling.into(),
            line,
        }
    }
}

/// Symbolic references found in a function body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    /// Call expressions, in source order
    pub calls: Vec<CallSite>,

    /// Local variable declarations, in source order
    pub locals: Vec<LocalBinding>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_call(&mut self, call: CallSite) {
        self.calls.push(call);
    }

    pub fn add_local(&mut self, local: LocalBinding) {
        self.locals.push(local);
    }

    /// Declared type of a local; the latest declaration wins on shadowing.
    pub fn local_type(&self, name: &str) -> Option<&str> {
        self.locals
            .iter()
            .rev()
            .find(|l| l.name == name)
            .map(|l| l.type_spelling.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.locals.is_empty()
    }
}
