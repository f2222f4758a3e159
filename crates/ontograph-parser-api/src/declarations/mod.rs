pub mod body;
pub mod declaration;
pub mod signature;

pub use body::{Body, CallSite, CallStyle, LocalBinding, Receiver};
pub use declaration::{
    Access, BaseSpecifier, Declaration, ScopeKind, ScopeSegment, Specifiers, UsingDirective,
};
pub use signature::{Parameter, Signature};
