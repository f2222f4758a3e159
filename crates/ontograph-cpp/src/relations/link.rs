//! Link pass: resolves the pending references of every merged unit against
//! the registry and emits the relation edges.

use log::{debug, trace};
use ontograph::{attrs, EdgeKind, Node, NodeId, NodeKey, NodeKind, PropertyMap};
use ontograph_parser_api::{Body, CallSite, CallStyle, Parameter, Receiver};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use super::{PendingUnit, Reference};
use crate::error::Result;
use crate::registry::{EntityRegistry, LookupContext};
use crate::summary::{ReferenceKind, UnresolvedReference};
use crate::types::{base_type_name, normalize_type, strip_template_args, type_references};

/// Run every linking step in order and return the references that fell back
/// to External placeholders.
///
/// Aliases are linked first so later steps can see through them; overrides
/// need the inheritance edges.
pub(crate) fn link(
    registry: &mut EntityRegistry,
    pending: &BTreeMap<PathBuf, PendingUnit>,
) -> Result<Vec<UnresolvedReference>> {
    let mut linker = Linker {
        registry,
        unresolved: Vec::new(),
    };
    linker.link_aliases(pending)?;
    linker.link_bases(pending)?;
    linker.link_fields(pending)?;
    linker.link_signatures(pending)?;
    linker.link_overloads()?;
    linker.link_overrides()?;
    linker.link_calls(pending)?;
    linker.link_locals(pending)?;
    debug!(
        "Link pass finished with {} unresolved references",
        linker.unresolved.len()
    );
    Ok(linker.unresolved)
}

/// Every pending reference with the lookup context of the unit it came from.
fn references(
    pending: &BTreeMap<PathBuf, PendingUnit>,
) -> impl Iterator<Item = (LookupContext<'_>, &Reference)> {
    pending.iter().flat_map(|(path, unit)| {
        let context = unit.context(path);
        unit.references.iter().map(move |r| (context, r))
    })
}

enum CallTarget {
    /// Zero or more declared callees (empty for calls with nothing to link)
    Resolved(Vec<NodeId>),
    /// Spelling of the External placeholder to call instead
    Unresolved(String),
}

struct Linker<'r> {
    registry: &'r mut EntityRegistry,
    unresolved: Vec<UnresolvedReference>,
}

impl Linker<'_> {
    fn link_aliases(&mut self, pending: &BTreeMap<PathBuf, PendingUnit>) -> Result<()> {
        for (context, reference) in references(pending) {
            let Reference::AliasTarget { alias, spelling } = reference else {
                continue;
            };
            let Some(alias) = self.node_id(alias) else {
                continue;
            };

            let names = type_references(spelling);
            let Some((primary, arguments)) = names.split_first() else {
                // Builtin and function types still give the alias a target
                let target = self.registry.external(&normalize_type(spelling))?;
                self.uses_type(alias, target, "alias")?;
                continue;
            };
            if let Some(target) =
                self.resolve_type(&context, alias, primary, ReferenceKind::AliasTarget)?
            {
                self.uses_type(alias, target, "alias")?;
            }
            for argument in arguments {
                if let Some(target) =
                    self.resolve_type(&context, alias, argument, ReferenceKind::AliasTarget)?
                {
                    self.uses_type(alias, target, "template_argument")?;
                }
            }
        }
        Ok(())
    }

    fn link_bases(&mut self, pending: &BTreeMap<PathBuf, PendingUnit>) -> Result<()> {
        for (context, reference) in references(pending) {
            let Reference::Base { derived, base } = reference else {
                continue;
            };
            let Some(derived) = self.node_id(derived) else {
                continue;
            };
            let name = strip_template_args(&base.name);
            let Some(found) = self.resolve_type(&context, derived, &name, ReferenceKind::Base)? else {
                continue;
            };
            let target = self.registry.chase_alias(found);
            if target == derived {
                continue;
            }
            self.connect(
                derived,
                target,
                EdgeKind::Inherits,
                PropertyMap::new().with(attrs::INHERITANCE_ACCESS, base.access.as_str()),
            )?;
        }
        Ok(())
    }

    fn link_fields(&mut self, pending: &BTreeMap<PathBuf, PendingUnit>) -> Result<()> {
        for (context, reference) in references(pending) {
            let Reference::FieldType { field, spelling } = reference else {
                continue;
            };
            let Some(field) = self.node_id(field) else {
                continue;
            };
            let record = self.registry.scope_of(field);
            let field_name = self.registry.graph().node(field)?.name().to_string();

            for name in type_references(spelling) {
                let Some(target) = self.resolve_type(&context, field, &name, ReferenceKind::FieldType)?
                else {
                    continue;
                };
                self.uses_type(field, target, "field")?;
                self.connect(
                    record,
                    target,
                    EdgeKind::HasField,
                    PropertyMap::new().with(attrs::VIA_FIELDS, vec![field_name.clone()]),
                )?;
            }
        }
        Ok(())
    }

    fn link_signatures(&mut self, pending: &BTreeMap<PathBuf, PendingUnit>) -> Result<()> {
        for (context, reference) in references(pending) {
            let (callable, spelling, role, kind) = match reference {
                Reference::ParameterType { callable, spelling } => {
                    (callable, spelling, "parameter", ReferenceKind::ParameterType)
                }
                Reference::ReturnType { callable, spelling } => {
                    (callable, spelling, "return", ReferenceKind::ReturnType)
                }
                _ => continue,
            };
            if let Some(callable) = self.node_id(callable) {
                self.link_type_uses(&context, callable, spelling, role, kind)?;
            }
        }
        Ok(())
    }

    fn link_locals(&mut self, pending: &BTreeMap<PathBuf, PendingUnit>) -> Result<()> {
        for (context, reference) in references(pending) {
            let Reference::LocalType { function, spelling } = reference else {
                continue;
            };
            if let Some(function) = self.node_id(function) {
                self.link_type_uses(&context, function, spelling, "local", ReferenceKind::LocalType)?;
            }
        }
        Ok(())
    }

    /// Symmetric Overloads edges inside every (scope, simple name) group.
    fn link_overloads(&mut self) -> Result<()> {
        let graph = self.registry.graph();
        let mut groups: BTreeMap<(NodeId, String), Vec<NodeId>> = BTreeMap::new();
        for node in graph.nodes().filter(|n| n.kind.is_overloadable()) {
            let scope = self.registry.scope_of(node.id);
            groups
                .entry((scope, node.name().to_string()))
                .or_default()
                .push(node.id);
        }

        let pairs: Vec<(NodeId, NodeId)> = groups
            .values()
            .filter(|group| group.len() > 1)
            .flat_map(|group| {
                group.iter().flat_map(move |&a| {
                    group
                        .iter()
                        .filter(move |&&b| b != a)
                        .map(move |&b| (a, b))
                })
            })
            .collect();
        for (a, b) in pairs {
            self.connect(a, b, EdgeKind::Overloads, PropertyMap::new())?;
        }
        Ok(())
    }

    fn link_overrides(&mut self) -> Result<()> {
        let methods: Vec<NodeId> = self
            .registry
            .graph()
            .nodes()
            .filter(|n| n.kind == NodeKind::Method && !n.flag(attrs::IS_STATIC))
            .map(|n| n.id)
            .collect();

        let mut memo = HashMap::new();
        let mut links = Vec::new();
        for method in methods {
            let mut visiting = HashSet::new();
            for target in override_targets(self.registry, method, &mut memo, &mut visiting) {
                links.push((method, target));
            }
        }
        for (method, target) in links {
            self.connect(method, target, EdgeKind::Overrides, PropertyMap::new())?;
        }
        Ok(())
    }

    fn link_calls(&mut self, pending: &BTreeMap<PathBuf, PendingUnit>) -> Result<()> {
        for (context, reference) in references(pending) {
            let Reference::Body {
                caller,
                parameters,
                body,
            } = reference
            else {
                continue;
            };
            let Some(caller) = self.node_id(caller) else {
                continue;
            };
            let scope = self.registry.scope_of(caller);
            let hidden = self.template_parameters(caller);

            for call in &body.calls {
                let outcome = match call.style {
                    CallStyle::Plain => self.plain_call(call, scope, &context),
                    CallStyle::Construct => self.construct_call(
                        &call.callee,
                        call.arg_count,
                        scope,
                        &context,
                        &hidden,
                    ),
                    CallStyle::Member => {
                        self.member_call(call, scope, &context, parameters, body, &hidden)
                    }
                };
                let targets = match outcome {
                    CallTarget::Resolved(targets) => targets,
                    CallTarget::Unresolved(spelling) => {
                        self.report(context.unit, caller, &spelling, ReferenceKind::Call);
                        vec![self.registry.external(&spelling)?]
                    }
                };
                for target in targets {
                    self.connect(
                        caller,
                        target,
                        EdgeKind::Calls,
                        PropertyMap::new().with(attrs::CALL_LINES, vec![call.line as i64]),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// `f(args)`, `ns::f(args)` or `T(args)`.
    fn plain_call(&self, call: &CallSite, scope: NodeId, context: &LookupContext<'_>) -> CallTarget {
        let name = strip_template_args(&call.callee);
        let resolution = self.registry.resolve_in(&name, scope, context, |n| {
            n.kind.is_callable() || n.kind.is_type()
        });
        let candidates = resolution.nodes();
        if candidates.is_empty() {
            return CallTarget::Unresolved(name);
        }

        let named_type = candidates
            .iter()
            .copied()
            .find(|&id| self.kind(id).map_or(false, NodeKind::is_type));
        if let Some(ty) = named_type {
            let target = self.registry.chase_alias(ty);
            return if self.kind(target).map_or(false, NodeKind::is_record) {
                CallTarget::Resolved(self.constructors(target, call.arg_count))
            } else {
                CallTarget::Resolved(vec![target])
            };
        }
        CallTarget::Resolved(self.narrow_by_arity(candidates, call.arg_count))
    }

    /// `new T(args)` and `T x(args)`.
    fn construct_call(
        &self,
        spelling: &str,
        arg_count: usize,
        scope: NodeId,
        context: &LookupContext<'_>,
        hidden: &HashSet<String>,
    ) -> CallTarget {
        let Some(name) = base_type_name(spelling) else {
            return CallTarget::Resolved(Vec::new());
        };
        if hidden.contains(&name) {
            return CallTarget::Resolved(Vec::new());
        }
        let Some(found) = self
            .registry
            .resolve_in(&name, scope, context, |n| n.kind.is_type())
            .first()
        else {
            return CallTarget::Unresolved(name);
        };

        let target = self.registry.chase_alias(found);
        match self.kind(target) {
            Some(kind) if kind.is_record() => {
                CallTarget::Resolved(self.constructors(target, arg_count))
            }
            Some(NodeKind::External) => CallTarget::Resolved(vec![target]),
            _ => CallTarget::Unresolved(name),
        }
    }

    /// `x.f(args)`, `x->f(args)` and `this->f(args)`: look `f` up in the
    /// receiver's record.
    fn member_call(
        &self,
        call: &CallSite,
        scope: NodeId,
        context: &LookupContext<'_>,
        parameters: &[Parameter],
        body: &Body,
        hidden: &HashSet<String>,
    ) -> CallTarget {
        let member = strip_template_args(&call.callee);
        let receiver = match &call.receiver {
            Receiver::This if self.kind(scope).map_or(false, NodeKind::is_record) => scope,
            Receiver::Variable(variable) => {
                let spelled = body
                    .local_type(variable)
                    .map(str::to_string)
                    .or_else(|| {
                        parameters
                            .iter()
                            .find(|p| p.name.as_deref() == Some(variable.as_str()))
                            .map(|p| p.type_spelling.clone())
                    })
                    .or_else(|| self.field_type(variable, scope, context));
                let Some(type_name) = spelled.as_deref().and_then(base_type_name) else {
                    return CallTarget::Unresolved(member);
                };
                if hidden.contains(&type_name) {
                    return CallTarget::Unresolved(member);
                }
                match self
                    .registry
                    .resolve_in(&type_name, scope, context, |n| n.kind.is_type())
                    .first()
                {
                    Some(found) => self.registry.chase_alias(found),
                    None => return CallTarget::Unresolved(format!("{type_name}::{member}")),
                }
            }
            _ => return CallTarget::Unresolved(member),
        };
        trace!("Member call {member} on node {receiver}");

        let Ok(node) = self.registry.graph().node(receiver) else {
            return CallTarget::Unresolved(member);
        };
        if node.kind.is_record() {
            let found = self
                .registry
                .lookup_member(receiver, &member, &|n: &Node| n.kind.is_callable());
            if !found.is_empty() {
                return CallTarget::Resolved(self.narrow_by_arity(&found, call.arg_count));
            }
        }
        CallTarget::Unresolved(format!("{}::{member}", node.qualified_name()))
    }

    /// Constructors of `record` fitting the call, or the record itself when
    /// it declares none.
    fn constructors(&self, record: NodeId, arg_count: usize) -> Vec<NodeId> {
        let ctors: Vec<NodeId> = self
            .registry
            .graph()
            .children(record)
            .into_iter()
            .filter(|&id| self.kind(id) == Some(NodeKind::Constructor))
            .collect();
        if ctors.is_empty() {
            vec![record]
        } else {
            self.narrow_by_arity(&ctors, arg_count)
        }
    }

    /// Keep the candidates that accept `arg_count` arguments, unless none do.
    fn narrow_by_arity(&self, candidates: &[NodeId], arg_count: usize) -> Vec<NodeId> {
        let fitting: Vec<NodeId> = candidates
            .iter()
            .copied()
            .filter(|&id| self.accepts(id, arg_count))
            .collect();
        if fitting.is_empty() {
            candidates.to_vec()
        } else {
            fitting
        }
    }

    fn accepts(&self, id: NodeId, arg_count: usize) -> bool {
        let Ok(node) = self.registry.graph().node(id) else {
            return false;
        };
        if !node.kind.is_callable() {
            return false;
        }
        let min = node.attributes.get_int(attrs::MIN_ARITY).unwrap_or(0) as usize;
        let max = node
            .attributes
            .get_string_list(attrs::PARAMETER_TYPES)
            .map_or(0, <[String]>::len);
        arg_count >= min && (node.flag(attrs::IS_VARIADIC) || arg_count <= max)
    }

    fn field_type(&self, name: &str, scope: NodeId, context: &LookupContext<'_>) -> Option<String> {
        let field = self
            .registry
            .resolve_in(name, scope, context, |n| n.kind == NodeKind::Field)
            .first()?;
        self.registry
            .graph()
            .node(field)
            .ok()?
            .attributes
            .get_string(attrs::FIELD_TYPE)
            .map(str::to_string)
    }

    /// UsesType edges from `from` to every named type in `spelling`.
    fn link_type_uses(
        &mut self,
        context: &LookupContext<'_>,
        from: NodeId,
        spelling: &str,
        role: &str,
        kind: ReferenceKind,
    ) -> Result<()> {
        for name in type_references(spelling) {
            if let Some(target) = self.resolve_type(context, from, &name, kind)? {
                self.uses_type(from, target, role)?;
            }
        }
        Ok(())
    }

    /// Resolve a named type as seen from `from`; unknown names become External
    /// placeholders. Template parameters in scope resolve to nothing.
    fn resolve_type(
        &mut self,
        context: &LookupContext<'_>,
        from: NodeId,
        name: &str,
        kind: ReferenceKind,
    ) -> Result<Option<NodeId>> {
        if self.template_parameters(from).contains(name) {
            return Ok(None);
        }
        let scope = self.registry.scope_of(from);
        let found = self
            .registry
            .resolve_in(name, scope, context, |n| n.kind.is_type() && n.id != from)
            .first();
        match found {
            Some(id) => Ok(Some(id)),
            None => {
                self.report(context.unit, from, name, kind);
                Ok(Some(self.registry.external(name)?))
            }
        }
    }

    /// Template parameter names declared on `node` or any enclosing scope.
    fn template_parameters(&self, node: NodeId) -> HashSet<String> {
        let graph = self.registry.graph();
        let mut names = HashSet::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(list) = graph
                .node(id)
                .ok()
                .and_then(|n| n.attributes.get_string_list(attrs::TEMPLATE_PARAMETERS))
            {
                names.extend(list.iter().cloned());
            }
            current = graph.contains_parent(id);
        }
        names
    }

    fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.registry.graph().node(id).ok().map(|n| n.kind)
    }

    fn node_id(&self, key: &NodeKey) -> Option<NodeId> {
        self.registry.node_by_key(key)
    }

    fn report(&mut self, unit: &Path, from: NodeId, spelling: &str, kind: ReferenceKind) {
        let from = self
            .registry
            .graph()
            .node(from)
            .map(ToString::to_string)
            .unwrap_or_default();
        debug!("Unresolved {kind:?} reference {spelling} from {from}");
        self.unresolved.push(UnresolvedReference {
            unit: unit.to_path_buf(),
            from,
            spelling: spelling.to_string(),
            kind,
        });
    }

    fn uses_type(&mut self, from: NodeId, target: NodeId, role: &str) -> Result<()> {
        self.connect(
            from,
            target,
            EdgeKind::UsesType,
            PropertyMap::new().with(attrs::ROLES, vec![role.to_string()]),
        )
    }

    fn connect(
        &mut self,
        source: NodeId,
        target: NodeId,
        kind: EdgeKind,
        attributes: PropertyMap,
    ) -> Result<()> {
        self.registry
            .graph_mut()
            .connect(source, target, kind, attributes)?;
        Ok(())
    }
}

/// Base methods `method` overrides, searched breadth-first up the
/// inheritance chain.
///
/// A base method with the same simple name and signature is overridden when
/// it is virtual, itself overrides something, or `method` is marked
/// `override`. The first match on a path ends that path.
fn override_targets(
    registry: &EntityRegistry,
    method: NodeId,
    memo: &mut HashMap<NodeId, Vec<NodeId>>,
    visiting: &mut HashSet<NodeId>,
) -> Vec<NodeId> {
    if let Some(found) = memo.get(&method) {
        return found.clone();
    }
    if !visiting.insert(method) {
        return Vec::new();
    }

    let graph = registry.graph();
    let Ok(node) = graph.node(method) else {
        return Vec::new();
    };
    let explicit = node.flag(attrs::IS_OVERRIDE);
    let simple = node.name().to_string();
    let signature = node.key.signature.clone().unwrap_or_default();
    let record = registry.scope_of(method);

    let mut targets = Vec::new();
    let mut seen = HashSet::from([record]);
    let mut queue: VecDeque<NodeId> = registry.bases(record).into();
    while let Some(base) = queue.pop_front() {
        if !seen.insert(base) {
            continue;
        }
        let Ok(base_node) = graph.node(base) else {
            continue;
        };
        let key = NodeKey::callable(base_node.key.name.child(simple.clone()), signature.clone());
        match graph.node_by_key(&key).and_then(|id| graph.node(id).ok()) {
            Some(candidate) if candidate.kind == NodeKind::Method => {
                let candidate_id = candidate.id;
                let overridable = explicit
                    || candidate.flag(attrs::IS_VIRTUAL)
                    || candidate.flag(attrs::IS_OVERRIDE)
                    || (!candidate.flag(attrs::IS_STATIC)
                        && !override_targets(registry, candidate_id, memo, visiting).is_empty());
                if overridable && !candidate.flag(attrs::IS_STATIC) {
                    targets.push(candidate_id);
                }
            }
            Some(_) => {}
            None => queue.extend(registry.bases(base)),
        }
    }

    memo.insert(method, targets.clone());
    targets
}
