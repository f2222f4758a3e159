//! Relation extraction.
//!
//! Extraction runs in two phases. [`extract_unit`] turns the declaration
//! records of one translation unit into a [`UnitDelta`]: entity records with
//! their attributes, plus symbolic references that can only be resolved once
//! every unit is known. Deltas are independent, so they are produced on the
//! worker pool. The link pass in [`link`] later resolves the references
//! against the merged registry and emits the relation edges.

pub(crate) mod link;

use ontograph::{attrs, NodeKey, NodeKind, PropertyMap, QualifiedName};
use ontograph_parser_api::{
    BaseSpecifier, Body, Declaration, ExtractConfig, Parameter, ScopeKind, TranslationUnit,
    UsingDirective,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::registry::LookupContext;

/// What one unit says about one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub key: NodeKey,
    pub kind: NodeKind,
    pub attributes: PropertyMap,
    pub is_definition: bool,
    /// Scope known only from a qualifier
    pub implied: bool,
}

impl EntityRecord {
    fn implied_scope(name: QualifiedName) -> Self {
        Self {
            key: NodeKey::scope(name),
            kind: NodeKind::Namespace,
            attributes: PropertyMap::new().with(attrs::IMPLIED, true),
            is_definition: false,
            implied: true,
        }
    }
}

/// A symbolic reference waiting for the link pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reference {
    Base {
        derived: NodeKey,
        base: BaseSpecifier,
    },
    AliasTarget {
        alias: NodeKey,
        spelling: String,
    },
    FieldType {
        field: NodeKey,
        spelling: String,
    },
    ParameterType {
        callable: NodeKey,
        spelling: String,
    },
    ReturnType {
        callable: NodeKey,
        spelling: String,
    },
    LocalType {
        function: NodeKey,
        spelling: String,
    },
    /// Call sites of one function body, with the parameters receivers may name
    Body {
        caller: NodeKey,
        parameters: Vec<Parameter>,
        body: Body,
    },
}

/// Extraction result of one translation unit.
///
/// Entity records are ordered so that every scope precedes its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDelta {
    pub path: PathBuf,
    pub entities: Vec<EntityRecord>,
    pub references: Vec<Reference>,
    /// Directives that widen lookups made on behalf of this unit
    pub using_directives: Vec<UsingDirective>,
}

impl UnitDelta {
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }
}

/// What the assembler keeps of a merged unit until the link pass.
#[derive(Debug, Clone, Default)]
pub(crate) struct PendingUnit {
    pub references: Vec<Reference>,
    pub using_directives: Vec<UsingDirective>,
    /// Scopes the unit names only through qualifiers
    pub implied: Vec<QualifiedName>,
}

impl PendingUnit {
    pub fn from_delta(delta: &mut UnitDelta) -> Self {
        Self {
            references: std::mem::take(&mut delta.references),
            using_directives: std::mem::take(&mut delta.using_directives),
            implied: delta
                .entities
                .iter()
                .filter(|e| e.implied)
                .map(|e| e.key.name.clone())
                .collect(),
        }
    }

    pub fn context<'a>(&'a self, path: &'a Path) -> LookupContext<'a> {
        LookupContext::new(path, &self.using_directives)
    }
}

/// Build the delta of one unit.
///
/// Scopes that appear only as qualifiers (`Person::` in an out-of-line
/// definition) become implied scope records.
pub fn extract_unit(unit: &TranslationUnit, config: &ExtractConfig) -> UnitDelta {
    let source_file = unit.path.display().to_string();
    let mut entities = Vec::new();
    let mut references = Vec::new();
    let mut scopes: HashSet<QualifiedName> = HashSet::new();

    for decl in unit.declarations() {
        let mut prefix = QualifiedName::global();
        for segment in &decl.scope {
            prefix = prefix.child(segment.name.clone());
            if scopes.insert(prefix.clone()) {
                entities.push(scope_record(&prefix, segment.kind));
            }
        }

        let key = decl.key();
        if decl.kind.family() == ontograph::KindFamily::Scope {
            scopes.insert(key.name.clone());
        }

        let mut attributes = common_attributes(decl, &source_file);
        match decl.kind {
            NodeKind::Class | NodeKind::Struct => {
                record_attributes(decl, unit, &mut attributes);
                references.extend(decl.bases.iter().map(|base| Reference::Base {
                    derived: key.clone(),
                    base: base.clone(),
                }));
            }
            NodeKind::Function | NodeKind::Method | NodeKind::Constructor | NodeKind::Destructor => {
                callable_attributes(decl, &mut attributes);
                if config.extract_type_usage {
                    if let Some(signature) = &decl.signature {
                        references.extend(signature.parameters.iter().map(|p| {
                            Reference::ParameterType {
                                callable: key.clone(),
                                spelling: p.type_spelling.clone(),
                            }
                        }));
                        if let Some(ret) = &signature.return_type {
                            references.push(Reference::ReturnType {
                                callable: key.clone(),
                                spelling: ret.clone(),
                            });
                        }
                    }
                }
                if let Some(body) = &decl.body {
                    if config.extract_type_usage {
                        references.extend(body.locals.iter().map(|local| Reference::LocalType {
                            function: key.clone(),
                            spelling: local.type_spelling.clone(),
                        }));
                    }
                    if config.extract_calls && !body.calls.is_empty() {
                        references.push(Reference::Body {
                            caller: key.clone(),
                            parameters: decl
                                .signature
                                .as_ref()
                                .map(|s| s.parameters.clone())
                                .unwrap_or_default(),
                            body: body.clone(),
                        });
                    }
                }
            }
            NodeKind::TypeAlias => {
                if let Some(target) = &decl.underlying_type {
                    attributes.insert(attrs::UNDERLYING_TYPE, target.clone());
                    references.push(Reference::AliasTarget {
                        alias: key.clone(),
                        spelling: target.clone(),
                    });
                }
            }
            NodeKind::Field => {
                if decl.specifiers.is_static {
                    attributes.insert(attrs::IS_STATIC, true);
                }
                if let Some(field_type) = &decl.field_type {
                    attributes.insert(attrs::FIELD_TYPE, field_type.clone());
                    if config.extract_type_usage {
                        references.push(Reference::FieldType {
                            field: key.clone(),
                            spelling: field_type.clone(),
                        });
                    }
                }
            }
            NodeKind::Namespace | NodeKind::External => {}
        }

        entities.push(EntityRecord {
            key,
            kind: decl.kind,
            attributes,
            is_definition: decl.is_definition,
            implied: false,
        });
    }

    UnitDelta {
        path: unit.path.clone(),
        entities,
        references,
        using_directives: unit.using_directives.clone(),
    }
}

/// Record for an enclosing scope the unit never declares itself.
fn scope_record(name: &QualifiedName, kind: ScopeKind) -> EntityRecord {
    match kind {
        ScopeKind::Unknown => EntityRecord::implied_scope(name.clone()),
        ScopeKind::Namespace | ScopeKind::Class | ScopeKind::Struct => {
            let kind = match kind {
                ScopeKind::Class => NodeKind::Class,
                ScopeKind::Struct => NodeKind::Struct,
                _ => NodeKind::Namespace,
            };
            EntityRecord {
                key: NodeKey::scope(name.clone()),
                kind,
                attributes: PropertyMap::new(),
                is_definition: false,
                implied: false,
            }
        }
    }
}

fn common_attributes(decl: &Declaration, source_file: &str) -> PropertyMap {
    let mut attributes = PropertyMap::new()
        .with(attrs::SOURCE_FILE, source_file)
        .with(attrs::LINE, decl.line)
        .with(attrs::DECLARED_IN, vec![source_file.to_string()]);
    if decl.is_definition {
        attributes.insert(attrs::IS_DEFINITION, true);
        attributes.insert(attrs::DEFINED_IN, source_file);
    }
    if let Some(access) = decl.access {
        attributes.insert(attrs::ACCESS, access.as_str());
    }
    if !decl.template_parameters.is_empty() {
        attributes.insert(attrs::TEMPLATE_PARAMETERS, decl.template_parameters.clone());
    }
    attributes
}

fn record_attributes(decl: &Declaration, unit: &TranslationUnit, attributes: &mut PropertyMap) {
    if decl.kind == NodeKind::Struct {
        attributes.insert(attrs::IS_STRUCT, true);
    }
    if !decl.bases.is_empty() {
        attributes.insert(
            attrs::BASES,
            decl.bases.iter().map(|b| b.name.clone()).collect::<Vec<_>>(),
        );
    }

    let name = decl.qualified_name();
    let methods: Vec<String> = unit
        .declarations()
        .filter(|d| d.kind.is_callable() && d.scope_name() == name)
        .map(|d| d.name.clone())
        .collect();
    if !methods.is_empty() {
        attributes.union_strings(attrs::METHODS, methods);
    }
}

fn callable_attributes(decl: &Declaration, attributes: &mut PropertyMap) {
    let flags = decl.specifiers;
    for (key, set) in [
        (attrs::IS_VIRTUAL, flags.is_virtual || flags.is_pure),
        (attrs::IS_OVERRIDE, flags.is_override || flags.is_final),
        (attrs::IS_PURE, flags.is_pure),
        (attrs::IS_STATIC, flags.is_static),
        (attrs::IS_DEFAULTED, flags.is_defaulted),
        (attrs::IS_DELETED, flags.is_deleted),
    ] {
        if set {
            attributes.insert(key, true);
        }
    }

    let Some(signature) = &decl.signature else {
        attributes.insert(attrs::PARAMETER_TYPES, Vec::<String>::new());
        attributes.insert(attrs::MIN_ARITY, 0usize);
        return;
    };
    attributes.insert(attrs::PARAMETER_TYPES, signature.parameter_types());
    attributes.insert(attrs::PARAMETER_NAMES, signature.parameter_names());
    attributes.insert(attrs::MIN_ARITY, signature.min_arity());
    if let Some(ret) = &signature.return_type {
        attributes.insert(attrs::RETURN_TYPE, ret.clone());
    }
    if signature.is_const {
        attributes.insert(attrs::CONST_QUALIFIED, true);
    }
    if signature.is_variadic {
        attributes.insert(attrs::IS_VARIADIC, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontograph_parser_api::{
        Access, CallSite, LocalBinding, ScopeSegment, Signature, Specifiers,
    };

    fn person_unit() -> TranslationUnit {
        let scope = vec![
            ScopeSegment::new("Entities", ScopeKind::Unknown),
            ScopeSegment::new("Person", ScopeKind::Unknown),
        ];
        let mut body = Body::new();
        body.add_local(LocalBinding::new("copy", "Entities::Person", 5));
        body.add_call(CallSite::plain("helper", 0, 6));

        TranslationUnit::new("Entities.cpp").with(
            Declaration::new(NodeKind::Method, "getName", 4)
                .with_scope(scope)
                .with_signature(Signature::new(vec![]).returning("std::string").const_qualified())
                .with_body(body),
        )
    }

    #[test]
    fn test_qualifiers_become_implied_scopes() {
        let delta = extract_unit(&person_unit(), &ExtractConfig::default());

        assert_eq!(delta.entity_count(), 3);
        assert!(delta.entities[0].implied);
        assert_eq!(delta.entities[0].key.name.to_string(), "Entities");
        assert!(delta.entities[1].implied);
        assert_eq!(delta.entities[1].key.name.to_string(), "Entities::Person");

        let method = &delta.entities[2];
        assert!(method.is_definition);
        assert_eq!(method.key.to_string(), "Callable:Entities::Person::getName()const");
        assert_eq!(method.attributes.get_bool(attrs::CONST_QUALIFIED), Some(true));
        assert_eq!(method.attributes.get_string(attrs::DEFINED_IN), Some("Entities.cpp"));
    }

    #[test]
    fn test_references_follow_config() {
        let full = extract_unit(&person_unit(), &ExtractConfig::default());
        assert!(full
            .references
            .iter()
            .any(|r| matches!(r, Reference::ReturnType { spelling, .. } if spelling == "std::string")));
        assert!(full
            .references
            .iter()
            .any(|r| matches!(r, Reference::LocalType { .. })));
        assert!(full.references.iter().any(|r| matches!(r, Reference::Body { .. })));

        let fast = extract_unit(&person_unit(), &ExtractConfig::fast());
        assert!(fast.references.is_empty());
    }

    #[test]
    fn test_record_lists_methods_and_bases() {
        let record_scope = vec![ScopeSegment::new("Shape", ScopeKind::Class)];
        let unit = TranslationUnit::new("shapes.h")
            .with(
                Declaration::new(NodeKind::Class, "Circle", 3)
                    .definition()
                    .with_bases(vec![BaseSpecifier::new("Shape", Access::Public)]),
            )
            .with(
                Declaration::new(NodeKind::Method, "area", 4)
                    .with_scope(vec![ScopeSegment::new("Circle", ScopeKind::Class)])
                    .with_access(Access::Public)
                    .with_signature(Signature::new(vec![]).returning("double").const_qualified())
                    .with_specifiers(Specifiers {
                        is_override: true,
                        ..Default::default()
                    }),
            )
            .with(Declaration::new(NodeKind::Method, "draw", 9).with_scope(record_scope));

        let delta = extract_unit(&unit, &ExtractConfig::default());
        let circle = &delta.entities[0];
        assert_eq!(
            circle.attributes.get_string_list(attrs::METHODS),
            Some(&["area".to_string()][..])
        );
        assert_eq!(
            circle.attributes.get_string_list(attrs::BASES),
            Some(&["Shape".to_string()][..])
        );
        assert!(matches!(
            &delta.references[0],
            Reference::Base { base, .. } if base.name == "Shape"
        ));

        let area = delta
            .entities
            .iter()
            .find(|e| e.key.name.to_string() == "Circle::area")
            .unwrap();
        assert_eq!(area.attributes.get_bool(attrs::IS_OVERRIDE), Some(true));
        assert_eq!(area.attributes.get_string(attrs::ACCESS), Some("public"));
    }

    #[test]
    fn test_known_enclosing_scope_is_not_implied() {
        let unit = TranslationUnit::new("geo.h").with(
            Declaration::new(NodeKind::Function, "area", 2)
                .with_scope(vec![ScopeSegment::new("geo", ScopeKind::Namespace)]),
        );
        let delta = extract_unit(&unit, &ExtractConfig::default());

        assert_eq!(delta.entities[0].kind, NodeKind::Namespace);
        assert!(!delta.entities[0].implied);
        assert_eq!(
            delta.entities[1].attributes.get_int(attrs::MIN_ARITY),
            Some(0)
        );
    }
}
