//! AST visitor turning a tree-sitter C++ tree into declaration records

use ontograph::{NodeKind, QualifiedName};
use ontograph_parser_api::{
    Access, BaseSpecifier, Body, CallSite, Declaration, LocalBinding, Parameter, Receiver,
    ScopeKind, ScopeSegment, Signature, Specifiers, UsingDirective,
};
use std::path::Path;
use tree_sitter::Node;

use crate::registry::anonymous_namespace;
use crate::types::{base_type_name, normalize_parameter_type, normalize_type, strip_template_args};

pub struct CppVisitor<'a> {
    pub source: &'a [u8],
    pub declarations: Vec<Declaration>,
    pub using_directives: Vec<UsingDirective>,
    anonymous_namespace: String,
    extract_calls: bool,
    scope: Vec<ScopeSegment>,
    // Some(..) only while inside a record body
    access: Option<Access>,
    // Parameters of the enclosing `template <...>`, consumed by the next declaration
    template_parameters: Vec<String>,
}

impl<'a> CppVisitor<'a> {
    pub fn new(source: &'a [u8], path: &Path) -> Self {
        Self {
            source,
            declarations: Vec::new(),
            using_directives: Vec::new(),
            anonymous_namespace: anonymous_namespace(path),
            extract_calls: true,
            scope: Vec::new(),
            access: None,
            template_parameters: Vec::new(),
        }
    }

    pub fn with_calls(mut self, extract_calls: bool) -> Self {
        self.extract_calls = extract_calls;
        self
    }

    fn node_text(&self, node: Node) -> String {
        node.utf8_text(self.source).unwrap_or("").to_string()
    }

    /// Source text of `[start, end)` with `hole` cut out.
    fn text_without(&self, start: usize, end: usize, hole: Node) -> String {
        let slice = |a: usize, b: usize| String::from_utf8_lossy(&self.source[a..b]).into_owned();
        if hole.start_byte() >= start && hole.end_byte() <= end {
            format!(
                "{} {}",
                slice(start, hole.start_byte()),
                slice(hole.end_byte(), end)
            )
        } else {
            slice(start, end)
        }
    }

    pub fn visit_node(&mut self, node: Node) {
        let should_recurse = match node.kind() {
            "namespace_definition" => {
                self.visit_namespace(node);
                false
            }
            "class_specifier" => {
                self.visit_record(node, NodeKind::Class);
                false
            }
            "struct_specifier" => {
                self.visit_record(node, NodeKind::Struct);
                false
            }
            "function_definition" => {
                self.visit_function_definition(node);
                false
            }
            "declaration" => {
                self.visit_declaration(node);
                false
            }
            "field_declaration" => {
                self.visit_field_declaration(node);
                false
            }
            "template_declaration" => {
                self.visit_template(node);
                false
            }
            "alias_declaration" => {
                self.visit_alias(node);
                false
            }
            "type_definition" => {
                self.visit_typedef(node);
                false
            }
            "access_specifier" => {
                self.visit_access_specifier(node);
                false
            }
            "using_declaration" => {
                self.visit_using(node);
                false
            }
            "linkage_specification" => {
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_node(body);
                }
                false
            }
            "compound_statement"
            | "enum_specifier"
            | "union_specifier"
            | "friend_declaration"
            | "namespace_alias_definition"
            | "static_assert_declaration"
            | "expression_statement"
            | "preproc_include"
            | "preproc_def"
            | "preproc_function_def"
            | "preproc_call"
            | "comment" => false,
            _ => true,
        };

        if should_recurse {
            self.visit_children(node);
        }
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit_node(child);
        }
    }

    /// `using namespace N;`; plain using-declarations name no scope.
    fn visit_using(&mut self, node: Node) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        if !children.iter().any(|c| c.kind() == "namespace") {
            return;
        }
        let Some(target) = children.iter().find(|c| {
            matches!(
                c.kind(),
                "identifier" | "namespace_identifier" | "qualified_identifier"
            )
        }) else {
            return;
        };
        let scope = QualifiedName::from_segments(self.scope.iter().map(|s| s.name.clone()));
        self.using_directives.push(UsingDirective::new(
            scope,
            normalize_type(&self.node_text(*target)),
            line_of(node),
        ));
    }

    fn visit_namespace(&mut self, node: Node) {
        let names: Vec<String> = match node.child_by_field_name("name") {
            Some(name) => QualifiedName::parse(&normalize_type(&self.node_text(name)))
                .segments()
                .to_vec(),
            None => vec![self.anonymous_namespace.clone()],
        };

        let depth = self.scope.len();
        let line = line_of(node);
        for name in names {
            self.declarations.push(
                Declaration::new(NodeKind::Namespace, name.clone(), line)
                    .with_scope(self.scope.clone())
                    .definition(),
            );
            self.scope.push(ScopeSegment::new(name, ScopeKind::Namespace));
        }

        let saved_access = self.access.take();
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_children(body);
        }
        self.access = saved_access;
        self.scope.truncate(depth);
    }

    fn visit_record(&mut self, node: Node, kind: NodeKind) {
        // Anonymous records are only named through a typedef
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let spelled = strip_template_args(&normalize_type(&self.node_text(name)));
        self.emit_record(node, kind, &spelled);
    }

    /// Emit a class/struct record named `spelled` and visit its members.
    fn emit_record(&mut self, node: Node, kind: NodeKind, spelled: &str) {
        let mut segments = QualifiedName::parse(spelled).segments().to_vec();
        let Some(name) = segments.pop() else {
            return;
        };
        let mut scope = self.scope.clone();
        scope.extend(
            segments
                .into_iter()
                .map(|s| ScopeSegment::new(s, ScopeKind::Unknown)),
        );

        let body = node.child_by_field_name("body");
        let mut decl = Declaration::new(kind, name.clone(), line_of(node))
            .with_scope(scope.clone())
            .with_bases(self.base_specifiers(node, kind))
            .with_template_parameters(std::mem::take(&mut self.template_parameters));
        if let Some(access) = self.access {
            decl = decl.with_access(access);
        }
        if body.is_some() {
            decl = decl.definition();
        }
        self.declarations.push(decl);

        if let Some(body) = body {
            let record_kind = if kind == NodeKind::Struct {
                ScopeKind::Struct
            } else {
                ScopeKind::Class
            };
            let saved_scope = std::mem::replace(&mut self.scope, scope);
            self.scope.push(ScopeSegment::new(name, record_kind));
            let saved_access = self.access.replace(default_access(kind));
            self.visit_children(body);
            self.access = saved_access;
            self.scope = saved_scope;
        }
    }

    fn base_specifiers(&self, node: Node, kind: NodeKind) -> Vec<BaseSpecifier> {
        let mut bases = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "base_class_clause" {
                self.collect_bases(child, default_access(kind), &mut bases);
            }
        }
        bases
    }

    fn collect_bases(&self, clause: Node, default: Access, bases: &mut Vec<BaseSpecifier>) {
        let mut access = None;
        let mut is_virtual = false;

        let mut cursor = clause.walk();
        for child in clause.children(&mut cursor) {
            match child.kind() {
                "access_specifier" => access = parse_access(&self.node_text(child)),
                // tree-sitter-cpp 0.22 may wrap each base in base_class_specifier
                "base_class_specifier" => self.collect_bases(child, default, bases),
                "type_identifier" | "qualified_identifier" | "template_type" => {
                    let mut base = BaseSpecifier::new(
                        normalize_type(&self.node_text(child)),
                        access.take().unwrap_or(default),
                    );
                    base.is_virtual = std::mem::take(&mut is_virtual);
                    bases.push(base);
                }
                _ => {
                    let text = self.node_text(child);
                    if text == "virtual" {
                        is_virtual = true;
                    } else if let Some(parsed) = parse_access(&text) {
                        access = Some(parsed);
                    }
                }
            }
        }
    }

    fn visit_access_specifier(&mut self, node: Node) {
        if self.access.is_some() {
            if let Some(access) = parse_access(&self.node_text(node)) {
                self.access = Some(access);
            }
        }
    }

    fn visit_function_definition(&mut self, node: Node) {
        let Some(declarator) = node.child_by_field_name("declarator") else {
            return;
        };
        let (func, suffix) = unwrap_declarator(declarator);
        if func.kind() != "function_declarator" {
            return;
        }

        if let Some(mut decl) = self.callable(node, func, &suffix) {
            decl = decl.definition();
            if self.extract_calls {
                if let Some(body) = node.child_by_field_name("body") {
                    let mut calls = Body::new();
                    self.scan_body(body, &mut calls);
                    decl = decl.with_body(calls);
                }
            }
            self.declarations.push(decl);
        }
    }

    fn visit_declaration(&mut self, node: Node) {
        if let Some(ty) = node.child_by_field_name("type") {
            self.visit_embedded_record(ty);
        }
        self.visit_callable_declarators(node);
    }

    fn visit_field_declaration(&mut self, node: Node) {
        let type_node = node.child_by_field_name("type");
        if let Some(ty) = type_node {
            self.visit_embedded_record(ty);
        }

        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        let template = std::mem::take(&mut self.template_parameters);

        for declarator in declarators {
            let (inner, suffix) = unwrap_declarator(declarator);
            if inner.kind() == "function_declarator" && !is_function_pointer(inner) {
                self.template_parameters = template.clone();
                if let Some(decl) = self.callable(node, inner, &suffix) {
                    self.push_callable_declaration(decl);
                }
                continue;
            }

            let Some(name) = find_identifier(declarator) else {
                continue;
            };
            let field_type = match type_node {
                Some(ty) if inner.kind() == "function_declarator" => {
                    self.text_without(ty.start_byte(), declarator.end_byte(), name)
                }
                Some(ty) => format!(
                    "{} {}{}",
                    self.cv_qualifiers(node),
                    self.node_text(ty),
                    suffix
                ),
                None => String::new(),
            };

            let specifiers = Specifiers {
                is_static: self.has_storage_class(node, "static"),
                ..Specifiers::default()
            };
            let mut decl = Declaration::new(NodeKind::Field, self.node_text(name), line_of(name))
                .with_scope(self.scope.clone())
                .with_field_type(normalize_type(&field_type))
                .with_specifiers(specifiers);
            if let Some(access) = self.access {
                decl = decl.with_access(access);
            }
            self.declarations.push(decl);
        }
        self.template_parameters.clear();
    }

    /// Prototypes, in-class constructor declarations and `= default` members.
    fn visit_callable_declarators(&mut self, node: Node) {
        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        let template = std::mem::take(&mut self.template_parameters);

        for declarator in declarators {
            let (inner, suffix) = unwrap_declarator(declarator);
            if inner.kind() != "function_declarator" || is_function_pointer(inner) {
                continue;
            }
            self.template_parameters = template.clone();
            if let Some(decl) = self.callable(node, inner, &suffix) {
                self.push_callable_declaration(decl);
            }
        }
        self.template_parameters.clear();
    }

    fn push_callable_declaration(&mut self, mut decl: Declaration) {
        if decl.specifiers.is_defaulted || decl.specifiers.is_deleted {
            decl = decl.definition();
        }
        self.declarations.push(decl);
    }

    fn visit_embedded_record(&mut self, ty: Node) {
        if ty.child_by_field_name("body").is_none() {
            return;
        }
        match ty.kind() {
            "class_specifier" => self.visit_record(ty, NodeKind::Class),
            "struct_specifier" => self.visit_record(ty, NodeKind::Struct),
            _ => {}
        }
    }

    /// Build the record for a function declarator. `suffix` holds the
    /// pointer/reference markers that wrapped it, which belong to the return type.
    fn callable(&mut self, decl_node: Node, func: Node, suffix: &str) -> Option<Declaration> {
        let name_node = func.child_by_field_name("declarator")?;
        let spelled = strip_template_args(&normalize_type(&self.node_text(name_node)));
        let mut segments = QualifiedName::parse(&spelled).segments().to_vec();
        let simple = segments.pop()?;

        let mut scope = self.scope.clone();
        scope.extend(
            segments
                .into_iter()
                .map(|s| ScopeSegment::new(s, ScopeKind::Unknown)),
        );
        let kind = callable_kind(&scope, &simple);

        let (parameters, is_variadic) = self.parameters(func);
        let mut signature = Signature::new(parameters);
        if !matches!(kind, NodeKind::Constructor | NodeKind::Destructor) {
            if let Some(ret) = self.return_type(decl_node, suffix) {
                signature = signature.returning(ret);
            }
        }
        if self.is_const_method(func) {
            signature = signature.const_qualified();
        }
        if is_variadic {
            signature = signature.variadic();
        }

        let mut decl = Declaration::new(kind, simple, line_of(func))
            .with_scope(scope)
            .with_signature(signature)
            .with_specifiers(self.specifiers(decl_node, func))
            .with_template_parameters(std::mem::take(&mut self.template_parameters));
        if let Some(access) = self.access {
            decl = decl.with_access(access);
        }
        Some(decl)
    }

    fn return_type(&self, decl_node: Node, suffix: &str) -> Option<String> {
        let type_node = decl_node.child_by_field_name("type")?;
        Some(normalize_type(&format!(
            "{} {}{}",
            self.cv_qualifiers(decl_node),
            self.node_text(type_node),
            suffix
        )))
    }

    /// `const`/`volatile` written among the declaration specifiers.
    fn cv_qualifiers(&self, node: Node) -> String {
        let mut qualifiers = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "type_qualifier" {
                let text = self.node_text(child);
                if text == "const" || text == "volatile" {
                    qualifiers.push(text);
                }
            }
        }
        qualifiers.join(" ")
    }

    fn parameters(&self, func: Node) -> (Vec<Parameter>, bool) {
        let mut params = Vec::new();
        let mut is_variadic = false;

        if let Some(list) = func.child_by_field_name("parameters") {
            let mut cursor = list.walk();
            for child in list.children(&mut cursor) {
                match child.kind() {
                    "parameter_declaration" | "optional_parameter_declaration" => {
                        params.push(self.parameter(child));
                    }
                    "variadic_parameter_declaration" | "..." => is_variadic = true,
                    _ => {}
                }
            }
        }

        // `f(void)` takes no parameters
        if params.len() == 1 && params[0].name.is_none() && params[0].type_spelling == "void" {
            params.clear();
        }
        (params, is_variadic)
    }

    fn parameter(&self, node: Node) -> Parameter {
        let has_default = node.kind() == "optional_parameter_declaration";
        let end = if has_default {
            let mut cursor = node.walk();
            let eq = node.children(&mut cursor).find(|c| c.kind() == "=");
            eq.map(|c| c.start_byte())
                .or_else(|| node.child_by_field_name("default_value").map(|v| v.start_byte()))
                .unwrap_or_else(|| node.end_byte())
        } else {
            node.end_byte()
        };

        let ident = node
            .child_by_field_name("declarator")
            .and_then(find_identifier);
        let spelling = match ident {
            Some(id) => self.text_without(node.start_byte(), end, id),
            None => String::from_utf8_lossy(&self.source[node.start_byte()..end]).into_owned(),
        };

        let mut param = Parameter::new(normalize_parameter_type(&spelling));
        if let Some(id) = ident {
            param = param.named(self.node_text(id));
        }
        if has_default {
            param = param.with_default();
        }
        param
    }

    fn specifiers(&self, decl_node: Node, func: Node) -> Specifiers {
        let mut specs = Specifiers::default();

        let mut after_eq = false;
        let mut cursor = decl_node.walk();
        for child in decl_node.children(&mut cursor) {
            match child.kind() {
                "virtual" | "virtual_function_specifier" | "function_specifier" => {
                    if self.node_text(child) == "virtual" {
                        specs.is_virtual = true;
                    }
                }
                "storage_class_specifier" => {
                    if self.node_text(child) == "static" {
                        specs.is_static = true;
                    }
                }
                "default_method_clause" => specs.is_defaulted = true,
                "delete_method_clause" => specs.is_deleted = true,
                "pure_virtual_clause" => specs.is_pure = true,
                "number_literal" if after_eq && self.node_text(child) == "0" => {
                    specs.is_pure = true;
                }
                _ => {}
            }
            after_eq = child.kind() == "=";
        }

        let mut cursor = func.walk();
        for child in func.children(&mut cursor) {
            if child.kind() == "virtual_specifier" {
                match self.node_text(child).as_str() {
                    "override" => specs.is_override = true,
                    "final" => {
                        specs.is_override = true;
                        specs.is_final = true;
                    }
                    _ => {}
                }
            }
        }

        if specs.is_pure {
            specs.is_virtual = true;
        }
        specs
    }

    fn has_storage_class(&self, node: Node, storage_class: &str) -> bool {
        let mut cursor = node.walk();
        let found = node.children(&mut cursor).any(|child| {
            child.kind() == "storage_class_specifier" && self.node_text(child) == storage_class
        });
        found
    }

    fn is_const_method(&self, declarator: Node) -> bool {
        let mut cursor = declarator.walk();
        let found = declarator.children(&mut cursor).any(|child| {
            child.kind() == "type_qualifier" && self.node_text(child) == "const"
        });
        found
    }

    fn visit_template(&mut self, node: Node) {
        let params = node
            .child_by_field_name("parameters")
            .map(|list| self.template_parameter_names(list))
            .unwrap_or_default();
        let saved = std::mem::replace(&mut self.template_parameters, params);

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if matches!(child.kind(), "template_parameter_list" | "requires_clause") {
                continue;
            }
            self.visit_node(child);
        }
        self.template_parameters = saved;
    }

    fn template_parameter_names(&self, list: Node) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            if let Some(name) = template_parameter_name(param) {
                names.push(self.node_text(name));
            }
        }
        names
    }

    fn visit_alias(&mut self, node: Node) {
        let (Some(name), Some(ty)) = (
            node.child_by_field_name("name"),
            node.child_by_field_name("type"),
        ) else {
            return;
        };

        let mut decl = Declaration::new(NodeKind::TypeAlias, self.node_text(name), line_of(node))
            .with_scope(self.scope.clone())
            .with_underlying_type(normalize_type(&self.node_text(ty)))
            .with_template_parameters(std::mem::take(&mut self.template_parameters))
            .definition();
        if let Some(access) = self.access {
            decl = decl.with_access(access);
        }
        self.declarations.push(decl);
    }

    fn visit_typedef(&mut self, node: Node) {
        let Some(ty) = node.child_by_field_name("type") else {
            return;
        };
        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();

        let mut target = normalize_type(&self.node_text(ty));
        let mut record_name = None;
        if let Some(kind) = record_kind(ty) {
            match ty.child_by_field_name("name") {
                Some(name) => {
                    let spelled = strip_template_args(&normalize_type(&self.node_text(name)));
                    if ty.child_by_field_name("body").is_some() {
                        self.emit_record(ty, kind, &spelled);
                    }
                    target = spelled;
                }
                None => {
                    // typedef struct { ... } Name;
                    let Some(name) = declarators.iter().find_map(|d| {
                        let (inner, suffix) = unwrap_declarator(*d);
                        (suffix.is_empty() && inner.kind() == "type_identifier").then_some(inner)
                    }) else {
                        return;
                    };
                    target = self.node_text(name);
                    self.emit_record(ty, kind, &target);
                }
            }
            record_name = Some(QualifiedName::parse(&target).simple().to_string());
        }

        let qualifiers = self.cv_qualifiers(node);
        for declarator in declarators {
            let (inner, suffix) = unwrap_declarator(declarator);
            let (name, underlying) = if inner.kind() == "type_identifier" {
                (inner, format!("{qualifiers} {target}{suffix}"))
            } else if let Some(name) = find_type_identifier(declarator) {
                // Function pointer and other declarator shapes keep their spelling
                (
                    name,
                    self.text_without(ty.start_byte(), declarator.end_byte(), name),
                )
            } else {
                continue;
            };

            let alias = self.node_text(name);
            // `typedef struct Foo Foo;` names the record itself
            if suffix.is_empty() && record_name.as_deref() == Some(alias.as_str()) {
                continue;
            }

            let mut decl = Declaration::new(NodeKind::TypeAlias, alias, line_of(declarator))
                .with_scope(self.scope.clone())
                .with_underlying_type(normalize_type(&underlying))
                .definition();
            if let Some(access) = self.access {
                decl = decl.with_access(access);
            }
            self.declarations.push(decl);
        }
    }

    fn scan_body(&self, node: Node, body: &mut Body) {
        match node.kind() {
            "call_expression" => self.record_call(node, body),
            "new_expression" => self.record_new(node, body),
            "declaration" => self.record_local(node, body),
            "for_range_loop" => self.record_range_binding(node, body),
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.scan_body(child, body);
        }
    }

    fn record_call(&self, node: Node, body: &mut Body) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let arg_count = node
            .child_by_field_name("arguments")
            .map(argument_count)
            .unwrap_or(0);
        let line = line_of(node);

        let call = match function.kind() {
            "identifier" | "qualified_identifier" | "template_function" => {
                CallSite::plain(normalize_type(&self.node_text(function)), arg_count, line)
            }
            "field_expression" => {
                let Some(field) = function.child_by_field_name("field") else {
                    return;
                };
                let receiver = match function.child_by_field_name("argument") {
                    Some(arg) if arg.kind() == "this" => Receiver::This,
                    Some(arg) if arg.kind() == "identifier" => {
                        Receiver::Variable(self.node_text(arg))
                    }
                    _ => Receiver::Expression,
                };
                CallSite::member(
                    receiver,
                    strip_template_args(&normalize_type(&self.node_text(field))),
                    arg_count,
                    line,
                )
            }
            _ => return,
        };
        body.add_call(call);
    }

    fn record_new(&self, node: Node, body: &mut Body) {
        let Some(ty) = node.child_by_field_name("type") else {
            return;
        };
        let arg_count = node
            .child_by_field_name("arguments")
            .map(argument_count)
            .unwrap_or(0);
        body.add_call(CallSite::construct(
            normalize_type(&self.node_text(ty)),
            arg_count,
            line_of(node),
        ));
    }

    fn record_local(&self, node: Node, body: &mut Body) {
        let Some(ty) = node.child_by_field_name("type") else {
            return;
        };
        let base = normalize_type(&format!(
            "{} {}",
            self.cv_qualifiers(node),
            self.node_text(ty)
        ));
        let constructible = base_type_name(&base).is_some();

        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        for declarator in declarators {
            let (inner, suffix) = unwrap_declarator(declarator);
            if inner.kind() != "identifier" {
                continue;
            }
            body.add_local(LocalBinding::new(
                self.node_text(inner),
                normalize_type(&format!("{base}{suffix}")),
                line_of(inner),
            ));

            if !suffix.is_empty() || !constructible {
                continue;
            }
            // `T x(args);`, `T x{args};` and `T x;` construct a T
            if declarator.kind() == "identifier" {
                body.add_call(CallSite::construct(base.clone(), 0, line_of(declarator)));
            } else if let Some(value) = declarator.child_by_field_name("value") {
                if matches!(value.kind(), "argument_list" | "initializer_list") {
                    body.add_call(CallSite::construct(
                        base.clone(),
                        argument_count(value),
                        line_of(declarator),
                    ));
                }
            }
        }
    }

    fn record_range_binding(&self, node: Node, body: &mut Body) {
        let (Some(ty), Some(declarator)) = (
            node.child_by_field_name("type"),
            node.child_by_field_name("declarator"),
        ) else {
            return;
        };
        let (inner, suffix) = unwrap_declarator(declarator);
        if inner.kind() == "identifier" {
            body.add_local(LocalBinding::new(
                self.node_text(inner),
                normalize_type(&format!(
                    "{} {}{}",
                    self.cv_qualifiers(node),
                    self.node_text(ty),
                    suffix
                )),
                line_of(inner),
            ));
        }
    }
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

fn default_access(kind: NodeKind) -> Access {
    if kind == NodeKind::Struct {
        Access::Public
    } else {
        Access::Private
    }
}

fn parse_access(text: &str) -> Option<Access> {
    match text.trim().trim_end_matches(':').trim() {
        "public" => Some(Access::Public),
        "protected" => Some(Access::Protected),
        "private" => Some(Access::Private),
        _ => None,
    }
}

fn record_kind(node: Node) -> Option<NodeKind> {
    match node.kind() {
        "class_specifier" => Some(NodeKind::Class),
        "struct_specifier" => Some(NodeKind::Struct),
        _ => None,
    }
}

fn callable_kind(scope: &[ScopeSegment], simple: &str) -> NodeKind {
    let Some(parent) = scope.last() else {
        return NodeKind::Function;
    };
    if simple.starts_with('~') {
        NodeKind::Destructor
    } else if parent.kind != ScopeKind::Namespace && strip_template_args(&parent.name) == simple {
        NodeKind::Constructor
    } else if parent.kind.is_record() {
        NodeKind::Method
    } else {
        NodeKind::Function
    }
}

/// Walk a declarator chain down to the declared entity, collecting the
/// pointer, reference and array markers on the way.
fn unwrap_declarator(node: Node) -> (Node, String) {
    let mut node = node;
    let mut suffix = String::new();
    loop {
        match node.kind() {
            "pointer_declarator" | "abstract_pointer_declarator" => suffix.push('*'),
            "reference_declarator" | "abstract_reference_declarator" => {
                let marker = node.child(0).map(|c| c.kind()).unwrap_or("&");
                suffix.push_str(if marker == "&&" { "&&" } else { "&" });
            }
            "array_declarator" | "abstract_array_declarator" => suffix.push_str("[]"),
            "init_declarator" | "parenthesized_declarator" | "attributed_declarator" => {}
            _ => return (node, suffix),
        }
        match inner_declarator(node) {
            Some(inner) => node = inner,
            None => return (node, suffix),
        }
    }
}

fn inner_declarator(node: Node) -> Option<Node> {
    node.child_by_field_name("declarator").or_else(|| {
        let count = node.named_child_count();
        (0..count)
            .rev()
            .filter_map(|i| node.named_child(i))
            .find(|c| c.kind() != "type_qualifier")
    })
}

/// `void (*callback)(int)` declares a variable, not a function.
fn is_function_pointer(func: Node) -> bool {
    func.child_by_field_name("declarator")
        .map_or(false, |d| d.kind() == "parenthesized_declarator")
}

/// The identifier a (possibly nested) declarator declares.
fn find_identifier(node: Node) -> Option<Node> {
    find_named(node, &["identifier", "field_identifier"])
}

fn find_type_identifier(node: Node) -> Option<Node> {
    find_named(node, &["type_identifier"])
}

fn find_named<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    if kinds.contains(&node.kind()) {
        return Some(node);
    }
    if matches!(
        node.kind(),
        "parameter_list" | "argument_list" | "initializer_list" | "template_argument_list"
    ) {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(|child| {
        if node.kind() == "init_declarator"
            && node.child_by_field_name("value").map(|v| v.id()) == Some(child.id())
        {
            return None;
        }
        find_named(child, kinds)
    })
}

fn template_parameter_name(param: Node) -> Option<Node> {
    if let Some(name) = param
        .child_by_field_name("name")
        .or_else(|| param.child_by_field_name("declarator"))
    {
        return find_named(name, &["identifier", "type_identifier"]);
    }
    let mut cursor = param.walk();
    let children: Vec<Node> = param.named_children(&mut cursor).collect();
    if let Some(name) = children
        .iter()
        .find(|c| matches!(c.kind(), "type_identifier" | "identifier"))
    {
        return Some(*name);
    }
    // template <template <typename> class C>
    children
        .last()
        .filter(|c| c.kind().ends_with("parameter_declaration"))
        .and_then(|c| template_parameter_name(*c))
}

fn argument_count(arguments: Node) -> usize {
    let mut cursor = arguments.walk();
    let count = arguments
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .count();
    count
}
