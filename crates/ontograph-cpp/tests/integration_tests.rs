//! Integration tests for the C++ front-end and graph assembly

use ontograph::{attrs, Direction, EdgeKind, Node, NodeKey, NodeKind, Ontology, QualifiedName};
use ontograph_cpp::{BuildOutput, OntologyBuilder, ReferenceKind};
use std::path::PathBuf;

const CUSTOM_TYPES_H: &str = include_str!("fixtures/sep_test/CustomTypes.h");
const ENTITIES_H: &str = include_str!("fixtures/sep_test/Entities.h");
const ENTITIES_CPP: &str = include_str!("fixtures/sep_test/Entities.cpp");
const ACTIONS_H: &str = include_str!("fixtures/sep_test/Actions.h");
const ACTIONS_CPP: &str = include_str!("fixtures/sep_test/Actions.cpp");
const FUNCTIONS_CPP: &str = include_str!("fixtures/functions.cpp");
const NAMESPACES_CPP: &str = include_str!("fixtures/namespaces.cpp");
const STRUCTS_CPP: &str = include_str!("fixtures/structs.cpp");
const ALIASES_CPP: &str = include_str!("fixtures/aliases.cpp");
const USING_P_H: &str = include_str!("fixtures/using_namespace/P.h");
const USING_P_CPP: &str = include_str!("fixtures/using_namespace/P.cpp");

fn build(sources: &[(&str, &str)]) -> BuildOutput {
    let sources: Vec<(PathBuf, String)> = sources
        .iter()
        .map(|(path, text)| (PathBuf::from(path), text.to_string()))
        .collect();
    let output = OntologyBuilder::new().build_sources(&sources).unwrap();
    assert!(
        output.summary.skipped.is_empty(),
        "Units failed to parse: {:?}",
        output.summary.skipped
    );
    output
}

fn sep_test() -> BuildOutput {
    build(&[
        ("sep_test/CustomTypes.h", CUSTOM_TYPES_H),
        ("sep_test/Entities.h", ENTITIES_H),
        ("sep_test/Entities.cpp", ENTITIES_CPP),
        ("sep_test/Actions.h", ACTIONS_H),
        ("sep_test/Actions.cpp", ACTIONS_CPP),
    ])
}

fn named<'a>(graph: &'a Ontology, name: &str, kind: NodeKind) -> &'a Node {
    graph
        .find_by_qualified_name(&QualifiedName::parse(name))
        .into_iter()
        .filter_map(|id| graph.node(id).ok())
        .find(|n| n.kind == kind)
        .unwrap_or_else(|| panic!("No {kind} named {name}"))
}

fn external<'a>(graph: &'a Ontology, spelling: &str) -> &'a Node {
    let id = graph
        .node_by_key(&NodeKey::external(spelling))
        .unwrap_or_else(|| panic!("No external placeholder {spelling}"));
    graph.node(id).unwrap()
}

fn linked(graph: &Ontology, from: &Node, to: &Node, kind: EdgeKind) -> bool {
    graph.edge_between(from.id, to.id, kind).is_some()
}

#[test]
fn test_override_across_inheritance() {
    let output = build(&[(
        "n.h",
        r#"
namespace N {
    class C {
    public:
        virtual void m(int x);
    };
    class D : public C {
    public:
        void m(int x) override;
    };
}
"#,
    )]);
    let graph = &output.ontology;

    let n = named(graph, "N", NodeKind::Namespace);
    let c = named(graph, "N::C", NodeKind::Class);
    let d = named(graph, "N::D", NodeKind::Class);
    let cm = named(graph, "N::C::m", NodeKind::Method);
    let dm = named(graph, "N::D::m", NodeKind::Method);

    assert_eq!(graph.node_count(), 6);
    assert!(linked(graph, n, c, EdgeKind::Contains));
    assert!(linked(graph, n, d, EdgeKind::Contains));
    assert!(linked(graph, d, c, EdgeKind::Inherits));
    assert!(linked(graph, dm, cm, EdgeKind::Overrides));
    assert_eq!(graph.edges_of_kind(EdgeKind::Overrides).len(), 1);
    assert!(graph.edges_of_kind(EdgeKind::Overloads).is_empty());

    let inherits = graph.edge_between(d.id, c.id, EdgeKind::Inherits).unwrap();
    assert_eq!(
        inherits.attributes.get_string(attrs::INHERITANCE_ACCESS),
        Some("public")
    );
}

#[test]
fn test_overloads_are_symmetric() {
    let output = build(&[("f.cpp", "void f(int a);\nvoid f(int a, double b);\n")]);
    let graph = &output.ontology;

    let functions = graph.nodes_of_kind(NodeKind::Function);
    assert_eq!(functions.len(), 2);
    let (a, b) = (functions[0], functions[1]);
    assert!(linked(graph, a, b, EdgeKind::Overloads));
    assert!(linked(graph, b, a, EdgeKind::Overloads));
    assert!(graph.edges_of_kind(EdgeKind::Overrides).is_empty());
    assert_eq!(
        graph.neighbors(a.id, EdgeKind::Overloads, Direction::Both).unwrap(),
        vec![b.id]
    );
}

#[test]
fn test_constructors_form_an_overload_set() {
    let output = build(&[(
        "point.h",
        "class Point {\npublic:\n    Point();\n    Point(int x, int y);\n    ~Point();\n};\n",
    )]);
    let graph = &output.ontology;

    let ctors = graph.nodes_of_kind(NodeKind::Constructor);
    assert_eq!(ctors.len(), 2);
    assert!(linked(graph, ctors[0], ctors[1], EdgeKind::Overloads));
    assert!(linked(graph, ctors[1], ctors[0], EdgeKind::Overloads));

    let dtor = named(graph, "Point::~Point", NodeKind::Destructor);
    assert!(graph.outgoing(dtor.id, Some(EdgeKind::Overloads)).is_empty());
    assert_eq!(graph.edges_of_kind(EdgeKind::Overloads).len(), 2);
}

#[test]
fn test_call_to_function_in_same_namespace() {
    let output = sep_test();
    let graph = &output.ontology;

    let caller = named(graph, "Actions::initializeAndDisplayPersonInfo", NodeKind::Function);
    let callee = named(graph, "Actions::displayPersonInfo", NodeKind::Function);
    assert!(linked(graph, caller, callee, EdgeKind::Calls));

    let calls = graph.edge_between(caller.id, callee.id, EdgeKind::Calls).unwrap();
    assert_eq!(calls.attributes.get_int_list(attrs::CALL_LINES), Some(&[21i64][..]));
}

#[test]
fn test_anonymous_namespace_is_private_to_its_unit() {
    let source = |runner: &str| {
        format!("namespace {{\n    void helper() {{}}\n}}\n\nvoid {runner}() {{\n    helper();\n}}\n")
    };
    let (a, b) = (source("runA"), source("runB"));
    let output = build(&[("a.cpp", a.as_str()), ("b.cpp", b.as_str())]);
    let graph = &output.ontology;

    let callees = |caller: &str| -> Vec<String> {
        let caller = named(graph, caller, NodeKind::Function);
        graph
            .outgoing(caller.id, Some(EdgeKind::Calls))
            .into_iter()
            .map(|e| graph.node(e.target).unwrap().qualified_name().to_string())
            .collect()
    };
    assert_eq!(callees("runA"), vec!["(anonymous a.cpp)::helper"]);
    assert_eq!(callees("runB"), vec!["(anonymous b.cpp)::helper"]);
    assert!(output.summary.unresolved.is_empty());
}

#[test]
fn test_using_directive_joins_out_of_line_definition() {
    let output = build(&[
        ("using_namespace/P.h", USING_P_H),
        ("using_namespace/P.cpp", USING_P_CPP),
    ]);
    let graph = &output.ontology;

    let people: Vec<&Node> = graph
        .nodes()
        .filter(|n| n.key.family == ontograph::KindFamily::Scope && n.name() == "Person")
        .collect();
    assert_eq!(people.len(), 1);
    assert!(graph.find_by_qualified_name(&QualifiedName::parse("Person")).is_empty());

    let person = named(graph, "E::Person", NodeKind::Class);
    let get_age = named(graph, "E::Person::getAge", NodeKind::Method);
    assert!(linked(graph, person, get_age, EdgeKind::Contains));
    assert!(get_age.flag(attrs::IS_DEFINITION));
    assert_eq!(
        get_age.attributes.get_string(attrs::DEFINED_IN),
        Some("using_namespace/P.cpp")
    );

    let clamp = named(graph, "E::clampAge", NodeKind::Function);
    let describe = named(graph, "describe", NodeKind::Function);
    assert!(linked(graph, get_age, clamp, EdgeKind::Calls));
    assert!(linked(graph, describe, get_age, EdgeKind::Calls));
    assert!(linked(graph, describe, person, EdgeKind::UsesType));
    assert!(output.summary.unresolved.is_empty());
    assert!(graph.check_invariants().is_ok());
}

#[test]
fn test_forward_declaration_merges_with_definition() {
    let output = build(&[
        ("a.cpp", "class Person;\nvoid greet(Person* p);\n"),
        (
            "Person.h",
            "class Person {\npublic:\n    const char* getName() const;\n    int age;\n};\n",
        ),
    ]);
    let graph = &output.ontology;

    let ids = graph.find_by_qualified_name(&QualifiedName::parse("Person"));
    assert_eq!(ids.len(), 1);
    let person = graph.node(ids[0]).unwrap();
    assert_eq!(person.kind, NodeKind::Class);
    assert!(person.flag(attrs::IS_DEFINITION));
    assert_eq!(person.attributes.get_string(attrs::SOURCE_FILE), Some("Person.h"));
    assert_eq!(
        person.attributes.get_string_list(attrs::METHODS),
        Some(&["getName".to_string()][..])
    );
    assert_eq!(
        person.attributes.get_string_list(attrs::DECLARED_IN),
        Some(&["Person.h".to_string(), "a.cpp".to_string()][..])
    );

    let greet = named(graph, "greet", NodeKind::Function);
    assert!(linked(graph, greet, person, EdgeKind::UsesType));
}

#[test]
fn test_unresolved_call_targets_external() {
    let output = build(&[("run.cpp", "void run() {\n    launchMissiles(3);\n}\n")]);
    let graph = &output.ontology;

    let run = named(graph, "run", NodeKind::Function);
    let missing = external(graph, "launchMissiles");
    assert!(linked(graph, run, missing, EdgeKind::Calls));
    assert_eq!(graph.contains_parent(missing.id), None);

    let unresolved: Vec<_> = output.summary.unresolved_of(ReferenceKind::Call).collect();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].spelling, "launchMissiles");
    assert_eq!(unresolved[0].unit, PathBuf::from("run.cpp"));
}

#[test]
fn test_sep_test_declarations_merge() {
    let output = sep_test();
    let graph = &output.ontology;
    assert!(output.summary.is_clean());
    assert_eq!(output.summary.units_merged.len(), 5);

    let person = named(graph, "Entities::Person", NodeKind::Class);
    // Entities.cpp only names Person as a qualifier
    assert!(!person.flag(attrs::IMPLIED));
    assert_eq!(
        person.attributes.get_string_list(attrs::DECLARED_IN),
        Some(&["sep_test/Entities.h".to_string()][..])
    );

    let get_name = named(graph, "Entities::Person::getName", NodeKind::Method);
    assert!(get_name.flag(attrs::CONST_QUALIFIED));
    assert_eq!(
        get_name.attributes.get_string(attrs::DEFINED_IN),
        Some("sep_test/Entities.cpp")
    );
    assert_eq!(get_name.attributes.get_string(attrs::ACCESS), Some("public"));
    assert_eq!(graph.contains_parent(get_name.id), Some(person.id));

    let actions = graph
        .query()
        .kind(NodeKind::Function)
        .within("Actions")
        .count();
    assert_eq!(actions, 4);

    let ctor = named(graph, "Entities::Person::Person", NodeKind::Constructor);
    assert_eq!(
        ctor.attributes.get_string_list(attrs::PARAMETER_TYPES),
        Some(
            &[
                "const CustomTypes::StringType&".to_string(),
                "CustomTypes::IntegerType".to_string()
            ][..]
        )
    );
}

#[test]
fn test_sep_test_member_and_constructor_calls() {
    let output = sep_test();
    let graph = &output.ontology;

    let display = named(graph, "Actions::displayPersonInfo", NodeKind::Function);
    let get_name = named(graph, "Entities::Person::getName", NodeKind::Method);
    let get_age = named(graph, "Entities::Person::getAge", NodeKind::Method);
    assert!(linked(graph, display, get_name, EdgeKind::Calls));
    assert!(linked(graph, display, get_age, EdgeKind::Calls));

    let init = named(graph, "Actions::initializeAndDisplayPersonInfo", NodeKind::Function);
    let ctor = named(graph, "Entities::Person::Person", NodeKind::Constructor);
    let person_set_from = graph
        .find_by_qualified_name(&QualifiedName::parse("Entities::Person::setFrom"))[0];
    assert!(linked(graph, init, ctor, EdgeKind::Calls));
    assert!(graph
        .edge_between(init.id, person_set_from, EdgeKind::Calls)
        .is_some());

    let add_employee = named(graph, "Entities::Company::addEmployee", NodeKind::Method);
    let push_back = external(graph, "std::vector::push_back");
    assert!(linked(graph, add_employee, push_back, EdgeKind::Calls));
    assert!(output
        .summary
        .unresolved_of(ReferenceKind::Call)
        .any(|r| r.spelling == "std::vector::push_back"));
}

#[test]
fn test_sep_test_fields_and_type_usage() {
    let output = sep_test();
    let graph = &output.ontology;

    let company = named(graph, "Entities::Company", NodeKind::Class);
    let person = named(graph, "Entities::Person", NodeKind::Class);
    let vector = external(graph, "std::vector");
    assert!(linked(graph, company, vector, EdgeKind::HasField));
    assert!(linked(graph, company, person, EdgeKind::HasField));

    let has_person = graph
        .edge_between(company.id, person.id, EdgeKind::HasField)
        .unwrap();
    assert_eq!(
        has_person.attributes.get_string_list(attrs::VIA_FIELDS),
        Some(&["employees".to_string()][..])
    );

    let string_type = named(graph, "CustomTypes::StringType", NodeKind::TypeAlias);
    assert!(linked(graph, person, string_type, EdgeKind::HasField));
    assert!(linked(graph, string_type, external(graph, "std::string"), EdgeKind::UsesType));

    let show_employee = named(graph, "Actions::displayEmployeeInfo", NodeKind::Function);
    let size_type = named(graph, "CustomTypes::SizeType", NodeKind::TypeAlias);
    let uses = graph
        .edge_between(show_employee.id, size_type.id, EdgeKind::UsesType)
        .unwrap();
    assert_eq!(
        uses.attributes.get_string_list(attrs::ROLES),
        Some(&["parameter".to_string()][..])
    );
}

#[test]
fn test_constructor_call_from_local_declaration() {
    let output = build(&[("functions.cpp", FUNCTIONS_CPP)]);
    let graph = &output.ontology;

    let main = named(graph, "main", NodeKind::Function);
    let free = named(graph, "freeFunction", NodeKind::Function);
    let ctor = named(graph, "MyFunctionClass::MyFunctionClass", NodeKind::Constructor);
    let member = named(graph, "MyFunctionClass::memberFunction", NodeKind::Method);

    assert!(linked(graph, main, free, EdgeKind::Calls));
    assert!(linked(graph, main, ctor, EdgeKind::Calls));
    assert!(linked(graph, main, member, EdgeKind::Calls));
}

#[test]
fn test_nested_namespaces_and_qualified_calls() {
    let output = build(&[("namespaces.cpp", NAMESPACES_CPP)]);
    let graph = &output.ontology;

    let outer = named(graph, "OuterNS", NodeKind::Namespace);
    let inner = named(graph, "OuterNS::InnerNS", NodeKind::Namespace);
    let class = named(graph, "OuterNS::InnerNS::InnerClass", NodeKind::Class);
    assert!(linked(graph, outer, inner, EdgeKind::Contains));
    assert!(linked(graph, inner, class, EdgeKind::Contains));

    let main = named(graph, "main", NodeKind::Function);
    for callee in [
        named(graph, "OuterNS::outerFunction", NodeKind::Function),
        named(graph, "OuterNS::InnerNS::innerFunction", NodeKind::Function),
        named(graph, "OuterNS::InnerNS::InnerClass::display", NodeKind::Method),
    ] {
        assert!(linked(graph, main, callee, EdgeKind::Calls), "main should call {callee}");
    }
}

#[test]
fn test_nested_structs_and_fields() {
    let output = build(&[("structs.cpp", STRUCTS_CPP)]);
    let graph = &output.ontology;

    let outer = named(graph, "OuterStruct", NodeKind::Struct);
    let inner = named(graph, "OuterStruct::InnerStruct", NodeKind::Struct);
    assert!(linked(graph, outer, inner, EdgeKind::Contains));

    let fields = graph
        .query()
        .kind(NodeKind::Field)
        .within("MyStruct")
        .execute();
    assert_eq!(fields.len(), 2);
    let a = named(graph, "MyStruct::a", NodeKind::Field);
    assert_eq!(a.attributes.get_string(attrs::FIELD_TYPE), Some("int"));
    assert_eq!(a.attributes.get_string(attrs::ACCESS), Some("public"));
    // Builtin field types produce no edges
    assert!(graph.outgoing(a.id, Some(EdgeKind::UsesType)).is_empty());
}

#[test]
fn test_aliases_resolve_transitively() {
    let output = build(&[("aliases.cpp", ALIASES_CPP)]);
    let graph = &output.ontology;

    let string_vector = named(graph, "AliasNS::StringVector", NodeKind::TypeAlias);
    assert_eq!(
        string_vector.attributes.get_string(attrs::UNDERLYING_TYPE),
        Some("std::vector<std::string>")
    );
    let vector = external(graph, "std::vector");
    let alias_edge = graph
        .edge_between(string_vector.id, vector.id, EdgeKind::UsesType)
        .unwrap();
    assert_eq!(
        alias_edge.attributes.get_string_list(attrs::ROLES),
        Some(&["alias".to_string()][..])
    );

    let custom_int = named(graph, "CustomInt", NodeKind::TypeAlias);
    assert!(linked(graph, custom_int, external(graph, "int"), EdgeKind::UsesType));
    assert!(graph
        .find_by_qualified_name(&QualifiedName::parse("CustomDouble"))
        .iter()
        .any(|&id| graph.node(id).unwrap().kind == NodeKind::TypeAlias));

    let main = named(graph, "main", NodeKind::Function);
    assert!(linked(graph, main, vector, EdgeKind::Calls));
    assert!(linked(graph, main, external(graph, "std::vector::push_back"), EdgeKind::Calls));
    assert!(linked(graph, main, custom_int, EdgeKind::UsesType));
}

#[test]
fn test_summary_and_nodes_serialize() {
    let output = build(&[("run.cpp", "void run() {\n    launchMissiles(3);\n}\n")]);

    let json = serde_json::to_string(&output.summary).unwrap();
    let summary: ontograph_cpp::BuildSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(summary.unresolved, output.summary.unresolved);
    assert_eq!(summary.units_merged, vec![PathBuf::from("run.cpp")]);

    let run = named(&output.ontology, "run", NodeKind::Function);
    let value = serde_json::to_value(run).unwrap();
    assert_eq!(value["kind"], "Function");
}
