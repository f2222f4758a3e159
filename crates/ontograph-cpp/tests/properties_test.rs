//! Whole-graph properties that must hold for any input set

use ontograph::{attrs, EdgeKind, NodeKey, NodeKind, Ontology, PropertyMap};
use ontograph_cpp::{CppFrontend, Frontend, GraphAssembler, OntologyBuilder, TranslationUnit};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const SEP_TEST: [(&str, &str); 5] = [
    ("CustomTypes.h", include_str!("fixtures/sep_test/CustomTypes.h")),
    ("Entities.h", include_str!("fixtures/sep_test/Entities.h")),
    ("Entities.cpp", include_str!("fixtures/sep_test/Entities.cpp")),
    ("Actions.h", include_str!("fixtures/sep_test/Actions.h")),
    ("Actions.cpp", include_str!("fixtures/sep_test/Actions.cpp")),
];

const OVERLOADS: &str = r#"
namespace shapes {
    struct Canvas {
        void draw(int x);
        void draw(int x, int y);
        void draw(const char* label) const;
    };
    double area(double r);
    double area(double w, double h);
}
"#;

type Snapshot = (
    BTreeMap<NodeKey, (NodeKind, PropertyMap)>,
    BTreeSet<(NodeKey, NodeKey, EdgeKind)>,
);

fn snapshot(graph: &Ontology) -> Snapshot {
    let nodes = graph
        .nodes()
        .map(|n| (n.key.clone(), (n.kind, n.attributes.clone())))
        .collect();
    let edges = graph
        .edges()
        .map(|e| {
            let source = graph.node(e.source).unwrap().key.clone();
            let target = graph.node(e.target).unwrap().key.clone();
            (source, target, e.kind)
        })
        .collect();
    (nodes, edges)
}

fn parse(path: &str, source: &str) -> TranslationUnit {
    CppFrontend::new()
        .parse_source(source, Path::new(path))
        .unwrap()
}

fn assemble(units: &[&TranslationUnit]) -> Ontology {
    let mut assembler = GraphAssembler::new();
    for unit in units {
        assembler.merge_unit(unit).unwrap();
    }
    assembler.finish().unwrap().0
}

fn sep_test_sources() -> Vec<(PathBuf, String)> {
    SEP_TEST
        .iter()
        .map(|(name, text)| (PathBuf::from(name), text.to_string()))
        .collect()
}

#[test]
fn test_merging_a_unit_twice_changes_nothing() {
    let header = parse("Entities.h", SEP_TEST[1].1);
    let source = parse("Entities.cpp", SEP_TEST[2].1);

    let once = assemble(&[&header, &source]);
    let twice = assemble(&[&header, &source, &source, &header]);

    assert_eq!(snapshot(&once), snapshot(&twice));
}

#[test]
fn test_merge_order_does_not_matter() {
    let header = parse("Entities.h", SEP_TEST[1].1);
    let source = parse("Entities.cpp", SEP_TEST[2].1);

    let forward = assemble(&[&header, &source]);
    let backward = assemble(&[&source, &header]);

    assert_eq!(snapshot(&forward), snapshot(&backward));
    let person = forward
        .node_by_key(&NodeKey::scope(ontograph::QualifiedName::parse("Entities::Person")))
        .unwrap();
    assert_eq!(forward.node(person).unwrap().kind, NodeKind::Class);
}

#[test]
fn test_containment_forms_a_forest() {
    let mut sources = sep_test_sources();
    sources.push((PathBuf::from("overloads.h"), OVERLOADS.to_string()));
    let output = OntologyBuilder::new().build_sources(&sources).unwrap();
    let graph = &output.ontology;

    graph.check_invariants().unwrap();
    for node in graph.nodes() {
        let parent = graph.contains_parent(node.id);
        if node.id == graph.root() || node.kind == NodeKind::External {
            assert_eq!(parent, None, "{node} should have no container");
        } else {
            let parent = parent.unwrap_or_else(|| panic!("{node} has no container"));
            let scope = graph.node(parent).unwrap();
            assert_eq!(
                node.qualified_name().parent().as_ref(),
                Some(scope.qualified_name()),
                "{node} is contained by {scope}"
            );
        }
    }
}

#[test]
fn test_overloads_are_complete_and_symmetric() {
    let output = OntologyBuilder::new()
        .build_sources(&[(PathBuf::from("overloads.h"), OVERLOADS.to_string())])
        .unwrap();
    let graph = &output.ontology;

    let mut groups: BTreeMap<String, Vec<&ontograph::Node>> = BTreeMap::new();
    for node in graph.nodes().filter(|n| n.kind.is_overloadable()) {
        groups
            .entry(node.qualified_name().to_string())
            .or_default()
            .push(node);
    }
    assert_eq!(groups["shapes::Canvas::draw"].len(), 3);
    assert_eq!(groups["shapes::area"].len(), 2);

    for members in groups.values() {
        for a in members {
            for b in members {
                let linked = graph.edge_between(a.id, b.id, EdgeKind::Overloads).is_some();
                assert_eq!(linked, a.id != b.id, "{a} / {b}");
            }
        }
    }
    assert_eq!(graph.edges_of_kind(EdgeKind::Overloads).len(), 3 * 2 + 2);
}

#[test]
fn test_aliases_end_in_a_concrete_type() {
    let output = OntologyBuilder::new()
        .build_sources(&sep_test_sources())
        .unwrap();
    let graph = &output.ontology;

    let aliases = graph.nodes_of_kind(NodeKind::TypeAlias);
    assert_eq!(aliases.len(), 3);
    for alias in aliases {
        let mut current = alias.id;
        let mut hops = 0;
        loop {
            let node = graph.node(current).unwrap();
            if node.kind != NodeKind::TypeAlias {
                assert!(
                    matches!(node.kind, NodeKind::Class | NodeKind::Struct | NodeKind::External),
                    "{alias} ends in {node}"
                );
                break;
            }
            let next = graph
                .outgoing(current, Some(EdgeKind::UsesType))
                .into_iter()
                .find(|e| {
                    e.attributes
                        .get_string_list(attrs::ROLES)
                        .map_or(false, |roles| roles.iter().any(|r| r == "alias"))
                })
                .unwrap_or_else(|| panic!("{node} has no alias target"));
            current = next.target;
            hops += 1;
            assert!(hops <= 8, "alias chain from {alias} does not end");
        }
    }
}

#[test]
fn test_build_files_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = SEP_TEST
        .iter()
        .map(|(name, text)| {
            let path = dir.path().join(name);
            std::fs::write(&path, text).unwrap();
            path
        })
        .collect();

    let output = OntologyBuilder::new().build_files(&paths).unwrap();
    assert!(output.summary.is_clean());
    assert_eq!(output.summary.units_merged.len(), 5);
    assert_eq!(output.summary.metrics.units_succeeded, 5);

    let in_memory = OntologyBuilder::new()
        .build_sources(&sep_test_sources())
        .unwrap();
    assert_eq!(output.ontology.node_count(), in_memory.ontology.node_count());
    assert_eq!(output.ontology.edge_count(), in_memory.ontology.edge_count());
}

#[test]
fn test_missing_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("present.h");
    std::fs::write(&present, "struct Present { int value; };").unwrap();
    let missing = dir.path().join("missing.h");

    let output = OntologyBuilder::new()
        .build_files(&[present.clone(), missing.clone()])
        .unwrap();
    assert_eq!(output.summary.units_merged, vec![present]);
    assert_eq!(output.summary.skipped.len(), 1);
    assert_eq!(output.summary.skipped[0].path, missing);
}
