//! AST extraction for C++ source code

use log::debug;
use ontograph_parser_api::{ExtractConfig, ParserError, TranslationUnit};
use std::path::Path;
use std::time::Instant;
use tree_sitter::{Node, Parser};

use crate::visitor::CppVisitor;

/// Parse C++ source and extract its declaration records
pub fn extract(
    source: &str,
    file_path: &Path,
    config: &ExtractConfig,
) -> Result<TranslationUnit, ParserError> {
    let start = Instant::now();
    let mut parser = Parser::new();
    let language = tree_sitter_cpp::language();
    parser
        .set_language(&language)
        .map_err(|e| ParserError::ParseError(file_path.to_path_buf(), e.to_string()))?;
    if let Some(timeout) = config.timeout_per_file {
        parser.set_timeout_micros(timeout.as_micros().min(u64::MAX as u128) as u64);
    }

    let tree = parser.parse(source, None).ok_or_else(|| {
        if config.timeout_per_file.is_some() {
            ParserError::Timeout(file_path.to_path_buf())
        } else {
            ParserError::ParseError(file_path.to_path_buf(), "Failed to parse".to_string())
        }
    })?;

    let root_node = tree.root_node();

    if root_node.has_error() && !config.tolerate_syntax_errors {
        let (line, column) = first_error(root_node)
            .map(|n| (n.start_position().row + 1, n.start_position().column + 1))
            .unwrap_or((0, 0));
        return Err(ParserError::SyntaxError(
            file_path.to_path_buf(),
            line,
            column,
            "Syntax error".to_string(),
        ));
    }

    let mut visitor = CppVisitor::new(source.as_bytes(), file_path).with_calls(config.extract_calls);
    visitor.visit_node(root_node);

    let mut unit = TranslationUnit::new(file_path);
    unit.declarations = visitor.declarations;
    unit.using_directives = visitor.using_directives;
    unit.parse_time = start.elapsed();
    unit.line_count = source.lines().count();
    unit.byte_count = source.len();

    debug!(
        "Extracted {} declarations from {} in {:?}",
        unit.declaration_count(),
        file_path.display(),
        unit.parse_time
    );
    Ok(unit)
}

/// First ERROR or MISSING node in document order.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontograph::NodeKind;

    #[test]
    fn test_extract_simple_class() {
        let source = r#"
class HelloWorld {
public:
    void greet() {
        // Hello
    }
};
"#;
        let config = ExtractConfig::default();
        let result = extract(source, Path::new("HelloWorld.cpp"), &config);

        assert!(result.is_ok());
        let unit = result.unwrap();
        assert_eq!(unit.declaration_count(), 2);
        assert_eq!(unit.declarations[0].name, "HelloWorld");
        assert_eq!(unit.declarations[1].kind, NodeKind::Method);
        assert_eq!(unit.line_count, 7);
    }

    #[test]
    fn test_extract_namespace() {
        let source = r#"
namespace myns {
    class MyClass {};
}
"#;
        let config = ExtractConfig::default();
        let unit = extract(source, Path::new("test.cpp"), &config).unwrap();

        let class = unit
            .declarations()
            .find(|d| d.kind == NodeKind::Class)
            .unwrap();
        assert_eq!(class.qualified_name().to_string(), "myns::MyClass");
    }

    #[test]
    fn test_extract_syntax_error() {
        let source = "class Broken { void f( };";
        let config = ExtractConfig::default();
        let result = extract(source, Path::new("broken.cpp"), &config);

        assert!(matches!(result, Err(ParserError::SyntaxError(_, line, _, _)) if line == 1));
    }

    #[test]
    fn test_extract_tolerates_syntax_errors_when_configured() {
        let source = "namespace ok { void fine(); }\nclass Broken { void f( };";
        let config = ExtractConfig::tolerant();
        let unit = extract(source, Path::new("broken.cpp"), &config).unwrap();

        assert!(unit
            .declarations()
            .any(|d| d.qualified_name().to_string() == "ok::fine"));
    }

    #[test]
    fn test_extract_without_calls() {
        let source = "void a() {}\nvoid b() { a(); }";
        let config = ExtractConfig::fast();
        let unit = extract(source, Path::new("calls.cpp"), &config).unwrap();

        assert!(unit.declarations().all(|d| d.body.is_none()));
        assert_eq!(unit.reference_count(), 0);
    }
}
