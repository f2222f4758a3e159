//! Helpers for C++ type spellings.
//!
//! Signatures are matched syntactically, so every spelling that takes part in
//! identity or lookup goes through [`normalize_type`] first.

/// Words that make up builtin arithmetic and placeholder types.
const BUILTIN_WORDS: &[&str] = &[
    "void", "bool", "char", "wchar_t", "char8_t", "char16_t", "char32_t", "short", "int",
    "long", "float", "double", "signed", "unsigned", "auto", "size_t", "ptrdiff_t",
    "nullptr_t", "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t",
    "uint32_t", "uint64_t",
];

const CV_WORDS: &[&str] = &["const", "volatile"];

/// Elaborated type keywords dropped from spellings (`struct Foo*` is `Foo*`).
const ELABORATED_WORDS: &[&str] = &["struct", "class", "enum", "union", "typename"];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Punct(char),
}

fn tokenize(spelling: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in spelling.chars() {
        if c.is_alphanumeric() || c == '_' || c == '~' {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(&mut word)));
        }
        if !c.is_whitespace() {
            tokens.push(Token::Punct(c));
        }
    }
    if !word.is_empty() {
        tokens.push(Token::Word(word));
    }

    tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Word(w) if ELABORATED_WORDS.contains(&w.as_str())))
        .collect()
}

fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut previous: Option<&Token> = None;

    for token in tokens {
        match token {
            Token::Word(word) => {
                match previous {
                    Some(Token::Word(_)) => out.push(' '),
                    Some(Token::Punct('*' | '&')) if CV_WORDS.contains(&word.as_str()) => {
                        out.push(' ')
                    }
                    _ => {}
                }
                out.push_str(word);
            }
            Token::Punct(c) => out.push(*c),
        }
        previous = Some(token);
    }
    out
}

/// Canonical spelling of a type: single spaces between words only, no
/// elaborated keywords.
///
/// `const  Entities :: Person &` becomes `const Entities::Person&`.
pub fn normalize_type(spelling: &str) -> String {
    render(&tokenize(spelling))
}

/// Canonical spelling of a parameter type for signature identity.
///
/// Top-level `const`/`volatile` on a by-value parameter does not change the
/// function type, so `void f(const int)` and `void f(int)` share identity.
pub fn normalize_parameter_type(spelling: &str) -> String {
    let tokens = tokenize(spelling);
    let by_value = !matches!(tokens.last(), Some(Token::Punct('*' | '&' | ']')));
    if !by_value {
        return render(&tokens);
    }

    let mut depth = 0usize;
    let kept: Vec<Token> = tokens
        .into_iter()
        .filter(|token| match token {
            Token::Punct('<' | '(') => {
                depth += 1;
                true
            }
            Token::Punct('>' | ')') => {
                depth = depth.saturating_sub(1);
                true
            }
            Token::Word(w) => depth > 0 || !CV_WORDS.contains(&w.as_str()),
            _ => true,
        })
        .collect();
    render(&kept)
}

/// Remove every template argument list: `std::vector<Person>::iterator`
/// becomes `std::vector::iterator`.
///
/// Operator names are returned unchanged.
pub fn strip_template_args(spelling: &str) -> String {
    if spelling.contains("operator") {
        return spelling.trim().to_string();
    }
    let mut out = String::new();
    let mut depth = 0usize;
    for c in spelling.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Top-level template arguments of every argument list in the spelling.
pub fn template_arguments(spelling: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in spelling.chars() {
        match c {
            '<' => {
                depth += 1;
                if depth > 1 {
                    current.push(c);
                }
            }
            '>' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    push_argument(&mut args, &mut current);
                } else {
                    current.push(c);
                }
            }
            ',' if depth == 1 => push_argument(&mut args, &mut current),
            _ if depth > 0 => current.push(c),
            _ => {}
        }
    }
    args
}

fn push_argument(args: &mut Vec<String>, current: &mut String) {
    let arg = current.trim();
    if !arg.is_empty() {
        args.push(arg.to_string());
    }
    current.clear();
}

/// True when the spelling names only builtin words (`unsigned long`, `const char*`).
pub fn is_builtin(spelling: &str) -> bool {
    let mut words = tokenize(spelling)
        .into_iter()
        .filter_map(|t| match t {
            Token::Word(w) if !CV_WORDS.contains(&w.as_str()) => Some(w),
            Token::Punct(':') => Some("::".to_string()),
            _ => None,
        })
        .peekable();

    if words.peek().is_none() {
        return false;
    }
    words.all(|w| BUILTIN_WORDS.contains(&w.as_str()))
}

/// The named type a spelling refers to, stripped of cv-qualifiers,
/// pointers, references, arrays and template arguments.
///
/// Returns `None` for builtin types, literals and function types.
pub fn base_type_name(spelling: &str) -> Option<String> {
    let stripped = strip_template_args(&normalize_type(spelling));
    if stripped.contains('(') {
        return None;
    }

    let tokens: Vec<Token> = tokenize(&stripped)
        .into_iter()
        .take_while(|t| !matches!(t, Token::Punct('[')))
        .filter(|t| match t {
            Token::Word(w) => !CV_WORDS.contains(&w.as_str()),
            Token::Punct(c) => *c == ':',
        })
        .collect();

    let name = render(&tokens);
    let name = name.trim_start_matches("::");
    if name.is_empty()
        || name.starts_with(|c: char| c.is_ascii_digit())
        || is_builtin(name)
    {
        return None;
    }
    Some(name.to_string())
}

/// Every named type a spelling refers to: the base type first, then the
/// named types inside its template arguments, without duplicates.
///
/// `const std::map<std::string, Person>&` yields
/// `["std::map", "std::string", "Person"]`.
pub fn type_references(spelling: &str) -> Vec<String> {
    let mut refs = Vec::new();
    collect_references(&normalize_type(spelling), &mut refs, 0);
    refs
}

fn collect_references(spelling: &str, refs: &mut Vec<String>, depth: usize) {
    // Pathological nesting is not worth following
    if depth > 8 {
        return;
    }
    if let Some(base) = base_type_name(spelling) {
        if !refs.contains(&base) {
            refs.push(base);
        }
    }
    for arg in template_arguments(spelling) {
        collect_references(&arg, refs, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_type() {
        assert_eq!(
            normalize_type("const  Entities :: Person &"),
            "const Entities::Person&"
        );
        assert_eq!(normalize_type("unsigned   int"), "unsigned int");
        assert_eq!(
            normalize_type("std::vector< std::string >"),
            "std::vector<std::string>"
        );
        assert_eq!(normalize_type("struct Node *"), "Node*");
        assert_eq!(normalize_type("char * const"), "char* const");
    }

    #[test]
    fn test_normalize_parameter_type_drops_top_level_const() {
        assert_eq!(normalize_parameter_type("const int"), "int");
        assert_eq!(normalize_parameter_type("int const"), "int");
        assert_eq!(
            normalize_parameter_type("const std::string&"),
            "const std::string&"
        );
        assert_eq!(
            normalize_parameter_type("const std::vector<const int>"),
            "std::vector<const int>"
        );
    }

    #[test]
    fn test_strip_template_args() {
        assert_eq!(strip_template_args("std::vector<Person>"), "std::vector");
        assert_eq!(
            strip_template_args("std::map<int, std::vector<int>>::iterator"),
            "std::map::iterator"
        );
        assert_eq!(strip_template_args("operator<"), "operator<");
    }

    #[test]
    fn test_template_arguments() {
        assert_eq!(
            template_arguments("std::map<std::string, std::vector<Person>>"),
            vec!["std::string", "std::vector<Person>"]
        );
        assert!(template_arguments("int").is_empty());
    }

    #[test]
    fn test_is_builtin() {
        assert!(is_builtin("int"));
        assert!(is_builtin("const unsigned long long"));
        assert!(is_builtin("double"));
        assert!(!is_builtin("std::string"));
        assert!(!is_builtin("Person"));
        assert!(!is_builtin(""));
    }

    #[test]
    fn test_base_type_name() {
        assert_eq!(
            base_type_name("const Entities::Person&").as_deref(),
            Some("Entities::Person")
        );
        assert_eq!(base_type_name("Widget* const").as_deref(), Some("Widget"));
        assert_eq!(
            base_type_name("std::vector<Person>").as_deref(),
            Some("std::vector")
        );
        assert_eq!(base_type_name("::Global").as_deref(), Some("Global"));
        assert_eq!(base_type_name("const char*"), None);
        assert_eq!(base_type_name("void (*)(int)"), None);
        assert_eq!(base_type_name("3"), None);
    }

    #[test]
    fn test_type_references() {
        assert_eq!(
            type_references("const std::map<std::string, Person>&"),
            vec!["std::map", "std::string", "Person"]
        );
        assert_eq!(
            type_references("std::array<int, 3>"),
            vec!["std::array"]
        );
        assert!(type_references("unsigned int").is_empty());
    }
}
