use crate::{
    config::ExtractConfig,
    declarations::{Declaration, UsingDirective},
    errors::ParserError,
    metrics::ExtractMetrics,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Declaration records extracted from one parsed translation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Path of the source file (or the logical path given for in-memory source)
    pub path: PathBuf,

    /// Declaration records in source order
    pub declarations: Vec<Declaration>,

    /// `using namespace` directives at namespace scope, in source order
    #[serde(default)]
    pub using_directives: Vec<UsingDirective>,

    /// Time taken to parse this unit
    #[serde(with = "duration_serde")]
    pub parse_time: Duration,

    /// Number of lines in the file
    pub line_count: usize,

    /// File size in bytes
    pub byte_count: usize,
}

// Helper module for serializing Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_micros().min(u64::MAX as u128) as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros: u64 = u64::deserialize(deserializer)?;
        Ok(Duration::from_micros(micros))
    }
}

impl TranslationUnit {
    /// Create an empty unit for hand-built records.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            declarations: Vec::new(),
            using_directives: Vec::new(),
            parse_time: Duration::ZERO,
            line_count: 0,
            byte_count: 0,
        }
    }

    /// Builder pattern: append a declaration and return self.
    pub fn with(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn add(&mut self, declaration: Declaration) {
        self.declarations.push(declaration);
    }

    pub fn add_using(&mut self, directive: UsingDirective) {
        self.using_directives.push(directive);
    }

    /// Restartable iteration over the declaration records.
    pub fn declarations(&self) -> std::slice::Iter<'_, Declaration> {
        self.declarations.iter()
    }

    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    /// Total symbolic references across all records
    pub fn reference_count(&self) -> usize {
        self.declarations.iter().map(Declaration::reference_count).sum()
    }
}

/// The AST adapter contract every front-end implements.
///
/// A front-end turns source text into a [`TranslationUnit`]; it never touches
/// the graph. Units are independent, so one front-end value is shared across
/// worker threads.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to support parallel parsing.
pub trait Frontend: Send + Sync {
    /// Returns the language identifier (lowercase, e.g., "cpp")
    fn language(&self) -> &str;

    /// Returns supported file extensions (e.g., [".cpp", ".h"])
    fn file_extensions(&self) -> &[&str];

    /// Read and parse a single file
    ///
    /// **Note on Metrics**: This method updates front-end metrics
    /// (units_attempted, units_succeeded, etc.).
    ///
    /// # Errors
    /// Returns `ParserError` if:
    /// - File cannot be read
    /// - File exceeds `max_file_size`
    /// - Source code has syntax errors and `tolerate_syntax_errors` is off
    fn parse_file(&self, path: &Path) -> Result<TranslationUnit, ParserError>;

    /// Parse an in-memory source string
    ///
    /// **Note on Metrics**: This method does NOT update metrics, so that
    /// `parse_file()` delegating to it does not count a unit twice.
    ///
    /// # Arguments
    /// * `source` - Source code string
    /// * `path` - Logical path for this source (recorded on declarations)
    fn parse_source(&self, source: &str, path: &Path) -> Result<TranslationUnit, ParserError>;

    /// Check if this front-end can handle the given file
    ///
    /// Default implementation checks file extension.
    fn can_parse(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_str = format!(".{}", ext.to_string_lossy());
            self.file_extensions().contains(&ext_str.as_str())
        } else {
            false
        }
    }

    /// Get extraction configuration
    fn config(&self) -> &ExtractConfig;

    /// Get accumulated metrics
    fn metrics(&self) -> ExtractMetrics;

    /// Reset metrics
    fn reset_metrics(&mut self);
}
