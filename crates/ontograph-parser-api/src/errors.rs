use std::path::PathBuf;
use thiserror::Error;

/// Errors that make a translation unit unusable.
///
/// A unit that fails with any of these is skipped by the build; the rest of
/// the corpus is still merged.
#[derive(Error, Debug)]
pub enum ParserError {
    /// Failed to read file
    #[error("IO error reading {0}: {1}")]
    IoError(PathBuf, #[source] std::io::Error),

    /// Syntax error in source code
    #[error("Syntax error in {0}:{1}:{2}: {3}")]
    SyntaxError(PathBuf, usize, usize, String),

    /// File too large
    #[error("File {0} exceeds maximum size ({1} bytes)")]
    FileTooLarge(PathBuf, usize),

    /// Parsing timeout
    #[error("Parsing {0} exceeded timeout")]
    Timeout(PathBuf),

    /// Generic parsing error
    #[error("Parse error in {0}: {1}")]
    ParseError(PathBuf, String),
}

impl ParserError {
    /// Path of the unit the error belongs to.
    pub fn path(&self) -> &PathBuf {
        match self {
            ParserError::IoError(path, _)
            | ParserError::SyntaxError(path, _, _, _)
            | ParserError::FileTooLarge(path, _)
            | ParserError::Timeout(path)
            | ParserError::ParseError(path, _) => path,
        }
    }
}

/// Result type for parser operations
pub type ParserResult<T> = Result<T, ParserError>;
