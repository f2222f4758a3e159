//! Implementation of the Frontend trait for C++

use log::warn;
use ontograph_parser_api::{ExtractConfig, ExtractMetrics, Frontend, ParserError, TranslationUnit};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::extractor;

/// C++ front-end implementing the Frontend trait
pub struct CppFrontend {
    config: ExtractConfig,
    metrics: Mutex<ExtractMetrics>,
}

impl CppFrontend {
    pub fn new() -> Self {
        Self::with_config(ExtractConfig::default())
    }

    pub fn with_config(config: ExtractConfig) -> Self {
        Self {
            config,
            metrics: Mutex::new(ExtractMetrics::default()),
        }
    }

    fn lock_metrics(&self) -> MutexGuard<'_, ExtractMetrics> {
        // Metrics are plain counters; a panic mid-update leaves them usable
        self.metrics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update_metrics(
        &self,
        success: bool,
        duration: Duration,
        declarations: usize,
        references: usize,
    ) {
        let mut metrics = self.lock_metrics();
        metrics.units_attempted += 1;
        if success {
            metrics.units_succeeded += 1;
        } else {
            metrics.units_failed += 1;
        }
        metrics.total_parse_time += duration;
        metrics.total_declarations += declarations;
        metrics.total_references += references;
    }
}

impl Default for CppFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontend for CppFrontend {
    fn language(&self) -> &str {
        "cpp"
    }

    fn file_extensions(&self) -> &[&str] {
        &[".cpp", ".cc", ".cxx", ".c++", ".hpp", ".hh", ".hxx", ".h", ".h++"]
    }

    fn parse_file(&self, path: &Path) -> Result<TranslationUnit, ParserError> {
        let start = Instant::now();
        let result = fs::metadata(path)
            .map_err(|e| ParserError::IoError(path.to_path_buf(), e))
            .and_then(|metadata| {
                if metadata.len() as usize > self.config.max_file_size {
                    Err(ParserError::FileTooLarge(
                        path.to_path_buf(),
                        metadata.len() as usize,
                    ))
                } else {
                    Ok(())
                }
            })
            .and_then(|_| {
                fs::read_to_string(path).map_err(|e| ParserError::IoError(path.to_path_buf(), e))
            })
            .and_then(|source| self.parse_source(&source, path));

        let duration = start.elapsed();
        match result {
            Ok(ref unit) => self.update_metrics(
                true,
                duration,
                unit.declaration_count(),
                unit.reference_count(),
            ),
            Err(ref e) => {
                warn!("Skipping {}: {e}", path.display());
                self.update_metrics(false, duration, 0, 0);
            }
        }

        result
    }

    fn parse_source(&self, source: &str, path: &Path) -> Result<TranslationUnit, ParserError> {
        if source.len() > self.config.max_file_size {
            return Err(ParserError::FileTooLarge(path.to_path_buf(), source.len()));
        }
        extractor::extract(source, path, &self.config)
    }

    fn config(&self) -> &ExtractConfig {
        &self.config
    }

    fn metrics(&self) -> ExtractMetrics {
        self.lock_metrics().clone()
    }

    fn reset_metrics(&mut self) {
        *self.lock_metrics() = ExtractMetrics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_language() {
        let frontend = CppFrontend::new();
        assert_eq!(frontend.language(), "cpp");
    }

    #[test]
    fn test_can_parse() {
        let frontend = CppFrontend::new();
        assert!(frontend.can_parse(Path::new("Entities.cpp")));
        assert!(frontend.can_parse(Path::new("Entities.h")));
        assert!(frontend.can_parse(Path::new("shapes.hpp")));
        assert!(!frontend.can_parse(Path::new("main.rs")));
        assert!(!frontend.can_parse(Path::new("Makefile")));
    }

    #[test]
    fn test_parse_file_updates_metrics() {
        let mut file = tempfile::Builder::new().suffix(".cpp").tempfile().unwrap();
        writeln!(file, "namespace app {{ void run(int level); }}").unwrap();

        let mut frontend = CppFrontend::new();
        let unit = frontend.parse_file(file.path()).unwrap();
        assert_eq!(unit.declaration_count(), 2);

        let metrics = frontend.metrics();
        assert_eq!(metrics.units_attempted, 1);
        assert_eq!(metrics.units_succeeded, 1);
        assert_eq!(metrics.total_declarations, 2);

        frontend.reset_metrics();
        assert_eq!(frontend.metrics().units_attempted, 0);
    }

    #[test]
    fn test_parse_file_missing() {
        let frontend = CppFrontend::new();
        let result = frontend.parse_file(Path::new("/definitely/not/here.cpp"));
        assert!(matches!(result, Err(ParserError::IoError(_, _))));
        assert_eq!(frontend.metrics().units_failed, 1);
    }

    #[test]
    fn test_parse_file_too_large() {
        let mut file = tempfile::Builder::new().suffix(".cpp").tempfile().unwrap();
        writeln!(file, "int main() {{ return 0; }}").unwrap();

        let frontend = CppFrontend::with_config(ExtractConfig::default().with_max_file_size(4));
        let result = frontend.parse_file(file.path());
        assert!(matches!(result, Err(ParserError::FileTooLarge(_, _))));
    }
}
