//! Build pipeline: parallel parsing and delta extraction, single-writer merge.

use log::{info, warn};
use ontograph_parser_api::{ExtractConfig, ExtractMetrics, Frontend, ParserError, TranslationUnit};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::assembler::GraphAssembler;
use crate::error::{BuildError, Result};
use crate::parser_impl::CppFrontend;
use crate::relations::{extract_unit, UnitDelta};
use crate::summary::{BuildOutput, BuildSummary, RejectedUnit, SkippedUnit};

/// Shared flag that stops a running build between units.
///
/// Units merged before the flag was raised are still linked and returned.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Outcome of parsing one input on the worker pool.
struct Parsed {
    path: PathBuf,
    outcome: std::result::Result<Extracted, ParserError>,
}

struct Extracted {
    delta: UnitDelta,
    declarations: usize,
    references: usize,
    parse_time: Duration,
}

/// Builds an ontology from many translation units.
///
/// Units are parsed and turned into deltas on a rayon pool, then merged in
/// path order by a single writer, so the result does not depend on which
/// worker finishes first.
///
/// # Example
///
/// ```rust
/// use ontograph::NodeKind;
/// use ontograph_cpp::OntologyBuilder;
/// use std::path::PathBuf;
///
/// let builder = OntologyBuilder::new();
/// let output = builder
///     .build_sources(&[(PathBuf::from("geo.h"), "namespace geo { struct Point { int x; }; }".to_string())])
///     .unwrap();
///
/// assert!(output.summary.is_clean());
/// assert_eq!(output.ontology.nodes_of_kind(NodeKind::Struct).len(), 1);
/// ```
pub struct OntologyBuilder<F: Frontend = CppFrontend> {
    frontend: F,
    cancel: CancellationFlag,
}

impl OntologyBuilder<CppFrontend> {
    pub fn new() -> Self {
        Self::with_frontend(CppFrontend::new())
    }

    pub fn with_config(config: ExtractConfig) -> Self {
        Self::with_frontend(CppFrontend::with_config(config))
    }
}

impl Default for OntologyBuilder<CppFrontend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Frontend> OntologyBuilder<F> {
    pub fn with_frontend(frontend: F) -> Self {
        Self {
            frontend,
            cancel: CancellationFlag::new(),
        }
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    /// A handle that cancels builds run by this builder.
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Share `flag` with other builders or with the front-end.
    pub fn with_cancellation_flag(mut self, flag: CancellationFlag) -> Self {
        self.cancel = flag;
        self
    }

    fn config(&self) -> &ExtractConfig {
        self.frontend.config()
    }

    /// Parse files from disk and build the ontology.
    pub fn build_files(&self, paths: &[PathBuf]) -> Result<BuildOutput> {
        info!("Building ontology from {} files", paths.len());
        let parsed = self.run_parallel(paths, |path| {
            self.extract(path, self.frontend.parse_file(path))
        })?;
        self.assemble(parsed)
    }

    /// Parse in-memory sources given as `(logical path, text)` pairs.
    pub fn build_sources(&self, sources: &[(PathBuf, String)]) -> Result<BuildOutput> {
        info!("Building ontology from {} sources", sources.len());
        let parsed = self.run_parallel(sources, |(path, source)| {
            self.extract(path, self.frontend.parse_source(source, path))
        })?;
        self.assemble(parsed)
    }

    /// Build from units produced by any front-end.
    pub fn build_units(&self, units: &[TranslationUnit]) -> Result<BuildOutput> {
        info!("Building ontology from {} units", units.len());
        let parsed =
            self.run_parallel(units, |unit| self.extract(&unit.path, Ok(unit.clone())))?;
        self.assemble(parsed)
    }

    /// Turn a parse outcome into a delta; `None` once the build is cancelled.
    fn extract(
        &self,
        path: &Path,
        outcome: std::result::Result<TranslationUnit, ParserError>,
    ) -> Option<Parsed> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let outcome = outcome.map(|unit| Extracted {
            delta: extract_unit(&unit, self.config()),
            declarations: unit.declaration_count(),
            references: unit.reference_count(),
            parse_time: unit.parse_time,
        });
        Some(Parsed {
            path: path.to_path_buf(),
            outcome,
        })
    }

    fn run_parallel<T, J>(&self, inputs: &[T], job: J) -> Result<Vec<Option<Parsed>>>
    where
        T: Sync,
        J: Fn(&T) -> Option<Parsed> + Sync + Send,
    {
        let config = self.config();
        if !config.parallel || inputs.len() < 2 {
            return Ok(inputs.iter().map(&job).collect());
        }

        let mut pool = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = config.parallel_workers {
            pool = pool.num_threads(workers);
        }
        let pool = pool
            .build()
            .map_err(|e| BuildError::ThreadPool(e.to_string()))?;
        Ok(pool.install(|| inputs.par_iter().map(&job).collect()))
    }

    fn assemble(&self, parsed: Vec<Option<Parsed>>) -> Result<BuildOutput> {
        let mut parsed: Vec<Parsed> = parsed.into_iter().flatten().collect();
        parsed.sort_by(|a, b| a.path.cmp(&b.path));

        let mut assembler = GraphAssembler::with_config(self.config().clone());
        let mut summary = BuildSummary::default();
        let mut metrics = ExtractMetrics::default();

        // Units extracted before a cancellation during parsing are still merged
        let cancelled_while_parsing = self.cancel.is_cancelled();
        for Parsed { path, outcome } in parsed {
            if !cancelled_while_parsing && self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            metrics.units_attempted += 1;
            let extracted = match outcome {
                Ok(extracted) => extracted,
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    metrics.units_failed += 1;
                    summary.skipped.push(SkippedUnit {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            metrics.units_succeeded += 1;
            metrics.total_parse_time += extracted.parse_time;
            metrics.total_declarations += extracted.declarations;
            metrics.total_references += extracted.references;

            match assembler.merge(extracted.delta) {
                Ok(()) => summary.units_merged.push(path),
                Err(e) if e.is_merge_conflict() => {
                    warn!("Rejecting {}: {e}", path.display());
                    summary.rejected.push(RejectedUnit {
                        path,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        if self.cancel.is_cancelled() {
            summary.cancelled = true;
        }

        let (graph, unresolved) = assembler.finish()?;
        summary.unresolved = unresolved;
        summary.metrics = metrics;
        info!(
            "Build finished: {} merged, {} skipped, {} rejected, {} unresolved references",
            summary.units_merged.len(),
            summary.skipped.len(),
            summary.rejected.len(),
            summary.unresolved.len()
        );

        Ok(BuildOutput {
            ontology: graph.freeze(),
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontograph::{EdgeKind, NodeKind};

    fn sources(items: &[(&str, &str)]) -> Vec<(PathBuf, String)> {
        items
            .iter()
            .map(|(p, s)| (PathBuf::from(p), s.to_string()))
            .collect()
    }

    #[test]
    fn test_skipped_unit_is_reported() {
        let builder = OntologyBuilder::new();
        let output = builder
            .build_sources(&sources(&[
                ("good.cpp", "void ok() {}"),
                ("bad.cpp", "class Broken { void f( };"),
            ]))
            .unwrap();

        assert_eq!(output.summary.units_merged, vec![PathBuf::from("good.cpp")]);
        assert_eq!(output.summary.skipped.len(), 1);
        assert_eq!(output.summary.skipped[0].path, PathBuf::from("bad.cpp"));
        assert_eq!(output.summary.metrics.units_failed, 1);
        assert!(!output.summary.is_clean());
    }

    #[test]
    fn test_rejection_is_independent_of_input_order() {
        let inputs = [
            ("a.h", "class Widget {};"),
            ("b.cpp", "void Widget(int size) {}"),
        ];
        let forward = OntologyBuilder::new().build_sources(&sources(&inputs)).unwrap();
        let mut reversed = inputs;
        reversed.reverse();
        let backward = OntologyBuilder::new().build_sources(&sources(&reversed)).unwrap();

        assert_eq!(forward.summary.rejected.len(), 1);
        assert_eq!(forward.summary.rejected[0].path, PathBuf::from("b.cpp"));
        assert_eq!(forward.summary.rejected, backward.summary.rejected);
        assert_eq!(
            forward.ontology.node_count(),
            backward.ontology.node_count()
        );
    }

    #[test]
    fn test_cancelled_build_returns_empty_graph() {
        let builder = OntologyBuilder::new();
        builder.cancellation_flag().cancel();
        let output = builder
            .build_sources(&sources(&[("a.cpp", "void a() {}")]))
            .unwrap();

        assert!(output.summary.cancelled);
        assert!(output.summary.units_merged.is_empty());
        assert_eq!(output.ontology.node_count(), 1);
    }

    /// Raises the build's cancellation flag while parsing `stop_at`.
    struct CancellingFrontend {
        inner: CppFrontend,
        cancel: CancellationFlag,
        stop_at: PathBuf,
    }

    impl Frontend for CancellingFrontend {
        fn language(&self) -> &str {
            self.inner.language()
        }

        fn file_extensions(&self) -> &[&str] {
            self.inner.file_extensions()
        }

        fn parse_file(&self, path: &Path) -> std::result::Result<TranslationUnit, ParserError> {
            self.inner.parse_file(path)
        }

        fn parse_source(
            &self,
            source: &str,
            path: &Path,
        ) -> std::result::Result<TranslationUnit, ParserError> {
            if path == self.stop_at {
                self.cancel.cancel();
            }
            self.inner.parse_source(source, path)
        }

        fn config(&self) -> &ExtractConfig {
            self.inner.config()
        }

        fn metrics(&self) -> ExtractMetrics {
            self.inner.metrics()
        }

        fn reset_metrics(&mut self) {
            self.inner.reset_metrics()
        }
    }

    #[test]
    fn test_cancel_during_parsing_keeps_earlier_units() {
        let cancel = CancellationFlag::new();
        let frontend = CancellingFrontend {
            inner: CppFrontend::with_config(ExtractConfig::default().with_parallel(false)),
            cancel: cancel.clone(),
            stop_at: PathBuf::from("b.cpp"),
        };
        let builder = OntologyBuilder::with_frontend(frontend).with_cancellation_flag(cancel);
        let output = builder
            .build_sources(&sources(&[
                ("a.cpp", "void helper() {}
void run() { helper(); }
"),
                ("b.cpp", "void late() {}
"),
            ]))
            .unwrap();

        assert!(output.summary.cancelled);
        assert_eq!(output.summary.units_merged, vec![PathBuf::from("a.cpp")]);

        let graph = &output.ontology;
        let function = |name: &str| {
            graph
                .nodes_of_kind(NodeKind::Function)
                .into_iter()
                .find(|n| n.name() == name)
                .map(|n| n.id)
        };
        let (run, helper) = (function("run").unwrap(), function("helper").unwrap());
        assert!(graph.edge_between(run, helper, EdgeKind::Calls).is_some());
        assert_eq!(function("late"), None);
        assert!(graph.check_invariants().is_ok());
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let inputs = sources(&[
            ("shapes.h", "struct Shape { virtual double area() const = 0; };"),
            ("circle.h", "struct Circle : Shape { double area() const override; };"),
            ("main.cpp", "int main() { Circle c; return 0; }"),
        ]);
        let parallel = OntologyBuilder::new().build_sources(&inputs).unwrap();
        let sequential = OntologyBuilder::with_config(ExtractConfig::default().with_parallel(false))
            .build_sources(&inputs)
            .unwrap();

        assert_eq!(parallel.ontology.node_count(), sequential.ontology.node_count());
        assert_eq!(parallel.ontology.edge_count(), sequential.ontology.edge_count());
        assert_eq!(parallel.ontology.nodes_of_kind(NodeKind::Struct).len(), 2);
    }
}
