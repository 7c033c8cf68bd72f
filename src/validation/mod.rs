//! Validation orchestrator
//!
//! Sequences the stages for one document:
//!
//! ```text
//! Start -> SyntaxChecked -> Rejected
//!                        -> SemanticChecked -> Accepted | Nonconforming
//!                        -> Accepted (no shapes supplied)
//! ```
//!
//! Syntax always runs first and gates everything else. The triple store
//! built during the syntax pass is handed to the later stages, so a document
//! is parsed once per call.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rdf_validation_pipeline::validation::Validator;
//!
//! let validator = Validator::from_env()?;
//! let report = validator.validate_document(document, Some(shapes));
//! println!("{}", report.summary());
//! ```

pub mod report;

pub use report::{FullValidationResult, Outcome};

use crate::config::ValidatorConfig;
use crate::error::PipelineError;
use crate::ontology::{self, ConsistencyResult, SemanticResult};
use crate::syntax::{self, ExtractedTriples, QuickSyntaxResult, SyntaxError, SyntaxResult};
use std::time::Instant;

/// Stateless pipeline front end. Cheap to clone; holds only configuration.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Build from `RDF_VALIDATOR_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(ValidatorConfig::from_env()?))
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn validate_syntax(&self, text: &str) -> SyntaxResult {
        syntax::validate_syntax(text, &self.config.syntax, &self.config.vocabulary)
    }

    pub fn quick_syntax_check(&self, text: &str) -> QuickSyntaxResult {
        syntax::quick_syntax_check(text)
    }

    pub fn extract_triples(&self, text: &str) -> ExtractedTriples {
        syntax::extract_triples(text)
    }

    pub fn validate_semantics(&self, text: &str, shapes_text: &str) -> SemanticResult {
        ontology::validate_semantics(text, shapes_text, &self.config.semantic)
    }

    pub fn validate_consistency(&self, text: &str) -> ConsistencyResult {
        ontology::validate_consistency(text, &self.config.vocabulary)
    }

    /// Syntax, then semantics when syntax passed and shapes were supplied.
    /// Consistency is not part of this flow.
    pub fn validate_full(&self, text: &str, shapes_text: Option<&str>) -> FullValidationResult {
        let start = Instant::now();
        let _span = tracing::info_span!(
            "validate_full",
            bytes = text.len(),
            shapes = shapes_text.is_some()
        )
        .entered();

        let (syntax_result, document) =
            syntax::validate_parsed(text, &self.config.syntax, &self.config.vocabulary);

        let semantic_result = match shapes_text {
            Some(shapes) if syntax_result.is_valid() => {
                let store = document.into_store();
                Some(ontology::validate_store(&store, shapes, &self.config.semantic))
            }
            _ => None,
        };

        self.finish(
            FullValidationResult::new(syntax_result, semantic_result, None),
            start,
        )
    }

    /// Full advisory flow: after a successful syntax pass, semantics (when
    /// shapes are supplied) and consistency run concurrently over the same
    /// triple store. The consistency summary is appended to the report
    /// summary; it does not affect `is_fully_valid`.
    pub fn validate_document(
        &self,
        text: &str,
        shapes_text: Option<&str>,
    ) -> FullValidationResult {
        let start = Instant::now();
        let _span = tracing::info_span!(
            "validate_document",
            bytes = text.len(),
            shapes = shapes_text.is_some()
        )
        .entered();

        let (syntax_result, document) =
            syntax::validate_parsed(text, &self.config.syntax, &self.config.vocabulary);
        if !syntax_result.is_valid() {
            return self.finish(FullValidationResult::new(syntax_result, None, None), start);
        }

        let store = document.into_store();
        let store = &store;
        let config = &self.config;
        let (semantic_result, consistency_result) = std::thread::scope(|scope| {
            let semantic = shapes_text.map(|shapes| {
                scope.spawn(move || ontology::validate_store(store, shapes, &config.semantic))
            });
            let consistency = ontology::check_store(store, text, &config.vocabulary);
            let semantic = semantic.map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    SemanticResult::internal_failure(&PipelineError::TaskJoin(
                        "semantic validation thread panicked".to_string(),
                    ))
                })
            });
            (semantic, consistency)
        });

        self.finish(
            FullValidationResult::new(syntax_result, semantic_result, Some(consistency_result)),
            start,
        )
    }

    /// [`Validator::validate_full`] on the tokio blocking pool, for async
    /// hosts. A task that fails to complete is reported as a syntax error.
    pub async fn validate_full_async(
        &self,
        text: impl Into<String>,
        shapes_text: Option<String>,
    ) -> FullValidationResult {
        let validator = self.clone();
        let text = text.into();
        let task = tokio::task::spawn_blocking(move || {
            validator.validate_full(&text, shapes_text.as_deref())
        });

        match task.await {
            Ok(result) => result,
            Err(join_error) => {
                let error = PipelineError::TaskJoin(join_error.to_string());
                tracing::warn!(error = %error, "validation task did not complete");
                crate::metrics::METRICS.record_stage(
                    "full",
                    error.category().as_str(),
                    std::time::Duration::ZERO,
                );
                FullValidationResult::new(
                    SyntaxResult::rejected(SyntaxError::new(error.to_string())),
                    None,
                    None,
                )
            }
        }
    }

    fn finish(&self, result: FullValidationResult, start: Instant) -> FullValidationResult {
        tracing::info!(
            outcome = %result.outcome(),
            fully_valid = result.is_fully_valid(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "{}",
            result.summary()
        );
        crate::metrics::METRICS.record_stage(
            "full",
            crate::metrics::outcome(result.is_fully_valid()),
            start.elapsed(),
        );
        crate::log_slow_stage!(start.elapsed(), 1000, "full");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = "@prefix ex: <http://example.org/> .\nex:a a ex:Thing .\n";
    const SHAPES: &str = "@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix ex: <http://example.org/> .
ex:ThingShape a sh:NodeShape ; sh:targetClass ex:Thing ;
    sh:property [ sh:path ex:label ; sh:minCount 1 ] .
";

    #[test]
    fn syntax_failure_skips_semantics() {
        let result = Validator::default().validate_full("ex:a ex:b", Some(SHAPES));
        assert!(result.semantic_result().is_none());
        assert_eq!(result.outcome(), Outcome::Rejected);
    }

    #[test]
    fn no_shapes_means_no_semantic_result() {
        let result = Validator::default().validate_full(DOCUMENT, None);
        assert!(result.is_fully_valid());
        assert!(result.semantic_result().is_none());
        assert_eq!(result.summary(), "Document is valid (1 triples, 1 prefixes)");
    }

    #[test]
    fn document_flow_runs_both_stages() {
        let result = Validator::default().validate_document(DOCUMENT, Some(SHAPES));
        assert!(!result.is_fully_valid());
        assert!(result.semantic_result().is_some());
        assert!(result.consistency_result().is_some());
    }
}
