//! RDF graph validation pipeline
//!
//! Validates a user-submitted Turtle document in three stages before it is
//! allowed into a governance workflow:
//!
//! 1. [`syntax`]: the document parses, with localized errors and advisory
//!    warnings
//! 2. [`ontology::shacl`]: the graph conforms to a SHACL shapes graph
//! 3. [`ontology::consistency`]: advisory domain rules
//!
//! [`validation::Validator`] sequences the stages. The free functions below
//! run the same operations with the default [`ValidatorConfig`].

pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod metrics;
pub mod ontology;
pub mod syntax;
pub mod validation;
pub mod vocab;

pub use config::{DomainVocabulary, SemanticConfig, SyntaxConfig, ValidatorConfig};
pub use error::{ErrorCategory, PipelineError, PipelineResult};
pub use graph::{Literal, Quad, Term, TripleStore};
pub use logging::{LoggingConfig, init_logging};
pub use metrics::METRICS;
pub use ontology::{
    CheckSeverity, ConsistencyCheck, ConsistencyResult, SemanticResult, Severity, ShaclViolation,
};
pub use syntax::{ExtractedTriples, QuickSyntaxResult, SyntaxError, SyntaxResult, SyntaxStats};
pub use validation::{FullValidationResult, Outcome, Validator};

pub fn validate_syntax(text: &str) -> SyntaxResult {
    Validator::default().validate_syntax(text)
}

pub fn quick_syntax_check(text: &str) -> QuickSyntaxResult {
    Validator::default().quick_syntax_check(text)
}

pub fn extract_triples(text: &str) -> ExtractedTriples {
    Validator::default().extract_triples(text)
}

pub fn validate_semantics(text: &str, shapes_text: &str) -> SemanticResult {
    Validator::default().validate_semantics(text, shapes_text)
}

pub fn validate_consistency(text: &str) -> ConsistencyResult {
    Validator::default().validate_consistency(text)
}

pub fn validate_full(text: &str, shapes_text: Option<&str>) -> FullValidationResult {
    Validator::default().validate_full(text, shapes_text)
}

/// Like [`validate_full`], plus the consistency stage.
pub fn validate_document(text: &str, shapes_text: Option<&str>) -> FullValidationResult {
    Validator::default().validate_document(text, shapes_text)
}

pub async fn validate_full_async(
    text: String,
    shapes_text: Option<String>,
) -> FullValidationResult {
    Validator::default()
        .validate_full_async(text, shapes_text)
        .await
}
