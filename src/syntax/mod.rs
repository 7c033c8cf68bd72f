//! Syntax validation
//!
//! Parses Turtle text with oxigraph's streaming parser. Parse errors are
//! collected with line/column context instead of aborting, since the parser
//! resynchronizes at the next statement boundary. After the stream is
//! drained an advisory warning pass runs and statistics are computed.
//!
//! - [`validate_syntax`]: full diagnostics, warnings and statistics
//! - [`quick_syntax_check`]: boolean gate that stops at the first error
//! - [`extract_triples`]: flattens the document into string triples

pub mod diagnostics;
pub mod warnings;

use crate::config::{DomainVocabulary, SyntaxConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::graph::{Quad, TripleStore};
use ahash::AHashSet;
use oxigraph::io::{RdfFormat, RdfParser, RdfSyntaxError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

pub const EMPTY_CONTENT_MESSAGE: &str = "content is empty";

// =============================================================================
// Result types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxError {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub context_snippet: Option<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
            context_snippet: None,
        }
    }

    /// Localize a parser error against the source text. The parser's own
    /// location wins; otherwise the position is recovered from the message.
    fn from_syntax_error(error: &RdfSyntaxError, text: &str, context_lines: usize) -> Self {
        let message = error.to_string();
        let (line, column) = match error.location() {
            Some(range) => (
                Some(range.start.line as usize + 1),
                Some(range.start.column as usize + 1),
            ),
            None => {
                let line = diagnostics::line_from_message(&message);
                (line, line.and(diagnostics::column_from_message(&message)))
            }
        };
        let context_snippet =
            line.and_then(|line| diagnostics::context_snippet(text, line, context_lines));
        Self {
            message,
            line,
            column,
            context_snippet,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxStats {
    pub triple_count: usize,
    pub prefix_count: usize,
    pub subject_count: usize,
    pub predicate_count: usize,
    pub object_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxResult {
    is_valid: bool,
    errors: Vec<SyntaxError>,
    warnings: Vec<String>,
    stats: SyntaxStats,
}

impl SyntaxResult {
    pub fn new(errors: Vec<SyntaxError>, warnings: Vec<String>, stats: SyntaxStats) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            stats,
        }
    }

    /// A single error with zero statistics.
    pub fn rejected(error: SyntaxError) -> Self {
        Self::new(vec![error], Vec::new(), SyntaxStats::default())
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn stats(&self) -> &SyntaxStats {
        &self.stats
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickSyntaxResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTriples {
    pub triples: Vec<(String, String, String)>,
    pub error: Option<String>,
}

// =============================================================================
// Parsing
// =============================================================================

/// Everything a single pass over the document produced.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub quads: Vec<Quad>,
    pub prefixes: BTreeMap<String, String>,
    pub errors: Vec<SyntaxError>,
    /// Parsing stopped at the error limit
    pub truncated: bool,
}

impl ParsedDocument {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_store(self) -> TripleStore {
        TripleStore::from_quads(self.quads)
    }

    pub fn stats(&self) -> SyntaxStats {
        let mut subjects = AHashSet::new();
        let mut predicates = AHashSet::new();
        let mut objects = AHashSet::new();
        for quad in &self.quads {
            subjects.insert(&quad.subject);
            predicates.insert(&quad.predicate);
            objects.insert(&quad.object);
        }
        SyntaxStats {
            triple_count: self.quads.len(),
            prefix_count: self.prefixes.len(),
            subject_count: subjects.len(),
            predicate_count: predicates.len(),
            object_count: objects.len(),
        }
    }
}

pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Drain the Turtle parser over `text`, keeping quads and localized errors.
pub fn parse_document(text: &str, config: &SyntaxConfig) -> ParsedDocument {
    let mut document = ParsedDocument::default();
    let mut parser = RdfParser::from_format(RdfFormat::Turtle).for_slice(text.as_bytes());

    for result in parser.by_ref() {
        match result {
            Ok(quad) => document.quads.push(Quad::from(quad)),
            Err(error) => {
                document.errors.push(SyntaxError::from_syntax_error(
                    &error,
                    text,
                    config.context_lines,
                ));
                if document.errors.len() >= config.max_errors {
                    document.truncated = true;
                    break;
                }
            }
        }
    }

    document.prefixes = parser
        .prefixes()
        .map(|(name, iri)| (name.to_string(), iri.to_string()))
        .collect();

    tracing::debug!(
        quads = document.quads.len(),
        errors = document.errors.len(),
        prefixes = document.prefixes.len(),
        truncated = document.truncated,
        "parsed turtle document"
    );

    document
}

/// Parse `text` into a triple store, failing on the first error.
///
/// Used by stages that consume a graph rather than diagnose one.
pub fn parse_store(text: &str, source_name: &str) -> PipelineResult<TripleStore> {
    if is_blank(text) {
        return Err(PipelineError::EmptyContent);
    }
    RdfParser::from_format(RdfFormat::Turtle)
        .for_slice(text.as_bytes())
        .map(|result| {
            result
                .map(Quad::from)
                .map_err(|e| PipelineError::parse(source_name, e.to_string()))
        })
        .collect::<PipelineResult<TripleStore>>()
}

// =============================================================================
// Operations
// =============================================================================

/// Parse and report errors, warnings and statistics.
pub fn validate_syntax(
    text: &str,
    config: &SyntaxConfig,
    vocabulary: &DomainVocabulary,
) -> SyntaxResult {
    validate_parsed(text, config, vocabulary).0
}

/// Same as [`validate_syntax`] but also hands back the parsed document so a
/// caller can build the triple store without parsing twice.
pub fn validate_parsed(
    text: &str,
    config: &SyntaxConfig,
    vocabulary: &DomainVocabulary,
) -> (SyntaxResult, ParsedDocument) {
    let start = Instant::now();
    let _span = tracing::debug_span!("validate_syntax", bytes = text.len()).entered();

    if is_blank(text) {
        let result = SyntaxResult::rejected(SyntaxError::new(EMPTY_CONTENT_MESSAGE));
        crate::metrics::METRICS.record_stage("syntax", "fail", start.elapsed());
        return (result, ParsedDocument::default());
    }

    let document = parse_document(text, config);

    let mut warning_list = Vec::new();
    if document.truncated {
        warning_list.push(format!(
            "Parsing stopped after {} errors; statistics reflect a partial parse",
            document.errors.len()
        ));
    }
    if config.emit_warnings {
        warning_list.extend(warnings::collect_warnings(
            &document.quads,
            &document.prefixes,
            vocabulary,
        ));
    }

    let result = SyntaxResult::new(document.errors.clone(), warning_list, document.stats());

    crate::metrics::METRICS.record_stage(
        "syntax",
        crate::metrics::outcome(result.is_valid()),
        start.elapsed(),
    );
    crate::log_slow_stage!(start.elapsed(), 500, "syntax");

    (result, document)
}

/// Boolean gate: stops at the first parse error and skips statistics.
pub fn quick_syntax_check(text: &str) -> QuickSyntaxResult {
    if is_blank(text) {
        return QuickSyntaxResult {
            is_valid: false,
            error: Some(EMPTY_CONTENT_MESSAGE.to_string()),
        };
    }

    let parser = RdfParser::from_format(RdfFormat::Turtle).for_slice(text.as_bytes());
    for result in parser {
        if let Err(error) = result {
            return QuickSyntaxResult {
                is_valid: false,
                error: Some(error.to_string()),
            };
        }
    }

    QuickSyntaxResult {
        is_valid: true,
        error: None,
    }
}

/// Flatten the document into `(subject, predicate, object)` strings.
///
/// All-or-nothing: on the first parse error the triple list is empty.
pub fn extract_triples(text: &str) -> ExtractedTriples {
    if is_blank(text) {
        return ExtractedTriples {
            triples: Vec::new(),
            error: Some(EMPTY_CONTENT_MESSAGE.to_string()),
        };
    }

    let mut triples = Vec::new();
    let parser = RdfParser::from_format(RdfFormat::Turtle).for_slice(text.as_bytes());
    for result in parser {
        match result {
            Ok(quad) => {
                let quad = Quad::from(quad);
                triples.push((
                    quad.subject.lexical(),
                    quad.predicate.lexical(),
                    quad.object.lexical(),
                ));
            }
            Err(error) => {
                return ExtractedTriples {
                    triples: Vec::new(),
                    error: Some(error.to_string()),
                };
            }
        }
    }

    ExtractedTriples {
        triples,
        error: None,
    }
}
