//! Syntax stage tests
//!
//! - Empty and whitespace input
//! - Minimal well-formed documents and statistics
//! - Error localization and context snippets
//! - Advisory warnings
//! - Idempotence and robustness over arbitrary input

mod support;

use anyhow::Result;
use proptest::prelude::*;
use rdf_validation_pipeline::config::{DomainVocabulary, SyntaxConfig};
use rdf_validation_pipeline::syntax::{self, EMPTY_CONTENT_MESSAGE};
use rdf_validation_pipeline::{SyntaxStats, extract_triples, quick_syntax_check, validate_syntax};
use support::{BROKEN_LINE5, NEWS_ARTICLE, lines};

// =============================================================================
// Empty input
// =============================================================================

#[test]
fn test_empty_and_whitespace_input_is_rejected() {
    for text in ["", "   ", "\n\t  \n"] {
        let result = validate_syntax(text);
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].message, EMPTY_CONTENT_MESSAGE);
        assert_eq!(result.errors()[0].line, None);
        assert_eq!(*result.stats(), SyntaxStats::default());
    }
}

#[test]
fn test_quick_check_and_extract_reject_empty_input() {
    let quick = quick_syntax_check(" ");
    assert!(!quick.is_valid);
    assert_eq!(quick.error.as_deref(), Some(EMPTY_CONTENT_MESSAGE));

    let extracted = extract_triples("");
    assert!(extracted.triples.is_empty());
    assert!(extracted.error.is_some());
}

// =============================================================================
// Well-formed documents
// =============================================================================

#[test]
fn test_minimal_document() {
    let result = validate_syntax("@prefix ex: <http://example.org/> .\nex:thing a ex:Widget .\n");
    assert!(result.is_valid());
    assert!(result.errors().is_empty());
    assert_eq!(result.stats().triple_count, 1);
    assert_eq!(result.stats().subject_count, 1);
    assert_eq!(result.stats().prefix_count, 1);
}

#[test]
fn test_news_article_statistics() {
    let result = validate_syntax(NEWS_ARTICLE);
    assert!(result.is_valid(), "errors: {:?}", result.errors());
    assert!(result.warnings().is_empty(), "warnings: {:?}", result.warnings());

    let stats = result.stats();
    assert_eq!(stats.triple_count, 8);
    assert_eq!(stats.prefix_count, 5);
    assert_eq!(stats.subject_count, 2);
}

#[test]
fn test_duplicate_statements_are_counted() {
    let text = "@prefix ex: <http://example.org/> .\nex:a ex:p ex:b .\nex:a ex:p ex:b .\n";
    let stats = *validate_syntax(text).stats();
    assert_eq!(stats.triple_count, 2);
    assert_eq!(stats.subject_count, 1);
    assert_eq!(stats.object_count, 1);
}

// =============================================================================
// Error localization
// =============================================================================

#[test]
fn test_error_on_line_five_is_localized() {
    let result = validate_syntax(BROKEN_LINE5);
    assert!(!result.is_valid());

    let located = result
        .errors()
        .iter()
        .find(|e| e.line == Some(5))
        .expect("an error on line 5");
    assert_eq!(located.column, Some(19));
    let snippet = located.context_snippet.as_deref().expect("a context snippet");
    assert!(snippet.contains(r#"ex:e ex:p "value" "oops" ."#));
    assert!(snippet.lines().count() <= 3);
}

#[test]
fn test_parsing_recovers_after_an_error() {
    let text = lines(&[
        "@prefix ex: <http://example.org/> .",
        "ex:a ex:p ex:b .",
        "ex:broken ex:p .",
        "ex:c ex:p ex:d .",
    ]);
    let result = validate_syntax(&text);
    assert!(!result.is_valid());
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].line, Some(3));
    assert_eq!(result.stats().triple_count, 2);
}

#[test]
fn test_context_width_is_configurable() {
    let config = SyntaxConfig {
        context_lines: 1,
        ..SyntaxConfig::default()
    };
    let result = syntax::validate_syntax(BROKEN_LINE5, &config, &DomainVocabulary::default());
    let snippet = result
        .errors()
        .iter()
        .find_map(|e| e.context_snippet.clone())
        .expect("a context snippet");
    assert_eq!(snippet.lines().count(), 1);
}

#[test]
fn test_quick_check_stops_at_first_error() {
    let result = quick_syntax_check(BROKEN_LINE5);
    assert!(!result.is_valid);
    assert!(result.error.is_some());
    assert!(quick_syntax_check(NEWS_ARTICLE).is_valid);
}

#[test]
fn test_extract_triples_is_all_or_nothing() {
    let extracted = extract_triples(BROKEN_LINE5);
    assert!(extracted.triples.is_empty());
    assert!(extracted.error.is_some());

    let extracted = extract_triples(NEWS_ARTICLE);
    assert!(extracted.error.is_none());
    assert_eq!(extracted.triples.len(), 8);
    assert!(extracted.triples.contains(&(
        "http://data.example.org/article/1".to_string(),
        "http://purl.org/dc/terms/created".to_string(),
        "2024-03-18".to_string(),
    )));
}

// =============================================================================
// Warnings
// =============================================================================

#[test]
fn test_warnings_never_affect_validity() -> Result<()> {
    let text = lines(&[
        "@prefix art: <http://data.example.org/article/> .",
        "@prefix prov: <http://www.w3.org/ns/prov#> .",
        "@prefix dcterms: <http://purl.org/dc/terms/> .",
        "art:1 dcterms:created \"2024-03-18\" .",
    ]);
    let result = validate_syntax(&text);
    assert!(result.is_valid());
    assert_eq!(result.warnings().len(), 3, "warnings: {:?}", result.warnings());

    let quiet = syntax::validate_syntax(
        &text,
        &SyntaxConfig {
            emit_warnings: false,
            ..SyntaxConfig::default()
        },
        &DomainVocabulary::default(),
    );
    assert!(quiet.warnings().is_empty());
    assert_eq!(quiet.stats(), result.stats());
    Ok(())
}

#[test]
fn test_result_serializes_camel_case() -> Result<()> {
    let json = serde_json::to_value(validate_syntax(NEWS_ARTICLE))?;
    assert_eq!(json["isValid"], true);
    assert_eq!(json["stats"]["tripleCount"], 8);
    Ok(())
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_validation_is_idempotent_on_fixtures() {
    for text in [NEWS_ARTICLE, BROKEN_LINE5, ""] {
        assert_eq!(validate_syntax(text), validate_syntax(text));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_validation_is_idempotent(text in "\\PC{0,200}") {
        prop_assert_eq!(validate_syntax(&text), validate_syntax(&text));
    }

    #[test]
    fn prop_validity_matches_error_list(text in "[a-z:<>\"@ .;,\n]{0,120}") {
        let result = validate_syntax(&text);
        prop_assert_eq!(result.is_valid(), result.errors().is_empty());
        prop_assert_eq!(quick_syntax_check(&text).is_valid, result.is_valid());
    }
}
