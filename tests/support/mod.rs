//! Shared fixtures for the integration tests.

#![allow(dead_code)]

pub const NEWS_ARTICLE: &str = include_str!("../fixtures/news_article.ttl");
pub const ARTICLE_SHAPES: &str = include_str!("../fixtures/article_shapes.ttl");
pub const EMPLOYMENT_EVENT: &str = include_str!("../fixtures/employment_event.ttl");
pub const BROKEN_LINE5: &str = include_str!("../fixtures/broken_line5.ttl");

pub const SH_PREFIXES: &str = "@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix ex: <http://example.org/> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
";

/// Prepend the common prefixes to a Turtle body.
pub fn with_prefixes(body: &str) -> String {
    format!("{SH_PREFIXES}{body}")
}

/// Build a document line by line so line numbers in assertions stay exact.
pub fn lines(lines: &[&str]) -> String {
    lines.join("\n")
}
