//! Domain Consistency Checking
//!
//! Heuristic rules over an already parsed document, keyed on the markers in
//! [`DomainVocabulary`]. Every rule is independent and appends zero or more
//! [`ConsistencyCheck`]s; only failing `error`/`warning` checks make a
//! document inconsistent.
//!
//! - Employment event type
//! - EMTAK classification presence and code format
//! - Entity mentions
//! - Provenance
//! - Date property (articles only)

use crate::config::DomainVocabulary;
use crate::graph::{Quad, TripleStore};
use crate::syntax::parse_store;
use crate::vocab::local_name;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Instant;

static EMTAK_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4,5}$").expect("EMTAK pattern is valid"));

pub const PARSE_ERROR_CHECK: &str = "Parse error";

// =============================================================================
// Checks
// =============================================================================

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CheckSeverity {
    Error,
    Warning,
    Info,
}

impl CheckSeverity {
    /// Whether a failing check of this severity makes the document inconsistent.
    pub fn is_blocking(&self) -> bool {
        matches!(self, CheckSeverity::Error | CheckSeverity::Warning)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyCheck {
    pub name: String,
    pub passed: bool,
    pub severity: CheckSeverity,
    pub message: String,
}

impl ConsistencyCheck {
    pub fn pass(
        name: impl Into<String>,
        severity: CheckSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            passed: true,
            severity,
            message: message.into(),
        }
    }

    pub fn fail(
        name: impl Into<String>,
        severity: CheckSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            passed: false,
            severity,
            message: message.into(),
        }
    }

    fn is_blocking_failure(&self) -> bool {
        !self.passed && self.severity.is_blocking()
    }
}

// =============================================================================
// Consistency Result
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyResult {
    consistent: bool,
    checks: Vec<ConsistencyCheck>,
    summary: String,
}

impl ConsistencyResult {
    pub fn new(checks: Vec<ConsistencyCheck>) -> Self {
        let failing = checks.iter().filter(|c| c.is_blocking_failure());
        let warnings = failing
            .clone()
            .filter(|c| c.severity == CheckSeverity::Warning)
            .count();
        let errors = failing
            .filter(|c| c.severity == CheckSeverity::Error)
            .count();
        let consistent = warnings + errors == 0;

        let summary = if consistent {
            format!("All {} checks passed", checks.len())
        } else {
            format!(
                "{} of {} checks failed ({} warnings, {} errors)",
                warnings + errors,
                checks.len(),
                warnings,
                errors
            )
        };

        Self {
            consistent,
            checks,
            summary,
        }
    }

    /// Single failing `error` check for a document that could not be parsed.
    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::new(vec![ConsistencyCheck::fail(
            PARSE_ERROR_CHECK,
            CheckSeverity::Error,
            message,
        )])
    }

    pub fn consistent(&self) -> bool {
        self.consistent
    }

    pub fn checks(&self) -> &[ConsistencyCheck] {
        &self.checks
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Checks with the given name, in rule order.
    pub fn checks_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ConsistencyCheck> {
        self.checks.iter().filter(move |c| c.name == name)
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &ConsistencyCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

// =============================================================================
// ConsistencyChecker
// =============================================================================

/// Runs the domain rules over one parsed document.
///
/// The raw text is kept alongside the store because the trigger conditions
/// look at prefix declarations and keywords, which do not survive parsing.
pub struct ConsistencyChecker<'a> {
    store: &'a TripleStore,
    text: &'a str,
    vocabulary: &'a DomainVocabulary,
    /// `emp:` as a whole word, compiled once per checker
    employment_prefix: Option<Regex>,
}

impl<'a> ConsistencyChecker<'a> {
    pub fn new(store: &'a TripleStore, text: &'a str, vocabulary: &'a DomainVocabulary) -> Self {
        Self {
            store,
            text,
            vocabulary,
            employment_prefix: prefix_pattern(&vocabulary.employment_prefix),
        }
    }

    pub fn check_all(&self) -> ConsistencyResult {
        let mut checks = Vec::new();
        self.check_employment_event(&mut checks);
        self.check_emtak_presence(&mut checks);
        self.check_emtak_format(&mut checks);
        self.check_entity_mentions(&mut checks);
        self.check_provenance(&mut checks);
        self.check_date_property(&mut checks);
        ConsistencyResult::new(checks)
    }

    /// Employment data must say what kind of employment event it records.
    pub fn check_employment_event(&self, checks: &mut Vec<ConsistencyCheck>) {
        let vocab = self.vocabulary;
        let mentions_employment = self
            .employment_prefix
            .as_ref()
            .is_some_and(|re| re.is_match(self.text))
            || contains_keyword(self.text, &vocab.employment_keywords);
        if !mentions_employment {
            return;
        }

        if self.any_predicate(|p| vocab.is_employment_event_predicate(p)) {
            checks.push(ConsistencyCheck::pass(
                "Employment event type",
                CheckSeverity::Info,
                "Employment event type is declared",
            ));
        } else {
            checks.push(ConsistencyCheck::fail(
                "Missing employment event type",
                CheckSeverity::Warning,
                "Document references employment data but declares no employment event type",
            ));
        }
    }

    pub fn check_emtak_presence(&self, checks: &mut Vec<ConsistencyCheck>) {
        let marker = &self.vocabulary.emtak_marker;
        if !contains_keyword(self.text, std::slice::from_ref(marker)) {
            return;
        }

        if self.any_predicate(|p| self.vocabulary.is_emtak_predicate(p)) {
            checks.push(ConsistencyCheck::pass(
                "EMTAK classification",
                CheckSeverity::Info,
                "EMTAK classification is present",
            ));
        } else {
            checks.push(ConsistencyCheck::fail(
                "Missing EMTAK classification",
                CheckSeverity::Warning,
                "Document mentions EMTAK but asserts no EMTAK classification",
            ));
        }
    }

    /// One check per EMTAK statement: the code is the last `/` or `#`
    /// segment of the object and must be 4 or 5 digits.
    pub fn check_emtak_format(&self, checks: &mut Vec<ConsistencyCheck>) {
        for quad in self
            .store
            .iter()
            .filter(|q| self.vocabulary.is_emtak_predicate(q.predicate_iri()))
        {
            let value = quad.object.lexical();
            let code = local_name(&value);
            if EMTAK_CODE_RE.is_match(code) {
                checks.push(ConsistencyCheck::pass(
                    "EMTAK format",
                    CheckSeverity::Info,
                    format!("EMTAK code {code} is well-formed"),
                ));
            } else {
                checks.push(ConsistencyCheck::fail(
                    "EMTAK format",
                    CheckSeverity::Warning,
                    format!("EMTAK code '{code}' must be 4 or 5 digits"),
                ));
            }
        }
    }

    pub fn check_entity_mentions(&self, checks: &mut Vec<ConsistencyCheck>) {
        let has_mentions = self.any_predicate(|p| self.vocabulary.is_mention_predicate(p));
        let check = if has_mentions {
            ConsistencyCheck::pass(
                "Entity mentions",
                CheckSeverity::Info,
                "Entity mentions are present",
            )
        } else if self.has_article() {
            ConsistencyCheck::pass(
                "Entity mentions",
                CheckSeverity::Info,
                "No entity mentions; acceptable for a plain article",
            )
        } else {
            ConsistencyCheck::fail(
                "Entity mentions",
                CheckSeverity::Info,
                "No entity mentions found",
            )
        };
        checks.push(check);
    }

    /// Informational: provenance is optional.
    pub fn check_provenance(&self, checks: &mut Vec<ConsistencyCheck>) {
        let mut found: Vec<&str> = self
            .store
            .distinct_predicates()
            .into_iter()
            .filter_map(|p| p.as_iri())
            .filter(|p| self.vocabulary.is_provenance_predicate(p))
            .map(local_name)
            .collect();
        found.sort_unstable();
        found.dedup();

        let message = if found.is_empty() {
            "No provenance statements; provenance is optional".to_string()
        } else {
            format!("Provenance recorded via {}", found.join(", "))
        };
        checks.push(ConsistencyCheck::pass("Provenance", CheckSeverity::Info, message));
    }

    /// Only articles are expected to carry a date.
    pub fn check_date_property(&self, checks: &mut Vec<ConsistencyCheck>) {
        if !self.has_article() {
            return;
        }

        if self.any_predicate(|p| self.vocabulary.is_date_predicate(p)) {
            checks.push(ConsistencyCheck::pass(
                "Date property",
                CheckSeverity::Info,
                "Article carries a date property",
            ));
        } else {
            checks.push(ConsistencyCheck::fail(
                "Date property",
                CheckSeverity::Warning,
                "Article has no date property (created, modified, date or generatedAtTime)",
            ));
        }
    }

    fn any_predicate(&self, mut predicate: impl FnMut(&str) -> bool) -> bool {
        self.store
            .distinct_predicates()
            .into_iter()
            .filter_map(|p| p.as_iri())
            .any(|p| predicate(p))
    }

    fn has_article(&self) -> bool {
        self.store
            .iter()
            .any(|q: &Quad| self.vocabulary.is_article_type(q))
    }
}

/// `prefix:` as a whole word.
fn prefix_pattern(prefix: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}:", regex::escape(prefix))).ok()
}

fn contains_keyword(text: &str, keywords: &[String]) -> bool {
    let text = text.to_ascii_lowercase();
    keywords
        .iter()
        .any(|keyword| text.contains(&keyword.to_ascii_lowercase()))
}

// =============================================================================
// Operations
// =============================================================================

/// Parse `text` and run every rule over it.
pub fn validate_consistency(text: &str, vocabulary: &DomainVocabulary) -> ConsistencyResult {
    let start = Instant::now();
    let _span = tracing::debug_span!("validate_consistency", bytes = text.len()).entered();

    match parse_store(text, "document") {
        Ok(store) => check_store(&store, text, vocabulary),
        Err(error) => {
            tracing::warn!(error = %error, "consistency check could not parse document");
            crate::metrics::METRICS.record_stage(
                "consistency",
                error.category().as_str(),
                start.elapsed(),
            );
            ConsistencyResult::parse_failure(error.to_string())
        }
    }
}

/// Run every rule over an already parsed document.
pub fn check_store(
    store: &TripleStore,
    text: &str,
    vocabulary: &DomainVocabulary,
) -> ConsistencyResult {
    let start = Instant::now();
    let result = ConsistencyChecker::new(store, text, vocabulary).check_all();

    tracing::debug!(
        consistent = result.consistent(),
        checks = result.checks().len(),
        "consistency check finished"
    );
    crate::metrics::METRICS.record_stage(
        "consistency",
        crate::metrics::outcome(result.consistent()),
        start.elapsed(),
    );
    crate::log_slow_stage!(start.elapsed(), 500, "consistency");
    result
}
