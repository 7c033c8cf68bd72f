//! Aggregated pipeline report

use crate::ontology::{ConsistencyResult, SemanticResult};
use crate::syntax::SyntaxResult;
use serde::{Deserialize, Serialize};

/// Where a document ended up after the pipeline ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    /// Syntax errors; nothing else ran
    Rejected,
    /// Parsed, but the shapes found blocking violations
    Nonconforming,
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullValidationResult {
    syntax_result: SyntaxResult,
    semantic_result: Option<SemanticResult>,
    consistency_result: Option<ConsistencyResult>,
    is_fully_valid: bool,
    summary: String,
}

impl FullValidationResult {
    /// Derives `is_fully_valid` and the summary from the stage results.
    /// Consistency findings are reported but never affect validity.
    pub fn new(
        syntax_result: SyntaxResult,
        semantic_result: Option<SemanticResult>,
        consistency_result: Option<ConsistencyResult>,
    ) -> Self {
        let is_fully_valid = syntax_result.is_valid()
            && semantic_result
                .as_ref()
                .is_none_or(SemanticResult::conforms);
        let summary = summarize(
            &syntax_result,
            semantic_result.as_ref(),
            consistency_result.as_ref(),
        );
        Self {
            syntax_result,
            semantic_result,
            consistency_result,
            is_fully_valid,
            summary,
        }
    }

    pub fn syntax_result(&self) -> &SyntaxResult {
        &self.syntax_result
    }

    pub fn semantic_result(&self) -> Option<&SemanticResult> {
        self.semantic_result.as_ref()
    }

    pub fn consistency_result(&self) -> Option<&ConsistencyResult> {
        self.consistency_result.as_ref()
    }

    pub fn is_fully_valid(&self) -> bool {
        self.is_fully_valid
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn outcome(&self) -> Outcome {
        if !self.syntax_result.is_valid() {
            Outcome::Rejected
        } else if self.is_fully_valid {
            Outcome::Accepted
        } else {
            Outcome::Nonconforming
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn summarize(
    syntax: &SyntaxResult,
    semantic: Option<&SemanticResult>,
    consistency: Option<&ConsistencyResult>,
) -> String {
    let stats = syntax.stats();
    let mut summary = if !syntax.is_valid() {
        format!(
            "Syntax validation failed with {} error(s)",
            syntax.errors().len()
        )
    } else if let Some(semantic) = semantic.filter(|s| !s.conforms()) {
        format!(
            "Syntax valid ({} triples) but semantic validation found {} violation(s)",
            stats.triple_count,
            semantic.violation_count()
        )
    } else {
        let mut accepted = format!(
            "Document is valid ({} triples, {} prefixes)",
            stats.triple_count, stats.prefix_count
        );
        if let Some(semantic) = semantic {
            accepted.push_str(&format!(
                ", conforms to {} shape(s)",
                semantic.shapes_used().len()
            ));
        }
        accepted
    };

    if let Some(consistency) = consistency {
        summary.push_str("; ");
        summary.push_str(consistency.summary());
    }
    summary
}
