//! SHACL (Shapes Constraint Language) Validation
//!
//! Validates a data graph against the shapes declared in a second Turtle
//! document. Shapes are compiled once by [`ShapesGraph::load`]; the
//! [`ShapeValidator`] then walks every active top-level shape, selects its
//! focus nodes and checks each constraint component.
//!
//! Setup failures never escape: a data or shapes graph that does not parse,
//! a malformed shape, or an invalid `sh:pattern` all turn into a single
//! synthetic violation on an otherwise normal [`SemanticResult`].
//!
//! # Example
//!
//! ```rust,ignore
//! use rdf_validation_pipeline::ontology::shacl::validate_semantics;
//!
//! let result = validate_semantics(data, shapes, &SemanticConfig::default());
//! if !result.conforms() {
//!     for violation in result.violations() {
//!         println!("{}: {}", violation.focus_node, violation.message);
//!     }
//! }
//! ```

use super::constraints::Constraint;
use super::shapes::{NodeShape, PropertyShape, ShapesGraph};
use crate::config::SemanticConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::graph::{Term, TripleStore};
use crate::syntax::{is_blank, parse_store};
use crate::vocab::{SH_NS, sh};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// `source_shape` of the synthetic violation reported for setup failures
pub const INTERNAL_SHAPE: &str = "internal";
/// `focus_node` of the synthetic violation reported for setup failures
pub const INTERNAL_FOCUS_NODE: &str = "validation-process";

// =============================================================================
// Severity Levels
// =============================================================================

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum Severity {
    Info,
    Warning,
    #[default]
    Violation,
}

impl Severity {
    /// Unknown severities are treated as the most severe.
    pub fn from_iri(iri: &str) -> Self {
        match iri.strip_prefix(SH_NS) {
            Some("Info") => Severity::Info,
            Some("Warning") => Severity::Warning,
            _ => Severity::Violation,
        }
    }

    pub fn to_iri(&self) -> String {
        sh(self.as_ref())
    }
}

// =============================================================================
// Violations
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShaclViolation {
    /// The node that failed the constraint
    pub focus_node: String,
    /// The property path, absent for node-level constraints
    pub path: Option<String>,
    /// The offending value
    pub value: Option<String>,
    pub message: String,
    pub severity: Severity,
    /// The shape the constraint belongs to
    pub source_shape: String,
    /// The constraint component, e.g. `sh:MinCountConstraintComponent`
    pub source_constraint: Option<String>,
}

impl ShaclViolation {
    pub fn new(
        focus_node: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        source_shape: impl Into<String>,
    ) -> Self {
        Self {
            focus_node: focus_node.into(),
            path: None,
            value: None,
            message: message.into(),
            severity,
            source_shape: source_shape.into(),
            source_constraint: None,
        }
    }

    /// Stand-in for a validation run that could not be set up.
    pub fn internal(error: &PipelineError) -> Self {
        Self::new(
            INTERNAL_FOCUS_NODE,
            format!("Validation error: {error}"),
            Severity::Violation,
            INTERNAL_SHAPE,
        )
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.source_constraint = Some(constraint.into());
        self
    }

    pub fn is_internal(&self) -> bool {
        self.source_shape == INTERNAL_SHAPE
    }
}

// =============================================================================
// Semantic Result
// =============================================================================

/// Outcome of one semantic validation run.
///
/// `conforms` is derived from the violations and kept in sync by every
/// mutation; it is false exactly when some entry has [`Severity::Violation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticResult {
    conforms: bool,
    violations: Vec<ShaclViolation>,
    shapes_used: Vec<String>,
}

impl SemanticResult {
    pub fn new(violations: Vec<ShaclViolation>, shapes_used: Vec<String>) -> Self {
        let conforms = !violations.iter().any(|v| v.severity == Severity::Violation);
        Self {
            conforms,
            violations,
            shapes_used,
        }
    }

    pub fn internal_failure(error: &PipelineError) -> Self {
        tracing::warn!(
            category = %error.category(),
            error = %error,
            "semantic validation could not run"
        );
        Self::new(vec![ShaclViolation::internal(error)], Vec::new())
    }

    pub fn push(&mut self, violation: ShaclViolation) {
        if violation.severity == Severity::Violation {
            self.conforms = false;
        }
        self.violations.push(violation);
    }

    pub fn conforms(&self) -> bool {
        self.conforms
    }

    pub fn violations(&self) -> &[ShaclViolation] {
        &self.violations
    }

    pub fn shapes_used(&self) -> &[String] {
        &self.shapes_used
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }

    pub fn violation_count(&self) -> usize {
        self.count_by_severity(Severity::Violation)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// =============================================================================
// Shape Validator
// =============================================================================

pub struct ShapeValidator {
    shapes: ShapesGraph,
    max_node_depth: usize,
}

impl ShapeValidator {
    pub fn new(shapes: ShapesGraph, config: &SemanticConfig) -> Self {
        Self {
            shapes,
            max_node_depth: config.max_node_depth,
        }
    }

    /// Compile the shapes declared in a Turtle document. A blank document
    /// declares no shapes.
    pub fn from_turtle(shapes_text: &str, config: &SemanticConfig) -> PipelineResult<Self> {
        if is_blank(shapes_text) {
            return Ok(Self::new(ShapesGraph::default(), config));
        }
        let graph = parse_store(shapes_text, "shapes graph")?;
        Ok(Self::new(ShapesGraph::load(&graph)?, config))
    }

    /// Identifiers of the active top-level shapes.
    pub fn shape_ids(&self) -> Vec<String> {
        self.shapes.top_level().map(|s| s.id.lexical()).collect()
    }

    /// Validate every focus node of every top-level shape.
    pub fn validate(&self, data: &TripleStore) -> SemanticResult {
        let mut violations = Vec::new();
        for shape in self.shapes.top_level() {
            let focus_nodes = shape.targets.focus_nodes(data);
            tracing::trace!(shape = %shape.id, focus_nodes = focus_nodes.len(), "evaluating shape");
            for focus in &focus_nodes {
                self.validate_node(data, shape, focus, 0, &mut violations);
            }
        }
        SemanticResult::new(violations, self.shape_ids())
    }

    fn validate_node(
        &self,
        data: &TripleStore,
        shape: &NodeShape,
        focus: &Term,
        depth: usize,
        out: &mut Vec<ShaclViolation>,
    ) {
        let source_shape = shape.id.lexical();
        let node_violation = |constraint: &Constraint, default_message: String| {
            ShaclViolation::new(
                focus.lexical(),
                shape.message.clone().unwrap_or(default_message),
                shape.severity,
                source_shape.clone(),
            )
            .with_value(focus.to_string())
            .with_constraint(constraint.component())
        };

        for constraint in &shape.constraints {
            let failure = match constraint {
                Constraint::HasValue(expected) => {
                    (focus != expected).then(|| format!("Node must be {expected}"))
                }
                Constraint::Node(reference) => (!self.conforms_to(data, reference, focus, depth))
                    .then(|| format!("Node does not conform to shape {reference}")),
                other => other.check_value(focus, data),
            };
            if let Some(message) = failure {
                out.push(node_violation(constraint, message));
            }
        }

        for property in &shape.properties {
            self.validate_property(data, shape, property, focus, depth, out);
        }

        if let Some(allowed) = &shape.closed {
            for quad in data.quads_for_pattern(Some(focus), None, None) {
                let predicate = quad.predicate_iri();
                if allowed.contains(predicate) {
                    continue;
                }
                let message = shape.message.clone().unwrap_or_else(|| {
                    format!("Predicate {predicate} is not allowed by closed shape {source_shape}")
                });
                out.push(
                    ShaclViolation::new(
                        focus.lexical(),
                        message,
                        shape.severity,
                        source_shape.clone(),
                    )
                    .with_path(predicate)
                    .with_value(quad.object.to_string())
                    .with_constraint("sh:ClosedConstraintComponent"),
                );
            }
        }
    }

    fn validate_property(
        &self,
        data: &TripleStore,
        shape: &NodeShape,
        property: &PropertyShape,
        focus: &Term,
        depth: usize,
        out: &mut Vec<ShaclViolation>,
    ) {
        let values = property.path.values(data, focus);
        let path = property.path.to_string();
        let severity = property.severity.unwrap_or(shape.severity);
        let violation = |constraint: &Constraint, default_message: String, value: Option<&Term>| {
            let violation = ShaclViolation::new(
                focus.lexical(),
                property.message.clone().unwrap_or(default_message),
                severity,
                shape.id.lexical(),
            )
            .with_path(path.clone())
            .with_constraint(constraint.component());
            match value {
                Some(value) => violation.with_value(value.to_string()),
                None => violation,
            }
        };

        for constraint in &property.constraints {
            match constraint {
                Constraint::MinCount(min) if values.len() < *min => out.push(violation(
                    constraint,
                    format!(
                        "Property {path} must have at least {min} value(s), found {}",
                        values.len()
                    ),
                    None,
                )),
                Constraint::MaxCount(max) if values.len() > *max => out.push(violation(
                    constraint,
                    format!(
                        "Property {path} must have at most {max} value(s), found {}",
                        values.len()
                    ),
                    None,
                )),
                Constraint::MinCount(_) | Constraint::MaxCount(_) => {}
                Constraint::HasValue(expected) => {
                    if !values.contains(&expected) {
                        out.push(violation(
                            constraint,
                            format!("Property {path} must have value {expected}"),
                            None,
                        ));
                    }
                }
                Constraint::UniqueLang => {
                    let mut seen: AHashMap<&str, usize> = AHashMap::new();
                    for lang in values
                        .iter()
                        .filter_map(|v| v.as_literal().and_then(|lit| lit.language()))
                    {
                        *seen.entry(lang).or_default() += 1;
                    }
                    let mut duplicated: Vec<&str> = seen
                        .into_iter()
                        .filter(|(_, count)| *count > 1)
                        .map(|(lang, _)| lang)
                        .collect();
                    duplicated.sort_unstable();
                    for lang in duplicated {
                        out.push(violation(
                            constraint,
                            format!("Language tag '{lang}' is used more than once on {path}"),
                            None,
                        ));
                    }
                }
                Constraint::Node(reference) => {
                    for value in &values {
                        if !self.conforms_to(data, reference, value, depth) {
                            out.push(violation(
                                constraint,
                                format!("Value {value} does not conform to shape {reference}"),
                                Some(value),
                            ));
                        }
                    }
                }
                other => {
                    for value in &values {
                        if let Some(message) = other.check_value(value, data) {
                            out.push(violation(constraint, message, Some(value)));
                        }
                    }
                }
            }
        }
    }

    /// `sh:node` check: the value conforms when validating it against the
    /// referenced shape yields no results at all.
    fn conforms_to(
        &self,
        data: &TripleStore,
        reference: &Term,
        value: &Term,
        depth: usize,
    ) -> bool {
        if self.shapes.is_deactivated(reference) {
            return true;
        }
        if depth >= self.max_node_depth {
            tracing::warn!(
                shape = %reference,
                depth,
                "sh:node recursion limit reached, treating value as conforming"
            );
            return true;
        }
        let Some(shape) = self.shapes.get(reference) else {
            tracing::warn!(shape = %reference, "sh:node references an unknown shape");
            return true;
        };
        let mut nested = Vec::new();
        self.validate_node(data, shape, value, depth + 1, &mut nested);
        nested.is_empty()
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Parse both documents and validate the data graph against the shapes.
pub fn validate_semantics(
    text: &str,
    shapes_text: &str,
    config: &SemanticConfig,
) -> SemanticResult {
    let start = Instant::now();
    let _span = tracing::debug_span!("validate_semantics", bytes = text.len()).entered();

    match parse_store(text, "data graph") {
        Ok(data) => validate_store(&data, shapes_text, config),
        Err(error) => {
            crate::metrics::METRICS.record_stage(
                "semantic",
                error.category().as_str(),
                start.elapsed(),
            );
            SemanticResult::internal_failure(&error)
        }
    }
}

/// Validate an already parsed data graph against the shapes document.
pub fn validate_store(
    data: &TripleStore,
    shapes_text: &str,
    config: &SemanticConfig,
) -> SemanticResult {
    let start = Instant::now();

    let validator = match ShapeValidator::from_turtle(shapes_text, config) {
        Ok(validator) => validator,
        Err(error) => {
            crate::metrics::METRICS.record_stage(
                "semantic",
                error.category().as_str(),
                start.elapsed(),
            );
            return SemanticResult::internal_failure(&error);
        }
    };

    let result = validator.validate(data);
    tracing::debug!(
        conforms = result.conforms(),
        violations = result.violations().len(),
        shapes = result.shapes_used().len(),
        "semantic validation finished"
    );
    crate::metrics::METRICS.record_stage(
        "semantic",
        crate::metrics::outcome(result.conforms()),
        start.elapsed(),
    );
    crate::log_slow_stage!(start.elapsed(), 500, "semantic");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIXES: &str = "@prefix sh: <http://www.w3.org/ns/shacl#> .\n\
                            @prefix ex: <http://example.org/> .\n\
                            @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n";

    fn validate(data: &str, shapes: &str) -> SemanticResult {
        validate_semantics(
            &format!("{PREFIXES}{data}"),
            &format!("{PREFIXES}{shapes}"),
            &SemanticConfig::default(),
        )
    }

    #[test]
    fn test_severity_conversion() {
        let iri = Severity::Warning.to_iri();
        assert_eq!(iri, "http://www.w3.org/ns/shacl#Warning");
        assert_eq!(Severity::from_iri(&iri), Severity::Warning);
        assert_eq!(Severity::from_iri("http://example.org/Other"), Severity::Violation);
        assert_eq!(Severity::default(), Severity::Violation);
    }

    #[test]
    fn conformance_ignores_warnings() {
        let warning = ShaclViolation::new("ex:a", "soft", Severity::Warning, "ex:S");
        let mut result = SemanticResult::new(vec![warning], Vec::new());
        assert!(result.conforms());

        result.push(ShaclViolation::new("ex:a", "hard", Severity::Violation, "ex:S"));
        assert!(!result.conforms());
        assert_eq!(result.violation_count(), 1);
        assert_eq!(result.count_by_severity(Severity::Warning), 1);
    }

    #[test]
    fn min_count_violation_names_the_path() {
        let result = validate(
            "ex:alice a ex:Person .",
            "ex:PersonShape a sh:NodeShape ; sh:targetClass ex:Person ;
                 sh:property [ sh:path ex:name ; sh:minCount 1 ] .",
        );
        assert!(!result.conforms());
        assert_eq!(result.shapes_used(), ["http://example.org/PersonShape"]);
        let violation = &result.violations()[0];
        assert_eq!(violation.focus_node, "http://example.org/alice");
        assert_eq!(violation.path.as_deref(), Some("http://example.org/name"));
        assert_eq!(
            violation.source_constraint.as_deref(),
            Some("sh:MinCountConstraintComponent")
        );
    }

    #[test]
    fn property_severity_overrides_shape_severity() {
        let result = validate(
            "ex:alice a ex:Person .",
            "ex:PersonShape a sh:NodeShape ; sh:targetClass ex:Person ; sh:severity sh:Violation ;
                 sh:property [ sh:path ex:email ; sh:minCount 1 ; sh:severity sh:Warning ;
                               sh:message \"add an email\" ] .",
        );
        assert!(result.conforms());
        assert_eq!(result.violations()[0].severity, Severity::Warning);
        assert_eq!(result.violations()[0].message, "add an email");
    }

    #[test]
    fn subclass_instances_are_targeted() {
        let result = validate(
            "ex:Employee <http://www.w3.org/2000/01/rdf-schema#subClassOf> ex:Person .
             ex:bob a ex:Employee ; ex:age \"old\" .",
            "ex:PersonShape a sh:NodeShape ; sh:targetClass ex:Person ;
                 sh:property [ sh:path ex:age ; sh:datatype xsd:integer ] .",
        );
        assert_eq!(result.violation_count(), 1);
        assert_eq!(result.violations()[0].focus_node, "http://example.org/bob");
    }

    #[test]
    fn nested_node_shapes_are_checked() {
        let result = validate(
            "ex:acme ex:ceo ex:carol .",
            "ex:CompanyShape a sh:NodeShape ; sh:targetSubjectsOf ex:ceo ;
                 sh:property [ sh:path ex:ceo ; sh:node ex:PersonShape ] .
             ex:PersonShape a sh:NodeShape ;
                 sh:property [ sh:path ex:name ; sh:minCount 1 ] .",
        );
        assert!(!result.conforms());
        assert!(
            result
                .violations()
                .iter()
                .any(|v| v.source_constraint.as_deref() == Some("sh:NodeConstraintComponent"))
        );
    }

    #[test]
    fn recursive_node_references_terminate() {
        let result = validate(
            "ex:a ex:next ex:a .",
            "ex:LoopShape a sh:NodeShape ; sh:targetNode ex:a ;
                 sh:property [ sh:path ex:next ; sh:node ex:LoopShape ] .",
        );
        assert!(result.conforms());
    }

    #[test]
    fn closed_shapes_reject_extra_predicates() {
        let result = validate(
            "ex:a a ex:T ; ex:p 1 ; ex:extra 2 .",
            "ex:S a sh:NodeShape ; sh:targetClass ex:T ; sh:closed true ;
                 sh:ignoredProperties ( <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> ) ;
                 sh:property [ sh:path ex:p ] .",
        );
        assert_eq!(result.violation_count(), 1);
        assert_eq!(result.violations()[0].path.as_deref(), Some("http://example.org/extra"));
    }

    #[test]
    fn malformed_shapes_become_internal_violation() {
        let shapes = "ex:S a sh:NodeShape ; sh:targetClass ex:T ; \
                      sh:property [ sh:path ex:p ; sh:pattern \"(\" ] .";
        let result = validate("ex:a a ex:T .", shapes);
        assert!(!result.conforms());
        assert_eq!(result.violations().len(), 1);
        let violation = &result.violations()[0];
        assert!(violation.is_internal());
        assert_eq!(violation.focus_node, INTERNAL_FOCUS_NODE);
        assert!(violation.message.contains("invalid pattern"));
    }

    #[test]
    fn unparseable_data_becomes_internal_violation() {
        let result = validate_semantics("ex:a ex:b", PREFIXES, &SemanticConfig::default());
        assert!(!result.conforms());
        assert!(result.violations()[0].is_internal());
    }
}
