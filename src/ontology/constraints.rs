//! SHACL constraint components and per-value checks
//!
//! Constraints are compiled once while loading the shapes graph. Checks that
//! look at a single value live here; checks over the whole value set of a
//! path (cardinality, `sh:hasValue`, `sh:uniqueLang`, `sh:node`) are driven
//! by the validator because they need the full set or recurse into shapes.

use crate::error::{PipelineError, PipelineResult};
use crate::graph::{Literal, Term, TripleStore};
use crate::vocab::{
    XSD_BOOLEAN, XSD_DATE, XSD_DATE_TIME, XSD_DECIMAL, XSD_DOUBLE, XSD_INTEGER, XSD_NS, SH_NS,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::fmt;

static INTEGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("integer pattern is valid"));
static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("decimal pattern is valid"));

const NUMERIC_TYPES: [&str; 16] = [
    "integer",
    "decimal",
    "double",
    "float",
    "int",
    "long",
    "short",
    "byte",
    "nonNegativeInteger",
    "positiveInteger",
    "negativeInteger",
    "nonPositiveInteger",
    "unsignedInt",
    "unsignedLong",
    "unsignedShort",
    "unsignedByte",
];

// =============================================================================
// Paths
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathExpr {
    /// `sh:path ex:p`
    Predicate(String),
    /// `sh:path [ sh:inversePath ex:p ]`
    Inverse(String),
}

impl PathExpr {
    /// Value nodes reached from `focus` along this path, in document order.
    pub fn values<'a>(&self, data: &'a TripleStore, focus: &Term) -> Vec<&'a Term> {
        match self {
            PathExpr::Predicate(predicate) => data.objects(focus, predicate),
            PathExpr::Inverse(predicate) => data.subjects(predicate, focus),
        }
    }

    /// Predicate to list among a closed shape's allowed properties.
    pub fn forward_predicate(&self) -> Option<&str> {
        match self {
            PathExpr::Predicate(predicate) => Some(predicate),
            PathExpr::Inverse(_) => None,
        }
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathExpr::Predicate(predicate) => f.write_str(predicate),
            PathExpr::Inverse(predicate) => write!(f, "^{predicate}"),
        }
    }
}

// =============================================================================
// Node kinds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Iri,
    BlankNode,
    Literal,
    BlankNodeOrIri,
    BlankNodeOrLiteral,
    IriOrLiteral,
}

impl NodeKind {
    pub fn from_iri(iri: &str) -> Option<Self> {
        let local = iri.strip_prefix(SH_NS)?;
        match local {
            "IRI" => Some(NodeKind::Iri),
            "BlankNode" => Some(NodeKind::BlankNode),
            "Literal" => Some(NodeKind::Literal),
            "BlankNodeOrIRI" => Some(NodeKind::BlankNodeOrIri),
            "BlankNodeOrLiteral" => Some(NodeKind::BlankNodeOrLiteral),
            "IRIOrLiteral" => Some(NodeKind::IriOrLiteral),
            _ => None,
        }
    }

    pub fn matches(&self, term: &Term) -> bool {
        match self {
            NodeKind::Iri => term.is_iri(),
            NodeKind::BlankNode => term.is_blank_node(),
            NodeKind::Literal => term.is_literal(),
            NodeKind::BlankNodeOrIri => !term.is_literal(),
            NodeKind::BlankNodeOrLiteral => !term.is_iri(),
            NodeKind::IriOrLiteral => !term.is_blank_node(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            NodeKind::Iri => "sh:IRI",
            NodeKind::BlankNode => "sh:BlankNode",
            NodeKind::Literal => "sh:Literal",
            NodeKind::BlankNodeOrIri => "sh:BlankNodeOrIRI",
            NodeKind::BlankNodeOrLiteral => "sh:BlankNodeOrLiteral",
            NodeKind::IriOrLiteral => "sh:IRIOrLiteral",
        }
    }
}

// =============================================================================
// Constraint components
// =============================================================================

#[derive(Debug, Clone)]
pub enum Constraint {
    MinCount(usize),
    MaxCount(usize),
    Datatype(String),
    NodeKind(NodeKind),
    Class(String),
    MinInclusive(Literal),
    MaxInclusive(Literal),
    MinExclusive(Literal),
    MaxExclusive(Literal),
    Pattern {
        pattern: String,
        regex: Regex,
    },
    MinLength(usize),
    MaxLength(usize),
    In(Vec<Term>),
    HasValue(Term),
    UniqueLang,
    /// Values must conform to the referenced node shape
    Node(Term),
}

impl Constraint {
    /// Compile `sh:pattern` with its optional `sh:flags`.
    pub fn pattern(pattern: &str, flags: Option<&str>) -> PipelineResult<Self> {
        let mut builder = RegexBuilder::new(pattern);
        for flag in flags.unwrap_or_default().chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                _ => &mut builder,
            };
        }
        let regex = builder.build().map_err(|e| PipelineError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Constraint::Pattern {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Constraint component label reported on violations.
    pub fn component(&self) -> &'static str {
        match self {
            Constraint::MinCount(_) => "sh:MinCountConstraintComponent",
            Constraint::MaxCount(_) => "sh:MaxCountConstraintComponent",
            Constraint::Datatype(_) => "sh:DatatypeConstraintComponent",
            Constraint::NodeKind(_) => "sh:NodeKindConstraintComponent",
            Constraint::Class(_) => "sh:ClassConstraintComponent",
            Constraint::MinInclusive(_) => "sh:MinInclusiveConstraintComponent",
            Constraint::MaxInclusive(_) => "sh:MaxInclusiveConstraintComponent",
            Constraint::MinExclusive(_) => "sh:MinExclusiveConstraintComponent",
            Constraint::MaxExclusive(_) => "sh:MaxExclusiveConstraintComponent",
            Constraint::Pattern { .. } => "sh:PatternConstraintComponent",
            Constraint::MinLength(_) => "sh:MinLengthConstraintComponent",
            Constraint::MaxLength(_) => "sh:MaxLengthConstraintComponent",
            Constraint::In(_) => "sh:InConstraintComponent",
            Constraint::HasValue(_) => "sh:HasValueConstraintComponent",
            Constraint::UniqueLang => "sh:UniqueLangConstraintComponent",
            Constraint::Node(_) => "sh:NodeConstraintComponent",
        }
    }

    /// Check one value node. Returns the default failure message, or `None`
    /// when the value satisfies the constraint or the constraint is not a
    /// per-value one.
    pub fn check_value(&self, value: &Term, data: &TripleStore) -> Option<String> {
        match self {
            Constraint::Datatype(datatype) => check_datatype(value, datatype),
            Constraint::NodeKind(kind) => (!kind.matches(value))
                .then(|| format!("Value {value} is not of node kind {}", kind.label())),
            Constraint::Class(class) => (!data.is_instance_of(value, class))
                .then(|| format!("Value {value} must be an instance of <{class}>")),
            Constraint::MinInclusive(bound) => check_range(value, bound, "at least", |o| {
                o != Ordering::Less
            }),
            Constraint::MaxInclusive(bound) => check_range(value, bound, "at most", |o| {
                o != Ordering::Greater
            }),
            Constraint::MinExclusive(bound) => check_range(value, bound, "greater than", |o| {
                o == Ordering::Greater
            }),
            Constraint::MaxExclusive(bound) => check_range(value, bound, "less than", |o| {
                o == Ordering::Less
            }),
            Constraint::Pattern { pattern, regex } => match string_form(value) {
                Some(text) if regex.is_match(&text) => None,
                _ => Some(format!("Value {value} does not match pattern '{pattern}'")),
            },
            Constraint::MinLength(min) => match string_form(value) {
                Some(text) if text.chars().count() >= *min => None,
                _ => Some(format!("Value {value} is shorter than {min} characters")),
            },
            Constraint::MaxLength(max) => match string_form(value) {
                Some(text) if text.chars().count() <= *max => None,
                _ => Some(format!("Value {value} is longer than {max} characters")),
            },
            Constraint::In(allowed) => (!allowed.contains(value)).then(|| {
                let allowed: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
                format!("Value {value} is not one of: {}", allowed.join(", "))
            }),
            Constraint::MinCount(_)
            | Constraint::MaxCount(_)
            | Constraint::HasValue(_)
            | Constraint::UniqueLang
            | Constraint::Node(_) => None,
        }
    }
}

fn check_datatype(value: &Term, datatype: &str) -> Option<String> {
    let Some(literal) = value.as_literal() else {
        return Some(format!("Value {value} must be a literal with datatype <{datatype}>"));
    };
    if literal.datatype() != datatype {
        return Some(format!(
            "Value {value} must have datatype <{datatype}> but has <{}>",
            literal.datatype()
        ));
    }
    if !is_well_formed(literal.value(), datatype) {
        return Some(format!(
            "Value {value} is not a valid lexical form for <{datatype}>"
        ));
    }
    None
}

fn check_range(
    value: &Term,
    bound: &Literal,
    relation: &str,
    accept: impl Fn(Ordering) -> bool,
) -> Option<String> {
    let accepted = value
        .as_literal()
        .and_then(|literal| compare_literals(literal, bound))
        .is_some_and(accept);
    (!accepted).then(|| format!("Value {value} must be {relation} {}", bound.value()))
}

/// Lexical form used by string-based constraints. Blank nodes have none.
fn string_form(term: &Term) -> Option<String> {
    match term {
        Term::BlankNode(_) => None,
        other => Some(other.lexical()),
    }
}

pub fn is_numeric_datatype(datatype: &str) -> bool {
    datatype
        .strip_prefix(XSD_NS)
        .is_some_and(|local| NUMERIC_TYPES.contains(&local))
}

/// Order two literals. Numbers compare by value; other literals compare
/// lexically when they share a datatype. Incomparable pairs yield `None`.
pub fn compare_literals(value: &Literal, bound: &Literal) -> Option<Ordering> {
    if is_numeric_datatype(value.datatype()) && is_numeric_datatype(bound.datatype()) {
        let left: f64 = value.value().trim().parse().ok()?;
        let right: f64 = bound.value().trim().parse().ok()?;
        return left.partial_cmp(&right);
    }
    (value.datatype() == bound.datatype()).then(|| value.value().cmp(bound.value()))
}

/// Lexical well-formedness for the XSD types the engine knows about. Other
/// datatypes are accepted as-is.
pub fn is_well_formed(lexical: &str, datatype: &str) -> bool {
    match datatype {
        XSD_INTEGER => INTEGER_RE.is_match(lexical),
        XSD_DECIMAL => DECIMAL_RE.is_match(lexical),
        XSD_DOUBLE => {
            matches!(lexical, "INF" | "-INF" | "+INF" | "NaN") || lexical.parse::<f64>().is_ok()
        }
        XSD_BOOLEAN => matches!(lexical, "true" | "false" | "1" | "0"),
        XSD_DATE => NaiveDate::parse_from_str(strip_timezone(lexical), "%Y-%m-%d").is_ok(),
        XSD_DATE_TIME => {
            DateTime::parse_from_rfc3339(lexical).is_ok()
                || NaiveDateTime::parse_from_str(lexical, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        }
        _ => true,
    }
}

fn strip_timezone(lexical: &str) -> &str {
    if let Some(stripped) = lexical.strip_suffix('Z') {
        return stripped;
    }
    let bytes = lexical.as_bytes();
    if bytes.len() > 10 && matches!(bytes[bytes.len() - 6], b'+' | b'-') {
        return &lexical[..lexical.len() - 6];
    }
    lexical
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn typed(value: &str, datatype: &str) -> Term {
        Term::Literal(Literal::new(value, datatype))
    }

    #[test]
    fn lexical_forms() {
        assert!(is_well_formed("-42", XSD_INTEGER));
        assert!(!is_well_formed("4.2", XSD_INTEGER));
        assert!(is_well_formed(".5", XSD_DECIMAL));
        assert!(is_well_formed("NaN", XSD_DOUBLE));
        assert!(!is_well_formed("yes", XSD_BOOLEAN));
        assert!(is_well_formed("2024-02-29", XSD_DATE));
        assert!(is_well_formed("2024-02-29+02:00", XSD_DATE));
        assert!(!is_well_formed("2023-02-29", XSD_DATE));
        assert!(is_well_formed("2024-01-01T10:00:00Z", XSD_DATE_TIME));
        assert!(is_well_formed("2024-01-01T10:00:00", XSD_DATE_TIME));
        assert!(!is_well_formed("2024-01-01", XSD_DATE_TIME));
    }

    #[test]
    fn datatype_checks_type_and_lexical_form() {
        let store = TripleStore::default();
        let constraint = Constraint::Datatype(XSD_INTEGER.to_string());
        assert!(constraint.check_value(&typed("7", XSD_INTEGER), &store).is_none());
        assert!(constraint.check_value(&typed("seven", XSD_INTEGER), &store).is_some());
        assert!(constraint.check_value(&typed("7", XSD_DECIMAL), &store).is_some());
        assert!(constraint.check_value(&Term::iri("http://ex.org/7"), &store).is_some());
    }

    #[test]
    fn numeric_ranges_compare_across_numeric_types() {
        let store = TripleStore::default();
        let min = Constraint::MinInclusive(Literal::new("0", XSD_INTEGER));
        assert!(min.check_value(&typed("0.5", XSD_DECIMAL), &store).is_none());
        assert!(min.check_value(&typed("-1", XSD_INTEGER), &store).is_some());

        let max = Constraint::MaxExclusive(Literal::new("10", XSD_INTEGER));
        assert!(max.check_value(&typed("10", XSD_INTEGER), &store).is_some());
        // Strings never order against numbers
        assert!(max.check_value(&Term::Literal(Literal::simple("1")), &store).is_some());
    }

    #[test]
    fn pattern_honors_flags() {
        let store = TripleStore::default();
        let constraint = Constraint::pattern("^abc$", Some("i")).unwrap();
        assert!(constraint.check_value(&Term::Literal(Literal::simple("ABC")), &store).is_none());
        assert!(constraint.check_value(&Term::blank("b0"), &store).is_some());
        assert_matches!(
            Constraint::pattern("(", None),
            Err(PipelineError::InvalidPattern { .. })
        );
    }

    #[test]
    fn node_kinds() {
        assert!(NodeKind::BlankNodeOrIri.matches(&Term::blank("x")));
        assert!(!NodeKind::IriOrLiteral.matches(&Term::blank("x")));
        assert_eq!(
            NodeKind::from_iri("http://www.w3.org/ns/shacl#IRI"),
            Some(NodeKind::Iri)
        );
        assert_eq!(NodeKind::from_iri("http://www.w3.org/ns/shacl#Other"), None);
    }
}
