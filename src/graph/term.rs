//! Term and Quad model
//!
//! Normalized, owned representation of parsed RDF statements. Terms are
//! immutable values compared structurally; quads are produced by the parser
//! and never modified afterwards.

use crate::vocab::{RDF_LANG_STRING, XSD_STRING};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Literal
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    value: String,
    datatype: String,
    language: Option<String>,
}

impl Literal {
    pub fn new(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    pub fn simple(value: impl Into<String>) -> Self {
        Self::new(value, XSD_STRING)
    }

    pub fn language_tagged(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: RDF_LANG_STRING.to_string(),
            language: Some(language.into().to_ascii_lowercase()),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn datatype(&self) -> &str {
        &self.datatype
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.value.escape_default())?;
        match &self.language {
            Some(lang) => write!(f, "@{lang}"),
            None if self.datatype == XSD_STRING => Ok(()),
            None => write!(f, "^^<{}>", self.datatype),
        }
    }
}

// =============================================================================
// Term
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Term {
    Iri(String),
    BlankNode(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Term::BlankNode(id.into())
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// Plain string form: the IRI, `_:id`, or the literal's lexical value.
    pub fn lexical(&self) -> String {
        match self {
            Term::Iri(iri) => iri.clone(),
            Term::BlankNode(id) => format!("_:{id}"),
            Term::Literal(lit) => lit.value.clone(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::BlankNode(id) => write!(f, "_:{id}"),
            Term::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

impl From<oxigraph::model::Term> for Term {
    fn from(term: oxigraph::model::Term) -> Self {
        use oxigraph::model::Term as OxTerm;
        match term {
            OxTerm::NamedNode(node) => Term::Iri(node.into_string()),
            OxTerm::BlankNode(node) => Term::BlankNode(node.into_string()),
            OxTerm::Literal(lit) => {
                Term::Literal(Literal {
                    value: lit.value().to_string(),
                    datatype: lit.datatype().as_str().to_string(),
                    language: lit.language().map(str::to_string),
                })
            }
            // Quoted triples have no place in a plain Turtle document; keep their
            // serialization so they still participate in equality.
            #[allow(unreachable_patterns)]
            other => Term::Literal(Literal::simple(other.to_string())),
        }
    }
}

// =============================================================================
// Quad
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Option<Term>,
}

impl Quad {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: Term::Iri(predicate.into()),
            object,
            graph: None,
        }
    }

    /// Predicate IRI; the parser only ever produces IRI predicates.
    pub fn predicate_iri(&self) -> &str {
        self.predicate.as_iri().unwrap_or_default()
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(graph) = &self.graph {
            write!(f, " {graph}")?;
        }
        f.write_str(" .")
    }
}

impl From<oxigraph::model::Quad> for Quad {
    fn from(quad: oxigraph::model::Quad) -> Self {
        use oxigraph::model::GraphName;
        let subject: oxigraph::model::Term = quad.subject.into();
        let graph = match quad.graph_name {
            GraphName::DefaultGraph => None,
            GraphName::NamedNode(node) => Some(Term::Iri(node.into_string())),
            GraphName::BlankNode(node) => Some(Term::BlankNode(node.into_string())),
        };
        Self {
            subject: subject.into(),
            predicate: Term::Iri(quad.predicate.into_string()),
            object: quad.object.into(),
            graph,
        }
    }
}
