//! Advisory checks run after a parse. They never affect validity.

use crate::config::DomainVocabulary;
use crate::graph::Quad;
use crate::vocab::{XSD_DATE, XSD_DATE_TIME};
use std::collections::BTreeMap;

pub fn collect_warnings(
    quads: &[Quad],
    prefixes: &BTreeMap<String, String>,
    vocabulary: &DomainVocabulary,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if prefixes.contains_key(&vocabulary.article_prefix)
        && !quads.iter().any(|q| vocabulary.is_article_type(q))
    {
        warnings.push(format!(
            "Prefix '{}:' is declared but no resource is typed as {}",
            vocabulary.article_prefix, vocabulary.article_class
        ));
    }

    let provenance_marker = vocabulary.provenance_marker.to_ascii_lowercase();
    if prefixes.contains_key(&vocabulary.provenance_prefix)
        && !quads
            .iter()
            .any(|q| q.predicate_iri().to_ascii_lowercase().contains(&provenance_marker))
    {
        warnings.push(format!(
            "Prefix '{}:' is declared but no provenance statements were found",
            vocabulary.provenance_prefix
        ));
    }

    let mut date_values = quads
        .iter()
        .filter(|q| vocabulary.is_date_predicate(q.predicate_iri()))
        .peekable();
    if date_values.peek().is_some()
        && !date_values.any(|q| {
            q.object
                .as_literal()
                .is_some_and(|lit| lit.datatype() == XSD_DATE || lit.datatype() == XSD_DATE_TIME)
        })
    {
        warnings.push(
            "Date properties are present but none is typed as xsd:date or xsd:dateTime"
                .to_string(),
        );
    }

    warnings
}
