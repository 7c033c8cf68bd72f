//! In-memory triple store for a single document.
//!
//! The store is an append-only multiset: it is built once from the parsed
//! quads and then only queried. Duplicate statements are kept so that counts
//! reflect what the document actually asserted.

use super::term::{Quad, Term};
use crate::vocab::{RDF_TYPE, RDFS_SUB_CLASS_OF};
use ahash::{AHashMap, AHashSet};

#[derive(Debug, Clone, Default)]
pub struct TripleStore {
    quads: Vec<Quad>,
    by_subject: AHashMap<Term, Vec<usize>>,
    by_predicate: AHashMap<Term, Vec<usize>>,
    by_object: AHashMap<Term, Vec<usize>>,
}

impl TripleStore {
    pub fn from_quads(quads: Vec<Quad>) -> Self {
        let mut by_subject: AHashMap<Term, Vec<usize>> = AHashMap::new();
        let mut by_predicate: AHashMap<Term, Vec<usize>> = AHashMap::new();
        let mut by_object: AHashMap<Term, Vec<usize>> = AHashMap::new();

        for (idx, quad) in quads.iter().enumerate() {
            by_subject.entry(quad.subject.clone()).or_default().push(idx);
            by_predicate
                .entry(quad.predicate.clone())
                .or_default()
                .push(idx);
            by_object.entry(quad.object.clone()).or_default().push(idx);
        }

        Self {
            quads,
            by_subject,
            by_predicate,
            by_object,
        }
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    /// Pattern lookup; `None` positions are wildcards.
    ///
    /// The narrowest bound index drives the scan, remaining positions are
    /// filtered.
    pub fn quads_for_pattern<'a, 'p>(
        &'a self,
        subject: Option<&'p Term>,
        predicate: Option<&'p Term>,
        object: Option<&'p Term>,
    ) -> Box<dyn Iterator<Item = &'a Quad> + 'p>
    where
        'a: 'p,
    {
        let candidates = [
            subject.map(|s| self.by_subject.get(s)),
            predicate.map(|p| self.by_predicate.get(p)),
            object.map(|o| self.by_object.get(o)),
        ];

        // A bound term that was never indexed cannot match anything.
        if candidates.iter().any(|c| matches!(c, Some(None))) {
            return Box::new(std::iter::empty());
        }

        let narrowest = candidates
            .iter()
            .flatten()
            .flatten()
            .min_by_key(|ids| ids.len())
            .copied();

        let matches = move |quad: &&'a Quad| {
            subject.is_none_or(|s| &quad.subject == s)
                && predicate.is_none_or(|p| &quad.predicate == p)
                && object.is_none_or(|o| &quad.object == o)
        };

        match narrowest {
            Some(ids) => Box::new(ids.iter().map(|&idx| &self.quads[idx]).filter(matches)),
            None => Box::new(self.quads.iter()),
        }
    }

    pub fn contains(&self, subject: &Term, predicate: &Term, object: &Term) -> bool {
        self.quads_for_pattern(Some(subject), Some(predicate), Some(object))
            .next()
            .is_some()
    }

    /// Objects of `subject predicate ?o`, in document order.
    pub fn objects(&self, subject: &Term, predicate: &str) -> Vec<&Term> {
        let predicate = Term::iri(predicate);
        self.quads_for_pattern(Some(subject), Some(&predicate), None)
            .map(|q| &q.object)
            .collect()
    }

    pub fn object(&self, subject: &Term, predicate: &str) -> Option<&Term> {
        self.objects(subject, predicate).into_iter().next()
    }

    /// Subjects of `?s predicate object`, in document order.
    pub fn subjects(&self, predicate: &str, object: &Term) -> Vec<&Term> {
        let predicate = Term::iri(predicate);
        self.quads_for_pattern(None, Some(&predicate), Some(object))
            .map(|q| &q.subject)
            .collect()
    }

    pub fn has_predicate(&self, predicate: &str) -> bool {
        self.by_predicate.contains_key(&Term::iri(predicate))
    }

    pub fn distinct_subjects(&self) -> AHashSet<&Term> {
        self.by_subject.keys().collect()
    }

    pub fn distinct_predicates(&self) -> AHashSet<&Term> {
        self.by_predicate.keys().collect()
    }

    pub fn distinct_objects(&self) -> AHashSet<&Term> {
        self.by_object.keys().collect()
    }

    pub fn has_type(&self, node: &Term, class: &str) -> bool {
        self.contains(node, &Term::iri(RDF_TYPE), &Term::iri(class))
    }

    /// Instances of `class` or of any of its `rdfs:subClassOf` descendants.
    pub fn instances_of(&self, class: &str) -> Vec<Term> {
        let mut classes = vec![Term::iri(class)];
        let mut seen: AHashSet<Term> = classes.iter().cloned().collect();
        let mut idx = 0;
        while idx < classes.len() {
            for sub in self.subjects(RDFS_SUB_CLASS_OF, &classes[idx]) {
                if seen.insert(sub.clone()) {
                    classes.push(sub.clone());
                }
            }
            idx += 1;
        }

        let mut instances = Vec::new();
        let mut emitted = AHashSet::new();
        for class in &classes {
            for node in self.subjects(RDF_TYPE, class) {
                if emitted.insert(node.clone()) {
                    instances.push(node.clone());
                }
            }
        }
        instances
    }

    /// Whether `node` is typed as `class` directly or through a subclass.
    pub fn is_instance_of(&self, node: &Term, class: &str) -> bool {
        self.instances_of(class).contains(node)
    }
}

impl FromIterator<Quad> for TripleStore {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        Self::from_quads(iter.into_iter().collect())
    }
}
