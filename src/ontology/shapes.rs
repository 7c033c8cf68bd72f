//! Shape discovery and loading
//!
//! Walks a parsed shapes graph and compiles every node and property shape
//! into plain structs. Loading is strict: a constraint the evaluator cannot
//! honor fails the whole load instead of being skipped.

use super::constraints::{Constraint, NodeKind, PathExpr};
use super::shacl::Severity;
use crate::error::{PipelineError, PipelineResult};
use crate::graph::{Literal, Term, TripleStore};
use crate::vocab::{RDF_FIRST, RDF_NIL, RDF_REST, RDF_TYPE, RDFS_CLASS, sh};
use ahash::{AHashMap, AHashSet};

#[derive(Debug, Clone, Default)]
pub struct Targets {
    pub classes: Vec<String>,
    pub nodes: Vec<Term>,
    pub subjects_of: Vec<String>,
    pub objects_of: Vec<String>,
}

impl Targets {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.nodes.is_empty()
            && self.subjects_of.is_empty()
            && self.objects_of.is_empty()
    }

    /// Focus nodes selected in `data`, deduplicated, in discovery order.
    pub fn focus_nodes(&self, data: &TripleStore) -> Vec<Term> {
        let mut seen = AHashSet::new();
        let mut focus = Vec::new();
        let mut push = |term: &Term| {
            if seen.insert(term.clone()) {
                focus.push(term.clone());
            }
        };

        for class in &self.classes {
            data.instances_of(class).iter().for_each(&mut push);
        }
        self.nodes.iter().for_each(&mut push);
        for predicate in &self.subjects_of {
            let predicate = Term::iri(predicate.as_str());
            data.quads_for_pattern(None, Some(&predicate), None)
                .for_each(|q| push(&q.subject));
        }
        for predicate in &self.objects_of {
            let predicate = Term::iri(predicate.as_str());
            data.quads_for_pattern(None, Some(&predicate), None)
                .for_each(|q| push(&q.object));
        }
        focus
    }
}

#[derive(Debug, Clone)]
pub struct PropertyShape {
    pub id: Term,
    pub path: PathExpr,
    pub constraints: Vec<Constraint>,
    /// Falls back to the enclosing node shape when unset
    pub severity: Option<Severity>,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NodeShape {
    pub id: Term,
    pub targets: Targets,
    /// Value constraints applied to the focus node itself
    pub constraints: Vec<Constraint>,
    pub properties: Vec<PropertyShape>,
    /// Allowed predicates when the shape is `sh:closed true`
    pub closed: Option<AHashSet<String>>,
    pub severity: Severity,
    pub message: Option<String>,
}

/// Every shape compiled from one shapes graph.
#[derive(Debug, Clone, Default)]
pub struct ShapesGraph {
    shapes: Vec<NodeShape>,
    by_id: AHashMap<Term, usize>,
    top_level: Vec<usize>,
    deactivated: AHashSet<Term>,
}

impl ShapesGraph {
    pub fn load(graph: &TripleStore) -> PipelineResult<Self> {
        let loader = Loader { graph };
        let mut shapes_graph = ShapesGraph::default();

        let nested: AHashSet<&Term> = graph
            .quads_for_pattern(None, Some(&Term::iri(sh("property"))), None)
            .map(|q| &q.object)
            .collect();

        let mut top_level_ids = Vec::new();

        for class in ["NodeShape", "PropertyShape"] {
            for id in graph.subjects(RDF_TYPE, &Term::iri(sh(class))) {
                if !nested.contains(id) {
                    push_unique(&mut top_level_ids, id);
                }
            }
        }
        for target in ["targetClass", "targetNode", "targetSubjectsOf", "targetObjectsOf"] {
            let predicate = Term::iri(sh(target));
            for quad in graph.quads_for_pattern(None, Some(&predicate), None) {
                push_unique(&mut top_level_ids, &quad.subject);
            }
        }

        let mut referenced_ids = Vec::new();
        let node_predicate = Term::iri(sh("node"));
        for quad in graph.quads_for_pattern(None, Some(&node_predicate), None) {
            if !top_level_ids.contains(&quad.object) {
                push_unique(&mut referenced_ids, &quad.object);
            }
        }

        for (id, top_level) in top_level_ids
            .iter()
            .map(|id| (id, true))
            .chain(referenced_ids.iter().map(|id| (id, false)))
        {
            if loader.is_deactivated(id)? {
                tracing::debug!(shape = %id, "skipping deactivated shape");
                shapes_graph.deactivated.insert(id.clone());
                continue;
            }
            let shape = loader.load_shape(id)?;
            let idx = shapes_graph.shapes.len();
            shapes_graph.by_id.insert(id.clone(), idx);
            shapes_graph.shapes.push(shape);
            if top_level {
                shapes_graph.top_level.push(idx);
            }
        }

        tracing::debug!(
            shapes = shapes_graph.shapes.len(),
            top_level = shapes_graph.top_level.len(),
            deactivated = shapes_graph.deactivated.len(),
            "loaded shapes graph"
        );
        Ok(shapes_graph)
    }

    /// Active shapes that select their own focus nodes.
    pub fn top_level(&self) -> impl Iterator<Item = &NodeShape> {
        self.top_level.iter().map(|&idx| &self.shapes[idx])
    }

    pub fn get(&self, id: &Term) -> Option<&NodeShape> {
        self.by_id.get(id).map(|&idx| &self.shapes[idx])
    }

    pub fn is_deactivated(&self, id: &Term) -> bool {
        self.deactivated.contains(id)
    }
}

fn push_unique(ids: &mut Vec<Term>, term: &Term) {
    if !ids.contains(term) {
        ids.push(term.clone());
    }
}

struct Loader<'g> {
    graph: &'g TripleStore,
}

impl Loader<'_> {
    fn load_shape(&self, id: &Term) -> PipelineResult<NodeShape> {
        let targets = self.load_targets(id)?;
        let severity = self.severity(id)?;

        // A top-level property shape is evaluated as a node shape with a
        // single property.
        if self.graph.object(id, &sh("path")).is_some() {
            let property = self.load_property(id)?;
            return Ok(NodeShape {
                id: id.clone(),
                targets,
                constraints: Vec::new(),
                properties: vec![property],
                closed: None,
                severity: severity.unwrap_or_default(),
                message: None,
            });
        }

        let mut properties = Vec::new();
        for property_id in self.graph.objects(id, &sh("property")) {
            if self.is_deactivated(property_id)? {
                continue;
            }
            properties.push(self.load_property(property_id)?);
        }

        let closed = if self.boolean(id, "closed")?.unwrap_or(false) {
            let mut allowed: AHashSet<String> = properties
                .iter()
                .filter_map(|p| p.path.forward_predicate())
                .map(str::to_string)
                .collect();
            if let Some(head) = self.graph.object(id, &sh("ignoredProperties")) {
                for ignored in self.list(id, head)? {
                    allowed.insert(self.expect_iri(id, "ignoredProperties", &ignored)?);
                }
            }
            Some(allowed)
        } else {
            None
        };

        Ok(NodeShape {
            id: id.clone(),
            targets,
            constraints: self.load_value_constraints(id)?,
            properties,
            closed,
            severity: severity.unwrap_or_default(),
            message: self.message(id),
        })
    }

    fn load_targets(&self, id: &Term) -> PipelineResult<Targets> {
        let mut targets = Targets::default();
        for class in self.graph.objects(id, &sh("targetClass")) {
            targets
                .classes
                .push(self.expect_iri(id, "targetClass", class)?);
        }
        if id.is_iri() && self.graph.has_type(id, RDFS_CLASS) {
            targets.classes.push(id.lexical());
        }
        targets.nodes = self
            .graph
            .objects(id, &sh("targetNode"))
            .into_iter()
            .cloned()
            .collect();
        for predicate in self.graph.objects(id, &sh("targetSubjectsOf")) {
            targets
                .subjects_of
                .push(self.expect_iri(id, "targetSubjectsOf", predicate)?);
        }
        for predicate in self.graph.objects(id, &sh("targetObjectsOf")) {
            targets
                .objects_of
                .push(self.expect_iri(id, "targetObjectsOf", predicate)?);
        }
        Ok(targets)
    }

    fn load_property(&self, id: &Term) -> PipelineResult<PropertyShape> {
        let path = match self.graph.object(id, &sh("path")) {
            Some(path) => self.path(id, path)?,
            None => {
                return Err(PipelineError::malformed_shape(
                    id.to_string(),
                    "property shape has no sh:path",
                ));
            }
        };

        let mut constraints = Vec::new();
        if let Some(min) = self.count(id, "minCount")? {
            constraints.push(Constraint::MinCount(min));
        }
        if let Some(max) = self.count(id, "maxCount")? {
            constraints.push(Constraint::MaxCount(max));
        }
        if self.boolean(id, "uniqueLang")?.unwrap_or(false) {
            constraints.push(Constraint::UniqueLang);
        }
        constraints.extend(self.load_value_constraints(id)?);

        Ok(PropertyShape {
            id: id.clone(),
            path,
            constraints,
            severity: self.severity(id)?,
            message: self.message(id),
        })
    }

    /// Constraints shared by node and property shapes.
    fn load_value_constraints(&self, id: &Term) -> PipelineResult<Vec<Constraint>> {
        let mut constraints = Vec::new();

        for datatype in self.graph.objects(id, &sh("datatype")) {
            constraints.push(Constraint::Datatype(self.expect_iri(id, "datatype", datatype)?));
        }
        for kind in self.graph.objects(id, &sh("nodeKind")) {
            let kind = kind
                .as_iri()
                .and_then(NodeKind::from_iri)
                .ok_or_else(|| {
                    let message = format!("unknown sh:nodeKind {kind}");
                    PipelineError::malformed_shape(id.to_string(), message)
                })?;
            constraints.push(Constraint::NodeKind(kind));
        }
        for class in self.graph.objects(id, &sh("class")) {
            constraints.push(Constraint::Class(self.expect_iri(id, "class", class)?));
        }

        if let Some(bound) = self.bound(id, "minInclusive")? {
            constraints.push(Constraint::MinInclusive(bound));
        }
        if let Some(bound) = self.bound(id, "maxInclusive")? {
            constraints.push(Constraint::MaxInclusive(bound));
        }
        if let Some(bound) = self.bound(id, "minExclusive")? {
            constraints.push(Constraint::MinExclusive(bound));
        }
        if let Some(bound) = self.bound(id, "maxExclusive")? {
            constraints.push(Constraint::MaxExclusive(bound));
        }

        if let Some(pattern) = self.graph.object(id, &sh("pattern")) {
            let flags = self
                .graph
                .object(id, &sh("flags"))
                .and_then(Term::as_literal)
                .map(Literal::value);
            constraints.push(Constraint::pattern(&pattern.lexical(), flags)?);
        }
        if let Some(min) = self.count(id, "minLength")? {
            constraints.push(Constraint::MinLength(min));
        }
        if let Some(max) = self.count(id, "maxLength")? {
            constraints.push(Constraint::MaxLength(max));
        }

        if let Some(head) = self.graph.object(id, &sh("in")) {
            constraints.push(Constraint::In(self.list(id, head)?));
        }
        for value in self.graph.objects(id, &sh("hasValue")) {
            constraints.push(Constraint::HasValue(value.clone()));
        }
        for node in self.graph.objects(id, &sh("node")) {
            constraints.push(Constraint::Node(node.clone()));
        }

        Ok(constraints)
    }

    fn path(&self, shape: &Term, path: &Term) -> PipelineResult<PathExpr> {
        match path {
            Term::Iri(predicate) => Ok(PathExpr::Predicate(predicate.clone())),
            Term::BlankNode(_) => match self.graph.object(path, &sh("inversePath")) {
                Some(Term::Iri(predicate)) => Ok(PathExpr::Inverse(predicate.clone())),
                _ => Err(PipelineError::UnsupportedPath {
                    shape: shape.to_string(),
                }),
            },
            Term::Literal(_) => Err(PipelineError::malformed_shape(
                shape.to_string(),
                "sh:path must be an IRI or a path expression",
            )),
        }
    }

    /// Members of an RDF collection starting at `head`.
    fn list(&self, shape: &Term, head: &Term) -> PipelineResult<Vec<Term>> {
        let nil = Term::iri(RDF_NIL);
        let mut values = Vec::new();
        let mut visited = AHashSet::new();
        let mut current = head;

        while *current != nil {
            if !visited.insert(current) {
                return Err(PipelineError::malformed_shape(shape.to_string(), "cyclic RDF list"));
            }
            let first = self.graph.object(current, RDF_FIRST);
            let rest = self.graph.object(current, RDF_REST);
            match (first, rest) {
                (Some(first), Some(rest)) => {
                    values.push(first.clone());
                    current = rest;
                }
                _ => {
                    return Err(PipelineError::malformed_shape(
                        shape.to_string(),
                        format!("{current} is not a well-formed RDF list node"),
                    ));
                }
            }
        }
        Ok(values)
    }

    fn expect_iri(&self, shape: &Term, predicate: &str, value: &Term) -> PipelineResult<String> {
        value.as_iri().map(str::to_string).ok_or_else(|| {
            let message = format!("sh:{predicate} must be an IRI, found {value}");
            PipelineError::malformed_shape(shape.to_string(), message)
        })
    }

    fn count(&self, shape: &Term, predicate: &str) -> PipelineResult<Option<usize>> {
        self.graph
            .object(shape, &sh(predicate))
            .map(|value| {
                value.lexical().trim().parse::<usize>().map_err(|_| {
                    PipelineError::malformed_shape(
                        shape.to_string(),
                        format!("sh:{predicate} must be a non-negative integer, found {value}"),
                    )
                })
            })
            .transpose()
    }

    fn boolean(&self, shape: &Term, predicate: &str) -> PipelineResult<Option<bool>> {
        self.graph
            .object(shape, &sh(predicate))
            .map(|value| match value.lexical().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(PipelineError::malformed_shape(
                    shape.to_string(),
                    format!("sh:{predicate} must be a boolean, found {value}"),
                )),
            })
            .transpose()
    }

    fn bound(&self, shape: &Term, predicate: &str) -> PipelineResult<Option<Literal>> {
        self.graph
            .object(shape, &sh(predicate))
            .map(|value| {
                value.as_literal().cloned().ok_or_else(|| {
                    let message = format!("sh:{predicate} must be a literal");
                    PipelineError::malformed_shape(shape.to_string(), message)
                })
            })
            .transpose()
    }

    fn severity(&self, shape: &Term) -> PipelineResult<Option<Severity>> {
        self.graph
            .object(shape, &sh("severity"))
            .map(|value| {
                value.as_iri().map(Severity::from_iri).ok_or_else(|| {
                    PipelineError::malformed_shape(shape.to_string(), "sh:severity must be an IRI")
                })
            })
            .transpose()
    }

    fn message(&self, shape: &Term) -> Option<String> {
        self.graph
            .objects(shape, &sh("message"))
            .into_iter()
            .find_map(Term::as_literal)
            .map(|lit| lit.value().to_string())
    }

    fn is_deactivated(&self, shape: &Term) -> PipelineResult<bool> {
        Ok(self.boolean(shape, "deactivated")?.unwrap_or(false))
    }
}
