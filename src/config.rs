use crate::graph::Quad;
use crate::vocab::{RDF_TYPE, local_name};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

const DEFAULT_CONTEXT_LINES: usize = 3;
const DEFAULT_MAX_ERRORS: usize = 100;
const DEFAULT_MAX_NODE_DEPTH: usize = 8;

pub const CONFIG_PATH_ENV: &str = "RDF_VALIDATOR_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    /// Source lines included in an error's context snippet
    pub context_lines: usize,
    /// Parsing stops once this many errors were collected
    pub max_errors: usize,
    /// Run the advisory warning pass
    pub emit_warnings: bool,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
            max_errors: DEFAULT_MAX_ERRORS,
            emit_warnings: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// Recursion bound for sh:node references
    pub max_node_depth: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            max_node_depth: DEFAULT_MAX_NODE_DEPTH,
        }
    }
}

/// Markers the warning pass and the consistency rules look for.
///
/// Matching is textual: prefixes are compared against `@prefix`/`PREFIX`
/// declarations, markers against lowercased predicate IRIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainVocabulary {
    pub article_prefix: String,
    pub article_class: String,
    pub provenance_prefix: String,
    pub provenance_marker: String,
    pub provenance_predicates: Vec<String>,
    pub employment_prefix: String,
    pub employment_keywords: Vec<String>,
    pub employment_event_predicates: Vec<String>,
    pub emtak_marker: String,
    pub mention_markers: Vec<String>,
    pub date_predicates: Vec<String>,
}

impl Default for DomainVocabulary {
    fn default() -> Self {
        Self {
            article_prefix: "art".to_string(),
            article_class: "Article".to_string(),
            provenance_prefix: "prov".to_string(),
            provenance_marker: "prov".to_string(),
            provenance_predicates: to_strings(&[
                "wasGeneratedBy",
                "generatedAtTime",
                "wasAttributedTo",
                "wasDerivedFrom",
            ]),
            employment_prefix: "emp".to_string(),
            employment_keywords: to_strings(&["employment"]),
            employment_event_predicates: to_strings(&["eventtype", "employmentevent"]),
            emtak_marker: "emtak".to_string(),
            mention_markers: to_strings(&["mention"]),
            date_predicates: to_strings(&["created", "modified", "date", "generatedAtTime"]),
        }
    }
}

impl DomainVocabulary {
    /// `rdf:type` statement whose class local name is the article class.
    pub fn is_article_type(&self, quad: &Quad) -> bool {
        quad.predicate_iri() == RDF_TYPE
            && quad
                .object
                .as_iri()
                .is_some_and(|class| local_name(class) == self.article_class)
    }

    /// A listed date predicate, or a local name with `date` as one of its
    /// camel-case or `_`/`-` separated words (`datePublished`, `birth_date`).
    pub fn is_date_predicate(&self, predicate: &str) -> bool {
        let local = local_name(predicate);
        self.date_predicates
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(local))
            || name_words(local).any(|word| word.eq_ignore_ascii_case("date"))
    }

    pub fn is_provenance_predicate(&self, predicate: &str) -> bool {
        let local = local_name(predicate);
        self.provenance_predicates
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(local))
    }

    pub fn is_employment_event_predicate(&self, predicate: &str) -> bool {
        contains_any(predicate, &self.employment_event_predicates)
    }

    pub fn is_emtak_predicate(&self, predicate: &str) -> bool {
        predicate.to_ascii_lowercase().contains(&self.emtak_marker.to_ascii_lowercase())
    }

    pub fn is_mention_predicate(&self, predicate: &str) -> bool {
        contains_any(local_name(predicate), &self.mention_markers)
    }
}

/// Splits `datePublished` into `date`, `Published`, and `birth_date` into
/// `birth`, `date`.
fn name_words(name: &str) -> impl Iterator<Item = &str> {
    name.split(['_', '-']).flat_map(|part| {
        let mut starts: Vec<usize> = part
            .char_indices()
            .filter(|(idx, c)| *idx > 0 && c.is_ascii_uppercase())
            .map(|(idx, _)| idx)
            .collect();
        starts.insert(0, 0);
        starts.push(part.len());
        starts
            .windows(2)
            .map(|bounds| &part[bounds[0]..bounds[1]])
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
    })
}

fn contains_any(haystack: &str, markers: &[String]) -> bool {
    let haystack = haystack.to_ascii_lowercase();
    markers
        .iter()
        .any(|marker| haystack.contains(&marker.to_ascii_lowercase()))
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub syntax: SyntaxConfig,
    pub semantic: SemanticConfig,
    pub vocabulary: DomainVocabulary,
}

impl ValidatorConfig {
    /// Load from a YAML or JSON file, chosen by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("config file {:?} does not exist", path);
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        let ext = path
            .extension()
            .and_then(|os| os.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let config: Self = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("failed to parse YAML config {:?}", path))?,
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse JSON config {:?}", path))?,
            other => anyhow::bail!("unsupported config extension: {other}"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Defaults, optionally loaded from `RDF_VALIDATOR_CONFIG`, then overridden
    /// by individual environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Some(lines) = env_parse::<usize>("RDF_VALIDATOR_CONTEXT_LINES")? {
            config.syntax.context_lines = lines;
        }
        if let Some(max) = env_parse::<usize>("RDF_VALIDATOR_MAX_ERRORS")? {
            config.syntax.max_errors = max;
        }
        if let Some(emit) = env_parse::<bool>("RDF_VALIDATOR_EMIT_WARNINGS")? {
            config.syntax.emit_warnings = emit;
        }
        if let Some(depth) = env_parse::<usize>("RDF_VALIDATOR_MAX_NODE_DEPTH")? {
            config.semantic.max_node_depth = depth;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.syntax.context_lines > 0,
            "syntax.context_lines must be at least 1"
        );
        anyhow::ensure!(
            self.syntax.max_errors > 0,
            "syntax.max_errors must be at least 1"
        );
        anyhow::ensure!(
            self.semantic.max_node_depth > 0,
            "semantic.max_node_depth must be at least 1"
        );
        Ok(())
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Term;

    #[test]
    fn date_predicates_match_local_names() {
        let vocab = DomainVocabulary::default();
        assert!(vocab.is_date_predicate("http://purl.org/dc/terms/created"));
        assert!(vocab.is_date_predicate("http://www.w3.org/ns/prov#generatedAtTime"));
        assert!(vocab.is_date_predicate("http://schema.org/datePublished"));
        assert!(vocab.is_date_predicate("http://schema.org/birthDate"));
        assert!(vocab.is_date_predicate("http://example.org/release_date"));
        assert!(!vocab.is_date_predicate("http://purl.org/dc/terms/title"));
        assert!(!vocab.is_date_predicate("http://example.org/candidate"));
        assert!(!vocab.is_date_predicate("http://example.org/validatedBy"));
        assert!(!vocab.is_date_predicate("http://example.org/UPDATED"));
    }

    #[test]
    fn article_type_uses_class_local_name() {
        let vocab = DomainVocabulary::default();
        let typed = Quad::new(
            Term::iri("http://example.org/a"),
            RDF_TYPE,
            Term::iri("http://schema.example.org/Article"),
        );
        assert!(vocab.is_article_type(&typed));

        let other = Quad::new(
            Term::iri("http://example.org/a"),
            RDF_TYPE,
            Term::iri("http://schema.example.org/ArticleDraft"),
        );
        assert!(!vocab.is_article_type(&other));
    }

    #[test]
    fn defaults_are_valid() {
        assert!(ValidatorConfig::default().validate().is_ok());
        let zero_depth = ValidatorConfig {
            semantic: SemanticConfig { max_node_depth: 0 },
            ..ValidatorConfig::default()
        };
        assert!(zero_depth.validate().is_err());
    }
}
