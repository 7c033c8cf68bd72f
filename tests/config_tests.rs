//! Configuration loading from files and environment

use anyhow::Result;
use rdf_validation_pipeline::Validator;
use rdf_validation_pipeline::config::{CONFIG_PATH_ENV, ValidatorConfig};
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

const ENV_KEYS: &[&str] = &[
    CONFIG_PATH_ENV,
    "RDF_VALIDATOR_CONTEXT_LINES",
    "RDF_VALIDATOR_MAX_ERRORS",
    "RDF_VALIDATOR_EMIT_WARNINGS",
    "RDF_VALIDATOR_MAX_NODE_DEPTH",
];

/// Clears the validator variables on construction and on drop.
struct EnvGuard;

impl EnvGuard {
    fn new() -> Self {
        clear_env();
        EnvGuard
    }

    fn set(&self, key: &str, value: &str) {
        // SAFETY: tests touching the environment are #[serial]
        unsafe { std::env::set_var(key, value) };
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        clear_env();
    }
}

fn clear_env() {
    for key in ENV_KEYS {
        // SAFETY: tests touching the environment are #[serial]
        unsafe { std::env::remove_var(key) };
    }
}

fn config_file(suffix: &str, contents: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

#[test]
#[serial]
fn test_from_env_defaults() -> Result<()> {
    let _env = EnvGuard::new();
    assert_eq!(ValidatorConfig::from_env()?, ValidatorConfig::default());
    Ok(())
}

#[test]
#[serial]
fn test_from_env_overrides() -> Result<()> {
    let env = EnvGuard::new();
    env.set("RDF_VALIDATOR_CONTEXT_LINES", "5");
    env.set("RDF_VALIDATOR_MAX_ERRORS", "10");
    env.set("RDF_VALIDATOR_EMIT_WARNINGS", "false");
    env.set("RDF_VALIDATOR_MAX_NODE_DEPTH", "2");

    let config = ValidatorConfig::from_env()?;
    assert_eq!(config.syntax.context_lines, 5);
    assert_eq!(config.syntax.max_errors, 10);
    assert!(!config.syntax.emit_warnings);
    assert_eq!(config.semantic.max_node_depth, 2);

    let validator = Validator::from_env()?;
    assert_eq!(validator.config(), &config);
    Ok(())
}

#[test]
#[serial]
fn test_from_env_rejects_bad_values() {
    let env = EnvGuard::new();
    env.set("RDF_VALIDATOR_MAX_ERRORS", "many");
    assert!(ValidatorConfig::from_env().is_err());

    env.set("RDF_VALIDATOR_MAX_ERRORS", "0");
    let error = ValidatorConfig::from_env().unwrap_err();
    assert!(error.to_string().contains("max_errors"));
}

#[test]
#[serial]
fn test_env_overrides_config_file() -> Result<()> {
    let file = config_file(".yaml", "syntax:\n  context_lines: 7\n  max_errors: 3\n")?;
    let env = EnvGuard::new();
    env.set(CONFIG_PATH_ENV, &file.path().to_string_lossy());
    env.set("RDF_VALIDATOR_MAX_ERRORS", "4");

    let config = ValidatorConfig::from_env()?;
    assert_eq!(config.syntax.context_lines, 7);
    assert_eq!(config.syntax.max_errors, 4);
    Ok(())
}

#[test]
fn test_yaml_file_with_partial_sections() -> Result<()> {
    let file = config_file(
        ".yml",
        "semantic:\n  max_node_depth: 3\nvocabulary:\n  article_class: Story\n",
    )?;
    let config = ValidatorConfig::from_file(file.path())?;
    assert_eq!(config.semantic.max_node_depth, 3);
    assert_eq!(config.vocabulary.article_class, "Story");
    assert_eq!(config.vocabulary.article_prefix, "art");
    assert_eq!(config.syntax, Default::default());
    Ok(())
}

#[test]
fn test_json_file() -> Result<()> {
    let file = config_file(".json", r#"{"syntax": {"emit_warnings": false}}"#)?;
    let config = ValidatorConfig::from_file(file.path())?;
    assert!(!config.syntax.emit_warnings);
    assert_eq!(config.syntax.context_lines, 3);
    Ok(())
}

#[test]
fn test_file_errors() -> Result<()> {
    let toml = config_file(".toml", "[syntax]\n")?;
    let error = ValidatorConfig::from_file(toml.path()).unwrap_err();
    assert!(error.to_string().contains("unsupported config extension"));

    assert!(ValidatorConfig::from_file("/nonexistent/validator.yaml").is_err());

    let invalid = config_file(".yaml", "syntax:\n  context_lines: 0\n")?;
    assert!(ValidatorConfig::from_file(invalid.path()).is_err());
    Ok(())
}
