//! Logging setup. Installs the global subscriber, so it lives in its own
//! test binary with a single test.

mod support;

use anyhow::Result;
use rdf_validation_pipeline::logging::{
    LOG_FILE_NAME, LogFormat, LogOutput, LoggingConfig, init_logging,
};
use rdf_validation_pipeline::validate_document;
use support::{ARTICLE_SHAPES, EMPLOYMENT_EVENT};

#[test]
fn test_json_file_logging_records_pipeline_verdicts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = LoggingConfig {
        format: LogFormat::Json,
        output: LogOutput::File,
        log_dir: dir.path().to_path_buf(),
        verbose: false,
        rotate_daily: false,
    };

    let guard = init_logging(config)?;
    validate_document(EMPLOYMENT_EVENT, Some(ARTICLE_SHAPES));
    drop(guard);

    let contents = std::fs::read_to_string(dir.path().join(LOG_FILE_NAME))?;
    assert!(contents.contains("logging initialized"));
    assert!(contents.contains("nonconforming"));

    // A second subscriber cannot be installed
    assert!(init_logging(LoggingConfig::default()).is_err());
    Ok(())
}
