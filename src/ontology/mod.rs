//! Graph-level validation stages
//!
//! - **SHACL validation** - conformance of a data graph to a shapes graph
//! - **Consistency checking** - advisory domain rules (EMTAK codes,
//!   employment events, provenance, dates, entity mentions)
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use rdf_validation_pipeline::config::ValidatorConfig;
//! use rdf_validation_pipeline::ontology::{validate_consistency, validate_semantics};
//!
//! let config = ValidatorConfig::default();
//! let semantic = validate_semantics(document, shapes, &config.semantic);
//! let advisory = validate_consistency(document, &config.vocabulary);
//!
//! if !semantic.conforms() {
//!     eprintln!("{} violation(s)", semantic.violation_count());
//! }
//! println!("{}", advisory.summary());
//! ```

pub mod consistency;
pub mod constraints;
pub mod shacl;
pub mod shapes;

pub use consistency::{
    CheckSeverity, ConsistencyCheck, ConsistencyChecker, ConsistencyResult, check_store,
    validate_consistency,
};
pub use shacl::{
    SemanticResult, Severity, ShaclViolation, ShapeValidator, validate_semantics, validate_store,
};
pub use shapes::ShapesGraph;
