//! RDF term model and the per-document triple store.
//!
//! Everything the validation stages read comes through these types: the
//! syntax stage produces [`Quad`]s, wraps them in a [`TripleStore`], and the
//! semantic and consistency stages query that store.

pub mod store;
pub mod term;

pub use store::TripleStore;
pub use term::{Literal, Quad, Term};
