//! RDF data model
//!
//! This module implements the RDF term and statement model used across
//! the crate:
//! - the four term kinds (named node, blank node, literal, query variable)
//! - statements as triples or quads with pattern-matching semantics
//! - namespace prefix management for compact IRI notation
//! - N-Quads-style rendering and re-ingestion of terms and statements
//!
//! # Example
//!
//! ```rust
//! use quadstore::rdf::{Node, Statement};
//!
//! let statement = Statement::new(
//!     Node::named("http://example.org/alice").unwrap(),
//!     Node::named("http://xmlns.com/foaf/0.1/name").unwrap(),
//!     Node::literal("Alice"),
//! );
//! assert!(statement.is_triple());
//! assert!(statement.is_concrete());
//!
//! let pattern = Statement::new(
//!     Node::named("http://example.org/alice").unwrap(),
//!     Node::variable("p").unwrap(),
//!     Node::variable("o").unwrap(),
//! );
//! assert!(!pattern.is_concrete());
//! ```

mod namespace;
mod serialization;
mod types;

pub use types::{
    BlankNode, Literal, NamedNode, Node, RdfError, RdfResult, Statement, Variable,
    RDF_LANG_STRING,
};

pub use namespace::{Namespace, NamespaceManager, PrefixError, PrefixResult};

pub use serialization::{format_triples, parse_statement, parse_term};

pub(crate) use serialization::split_terms;
