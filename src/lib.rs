//! Quadstore
//!
//! Store-agnostic middleware for RDF triple/quad storage: application code
//! speaks one statement-level interface while each graph-database backend
//! hides its own wire protocol behind an adapter.
//!
//! # Architecture
//!
//! The crate is layered leaf-first:
//!
//! - [`rdf`] — immutable term and statement model (named nodes, blank
//!   nodes, literals, query variables) with pattern-matching semantics
//!   and N-Quads rendering
//! - [`sparql`] — a structural query analyzer that extracts clauses,
//!   patterns, variables, graphs and prefixes from raw SPARQL text
//!   without a full grammar, plus the closed result union every store
//!   operation produces
//! - [`store`] — the generic store protocol (add, delete-matching,
//!   get-matching, ask, count, graph catalog) compiled to SPARQL text
//!   over one abstract `query` primitive, and the Virtuoso backend
//!   adapter implementing that primitive over an ODBC-style connection
//!
//! # Example
//!
//! ```rust,ignore
//! use quadstore::rdf::{NamedNode, Node, Statement};
//! use quadstore::store::{QueryOptions, Store, VirtuosoConfig, VirtuosoStore};
//!
//! let mut store = VirtuosoStore::new(driver, VirtuosoConfig::new("VOS", "dba", "dba"));
//!
//! let graph = NamedNode::new("http://example.org/graph")?;
//! store.add_statements(
//!     vec![Statement::new(
//!         Node::named("http://example.org/alice")?,
//!         Node::named("http://xmlns.com/foaf/0.1/name")?,
//!         Node::literal("Alice"),
//!     )],
//!     Some(&graph),
//!     &QueryOptions::new(),
//! )?;
//!
//! let pattern = Statement::new(
//!     Node::variable("s")?,
//!     Node::variable("p")?,
//!     Node::variable("o")?,
//! );
//! let result = store.get_matching_statements(&pattern, Some(&graph), &QueryOptions::new())?;
//! ```

#![warn(clippy::all)]

pub mod rdf;
pub mod sparql;
pub mod store;

// Re-export the types most callers touch
pub use crate::rdf::{NamedNode, Node, Statement};
pub use crate::sparql::{Query, QueryResult};
pub use crate::store::{QueryOptions, Store, StoreError};
