//! SPARQL support: structural query analysis and the result model
//!
//! The analyzer classifies raw query text and extracts its structural
//! parts without a full grammar; the result model is the closed union of
//! outcomes every store operation produces.
//!
//! # Example
//!
//! ```rust
//! use quadstore::sparql::{Query, QueryType};
//!
//! let query = Query::parse(
//!     "PREFIX foaf: <http://xmlns.com/foaf/0.1/> \
//!      SELECT ?name WHERE { ?person foaf:name ?name . }",
//! )
//! .unwrap();
//!
//! assert_eq!(query.query_type(), QueryType::Select);
//! assert!(query.parts().variables.contains("name"));
//! ```

mod parser;
mod results;

pub use parser::{
    DescribeForm, PatternTerm, Query, QueryError, QueryParts, QueryType, QuadPattern,
    TriplePattern,
};

pub use results::{ExecutionFailure, QueryResult, QuerySolution};
