//! Query result model
//!
//! Every store operation produces exactly one [`QueryResult`]. The type is
//! a closed union consumed by exhaustive matching; there are deliberately
//! no is-kind probes. Results are constructed once and then only read.

use crate::rdf::{Node, Statement};
use std::collections::HashMap;
use std::error::Error as StdError;
use thiserror::Error;

/// Opaque execution failure captured as data on the read path, so that
/// callers can branch on the result kind instead of handling errors.
#[derive(Debug, Error)]
#[error("query execution failed: {message}")]
pub struct ExecutionFailure {
    message: String,
    #[source]
    cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl ExecutionFailure {
    /// Create a failure from a message only
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Create a failure wrapping an underlying cause
    pub fn with_cause(
        message: impl Into<String>,
        cause: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// The failure message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One result row: variable name → bound node
#[derive(Debug, Clone, Default)]
pub struct QuerySolution {
    /// Variable name → RDF term bindings
    pub bindings: HashMap<String, Node>,
}

impl QuerySolution {
    /// Create an empty solution
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Get a binding
    pub fn get(&self, variable: &str) -> Option<&Node> {
        self.bindings.get(variable)
    }

    /// Add a binding
    pub fn bind(&mut self, variable: impl Into<String>, node: Node) {
        self.bindings.insert(variable.into(), node);
    }
}

/// Outcome of a store operation
#[derive(Debug)]
pub enum QueryResult {
    /// Successful operation with nothing to report (updates)
    Empty,

    /// Read-path execution failure, captured instead of raised
    Failure(ExecutionFailure),

    /// Boolean outcome of an ASK query
    Boolean(bool),

    /// Bound-variable rows from a SELECT query; `variables` fixes the
    /// column order and identity for every solution
    Solutions {
        variables: Vec<String>,
        solutions: Vec<QuerySolution>,
    },

    /// Rows reassembled into full statements from their
    /// subject/predicate/object bindings, in row order
    Statements {
        variables: Vec<String>,
        statements: Vec<Statement>,
    },
}

impl QueryResult {
    /// Short label of the variant, for messages and logs
    pub fn kind(&self) -> &'static str {
        match self {
            QueryResult::Empty => "empty",
            QueryResult::Failure(_) => "failure",
            QueryResult::Boolean(_) => "boolean",
            QueryResult::Solutions { .. } => "solutions",
            QueryResult::Statements { .. } => "statements",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::Node;

    #[test]
    fn test_solution_bindings() {
        let mut solution = QuerySolution::new();
        solution.bind("s", Node::named("http://example.org/x").unwrap());
        assert_eq!(
            solution.get("s"),
            Some(&Node::named("http://example.org/x").unwrap())
        );
        assert_eq!(solution.get("missing"), None);
    }

    #[test]
    fn test_exhaustive_consumption() {
        let result = QueryResult::Solutions {
            variables: vec!["s".into()],
            solutions: vec![],
        };
        // consumers match exhaustively on the closed union
        let rows = match result {
            QueryResult::Empty => 0,
            QueryResult::Failure(_) => 0,
            QueryResult::Boolean(_) => 0,
            QueryResult::Solutions { solutions, .. } => solutions.len(),
            QueryResult::Statements { statements, .. } => statements.len(),
        };
        assert_eq!(rows, 0);
    }

    #[test]
    fn test_failure_carries_cause() {
        let failure = ExecutionFailure::with_cause(
            "select failed",
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "odbc went away"),
        );
        assert_eq!(failure.message(), "select failed");
        assert!(std::error::Error::source(&failure).is_some());

        let result = QueryResult::Failure(failure);
        assert_eq!(result.kind(), "failure");
    }
}
