//! Generic store protocol
//!
//! High-level statement operations (add, delete-matching, get-matching,
//! ask, count, graph catalog) expressed as SPARQL text over one abstract
//! `query` primitive supplied by a backend adapter. Writes are grouped by
//! resolved target graph and flushed in batches to bound round-trips;
//! flush boundaries never change observable results, only throughput.

mod virtuoso;

pub use virtuoso::{OdbcConnection, OdbcDriver, SqlRow, VirtuosoConfig, VirtuosoStore};

use crate::rdf::{format_triples, NamedNode, Node, RdfError, Statement};
use crate::sparql::{QueryError, QueryResult};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::error::Error as StdError;
use thiserror::Error;
use tracing::debug;

/// Statements flushed per write round-trip unless the adapter overrides it.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Failure raised by the underlying connection or transport, opaque to
/// the protocol layer.
#[derive(Debug, Error)]
#[error("connection error: {message}")]
pub struct ConnectionError {
    message: String,
    #[source]
    cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl ConnectionError {
    /// Create a connection error from a message only
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Create a connection error wrapping an underlying cause
    pub fn with_cause(
        message: impl Into<String>,
        cause: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }
}

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Write attempted with a pattern statement
    #[error("Statement is not concrete: {0}")]
    NonConcreteStatement(String),

    /// Neither the operation nor the statement named a target graph
    #[error("No graph resolved: neither a graph argument nor a named statement graph was given")]
    NoGraphResolved,

    /// Adapter opened without a required setting
    #[error("Missing configuration parameter: {0}")]
    MissingConfiguration(&'static str),

    /// Backend reported a term binding kind this adapter does not know
    #[error("Unknown binding type: {0}")]
    UnknownBindingType(String),

    /// Query text could not be analyzed
    #[error("Malformed query: {0}")]
    MalformedQuery(#[from] QueryError),

    /// Non-graph query without triple or quad patterns
    #[error("Non-graph queries must contain triple or quad patterns")]
    MissingPatterns,

    /// Backend answered outside its wire contract
    #[error("Unexpected backend response: {0}")]
    BackendResponse(String),

    /// Transport-level failure
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Invalid term data reached the store layer
    #[error(transparent)]
    Rdf(#[from] RdfError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque key→value hints forwarded to the backend adapter with each
/// operation. Adapters may ignore hints they do not understand.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    hints: IndexMap<String, String>,
}

impl QueryOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a hint, builder style
    pub fn with_hint(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.hints.insert(key.into(), value.into());
        self
    }

    /// Get a hint
    pub fn hint(&self, key: &str) -> Option<&str> {
        self.hints.get(key).map(String::as_str)
    }
}

/// A SPARQL-speaking statement store.
///
/// Backends implement [`Store::query`] (and the backend-specific graph
/// catalog); every statement-level operation is provided on top of it by
/// building SPARQL text. One adapter instance owns its connection
/// exclusively — operations take `&mut self` and instances are not meant
/// to be shared between threads without external synchronization.
pub trait Store {
    /// Send a SPARQL query to the store.
    ///
    /// Read queries report execution failures as
    /// [`QueryResult::Failure`]; update and ASK queries raise them as
    /// errors instead.
    fn query(&mut self, query: &str, options: &QueryOptions) -> StoreResult<QueryResult>;

    /// Graphs available in the store, keyed by graph URI.
    fn get_available_graphs(&mut self) -> StoreResult<HashMap<String, NamedNode>>;

    /// Statements flushed per write round-trip; any value ≥ 1 is valid.
    fn batch_size(&self) -> usize {
        DEFAULT_BATCH_SIZE
    }

    /// Add concrete statements, grouped per resolved target graph.
    ///
    /// The target graph of each statement is the explicit `graph`
    /// argument when given, else the statement's own named graph. The
    /// graph component is stripped from the emitted triple bodies; it is
    /// carried by the INSERT clause instead.
    fn add_statements<I>(
        &mut self,
        statements: I,
        graph: Option<&NamedNode>,
        options: &QueryOptions,
    ) -> StoreResult<()>
    where
        Self: Sized,
        I: IntoIterator<Item = Statement>,
    {
        let batch = self.batch_size().max(1);
        let mut buckets: IndexMap<String, Vec<Statement>> = IndexMap::new();
        let mut pending = 0usize;

        for statement in statements {
            if !statement.is_concrete() {
                return Err(StoreError::NonConcreteStatement(statement.to_string()));
            }
            let target = resolve_graph(&statement, graph).ok_or(StoreError::NoGraphResolved)?;
            buckets.entry(target).or_default().push(statement);
            pending += 1;
            if pending == batch {
                flush_inserts(self, &mut buckets, options)?;
                pending = 0;
            }
        }
        flush_inserts(self, &mut buckets, options)
    }

    /// Delete every statement matching the pattern in the resolved graph.
    ///
    /// The pattern is serialized once and reused as both the delete
    /// target and the match condition.
    fn delete_matching_statements(
        &mut self,
        pattern: &Statement,
        graph: Option<&NamedNode>,
        options: &QueryOptions,
    ) -> StoreResult<()>
    where
        Self: Sized,
    {
        let target = resolve_graph(pattern, graph).ok_or(StoreError::NoGraphResolved)?;
        let condition = format_triples(std::slice::from_ref(pattern));
        let query = format!(
            "WITH <{}> DELETE {{{}}} WHERE {{{}}}",
            target, condition, condition
        );
        debug!(graph = %target, "deleting matching statements");
        self.query(&query, options)?;
        Ok(())
    }

    /// Fetch every statement matching the pattern; without a resolvable
    /// graph the match runs over the default graph.
    ///
    /// Rows are reassembled into statements in row order. An execution
    /// failure reported by the backend is returned unchanged.
    fn get_matching_statements(
        &mut self,
        pattern: &Statement,
        graph: Option<&NamedNode>,
        options: &QueryOptions,
    ) -> StoreResult<QueryResult>
    where
        Self: Sized,
    {
        let mut query = String::from("SELECT ?s ?p ?o ");
        if let Some(target) = resolve_graph(pattern, graph) {
            query.push_str("FROM <");
            query.push_str(&target);
            query.push_str("> ");
        }
        query.push_str("WHERE { ?s ?p ?o ");
        for (variable, node) in [
            ("s", pattern.subject()),
            ("p", pattern.predicate()),
            ("o", pattern.object()),
        ] {
            if let Some(filter) = position_filter(variable, node) {
                query.push_str(&filter);
            }
        }
        query.push('}');

        match self.query(&query, options)? {
            QueryResult::Solutions {
                variables,
                solutions,
            } => {
                let mut statements = Vec::with_capacity(solutions.len());
                for solution in &solutions {
                    let row: Vec<Node> = variables
                        .iter()
                        .filter_map(|variable| solution.get(variable).cloned())
                        .collect();
                    match row.as_slice() {
                        [subject, predicate, object] => statements.push(Statement::new(
                            subject.clone(),
                            predicate.clone(),
                            object.clone(),
                        )),
                        _ => {
                            return Err(StoreError::BackendResponse(format!(
                                "expected 3 bound terms per row, got {}",
                                row.len()
                            )))
                        }
                    }
                }
                Ok(QueryResult::Statements {
                    variables,
                    statements,
                })
            }
            failure @ QueryResult::Failure(_) => Ok(failure),
            other => Ok(other),
        }
    }

    /// True when at least one statement matches the pattern in the
    /// resolved graph; a named graph is required.
    fn has_matching_statement(
        &mut self,
        pattern: &Statement,
        graph: Option<&NamedNode>,
        options: &QueryOptions,
    ) -> StoreResult<bool>
    where
        Self: Sized,
    {
        let target = resolve_graph(pattern, graph).ok_or(StoreError::NoGraphResolved)?;
        let query = format!(
            "ASK FROM <{}> {{ {}}}",
            target,
            format_triples(std::slice::from_ref(pattern))
        );
        match self.query(&query, options)? {
            QueryResult::Boolean(value) => Ok(value),
            other => Err(StoreError::BackendResponse(format!(
                "expected boolean result, got {}",
                other.kind()
            ))),
        }
    }

    /// Number of statements in the given graph.
    fn get_triple_count(&mut self, graph: &NamedNode) -> StoreResult<u64>
    where
        Self: Sized,
    {
        let query = format!(
            "SELECT (COUNT(*) AS ?count) FROM <{}> WHERE {{?s ?p ?o.}}",
            graph.as_str()
        );
        match self.query(&query, &QueryOptions::default())? {
            QueryResult::Solutions { solutions, .. } => {
                let count = solutions
                    .first()
                    .and_then(|solution| solution.get("count"))
                    .and_then(Node::as_literal)
                    .ok_or_else(|| {
                        StoreError::BackendResponse("count binding missing".to_string())
                    })?;
                count.value().parse().map_err(|_| {
                    StoreError::BackendResponse(format!(
                        "count is not a number: {}",
                        count.value()
                    ))
                })
            }
            QueryResult::Failure(failure) => {
                Err(StoreError::BackendResponse(failure.to_string()))
            }
            other => Err(StoreError::BackendResponse(format!(
                "expected solutions result, got {}",
                other.kind()
            ))),
        }
    }

    /// Membership test over [`Store::get_available_graphs`].
    fn is_graph_available(&mut self, graph: &NamedNode) -> StoreResult<bool> {
        Ok(self.get_available_graphs()?.contains_key(graph.as_str()))
    }
}

/// Target graph resolution shared by the write operations: the explicit
/// argument wins, else the statement's own graph when it is a named node.
fn resolve_graph(statement: &Statement, graph: Option<&NamedNode>) -> Option<String> {
    if let Some(graph) = graph {
        return Some(graph.as_str().to_string());
    }
    match statement.graph() {
        Some(Node::NamedNode(named)) => Some(named.as_str().to_string()),
        _ => None,
    }
}

/// One string-equality FILTER per bound (non-variable) pattern position.
fn position_filter(variable: &str, node: &Node) -> Option<String> {
    let value = match node {
        Node::NamedNode(named) => named.as_str().to_string(),
        Node::Literal(literal) => literal.value().to_string(),
        _ => return None,
    };
    Some(format!("FILTER (str(?{}) = \"{}\") ", variable, value))
}

/// Emit one INSERT per non-empty graph bucket and clear them all.
fn flush_inserts<S: Store>(
    store: &mut S,
    buckets: &mut IndexMap<String, Vec<Statement>>,
    options: &QueryOptions,
) -> StoreResult<()> {
    for (graph_uri, bucket) in buckets.drain(..) {
        if bucket.is_empty() {
            continue;
        }
        debug!(graph = %graph_uri, statements = bucket.len(), "flushing insert batch");
        let query = format!(
            "INSERT INTO GRAPH <{}> {{{}}}",
            graph_uri,
            format_triples(&bucket)
        );
        store.query(&query, options)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::QuerySolution;
    use std::collections::VecDeque;

    fn named(iri: &str) -> Node {
        Node::named(iri).unwrap()
    }

    fn graph(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    fn triple(n: u32) -> Statement {
        Statement::new(
            named("http://example.org/s"),
            named("http://example.org/p"),
            Node::literal(n.to_string()),
        )
    }

    /// Records every query and plays back scripted results.
    struct MockStore {
        batch: usize,
        queries: Vec<String>,
        responses: VecDeque<QueryResult>,
        graphs: Vec<&'static str>,
    }

    impl MockStore {
        fn new(batch: usize) -> Self {
            Self {
                batch,
                queries: Vec::new(),
                responses: VecDeque::new(),
                graphs: Vec::new(),
            }
        }

        fn respond(mut self, result: QueryResult) -> Self {
            self.responses.push_back(result);
            self
        }
    }

    impl Store for MockStore {
        fn query(&mut self, query: &str, _options: &QueryOptions) -> StoreResult<QueryResult> {
            self.queries.push(query.to_string());
            Ok(self.responses.pop_front().unwrap_or(QueryResult::Empty))
        }

        fn get_available_graphs(&mut self) -> StoreResult<HashMap<String, NamedNode>> {
            Ok(self
                .graphs
                .iter()
                .map(|uri| (uri.to_string(), graph(uri)))
                .collect())
        }

        fn batch_size(&self) -> usize {
            self.batch
        }
    }

    #[test]
    fn test_add_rejects_pattern_statement() {
        let mut store = MockStore::new(100);
        let pattern = Statement::new(
            named("http://s"),
            named("http://p"),
            Node::variable("o").unwrap(),
        );
        let result = store.add_statements(
            vec![pattern],
            Some(&graph("http://g/")),
            &QueryOptions::default(),
        );
        assert!(matches!(result, Err(StoreError::NonConcreteStatement(_))));
        assert!(store.queries.is_empty());
    }

    #[test]
    fn test_add_requires_resolvable_graph() {
        let mut store = MockStore::new(100);
        let result = store.add_statements(vec![triple(1)], None, &QueryOptions::default());
        assert!(matches!(result, Err(StoreError::NoGraphResolved)));
    }

    #[test]
    fn test_add_graph_override_beats_variable_graph() {
        // a statement whose own graph is a variable is bucketed under the
        // override, not rejected
        let mut store = MockStore::new(100);
        let statement = Statement::with_graph(
            named("http://s"),
            named("http://p"),
            Node::literal("o"),
            Node::variable("g").unwrap(),
        );
        store
            .add_statements(
                vec![statement],
                Some(&graph("http://g/")),
                &QueryOptions::default(),
            )
            .unwrap();
        assert_eq!(
            store.queries,
            vec!["INSERT INTO GRAPH <http://g/> {<http://s> <http://p> \"o\".}"]
        );
    }

    #[test]
    fn test_add_uses_statement_graph_without_override() {
        let mut store = MockStore::new(100);
        let statement = Statement::with_graph(
            named("http://s"),
            named("http://p"),
            Node::literal("o"),
            named("http://own-graph/"),
        );
        store
            .add_statements(vec![statement], None, &QueryOptions::default())
            .unwrap();
        assert_eq!(
            store.queries,
            vec!["INSERT INTO GRAPH <http://own-graph/> {<http://s> <http://p> \"o\".}"]
        );
    }

    #[test]
    fn test_add_batches_per_graph_without_loss() {
        // 5 statements over 2 graphs with batch size 2: every statement is
        // flushed exactly once, in order, regardless of flush boundaries
        let mut store = MockStore::new(2);
        let statements: Vec<Statement> = (0..5)
            .map(|n| {
                let target = if n % 2 == 0 { "http://g/1" } else { "http://g/2" };
                Statement::with_graph(
                    named("http://s"),
                    named("http://p"),
                    Node::literal(n.to_string()),
                    named(target),
                )
            })
            .collect();
        store
            .add_statements(statements, None, &QueryOptions::default())
            .unwrap();

        // flushes after 2 and 4 statements, plus the trailing partial batch
        assert_eq!(store.queries.len(), 5);
        for n in 0..5 {
            let occurrences = store
                .queries
                .iter()
                .filter(|q| q.contains(&format!("\"{}\"", n)))
                .count();
            assert_eq!(occurrences, 1, "statement {} flushed exactly once", n);
        }
        // order within a graph bucket is preserved
        let g1_queries: Vec<&String> = store
            .queries
            .iter()
            .filter(|q| q.contains("<http://g/1>"))
            .collect();
        assert_eq!(g1_queries.len(), 3);
        assert!(g1_queries[0].contains("\"0\""));
        assert!(g1_queries[1].contains("\"2\""));
        assert!(g1_queries[2].contains("\"4\""));
    }

    #[test]
    fn test_add_batch_size_one_equals_batch_size_many() {
        let statements: Vec<Statement> = (0..4)
            .map(|n| {
                Statement::with_graph(
                    named("http://s"),
                    named("http://p"),
                    Node::literal(n.to_string()),
                    named("http://g/"),
                )
            })
            .collect();

        let mut one = MockStore::new(1);
        one.add_statements(statements.clone(), None, &QueryOptions::default())
            .unwrap();
        let mut many = MockStore::new(100);
        many.add_statements(statements, None, &QueryOptions::default())
            .unwrap();

        // different round-trip counts, same statements overall
        assert_eq!(one.queries.len(), 4);
        assert_eq!(many.queries.len(), 1);
        for n in 0..4 {
            assert!(one.queries.iter().any(|q| q.contains(&format!("\"{}\"", n))));
            assert!(many.queries[0].contains(&format!("\"{}\"", n)));
        }
    }

    #[test]
    fn test_delete_builds_with_delete_where() {
        let mut store = MockStore::new(100);
        let pattern = Statement::new(
            named("http://s"),
            named("http://p"),
            Node::variable("o").unwrap(),
        );
        store
            .delete_matching_statements(&pattern, Some(&graph("http://g/")), &QueryOptions::default())
            .unwrap();
        assert_eq!(
            store.queries,
            vec!["WITH <http://g/> DELETE {<http://s> <http://p> ?o.} WHERE {<http://s> <http://p> ?o.}"]
        );
    }

    #[test]
    fn test_delete_requires_graph() {
        let mut store = MockStore::new(100);
        let pattern = Statement::new(
            named("http://s"),
            named("http://p"),
            Node::variable("o").unwrap(),
        );
        assert!(matches!(
            store.delete_matching_statements(&pattern, None, &QueryOptions::default()),
            Err(StoreError::NoGraphResolved)
        ));
    }

    #[test]
    fn test_get_matching_builds_filters_and_zips_rows() {
        let mut solution = QuerySolution::new();
        solution.bind("s", named("http://s"));
        solution.bind("p", named("http://p"));
        solution.bind("o", Node::literal("v"));
        let mut store = MockStore::new(100).respond(QueryResult::Solutions {
            variables: vec!["s".into(), "p".into(), "o".into()],
            solutions: vec![solution],
        });

        let pattern = Statement::new(
            named("http://s"),
            named("http://p"),
            Node::variable("o").unwrap(),
        );
        let result = store
            .get_matching_statements(&pattern, Some(&graph("http://g/")), &QueryOptions::default())
            .unwrap();

        assert_eq!(
            store.queries,
            vec![
                "SELECT ?s ?p ?o FROM <http://g/> WHERE { ?s ?p ?o \
                 FILTER (str(?s) = \"http://s\") FILTER (str(?p) = \"http://p\") }"
            ]
        );
        match result {
            QueryResult::Statements { statements, .. } => {
                assert_eq!(statements.len(), 1);
                assert_eq!(statements[0].subject(), &named("http://s"));
                assert_eq!(statements[0].object(), &Node::literal("v"));
            }
            other => panic!("expected statements, got {}", other.kind()),
        }
    }

    #[test]
    fn test_get_matching_without_graph_uses_default_graph() {
        let mut store = MockStore::new(100).respond(QueryResult::Solutions {
            variables: vec![],
            solutions: vec![],
        });
        let pattern = Statement::new(
            Node::variable("s").unwrap(),
            Node::variable("p").unwrap(),
            Node::variable("o").unwrap(),
        );
        store
            .get_matching_statements(&pattern, None, &QueryOptions::default())
            .unwrap();
        assert_eq!(store.queries, vec!["SELECT ?s ?p ?o WHERE { ?s ?p ?o }"]);
    }

    #[test]
    fn test_get_matching_passes_failure_through() {
        let mut store = MockStore::new(100).respond(QueryResult::Failure(
            crate::sparql::ExecutionFailure::new("backend went away"),
        ));
        let pattern = Statement::new(
            Node::variable("s").unwrap(),
            Node::variable("p").unwrap(),
            Node::variable("o").unwrap(),
        );
        let result = store
            .get_matching_statements(&pattern, None, &QueryOptions::default())
            .unwrap();
        assert!(matches!(result, QueryResult::Failure(_)));
    }

    #[test]
    fn test_has_matching_statement() {
        let mut store = MockStore::new(100).respond(QueryResult::Boolean(true));
        let pattern = Statement::new(
            named("http://s"),
            named("http://p"),
            Node::variable("o").unwrap(),
        );
        let found = store
            .has_matching_statement(&pattern, Some(&graph("http://g/")), &QueryOptions::default())
            .unwrap();
        assert!(found);
        assert_eq!(
            store.queries,
            vec!["ASK FROM <http://g/> { <http://s> <http://p> ?o.}"]
        );

        // no graph anywhere: refused before any backend call
        let mut store = MockStore::new(100);
        assert!(matches!(
            store.has_matching_statement(&pattern, None, &QueryOptions::default()),
            Err(StoreError::NoGraphResolved)
        ));
    }

    #[test]
    fn test_triple_count_parses_aggregate() {
        let mut solution = QuerySolution::new();
        solution.bind(
            "count",
            Node::typed_literal("42", "http://www.w3.org/2001/XMLSchema#integer").unwrap(),
        );
        let mut store = MockStore::new(100).respond(QueryResult::Solutions {
            variables: vec!["count".into()],
            solutions: vec![solution],
        });
        let count = store.get_triple_count(&graph("http://g/")).unwrap();
        assert_eq!(count, 42);
        assert_eq!(
            store.queries,
            vec!["SELECT (COUNT(*) AS ?count) FROM <http://g/> WHERE {?s ?p ?o.}"]
        );
    }

    #[test]
    fn test_is_graph_available() {
        let mut store = MockStore::new(100);
        store.graphs = vec!["http://g/1", "http://g/2"];
        assert!(store.is_graph_available(&graph("http://g/1")).unwrap());
        assert!(!store.is_graph_available(&graph("http://g/3")).unwrap());
    }
}
