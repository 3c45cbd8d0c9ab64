//! OpenLink Virtuoso backend adapter
//!
//! Virtuoso speaks SQL over ODBC, with SPARQL reachable only through its
//! own entry points. The adapter owns a lazily-opened connection and
//! translates generic SPARQL text into the wire calls the server actually
//! accepts:
//!
//! - read (SELECT) queries are wrapped in `CALL DB.DBA.SPARQL_EVAL(...)`
//!   requesting JSON output, and the returned payload is decoded back
//!   into typed terms;
//! - update and ASK queries are forwarded behind the `SPARQL` dialect
//!   prefix so the server treats them as SPARQL rather than SQL;
//! - the graph catalog and triple counts are only exposed relationally,
//!   so those two operations query system tables directly.
//!
//! Execution failures on the read path are captured as
//! [`QueryResult::Failure`] for callers to inspect; on the update/ASK
//! path they are raised as hard errors.

use super::{ConnectionError, QueryOptions, Store, StoreError, StoreResult, DEFAULT_BATCH_SIZE};
use crate::rdf::{Literal, NamedNode, Node};
use crate::sparql::{ExecutionFailure, Query, QueryParts, QueryResult, QuerySolution, QueryType};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Connection settings for a Virtuoso server. All three parameters are
/// required before a connection can be opened.
#[derive(Debug, Clone, Default)]
pub struct VirtuosoConfig {
    /// ODBC data source name of the server, e.g. `VOS`
    pub dsn: String,
    /// Database user
    pub username: String,
    /// Database password
    pub password: String,
}

impl VirtuosoConfig {
    /// Create a new config
    pub fn new(
        dsn: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            dsn: dsn.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    fn require_complete(&self) -> StoreResult<()> {
        for (key, value) in [
            ("dsn", &self.dsn),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.is_empty() {
                return Err(StoreError::MissingConfiguration(key));
            }
        }
        Ok(())
    }
}

/// One raw result row as returned by the connection.
pub type SqlRow = Vec<String>;

/// An open ODBC session.
pub trait OdbcConnection {
    /// Prepare and execute one statement, returning its raw rows.
    fn prepare_and_execute(&mut self, statement: &str) -> Result<Vec<SqlRow>, ConnectionError>;

    /// Release the session.
    fn close(&mut self);
}

/// Connectivity boundary: opens ODBC sessions from connection settings.
///
/// Implementations must disable autocommit and enable error raising on
/// the session they hand out.
pub trait OdbcDriver {
    /// Session type produced by this driver
    type Connection: OdbcConnection;

    /// Open a session for the given settings.
    fn open(&self, config: &VirtuosoConfig) -> Result<Self::Connection, ConnectionError>;
}

/// Store adapter for OpenLink Virtuoso (6.1.8+).
///
/// The connection is opened by the first operation that needs it and
/// released when the adapter is dropped. An instance owns its connection
/// exclusively and is not safe for concurrent sharing.
pub struct VirtuosoStore<D: OdbcDriver> {
    driver: D,
    config: VirtuosoConfig,
    connection: Option<D::Connection>,
    batch_size: usize,
}

impl<D: OdbcDriver> VirtuosoStore<D> {
    /// Create a new adapter; no connection is opened yet.
    pub fn new(driver: D, config: VirtuosoConfig) -> Self {
        Self {
            driver,
            config,
            connection: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the write batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Execute a raw SQL statement on the server.
    pub fn sql_query(&mut self, statement: &str) -> StoreResult<Vec<SqlRow>> {
        debug!(statement, "executing sql query");
        Ok(self.connection()?.prepare_and_execute(statement)?)
    }

    fn connection(&mut self) -> StoreResult<&mut D::Connection> {
        if self.connection.is_none() {
            self.config.require_complete()?;
            info!(dsn = %self.config.dsn, "opening virtuoso connection");
            let session = self.driver.open(&self.config)?;
            self.connection = Some(session);
        }
        // the slot was filled above
        self.connection
            .as_mut()
            .ok_or_else(|| StoreError::Connection(ConnectionError::new("connection unavailable")))
    }

    /// Read path: wrap the query in a SPARQL_EVAL call requesting JSON
    /// output and decode the payload into typed solutions.
    fn select(&mut self, query: &str, parts: &QueryParts) -> StoreResult<QueryResult> {
        // JSON output carries datatype and language detail per binding
        let inner = format!("define output:format \"JSON\"\n{}", query);
        // escape the delimiters of the enclosing call syntax
        let escaped = inner.replace('\\', "\\\\").replace('\'', "\\'");
        let call = format!("CALL DB.DBA.SPARQL_EVAL('{}', '{}', 0)", escaped, "NULL");
        debug!(query, "executing select");

        let rows = match self.connection()?.prepare_and_execute(&call) {
            Ok(rows) => rows,
            Err(cause) => {
                return Ok(QueryResult::Failure(ExecutionFailure::with_cause(
                    "select execution failed",
                    cause,
                )))
            }
        };

        let payload = rows
            .first()
            .and_then(|row| row.first())
            .ok_or_else(|| StoreError::BackendResponse("empty result payload".to_string()))?;
        let decoded: SparqlJsonResults = serde_json::from_str(payload)
            .map_err(|e| StoreError::BackendResponse(format!("invalid result payload: {}", e)))?;

        // an empty result set comes back without the variable list from
        // the SELECT clause; fall back to the analyzer's variables
        let variables = if decoded.head.vars.is_empty() {
            parts.variables.iter().cloned().collect()
        } else {
            decoded.head.vars
        };

        let mut solutions = Vec::with_capacity(decoded.results.bindings.len());
        for binding in decoded.results.bindings {
            let mut solution = QuerySolution::new();
            for (variable, term) in binding {
                solution.bind(variable, convert_binding(&term)?);
            }
            solutions.push(solution);
        }

        Ok(QueryResult::Solutions {
            variables,
            solutions,
        })
    }

    /// Update/ASK path: forward behind the SPARQL dialect prefix. Failures
    /// here are hard errors, unlike the read path.
    fn update(&mut self, query: &str, query_type: QueryType) -> StoreResult<QueryResult> {
        let call = format!("SPARQL {}", query);
        debug!(query, "executing update");
        let rows = self.connection()?.prepare_and_execute(&call)?;

        if query_type == QueryType::Ask {
            Ok(QueryResult::Boolean(!rows.is_empty()))
        } else {
            Ok(QueryResult::Empty)
        }
    }
}

impl<D: OdbcDriver> Store for VirtuosoStore<D> {
    fn query(&mut self, query: &str, _options: &QueryOptions) -> StoreResult<QueryResult> {
        let parsed = Query::parse(query)?;
        let parts = parsed.parts();

        // anything that is not a graph query must carry data patterns
        if !parsed.query_type().is_graph_query()
            && parts.triple_patterns.is_empty()
            && parts.quad_patterns.is_empty()
        {
            return Err(StoreError::MissingPatterns);
        }

        match parsed.query_type() {
            QueryType::Select => self.select(query, parts),
            other => self.update(query, other),
        }
    }

    /// Virtuoso only exposes the graph catalog relationally.
    fn get_available_graphs(&mut self) -> StoreResult<HashMap<String, NamedNode>> {
        let rows = self.sql_query(
            "SELECT ID_TO_IRI(REC_GRAPH_IID) AS graph FROM DB.DBA.RDF_EXPLICITLY_CREATED_GRAPH",
        )?;
        let mut graphs = HashMap::with_capacity(rows.len());
        for row in rows {
            if let Some(uri) = row.first() {
                graphs.insert(uri.clone(), NamedNode::new(uri)?);
            }
        }
        Ok(graphs)
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Triple counts come from the quad system table, not SPARQL.
    fn get_triple_count(&mut self, graph: &NamedNode) -> StoreResult<u64> {
        let statement = format!(
            "SELECT COUNT(*) FROM DB.DBA.RDF_QUAD WHERE G = iri_to_id('{}')",
            graph.as_str()
        );
        let rows = self.sql_query(&statement)?;
        rows.first()
            .and_then(|row| row.first())
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| StoreError::BackendResponse("missing triple count".to_string()))
    }
}

impl<D: OdbcDriver> Drop for VirtuosoStore<D> {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            debug!("closing virtuoso connection");
            connection.close();
        }
    }
}

/// JSON shape of a SPARQL result set:
/// `{head: {vars: [...]}, results: {bindings: [{var: {...}}]}}`
#[derive(Debug, Deserialize)]
struct SparqlJsonResults {
    head: SparqlJsonHead,
    results: SparqlJsonBindings,
}

#[derive(Debug, Deserialize)]
struct SparqlJsonHead {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SparqlJsonBindings {
    #[serde(default)]
    bindings: Vec<HashMap<String, SparqlJsonTerm>>,
}

/// One term binding: `{type, value, datatype?, "xml:lang"?}`
#[derive(Debug, Deserialize)]
struct SparqlJsonTerm {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(default)]
    datatype: Option<String>,
    #[serde(rename = "xml:lang", default)]
    language: Option<String>,
}

/// Convert one JSON term binding into a typed node.
fn convert_binding(term: &SparqlJsonTerm) -> StoreResult<Node> {
    match term.kind.as_str() {
        // a plain `literal` is language-tagged when the tag is present
        "literal" => match term.language.as_deref() {
            Some(language) => Ok(Node::Literal(Literal::language_tagged(
                term.value.clone(),
                language,
            )?)),
            None => Ok(Node::Literal(Literal::simple(term.value.clone()))),
        },
        "typed-literal" => {
            let datatype = term.datatype.as_deref().ok_or_else(|| {
                StoreError::BackendResponse("typed-literal without datatype".to_string())
            })?;
            Ok(Node::Literal(Literal::typed(
                term.value.clone(),
                NamedNode::new(datatype)?,
            )))
        }
        "uri" => Ok(Node::named(&term.value)?),
        other => Err(StoreError::UnknownBindingType(other.to_string())),
    }
}
