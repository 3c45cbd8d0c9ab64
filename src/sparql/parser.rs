//! Structural SPARQL query analysis
//!
//! This is a deliberately partial scanner, not a grammar: it classifies a
//! query by its leading keyword and extracts structural parts (where
//! clause, patterns, filters, variables, graphs, prefixes) from the raw
//! text. Extraction is best-effort by contract — a part that cannot be
//! extracted is simply left empty, and callers treat empty and absent as
//! the same signal. Brace matching and statement splitting track quote
//! state so that braces, dots and sigils inside literal values are never
//! mistaken for structure.

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// IRI abbreviated by the `a` keyword in patterns.
const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Query analysis errors
#[derive(Error, Debug)]
pub enum QueryError {
    /// Leading keyword fits no known query form
    #[error("Unrecognized query form: {0}")]
    UnrecognizedForm(String),

    /// Query form requires a where clause and none was found
    #[error("No where clause found in query: {0}")]
    MissingWhereClause(String),
}

/// Top-level query form, determined by keyword scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// ASK
    Ask,
    /// SELECT
    Select,
    /// CONSTRUCT
    Construct,
    /// DESCRIBE
    Describe,
    /// INSERT DATA
    InsertData,
    /// DELETE DATA
    DeleteData,
    /// Any other update form (INSERT/DELETE/WITH/LOAD/CLEAR/...)
    Update,
}

impl QueryType {
    /// Graph queries return statements rather than bindings
    pub fn is_graph_query(self) -> bool {
        matches!(self, QueryType::Construct | QueryType::Describe)
    }

    /// True for all mutating forms
    pub fn is_update(self) -> bool {
        matches!(
            self,
            QueryType::InsertData | QueryType::DeleteData | QueryType::Update
        )
    }
}

/// DESCRIBE flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescribeForm {
    /// `DESCRIBE <term>` without a body
    Plain,
    /// `DESCRIBE <term> WHERE { ... }`
    WithWhere,
}

/// One position of an extracted pattern.
///
/// Named nodes keep the token form found in the query: an absolute IRI
/// for angle-bracketed tokens, or the unexpanded `prefix:local` text —
/// expansion is the caller's responsibility via the collected prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternTerm {
    /// IRI or unexpanded prefixed name
    NamedNode(String),
    /// Blank node identifier (without `_:`)
    BlankNode(String),
    /// Quoted literal with optional datatype or language tag
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
    /// Variable name (without sigil)
    Variable(String),
}

impl PatternTerm {
    /// Check if this position is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, PatternTerm::Variable(_))
    }
}

/// A three-position pattern found in the where clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

/// A pattern found inside an explicit GRAPH wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuadPattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
    pub graph: PatternTerm,
}

/// Structural parts extracted from a query.
///
/// Every collection is best-effort: a part that could not be extracted is
/// left empty, and callers must treat empty and absent identically.
#[derive(Debug, Clone, Default)]
pub struct QueryParts {
    /// Text of the first brace-delimited body, trimmed
    pub where_clause: Option<String>,
    /// Patterns outside GRAPH wrappers
    pub triple_patterns: Vec<TriplePattern>,
    /// Patterns inside GRAPH wrappers
    pub quad_patterns: Vec<QuadPattern>,
    /// FILTER expression texts, verbatim
    pub filter_patterns: Vec<String>,
    /// Variable names referenced by the query, in order of appearance
    pub variables: IndexSet<String>,
    /// Default graph URIs from FROM clauses
    pub graphs: Vec<String>,
    /// Named graph URIs from FROM NAMED clauses
    pub named_graphs: Vec<String>,
    /// prefix → IRI
    pub prefixes: IndexMap<String, String>,
    /// IRI → prefix, the reverse index of `prefixes`
    pub namespaces: IndexMap<String, String>,
    /// Projection variables from the pre-brace clause (SELECT/DESCRIBE)
    pub result_variables: Vec<String>,
    /// DESCRIBE flavour, when applicable
    pub describe_form: Option<DescribeForm>,
}

/// A classified query with its extracted parts
#[derive(Debug, Clone)]
pub struct Query {
    text: String,
    query_type: QueryType,
    parts: QueryParts,
}

impl Query {
    /// Classify the query and extract its structural parts.
    ///
    /// The text is assumed to be syntactically valid SPARQL; only an
    /// unclassifiable head or an ASK query without a body is an error.
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let text = text.trim();
        let query_type = classify(text)?;

        let open = find_unquoted(text, '{');
        let pre_brace = match open {
            Some(at) => &text[..at],
            None => text,
        };
        let where_clause = open.and_then(|at| {
            find_matching_brace(text, at).map(|close| text[at + 1..close].trim().to_string())
        });

        if query_type == QueryType::Ask && where_clause.is_none() {
            return Err(QueryError::MissingWhereClause(text.to_string()));
        }

        let mut parts = QueryParts {
            prefixes: extract_prefixes(pre_brace),
            ..QueryParts::default()
        };
        parts.namespaces = parts
            .prefixes
            .iter()
            .map(|(prefix, iri)| (iri.clone(), prefix.clone()))
            .collect();

        let (graphs, named_graphs) = extract_graphs(pre_brace);
        parts.graphs = graphs;
        parts.named_graphs = named_graphs;

        if let Some(body) = &where_clause {
            parts.variables = extract_variables(body);

            let (rest, filters) = strip_filters(body);
            parts.filter_patterns = filters;

            let (rest, graph_blocks) = strip_graph_blocks(&rest);
            for (graph_token, inner) in graph_blocks {
                if let Some(graph) = classify_term(&graph_token) {
                    for segment in split_segments(&inner) {
                        if let Some((subject, predicate, object)) =
                            parse_pattern_segment(&segment)
                        {
                            parts.quad_patterns.push(QuadPattern {
                                subject,
                                predicate,
                                object,
                                graph: graph.clone(),
                            });
                        }
                    }
                }
            }
            for segment in split_segments(&rest) {
                if let Some((subject, predicate, object)) = parse_pattern_segment(&segment) {
                    parts.triple_patterns.push(TriplePattern {
                        subject,
                        predicate,
                        object,
                    });
                }
            }
        }

        match query_type {
            QueryType::Describe => {
                // DESCRIBE names its targets before the brace
                let mut variables = extract_variables(pre_brace);
                variables.extend(parts.variables);
                parts.variables = variables;
                parts.result_variables = extract_variables(pre_brace).into_iter().collect();
                parts.describe_form = Some(if where_clause.is_some() {
                    DescribeForm::WithWhere
                } else {
                    DescribeForm::Plain
                });
            }
            QueryType::Select => {
                parts.result_variables = extract_variables(pre_brace).into_iter().collect();
            }
            _ => {}
        }

        parts.where_clause = where_clause;

        Ok(Query {
            text: text.to_string(),
            query_type,
            parts,
        })
    }

    /// The raw query text this instance was parsed from
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The classified query form
    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// The extracted structural parts
    pub fn parts(&self) -> &QueryParts {
        &self.parts
    }

    /// Rebuild a semantically equivalent query from the extracted parts:
    /// prefixes, keyword (with projection), FROM clauses, where body.
    /// Update forms are returned as their original text.
    pub fn to_query_string(&self) -> String {
        if self.query_type.is_update() {
            return self.text.clone();
        }

        let parts = &self.parts;
        let mut out = String::new();
        for (prefix, iri) in &parts.prefixes {
            out.push_str("PREFIX ");
            out.push_str(prefix);
            out.push_str(": <");
            out.push_str(iri);
            out.push_str("> ");
        }

        match self.query_type {
            QueryType::Ask => out.push_str("ASK"),
            QueryType::Select => {
                out.push_str("SELECT");
                if parts.result_variables.is_empty() {
                    out.push_str(" *");
                } else {
                    for variable in &parts.result_variables {
                        out.push_str(" ?");
                        out.push_str(variable);
                    }
                }
            }
            QueryType::Construct => out.push_str("CONSTRUCT"),
            QueryType::Describe => {
                out.push_str("DESCRIBE");
                for variable in &parts.result_variables {
                    out.push_str(" ?");
                    out.push_str(variable);
                }
            }
            _ => {}
        }

        for graph in &parts.graphs {
            out.push_str(" FROM <");
            out.push_str(graph);
            out.push('>');
        }
        for graph in &parts.named_graphs {
            out.push_str(" FROM NAMED <");
            out.push_str(graph);
            out.push('>');
        }

        if let Some(body) = &parts.where_clause {
            match self.query_type {
                QueryType::Ask => {
                    out.push_str(" { ");
                    out.push_str(body);
                    out.push_str(" }");
                }
                _ => {
                    out.push_str(" WHERE { ");
                    out.push_str(body);
                    out.push_str(" }");
                }
            }
        }

        out
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

fn prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)PREFIX\s+([A-Za-z][A-Za-z0-9_-]*)\s*:\s*<([^<>\s]+)>")
            .expect("hard-coded regex")
    })
}

fn from_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bFROM\s+(NAMED\s+)?<([^<>\s]+)>").expect("hard-coded regex")
    })
}

fn variable_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[?$]([A-Za-z_][A-Za-z0-9_]*)").expect("hard-coded regex"))
}

/// Classify by the first keyword after the PREFIX/BASE prologue.
fn classify(text: &str) -> Result<QueryType, QueryError> {
    let mut tokens = text.split_whitespace().peekable();
    while let Some(token) = tokens.peek() {
        if token.eq_ignore_ascii_case("PREFIX") || token.eq_ignore_ascii_case("BASE") {
            tokens.next();
            // consume up to and including the <iri> token
            for token in tokens.by_ref() {
                if token.ends_with('>') {
                    break;
                }
            }
        } else {
            break;
        }
    }
    let first = tokens
        .next()
        .map(str::to_ascii_uppercase)
        .ok_or_else(|| QueryError::UnrecognizedForm(text.to_string()))?;
    let second = tokens.next().map(str::to_ascii_uppercase);

    let query_type = match first.as_str() {
        "ASK" => QueryType::Ask,
        "SELECT" => QueryType::Select,
        "CONSTRUCT" => QueryType::Construct,
        "DESCRIBE" => QueryType::Describe,
        "INSERT" if second.as_deref() == Some("DATA") => QueryType::InsertData,
        "DELETE" if second.as_deref() == Some("DATA") => QueryType::DeleteData,
        "INSERT" | "DELETE" | "WITH" | "LOAD" | "CLEAR" | "CREATE" | "DROP" | "COPY"
        | "MOVE" | "ADD" => QueryType::Update,
        _ => return Err(QueryError::UnrecognizedForm(text.to_string())),
    };
    Ok(query_type)
}

/// Position of the first occurrence of `target` outside quoted literals.
fn find_unquoted(text: &str, target: char) -> Option<usize> {
    let mut in_quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if let Some(q) = in_quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                in_quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_quote = Some(c),
            c if c == target => return Some(i),
            _ => {}
        }
    }
    None
}

/// Position of the brace matching the one at `open`, tolerating nested
/// blocks and braces inside quoted literals.
fn find_matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text[open..].char_indices() {
        if let Some(q) = in_quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                in_quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Matching close paren for the `(` at `open`, quote-aware.
fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text[open..].char_indices() {
        if let Some(q) = in_quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                in_quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Every well-formed `PREFIX name: <iri>` occurrence; malformed lines
/// simply fail to match and are skipped.
fn extract_prefixes(text: &str) -> IndexMap<String, String> {
    prefix_re()
        .captures_iter(text)
        .map(|cap| (cap[1].to_string(), cap[2].to_string()))
        .collect()
}

/// FROM and FROM NAMED graph URIs.
fn extract_graphs(text: &str) -> (Vec<String>, Vec<String>) {
    let mut graphs = Vec::new();
    let mut named_graphs = Vec::new();
    for cap in from_re().captures_iter(text) {
        if cap.get(1).is_some() {
            named_graphs.push(cap[2].to_string());
        } else {
            graphs.push(cap[2].to_string());
        }
    }
    (graphs, named_graphs)
}

/// Variable names in order of first appearance.
fn extract_variables(text: &str) -> IndexSet<String> {
    variable_re()
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// True when the byte at `at` starts a standalone keyword occurrence.
fn at_keyword(bytes: &[u8], at: usize, keyword: &str) -> bool {
    if at > 0 && (bytes[at - 1].is_ascii_alphanumeric() || bytes[at - 1] == b'_') {
        return false;
    }
    let end = at + keyword.len();
    if end > bytes.len() {
        return false;
    }
    if !bytes[at..end].eq_ignore_ascii_case(keyword.as_bytes()) {
        return false;
    }
    match bytes.get(end) {
        Some(next) => !next.is_ascii_alphanumeric() && *next != b'_',
        None => true,
    }
}

/// Remove every `FILTER (...)` group from the body, returning the
/// remaining text and the verbatim inner expressions.
fn strip_filters(body: &str) -> (String, Vec<String>) {
    let bytes = body.as_bytes();
    let mut out = body.as_bytes().to_vec();
    let mut filters = Vec::new();
    let mut in_quote: Option<u8> = None;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = in_quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                in_quote = None;
            }
            i += 1;
            continue;
        }
        if b == b'"' || b == b'\'' {
            in_quote = Some(b);
            i += 1;
            continue;
        }
        if at_keyword(bytes, i, "FILTER") {
            let mut paren = i + "FILTER".len();
            while paren < bytes.len() && bytes[paren].is_ascii_whitespace() {
                paren += 1;
            }
            if paren < bytes.len() && bytes[paren] == b'(' {
                if let Some(close) = find_matching_paren(body, paren) {
                    filters.push(body[paren + 1..close].trim().to_string());
                    for slot in &mut out[i..=close] {
                        *slot = b' ';
                    }
                    i = close + 1;
                    continue;
                }
            }
        }
        i += 1;
    }

    let remaining = String::from_utf8(out).unwrap_or_else(|_| body.to_string());
    (remaining, filters)
}

/// Remove every `GRAPH <term> { ... }` block, returning the remaining
/// text and (graph term token, inner body) pairs.
fn strip_graph_blocks(body: &str) -> (String, Vec<(String, String)>) {
    let bytes = body.as_bytes();
    let mut out = body.as_bytes().to_vec();
    let mut blocks = Vec::new();
    let mut in_quote: Option<u8> = None;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = in_quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                in_quote = None;
            }
            i += 1;
            continue;
        }
        if b == b'"' || b == b'\'' {
            in_quote = Some(b);
            i += 1;
            continue;
        }
        if at_keyword(bytes, i, "GRAPH") {
            let mut cursor = i + "GRAPH".len();
            while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                cursor += 1;
            }
            // the graph term: angle-bracketed IRI, variable, or prefixed name
            let term_start = cursor;
            if cursor < bytes.len() && bytes[cursor] == b'<' {
                while cursor < bytes.len() && bytes[cursor] != b'>' {
                    cursor += 1;
                }
                cursor = (cursor + 1).min(bytes.len());
            } else {
                while cursor < bytes.len()
                    && !bytes[cursor].is_ascii_whitespace()
                    && bytes[cursor] != b'{'
                {
                    cursor += 1;
                }
            }
            let term = body[term_start..cursor].trim().to_string();
            while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                cursor += 1;
            }
            if !term.is_empty() && cursor < bytes.len() && bytes[cursor] == b'{' {
                if let Some(close) = find_matching_brace(body, cursor) {
                    blocks.push((term, body[cursor + 1..close].trim().to_string()));
                    for slot in &mut out[i..=close] {
                        *slot = b' ';
                    }
                    i = close + 1;
                    continue;
                }
            }
        }
        i += 1;
    }

    let remaining = String::from_utf8(out).unwrap_or_else(|_| body.to_string());
    (remaining, blocks)
}

/// Split a group body into statement-terminated segments on `.`,
/// ignoring dots inside quoted literals and angle-bracketed IRIs.
/// Residual braces (OPTIONAL and friends) are treated as whitespace.
fn split_segments(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_quote: Option<char> = None;
    let mut in_angle = false;
    let mut escaped = false;

    for c in text.chars() {
        if let Some(q) = in_quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                in_quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                in_quote = Some(c);
                current.push(c);
            }
            '<' => {
                in_angle = true;
                current.push(c);
            }
            '>' => {
                in_angle = false;
                current.push(c);
            }
            '{' | '}' => current.push(' '),
            '.' if !in_angle => segments.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    segments.push(current);

    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Keywords that may precede a pattern in a segment after brace removal.
fn is_group_keyword(token: &str) -> bool {
    ["OPTIONAL", "UNION", "MINUS", "SERVICE"]
        .iter()
        .any(|k| token.eq_ignore_ascii_case(k))
}

/// Parse one segment into three classified positions, or nothing if the
/// segment does not look like a plain pattern.
fn parse_pattern_segment(segment: &str) -> Option<(PatternTerm, PatternTerm, PatternTerm)> {
    let tokens: Vec<String> = crate::rdf::split_terms(segment)
        .into_iter()
        .filter(|token| !is_group_keyword(token))
        .collect();
    if tokens.len() != 3 {
        return None;
    }
    let subject = classify_term(&tokens[0])?;
    let predicate = classify_term(&tokens[1])?;
    let object = classify_term(&tokens[2])?;
    Some((subject, predicate, object))
}

/// Classify one token as a pattern position.
fn classify_term(token: &str) -> Option<PatternTerm> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if let Some(inner) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Some(PatternTerm::NamedNode(inner.to_string()));
    }
    if let Some(name) = token.strip_prefix(['?', '$']) {
        if !name.is_empty() {
            return Some(PatternTerm::Variable(name.to_string()));
        }
        return None;
    }
    if let Some(id) = token.strip_prefix("_:") {
        return Some(PatternTerm::BlankNode(id.to_string()));
    }
    if token.starts_with('"') || token.starts_with('\'') {
        return classify_literal(token);
    }
    if token == "a" {
        return Some(PatternTerm::NamedNode(RDF_TYPE.to_string()));
    }
    if is_prefixed_name(token) {
        return Some(PatternTerm::NamedNode(token.to_string()));
    }
    None
}

fn is_prefixed_name(token: &str) -> bool {
    match token.split_once(':') {
        Some((prefix, local)) => {
            !prefix.is_empty()
                && prefix.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && prefix
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                && !local.contains([':', '<', '>', '"'])
        }
        None => false,
    }
}

fn classify_literal(token: &str) -> Option<PatternTerm> {
    let quote = token.chars().next()?;
    let mut value = String::new();
    let mut escaped = false;
    let mut end = None;
    for (i, c) in token.char_indices().skip(1) {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            end = Some(i);
            break;
        } else {
            value.push(c);
        }
    }
    let end = end?;
    let suffix = token[end + 1..].trim();
    if suffix.is_empty() {
        return Some(PatternTerm::Literal {
            value,
            datatype: None,
            language: None,
        });
    }
    if let Some(language) = suffix.strip_prefix('@') {
        return Some(PatternTerm::Literal {
            value,
            datatype: None,
            language: Some(language.to_string()),
        });
    }
    if let Some(datatype) = suffix.strip_prefix("^^") {
        let datatype = datatype
            .trim()
            .strip_prefix('<')
            .and_then(|d| d.strip_suffix('>'))
            .unwrap_or(datatype.trim());
        return Some(PatternTerm::Literal {
            value,
            datatype: Some(datatype.to_string()),
            language: None,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_forms() {
        assert_eq!(
            Query::parse("SELECT ?s WHERE { ?s ?p ?o }").unwrap().query_type(),
            QueryType::Select
        );
        assert_eq!(
            Query::parse("ASK { ?s ?p ?o }").unwrap().query_type(),
            QueryType::Ask
        );
        assert_eq!(
            Query::parse("PREFIX foaf: <http://xmlns.com/foaf/0.1/> SELECT ?s WHERE { ?s foaf:name ?n }")
                .unwrap()
                .query_type(),
            QueryType::Select
        );
        assert_eq!(
            Query::parse("INSERT DATA { <http://s> <http://p> \"o\". }")
                .unwrap()
                .query_type(),
            QueryType::InsertData
        );
        assert_eq!(
            Query::parse("DELETE DATA { <http://s> <http://p> \"o\". }")
                .unwrap()
                .query_type(),
            QueryType::DeleteData
        );
        assert_eq!(
            Query::parse("INSERT INTO GRAPH <http://g/> { <http://s> <http://p> \"o\". }")
                .unwrap()
                .query_type(),
            QueryType::Update
        );
        assert_eq!(
            Query::parse("WITH <http://g/> DELETE { ?s ?p ?o } WHERE { ?s ?p ?o }")
                .unwrap()
                .query_type(),
            QueryType::Update
        );
        assert!(matches!(
            Query::parse("FROBNICATE ?x"),
            Err(QueryError::UnrecognizedForm(_))
        ));
    }

    #[test]
    fn test_select_scenario() {
        let query =
            Query::parse("SELECT ?s ?p ?o WHERE { ?s ?p ?o . FILTER(?s = <http://ex/1>) }")
                .unwrap();
        let parts = query.parts();

        let variables: Vec<&str> = parts.variables.iter().map(String::as_str).collect();
        assert_eq!(variables, ["s", "p", "o"]);

        assert_eq!(parts.triple_patterns.len(), 1);
        assert_eq!(
            parts.triple_patterns[0],
            TriplePattern {
                subject: PatternTerm::Variable("s".into()),
                predicate: PatternTerm::Variable("p".into()),
                object: PatternTerm::Variable("o".into()),
            }
        );

        assert_eq!(parts.filter_patterns, vec!["?s = <http://ex/1>"]);
        assert!(parts.graphs.is_empty());
        assert!(parts.quad_patterns.is_empty());
    }

    #[test]
    fn test_where_clause_nested_braces() {
        let query = Query::parse(
            "SELECT ?s WHERE { ?s <http://p> ?o . OPTIONAL { ?s <http://q> ?r } }",
        )
        .unwrap();
        assert_eq!(
            query.parts().where_clause.as_deref(),
            Some("?s <http://p> ?o . OPTIONAL { ?s <http://q> ?r }")
        );
        // the optional pattern is still collected
        assert_eq!(query.parts().triple_patterns.len(), 2);
    }

    #[test]
    fn test_brace_inside_literal_is_not_structure() {
        let query =
            Query::parse("SELECT ?s WHERE { ?s <http://p> \"some { weird } value\" . }").unwrap();
        assert_eq!(
            query.parts().where_clause.as_deref(),
            Some("?s <http://p> \"some { weird } value\" .")
        );
        assert_eq!(query.parts().triple_patterns.len(), 1);
        assert_eq!(
            query.parts().triple_patterns[0].object,
            PatternTerm::Literal {
                value: "some { weird } value".into(),
                datatype: None,
                language: None,
            }
        );
    }

    #[test]
    fn test_dot_inside_iri_and_literal() {
        let query = Query::parse(
            "SELECT ?o WHERE { <http://ex.org/s> <http://ex.org/p> ?o . ?o <http://ex.org/q> \"v. 1.2\" }",
        )
        .unwrap();
        assert_eq!(query.parts().triple_patterns.len(), 2);
    }

    #[test]
    fn test_prefixes_and_namespaces() {
        let query = Query::parse(
            "PREFIX foaf: <http://xmlns.com/foaf/0.1/> \
             PREFIX dc: <http://purl.org/dc/elements/1.1/> \
             PREFIX broken <oops> \
             SELECT ?s WHERE { ?s foaf:name ?n }",
        )
        .unwrap();
        let parts = query.parts();
        assert_eq!(parts.prefixes.len(), 2);
        assert_eq!(
            parts.prefixes.get("foaf").map(String::as_str),
            Some("http://xmlns.com/foaf/0.1/")
        );
        assert_eq!(
            parts.namespaces.get("http://purl.org/dc/elements/1.1/").map(String::as_str),
            Some("dc")
        );
        // prefixed names stay unexpanded in patterns; callers resolve them
        // through the collected prefixes
        assert_eq!(
            parts.triple_patterns[0].predicate,
            PatternTerm::NamedNode("foaf:name".into())
        );
        let manager = crate::rdf::NamespaceManager::from_prefixes(
            parts.prefixes.iter().map(|(p, iri)| (p.as_str(), iri.as_str())),
        );
        assert_eq!(
            manager.expand("foaf:name").unwrap(),
            "http://xmlns.com/foaf/0.1/name"
        );
    }

    #[test]
    fn test_from_and_from_named() {
        let query = Query::parse(
            "SELECT ?s FROM <http://g/1> FROM NAMED <http://g/2> WHERE { ?s ?p ?o }",
        )
        .unwrap();
        assert_eq!(query.parts().graphs, vec!["http://g/1"]);
        assert_eq!(query.parts().named_graphs, vec!["http://g/2"]);
    }

    #[test]
    fn test_graph_block_yields_quad_patterns() {
        let query = Query::parse(
            "SELECT ?s WHERE { GRAPH <http://g/> { ?s <http://p> \"x\" . ?s <http://q> _:b } ?s <http://r> ?t }",
        )
        .unwrap();
        let parts = query.parts();
        assert_eq!(parts.quad_patterns.len(), 2);
        assert_eq!(
            parts.quad_patterns[0].graph,
            PatternTerm::NamedNode("http://g/".into())
        );
        assert_eq!(
            parts.quad_patterns[1].object,
            PatternTerm::BlankNode("b".into())
        );
        assert_eq!(parts.triple_patterns.len(), 1);
    }

    #[test]
    fn test_graph_block_with_variable_graph() {
        let query =
            Query::parse("SELECT ?g WHERE { GRAPH ?g { ?s ?p ?o } }").unwrap();
        assert_eq!(
            query.parts().quad_patterns[0].graph,
            PatternTerm::Variable("g".into())
        );
    }

    #[test]
    fn test_literal_positions() {
        let query = Query::parse(
            "SELECT ?s WHERE { ?s <http://p> \"5\"^^<http://www.w3.org/2001/XMLSchema#integer> . ?s <http://q> \"hi\"@en }",
        )
        .unwrap();
        let parts = query.parts();
        assert_eq!(
            parts.triple_patterns[0].object,
            PatternTerm::Literal {
                value: "5".into(),
                datatype: Some("http://www.w3.org/2001/XMLSchema#integer".into()),
                language: None,
            }
        );
        assert_eq!(
            parts.triple_patterns[1].object,
            PatternTerm::Literal {
                value: "hi".into(),
                datatype: None,
                language: Some("en".into()),
            }
        );
    }

    #[test]
    fn test_rdf_type_shorthand() {
        let query = Query::parse("SELECT ?s WHERE { ?s a <http://ex/Person> }").unwrap();
        assert_eq!(
            query.parts().triple_patterns[0].predicate,
            PatternTerm::NamedNode(RDF_TYPE.into())
        );
    }

    #[test]
    fn test_ask_requires_where() {
        assert!(matches!(
            Query::parse("ASK"),
            Err(QueryError::MissingWhereClause(_))
        ));
        let query = Query::parse("ASK { <http://s> <http://p> ?o. }").unwrap();
        assert_eq!(query.parts().where_clause.as_deref(), Some("<http://s> <http://p> ?o."));
    }

    #[test]
    fn test_describe_forms() {
        let plain = Query::parse("DESCRIBE ?x").unwrap();
        assert_eq!(plain.parts().describe_form, Some(DescribeForm::Plain));
        assert_eq!(plain.parts().result_variables, vec!["x"]);
        assert!(plain.parts().where_clause.is_none());

        let qualified = Query::parse("DESCRIBE ?x WHERE { ?x <http://p> ?y }").unwrap();
        assert_eq!(qualified.parts().describe_form, Some(DescribeForm::WithWhere));
        let variables: Vec<&str> =
            qualified.parts().variables.iter().map(String::as_str).collect();
        assert_eq!(variables, ["x", "y"]);
    }

    #[test]
    fn test_multiple_filters() {
        let query = Query::parse(
            "SELECT ?s WHERE { ?s ?p ?o . FILTER (str(?s) = \"http://a/\") FILTER (str(?o) = \"x (y)\") }",
        )
        .unwrap();
        assert_eq!(
            query.parts().filter_patterns,
            vec!["str(?s) = \"http://a/\"", "str(?o) = \"x (y)\""]
        );
        assert_eq!(query.parts().triple_patterns.len(), 1);
    }

    #[test]
    fn test_to_query_string_idempotent() {
        let original = Query::parse(
            "PREFIX foaf: <http://xmlns.com/foaf/0.1/> \
             SELECT ?s ?n FROM <http://g/> WHERE { ?s foaf:name ?n . FILTER(?n = \"x\") }",
        )
        .unwrap();
        let rebuilt = Query::parse(&original.to_query_string()).unwrap();

        assert_eq!(rebuilt.parts().where_clause, original.parts().where_clause);
        assert_eq!(rebuilt.parts().variables, original.parts().variables);
        assert_eq!(rebuilt.parts().graphs, original.parts().graphs);
        assert_eq!(rebuilt.parts().prefixes, original.parts().prefixes);
    }

    #[test]
    fn test_ask_to_query_string() {
        let query = Query::parse("ASK FROM <http://g/> { <http://s> <http://p> ?o. }").unwrap();
        assert_eq!(
            query.to_query_string(),
            "ASK FROM <http://g/> { <http://s> <http://p> ?o. }"
        );
    }
}
