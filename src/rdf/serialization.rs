//! N-Quads-style rendering and re-ingestion of terms and statements
//!
//! Rendering is used to embed statement bodies inside INSERT/DELETE/ASK
//! query text; the graph component is always stripped because graph
//! scoping is carried by the surrounding clause, never by the triple body.

use super::types::{Node, RdfError, RdfResult, Statement};

/// Render statements as N-Quads-style triple text with the graph component
/// stripped, each statement terminated by `.`.
///
/// Pattern statements render variables with their sigil, so the output is
/// also valid as a SPARQL group pattern body.
pub fn format_triples(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(|statement| {
            format!(
                "{} {} {}.",
                statement.subject(),
                statement.predicate(),
                statement.object()
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a single serialized term back into a [`Node`].
///
/// Accepts the four term forms produced by [`Node::to_nquads`]: an
/// angle-bracketed IRI, a quoted literal with optional `@lang` or
/// `^^<datatype>` suffix, a `_:` blank node id, and a `?`/`$` variable.
pub fn parse_term(text: &str) -> RdfResult<Node> {
    let text = text.trim();

    if let Some(inner) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Node::named(inner);
    }
    if let Some(id) = text.strip_prefix("_:") {
        return Node::blank_with_id(id);
    }
    if text.starts_with(['?', '$']) {
        return Node::variable(text);
    }
    if text.starts_with('"') {
        return parse_literal(text);
    }

    Err(RdfError::UnrecognizedTerm(text.to_string()))
}

/// Parse one N-Quads line back into a [`Statement`] (triple or quad).
pub fn parse_statement(line: &str) -> RdfResult<Statement> {
    let line = line.trim();
    let line = line.strip_suffix('.').unwrap_or(line).trim_end();

    let tokens = split_terms(line);
    let terms = tokens
        .iter()
        .map(|token| parse_term(token))
        .collect::<RdfResult<Vec<_>>>()?;

    match terms.as_slice() {
        [subject, predicate, object] => Ok(Statement::new(
            subject.clone(),
            predicate.clone(),
            object.clone(),
        )),
        [subject, predicate, object, graph] => Ok(Statement::with_graph(
            subject.clone(),
            predicate.clone(),
            object.clone(),
            graph.clone(),
        )),
        _ => Err(RdfError::UnrecognizedTerm(line.to_string())),
    }
}

/// Split text into whitespace-separated terms, keeping quoted literals
/// (with their suffixes) and angle-bracketed IRIs intact.
pub(crate) fn split_terms(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut in_angle = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quote = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_quote = true;
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
            c if c.is_whitespace() && !in_angle => {
                if !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        terms.push(current);
    }
    terms
}

fn parse_literal(text: &str) -> RdfResult<Node> {
    // locate the closing quote, honouring backslash escapes
    let mut value = String::new();
    let mut escaped = false;
    let mut end = None;
    for (i, c) in text.char_indices().skip(1) {
        if escaped {
            value.push(unescape(c));
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            end = Some(i);
            break;
        } else {
            value.push(c);
        }
    }
    let end = end.ok_or_else(|| RdfError::UnrecognizedTerm(text.to_string()))?;

    let suffix = text[end + 1..].trim();
    if suffix.is_empty() {
        return Ok(Node::literal(value));
    }
    if let Some(language) = suffix.strip_prefix('@') {
        return Node::lang_literal(value, language);
    }
    if let Some(datatype) = suffix
        .strip_prefix("^^")
        .map(str::trim)
        .and_then(|d| d.strip_prefix('<'))
        .and_then(|d| d.strip_suffix('>'))
    {
        return Node::typed_literal(value, datatype);
    }

    Err(RdfError::UnrecognizedTerm(text.to_string()))
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        other => other,
    }
}
