//! RDF term and statement definitions
//!
//! This module provides wrapper types around the oxrdf library for RDF
//! primitives, extended with query variables and the statement tuple.

use oxrdf::{
    BlankNode as OxBlankNode, Literal as OxLiteral, NamedNode as OxNamedNode,
    Variable as OxVariable,
};
use std::fmt;
use thiserror::Error;

/// IRI of the `rdf:langString` datatype carried by language-tagged literals.
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

/// RDF errors
#[derive(Error, Debug)]
pub enum RdfError {
    /// Invalid IRI
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    /// Invalid blank node
    #[error("Invalid blank node: {0}")]
    InvalidBlankNode(String),

    /// Invalid literal
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),

    /// Invalid variable name
    #[error("Invalid variable: {0}")]
    InvalidVariable(String),

    /// Term text that fits no term form
    #[error("Unrecognized term: {0}")]
    UnrecognizedTerm(String),

    /// Pattern operation invoked on a non-concrete term
    #[error("Pattern operation on non-concrete term: {0}")]
    PatternOperand(String),
}

pub type RdfResult<T> = Result<T, RdfError>;

/// Named node (IRI)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedNode(OxNamedNode);

impl NamedNode {
    /// Create a new named node from an absolute IRI string
    pub fn new(iri: &str) -> RdfResult<Self> {
        OxNamedNode::new(iri)
            .map(Self)
            .map_err(|e| RdfError::InvalidIri(e.to_string()))
    }

    /// Get the IRI string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Blank node (anonymous node)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlankNode(OxBlankNode);

impl BlankNode {
    /// Create a new blank node with a unique identifier
    pub fn new() -> Self {
        Self(OxBlankNode::default())
    }

    /// Create a blank node from a string identifier
    pub fn from_identifier(id: &str) -> RdfResult<Self> {
        OxBlankNode::new(id)
            .map(Self)
            .map_err(|e| RdfError::InvalidBlankNode(e.to_string()))
    }

    /// Get the blank node identifier
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for BlankNode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// RDF literal value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(OxLiteral);

impl Literal {
    /// Create a literal from its parts.
    ///
    /// A language tag implies the `rdf:langString` datatype; combining a
    /// language tag with any other datatype is rejected. Without datatype
    /// and language the literal defaults to `xsd:string`.
    pub fn new(
        value: impl Into<String>,
        datatype: Option<NamedNode>,
        language: Option<&str>,
    ) -> RdfResult<Self> {
        match (datatype, language) {
            (None, None) => Ok(Self::simple(value)),
            (None, Some(language)) => Self::language_tagged(value, language),
            (Some(datatype), None) => Ok(Self::typed(value, datatype)),
            (Some(datatype), Some(language)) => {
                if datatype.as_str() == RDF_LANG_STRING {
                    Self::language_tagged(value, language)
                } else {
                    Err(RdfError::InvalidLiteral(format!(
                        "datatype {} conflicts with language tag {}",
                        datatype, language
                    )))
                }
            }
        }
    }

    /// Create a simple literal (plain string, `xsd:string`)
    pub fn simple(value: impl Into<String>) -> Self {
        Self(OxLiteral::new_simple_literal(value))
    }

    /// Create a literal with a language tag
    pub fn language_tagged(value: impl Into<String>, language: &str) -> RdfResult<Self> {
        OxLiteral::new_language_tagged_literal(value, language)
            .map(Self)
            .map_err(|e| RdfError::InvalidLiteral(e.to_string()))
    }

    /// Create a typed literal
    pub fn typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self(OxLiteral::new_typed_literal(value, datatype.0))
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        self.0.value()
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        self.0.language()
    }

    /// Get the datatype
    pub fn datatype(&self) -> NamedNode {
        NamedNode(self.0.datatype().into_owned())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Query variable, stored without its `?`/`$` sigil
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable(OxVariable);

impl Variable {
    /// Create a variable; a leading `?` or `$` sigil is stripped
    pub fn new(name: &str) -> RdfResult<Self> {
        let name = name.strip_prefix(['?', '$']).unwrap_or(name);
        OxVariable::new(name)
            .map(Self)
            .map_err(|e| RdfError::InvalidVariable(e.to_string()))
    }

    /// Get the variable name (no sigil)
    pub fn name(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An RDF term: one of the three concrete node kinds, or a query variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// Named node (IRI)
    NamedNode(NamedNode),
    /// Blank node
    BlankNode(BlankNode),
    /// Literal value
    Literal(Literal),
    /// Query variable, only valid inside patterns
    Variable(Variable),
}

impl Node {
    /// Create a named node term
    pub fn named(iri: &str) -> RdfResult<Self> {
        Ok(Node::NamedNode(NamedNode::new(iri)?))
    }

    /// Create a fresh blank node term
    pub fn blank() -> Self {
        Node::BlankNode(BlankNode::new())
    }

    /// Create a blank node term with the given identifier
    pub fn blank_with_id(id: &str) -> RdfResult<Self> {
        Ok(Node::BlankNode(BlankNode::from_identifier(id)?))
    }

    /// Create a simple literal term
    pub fn literal(value: impl Into<String>) -> Self {
        Node::Literal(Literal::simple(value))
    }

    /// Create a typed literal term
    pub fn typed_literal(value: impl Into<String>, datatype: &str) -> RdfResult<Self> {
        Ok(Node::Literal(Literal::typed(value, NamedNode::new(datatype)?)))
    }

    /// Create a language-tagged literal term
    pub fn lang_literal(value: impl Into<String>, language: &str) -> RdfResult<Self> {
        Ok(Node::Literal(Literal::language_tagged(value, language)?))
    }

    /// Create a variable term
    pub fn variable(name: &str) -> RdfResult<Self> {
        Ok(Node::Variable(Variable::new(name)?))
    }

    /// Check if this is a named node
    pub fn is_named(&self) -> bool {
        matches!(self, Node::NamedNode(_))
    }

    /// Check if this is a blank node
    pub fn is_blank(&self) -> bool {
        matches!(self, Node::BlankNode(_))
    }

    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal(_))
    }

    /// Check if this is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, Node::Variable(_))
    }

    /// A node is concrete unless it is a variable
    pub fn is_concrete(&self) -> bool {
        !self.is_variable()
    }

    /// Get the named node if this is one
    pub fn as_named_node(&self) -> Option<&NamedNode> {
        match self {
            Node::NamedNode(n) => Some(n),
            _ => None,
        }
    }

    /// Get the literal if this is one
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Node::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Check whether this concrete node matches a pattern node.
    ///
    /// A variable pattern matches any concrete node; otherwise both nodes
    /// must be the same kind and equal. Calling this on a variable receiver
    /// is a usage error.
    pub fn matches(&self, pattern: &Node) -> RdfResult<bool> {
        if !self.is_concrete() {
            return Err(RdfError::PatternOperand(self.to_string()));
        }
        Ok(match pattern {
            Node::Variable(_) => true,
            other => self == other,
        })
    }

    /// Render this term in N-Quads syntax
    pub fn to_nquads(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::NamedNode(n) => write!(f, "{}", n),
            Node::BlankNode(b) => write!(f, "{}", b),
            Node::Literal(l) => write!(f, "{}", l),
            Node::Variable(v) => write!(f, "{}", v),
        }
    }
}

impl From<NamedNode> for Node {
    fn from(node: NamedNode) -> Self {
        Node::NamedNode(node)
    }
}

impl From<BlankNode> for Node {
    fn from(node: BlankNode) -> Self {
        Node::BlankNode(node)
    }
}

impl From<Literal> for Node {
    fn from(literal: Literal) -> Self {
        Node::Literal(literal)
    }
}

impl From<Variable> for Node {
    fn from(variable: Variable) -> Self {
        Node::Variable(variable)
    }
}

/// An RDF statement: a triple, or a quad when a graph is present.
///
/// Statements are immutable after construction. Any position may hold a
/// variable, which makes the statement a pattern; only fully concrete
/// statements can be inserted as data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    subject: Node,
    predicate: Node,
    object: Node,
    graph: Option<Node>,
}

impl Statement {
    /// Create a new triple
    pub fn new(subject: Node, predicate: Node, object: Node) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph: None,
        }
    }

    /// Create a new quad
    pub fn with_graph(subject: Node, predicate: Node, object: Node, graph: Node) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph: Some(graph),
        }
    }

    /// Subject of the statement
    pub fn subject(&self) -> &Node {
        &self.subject
    }

    /// Predicate of the statement
    pub fn predicate(&self) -> &Node {
        &self.predicate
    }

    /// Object of the statement
    pub fn object(&self) -> &Node {
        &self.object
    }

    /// Graph of the statement, absent for triples
    pub fn graph(&self) -> Option<&Node> {
        self.graph.as_ref()
    }

    /// True when no graph component is present
    pub fn is_triple(&self) -> bool {
        self.graph.is_none()
    }

    /// True when a graph component is present
    pub fn is_quad(&self) -> bool {
        self.graph.is_some()
    }

    /// A statement is concrete when every present component is concrete
    pub fn is_concrete(&self) -> bool {
        self.subject.is_concrete()
            && self.predicate.is_concrete()
            && self.object.is_concrete()
            && self.graph.as_ref().map_or(true, Node::is_concrete)
    }

    /// Render this statement as one N-Quads line
    pub fn to_nquads(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.graph {
            Some(graph) => write!(
                f,
                "{} {} {} {} .",
                self.subject, self.predicate, self.object, graph
            ),
            None => write!(f, "{} {} {} .", self.subject, self.predicate, self.object),
        }
    }
}
