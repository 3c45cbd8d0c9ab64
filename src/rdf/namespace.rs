//! RDF namespace and prefix management
//!
//! This module handles namespace prefixes for compact IRI notation. The
//! query analyzer leaves prefixed names unexpanded; callers resolve them
//! through a `NamespaceManager` seeded with the prefixes collected from
//! the query.

use indexmap::IndexMap;
use thiserror::Error;

/// Prefix errors
#[derive(Error, Debug)]
pub enum PrefixError {
    /// Unknown prefix
    #[error("Unknown prefix: {0}")]
    UnknownPrefix(String),

    /// Invalid compact IRI
    #[error("Invalid compact IRI: {0}")]
    InvalidCompactIri(String),
}

pub type PrefixResult<T> = Result<T, PrefixError>;

/// Namespace (prefix → IRI mapping)
#[derive(Debug, Clone)]
pub struct Namespace {
    /// Prefix
    pub prefix: String,
    /// IRI
    pub iri: String,
}

impl Namespace {
    /// Create a new namespace
    pub fn new(prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            iri: iri.into(),
        }
    }
}

/// Namespace manager with common prefixes
pub struct NamespaceManager {
    /// Prefix → IRI mappings
    prefixes: IndexMap<String, String>,
}

impl NamespaceManager {
    /// Create a new namespace manager with common prefixes
    pub fn new() -> Self {
        let mut mgr = Self {
            prefixes: IndexMap::new(),
        };

        // Common RDF/RDFS/OWL prefixes
        mgr.add_prefix("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
        mgr.add_prefix("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
        mgr.add_prefix("xsd", "http://www.w3.org/2001/XMLSchema#");
        mgr.add_prefix("owl", "http://www.w3.org/2002/07/owl#");
        mgr.add_prefix("foaf", "http://xmlns.com/foaf/0.1/");
        mgr.add_prefix("dc", "http://purl.org/dc/elements/1.1/");
        mgr.add_prefix("dcterms", "http://purl.org/dc/terms/");

        mgr
    }

    /// Create a manager holding only the given prefixes, e.g. the ones a
    /// query analyzer collected
    pub fn from_prefixes<'a, I>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut mgr = Self {
            prefixes: IndexMap::new(),
        };
        for (prefix, iri) in prefixes {
            mgr.add_prefix(prefix, iri);
        }
        mgr
    }

    /// Add a prefix
    pub fn add_prefix(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), iri.into());
    }

    /// Get IRI for a prefix
    pub fn get_iri(&self, prefix: &str) -> PrefixResult<&str> {
        self.prefixes
            .get(prefix)
            .map(|s| s.as_str())
            .ok_or_else(|| PrefixError::UnknownPrefix(prefix.to_string()))
    }

    /// Expand a compact IRI (prefix:local) to a full IRI
    pub fn expand(&self, compact_iri: &str) -> PrefixResult<String> {
        if let Some(pos) = compact_iri.find(':') {
            let prefix = &compact_iri[..pos];
            let local = &compact_iri[pos + 1..];
            let iri = self.get_iri(prefix)?;
            Ok(format!("{}{}", iri, local))
        } else {
            Err(PrefixError::InvalidCompactIri(compact_iri.to_string()))
        }
    }

    /// Compact an IRI using known prefixes
    pub fn compact(&self, iri: &str) -> Option<String> {
        for (prefix, namespace_iri) in &self.prefixes {
            if iri.starts_with(namespace_iri) {
                let local = &iri[namespace_iri.len()..];
                return Some(format!("{}:{}", prefix, local));
            }
        }
        None
    }

    /// Get all registered prefixes, in registration order
    pub fn prefixes(&self) -> Vec<Namespace> {
        self.prefixes
            .iter()
            .map(|(prefix, iri)| Namespace::new(prefix.clone(), iri.clone()))
            .collect()
    }
}

impl Default for NamespaceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_prefixes() {
        let mgr = NamespaceManager::new();

        assert_eq!(
            mgr.get_iri("rdf").unwrap(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#"
        );
        assert_eq!(
            mgr.get_iri("rdfs").unwrap(),
            "http://www.w3.org/2000/01/rdf-schema#"
        );
        assert_eq!(
            mgr.get_iri("xsd").unwrap(),
            "http://www.w3.org/2001/XMLSchema#"
        );
    }

    #[test]
    fn test_expand() {
        let mgr = NamespaceManager::new();

        let expanded = mgr.expand("foaf:name").unwrap();
        assert_eq!(expanded, "http://xmlns.com/foaf/0.1/name");

        assert!(matches!(
            mgr.expand("nosuch:name"),
            Err(PrefixError::UnknownPrefix(_))
        ));
        assert!(matches!(
            mgr.expand("plain"),
            Err(PrefixError::InvalidCompactIri(_))
        ));
    }

    #[test]
    fn test_compact() {
        let mgr = NamespaceManager::new();

        let compacted = mgr.compact("http://xmlns.com/foaf/0.1/name");
        assert_eq!(compacted, Some("foaf:name".to_string()));

        assert_eq!(mgr.compact("http://no-such-namespace.example/x"), None);
    }

    #[test]
    fn test_from_prefixes() {
        let mgr = NamespaceManager::from_prefixes([("ex", "http://example.org/")]);
        assert_eq!(mgr.expand("ex:alice").unwrap(), "http://example.org/alice");
        assert_eq!(mgr.prefixes().len(), 1);
    }
}
