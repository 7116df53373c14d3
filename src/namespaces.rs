//! XML namespace handling
//!
//! This module provides qualified names, in-scope prefix mappings, and the
//! per-run prefix table used to qualify element names in generated forms.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()).filter(|s: &String| !s.is_empty()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self::new(Some(namespace), local_name)
    }

    /// Namespace as a string slice
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

/// Namespace context for resolving prefixes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI
    prefixes: HashMap<Prefix, NamespaceUri>,
    /// Default namespace (no prefix)
    default_namespace: Option<NamespaceUri>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        let mut ctx = Self::default();
        ctx.add_prefix("xml", crate::XML_NAMESPACE);
        ctx
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Set the default namespace; an empty URI undeclares it
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        self.default_namespace = if namespace.is_empty() {
            None
        } else {
            Some(namespace)
        };
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Resolve a prefixed name to a QName, applying the default namespace
    /// to unprefixed names
    pub fn resolve(&self, prefixed_name: &str) -> Result<QName> {
        match split_qname(prefixed_name) {
            (Some(prefix), local) => {
                let namespace = self
                    .get_namespace(prefix)
                    .ok_or_else(|| Error::Namespace(format!("Unknown prefix: {}", prefix)))?;
                Ok(QName::namespaced(namespace, local))
            }
            (None, local) => Ok(QName::new(self.default_namespace.clone(), local)),
        }
    }
}

/// Prefixes the generated form declares itself; allocated prefixes never
/// take one of these.
pub const RESERVED_PREFIXES: &[&str] = &["xforms", "ev", "xsi", "xs", "chiba", "xlink", "xml", "xmlns"];

/// Namespace URI to prefix table for one synthesis run.
///
/// Each namespace is assigned a prefix exactly once, derived from the last
/// segment of its URI.
#[derive(Debug, Clone, Default)]
pub struct NamespacePrefixTable {
    prefixes: IndexMap<NamespaceUri, Prefix>,
    taken: HashSet<Prefix>,
}

impl NamespacePrefixTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            prefixes: IndexMap::new(),
            taken: RESERVED_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Prefix for a namespace, allocating one on first use
    pub fn prefix_for(&mut self, namespace: &str) -> &str {
        if !self.prefixes.contains_key(namespace) {
            let base = base_prefix(namespace);
            let mut prefix = base.clone();
            let mut i = 1;
            while self.taken.contains(&prefix) {
                prefix = format!("{}{}", base, i);
                i += 1;
            }
            self.taken.insert(prefix.clone());
            self.prefixes.insert(namespace.to_string(), prefix);
        }
        &self.prefixes[namespace]
    }

    /// Qualify a local name with the prefix of its namespace (if any)
    pub fn qualify(&mut self, local_name: &str, namespace: Option<&str>) -> String {
        match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => format!("{}:{}", self.prefix_for(ns), local_name),
            None => local_name.to_string(),
        }
    }

    /// Allocated (prefix, namespace) pairs in allocation order
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .map(|(ns, prefix)| (prefix.as_str(), ns.as_str()))
    }

    /// Number of allocated prefixes
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Whether no prefix has been allocated
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// Last URI segment, reduced to NCName characters
fn base_prefix(namespace: &str) -> String {
    let trimmed = namespace.trim_end_matches(['/', '#']);
    let segment = trimmed
        .rsplit(['/', ':', '#'])
        .next()
        .unwrap_or(trimmed);
    let mut prefix: String = segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect();
    if !prefix
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
    {
        prefix.insert_str(0, "ns");
    }
    if prefix.to_ascii_lowercase().starts_with("xml") {
        prefix.insert_str(0, "ns");
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_creation() {
        let qname = QName::namespaced("http://example.com", "element");
        assert_eq!(qname.namespace(), Some("http://example.com"));
        assert_eq!(qname.local_name, "element");
        assert_eq!(QName::new(Some(""), "x").namespace, None);
    }

    #[test]
    fn test_qname_display() {
        let qname = QName::namespaced("http://example.com", "element");
        assert_eq!(qname.to_string(), "{http://example.com}element");
        assert_eq!(QName::local("element").to_string(), "element");
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("element"), (None, "element"));
        assert_eq!(split_qname("xs:element"), (Some("xs"), "element"));
    }

    #[test]
    fn test_resolve_prefixed_name() {
        let mut ctx = NamespaceContext::new();
        ctx.add_prefix("xs", "http://www.w3.org/2001/XMLSchema");
        ctx.set_default_namespace("http://example.com");

        let qname = ctx.resolve("xs:element").unwrap();
        assert_eq!(qname.namespace(), Some("http://www.w3.org/2001/XMLSchema"));
        assert_eq!(qname.local_name, "element");

        let qname = ctx.resolve("order").unwrap();
        assert_eq!(qname.namespace(), Some("http://example.com"));

        assert!(ctx.resolve("nope:order").is_err());
    }

    #[test]
    fn test_prefix_allocation_once_per_namespace() {
        let mut table = NamespacePrefixTable::new();
        assert_eq!(table.qualify("order", Some("http://example.com/po")), "po:order");
        assert_eq!(table.qualify("item", Some("http://example.com/po")), "po:item");
        assert_eq!(table.qualify("item", None), "item");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_prefix_collisions_get_suffix() {
        let mut table = NamespacePrefixTable::new();
        assert_eq!(table.prefix_for("http://a.example.com/po"), "po");
        assert_eq!(table.prefix_for("http://b.example.com/po/"), "po1");
        assert_eq!(table.prefix_for("http://c.example.com/po"), "po2");
        // reserved prefixes are never handed out
        assert_eq!(table.prefix_for("http://example.com/xs"), "xs1");
        let decls: Vec<_> = table.declarations().collect();
        assert_eq!(decls[0], ("po", "http://a.example.com/po"));
        assert_eq!(decls.len(), 4);
    }

    #[test]
    fn test_prefix_sanitized() {
        let mut table = NamespacePrefixTable::new();
        assert_eq!(table.prefix_for("urn:example:2024"), "ns2024");
        assert_eq!(table.prefix_for("http://example.com/xmlstuff"), "nsxmlstuff");
    }
}
