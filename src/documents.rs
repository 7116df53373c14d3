//! XML document handling
//!
//! A small namespace-aware element tree read with quick-xml and written back
//! with the quick-xml [`Writer`]. Schema documents, supplied instance
//! documents and generated instance skeletons all use it.

use crate::error::{Error, Result};
use crate::namespaces::{split_qname, NamespaceContext, QName};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// XML attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    /// Resolved attribute name (unprefixed attributes have no namespace)
    pub qname: QName,
    /// Prefix as written
    pub prefix: Option<String>,
    /// Attribute value
    pub value: String,
}

impl Attribute {
    /// Name as written in the document
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.qname.local_name),
            None => self.qname.local_name.clone(),
        }
    }
}

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Prefix as written
    pub prefix: Option<String>,
    /// Element attributes, in document order
    pub attributes: Vec<Attribute>,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespace declarations made on this element: (prefix, uri),
    /// `None` prefix for the default namespace
    pub declarations: Vec<(Option<String>, String)>,
    /// In-scope namespace context
    #[serde(skip)]
    pub namespaces: NamespaceContext,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            prefix: None,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
            declarations: Vec::new(),
            namespaces: NamespaceContext::new(),
        }
    }

    /// Create an element from a name as written (`prefix:local` or `local`).
    /// The namespace is left unresolved; the prefix must be declared by an
    /// enclosing document.
    pub fn with_name(name: &str) -> Self {
        let (prefix, local) = split_qname(name);
        let mut element = Self::new(QName::local(local));
        element.prefix = prefix.map(str::to_string);
        element
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace()
    }

    /// Name as written in the document
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.qname.local_name),
            None => self.qname.local_name.clone(),
        }
    }

    /// Get an unqualified attribute value by local name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.qname.namespace.is_none() && a.qname.local_name == name)
            .map(|a| a.value.as_str())
    }

    /// Set (or replace) an unqualified attribute
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.prefix.is_none() && a.qname.local_name == name)
        {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                qname: QName::local(name),
                prefix: None,
                value,
            }),
        }
    }

    /// Declare a prefixed namespace on this element unless already declared here
    pub fn declare_namespace(&mut self, prefix: &str, namespace: &str) {
        let exists = self
            .declarations
            .iter()
            .any(|(p, _)| p.as_deref() == Some(prefix));
        if !exists {
            self.declarations
                .push((Some(prefix.to_string()), namespace.to_string()));
            self.namespaces.add_prefix(prefix, namespace);
        }
    }

    /// Reset the inherited default namespace for an unqualified element
    pub fn undeclare_default_namespace(&mut self) {
        if !self.declarations.iter().any(|(p, _)| p.is_none()) {
            self.declarations.push((None, String::new()));
            self.namespaces.set_default_namespace("");
        }
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Set text content
    pub fn set_text(&mut self, text: String) {
        self.text = Some(text);
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Child elements in the given namespace with the given local name
    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children
            .iter()
            .filter(move |e| e.namespace() == Some(namespace) && e.local_name() == local_name)
    }

    /// Write this element (and its subtree) to a quick-xml writer
    pub fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let name = self.qualified_name();
        let mut start = BytesStart::new(name.as_str());
        for (prefix, uri) in &self.declarations {
            let key = match prefix {
                Some(p) => format!("xmlns:{}", p),
                None => "xmlns".to_string(),
            };
            start.push_attribute((key.as_str(), uri.as_str()));
        }
        for attr in &self.attributes {
            let key = attr.qualified_name();
            start.push_attribute((key.as_str(), attr.value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }
}

/// XML Document representation
#[derive(Debug, Default)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let parent_ns = element_stack.last().map(|p| &p.namespaces);
                    let element = Self::parse_element(&e, parent_ns)?;
                    element_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            doc.root = Some(current);
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let parent_ns = element_stack.last().map(|p| &p.namespaces);
                    let element = Self::parse_element(&e, parent_ns)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else {
                        doc.root = Some(element);
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                        append_text(current, &text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        append_text(current, &text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // comments, processing instructions, doctype
            }
            buf.clear();
        }

        if !element_stack.is_empty() {
            return Err(Error::Xml("Unexpected end of document".to_string()));
        }

        Ok(doc)
    }

    /// Parse element from a start tag, resolving names against the
    /// parent's in-scope namespaces
    fn parse_element(start: &BytesStart, parent: Option<&NamespaceContext>) -> Result<Element> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut namespaces = parent.cloned().unwrap_or_else(NamespaceContext::new);
        let mut declarations = Vec::new();
        let mut raw_attributes = Vec::new();

        for attr_result in start.attributes() {
            let attr =
                attr_result.map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                namespaces.set_default_namespace(attr_value.as_str());
                declarations.push((None, attr_value));
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                namespaces.add_prefix(prefix, attr_value.as_str());
                declarations.push((Some(prefix.to_string()), attr_value));
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }

        let qname = namespaces.resolve(&name)?;
        let (prefix, _) = split_qname(&name);

        let mut attributes = Vec::with_capacity(raw_attributes.len());
        for (attr_name, value) in raw_attributes {
            let (attr_prefix, local) = split_qname(&attr_name);
            let qname = match attr_prefix {
                // unprefixed attributes are never in the default namespace
                None => QName::local(local),
                Some(_) => namespaces.resolve(&attr_name)?,
            };
            attributes.push(Attribute {
                qname,
                prefix: attr_prefix.map(str::to_string),
                value,
            });
        }

        Ok(Element {
            qname,
            prefix: prefix.map(str::to_string),
            attributes,
            text: None,
            children: Vec::new(),
            declarations,
            namespaces,
        })
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Take ownership of the root element
    pub fn into_root(self) -> Option<Element> {
        self.root
    }
}

fn append_text(element: &mut Element, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    match &mut element.text {
        Some(existing) => existing.push_str(text),
        None => element.text = Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_simple_document() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = Document::from_string(xml).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.local_name(), "root");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].text.as_deref(), Some("text"));
    }

    #[test]
    fn test_namespaces_resolve_through_scopes() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns="urn:d">
            <xs:element name="a" type="xs:string"/>
            <plain/>
        </xs:schema>"#;
        let doc = Document::from_string(xml).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.namespace(), Some(crate::XSD_NAMESPACE));
        assert_eq!(root.prefix.as_deref(), Some("xs"));

        let element = &root.children[0];
        assert_eq!(element.namespace(), Some(crate::XSD_NAMESPACE));
        assert_eq!(element.get_attribute("name"), Some("a"));
        // the child sees the prefixes declared on its ancestor
        let ty = element.namespaces.resolve("xs:string").unwrap();
        assert_eq!(ty.namespace(), Some(crate::XSD_NAMESPACE));

        assert_eq!(root.children[1].namespace(), Some("urn:d"));
    }

    #[test]
    fn test_undeclared_prefix_fails() {
        assert!(matches!(
            Document::from_string("<p:root/>"),
            Err(Error::Namespace(_))
        ));
    }

    #[test]
    fn test_unclosed_document_fails() {
        assert!(Document::from_string("<root><child>").is_err());
    }

    #[test]
    fn test_write_round_trip_shape() {
        let mut root = Element::with_name("po:order");
        root.declare_namespace("po", "http://example.com/po");
        root.set_attribute("status", "new");
        let mut child = Element::with_name("po:note");
        child.set_text("fragile & heavy".to_string());
        root.add_child(child);
        root.add_child(Element::with_name("po:empty"));

        let mut writer = Writer::new(Cursor::new(Vec::new()));
        root.write_to(&mut writer).unwrap();
        let xml = String::from_utf8(writer.into_inner().into_inner()).unwrap();
        assert_eq!(
            xml,
            r#"<po:order xmlns:po="http://example.com/po" status="new"><po:note>fragile &amp; heavy</po:note><po:empty/></po:order>"#
        );

        let parsed = Document::from_string(&xml).unwrap().into_root().unwrap();
        assert_eq!(parsed.namespace(), Some("http://example.com/po"));
        assert_eq!(parsed.children[0].text.as_deref(), Some("fragile & heavy"));
    }
}
