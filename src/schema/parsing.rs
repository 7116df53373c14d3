//! XSD document parsing
//!
//! Loads a single XSD document into a [`SchemaModel`]. Global components are
//! registered in a first pass so that references resolve regardless of
//! declaration order; definitions are then built on demand, bases before the
//! types derived from them.

use super::graph::{SchemaModel, TypeGraph};
use super::particles::{parse_occurs, ModelGroup, Particle, Term, Wildcard, Compositor};
use super::types::{
    AttributeDecl, AttributeUse, AttributeUseId, ComplexType, ContentType, DerivationMethod,
    ElementDecl, ElementId, Facets, SimpleType, TypeDef, TypeId, ValueConstraint, Variety,
};
use super::builtins::BuiltinKind;
use crate::documents::{Document, Element};
use crate::error::{Error, ParseError, Result};
use crate::namespaces::QName;
use crate::XSD_NAMESPACE;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// XSD element local names
mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const GROUP: &str = "group";
    pub const ANNOTATION: &str = "annotation";
    pub const DOCUMENTATION: &str = "documentation";
    pub const IMPORT: &str = "import";
    pub const INCLUDE: &str = "include";
    pub const REDEFINE: &str = "redefine";
    pub const RESTRICTION: &str = "restriction";
    pub const EXTENSION: &str = "extension";
    pub const LIST: &str = "list";
    pub const UNION: &str = "union";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const ANY: &str = "any";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
    pub const ENUMERATION: &str = "enumeration";
    pub const MIN_INCLUSIVE: &str = "minInclusive";
    pub const MAX_INCLUSIVE: &str = "maxInclusive";
}

/// XSD attribute names
mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const ELEMENT_FORM_DEFAULT: &str = "elementFormDefault";
    pub const ATTRIBUTE_FORM_DEFAULT: &str = "attributeFormDefault";
    pub const FORM: &str = "form";
    pub const DEFAULT: &str = "default";
    pub const FIXED: &str = "fixed";
    pub const BASE: &str = "base";
    pub const VALUE: &str = "value";
    pub const MIXED: &str = "mixed";
    pub const ABSTRACT: &str = "abstract";
    pub const ITEM_TYPE: &str = "itemType";
    pub const MEMBER_TYPES: &str = "memberTypes";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const USE: &str = "use";
    pub const NAMESPACE: &str = "namespace";
    pub const PROCESS_CONTENTS: &str = "processContents";
}

use xsd_attrs as attrs;
use xsd_elements as elements;

impl SchemaModel {
    /// Parse an XSD schema from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        let doc = Document::from_string(xml)?;
        Self::from_document(&doc)
    }

    /// Parse an XSD schema from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let doc = Document::from_file(path)?;
        Self::from_document(&doc)
    }

    /// Parse an XSD schema from a parsed Document
    pub fn from_document(doc: &Document) -> Result<Self> {
        let root = doc
            .root()
            .ok_or_else(|| Error::Parse(ParseError::new("Empty document")))?;

        if root.namespace() != Some(XSD_NAMESPACE) || root.local_name() != elements::SCHEMA {
            return Err(Error::Parse(ParseError::new(format!(
                "Expected xs:schema root element, got {}",
                root.qualified_name()
            ))));
        }

        let mut loader = Loader::new(root);
        loader.register_globals(root)?;
        loader.build()?;
        Ok(loader.model)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    Building,
    Built,
}

struct Loader<'a> {
    model: SchemaModel,
    target_namespace: Option<String>,
    qualified_elements: bool,
    qualified_attributes: bool,
    pending_types: IndexMap<TypeId, &'a Element>,
    type_state: HashMap<TypeId, BuildState>,
    pending_elements: Vec<(ElementId, &'a Element)>,
    groups: HashMap<QName, &'a Element>,
    attribute_groups: HashMap<QName, &'a Element>,
    attributes: HashMap<QName, &'a Element>,
    group_stack: HashSet<QName>,
    attribute_group_stack: HashSet<QName>,
}

impl<'a> Loader<'a> {
    fn new(schema: &Element) -> Self {
        let target_namespace = schema
            .get_attribute(attrs::TARGET_NAMESPACE)
            .filter(|ns| !ns.is_empty())
            .map(str::to_string);
        Self {
            model: SchemaModel::new(target_namespace.as_deref()),
            qualified_elements: schema.get_attribute(attrs::ELEMENT_FORM_DEFAULT)
                == Some("qualified"),
            qualified_attributes: schema.get_attribute(attrs::ATTRIBUTE_FORM_DEFAULT)
                == Some("qualified"),
            target_namespace,
            pending_types: IndexMap::new(),
            type_state: HashMap::new(),
            pending_elements: Vec::new(),
            groups: HashMap::new(),
            attribute_groups: HashMap::new(),
            attributes: HashMap::new(),
            group_stack: HashSet::new(),
            attribute_group_stack: HashSet::new(),
        }
    }

    fn global_name(&self, elem: &Element) -> Result<QName> {
        let name = elem.get_attribute(attrs::NAME).ok_or_else(|| {
            ParseError::new(format!(
                "Global {} missing 'name' attribute",
                elem.local_name()
            ))
            .with_location(format!("schema/{}", elem.local_name()))
        })?;
        Ok(QName::new(self.target_namespace.as_deref(), name))
    }

    /// First pass: make every global component resolvable by name
    fn register_globals(&mut self, schema: &'a Element) -> Result<()> {
        for child in xsd_children(schema) {
            match child.local_name() {
                elements::COMPLEX_TYPE => {
                    let name = self.global_name(child)?;
                    let id = self.model.add_type(TypeDef::Complex(ComplexType {
                        name: Some(name),
                        ..ComplexType::default()
                    }));
                    self.pending_types.insert(id, child);
                }
                elements::SIMPLE_TYPE => {
                    let name = self.global_name(child)?;
                    let id = self.model.add_type(TypeDef::Simple(SimpleType {
                        name: Some(name),
                        ..SimpleType::default()
                    }));
                    self.pending_types.insert(id, child);
                }
                elements::ELEMENT => {
                    let name = self.global_name(child)?;
                    let id = self
                        .model
                        .add_global_element(ElementDecl::new(name, None));
                    self.pending_elements.push((id, child));
                }
                elements::GROUP => {
                    let name = self.global_name(child)?;
                    self.groups.insert(name, child);
                }
                elements::ATTRIBUTE_GROUP => {
                    let name = self.global_name(child)?;
                    self.attribute_groups.insert(name, child);
                }
                elements::ATTRIBUTE => {
                    let name = self.global_name(child)?;
                    self.attributes.insert(name, child);
                }
                elements::IMPORT | elements::INCLUDE | elements::REDEFINE => {
                    debug!(
                        "ignoring xs:{} of {:?}",
                        child.local_name(),
                        child.get_attribute("schemaLocation")
                    );
                }
                other => debug!("skipping top-level xs:{}", other),
            }
        }
        Ok(())
    }

    /// Second pass: build every global definition
    fn build(&mut self) -> Result<()> {
        let ids: Vec<TypeId> = self.pending_types.keys().copied().collect();
        for id in ids {
            self.ensure_type(id)?;
        }

        let elements = std::mem::take(&mut self.pending_elements);
        for (id, elem) in elements {
            let name = self.model.element(id).name.clone();
            let decl = self.parse_element_decl(elem, name, None)?;
            self.model.set_element(id, decl);
        }
        Ok(())
    }

    /// Build a pending global type unless it is built or being built
    fn ensure_type(&mut self, id: TypeId) -> Result<()> {
        if self.type_state.contains_key(&id) {
            return Ok(());
        }
        let Some(elem) = self.pending_types.get(&id).copied() else {
            return Ok(());
        };
        self.type_state.insert(id, BuildState::Building);

        let name = self.model.type_def(id).name().cloned();
        let def = if elem.local_name() == elements::COMPLEX_TYPE {
            TypeDef::Complex(self.parse_complex_type(elem, id, name)?)
        } else {
            TypeDef::Simple(self.parse_simple_type(elem, name)?)
        };
        self.model.set_type(id, def);
        self.type_state.insert(id, BuildState::Built);
        Ok(())
    }

    /// Resolve a QName-valued attribute to a type
    fn resolve_type(&mut self, context: &Element, reference: &str) -> Result<Option<TypeId>> {
        let qname = match context.namespaces.resolve(reference) {
            Ok(qname) => qname,
            Err(e) => {
                debug!("unresolved type reference '{}': {}", reference, e);
                return Ok(None);
            }
        };
        match self.model.find_type(qname.namespace(), &qname.local_name) {
            Some(id) => {
                self.ensure_type(id)?;
                Ok(Some(id))
            }
            None => {
                debug!("unresolved type reference '{}'", qname);
                Ok(None)
            }
        }
    }

    fn resolve_qname(&self, context: &Element, reference: &str) -> Option<QName> {
        match context.namespaces.resolve(reference) {
            Ok(qname) => Some(qname),
            Err(e) => {
                debug!("unresolved reference '{}': {}", reference, e);
                None
            }
        }
    }

    fn any_simple_type(&self) -> Option<TypeId> {
        self.model.builtin(BuiltinKind::AnySimpleType)
    }

    fn parse_anonymous_complex(&mut self, elem: &'a Element) -> Result<TypeId> {
        let id = self
            .model
            .add_type(TypeDef::Complex(ComplexType::default()));
        self.type_state.insert(id, BuildState::Building);
        let def = self.parse_complex_type(elem, id, None)?;
        self.model.set_type(id, TypeDef::Complex(def));
        self.type_state.insert(id, BuildState::Built);
        Ok(id)
    }

    fn parse_anonymous_simple(&mut self, elem: &'a Element) -> Result<TypeId> {
        let def = self.parse_simple_type(elem, None)?;
        Ok(self.model.add_type(TypeDef::Simple(def)))
    }

    fn parse_complex_type(
        &mut self,
        elem: &'a Element,
        self_id: TypeId,
        name: Option<QName>,
    ) -> Result<ComplexType> {
        let mut ct = ComplexType {
            name,
            base: Some(self.model.any_type()),
            is_abstract: is_true(elem.get_attribute(attrs::ABSTRACT)),
            documentation: documentation(elem),
            ..ComplexType::default()
        };
        let mut mixed = is_true(elem.get_attribute(attrs::MIXED));

        if let Some(content) = first_child(elem, &[elements::SIMPLE_CONTENT]) {
            let derivation = derivation_child(content)?;
            let (method, base) = self.parse_derivation(derivation)?;
            let (own, prohibited) = self.parse_attribute_uses(derivation)?;
            ct.base = base;
            ct.derivation = method;
            ct.content = ContentType::Simple;
            ct.attribute_uses = self.merge_attribute_uses(base, method, own, &prohibited);
            return Ok(ct);
        }

        if let Some(content) = first_child(elem, &[elements::COMPLEX_CONTENT]) {
            mixed |= is_true(content.get_attribute(attrs::MIXED));
            let derivation = derivation_child(content)?;
            let (method, base) = self.parse_derivation(derivation)?;
            let own_particle = self.parse_content_particle(derivation, self_id)?;
            let (own, prohibited) = self.parse_attribute_uses(derivation)?;

            ct.base = base;
            ct.derivation = method;
            ct.particle = match method {
                DerivationMethod::Extension => {
                    let base_particle = base
                        .and_then(|b| self.model.complex_type(b))
                        .and_then(|b| b.particle.clone());
                    match (base_particle, own_particle) {
                        (Some(inherited), Some(own)) => Some(Particle::sequence(vec![inherited, own])),
                        (inherited, own) => inherited.or(own),
                    }
                }
                _ => own_particle,
            };
            ct.attribute_uses = self.merge_attribute_uses(base, method, own, &prohibited);
        } else {
            ct.particle = self.parse_content_particle(elem, self_id)?;
            let (own, _) = self.parse_attribute_uses(elem)?;
            ct.attribute_uses = own;
        }

        ct.content = if mixed {
            ContentType::Mixed
        } else if ct.particle.is_some() {
            ContentType::ElementOnly
        } else {
            ContentType::Empty
        };
        Ok(ct)
    }

    /// Method and base of an xs:extension / xs:restriction
    fn parse_derivation(
        &mut self,
        derivation: &'a Element,
    ) -> Result<(DerivationMethod, Option<TypeId>)> {
        let method = if derivation.local_name() == elements::EXTENSION {
            DerivationMethod::Extension
        } else {
            DerivationMethod::Restriction
        };
        let reference = derivation.get_attribute(attrs::BASE).ok_or_else(|| {
            ParseError::new(format!(
                "xs:{} missing 'base' attribute",
                derivation.local_name()
            ))
        })?;
        let base = self.resolve_type(derivation, reference)?;
        Ok((method, base))
    }

    fn merge_attribute_uses(
        &self,
        base: Option<TypeId>,
        method: DerivationMethod,
        own: Vec<AttributeUseId>,
        prohibited: &[QName],
    ) -> Vec<AttributeUseId> {
        let inherited = base
            .and_then(|b| self.model.complex_type(b))
            .map(|b| b.attribute_uses.clone())
            .unwrap_or_default();

        let mut uses: Vec<AttributeUseId> = match method {
            DerivationMethod::Extension => inherited,
            _ => {
                let redeclared: Vec<&QName> = own
                    .iter()
                    .map(|id| &self.model.attribute_use(*id).decl.name)
                    .collect();
                inherited
                    .into_iter()
                    .filter(|id| {
                        let name = &self.model.attribute_use(*id).decl.name;
                        !prohibited.contains(name) && !redeclared.contains(&name)
                    })
                    .collect()
            }
        };
        uses.extend(own);
        uses
    }

    /// Particle of the content model child (sequence, choice, all or a
    /// group reference) of `parent`
    fn parse_content_particle(
        &mut self,
        parent: &'a Element,
        enclosing: TypeId,
    ) -> Result<Option<Particle>> {
        match first_child(
            parent,
            &["sequence", "choice", "all", elements::GROUP],
        ) {
            Some(model) => self.parse_particle(model, enclosing),
            None => Ok(None),
        }
    }

    fn parse_particle(&mut self, elem: &'a Element, enclosing: TypeId) -> Result<Option<Particle>> {
        let occurs = parse_occurs(
            elem.get_attribute(attrs::MIN_OCCURS),
            elem.get_attribute(attrs::MAX_OCCURS),
        )?;

        if let Some(compositor) = Compositor::from_local_name(elem.local_name()) {
            let mut particles = Vec::new();
            for child in xsd_children(elem) {
                if let Some(particle) = self.parse_particle(child, enclosing)? {
                    particles.push(particle);
                }
            }
            return Ok(Some(Particle::new(
                occurs,
                Term::Group(ModelGroup::new(compositor, particles)),
            )));
        }

        match elem.local_name() {
            elements::ELEMENT => Ok(self
                .parse_local_element(elem, enclosing)?
                .map(|id| Particle::element(occurs, id))),
            elements::GROUP => {
                let Some(reference) = elem.get_attribute(attrs::REF) else {
                    return Err(ParseError::new("Local xs:group missing 'ref' attribute").into());
                };
                let Some(name) = self.resolve_qname(elem, reference) else {
                    return Ok(None);
                };
                let Some(definition) = self.groups.get(&name).copied() else {
                    debug!("unresolved group reference '{}'", name);
                    return Ok(None);
                };
                if !self.group_stack.insert(name.clone()) {
                    debug!("circular group reference '{}'", name);
                    return Ok(None);
                }
                let model = first_child(definition, &["sequence", "choice", "all"]);
                let result = match model {
                    Some(model) => self.parse_particle(model, enclosing),
                    None => Ok(None),
                };
                self.group_stack.remove(&name);
                Ok(result?.map(|particle| Particle::new(occurs, particle.term)))
            }
            elements::ANY => {
                let defaults = Wildcard::default();
                Ok(Some(Particle::new(
                    occurs,
                    Term::Wildcard(Wildcard {
                        namespace: elem
                            .get_attribute(attrs::NAMESPACE)
                            .map(str::to_string)
                            .unwrap_or(defaults.namespace),
                        process_contents: elem
                            .get_attribute(attrs::PROCESS_CONTENTS)
                            .map(str::to_string)
                            .unwrap_or(defaults.process_contents),
                    }),
                )))
            }
            other => {
                debug!("skipping xs:{} in content model", other);
                Ok(None)
            }
        }
    }

    fn parse_local_element(
        &mut self,
        elem: &'a Element,
        enclosing: TypeId,
    ) -> Result<Option<ElementId>> {
        if let Some(reference) = elem.get_attribute(attrs::REF) {
            let Some(name) = self.resolve_qname(elem, reference) else {
                return Ok(None);
            };
            let found = self.model.find_element(name.namespace(), &name.local_name);
            if found.is_none() {
                debug!("unresolved element reference '{}'", name);
            }
            return Ok(found);
        }

        let local = elem
            .get_attribute(attrs::NAME)
            .ok_or_else(|| ParseError::new("Local element missing 'name' attribute"))?;
        let qualified = match elem.get_attribute(attrs::FORM) {
            Some(form) => form == "qualified",
            None => self.qualified_elements,
        };
        let namespace = if qualified {
            self.target_namespace.clone()
        } else {
            None
        };
        let decl = self.parse_element_decl(elem, QName::new(namespace, local), Some(enclosing))?;
        Ok(Some(self.model.add_element(decl)))
    }

    fn parse_element_decl(
        &mut self,
        elem: &'a Element,
        name: QName,
        enclosing: Option<TypeId>,
    ) -> Result<ElementDecl> {
        let type_id = if let Some(reference) = elem.get_attribute(attrs::TYPE) {
            self.resolve_type(elem, reference)?
        } else if let Some(inline) = first_child(elem, &[elements::COMPLEX_TYPE]) {
            Some(self.parse_anonymous_complex(inline)?)
        } else if let Some(inline) = first_child(elem, &[elements::SIMPLE_TYPE]) {
            Some(self.parse_anonymous_simple(inline)?)
        } else {
            Some(self.model.any_type())
        };

        Ok(ElementDecl {
            name,
            type_id,
            value_constraint: value_constraint(elem),
            enclosing,
            documentation: documentation(elem),
        })
    }

    fn parse_simple_type(&mut self, elem: &'a Element, name: Option<QName>) -> Result<SimpleType> {
        let mut st = SimpleType {
            name,
            documentation: documentation(elem),
            ..SimpleType::default()
        };

        let derivation = first_child(
            elem,
            &[elements::RESTRICTION, elements::LIST, elements::UNION],
        )
        .ok_or_else(|| {
            ParseError::new("xs:simpleType must contain xs:restriction, xs:list or xs:union")
        })?;

        match derivation.local_name() {
            elements::RESTRICTION => {
                st.base = match derivation.get_attribute(attrs::BASE) {
                    Some(reference) => self.resolve_type(derivation, reference)?,
                    None => match first_child(derivation, &[elements::SIMPLE_TYPE]) {
                        Some(inline) => Some(self.parse_anonymous_simple(inline)?),
                        None => None,
                    },
                };
                st.variety = st
                    .base
                    .and_then(|b| self.model.simple_type(b))
                    .map(|b| b.variety.clone())
                    .unwrap_or_default();
                st.facets = parse_facets(derivation);
            }
            elements::LIST => {
                st.base = self.any_simple_type();
                let item = match derivation.get_attribute(attrs::ITEM_TYPE) {
                    Some(reference) => self.resolve_type(derivation, reference)?,
                    None => match first_child(derivation, &[elements::SIMPLE_TYPE]) {
                        Some(inline) => Some(self.parse_anonymous_simple(inline)?),
                        None => None,
                    },
                };
                st.variety = Variety::List { item };
            }
            _ => {
                st.base = self.any_simple_type();
                let mut members = Vec::new();
                if let Some(list) = derivation.get_attribute(attrs::MEMBER_TYPES) {
                    for reference in list.split_whitespace() {
                        if let Some(member) = self.resolve_type(derivation, reference)? {
                            members.push(member);
                        }
                    }
                }
                for inline in xsd_children(derivation)
                    .filter(|c| c.local_name() == elements::SIMPLE_TYPE)
                {
                    members.push(self.parse_anonymous_simple(inline)?);
                }
                st.variety = Variety::Union { members };
            }
        }
        Ok(st)
    }

    /// Attribute uses declared on `parent` (directly or through attribute
    /// group references) and the names it prohibits
    fn parse_attribute_uses(
        &mut self,
        parent: &'a Element,
    ) -> Result<(Vec<AttributeUseId>, Vec<QName>)> {
        let mut uses = Vec::new();
        let mut prohibited = Vec::new();

        for child in xsd_children(parent) {
            match child.local_name() {
                elements::ATTRIBUTE => {
                    self.parse_attribute_use(child, &mut uses, &mut prohibited)?;
                }
                elements::ATTRIBUTE_GROUP => {
                    let Some(reference) = child.get_attribute(attrs::REF) else {
                        continue;
                    };
                    let Some(name) = self.resolve_qname(child, reference) else {
                        continue;
                    };
                    let Some(definition) = self.attribute_groups.get(&name).copied() else {
                        debug!("unresolved attributeGroup reference '{}'", name);
                        continue;
                    };
                    if !self.attribute_group_stack.insert(name.clone()) {
                        debug!("circular attributeGroup reference '{}'", name);
                        continue;
                    }
                    let result = self.parse_attribute_uses(definition);
                    self.attribute_group_stack.remove(&name);
                    let (group_uses, group_prohibited) = result?;
                    uses.extend(group_uses);
                    prohibited.extend(group_prohibited);
                }
                elements::ANY_ATTRIBUTE => debug!("ignoring xs:anyAttribute"),
                _ => {}
            }
        }
        Ok((uses, prohibited))
    }

    fn parse_attribute_use(
        &mut self,
        elem: &'a Element,
        uses: &mut Vec<AttributeUseId>,
        prohibited: &mut Vec<QName>,
    ) -> Result<()> {
        let usage = elem.get_attribute(attrs::USE).unwrap_or("optional");

        let (decl, use_constraint) = if let Some(reference) = elem.get_attribute(attrs::REF) {
            let Some(name) = self.resolve_qname(elem, reference) else {
                return Ok(());
            };
            if usage == "prohibited" {
                prohibited.push(name);
                return Ok(());
            }
            let Some(global) = self.attributes.get(&name).copied() else {
                debug!("unresolved attribute reference '{}'", name);
                return Ok(());
            };
            (self.parse_attribute_decl(global, true)?, value_constraint(elem))
        } else {
            let decl = self.parse_attribute_decl(elem, false)?;
            if usage == "prohibited" {
                prohibited.push(decl.name);
                return Ok(());
            }
            (decl, None)
        };

        uses.push(self.model.add_attribute_use(AttributeUse {
            required: usage == "required",
            decl,
            value_constraint: use_constraint,
        }));
        Ok(())
    }

    fn parse_attribute_decl(&mut self, elem: &'a Element, global: bool) -> Result<AttributeDecl> {
        let local = elem
            .get_attribute(attrs::NAME)
            .ok_or_else(|| ParseError::new("Attribute declaration missing 'name' attribute"))?;
        let qualified = global
            || match elem.get_attribute(attrs::FORM) {
                Some(form) => form == "qualified",
                None => self.qualified_attributes,
            };
        let namespace = if qualified {
            self.target_namespace.clone()
        } else {
            None
        };

        let type_id = if let Some(reference) = elem.get_attribute(attrs::TYPE) {
            self.resolve_type(elem, reference)?
        } else if let Some(inline) = first_child(elem, &[elements::SIMPLE_TYPE]) {
            Some(self.parse_anonymous_simple(inline)?)
        } else {
            self.any_simple_type()
        };

        Ok(AttributeDecl {
            name: QName::new(namespace, local),
            type_id,
            value_constraint: value_constraint(elem),
            documentation: documentation(elem),
        })
    }
}

/// XSD children of an element, annotations excluded
fn xsd_children(elem: &Element) -> impl Iterator<Item = &Element> {
    elem.children.iter().filter(|c| {
        c.namespace() == Some(XSD_NAMESPACE) && c.local_name() != elements::ANNOTATION
    })
}

fn first_child<'e>(elem: &'e Element, names: &[&str]) -> Option<&'e Element> {
    xsd_children(elem).find(|c| names.contains(&c.local_name()))
}

fn derivation_child(content: &Element) -> Result<&Element> {
    first_child(content, &[elements::EXTENSION, elements::RESTRICTION]).ok_or_else(|| {
        ParseError::new(format!(
            "xs:{} must contain xs:extension or xs:restriction",
            content.local_name()
        ))
        .into()
    })
}

fn is_true(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("true") | Some("1"))
}

fn value_constraint(elem: &Element) -> Option<ValueConstraint> {
    if let Some(fixed) = elem.get_attribute(attrs::FIXED) {
        Some(ValueConstraint::Fixed(fixed.to_string()))
    } else {
        elem.get_attribute(attrs::DEFAULT)
            .map(|d| ValueConstraint::Default(d.to_string()))
    }
}

fn parse_facets(restriction: &Element) -> Facets {
    let mut facets = Facets::default();
    for child in xsd_children(restriction) {
        let Some(value) = child.get_attribute(attrs::VALUE) else {
            continue;
        };
        match child.local_name() {
            elements::ENUMERATION => facets.enumeration.push(value.to_string()),
            elements::MIN_INCLUSIVE => facets.min_inclusive = Some(value.to_string()),
            elements::MAX_INCLUSIVE => facets.max_inclusive = Some(value.to_string()),
            _ => {}
        }
    }
    facets
}

/// Text of the xs:documentation children of the annotation of `elem`
fn documentation(elem: &Element) -> Option<String> {
    let texts: Vec<&str> = elem
        .children_named(XSD_NAMESPACE, elements::ANNOTATION)
        .flat_map(|annotation| annotation.children_named(XSD_NAMESPACE, elements::DOCUMENTATION))
        .filter_map(|doc| doc.text.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::TypeCategory;

    const PO: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:po="http://example.com/po"
           targetNamespace="http://example.com/po"
           elementFormDefault="qualified">
  <xs:element name="order" type="po:OrderType"/>
  <xs:complexType name="OrderType">
    <xs:sequence>
      <xs:element name="shipTo" type="po:Address"/>
      <xs:element name="item" maxOccurs="unbounded">
        <xs:complexType>
          <xs:sequence>
            <xs:element name="sku" type="xs:string">
              <xs:annotation><xs:documentation>Stock keeping unit</xs:documentation></xs:annotation>
            </xs:element>
          </xs:sequence>
          <xs:attribute name="qty" type="xs:positiveInteger" use="required"/>
        </xs:complexType>
      </xs:element>
      <xs:any minOccurs="0"/>
    </xs:sequence>
    <xs:attributeGroup ref="po:audit"/>
  </xs:complexType>
  <xs:complexType name="Address">
    <xs:sequence>
      <xs:element name="street" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="USAddress">
    <xs:complexContent>
      <xs:extension base="po:Address">
        <xs:sequence>
          <xs:element name="zip" type="xs:string" default="00000"/>
        </xs:sequence>
        <xs:attribute name="state" type="po:State"/>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
  <xs:attributeGroup name="audit">
    <xs:attribute name="created" type="xs:date"/>
  </xs:attributeGroup>
  <xs:simpleType name="State">
    <xs:restriction base="xs:string">
      <xs:enumeration value="CA"/>
      <xs:enumeration value="NY"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:simpleType name="Codes">
    <xs:list itemType="po:State"/>
  </xs:simpleType>
</xs:schema>"#;

    const PO_NS: &str = "http://example.com/po";

    #[test]
    fn test_parse_globals() {
        let model = SchemaModel::from_string(PO).unwrap();
        assert_eq!(model.target_namespace(), Some(PO_NS));
        let order = model.find_element(Some(PO_NS), "order").unwrap();
        let order_type = model.element(order).type_id.unwrap();
        assert_eq!(model.type_display_name(order_type), "OrderType");
        assert_eq!(model.named_types().len(), 5);
    }

    #[test]
    fn test_local_elements_and_occurs() {
        let model = SchemaModel::from_string(PO).unwrap();
        let order_type = model.find_type(Some(PO_NS), "OrderType").unwrap();
        let ct = model.complex_type(order_type).unwrap();
        assert_eq!(ct.content, ContentType::ElementOnly);

        let group = ct.particle.as_ref().unwrap().group().unwrap();
        assert_eq!(group.particles.len(), 3);
        assert!(matches!(group.particles[2].term, Term::Wildcard(_)));

        let Term::Element(item) = group.particles[1].term else {
            panic!("expected element");
        };
        let decl = model.element(item);
        assert_eq!(decl.name, QName::namespaced(PO_NS, "item"));
        assert_eq!(decl.enclosing, Some(order_type));
        assert!(model.governing_particle(item).unwrap().occurs.is_multiple());

        let item_type = model.complex_type(decl.type_id.unwrap()).unwrap();
        assert!(item_type.name.is_none());
        let qty = model.attribute_use(item_type.attribute_uses[0]);
        assert!(qty.required);
        assert_eq!(qty.decl.name, QName::local("qty"));

        let Term::Element(sku) = item_type.particle.as_ref().unwrap().group().unwrap().particles[0].term
        else {
            panic!("expected element");
        };
        assert_eq!(
            model.element(sku).documentation.as_deref(),
            Some("Stock keeping unit")
        );
        // attribute groups expand in place
        let audit = model.attribute_use(ct.attribute_uses[0]);
        assert_eq!(audit.decl.name.local_name, "created");
    }

    #[test]
    fn test_extension_merges_base_content() {
        let model = SchemaModel::from_string(PO).unwrap();
        let address = model.find_type(Some(PO_NS), "Address").unwrap();
        let us = model.find_type(Some(PO_NS), "USAddress").unwrap();
        let ct = model.complex_type(us).unwrap();
        assert_eq!(ct.base, Some(address));
        assert_eq!(ct.derivation, DerivationMethod::Extension);

        let names: Vec<String> = ct
            .particle
            .as_ref()
            .unwrap()
            .element_ids()
            .into_iter()
            .map(|id| model.element(id).name.local_name.clone())
            .collect();
        assert_eq!(names, ["street", "zip"]);

        let zip = ct.particle.as_ref().unwrap().element_ids()[1];
        assert_eq!(
            model.element(zip).value_constraint,
            Some(ValueConstraint::Default("00000".to_string()))
        );
    }

    #[test]
    fn test_simple_types() {
        let model = SchemaModel::from_string(PO).unwrap();
        let state = model.find_type(Some(PO_NS), "State").unwrap();
        assert_eq!(model.enumeration(state), ["CA", "NY"]);
        assert_eq!(model.builtin_kind(state), Some(BuiltinKind::String));

        let codes = model.find_type(Some(PO_NS), "Codes").unwrap();
        assert_eq!(model.list_item_type(codes), Some(state));
        assert_eq!(model.category(codes), TypeCategory::Simple);
    }

    #[test]
    fn test_unresolved_type_is_not_fatal() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="a" type="missing"/>
            <xs:element name="b" type="nope:missing"/>
        </xs:schema>"#;
        let model = SchemaModel::from_string(xsd).unwrap();
        let a = model.find_element(None, "a").unwrap();
        assert_eq!(model.element(a).type_id, None);
        let b = model.find_element(None, "b").unwrap();
        assert_eq!(model.element(b).type_id, None);
    }

    #[test]
    fn test_cyclic_extension_terminates() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:complexType name="A">
              <xs:complexContent><xs:extension base="B"/></xs:complexContent>
            </xs:complexType>
            <xs:complexType name="B">
              <xs:complexContent><xs:extension base="A"/></xs:complexContent>
            </xs:complexType>
        </xs:schema>"#;
        let model = SchemaModel::from_string(xsd).unwrap();
        let a = model.find_type(None, "A").unwrap();
        let b = model.find_type(None, "B").unwrap();
        assert_eq!(model.base_type(a), Some(b));
        assert_eq!(model.base_type(b), Some(a));
    }

    #[test]
    fn test_rejects_non_schema_root() {
        assert!(matches!(
            SchemaModel::from_string("<notaschema/>"),
            Err(Error::Parse(_))
        ));
        let missing_name = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:complexType/>
        </xs:schema>"#;
        assert!(SchemaModel::from_string(missing_name).is_err());
    }

    #[test]
    fn test_simple_content_and_group_refs() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:complexType name="Price">
              <xs:simpleContent>
                <xs:extension base="xs:decimal">
                  <xs:attribute name="currency" type="xs:string" fixed="EUR"/>
                </xs:extension>
              </xs:simpleContent>
            </xs:complexType>
            <xs:group name="names">
              <xs:sequence>
                <xs:element name="first" type="xs:string"/>
                <xs:group ref="names"/>
              </xs:sequence>
            </xs:group>
            <xs:complexType name="Person">
              <xs:group ref="names" maxOccurs="3"/>
            </xs:complexType>
        </xs:schema>"#;
        let model = SchemaModel::from_string(xsd).unwrap();
        let price = model.find_type(None, "Price").unwrap();
        let ct = model.complex_type(price).unwrap();
        assert_eq!(ct.content, ContentType::Simple);
        assert_eq!(
            model.simple_content_type(price),
            model.builtin(BuiltinKind::Decimal)
        );
        let currency = model.attribute_use(ct.attribute_uses[0]);
        assert_eq!(
            currency.effective_value_constraint().map(|v| v.value()),
            Some("EUR")
        );

        let person = model.find_type(None, "Person").unwrap();
        let particle = model.complex_type(person).unwrap().particle.clone().unwrap();
        assert_eq!(particle.occurs.max, Some(3));
        // the self reference inside the group is dropped
        assert_eq!(particle.group().unwrap().particles.len(), 1);
    }
}
