//! The type graph
//!
//! [`TypeGraph`] is the read-only view of a schema consumed by the form
//! builder. [`SchemaModel`] is its arena implementation, filled by the XSD
//! loader or built programmatically.

use super::builtins::BuiltinKind;
use super::particles::Particle;
use super::types::{
    AnyType, AttributeUse, AttributeUseId, ComplexType, ElementDecl, ElementId, SimpleType,
    TypeCategory, TypeDef, TypeId, Variety,
};
use crate::namespaces::QName;
use crate::XSD_NAMESPACE;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Read-only queries over a schema's types and declarations.
///
/// Implementations are immutable once built, so a graph can be shared by
/// concurrent synthesis runs.
pub trait TypeGraph: Send + Sync {
    /// Target namespace of the schema
    fn target_namespace(&self) -> Option<&str>;

    /// Type definition by id
    fn type_def(&self, id: TypeId) -> &TypeDef;

    /// Element declaration by id
    fn element(&self, id: ElementId) -> &ElementDecl;

    /// Attribute use by id
    fn attribute_use(&self, id: AttributeUseId) -> &AttributeUse;

    /// Named types declared by the schema (built-ins excluded), in
    /// declaration order
    fn named_types(&self) -> Vec<TypeId>;

    /// Resolve a named type
    fn find_type(&self, namespace: Option<&str>, name: &str) -> Option<TypeId>;

    /// Resolve a global element
    fn find_element(&self, namespace: Option<&str>, name: &str) -> Option<ElementId>;

    /// The distinguished anyType
    fn any_type(&self) -> TypeId;

    /// Simple or complex
    fn category(&self, id: TypeId) -> TypeCategory {
        self.type_def(id).category()
    }

    /// Base type
    fn base_type(&self, id: TypeId) -> Option<TypeId> {
        self.type_def(id).base()
    }

    /// Complex type definition, if `id` is one
    fn complex_type(&self, id: TypeId) -> Option<&ComplexType> {
        self.type_def(id).as_complex()
    }

    /// Simple type definition, if `id` is one
    fn simple_type(&self, id: TypeId) -> Option<&SimpleType> {
        self.type_def(id).as_simple()
    }

    /// Built-in kind of a simple type: its own kind for built-ins, else
    /// the kind of the nearest built-in ancestor. List types report the
    /// kind of their item type.
    fn builtin_kind(&self, id: TypeId) -> Option<BuiltinKind> {
        let mut visited = HashSet::new();
        let mut current = id;
        while visited.insert(current) {
            let simple = self.simple_type(current)?;
            if let Some(kind) = simple.builtin {
                return Some(kind.list_item().unwrap_or(kind));
            }
            current = match &simple.variety {
                Variety::List { item } => (*item)?,
                _ => simple.base?,
            };
        }
        None
    }

    /// Item type of a list type, None for atomic and union types
    fn list_item_type(&self, id: TypeId) -> Option<TypeId> {
        match &self.simple_type(id)?.variety {
            Variety::List { item } => *item,
            _ => None,
        }
    }

    /// Whether a simple type is list-valued
    fn is_list(&self, id: TypeId) -> bool {
        matches!(
            self.simple_type(id).map(|t| &t.variety),
            Some(Variety::List { .. })
        )
    }

    /// Enumeration of a simple type, inherited through restriction
    fn enumeration(&self, id: TypeId) -> &[String] {
        let mut visited = HashSet::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            if !visited.insert(cur) {
                break;
            }
            let Some(simple) = self.simple_type(cur) else {
                break;
            };
            if !simple.facets.enumeration.is_empty() {
                return &simple.facets.enumeration;
            }
            current = simple.base;
        }
        &[]
    }

    /// minInclusive and maxInclusive of a simple type, when both are
    /// declared (on the type or inherited through restriction)
    fn range_bounds(&self, id: TypeId) -> Option<(&str, &str)> {
        let mut min = None;
        let mut max = None;
        let mut visited = HashSet::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            if !visited.insert(cur) {
                break;
            }
            let Some(simple) = self.simple_type(cur) else {
                break;
            };
            min = min.or(simple.facets.min_inclusive.as_deref());
            max = max.or(simple.facets.max_inclusive.as_deref());
            current = simple.base;
        }
        min.zip(max)
    }

    /// Nearest simple type on the base chain of a complex type with simple
    /// content
    fn simple_content_type(&self, id: TypeId) -> Option<TypeId> {
        let mut visited = HashSet::from([id]);
        let mut current = self.base_type(id)?;
        loop {
            if !visited.insert(current) {
                return None;
            }
            match self.type_def(current) {
                TypeDef::Simple(_) => return Some(current),
                TypeDef::Complex(ct) => current = ct.base?,
                TypeDef::Any(_) => return None,
            }
        }
    }

    /// Particle governing the occurrence of an element inside its enclosing
    /// complex type
    fn governing_particle(&self, element: ElementId) -> Option<&Particle> {
        let enclosing = self.element(element).enclosing?;
        self.complex_type(enclosing)?
            .particle
            .as_ref()?
            .find_element(element)
    }

    /// Whether `id` is the distinguished anyType
    fn is_any_type(&self, id: TypeId) -> bool {
        id == self.any_type()
    }

    /// Local name of a type, for log messages
    fn type_display_name(&self, id: TypeId) -> String {
        self.type_def(id).display_name()
    }
}

/// Arena-backed schema
#[derive(Debug, Clone)]
pub struct SchemaModel {
    target_namespace: Option<String>,
    types: Vec<TypeDef>,
    elements: Vec<ElementDecl>,
    attribute_uses: Vec<AttributeUse>,
    type_names: IndexMap<QName, TypeId>,
    element_names: IndexMap<QName, ElementId>,
    builtin_count: usize,
    any_type: TypeId,
}

impl SchemaModel {
    /// Create an empty schema with the built-in types registered
    pub fn new(target_namespace: Option<&str>) -> Self {
        let mut model = Self {
            target_namespace: target_namespace
                .filter(|ns| !ns.is_empty())
                .map(str::to_string),
            types: Vec::new(),
            elements: Vec::new(),
            attribute_uses: Vec::new(),
            type_names: IndexMap::new(),
            element_names: IndexMap::new(),
            builtin_count: 0,
            any_type: TypeId(0),
        };

        model.any_type = model.add_type(TypeDef::Any(AnyType {
            name: QName::namespaced(XSD_NAMESPACE, "anyType"),
        }));
        for kind in BuiltinKind::all() {
            // bases come first in the table
            let base = match kind.base() {
                Some(base) => model.builtin(base),
                None => Some(model.any_type),
            };
            let item = kind.list_item().and_then(|item| model.builtin(item));
            model.add_type(TypeDef::Simple(SimpleType {
                name: Some(QName::namespaced(XSD_NAMESPACE, kind.name())),
                base,
                variety: match item {
                    Some(item) => Variety::List { item: Some(item) },
                    None => Variety::Atomic,
                },
                builtin: Some(kind),
                ..SimpleType::default()
            }));
        }
        model.builtin_count = model.types.len();
        model
    }

    /// Id of a built-in type
    pub fn builtin(&self, kind: BuiltinKind) -> Option<TypeId> {
        self.type_names
            .get(&QName::namespaced(XSD_NAMESPACE, kind.name()))
            .copied()
    }

    /// Add a type definition; named types become resolvable by name
    pub fn add_type(&mut self, def: TypeDef) -> TypeId {
        let id = TypeId(self.types.len());
        if let Some(name) = def.name() {
            self.type_names.insert(name.clone(), id);
        }
        self.types.push(def);
        id
    }

    /// Replace a definition (used to fill placeholders while loading)
    pub(crate) fn set_type(&mut self, id: TypeId, def: TypeDef) {
        if let Some(name) = def.name() {
            self.type_names.insert(name.clone(), id);
        }
        self.types[id.0] = def;
    }

    /// Add a local element declaration
    pub fn add_element(&mut self, decl: ElementDecl) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(decl);
        id
    }

    /// Add a global element declaration, resolvable by name
    pub fn add_global_element(&mut self, decl: ElementDecl) -> ElementId {
        let name = decl.name.clone();
        let id = self.add_element(decl);
        self.element_names.insert(name, id);
        id
    }

    pub(crate) fn set_element(&mut self, id: ElementId, decl: ElementDecl) {
        self.elements[id.0] = decl;
    }

    /// Add an attribute use
    pub fn add_attribute_use(&mut self, attribute_use: AttributeUse) -> AttributeUseId {
        let id = AttributeUseId(self.attribute_uses.len());
        self.attribute_uses.push(attribute_use);
        id
    }

    /// Number of type definitions, built-ins included
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Global elements in declaration order
    pub fn global_elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.element_names.values().copied()
    }
}

impl TypeGraph for SchemaModel {
    fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    fn type_def(&self, id: TypeId) -> &TypeDef {
        &self.types[id.0]
    }

    fn element(&self, id: ElementId) -> &ElementDecl {
        &self.elements[id.0]
    }

    fn attribute_use(&self, id: AttributeUseId) -> &AttributeUse {
        &self.attribute_uses[id.0]
    }

    fn named_types(&self) -> Vec<TypeId> {
        (self.builtin_count..self.types.len())
            .map(TypeId)
            .filter(|id| self.types[id.0].name().is_some())
            .collect()
    }

    fn find_type(&self, namespace: Option<&str>, name: &str) -> Option<TypeId> {
        self.type_names.get(&QName::new(namespace, name)).copied()
    }

    fn find_element(&self, namespace: Option<&str>, name: &str) -> Option<ElementId> {
        self.element_names.get(&QName::new(namespace, name)).copied()
    }

    fn any_type(&self) -> TypeId {
        self.any_type
    }
}
