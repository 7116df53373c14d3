//! Schema components
//!
//! Type definitions, element declarations and attribute uses, stored in the
//! arenas of [`crate::schema::SchemaModel`] and addressed by id.

use super::builtins::BuiltinKind;
use super::particles::Particle;
use crate::namespaces::QName;
use serde::Serialize;

/// Index of a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub usize);

/// Index of an element declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(pub usize);

/// Index of an attribute use
///
/// Attribute uses inherited through extension keep the id of the use declared
/// on the base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AttributeUseId(pub usize);

/// Simple or complex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TypeCategory {
    /// Simple type
    Simple,
    /// Complex type (including anyType)
    Complex,
}

/// How a type is derived from its base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DerivationMethod {
    /// No explicit derivation
    #[default]
    None,
    /// Content added to the base
    Extension,
    /// Content restricted from the base
    Restriction,
}

/// Content category of a complex type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ContentType {
    /// No content
    #[default]
    Empty,
    /// Character data only
    Simple,
    /// Child elements only
    ElementOnly,
    /// Child elements and character data
    Mixed,
}

/// Fixed or default value of an element or attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValueConstraint {
    /// Value used when none is given
    Default(String),
    /// Only admitted value
    Fixed(String),
}

impl ValueConstraint {
    /// The constrained value
    pub fn value(&self) -> &str {
        match self {
            ValueConstraint::Default(v) | ValueConstraint::Fixed(v) => v,
        }
    }
}

/// Variety of a simple type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum Variety {
    /// Single value
    #[default]
    Atomic,
    /// Whitespace separated values; the item type is None when unresolved
    List {
        /// Item type
        item: Option<TypeId>,
    },
    /// Value of one of the member types
    Union {
        /// Member types
        members: Vec<TypeId>,
    },
}

/// Constraining facets of a simple type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Facets {
    /// Enumerated literal values
    pub enumeration: Vec<String>,
    /// minInclusive
    pub min_inclusive: Option<String>,
    /// maxInclusive
    pub max_inclusive: Option<String>,
}

/// Simple type definition
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SimpleType {
    /// Name (None when anonymous)
    pub name: Option<QName>,
    /// Base type
    pub base: Option<TypeId>,
    /// Atomic, list or union
    pub variety: Variety,
    /// Set on the pre-registered built-in types
    pub builtin: Option<BuiltinKind>,
    /// Facets declared on this type
    pub facets: Facets,
    /// Documentation annotation
    pub documentation: Option<String>,
}

/// Complex type definition
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ComplexType {
    /// Name (None when anonymous)
    pub name: Option<QName>,
    /// Base type
    pub base: Option<TypeId>,
    /// Derivation from the base
    pub derivation: DerivationMethod,
    /// abstract="true"
    pub is_abstract: bool,
    /// Content category
    pub content: ContentType,
    /// Effective attribute uses: inherited ones first, then own
    pub attribute_uses: Vec<AttributeUseId>,
    /// Effective content model; for extensions a sequence of the base
    /// content followed by the own content
    pub particle: Option<Particle>,
    /// Documentation annotation
    pub documentation: Option<String>,
}

/// The distinguished anyType
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnyType {
    /// Always `{http://www.w3.org/2001/XMLSchema}anyType`
    pub name: QName,
}

/// Type definition: a closed union over the three categories
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeDef {
    /// Simple type
    Simple(SimpleType),
    /// Complex type
    Complex(ComplexType),
    /// anyType, the root of the type hierarchy
    Any(AnyType),
}

impl TypeDef {
    /// Type name (None when anonymous)
    pub fn name(&self) -> Option<&QName> {
        match self {
            TypeDef::Simple(t) => t.name.as_ref(),
            TypeDef::Complex(t) => t.name.as_ref(),
            TypeDef::Any(t) => Some(&t.name),
        }
    }

    /// Base type
    pub fn base(&self) -> Option<TypeId> {
        match self {
            TypeDef::Simple(t) => t.base,
            TypeDef::Complex(t) => t.base,
            TypeDef::Any(_) => None,
        }
    }

    /// Simple or complex
    pub fn category(&self) -> TypeCategory {
        match self {
            TypeDef::Simple(_) => TypeCategory::Simple,
            TypeDef::Complex(_) | TypeDef::Any(_) => TypeCategory::Complex,
        }
    }

    /// Documentation annotation
    pub fn documentation(&self) -> Option<&str> {
        match self {
            TypeDef::Simple(t) => t.documentation.as_deref(),
            TypeDef::Complex(t) => t.documentation.as_deref(),
            TypeDef::Any(_) => None,
        }
    }

    /// The complex type definition, if this is one
    pub fn as_complex(&self) -> Option<&ComplexType> {
        match self {
            TypeDef::Complex(t) => Some(t),
            _ => None,
        }
    }

    /// The simple type definition, if this is one
    pub fn as_simple(&self) -> Option<&SimpleType> {
        match self {
            TypeDef::Simple(t) => Some(t),
            _ => None,
        }
    }

    /// Name for log messages
    pub fn display_name(&self) -> String {
        match self.name() {
            Some(name) => name.local_name.clone(),
            None => "(anonymous)".to_string(),
        }
    }
}

/// Element declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementDecl {
    /// Element name; the namespace follows the form of the declaration
    pub name: QName,
    /// Declared type (None when the reference could not be resolved)
    pub type_id: Option<TypeId>,
    /// Fixed or default value
    pub value_constraint: Option<ValueConstraint>,
    /// Complex type whose content declares this element (None for globals)
    pub enclosing: Option<TypeId>,
    /// Documentation annotation
    pub documentation: Option<String>,
}

impl ElementDecl {
    /// Declaration with only a name and a type
    pub fn new(name: QName, type_id: Option<TypeId>) -> Self {
        Self {
            name,
            type_id,
            value_constraint: None,
            enclosing: None,
            documentation: None,
        }
    }
}

/// Attribute declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeDecl {
    /// Attribute name
    pub name: QName,
    /// Declared simple type (None when the reference could not be resolved)
    pub type_id: Option<TypeId>,
    /// Fixed or default value of the declaration
    pub value_constraint: Option<ValueConstraint>,
    /// Documentation annotation
    pub documentation: Option<String>,
}

/// Use of an attribute declaration by a complex type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeUse {
    /// use="required"
    pub required: bool,
    /// Referenced declaration
    pub decl: AttributeDecl,
    /// Fixed or default value of the use
    pub value_constraint: Option<ValueConstraint>,
}

impl AttributeUse {
    /// Value constraint of the use, falling back to the declaration's
    pub fn effective_value_constraint(&self) -> Option<&ValueConstraint> {
        self.value_constraint
            .as_ref()
            .or(self.decl.value_constraint.as_ref())
    }
}
