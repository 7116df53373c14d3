//! XML Schema type graph
//!
//! The component model the form builder walks, and the loader that fills it
//! from an XSD document.

pub mod builtins;
pub mod graph;
pub mod particles;
pub mod parsing;
pub mod types;

pub use builtins::{BuiltinKind, TypeFamily};
pub use graph::{SchemaModel, TypeGraph};
pub use particles::{parse_occurs, Compositor, ModelGroup, Occurs, Particle, Term, Wildcard};
pub use types::{
    AnyType, AttributeDecl, AttributeUse, AttributeUseId, ComplexType, ContentType,
    DerivationMethod, ElementDecl, ElementId, Facets, SimpleType, TypeCategory, TypeDef, TypeId,
    ValueConstraint, Variety,
};
