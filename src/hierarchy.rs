//! Type hierarchy index
//!
//! For every named type, the non-abstract types derived from it by
//! extension. These are the types an instance may substitute with
//! `xsi:type`, and they become the cases of a type switch.

use crate::schema::{DerivationMethod, TypeDef, TypeGraph, TypeId};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

/// Compatible types per base type, built once per schema
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchyIndex {
    compatible: IndexMap<TypeId, Vec<TypeId>>,
}

impl TypeHierarchyIndex {
    /// Build the index from the named types of a graph
    pub fn build(graph: &dyn TypeGraph) -> Self {
        let mut index = Self::default();
        for id in graph.named_types() {
            let mut visited = HashSet::new();
            index.ascend(graph, id, Vec::new(), &mut visited);
        }

        for entry in index.compatible.values_mut() {
            entry.sort_by_key(|id| derivation_depth(graph, *id));
        }
        debug!("type hierarchy index has {} entries", index.compatible.len());
        index
    }

    /// Walk up the base chain of `id`, recording `descendants` as compatible
    /// with every ancestor
    fn ascend(
        &mut self,
        graph: &dyn TypeGraph,
        id: TypeId,
        descendants: Vec<TypeId>,
        visited: &mut HashSet<TypeId>,
    ) {
        visited.insert(id);
        if !descendants.is_empty() {
            let entry = self.compatible.entry(id).or_default();
            for descendant in &descendants {
                if !entry.contains(descendant) {
                    entry.push(*descendant);
                }
            }
        }

        let Some(parent) = graph.base_type(id) else {
            return;
        };
        if parent == id
            || graph.is_any_type(parent)
            || graph.category(parent) != graph.category(id)
            || visited.contains(&parent)
        {
            return;
        }

        let mut next = descendants;
        if contributes(graph.type_def(id)) && !next.contains(&id) {
            next.push(id);
        }
        self.ascend(graph, parent, next, visited);
    }

    /// Non-abstract types derived from `id` by extension, a type always
    /// after the types it extends
    pub fn compatible_types(&self, id: TypeId) -> &[TypeId] {
        self.compatible.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every (base, compatible types) entry, in discovery order
    pub fn entries(&self) -> impl Iterator<Item = (TypeId, &[TypeId])> {
        self.compatible.iter().map(|(id, types)| (*id, types.as_slice()))
    }

    /// Number of base types with at least one compatible type
    pub fn len(&self) -> usize {
        self.compatible.len()
    }

    /// Whether no type has a compatible type
    pub fn is_empty(&self) -> bool {
        self.compatible.is_empty()
    }

    /// The index keyed by expanded type names, for reports
    pub fn named_entries(&self, graph: &dyn TypeGraph) -> IndexMap<String, Vec<String>> {
        let name = |id: TypeId| match graph.type_def(id).name() {
            Some(qname) => qname.to_string(),
            None => graph.type_display_name(id),
        };
        self.entries()
            .map(|(base, types)| (name(base), types.iter().map(|t| name(*t)).collect()))
            .collect()
    }
}

/// A type is compatible with its ancestors when it is a non-abstract
/// extension of a complex type
fn contributes(def: &TypeDef) -> bool {
    match def {
        TypeDef::Complex(ct) => ct.derivation == DerivationMethod::Extension && !ct.is_abstract,
        _ => false,
    }
}

/// Number of derivation steps between a type and the root of its complex
/// base chain.
///
/// Restriction steps count like extension steps, so a type always sorts
/// after every type on its base chain.
fn derivation_depth(graph: &dyn TypeGraph, id: TypeId) -> usize {
    let mut depth = 0;
    let mut visited = HashSet::from([id]);
    let mut current = id;
    while let Some(ct) = graph.complex_type(current) {
        if ct.derivation == DerivationMethod::None {
            break;
        }
        let Some(base) = ct.base else {
            break;
        };
        if graph.is_any_type(base) || graph.complex_type(base).is_none() || !visited.insert(base) {
            break;
        }
        depth += 1;
        current = base;
    }
    depth
}
