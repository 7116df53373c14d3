//! Per-run synthesis state

use super::ids::IdentifierAllocator;
use super::tree::{FormTree, NodeId};
use crate::namespaces::{NamespacePrefixTable, QName};
use crate::schema::{ElementId, TypeId};
use serde::Serialize;
use std::fmt;

/// Recoverable problem met while walking a schema.
///
/// The offending node is skipped and synthesis continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Anomaly {
    /// Element or attribute whose type could not be resolved
    UnresolvedType {
        /// Declared name
        element: String,
    },
    /// Element wildcard, no control is generated for it
    UnsupportedWildcard {
        /// Enclosing element
        owner: String,
    },
    /// Repeat without a bind to govern it
    MissingRepeatBind {
        /// Repeat id
        repeat: String,
    },
    /// Inherited declaration whose control could not be found for reuse
    ReusedControlNotFound {
        /// Declared name
        name: String,
    },
    /// Element whose type is already being expanded for the same
    /// declaration further up, it is left out of the form
    RecursiveType {
        /// Declared name
        element: String,
        /// Type being expanded
        type_name: String,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::UnresolvedType { element } => {
                write!(f, "type of '{}' could not be resolved", element)
            }
            Anomaly::UnsupportedWildcard { owner } => {
                write!(f, "wildcard in '{}' is not supported", owner)
            }
            Anomaly::MissingRepeatBind { repeat } => {
                write!(f, "no governing bind for repeat '{}'", repeat)
            }
            Anomaly::ReusedControlNotFound { name } => {
                write!(f, "no existing control for inherited '{}'", name)
            }
            Anomaly::RecursiveType { element, type_name } => {
                write!(
                    f,
                    "'{}' of type '{}' recurses into itself and is not expanded again",
                    element, type_name
                )
            }
        }
    }
}

/// Mutable state of one synthesis run, passed down the recursion.
///
/// Created by [`crate::form::FormBuilder::build_form`] and dropped when it
/// returns, so counters and prefixes never leak between runs.
#[derive(Debug, Default)]
pub struct SynthesisContext {
    /// Identifier counters
    pub ids: IdentifierAllocator,
    /// Namespace prefixes allocated for instance element names
    pub prefixes: NamespacePrefixTable,
    /// Output tree
    pub tree: FormTree,
    /// Recoverable problems, in discovery order
    pub anomalies: Vec<Anomaly>,
    /// Complex-typed elements being expanded, outermost first
    expanding: Vec<(ElementId, TypeId)>,
    /// Binds whose controls the current switch case copied
    reused_binds: Vec<NodeId>,
}

impl SynthesisContext {
    /// Fresh state
    pub fn new() -> Self {
        Self {
            ids: IdentifierAllocator::new(),
            prefixes: NamespacePrefixTable::new(),
            tree: FormTree::new(),
            anomalies: Vec::new(),
            expanding: Vec::new(),
            reused_binds: Vec::new(),
        }
    }

    /// Prefix and qualified name for an instance element or attribute
    pub fn qualified(&mut self, name: &QName) -> (Option<String>, String) {
        match name.namespace() {
            Some(ns) => {
                let prefix = self.prefixes.prefix_for(ns).to_string();
                let qualified = format!("{}:{}", prefix, name.local_name);
                (Some(prefix), qualified)
            }
            None => (None, name.local_name.clone()),
        }
    }

    /// Record an anomaly
    pub fn report(&mut self, anomaly: Anomaly) {
        self.anomalies.push(anomaly);
    }

    /// Start expanding `element` as `type_id`.
    ///
    /// Returns false, leaving the stack unchanged, when the pair is already
    /// being expanded.
    pub(crate) fn enter(&mut self, element: ElementId, type_id: TypeId) -> bool {
        if self.is_expanding(element, type_id) {
            return false;
        }
        self.expanding.push((element, type_id));
        true
    }

    /// Finish the innermost expansion
    pub(crate) fn leave(&mut self) {
        self.expanding.pop();
    }

    /// Whether `element` is being expanded as `type_id`
    pub fn is_expanding(&self, element: ElementId, type_id: TypeId) -> bool {
        self.expanding.contains(&(element, type_id))
    }

    /// Remember that a control bound to `bind` was copied
    pub(crate) fn note_reused(&mut self, bind: NodeId) {
        if !self.reused_binds.contains(&bind) {
            self.reused_binds.push(bind);
        }
    }

    /// Swap the reused-bind list, returning the previous one
    pub(crate) fn swap_reused(&mut self, binds: Vec<NodeId>) -> Vec<NodeId> {
        std::mem::replace(&mut self.reused_binds, binds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_names_share_prefix() {
        let mut cx = SynthesisContext::new();
        let (prefix, name) = cx.qualified(&QName::namespaced("http://example.com/po", "order"));
        assert_eq!(prefix.as_deref(), Some("po"));
        assert_eq!(name, "po:order");
        let (_, item) = cx.qualified(&QName::namespaced("http://example.com/po", "item"));
        assert_eq!(item, "po:item");
        assert_eq!(cx.prefixes.len(), 1);

        assert_eq!(cx.qualified(&QName::local("note")), (None, "note".to_string()));
    }

    #[test]
    fn test_expansion_stack() {
        let mut cx = SynthesisContext::new();
        let (element, type_id) = (ElementId(0), TypeId(3));
        assert!(cx.enter(element, type_id));
        assert!(cx.is_expanding(element, type_id));
        assert!(!cx.enter(element, type_id));
        assert!(cx.enter(ElementId(1), type_id));
        cx.leave();
        cx.leave();
        assert!(!cx.is_expanding(element, type_id));
        assert!(cx.enter(element, type_id));
    }

    #[test]
    fn test_anomaly_display() {
        let anomaly = Anomaly::MissingRepeatBind {
            repeat: "repeat_0".into(),
        };
        assert_eq!(anomaly.to_string(), "no governing bind for repeat 'repeat_0'");
    }
}
