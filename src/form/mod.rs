//! XForms synthesis
//!
//! [`FormBuilder`] walks a [`TypeGraph`](crate::schema::TypeGraph) from a
//! global element and produces a [`Form`]: the model (instance, binds,
//! submission) and the controls, laid out by a
//! [`RenderingStrategy`](crate::rendering::RenderingStrategy).

pub mod builder;
pub mod context;
pub mod controls;
pub mod ids;
mod occurrence;
mod reconcile;
mod serialize;
pub mod tree;

pub use builder::FormBuilder;
pub use context::{Anomaly, SynthesisContext};
pub use controls::{
    index_expression, Action, BindNode, Choice, ControlKind, ControlNode, InputKind,
    InsertPosition, Toggle,
};
pub use ids::IdentifierAllocator;
pub use tree::{FormTree, Markup, Node, NodeId, NodeKind};

use crate::documents::Element;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of one synthesis run
#[derive(Debug, Clone, Serialize)]
pub struct Form {
    /// Envelope, model and controls
    pub tree: FormTree,
    /// Qualified name of the root element
    pub root_name: String,
    /// Target namespace of the schema
    pub target_namespace: Option<String>,
    /// Prefixes allocated for instance names: (prefix, namespace)
    pub namespaces: Vec<(String, String)>,
    /// Instance skeleton generated from the schema
    pub default_instance: Element,
    /// Recoverable problems met during synthesis
    pub anomalies: Vec<Anomaly>,
    /// Generation time
    pub generated_at: DateTime<Utc>,
    /// Base URI recorded as `xml:base`
    pub base: Option<String>,
}

impl Form {
    /// Instance placed in the model (the supplied one or the skeleton)
    pub fn instance(&self) -> Option<&Element> {
        self.tree
            .walk()
            .into_iter()
            .find_map(|node| match self.tree.kind(node) {
                NodeKind::Instance { root, .. } => root.as_ref(),
                _ => None,
            })
    }

    /// Binds in document order
    pub fn binds(&self) -> Vec<&BindNode> {
        self.tree
            .binds()
            .into_iter()
            .filter_map(|node| self.tree.bind(node))
            .collect()
    }

    /// First bind with the given nodeset
    pub fn bind_by_nodeset(&self, nodeset: &str) -> Option<&BindNode> {
        self.binds().into_iter().find(|bind| bind.nodeset == nodeset)
    }

    /// Controls in document order
    pub fn controls(&self) -> Vec<&ControlNode> {
        self.tree
            .controls()
            .into_iter()
            .filter_map(|node| self.tree.control(node))
            .collect()
    }

    /// Controls with the given XForms element name (`input`, `repeat`, ...)
    pub fn controls_of(&self, element_name: &str) -> Vec<&ControlNode> {
        self.controls()
            .into_iter()
            .filter(|control| control.kind.element_name() == element_name)
            .collect()
    }

    /// Controls bound to a bind id
    pub fn controls_bound_to(&self, bind_id: &str) -> Vec<&ControlNode> {
        self.controls()
            .into_iter()
            .filter(|control| control.bind.as_deref() == Some(bind_id))
            .collect()
    }

    /// JSON dump of the form
    pub fn to_json_string(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
