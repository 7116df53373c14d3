//! Arena tree of a generated form
//!
//! Markup containers from the rendering strategy, the model with its
//! instance, binds and submission, and the controls all live in one arena.
//! Nodes refer to each other by [`NodeId`].

use super::controls::{BindNode, ControlNode};
use super::ids::IdentifierAllocator;
use crate::documents::Element;
use serde::Serialize;
use std::collections::HashMap;

/// Index of a node in a [`FormTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(pub usize);

/// Presentation container produced by a rendering strategy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Markup {
    /// Element name
    pub name: String,
    /// Attributes in insertion order
    pub attributes: Vec<(String, String)>,
    /// Text content
    pub text: Option<String>,
}

impl Markup {
    /// Container with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Set the text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// What a node is
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    /// Presentation container
    Markup(Markup),
    /// XForms model
    Model {
        /// Model id
        id: String,
        /// Schema location
        schema: Option<String>,
    },
    /// Instance data holder; the root is filled in when synthesis completes
    Instance {
        /// Instance id
        id: String,
        /// Instance document root
        root: Option<Element>,
    },
    /// Binding
    Bind(BindNode),
    /// Submission descriptor
    Submission {
        /// Submission id
        id: String,
        /// Target URI
        action: String,
        /// HTTP method
        method: String,
    },
    /// User interface control
    Control(ControlNode),
}

impl NodeKind {
    /// Identifier of the node, markup has none
    pub fn id(&self) -> Option<&str> {
        match self {
            NodeKind::Markup(_) => None,
            NodeKind::Model { id, .. }
            | NodeKind::Instance { id, .. }
            | NodeKind::Submission { id, .. } => Some(id),
            NodeKind::Bind(bind) => Some(&bind.id),
            NodeKind::Control(control) => Some(&control.id),
        }
    }
}

/// Node with its links
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Payload
    pub kind: NodeKind,
    /// Parent node
    pub parent: Option<NodeId>,
    /// Children in document order
    pub children: Vec<NodeId>,
}

/// The form arena
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl FormTree {
    /// Empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Make a node the document root
    pub fn set_root(&mut self, node: NodeId) {
        self.root = Some(node);
    }

    /// Document root
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Payload of a node
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Mutable payload of a node
    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if parent == child {
            return;
        }
        if let Some(old) = self.nodes[child.0].parent {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Descendants of a node in document order, the node itself excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Bind payload of a node
    pub fn bind(&self, id: NodeId) -> Option<&BindNode> {
        match self.kind(id) {
            NodeKind::Bind(bind) => Some(bind),
            _ => None,
        }
    }

    /// Mutable bind payload of a node
    pub fn bind_mut(&mut self, id: NodeId) -> Option<&mut BindNode> {
        match self.kind_mut(id) {
            NodeKind::Bind(bind) => Some(bind),
            _ => None,
        }
    }

    /// Control payload of a node
    pub fn control(&self, id: NodeId) -> Option<&ControlNode> {
        match self.kind(id) {
            NodeKind::Control(control) => Some(control),
            _ => None,
        }
    }

    /// Bind nodes reachable from the root, in document order
    pub fn binds(&self) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|id| self.bind(*id).is_some())
            .collect()
    }

    /// Control nodes reachable from the root, in document order
    pub fn controls(&self) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|id| self.control(*id).is_some())
            .collect()
    }

    /// Nodes reachable from the root, in document order
    pub fn walk(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => std::iter::once(root).chain(self.descendants(root)).collect(),
            None => Vec::new(),
        }
    }

    /// Node reachable from the root carrying the identifier
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|node| self.kind(*node).id() == Some(id))
    }

    /// First control in document order bound to `bind_id`
    pub fn find_control_bound_to(&self, bind_id: &str) -> Option<NodeId> {
        self.walk().into_iter().find(|node| {
            self.control(*node)
                .and_then(|c| c.bind.as_deref())
                .is_some_and(|b| b == bind_id)
        })
    }

    /// Instance path of a bind, joining the nodesets of its enclosing binds
    pub fn absolute_path(&self, bind: NodeId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = Some(bind);
        while let Some(node) = current {
            let Some(b) = self.bind(node) else {
                break;
            };
            if b.nodeset != "." {
                segments.push(b.nodeset.as_str());
            }
            if b.nodeset.starts_with('/') {
                break;
            }
            current = self.parent(node);
        }
        if segments.is_empty() && self.bind(bind).is_none() {
            return None;
        }
        segments.reverse();
        Some(segments.join("/"))
    }

    /// Every identifier of the nodes reachable from the root, nested control
    /// items included
    pub fn all_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for node in self.walk() {
            match self.kind(node) {
                NodeKind::Control(control) => {
                    ids.extend(control.identifiers().into_iter().map(str::to_string))
                }
                kind => ids.extend(kind.id().map(str::to_string)),
            }
        }
        ids
    }

    /// Number of nodes in the arena, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Copy the subtree under `node` with fresh identifiers.
    ///
    /// References inside the copy to nodes of the copied subtree (case
    /// toggles, repeat indices, dispatch targets) are redirected to the new
    /// identifiers. The source subtree is left untouched and the copy is
    /// returned detached.
    pub fn deep_clone(&mut self, node: NodeId, ids: &mut IdentifierAllocator) -> NodeId {
        let mut remap = HashMap::new();
        let mut created = Vec::new();
        let copy = self.copy_subtree(node, ids, &mut remap, &mut created);

        for id in created {
            if let NodeKind::Control(control) = self.kind_mut(id) {
                control.remap_references(&remap);
            }
        }
        copy
    }

    fn copy_subtree(
        &mut self,
        node: NodeId,
        ids: &mut IdentifierAllocator,
        remap: &mut HashMap<String, String>,
        created: &mut Vec<NodeId>,
    ) -> NodeId {
        let mut kind = self.kind(node).clone();
        match &mut kind {
            NodeKind::Control(control) => control.reassign_ids(ids, remap),
            NodeKind::Bind(bind) => {
                let fresh = ids.allocate("bind");
                remap.insert(std::mem::replace(&mut bind.id, fresh.clone()), fresh);
            }
            _ => {}
        }

        let copy = self.create(kind);
        created.push(copy);
        let children = self.children(node).to_vec();
        for child in children {
            let child_copy = self.copy_subtree(child, ids, remap, created);
            self.append(copy, child_copy);
        }
        copy
    }
}
