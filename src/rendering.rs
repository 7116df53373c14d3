//! Rendering strategies
//!
//! The form builder never creates presentation markup itself: it asks a
//! [`RenderingStrategy`] for the container of each structural role and
//! appends its output under whatever node the strategy returns.

use crate::config::FormConfig;
use crate::form::{FormTree, Markup, NodeId, NodeKind};
use crate::XHTML_NS;

/// Factory for the containers of a generated document.
///
/// Every method but [`create_envelope`](RenderingStrategy::create_envelope)
/// passes its node through unchanged by default.
pub trait RenderingStrategy: Send + Sync {
    /// Create the document root and register it with the tree
    fn create_envelope(&self, tree: &mut FormTree) -> NodeId;

    /// Container for the model; the builder appends the returned node to
    /// the envelope
    fn create_model_wrapper(&self, _tree: &mut FormTree, model: NodeId) -> NodeId {
        model
    }

    /// Node under which the controls of the form go
    fn create_form_wrapper(&self, _tree: &mut FormTree, envelope: NodeId) -> NodeId {
        envelope
    }

    /// Node under which the content of a group, repeat or case goes
    fn create_group_content_wrapper(&self, _tree: &mut FormTree, group: NodeId) -> NodeId {
        group
    }

    /// Container for one control; the builder appends the returned node to
    /// the current section
    fn create_controls_wrapper(&self, _tree: &mut FormTree, control: NodeId) -> NodeId {
        control
    }
}

/// Bare `envelope` root without presentation markup
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainEnvelope;

impl RenderingStrategy for PlainEnvelope {
    fn create_envelope(&self, tree: &mut FormTree) -> NodeId {
        let envelope = tree.create(NodeKind::Markup(Markup::new("envelope")));
        tree.set_root(envelope);
        envelope
    }
}

/// XHTML page: model in the head, controls in the body, one `div` per
/// control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XhtmlWrapper {
    /// Stylesheet linked from the head
    pub css_style: String,
    /// Page title
    pub title: Option<String>,
}

impl XhtmlWrapper {
    /// Wrapper using the stylesheet of a configuration
    pub fn from_config(config: &FormConfig) -> Self {
        Self {
            css_style: config.css_style.clone(),
            title: None,
        }
    }

    /// Set the page title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn head(&self, tree: &FormTree, envelope: NodeId) -> Option<NodeId> {
        tree.children(envelope).iter().copied().find(|child| {
            matches!(tree.kind(*child), NodeKind::Markup(m) if m.name == "head")
        })
    }
}

impl Default for XhtmlWrapper {
    fn default() -> Self {
        Self::from_config(&FormConfig::default())
    }
}

impl RenderingStrategy for XhtmlWrapper {
    fn create_envelope(&self, tree: &mut FormTree) -> NodeId {
        let html = tree.create(NodeKind::Markup(
            Markup::new("html").with_attribute("xmlns", XHTML_NS),
        ));
        tree.set_root(html);

        let head = tree.create(NodeKind::Markup(Markup::new("head")));
        tree.append(html, head);
        if let Some(title) = &self.title {
            let title = tree.create(NodeKind::Markup(Markup::new("title").with_text(title)));
            tree.append(head, title);
        }
        let link = tree.create(NodeKind::Markup(
            Markup::new("link")
                .with_attribute("rel", "stylesheet")
                .with_attribute("type", "text/css")
                .with_attribute("href", self.css_style.as_str()),
        ));
        tree.append(head, link);
        html
    }

    fn create_model_wrapper(&self, tree: &mut FormTree, model: NodeId) -> NodeId {
        // called before the body exists, so re-appending the head keeps it first
        let Some(envelope) = tree.root() else {
            return model;
        };
        match self.head(tree, envelope) {
            Some(head) => {
                tree.append(head, model);
                head
            }
            None => model,
        }
    }

    fn create_form_wrapper(&self, tree: &mut FormTree, envelope: NodeId) -> NodeId {
        let body = tree.create(NodeKind::Markup(Markup::new("body")));
        tree.append(envelope, body);
        body
    }

    fn create_controls_wrapper(&self, tree: &mut FormTree, control: NodeId) -> NodeId {
        let div = tree.create(NodeKind::Markup(
            Markup::new("div").with_attribute("class", "xformsControl"),
        ));
        tree.append(div, control);
        div
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup_name(tree: &FormTree, node: NodeId) -> &str {
        match tree.kind(node) {
            NodeKind::Markup(m) => &m.name,
            _ => "",
        }
    }

    #[test]
    fn test_plain_envelope_passes_through() {
        let strategy = PlainEnvelope;
        let mut tree = FormTree::new();
        let envelope = strategy.create_envelope(&mut tree);
        let model = tree.create(NodeKind::Model {
            id: "model_0".into(),
            schema: None,
        });
        assert_eq!(strategy.create_model_wrapper(&mut tree, model), model);
        assert_eq!(strategy.create_form_wrapper(&mut tree, envelope), envelope);
        assert_eq!(tree.root(), Some(envelope));
        assert_eq!(markup_name(&tree, envelope), "envelope");
    }

    #[test]
    fn test_xhtml_layout() {
        let strategy = XhtmlWrapper::default().with_title("Order");
        let mut tree = FormTree::new();
        let html = strategy.create_envelope(&mut tree);
        let model = tree.create(NodeKind::Model {
            id: "model_0".into(),
            schema: None,
        });
        let wrapper = strategy.create_model_wrapper(&mut tree, model);
        tree.append(html, wrapper);
        let body = strategy.create_form_wrapper(&mut tree, html);

        let children: Vec<_> = tree
            .children(html)
            .iter()
            .map(|c| markup_name(&tree, *c))
            .collect();
        assert_eq!(children, ["head", "body"]);
        let head = tree.children(html)[0];
        let head_children: Vec<_> = tree
            .children(head)
            .iter()
            .map(|c| markup_name(&tree, *c))
            .collect();
        assert_eq!(head_children, ["title", "link", ""]);
        assert_eq!(tree.parent(model), Some(head));
        assert_eq!(markup_name(&tree, body), "body");

        let input = tree.create(NodeKind::Markup(Markup::new("probe")));
        let div = strategy.create_controls_wrapper(&mut tree, input);
        assert_eq!(tree.parent(input), Some(div));
        assert_eq!(strategy.create_group_content_wrapper(&mut tree, div), div);
    }
}
