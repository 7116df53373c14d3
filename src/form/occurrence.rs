//! Repeat regions
//!
//! A field or group that may occur more than once is wrapped in a repeat
//! governed by the bind generated just before it, with triggers to insert
//! and delete items.

use super::builder::FormBuilder;
use super::context::{Anomaly, SynthesisContext};
use super::controls::{index_expression, Action, ControlKind, ControlNode, InsertPosition};
use super::tree::{NodeId, NodeKind};
use crate::schema::Occurs;
use tracing::warn;

impl FormBuilder<'_> {
    /// Add a repeat under `section` when `occurs` admits more than one
    /// item, returning it.
    ///
    /// The governing bind is the last element bind among the children of
    /// `scope`, else among the children of its parent. Attribute binds never
    /// govern a repeat.
    pub(super) fn add_repeat_if_necessary(
        &self,
        cx: &mut SynthesisContext,
        scope: NodeId,
        section: NodeId,
        occurs: Occurs,
    ) -> Option<NodeId> {
        if !occurs.is_multiple() {
            return None;
        }

        let repeat_id = cx.ids.allocate("repeat");
        let governing = governing_bind(cx, scope);
        if governing.is_none() {
            warn!("no governing bind found for repeat '{}'", repeat_id);
            cx.report(Anomaly::MissingRepeatBind {
                repeat: repeat_id.clone(),
            });
        }

        let repeat = ControlNode::new(repeat_id.clone(), ControlKind::Repeat)
            .with_bind(governing.clone())
            .with_appearance("full");
        let repeat = cx.tree.create(NodeKind::Control(repeat));

        self.add_triggers_for_repeat(cx, section, &repeat_id, governing);
        self.append_control(cx, section, repeat);
        Some(repeat)
    }

    /// Insert-at-beginning, insert-after-selected and delete-selected
    /// triggers for a repeat, placed before it
    fn add_triggers_for_repeat(
        &self,
        cx: &mut SynthesisContext,
        section: NodeId,
        repeat_id: &str,
        bind: Option<String>,
    ) {
        let current = index_expression(repeat_id);
        let insert_before = Action::Insert {
            id: cx.ids.allocate("insert"),
            bind: bind.clone(),
            position: InsertPosition::Before,
            at: "1".to_string(),
        };
        let insert_after = Action::Insert {
            id: cx.ids.allocate("insert"),
            bind: bind.clone(),
            position: InsertPosition::After,
            at: current.clone(),
        };
        let delete = Action::Delete {
            id: cx.ids.allocate("delete"),
            bind,
            at: current,
        };

        let triggers = [
            ("insert_before", "insert at beginning", insert_before),
            ("insert_after", "insert after selected", insert_after),
            ("delete", "delete selected", delete),
        ];
        let mut parent = None;
        for (suffix, label, action) in triggers {
            let explicit = format!("{}-{}", repeat_id, suffix);
            let id = cx.ids.assign("trigger", Some(explicit.as_str()));
            let trigger = ControlNode::new(
                id,
                ControlKind::Trigger {
                    action: Some(action),
                },
            )
            .with_label(label);
            let trigger = cx.tree.create(NodeKind::Control(trigger));

            match parent {
                // the triggers share the container of the first one
                Some(container) => cx.tree.append(container, trigger),
                None => {
                    let wrapper = self
                        .strategy()
                        .create_controls_wrapper(&mut cx.tree, trigger);
                    cx.tree.append(section, wrapper);
                    parent = Some(if wrapper == trigger { section } else { wrapper });
                }
            }
        }
    }
}

fn governing_bind(cx: &SynthesisContext, scope: NodeId) -> Option<String> {
    let tree = &cx.tree;
    let last_bind = |node: NodeId| {
        tree.children(node)
            .iter()
            .rev()
            .filter_map(|child| tree.bind(*child))
            .find(|bind| !bind.nodeset.starts_with('@'))
            .map(|bind| bind.id.clone())
    };
    last_bind(scope).or_else(|| tree.parent(scope).and_then(last_bind))
}
