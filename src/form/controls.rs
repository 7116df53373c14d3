//! Control, bind and action nodes of a generated form

use super::ids::IdentifierAllocator;
use serde::Serialize;
use std::collections::HashMap;

/// Data binding of the model
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BindNode {
    /// Identifier referenced by controls
    pub id: String,
    /// Path, relative to the enclosing bind (absolute for the root)
    pub nodeset: String,
    /// XSD datatype (`xs:<builtin>`)
    pub datatype: Option<String>,
    /// Mandatory single-valued field
    pub required: bool,
    /// Validity expression
    pub constraint: Option<String>,
    /// Relevance expression
    pub relevant: Option<String>,
}

impl BindNode {
    /// Bind with an id and a path
    pub fn new(id: String, nodeset: impl Into<String>) -> Self {
        Self {
            id,
            nodeset: nodeset.into(),
            ..Self::default()
        }
    }

    /// AND an expression into the constraint
    pub fn add_constraint(&mut self, expression: &str) {
        self.constraint = Some(match self.constraint.take() {
            Some(existing) if !existing.is_empty() => format!("{} && {}", existing, expression),
            _ => expression.to_string(),
        });
    }

    /// AND an expression into the relevance
    pub fn add_relevance(&mut self, expression: &str) {
        self.relevant = Some(match self.relevant.take() {
            Some(existing) if !existing.is_empty() => format!("({}) and {}", existing, expression),
            _ => expression.to_string(),
        });
    }
    /// OR alternatives into an existing relevance, skipping the ones it
    /// already lists. A bind without relevance stays always relevant.
    pub fn widen_relevance(&mut self, alternatives: &[String]) {
        let Some(existing) = self.relevant.as_mut() else {
            return;
        };
        let missing: Vec<&str> = alternatives
            .iter()
            .map(String::as_str)
            .filter(|alt| !existing.split(" or ").any(|term| term == *alt))
            .collect();
        if missing.is_empty() {
            return;
        }
        if existing.contains(" and ") {
            *existing = format!("({})", existing);
        }
        for alt in missing {
            existing.push_str(" or ");
            existing.push_str(alt);
        }
    }
}

/// Flavour of a plain input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputKind {
    /// Free text
    Text,
    /// Checkbox
    Boolean,
    /// Number
    Numeric,
    /// Date, time or duration
    Temporal,
}

/// Where an insert action puts the new node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsertPosition {
    /// Before the node at `at`
    Before,
    /// After the node at `at`
    After,
}

impl InsertPosition {
    /// Attribute value
    pub fn as_str(self) -> &'static str {
        match self {
            InsertPosition::Before => "before",
            InsertPosition::After => "after",
        }
    }
}

/// Switch to a case when a choice is selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toggle {
    /// Id of the enclosing `xforms-select` action
    pub action_id: String,
    /// Id of the toggle
    pub id: String,
    /// Case to select
    pub case: String,
}

/// Item of a select control
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    /// Item id
    pub id: String,
    /// Displayed label
    pub label: String,
    /// Stored value
    pub value: String,
    /// Case toggled on selection (type switches only)
    pub toggle: Option<Toggle>,
}

/// Action run by a trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Action {
    /// Insert a node into a repeated nodeset
    Insert {
        /// Action id
        id: String,
        /// Bind of the repeated nodeset
        bind: Option<String>,
        /// Before or after `at`
        position: InsertPosition,
        /// Index expression
        at: String,
    },
    /// Delete a node from a repeated nodeset
    Delete {
        /// Action id
        id: String,
        /// Bind of the repeated nodeset
        bind: Option<String>,
        /// Index expression
        at: String,
    },
    /// Dispatch an event to a control
    Dispatch {
        /// Id of the enclosing action
        action_id: String,
        /// Dispatch id
        id: String,
        /// Event name
        name: String,
        /// Target control id
        target: String,
    },
}

/// Control variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ControlKind {
    /// Single line input
    Input(InputKind),
    /// Multi-line text
    TextArea,
    /// File input
    Upload,
    /// Single choice
    SelectOne {
        /// Items
        choices: Vec<Choice>,
    },
    /// Multiple choice
    SelectMany {
        /// Items
        choices: Vec<Choice>,
    },
    /// Bounded numeric value
    Range {
        /// minInclusive
        start: String,
        /// maxInclusive
        end: String,
    },
    /// Group of controls
    Group,
    /// Repeat region
    Repeat,
    /// Type switch
    Switch,
    /// Case of a switch
    Case {
        /// Initially selected
        selected: bool,
    },
    /// Button
    Trigger {
        /// Action run on activation
        action: Option<Action>,
    },
    /// Submit button
    Submit {
        /// Submission id
        submission: String,
    },
}

impl ControlKind {
    /// XForms element name, also the identifier prefix
    pub fn element_name(&self) -> &'static str {
        match self {
            ControlKind::Input(_) => "input",
            ControlKind::TextArea => "textarea",
            ControlKind::Upload => "upload",
            ControlKind::SelectOne { .. } => "select1",
            ControlKind::SelectMany { .. } => "select",
            ControlKind::Range { .. } => "range",
            ControlKind::Group => "group",
            ControlKind::Repeat => "repeat",
            ControlKind::Switch => "switch",
            ControlKind::Case { .. } => "case",
            ControlKind::Trigger { .. } => "trigger",
            ControlKind::Submit { .. } => "submit",
        }
    }

    /// Items of a select control
    pub fn choices(&self) -> &[Choice] {
        match self {
            ControlKind::SelectOne { choices } | ControlKind::SelectMany { choices } => choices,
            _ => &[],
        }
    }
}

/// User interface control
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlNode {
    /// Control id
    pub id: String,
    /// Variant and its content
    pub kind: ControlKind,
    /// Label
    pub label: Option<String>,
    /// Id of the bind the control is bound to
    pub bind: Option<String>,
    /// Appearance hint
    pub appearance: Option<String>,
    /// Help text
    pub hint: Option<String>,
}

impl ControlNode {
    /// Control with an id and a kind
    pub fn new(id: String, kind: ControlKind) -> Self {
        Self {
            id,
            kind,
            label: None,
            bind: None,
            appearance: None,
            hint: None,
        }
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Bind to a bind id
    pub fn with_bind(mut self, bind: Option<String>) -> Self {
        self.bind = bind;
        self
    }

    /// Set the appearance hint
    pub fn with_appearance(mut self, appearance: impl Into<String>) -> Self {
        self.appearance = Some(appearance.into());
        self
    }

    /// Every identifier carried by this control, nested items included
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids = vec![self.id.as_str()];
        for choice in self.kind.choices() {
            ids.push(&choice.id);
            if let Some(toggle) = &choice.toggle {
                ids.push(&toggle.action_id);
                ids.push(&toggle.id);
            }
        }
        if let ControlKind::Trigger { action: Some(action) } = &self.kind {
            match action {
                Action::Insert { id, .. } | Action::Delete { id, .. } => ids.push(id),
                Action::Dispatch { action_id, id, .. } => {
                    ids.push(action_id);
                    ids.push(id);
                }
            }
        }
        ids
    }

    /// Give this control and its nested items fresh identifiers, recording
    /// old -> new in `remap`
    pub(crate) fn reassign_ids(
        &mut self,
        ids: &mut IdentifierAllocator,
        remap: &mut HashMap<String, String>,
    ) {
        let fresh = ids.allocate(self.kind.element_name());
        remap.insert(std::mem::replace(&mut self.id, fresh.clone()), fresh);

        match &mut self.kind {
            ControlKind::SelectOne { choices } | ControlKind::SelectMany { choices } => {
                for choice in choices {
                    choice.id = ids.allocate("item");
                    if let Some(toggle) = &mut choice.toggle {
                        toggle.action_id = ids.allocate("action");
                        toggle.id = ids.allocate("toggle");
                    }
                }
            }
            ControlKind::Trigger { action: Some(action) } => match action {
                Action::Insert { id, .. } => *id = ids.allocate("insert"),
                Action::Delete { id, .. } => *id = ids.allocate("delete"),
                Action::Dispatch { action_id, id, .. } => {
                    *action_id = ids.allocate("action");
                    *id = ids.allocate("dispatch");
                }
            },
            _ => {}
        }
    }

    /// Point references to controls that were re-identified at their new
    /// identifiers
    pub(crate) fn remap_references(&mut self, remap: &HashMap<String, String>) {
        match &mut self.kind {
            ControlKind::SelectOne { choices } | ControlKind::SelectMany { choices } => {
                for toggle in choices.iter_mut().filter_map(|c| c.toggle.as_mut()) {
                    if let Some(case) = remap.get(&toggle.case) {
                        toggle.case = case.clone();
                    }
                }
            }
            ControlKind::Trigger { action: Some(action) } => match action {
                Action::Insert { at, .. } | Action::Delete { at, .. } => {
                    if let Some(repeat) = index_target(at).and_then(|r| remap.get(r)) {
                        *at = index_expression(repeat);
                    }
                }
                Action::Dispatch { target, .. } => {
                    if let Some(new_target) = remap.get(target.as_str()) {
                        *target = new_target.clone();
                    }
                }
            },
            _ => {}
        }
    }
}

/// Index expression of the current item of a repeat
pub fn index_expression(repeat_id: &str) -> String {
    format!("xforms:index('{}')", repeat_id)
}

/// Repeat id named by an index expression
pub fn index_target(expression: &str) -> Option<&str> {
    expression
        .strip_prefix("xforms:index('")
        .and_then(|rest| rest.strip_suffix("')"))
}
