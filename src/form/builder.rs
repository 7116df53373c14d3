//! Form tree builder
//!
//! Recursive descent over the type graph, starting at a global element.
//! Every element and attribute gets a bind in the model and a control in the
//! form section; polymorphic elements get a type switch with one case per
//! compatible type.

use super::context::{Anomaly, SynthesisContext};
use super::controls::{Action, BindNode, Choice, ControlKind, ControlNode, InputKind, Toggle};
use super::tree::{NodeId, NodeKind};
use super::Form;
use crate::captions::create_caption;
use crate::config::{FormConfig, FormRequest};
use crate::documents::{Attribute, Element};
use crate::error::{Result, SynthesisError};
use crate::hierarchy::TypeHierarchyIndex;
use crate::namespaces::QName;
use crate::rendering::{RenderingStrategy, XhtmlWrapper};
use crate::schema::{
    AttributeUseId, ContentType, ElementId, ModelGroup, Occurs, Term, TypeDef, TypeFamily,
    TypeGraph, TypeId,
};
use crate::XSI_NS;
use chrono::Utc;
use tracing::{debug, warn};

/// Declaration a simple-valued control is generated for
#[derive(Debug, Clone, Copy)]
pub(super) enum Owner {
    Element(ElementId),
    Attribute(AttributeUseId),
}

/// Builds XForms documents for the global elements of a schema.
///
/// The builder holds only read-only data: the type graph, the type
/// hierarchy index computed from it, the configuration and the rendering
/// strategy. All per-run state lives in a [`SynthesisContext`] created by
/// [`build_form`](FormBuilder::build_form), so one builder can serve any
/// number of runs.
pub struct FormBuilder<'g> {
    pub(super) graph: &'g dyn TypeGraph,
    pub(super) index: TypeHierarchyIndex,
    pub(super) config: FormConfig,
    strategy: Option<Box<dyn RenderingStrategy>>,
    xhtml: XhtmlWrapper,
}

impl<'g> FormBuilder<'g> {
    /// Builder with the default configuration and the XHTML strategy
    pub fn new(graph: &'g dyn TypeGraph) -> Self {
        let config = FormConfig::default();
        Self {
            graph,
            index: TypeHierarchyIndex::build(graph),
            xhtml: XhtmlWrapper::from_config(&config),
            config,
            strategy: None,
        }
    }

    /// Use a configuration
    pub fn with_config(mut self, config: FormConfig) -> Self {
        self.xhtml = XhtmlWrapper::from_config(&config);
        self.config = config;
        self
    }

    /// Use a rendering strategy instead of the XHTML one
    pub fn with_strategy(mut self, strategy: Box<dyn RenderingStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Type hierarchy index of the graph
    pub fn index(&self) -> &TypeHierarchyIndex {
        &self.index
    }

    /// Configuration in use
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub(super) fn strategy(&self) -> &dyn RenderingStrategy {
        match &self.strategy {
            Some(strategy) => strategy.as_ref(),
            None => &self.xhtml,
        }
    }

    /// Generate the form for the root element named by the request.
    ///
    /// Fails when the root element is not declared in the target namespace,
    /// or when the supplied instance has a different root element.
    /// Problems below the root are recorded as anomalies on the form.
    pub fn build_form(&self, request: &FormRequest) -> Result<Form> {
        let graph = self.graph;
        let namespace = graph.target_namespace();
        let root = graph
            .find_element(namespace, &request.root_element)
            .ok_or_else(|| SynthesisError::RootElementNotFound {
                name: request.root_element.clone(),
                namespace: namespace.unwrap_or("").to_string(),
            })?;
        let decl = graph.element(root);

        let mut cx = SynthesisContext::new();
        let (prefix, root_name) = cx.qualified(&decl.name);
        if let Some(instance) = &request.instance {
            if instance.local_name() != decl.name.local_name
                || instance.namespace() != decl.name.namespace()
            {
                return Err(SynthesisError::InstanceRootMismatch {
                    expected: root_name,
                    found: instance.qualified_name(),
                }
                .into());
            }
        }
        debug!("building form for root element '{}'", root_name);

        let strategy = self.strategy();
        let envelope = strategy.create_envelope(&mut cx.tree);
        let model_id = cx.ids.allocate("model");
        let model = cx.tree.create(NodeKind::Model {
            id: model_id,
            schema: request.schema_reference(),
        });
        let model_wrapper = strategy.create_model_wrapper(&mut cx.tree, model);
        cx.tree.append(envelope, model_wrapper);
        let form_section = strategy.create_form_wrapper(&mut cx.tree, envelope);

        let instance_id = cx.ids.allocate("instance");
        let instance_node = cx.tree.create(NodeKind::Instance {
            id: instance_id,
            root: None,
        });
        cx.tree.append(model, instance_node);

        let mut skeleton = Element::new(decl.name.clone());
        skeleton.prefix = prefix;
        skeleton.declare_namespace("xsi", XSI_NS);
        if decl.name.namespace.is_none() {
            skeleton.undeclare_default_namespace();
        }
        if let Some(value) = &decl.value_constraint {
            skeleton.set_text(value.value().to_string());
        }

        let content = strategy.create_group_content_wrapper(&mut cx.tree, form_section);
        self.add_element(
            &mut cx,
            model,
            content,
            &mut skeleton,
            root,
            &format!("/{}", root_name),
            Occurs::once(),
        );

        let submission_id = cx.ids.allocate("submission");
        let submission = cx.tree.create(NodeKind::Submission {
            id: submission_id.clone(),
            action: request.submission_action(),
            method: request.submission_method().to_string(),
        });
        cx.tree.append(model, submission);
        let submit_id = cx.ids.allocate("submit");
        let submit = ControlNode::new(
            submit_id,
            ControlKind::Submit {
                submission: submission_id,
            },
        )
        .with_label("Submit");
        let submit = cx.tree.create(NodeKind::Control(submit));
        self.append_control(&mut cx, content, submit);

        let namespaces: Vec<(String, String)> = cx
            .prefixes
            .declarations()
            .map(|(p, ns)| (p.to_string(), ns.to_string()))
            .collect();
        for (p, ns) in &namespaces {
            skeleton.declare_namespace(p, ns);
        }
        let instance_root = match &request.instance {
            Some(supplied) => {
                let mut supplied = supplied.clone();
                supplied.declare_namespace("xsi", XSI_NS);
                if supplied.namespace().is_none() {
                    supplied.undeclare_default_namespace();
                }
                supplied
            }
            None => skeleton.clone(),
        };
        if let NodeKind::Instance { root, .. } = cx.tree.kind_mut(instance_node) {
            *root = Some(instance_root);
        }

        if !cx.anomalies.is_empty() {
            debug!("form for '{}' has {} anomalies", root_name, cx.anomalies.len());
        }
        Ok(Form {
            tree: cx.tree,
            root_name,
            target_namespace: namespace.map(str::to_string),
            namespaces,
            default_instance: skeleton,
            anomalies: cx.anomalies,
            generated_at: Utc::now(),
            base: request.base.clone(),
        })
    }

    /// Generate the bind and controls of an element.
    ///
    /// Returns false when the element is left out of the form, because its
    /// type is unresolved or it would expand a type already being expanded
    /// for the same declaration.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn add_element(
        &self,
        cx: &mut SynthesisContext,
        scope: NodeId,
        section: NodeId,
        instance: &mut Element,
        element: ElementId,
        path: &str,
        occurs: Occurs,
    ) -> bool {
        let graph = self.graph;
        let decl = graph.element(element);
        let Some(type_id) = decl.type_id else {
            warn!(
                "type of element '{}' could not be resolved, skipping it",
                decl.name.local_name
            );
            cx.report(Anomaly::UnresolvedType {
                element: decl.name.local_name.clone(),
            });
            return false;
        };
        debug!(
            "element '{}' of type '{}' at {}",
            decl.name.local_name,
            graph.type_display_name(type_id),
            path
        );

        match graph.type_def(type_id) {
            TypeDef::Simple(_) | TypeDef::Any(_) => self.add_simple_type(
                cx,
                scope,
                section,
                type_id,
                Owner::Element(element),
                path,
                occurs,
            ),
            TypeDef::Complex(ct) => {
                if !cx.enter(element, type_id) {
                    let type_name = graph.type_display_name(type_id);
                    warn!(
                        "element '{}' of type '{}' recurses into itself, skipping it",
                        decl.name.local_name, type_name
                    );
                    cx.report(Anomaly::RecursiveType {
                        element: decl.name.local_name.clone(),
                        type_name,
                    });
                    return false;
                }
                let mut candidates = Vec::new();
                if !ct.is_abstract {
                    candidates.push(type_id);
                }
                candidates.extend_from_slice(self.index.compatible_types(type_id));

                if candidates.len() > 1 {
                    self.add_type_switch(
                        cx,
                        scope,
                        section,
                        instance,
                        element,
                        type_id,
                        &candidates,
                        path,
                        occurs,
                    );
                } else {
                    let resolved = candidates.first().copied().unwrap_or(type_id);
                    if resolved != type_id {
                        let value = self.type_value(cx, resolved);
                        set_instance_attribute(instance, xsi_type(), Some("xsi"), value);
                    }
                    let bind = self.create_bind(cx, scope, BindNode::default(), path);
                    self.add_complex_type(
                        cx, bind, section, instance, resolved, element, occurs, false,
                    );
                }
                cx.leave();
            }
        }
        true
    }

    /// Generate the group of a complex-typed element and its content under
    /// `element_bind`
    #[allow(clippy::too_many_arguments)]
    pub(super) fn add_complex_type(
        &self,
        cx: &mut SynthesisContext,
        element_bind: NodeId,
        section: NodeId,
        instance: &mut Element,
        type_id: TypeId,
        owner: ElementId,
        occurs: Occurs,
        reconcile: bool,
    ) {
        let graph = self.graph;
        let strategy = self.strategy();
        let Some(ct) = graph.complex_type(type_id) else {
            return;
        };
        let decl = graph.element(owner);
        let bind_id = cx.tree.bind(element_bind).map(|b| b.id.clone());

        let group_id = cx.ids.allocate("group");
        let mut group = ControlNode::new(group_id, ControlKind::Group)
            .with_label(create_caption(&decl.name.local_name))
            .with_bind(bind_id);
        group.hint = decl.documentation.clone();
        let group = cx.tree.create(NodeKind::Control(group));
        self.append_control(cx, section, group);
        let mut content = strategy.create_group_content_wrapper(&mut cx.tree, group);

        let repeat_scope = cx.tree.parent(element_bind).unwrap_or(element_bind);
        if let Some(repeat) = self.add_repeat_if_necessary(cx, repeat_scope, content, occurs) {
            content = strategy.create_group_content_wrapper(&mut cx.tree, repeat);
        }

        // simple or mixed content: a value control for the element text
        if matches!(ct.content, ContentType::Simple | ContentType::Mixed) {
            if let Some(value_type) = graph.simple_content_type(type_id) {
                self.add_simple_type(
                    cx,
                    element_bind,
                    content,
                    value_type,
                    Owner::Element(owner),
                    ".",
                    Occurs::once(),
                );
            }
        }

        for use_id in &ct.attribute_uses {
            let attribute = graph.attribute_use(*use_id);
            let (prefix, qualified) = cx.qualified(&attribute.decl.name);
            let path = format!("@{}", qualified);

            if reconcile
                && self.is_inherited_attribute(type_id, *use_id)
                && self.reuse_control(cx, element_bind, content, &path)
            {
                continue;
            }

            let Some(attribute_type) = attribute.decl.type_id else {
                warn!(
                    "type of attribute '{}' could not be resolved, skipping it",
                    attribute.decl.name.local_name
                );
                cx.report(Anomaly::UnresolvedType {
                    element: attribute.decl.name.local_name.clone(),
                });
                continue;
            };
            let value = attribute
                .effective_value_constraint()
                .map(|v| v.value().to_string())
                .unwrap_or_default();
            set_instance_attribute(instance, attribute.decl.name.clone(), prefix.as_deref(), value);

            self.add_simple_type(
                cx,
                element_bind,
                content,
                attribute_type,
                Owner::Attribute(*use_id),
                &path,
                Occurs::new(u32::from(attribute.required), Some(1)),
            );
        }

        if let Some(particle) = &ct.particle {
            if let Term::Group(group) = &particle.term {
                self.add_group(
                    cx,
                    element_bind,
                    content,
                    instance,
                    type_id,
                    owner,
                    group,
                    particle.occurs,
                    reconcile,
                );
            }
        }
    }

    /// Generate the children of a model group, in declaration order
    #[allow(clippy::too_many_arguments)]
    fn add_group(
        &self,
        cx: &mut SynthesisContext,
        element_bind: NodeId,
        section: NodeId,
        instance: &mut Element,
        type_id: TypeId,
        owner: ElementId,
        group: &ModelGroup,
        occurs: Occurs,
        reconcile: bool,
    ) {
        let graph = self.graph;
        let mut section = section;
        if let Some(repeat) = self.add_repeat_if_necessary(cx, element_bind, section, occurs) {
            section = self
                .strategy()
                .create_group_content_wrapper(&mut cx.tree, repeat);
        }

        for particle in &group.particles {
            match &particle.term {
                Term::Group(inner) => self.add_group(
                    cx,
                    element_bind,
                    section,
                    instance,
                    type_id,
                    owner,
                    inner,
                    particle.occurs,
                    reconcile,
                ),
                Term::Element(child) => {
                    if particle.occurs.is_empty() {
                        continue;
                    }
                    let child_decl = graph.element(*child);
                    let (prefix, qualified) = cx.qualified(&child_decl.name);

                    if reconcile
                        && self.is_inherited_element(type_id, &child_decl.name)
                        && self.reuse_control(cx, element_bind, section, &qualified)
                    {
                        continue;
                    }

                    let mut child_instance = Element::new(child_decl.name.clone());
                    child_instance.prefix = prefix;
                    if let Some(value) = &child_decl.value_constraint {
                        child_instance.set_text(value.value().to_string());
                    }
                    if self.add_element(
                        cx,
                        element_bind,
                        section,
                        &mut child_instance,
                        *child,
                        &qualified,
                        particle.occurs,
                    ) {
                        instance.add_child(child_instance);
                    }
                }
                Term::Wildcard(wildcard) => {
                    let owner_name = &graph.element(owner).name.local_name;
                    debug!(
                        "wildcard ({}) in '{}' is not supported, skipping it",
                        wildcard.namespace, owner_name
                    );
                    cx.report(Anomaly::UnsupportedWildcard {
                        owner: owner_name.clone(),
                    });
                }
            }
        }
    }

    /// Generate the bind and the control of a simple-valued element or
    /// attribute
    #[allow(clippy::too_many_arguments)]
    pub(super) fn add_simple_type(
        &self,
        cx: &mut SynthesisContext,
        scope: NodeId,
        section: NodeId,
        type_id: TypeId,
        owner: Owner,
        path: &str,
        occurs: Occurs,
    ) {
        let graph = self.graph;
        let strategy = self.strategy();
        let (name, documentation) = match owner {
            Owner::Element(id) => {
                let decl = graph.element(id);
                (&decl.name.local_name, decl.documentation.as_deref())
            }
            Owner::Attribute(id) => {
                let decl = &graph.attribute_use(id).decl;
                (&decl.name.local_name, decl.documentation.as_deref())
            }
        };

        let datatype = if graph.is_list(type_id) || graph.is_any_type(type_id) {
            None
        } else {
            graph.builtin_kind(type_id).map(|kind| kind.prefixed_name())
        };
        let template = BindNode {
            datatype: datatype.clone(),
            required: occurs.min > 0 && occurs.is_single(),
            ..BindNode::default()
        };
        let bind = self.create_bind(cx, scope, template, path);
        let mut control_bind = cx.tree.bind(bind).map(|b| b.id.clone());

        let mut section = section;
        if occurs.is_multiple() {
            let group_id = cx.ids.allocate("group");
            let group = ControlNode::new(group_id, ControlKind::Group)
                .with_label(create_caption(name))
                .with_bind(control_bind.clone());
            let group = cx.tree.create(NodeKind::Control(group));
            self.append_control(cx, section, group);
            section = strategy.create_group_content_wrapper(&mut cx.tree, group);

            if let Some(repeat) = self.add_repeat_if_necessary(cx, scope, section, occurs) {
                section = strategy.create_group_content_wrapper(&mut cx.tree, repeat);
                let item = BindNode {
                    datatype,
                    ..BindNode::default()
                };
                let item = self.create_bind(cx, bind, item, ".");
                control_bind = cx.tree.bind(item).map(|b| b.id.clone());
            }
        }

        let mut control = self.create_form_control(cx, type_id, control_bind);
        control.label = Some(create_caption(name));
        control.hint = documentation.map(str::to_string);
        let control = cx.tree.create(NodeKind::Control(control));
        self.append_control(cx, section, control);
    }

    /// The control for a simple type: list, enumeration, range, then the
    /// built-in family
    fn create_form_control(
        &self,
        cx: &mut SynthesisContext,
        type_id: TypeId,
        bind: Option<String>,
    ) -> ControlNode {
        let graph = self.graph;
        if graph.is_any_type(type_id) {
            return ControlNode::new(cx.ids.allocate("textarea"), ControlKind::TextArea)
                .with_bind(bind);
        }

        if graph.is_list(type_id) {
            let values = graph
                .list_item_type(type_id)
                .map(|item| graph.enumeration(item))
                .unwrap_or(&[]);
            let id = cx.ids.allocate("select");
            let choices = choices(cx, values);
            return ControlNode::new(id, ControlKind::SelectMany { choices })
                .with_bind(bind)
                .with_appearance(self.config.select_many_appearance(values.len()));
        }

        let values = graph.enumeration(type_id);
        if !values.is_empty() {
            let id = cx.ids.allocate("select1");
            let choices = choices(cx, values);
            return ControlNode::new(id, ControlKind::SelectOne { choices })
                .with_bind(bind)
                .with_appearance(self.config.select_one_appearance(values.len()));
        }

        let family = graph.builtin_kind(type_id).map(|kind| kind.family());
        if family == Some(TypeFamily::Numeric) {
            if let Some((start, end)) = graph.range_bounds(type_id) {
                let kind = ControlKind::Range {
                    start: start.to_string(),
                    end: end.to_string(),
                };
                return ControlNode::new(cx.ids.allocate("range"), kind).with_bind(bind);
            }
        }

        let kind = match family {
            Some(TypeFamily::Binary) => ControlKind::Upload,
            Some(TypeFamily::Boolean) => ControlKind::Input(InputKind::Boolean),
            Some(TypeFamily::Numeric) => ControlKind::Input(InputKind::Numeric),
            Some(TypeFamily::Temporal) => ControlKind::Input(InputKind::Temporal),
            _ => ControlKind::Input(InputKind::Text),
        };
        ControlNode::new(cx.ids.allocate(kind.element_name()), kind).with_bind(bind)
    }

    /// Generate the discriminator and the switch of a polymorphic element
    #[allow(clippy::too_many_arguments)]
    fn add_type_switch(
        &self,
        cx: &mut SynthesisContext,
        scope: NodeId,
        section: NodeId,
        instance: &mut Element,
        element: ElementId,
        declared: TypeId,
        candidates: &[TypeId],
        path: &str,
        occurs: Occurs,
    ) {
        let graph = self.graph;
        let strategy = self.strategy();
        let decl = graph.element(element);
        debug!(
            "type switch for '{}' over {} types",
            decl.name.local_name,
            candidates.len()
        );

        let select_id = cx.ids.allocate("select1");
        let label = create_caption(&format!("{} Type", decl.name.local_name));
        let type_bind =
            self.create_bind(cx, scope, BindNode::default(), &format!("{}/@xsi:type", path));
        let element_bind = self.create_bind(cx, scope, BindNode::default(), path);

        let mut section = section;
        if let Some(repeat) = self.add_repeat_if_necessary(cx, scope, section, occurs) {
            section = strategy.create_group_content_wrapper(&mut cx.tree, repeat);
        }

        let count = candidates.len();
        let mut choices = Vec::new();
        if self.config.is_long_select_one(count) {
            let sentinel = format!("[Select1 {}]", label);
            if let Some(bind) = cx.tree.bind_mut(type_bind) {
                bind.add_constraint(&format!("not( . = '{}')", sentinel));
            }
            choices.push(Choice {
                id: cx.ids.allocate("item"),
                label: sentinel.clone(),
                value: sentinel,
                toggle: None,
            });
        }

        let mut case_ids = Vec::with_capacity(count);
        for candidate in candidates {
            let item_id = cx.ids.allocate("item");
            let action_id = cx.ids.allocate("action");
            let toggle_id = cx.ids.allocate("toggle");
            let case_id = cx.ids.allocate("case");
            choices.push(Choice {
                id: item_id,
                label: create_caption(&graph.type_display_name(*candidate)),
                value: self.type_value(cx, *candidate),
                toggle: Some(Toggle {
                    action_id,
                    id: toggle_id,
                    case: case_id.clone(),
                }),
            });
            case_ids.push(case_id);
        }

        let type_bind_id = cx.tree.bind(type_bind).map(|b| b.id.clone());
        let select = ControlNode::new(select_id.clone(), ControlKind::SelectOne { choices })
            .with_label(label)
            .with_bind(type_bind_id)
            .with_appearance(self.config.select_one_appearance(count));
        let select = cx.tree.create(NodeKind::Control(select));
        self.append_control(cx, section, select);

        let trigger = ControlNode::new(
            cx.ids.allocate("trigger"),
            ControlKind::Trigger {
                action: Some(Action::Dispatch {
                    action_id: cx.ids.allocate("action"),
                    id: cx.ids.allocate("dispatch"),
                    name: "DOMActivate".to_string(),
                    target: select_id,
                }),
            },
        )
        .with_label("Validate Choice");
        let trigger = cx.tree.create(NodeKind::Control(trigger));
        cx.tree.append(section, trigger);

        let switch_id = cx.ids.allocate("switch");
        let switch = cx
            .tree
            .create(NodeKind::Control(ControlNode::new(switch_id, ControlKind::Switch)));
        self.append_control(cx, section, switch);

        let value = self.type_value(cx, candidates[0]);
        set_instance_attribute(instance, xsi_type(), Some("xsi"), value);

        for (i, (candidate, case_id)) in candidates.iter().zip(case_ids).enumerate() {
            let case = ControlNode::new(case_id, ControlKind::Case { selected: i == 0 })
                .with_label(create_caption(&graph.type_display_name(*candidate)));
            let case = cx.tree.create(NodeKind::Control(case));
            cx.tree.append(switch, case);
            let content = strategy.create_group_content_wrapper(&mut cx.tree, case);

            let existing = cx.tree.children(element_bind).to_vec();
            let outer = cx.swap_reused(Vec::new());
            let mut case_instance = Element::new(decl.name.clone());
            let derived = *candidate != declared;
            self.add_complex_type(
                cx,
                element_bind,
                content,
                &mut case_instance,
                *candidate,
                element,
                Occurs::once(),
                derived,
            );
            merge_instance(instance, case_instance);
            let reused = cx.swap_reused(outer);

            if derived {
                self.apply_relevance(cx, element_bind, &existing, &reused, *candidate);
            }
        }
    }

    /// Value written to `xsi:type` for a type
    pub(super) fn type_value(&self, cx: &mut SynthesisContext, type_id: TypeId) -> String {
        match self.graph.type_def(type_id).name() {
            Some(name) => cx.qualified(name).1,
            None => self.graph.type_display_name(type_id),
        }
    }

    /// Create a bind from a template with a fresh id and append it to
    /// `scope`
    fn create_bind(
        &self,
        cx: &mut SynthesisContext,
        scope: NodeId,
        template: BindNode,
        nodeset: &str,
    ) -> NodeId {
        let bind = BindNode {
            id: cx.ids.allocate("bind"),
            nodeset: nodeset.to_string(),
            ..template
        };
        let node = cx.tree.create(NodeKind::Bind(bind));
        cx.tree.append(scope, node);
        node
    }

    /// Wrap a control with the strategy and append it to `section`
    pub(super) fn append_control(&self, cx: &mut SynthesisContext, section: NodeId, control: NodeId) {
        let wrapper = self
            .strategy()
            .create_controls_wrapper(&mut cx.tree, control);
        cx.tree.append(section, wrapper);
    }
}

fn choices(cx: &mut SynthesisContext, values: &[String]) -> Vec<Choice> {
    values
        .iter()
        .map(|value| Choice {
            id: cx.ids.allocate("item"),
            label: create_caption(value),
            value: value.clone(),
            toggle: None,
        })
        .collect()
}

fn xsi_type() -> QName {
    QName::namespaced(XSI_NS, "type")
}

/// Set an attribute of an instance element, keeping the first value when it
/// already exists
fn set_instance_attribute(instance: &mut Element, name: QName, prefix: Option<&str>, value: String) {
    if instance.attributes.iter().any(|a| a.qname == name) {
        return;
    }
    instance.attributes.push(Attribute {
        qname: name,
        prefix: prefix.map(str::to_string),
        value,
    });
}

/// Add the attributes and children of one switch case to the instance,
/// skipping names another case already contributed
fn merge_instance(instance: &mut Element, case: Element) {
    for attribute in case.attributes {
        if !instance.attributes.iter().any(|a| a.qname == attribute.qname) {
            instance.attributes.push(attribute);
        }
    }
    if instance.text.is_none() {
        instance.text = case.text;
    }
    for child in case.children {
        if !instance.children.iter().any(|c| c.qname == child.qname) {
            instance.add_child(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::PlainEnvelope;
    use crate::schema::SchemaModel;
    use pretty_assertions::assert_eq;

    const PO: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
    xmlns="urn:example:po" targetNamespace="urn:example:po" elementFormDefault="qualified">
  <xs:element name="order">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="customer" type="xs:string">
          <xs:annotation><xs:documentation>Name on the invoice</xs:documentation></xs:annotation>
        </xs:element>
        <xs:element name="paid" type="xs:boolean" minOccurs="0"/>
        <xs:element name="note" type="xs:string" default="none"/>
        <xs:element name="colour" type="Colour"/>
        <xs:element name="tags" type="Tags"/>
        <xs:element name="line" type="xs:string" maxOccurs="unbounded"/>
      </xs:sequence>
      <xs:attribute name="id" type="xs:ID" use="required"/>
      <xs:attribute name="status" type="xs:string" fixed="open"/>
    </xs:complexType>
  </xs:element>
  <xs:simpleType name="Colour">
    <xs:restriction base="xs:string">
      <xs:enumeration value="red"/>
      <xs:enumeration value="darkGreen"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:simpleType name="Tags">
    <xs:list itemType="Colour"/>
  </xs:simpleType>
</xs:schema>"#;

    fn build(schema: &SchemaModel, root: &str) -> Form {
        FormBuilder::new(schema)
            .with_strategy(Box::new(PlainEnvelope))
            .build_form(&FormRequest::new(root))
            .unwrap()
    }

    #[test]
    fn test_simple_children_get_binds_and_controls() {
        let schema = SchemaModel::from_string(PO).unwrap();
        let form = build(&schema, "order");

        let binds = form.binds();
        let nodesets: Vec<_> = binds.iter().map(|b| b.nodeset.as_str()).collect();
        assert_eq!(
            nodesets,
            [
                "/po:order", "@id", "@status", "po:customer", "po:paid", "po:note",
                "po:colour", "po:tags", "po:line", "."
            ]
        );
        let customer = form.bind_by_nodeset("po:customer").unwrap();
        assert_eq!(customer.datatype.as_deref(), Some("xs:string"));
        assert!(customer.required);
        assert!(!form.bind_by_nodeset("po:paid").unwrap().required);
        assert!(form.bind_by_nodeset("@id").unwrap().required);
        assert_eq!(form.bind_by_nodeset("po:tags").unwrap().datatype, None);

        let input = form.controls_bound_to(&customer.id)[0];
        assert_eq!(input.kind, ControlKind::Input(InputKind::Text));
        assert_eq!(input.label.as_deref(), Some("Customer"));
        assert_eq!(input.hint.as_deref(), Some("Name on the invoice"));

        let paid = form.bind_by_nodeset("po:paid").unwrap();
        assert_eq!(
            form.controls_bound_to(&paid.id)[0].kind,
            ControlKind::Input(InputKind::Boolean)
        );
        assert!(form.anomalies.is_empty());
    }

    #[test]
    fn test_enumeration_and_list_dispatch() {
        let schema = SchemaModel::from_string(PO).unwrap();
        let form = build(&schema, "order");

        let colour = form.bind_by_nodeset("po:colour").unwrap();
        let select = form.controls_bound_to(&colour.id)[0];
        assert_eq!(select.appearance.as_deref(), Some("full"));
        match &select.kind {
            ControlKind::SelectOne { choices } => {
                let labels: Vec<_> = choices.iter().map(|c| c.label.as_str()).collect();
                assert_eq!(labels, ["Red", "Dark Green"]);
                assert_eq!(choices[1].value, "darkGreen");
            }
            other => panic!("expected select1, got {:?}", other),
        }

        let tags = form.bind_by_nodeset("po:tags").unwrap();
        assert!(matches!(
            &form.controls_bound_to(&tags.id)[0].kind,
            ControlKind::SelectMany { choices } if choices.len() == 2
        ));
    }

    #[test]
    fn test_default_instance_skeleton() {
        let schema = SchemaModel::from_string(PO).unwrap();
        let form = build(&schema, "order");
        let root = &form.default_instance;

        assert_eq!(root.qualified_name(), "po:order");
        assert_eq!(root.get_attribute("status"), Some("open"));
        assert_eq!(root.get_attribute("id"), Some(""));
        let note = root.children.iter().find(|c| c.local_name() == "note").unwrap();
        assert_eq!(note.text.as_deref(), Some("none"));
        assert_eq!(root.children.len(), 6);
        assert!(root
            .declarations
            .contains(&(Some("po".to_string()), "urn:example:po".to_string())));
    }

    #[test]
    fn test_unknown_root_and_mismatched_instance() {
        let schema = SchemaModel::from_string(PO).unwrap();
        let builder = FormBuilder::new(&schema);
        let err = builder.build_form(&FormRequest::new("invoice")).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Synthesis(SynthesisError::RootElementNotFound { ref namespace, .. })
                if namespace == "urn:example:po"
        ));

        let instance = crate::documents::Document::from_string("<invoice/>")
            .unwrap()
            .into_root()
            .unwrap();
        let err = builder
            .build_form(&FormRequest::new("order").with_instance(instance))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Synthesis(SynthesisError::InstanceRootMismatch { .. })
        ));
    }

    #[test]
    fn test_submission_and_submit_control() {
        let schema = SchemaModel::from_string(PO).unwrap();
        let form = FormBuilder::new(&schema)
            .build_form(&FormRequest::new("order").with_action("save"))
            .unwrap();
        let (action, method) = form
            .tree
            .walk()
            .into_iter()
            .find_map(|n| match form.tree.kind(n) {
                NodeKind::Submission { action, method, .. } => Some((action.clone(), method.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(action, "save");
        assert_eq!(method, "post");
        let submits = form.controls_of("submit");
        assert_eq!(submits.len(), 1);
        assert_eq!(submits[0].label.as_deref(), Some("Submit"));
    }

    #[test]
    fn test_recursive_content_model_is_cut() {
        let schema = SchemaModel::from_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="tree" type="Node"/>
  <xs:complexType name="Node">
    <xs:sequence>
      <xs:element name="label" type="xs:string"/>
      <xs:element name="child" type="Node" minOccurs="0" maxOccurs="unbounded"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#,
        )
        .unwrap();
        let form = build(&schema, "tree");

        assert_eq!(
            form.anomalies,
            [Anomaly::RecursiveType {
                element: "child".into(),
                type_name: "Node".into(),
            }]
        );
        let nodesets: Vec<_> = form.binds().iter().map(|b| b.nodeset.as_str()).collect();
        assert_eq!(nodesets, ["/tree", "label", "child", "label"]);
        assert_eq!(form.controls_of("repeat").len(), 1);

        let child = &form.default_instance.find_children("child")[0];
        let names: Vec<_> = child.children.iter().map(|c| c.local_name()).collect();
        assert_eq!(names, ["label"]);
    }

    #[test]
    fn test_mutual_recursion_is_cut() {
        let schema = SchemaModel::from_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="folder" type="Folder"/>
  <xs:complexType name="Folder">
    <xs:sequence>
      <xs:element name="entry" type="Entry" minOccurs="0"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="Entry">
    <xs:sequence>
      <xs:element name="title" type="xs:string"/>
      <xs:element name="folder" type="Folder" minOccurs="0"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#,
        )
        .unwrap();
        let form = build(&schema, "folder");

        assert_eq!(form.anomalies.len(), 1);
        assert!(matches!(
            &form.anomalies[0],
            Anomaly::RecursiveType { element, type_name } if element == "entry" && type_name == "Entry"
        ));
        let nodesets: Vec<_> = form.binds().iter().map(|b| b.nodeset.as_str()).collect();
        assert_eq!(nodesets, ["/folder", "entry", "title", "folder"]);
    }

    #[test]
    fn test_abstract_base_with_one_substitute() {
        let schema = SchemaModel::from_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="payment" type="Payment"/>
  <xs:complexType name="Payment" abstract="true">
    <xs:sequence>
      <xs:element name="amount" type="xs:decimal"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="CardPayment">
    <xs:complexContent>
      <xs:extension base="Payment">
        <xs:sequence>
          <xs:element name="cardNumber" type="xs:string"/>
        </xs:sequence>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
</xs:schema>"#,
        )
        .unwrap();
        let form = build(&schema, "payment");

        assert!(form.controls_of("switch").is_empty());
        assert!(form.controls_of("case").is_empty());
        assert!(form.bind_by_nodeset("/payment/@xsi:type").is_none());
        let nodesets: Vec<_> = form.binds().iter().map(|b| b.nodeset.as_str()).collect();
        assert_eq!(nodesets, ["/payment", "amount", "cardNumber"]);
        assert!(form.binds().iter().all(|b| b.relevant.is_none()));

        let root = &form.default_instance;
        let xsi_type = root
            .attributes
            .iter()
            .find(|a| a.qname == xsi_type())
            .map(|a| a.value.as_str());
        assert_eq!(xsi_type, Some("CardPayment"));
        assert_eq!(root.children.len(), 2);
        assert!(form.anomalies.is_empty());
    }
}
