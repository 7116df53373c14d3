//! XForms document output

use super::controls::{Action, Choice, ControlKind, ControlNode};
use super::tree::{NodeId, NodeKind};
use super::Form;
use crate::error::{Error, Result};
use crate::{CHIBA_NS, VERSION, XFORMS_NS, XLINK_NS, XMLEVENTS_NS, XSD_NAMESPACE, XSI_NS};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Prefixed XForms element name
fn xf(local: &str) -> String {
    format!("xforms:{}", local)
}

impl Form {
    /// Serialize the form as an indented XML document
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let comment = format!(
            " This XForm was generated by xsdform {} on {} from the '{}' element of the '{}' XML Schema. ",
            VERSION,
            self.generated_at.format("%Y-%m-%dT%H:%M:%SZ"),
            self.root_name,
            self.target_namespace.as_deref().unwrap_or(""),
        );
        writer.write_event(Event::Comment(BytesText::from_escaped(comment)))?;

        if let Some(root) = self.tree.root() {
            self.write_node(&mut writer, root, true)?;
        }
        String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))
    }

    fn write_node<W: Write>(&self, writer: &mut Writer<W>, node: NodeId, is_root: bool) -> Result<()> {
        let children = self.tree.children(node);
        match self.tree.kind(node) {
            NodeKind::Markup(markup) => {
                let mut start = BytesStart::new(markup.name.as_str());
                if is_root {
                    self.push_declarations(&mut start);
                }
                for (name, value) in &markup.attributes {
                    start.push_attribute((name.as_str(), value.as_str()));
                }
                if children.is_empty() && markup.text.is_none() {
                    writer.write_event(Event::Empty(start))?;
                    return Ok(());
                }
                writer.write_event(Event::Start(start))?;
                if let Some(text) = &markup.text {
                    writer.write_event(Event::Text(BytesText::new(text)))?;
                }
                self.write_children(writer, children)?;
                writer.write_event(Event::End(BytesEnd::new(markup.name.as_str())))?;
            }
            NodeKind::Model { id, schema } => {
                let name = xf("model");
                let mut start = BytesStart::new(name.as_str());
                if is_root {
                    self.push_declarations(&mut start);
                }
                start.push_attribute(("id", id.as_str()));
                if let Some(schema) = schema {
                    start.push_attribute(("schema", schema.as_str()));
                }
                writer.write_event(Event::Start(start))?;
                self.write_children(writer, children)?;
                writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
            }
            NodeKind::Instance { id, root } => {
                let name = xf("instance");
                let mut start = BytesStart::new(name.as_str());
                start.push_attribute(("id", id.as_str()));
                match root {
                    Some(root) => {
                        writer.write_event(Event::Start(start))?;
                        root.write_to(writer)?;
                        writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
                    }
                    None => {
                        writer.write_event(Event::Empty(start))?;
                    }
                }
            }
            NodeKind::Bind(bind) => {
                let name = xf("bind");
                let mut start = BytesStart::new(name.as_str());
                start.push_attribute(("id", bind.id.as_str()));
                start.push_attribute(("nodeset", bind.nodeset.as_str()));
                if let Some(datatype) = &bind.datatype {
                    start.push_attribute(("type", datatype.as_str()));
                }
                if bind.required {
                    start.push_attribute(("required", "true()"));
                }
                if let Some(constraint) = &bind.constraint {
                    start.push_attribute(("constraint", constraint.as_str()));
                }
                if let Some(relevant) = &bind.relevant {
                    start.push_attribute(("relevant", relevant.as_str()));
                }
                if children.is_empty() {
                    writer.write_event(Event::Empty(start))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                    self.write_children(writer, children)?;
                    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
                }
            }
            NodeKind::Submission { id, action, method } => {
                let name = xf("submission");
                let mut start = BytesStart::new(name.as_str());
                start.push_attribute(("id", id.as_str()));
                start.push_attribute(("action", action.as_str()));
                start.push_attribute(("method", method.as_str()));
                writer.write_event(Event::Empty(start))?;
            }
            NodeKind::Control(control) => self.write_control(writer, control, children)?,
        }
        Ok(())
    }

    fn write_children<W: Write>(&self, writer: &mut Writer<W>, children: &[NodeId]) -> Result<()> {
        for child in children {
            self.write_node(writer, *child, false)?;
        }
        Ok(())
    }

    fn push_declarations(&self, start: &mut BytesStart) {
        let fixed = [
            ("xmlns:xforms", XFORMS_NS),
            ("xmlns:ev", XMLEVENTS_NS),
            ("xmlns:xsi", XSI_NS),
            ("xmlns:xs", XSD_NAMESPACE),
            ("xmlns:chiba", CHIBA_NS),
            ("xmlns:xlink", XLINK_NS),
        ];
        for attribute in fixed {
            start.push_attribute(attribute);
        }
        for (prefix, namespace) in &self.namespaces {
            let key = format!("xmlns:{}", prefix);
            start.push_attribute((key.as_str(), namespace.as_str()));
        }
        if let Some(base) = &self.base {
            start.push_attribute(("xml:base", base.as_str()));
        }
    }

    fn write_control<W: Write>(
        &self,
        writer: &mut Writer<W>,
        control: &ControlNode,
        children: &[NodeId],
    ) -> Result<()> {
        let name = xf(control.kind.element_name());
        let mut start = BytesStart::new(name.as_str());
        start.push_attribute(("id", control.id.as_str()));
        if let Some(bind) = &control.bind {
            start.push_attribute(("bind", bind.as_str()));
        }
        if let Some(appearance) = &control.appearance {
            start.push_attribute(("appearance", appearance.as_str()));
        }
        match &control.kind {
            ControlKind::Range { start: low, end } => {
                start.push_attribute(("start", low.as_str()));
                start.push_attribute(("end", end.as_str()));
            }
            ControlKind::Submit { submission } => {
                start.push_attribute(("submission", submission.as_str()));
            }
            ControlKind::Case { selected } => {
                start.push_attribute(("selected", if *selected { "true" } else { "false" }));
            }
            _ => {}
        }
        writer.write_event(Event::Start(start))?;

        if let Some(label) = &control.label {
            write_text_element(writer, "label", label)?;
        }
        if let Some(hint) = &control.hint {
            write_text_element(writer, "hint", hint)?;
        }
        match &control.kind {
            ControlKind::SelectOne { choices } | ControlKind::SelectMany { choices } => {
                write_choices(writer, choices)?;
            }
            ControlKind::Trigger {
                action: Some(action),
            } => write_action(writer, action)?,
            _ => {}
        }
        self.write_children(writer, children)?;

        writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, local: &str, text: &str) -> Result<()> {
    let name = xf(local);
    writer.write_event(Event::Start(BytesStart::new(name.as_str())))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}

fn write_choices<W: Write>(writer: &mut Writer<W>, choices: &[Choice]) -> Result<()> {
    let wrapper = xf("choices");
    let item_name = xf("item");
    writer.write_event(Event::Start(BytesStart::new(wrapper.as_str())))?;
    for choice in choices {
        let mut item = BytesStart::new(item_name.as_str());
        item.push_attribute(("id", choice.id.as_str()));
        writer.write_event(Event::Start(item))?;
        write_text_element(writer, "label", &choice.label)?;
        write_text_element(writer, "value", &choice.value)?;
        if let Some(toggle) = &choice.toggle {
            let action_name = xf("action");
            let mut action = BytesStart::new(action_name.as_str());
            action.push_attribute(("id", toggle.action_id.as_str()));
            action.push_attribute(("ev:event", "xforms-select"));
            writer.write_event(Event::Start(action))?;
            let mut element = BytesStart::new(xf("toggle"));
            element.push_attribute(("id", toggle.id.as_str()));
            element.push_attribute(("case", toggle.case.as_str()));
            writer.write_event(Event::Empty(element))?;
            writer.write_event(Event::End(BytesEnd::new(action_name.as_str())))?;
        }
        writer.write_event(Event::End(BytesEnd::new(item_name.as_str())))?;
    }
    writer.write_event(Event::End(BytesEnd::new(wrapper.as_str())))?;
    Ok(())
}

fn write_action<W: Write>(writer: &mut Writer<W>, action: &Action) -> Result<()> {
    match action {
        Action::Insert {
            id,
            bind,
            position,
            at,
        } => {
            let mut element = BytesStart::new(xf("insert"));
            element.push_attribute(("id", id.as_str()));
            element.push_attribute(("ev:event", "DOMActivate"));
            if let Some(bind) = bind {
                element.push_attribute(("bind", bind.as_str()));
            }
            element.push_attribute(("position", position.as_str()));
            element.push_attribute(("at", at.as_str()));
            writer.write_event(Event::Empty(element))?;
        }
        Action::Delete { id, bind, at } => {
            let mut element = BytesStart::new(xf("delete"));
            element.push_attribute(("id", id.as_str()));
            element.push_attribute(("ev:event", "DOMActivate"));
            if let Some(bind) = bind {
                element.push_attribute(("bind", bind.as_str()));
            }
            element.push_attribute(("at", at.as_str()));
            writer.write_event(Event::Empty(element))?;
        }
        Action::Dispatch {
            action_id,
            id,
            name,
            target,
        } => {
            let action_name = xf("action");
            let mut element = BytesStart::new(action_name.as_str());
            element.push_attribute(("id", action_id.as_str()));
            element.push_attribute(("ev:event", "DOMActivate"));
            writer.write_event(Event::Start(element))?;
            let mut dispatch = BytesStart::new(xf("dispatch"));
            dispatch.push_attribute(("id", id.as_str()));
            dispatch.push_attribute(("name", name.as_str()));
            dispatch.push_attribute(("target", target.as_str()));
            writer.write_event(Event::Empty(dispatch))?;
            writer.write_event(Event::End(BytesEnd::new(action_name.as_str())))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::FormRequest;
    use crate::documents::Document;
    use crate::form::FormBuilder;
    use crate::rendering::PlainEnvelope;
    use crate::schema::SchemaModel;
    use crate::XFORMS_NS;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
    targetNamespace="urn:example:notes" elementFormDefault="qualified">
  <xs:element name="note">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="body" type="xs:string"/>
        <xs:element name="tag" type="xs:string" maxOccurs="unbounded"/>
      </xs:sequence>
      <xs:attribute name="lang" type="xs:language" default="en"/>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    #[test]
    fn test_xml_output_reparses() {
        let schema = SchemaModel::from_string(SCHEMA).unwrap();
        let form = FormBuilder::new(&schema)
            .build_form(
                &FormRequest::new("note")
                    .with_base("http://host/")
                    .with_action("save"),
            )
            .unwrap();
        let xml = form.to_xml_string().unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("This XForm was generated by xsdform"));
        assert!(xml.contains("from the 'notes:note' element of the 'urn:example:notes' XML Schema."));
        assert!(xml.contains(r#"xml:base="http://host/""#));
        assert!(xml.contains(r#"nodeset="/notes:note""#));
        assert!(xml.contains(r#"<xforms:submission id="submission_0" action="http://host/save" method="post"/>"#));
        assert!(xml.contains(r#"position="after" at="xforms:index(&apos;repeat_0&apos;)""#));
        assert!(xml.contains(r#"<notes:note xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:notes="urn:example:notes" lang="en">"#));

        let doc = Document::from_string(&xml).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.local_name(), "html");
        let head = &root.children[0];
        let model = head
            .children
            .iter()
            .find(|c| c.local_name() == "model")
            .unwrap();
        assert_eq!(model.namespace(), Some(XFORMS_NS));
    }

    #[test]
    fn test_plain_envelope_serialization() {
        let schema = SchemaModel::from_string(SCHEMA).unwrap();
        let form = FormBuilder::new(&schema)
            .with_strategy(Box::new(PlainEnvelope))
            .build_form(&FormRequest::new("note"))
            .unwrap();
        let xml = form.to_xml_string().unwrap();
        assert!(xml.contains("<envelope xmlns:xforms=\"http://www.w3.org/2002/xforms\""));
        assert!(xml.contains("<xforms:label>Body</xforms:label>"));
        assert!(xml.contains(r#"<xforms:submit id="submit_0" submission="submission_0">"#));
        assert!(!xml.contains("xml:base"));
    }
}
