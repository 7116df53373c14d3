//! Extension reuse inside type switches
//!
//! While the case of a derived type is filled in, declarations it inherits
//! from its base usually have controls in an earlier case already: the case
//! of the declared type, or under an abstract declared type the first case
//! that met them. Those controls are copied instead of generated again, so
//! all cases edit the same instance node through one bind.

use super::builder::FormBuilder;
use super::context::{Anomaly, SynthesisContext};
use super::tree::NodeId;
use crate::namespaces::QName;
use crate::schema::{AttributeUseId, TypeId};
use std::collections::HashSet;
use tracing::{debug, warn};

impl FormBuilder<'_> {
    /// Complex types on the base chain of `type_id`, nearest first
    fn ancestors(&self, type_id: TypeId) -> Vec<TypeId> {
        let mut out = Vec::new();
        let mut visited = HashSet::from([type_id]);
        let mut current = self.graph.base_type(type_id);
        while let Some(base) = current {
            if !visited.insert(base) || self.graph.complex_type(base).is_none() {
                break;
            }
            out.push(base);
            current = self.graph.base_type(base);
        }
        out
    }

    /// Whether an ancestor of `type_id` already uses the attribute
    pub(super) fn is_inherited_attribute(&self, type_id: TypeId, use_id: AttributeUseId) -> bool {
        self.ancestors(type_id).into_iter().any(|base| {
            self.graph
                .complex_type(base)
                .is_some_and(|ct| ct.attribute_uses.contains(&use_id))
        })
    }

    /// Whether an ancestor of `type_id` declares an element with this name
    pub(super) fn is_inherited_element(&self, type_id: TypeId, name: &QName) -> bool {
        self.ancestors(type_id).into_iter().any(|base| {
            self.graph
                .complex_type(base)
                .and_then(|ct| ct.particle.as_ref())
                .is_some_and(|particle| {
                    particle
                        .element_ids()
                        .into_iter()
                        .any(|e| self.graph.element(e).name == *name)
                })
        })
    }

    /// Copy the control bound to the child bind of `scope` with the given
    /// nodeset and append the copy to `section`.
    ///
    /// Returns false when `scope` has no such bind yet, so the caller
    /// generates the declaration itself. This happens for the first case
    /// of a switch over an abstract type.
    pub(super) fn reuse_control(
        &self,
        cx: &mut SynthesisContext,
        scope: NodeId,
        section: NodeId,
        nodeset: &str,
    ) -> bool {
        let Some(bind) = cx
            .tree
            .children(scope)
            .iter()
            .copied()
            .find(|child| cx.tree.bind(*child).is_some_and(|b| b.nodeset == nodeset))
        else {
            return false;
        };
        let source = cx
            .tree
            .bind(bind)
            .map(|b| b.id.clone())
            .and_then(|id| cx.tree.find_control_bound_to(&id));

        let Some(source) = source else {
            warn!("no existing control for inherited '{}', skipping it", nodeset);
            cx.report(Anomaly::ReusedControlNotFound {
                name: nodeset.to_string(),
            });
            return true;
        };
        let copy = cx.tree.deep_clone(source, &mut cx.ids);
        debug!("reused control for inherited '{}'", nodeset);
        self.append_control(cx, section, copy);
        cx.note_reused(bind);
        true
    }

    /// Make the binds a derived case added under `element_bind` relevant
    /// only when `xsi:type` names the case type or a type derived from it.
    ///
    /// Binds the case shares with earlier derived cases get the case types
    /// ORed into their relevance.
    pub(super) fn apply_relevance(
        &self,
        cx: &mut SynthesisContext,
        element_bind: NodeId,
        existing: &[NodeId],
        reused: &[NodeId],
        candidate: TypeId,
    ) {
        let types: Vec<TypeId> = std::iter::once(candidate)
            .chain(self.index.compatible_types(candidate).iter().copied())
            .collect();
        let alternatives: Vec<String> = types
            .into_iter()
            .map(|t| format!("../@xsi:type='{}'", self.type_value(cx, t)))
            .collect();
        let expression = alternatives.join(" or ");

        let children = cx.tree.children(element_bind).to_vec();
        for child in children {
            let added = !existing.contains(&child);
            let shared = reused.contains(&child);
            let Some(bind) = cx.tree.bind_mut(child) else {
                continue;
            };
            if bind.nodeset == "." {
                continue;
            }
            if added {
                bind.add_relevance(&expression);
            } else if shared {
                bind.widen_relevance(&alternatives);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::FormRequest;
    use crate::form::controls::ControlKind;
    use crate::form::FormBuilder;
    use crate::rendering::PlainEnvelope;
    use crate::schema::{SchemaModel, TypeGraph};
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="shape" type="Shape"/>
  <xs:complexType name="Shape">
    <xs:sequence>
      <xs:element name="name" type="xs:string"/>
    </xs:sequence>
    <xs:attribute name="colour" type="xs:string"/>
  </xs:complexType>
  <xs:complexType name="Circle">
    <xs:complexContent>
      <xs:extension base="Shape">
        <xs:sequence>
          <xs:element name="radius" type="xs:decimal"/>
        </xs:sequence>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="Ring">
    <xs:complexContent>
      <xs:extension base="Circle">
        <xs:attribute name="inner" type="xs:decimal"/>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
</xs:schema>"#;

    #[test]
    fn test_inheritance_checks() {
        let schema = SchemaModel::from_string(SCHEMA).unwrap();
        let builder = FormBuilder::new(&schema);
        let ring = schema.find_type(None, "Ring").unwrap();
        let circle = schema.find_type(None, "Circle").unwrap();
        let shape = schema.find_type(None, "Shape").unwrap();
        assert_eq!(builder.ancestors(ring), vec![circle, shape]);

        let uses = &schema.complex_type(ring).unwrap().attribute_uses;
        assert_eq!(uses.len(), 2);
        assert!(builder.is_inherited_attribute(ring, uses[0]));
        assert!(!builder.is_inherited_attribute(ring, uses[1]));

        let name = crate::namespaces::QName::local("name");
        let radius = crate::namespaces::QName::local("radius");
        assert!(builder.is_inherited_element(circle, &name));
        assert!(!builder.is_inherited_element(circle, &radius));
        assert!(builder.is_inherited_element(ring, &radius));
    }

    #[test]
    fn test_inherited_controls_are_copies() {
        let schema = SchemaModel::from_string(SCHEMA).unwrap();
        let form = FormBuilder::new(&schema)
            .with_strategy(Box::new(PlainEnvelope))
            .build_form(&FormRequest::new("shape"))
            .unwrap();
        assert!(form.anomalies.is_empty(), "{:?}", form.anomalies);

        // one bind per distinct path, shared by the cases
        let colour = form.bind_by_nodeset("@colour").unwrap();
        let inputs = form.controls_bound_to(&colour.id);
        assert_eq!(inputs.len(), 3);
        assert!(inputs.iter().all(|c| c.label.as_deref() == Some("Colour")));
        let ids: Vec<_> = inputs.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["input_0", "input_2", "input_5"]);

        let radius = form.bind_by_nodeset("radius").unwrap();
        assert_eq!(form.controls_bound_to(&radius.id).len(), 2);
        assert_eq!(
            radius.relevant.as_deref(),
            Some("../@xsi:type='Circle' or ../@xsi:type='Ring'")
        );
        let inner = form.bind_by_nodeset("@inner").unwrap();
        assert_eq!(inner.relevant.as_deref(), Some("../@xsi:type='Ring'"));
        assert_eq!(colour.relevant, None);

        assert!(matches!(
            form.controls_bound_to(&radius.id)[0].kind,
            ControlKind::Input(_)
        ));
    }

    const ABSTRACT: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="shape" type="Shape"/>
  <xs:complexType name="Shape" abstract="true">
    <xs:sequence>
      <xs:element name="name" type="xs:string"/>
    </xs:sequence>
    <xs:attribute name="colour" type="xs:string"/>
  </xs:complexType>
  <xs:complexType name="Circle">
    <xs:complexContent>
      <xs:extension base="Shape">
        <xs:sequence>
          <xs:element name="radius" type="xs:decimal"/>
        </xs:sequence>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="Square">
    <xs:complexContent>
      <xs:extension base="Shape">
        <xs:sequence>
          <xs:element name="side" type="xs:decimal"/>
        </xs:sequence>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="Ring">
    <xs:complexContent>
      <xs:extension base="Circle">
        <xs:attribute name="inner" type="xs:decimal"/>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
</xs:schema>"#;

    #[test]
    fn test_abstract_base_fields_are_shared_by_cases() {
        let schema = SchemaModel::from_string(ABSTRACT).unwrap();
        let form = FormBuilder::new(&schema)
            .with_strategy(Box::new(PlainEnvelope))
            .build_form(&FormRequest::new("shape"))
            .unwrap();
        assert!(form.anomalies.is_empty(), "{:?}", form.anomalies);

        let cases: Vec<_> = form
            .controls_of("case")
            .iter()
            .map(|c| c.label.clone().unwrap_or_default())
            .collect();
        assert_eq!(cases, ["Circle", "Square", "Ring"]);

        let nodesets: Vec<_> = form.binds().iter().map(|b| b.nodeset.as_str()).collect();
        assert_eq!(
            nodesets,
            ["/shape/@xsi:type", "/shape", "@colour", "name", "radius", "side", "@inner"]
        );

        let every_case =
            Some("../@xsi:type='Circle' or ../@xsi:type='Ring' or ../@xsi:type='Square'");
        for shared in ["@colour", "name"] {
            let bind = form.bind_by_nodeset(shared).unwrap();
            assert_eq!(bind.relevant.as_deref(), every_case, "{}", shared);
            assert_eq!(form.controls_bound_to(&bind.id).len(), 3, "{}", shared);
        }

        // Ring reuses what Circle generated
        let radius = form.bind_by_nodeset("radius").unwrap();
        assert_eq!(
            radius.relevant.as_deref(),
            Some("../@xsi:type='Circle' or ../@xsi:type='Ring'")
        );
        assert_eq!(form.controls_bound_to(&radius.id).len(), 2);
        let side = form.bind_by_nodeset("side").unwrap();
        assert_eq!(side.relevant.as_deref(), Some("../@xsi:type='Square'"));
        let inner = form.bind_by_nodeset("@inner").unwrap();
        assert_eq!(inner.relevant.as_deref(), Some("../@xsi:type='Ring'"));

        let root = &form.default_instance;
        let names: Vec<_> = root.children.iter().map(|c| c.local_name()).collect();
        assert_eq!(names, ["name", "radius", "side"]);
    }
}
