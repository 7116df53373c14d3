//! XSD particles
//!
//! Occurrence bounds and the particle/term/model group structure of complex
//! type content.

use super::types::ElementId;
use crate::error::{ParseError, Result};
use serde::Serialize;

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if this particle is prohibited (maxOccurs == 0)
    pub fn is_empty(&self) -> bool {
        self.max == Some(0)
    }

    /// Check if particle has maxOccurs == 1
    pub fn is_single(&self) -> bool {
        self.max == Some(1)
    }

    /// Check if particle can have multiple occurrences
    pub fn is_multiple(&self) -> bool {
        !self.is_empty() && !self.is_single()
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl std::fmt::Display for Occurs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}..{}]", self.min, max),
            None => write!(f, "[{}..unbounded]", self.min),
        }
    }
}

/// Parse minOccurs/maxOccurs from XML attribute values
pub fn parse_occurs(min_occurs: Option<&str>, max_occurs: Option<&str>) -> Result<Occurs> {
    let mut occurs = Occurs::once();

    if let Some(min_str) = min_occurs {
        occurs.min = min_str.trim().parse::<u32>().map_err(|_| {
            ParseError::new(format!(
                "minOccurs value '{}' is not a valid non-negative integer",
                min_str
            ))
        })?;
    }

    match max_occurs.map(str::trim) {
        Some("unbounded") => occurs.max = None,
        Some(max_str) => {
            let max = max_str.parse::<u32>().map_err(|_| {
                ParseError::new(format!(
                    "maxOccurs value '{}' must be a non-negative integer or 'unbounded'",
                    max_str
                ))
            })?;
            if occurs.min > max {
                return Err(ParseError::new(
                    "maxOccurs must be 'unbounded' or greater than minOccurs",
                )
                .into());
            }
            occurs.max = Some(max);
        }
        None => {
            if occurs.min > 1 {
                // maxOccurs defaults to 1
                return Err(
                    ParseError::new("minOccurs must be lesser or equal than maxOccurs").into(),
                );
            }
        }
    }

    Ok(occurs)
}

/// Model group compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Compositor {
    /// Children in order
    Sequence,
    /// One of the children
    Choice,
    /// Children in any order
    All,
}

impl Compositor {
    /// Compositor for an XSD element local name
    pub fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "sequence" => Some(Compositor::Sequence),
            "choice" => Some(Compositor::Choice),
            "all" => Some(Compositor::All),
            _ => None,
        }
    }
}

/// Group of particles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelGroup {
    /// How the children combine
    pub compositor: Compositor,
    /// Children in declaration order
    pub particles: Vec<Particle>,
}

impl ModelGroup {
    /// Create a group
    pub fn new(compositor: Compositor, particles: Vec<Particle>) -> Self {
        Self {
            compositor,
            particles,
        }
    }
}

/// Element wildcard (`xs:any`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wildcard {
    /// Namespace constraint as written (`##any` by default)
    pub namespace: String,
    /// processContents value (`strict` by default)
    pub process_contents: String,
}

impl Default for Wildcard {
    fn default() -> Self {
        Self {
            namespace: "##any".to_string(),
            process_contents: "strict".to_string(),
        }
    }
}

/// What a particle holds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Term {
    /// Element declaration (local or a reference to a global one)
    Element(ElementId),
    /// Nested model group
    Group(ModelGroup),
    /// Element wildcard
    Wildcard(Wildcard),
}

/// Occurrence bounds around a term
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    /// Occurrence bounds
    pub occurs: Occurs,
    /// Content
    pub term: Term,
}

impl Particle {
    /// Create a particle
    pub fn new(occurs: Occurs, term: Term) -> Self {
        Self { occurs, term }
    }

    /// Particle holding a single element
    pub fn element(occurs: Occurs, element: ElementId) -> Self {
        Self::new(occurs, Term::Element(element))
    }

    /// Once-occurring sequence of particles
    pub fn sequence(particles: Vec<Particle>) -> Self {
        Self::new(
            Occurs::once(),
            Term::Group(ModelGroup::new(Compositor::Sequence, particles)),
        )
    }

    /// Model group of this particle, if its term is one
    pub fn group(&self) -> Option<&ModelGroup> {
        match &self.term {
            Term::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Find the particle (this one or a nested one) whose term is `element`
    pub fn find_element(&self, element: ElementId) -> Option<&Particle> {
        match &self.term {
            Term::Element(id) if *id == element => Some(self),
            Term::Group(group) => group
                .particles
                .iter()
                .find_map(|p| p.find_element(element)),
            _ => None,
        }
    }

    /// All element ids reachable through nested groups, in order
    pub fn element_ids(&self) -> Vec<ElementId> {
        let mut ids = Vec::new();
        self.collect_elements(&mut ids);
        ids
    }

    fn collect_elements(&self, out: &mut Vec<ElementId>) {
        match &self.term {
            Term::Element(id) => out.push(*id),
            Term::Group(group) => {
                for particle in &group.particles {
                    particle.collect_elements(out);
                }
            }
            Term::Wildcard(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurs_predicates() {
        assert!(Occurs::once().is_single());
        assert!(Occurs::optional().is_emptiable());
        assert!(Occurs::zero_or_more().is_multiple());
        assert!(Occurs::new(2, Some(5)).is_multiple());
        assert!(!Occurs::new(0, Some(0)).is_multiple());
        assert_eq!(Occurs::zero_or_more().to_string(), "[0..unbounded]");
    }

    #[test]
    fn test_parse_occurs() {
        assert_eq!(parse_occurs(None, None).unwrap(), Occurs::once());
        assert_eq!(
            parse_occurs(Some("0"), Some("unbounded")).unwrap(),
            Occurs::zero_or_more()
        );
        assert_eq!(
            parse_occurs(Some("2"), Some("4")).unwrap(),
            Occurs::new(2, Some(4))
        );
        assert!(parse_occurs(Some("-1"), None).is_err());
        assert!(parse_occurs(Some("3"), Some("2")).is_err());
        assert!(parse_occurs(Some("2"), None).is_err());
        assert!(parse_occurs(None, Some("many")).is_err());
    }

    #[test]
    fn test_find_element_in_nested_groups() {
        let inner = Particle::new(
            Occurs::optional(),
            Term::Group(ModelGroup::new(
                Compositor::Choice,
                vec![
                    Particle::element(Occurs::once(), ElementId(1)),
                    Particle::element(Occurs::zero_or_more(), ElementId(2)),
                ],
            )),
        );
        let outer = Particle::sequence(vec![
            Particle::element(Occurs::once(), ElementId(0)),
            inner,
            Particle::new(Occurs::once(), Term::Wildcard(Wildcard::default())),
        ]);

        assert_eq!(
            outer.find_element(ElementId(2)).map(|p| p.occurs),
            Some(Occurs::zero_or_more())
        );
        assert!(outer.find_element(ElementId(7)).is_none());
        assert_eq!(
            outer.element_ids(),
            vec![ElementId(0), ElementId(1), ElementId(2)]
        );
    }
}
