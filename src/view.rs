//! Contract with the presentation layer
//!
//! The model never builds visuals. A host implements `TermViewFactory` and
//! term creators forward to it.

use crate::model::{Sign, Term, TermKind};

pub trait TermViewFactory {
    /// Static picture for the toolbox or equation display
    type Icon;
    /// Live, interactive visual bound to one term
    type Node;

    fn create_icon(&self, kind: TermKind, sign: Sign) -> Self::Icon;

    fn create_term_node(&self, term: &Term) -> Self::Node;
}

/// Text rendering of terms, for logs and the headless demo
#[derive(Debug, Clone, Copy, Default)]
pub struct TextViewFactory;

impl TermViewFactory for TextViewFactory {
    type Icon = String;
    type Node = String;

    fn create_icon(&self, kind: TermKind, sign: Sign) -> String {
        kind.unit_value(sign).to_string()
    }

    fn create_term_node(&self, term: &Term) -> String {
        format!("{} {}", term.id, term.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::model::{CreatorId, Scene, TermId, Variable, VariableId};

    #[test]
    fn test_creators_forward_to_factory() {
        let mut scene = Scene::new(
            SceneConfig::default(),
            vec![Variable::new("x", 1, -10, 10)],
            &[TermKind::Variable(VariableId(0))],
        )
        .unwrap();
        scene.initialize_default_toolbox_positions().unwrap();
        let creator = scene.creator(CreatorId(0)).unwrap();
        assert_eq!(creator.create_icon(&TextViewFactory, Sign::Negative), "-1v0");

        let term = {
            let (c, mut cx) = scene.creator_cx(CreatorId(0)).unwrap();
            c.create_term(Sign::Positive, None, &mut cx).unwrap()
        };
        let creator = scene.creator(CreatorId(0)).unwrap();
        let node = creator
            .create_term_node(&TextViewFactory, scene.term(term).unwrap())
            .unwrap();
        assert_eq!(node, format!("{term} 1v0"));

        // Terms from another creator are refused
        let other = scene.creator(CreatorId(1)).unwrap();
        assert!(other
            .create_term_node(&TextViewFactory, scene.term(term).unwrap())
            .is_err());
        assert_eq!(term, TermId(1));
    }
}
