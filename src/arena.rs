//! Element arena
//!
//! Owns every element of a compiled schema, including the roots of documents
//! pulled in through `file` references, and the table of resolved reference
//! targets. Recursive references are plain indices into this arena, so no
//! element owns another through a cycle.

use crate::element::{Element, ElementId, RefId};

#[derive(Debug, Default)]
pub(crate) struct Arena {
    elements: Vec<Element>,
    targets: Vec<Option<ElementId>>,
}

impl Arena {
    pub fn push(&mut self, element: Element) -> ElementId {
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    pub fn get(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn new_slot(&mut self) -> RefId {
        self.targets.push(None);
        RefId(self.targets.len() - 1)
    }

    /// Set a reference target. Each slot is bound exactly once.
    pub fn bind(&mut self, slot: RefId, target: ElementId) {
        debug_assert!(self.targets[slot.0].is_none(), "reference bound twice");
        self.targets[slot.0] = Some(target);
    }

    pub fn target(&self, slot: RefId) -> Option<ElementId> {
        self.targets[slot.0]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_bind() {
        let mut arena = Arena::default();
        let boolean = arena.push(Element::Boolean);
        let slot = arena.new_slot();
        assert_eq!(arena.target(slot), None);
        arena.bind(slot, boolean);
        assert_eq!(arena.target(slot), Some(boolean));
        assert!(matches!(arena.get(boolean), Element::Boolean));
        assert_eq!(arena.len(), 1);
    }
}
