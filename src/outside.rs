//! Outside-click detection.

use crate::dom::Element;

/// The set of elements a click may land in without counting as "outside".
#[derive(Clone, Debug)]
pub struct InsideSet<E: Element> {
    elements: Vec<E>,
}

impl<E: Element> InsideSet<E> {
    pub fn new(elements: Vec<E>) -> Self {
        Self { elements }
    }

    /// True when `target` is in none of the inside elements. A click with no
    /// element target (e.g. on the window) counts as outside.
    pub fn is_outside(&self, target: Option<&E>) -> bool {
        match target {
            Some(target) => !self.elements.iter().any(|inside| inside.contains(target)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemoryHost;

    #[test]
    fn test_inside_and_outside() {
        let host = MemoryHost::new(800);
        let body = host.body();
        let drawer = body.append("div").with_id("searchDrawer");
        let field = drawer.append("input");
        let trigger = body.append("button");
        let icon = trigger.append("i");
        let elsewhere = body.append("main");

        let inside = InsideSet::new(vec![drawer, trigger]);
        assert!(!inside.is_outside(Some(&field)));
        assert!(!inside.is_outside(Some(&icon)));
        assert!(inside.is_outside(Some(&elsewhere)));
        assert!(inside.is_outside(Some(&body)));
        assert!(inside.is_outside(None));
    }
}
