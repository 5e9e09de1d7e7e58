//! Slide-in drawers opened by a trigger button (mobile search and the like).

use std::rc::{Rc, Weak};

use crate::config::BehaviorSettings;
use crate::debounce::Debouncer;
use crate::dom::{Element, EventKind, Handled, Host, ListenTarget};
use crate::error::{BehaviorError, Result};
use crate::outside::InsideSet;

pub const DRAWER_SELECTOR: &str = "[data-drawer]";
pub const DRAWER_BOUND_ATTRIBUTE: &str = "data-drawer-bound";

const FOCUS_TARGET: &str = "input[type=\"text\"], input[type=\"search\"]";
const DEFAULT_OPEN_CLASS: &str = "show";

pub struct Drawer<H: Host> {
    host: Rc<H>,
    drawer: H::Element,
    trigger: H::Element,
    open_class: String,
    focus: Debouncer<H>,
}

impl<H: Host> Drawer<H> {
    /// Bind a drawer element to the trigger named by its `data-drawer-trigger`.
    pub fn attach(host: Rc<H>, drawer: H::Element, settings: &BehaviorSettings) -> Result<Rc<Self>> {
        let trigger = drawer
            .attribute("data-drawer-trigger")
            .and_then(|selector| host.query(&selector))
            .ok_or_else(|| {
                BehaviorError::ElementNotFound(format!(
                    "trigger for drawer {}",
                    drawer.id().unwrap_or_default()
                ))
            })?;
        let open_class = drawer
            .attribute("data-drawer-class")
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OPEN_CLASS.to_string());

        let this = Rc::new(Self {
            focus: Debouncer::new(host.clone(), settings.drawer_focus_delay_ms),
            host,
            drawer,
            trigger,
            open_class,
        });
        this.attach_listeners();
        this.drawer.set_attribute(DRAWER_BOUND_ATTRIBUTE, "true");
        Ok(this)
    }

    /// Whether the drawer element is still part of the document.
    pub fn is_attached(&self) -> bool {
        self.host.root().contains(&self.drawer)
    }

    fn live(weak: &Weak<Self>) -> Option<Rc<Self>> {
        weak.upgrade().filter(|this| this.is_attached())
    }

    pub fn is_open(&self) -> bool {
        self.drawer.has_class(&self.open_class)
    }

    pub fn toggle(&self) {
        if self.is_open() {
            self.close();
            return;
        }
        self.drawer.add_class(&self.open_class);
        if let Some(input) = self.drawer.query(FOCUS_TARGET) {
            self.focus.schedule(move || input.focus());
        }
    }

    /// Close the drawer. Returns false when it was not open.
    pub fn close(&self) -> bool {
        self.focus.cancel();
        if !self.is_open() {
            return false;
        }
        self.drawer.remove_class(&self.open_class);
        true
    }

    fn attach_listeners(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.host.listen(
            ListenTarget::Element(self.trigger.clone()),
            EventKind::Click,
            Box::new(move |_| {
                if let Some(this) = Self::live(&weak) {
                    this.toggle();
                }
                Handled::PreventDefault
            }),
        );

        let inside = InsideSet::new(vec![self.drawer.clone(), self.trigger.clone()]);
        let weak = Rc::downgrade(self);
        self.host.listen(
            ListenTarget::Document,
            EventKind::Click,
            Box::new(move |event| {
                if let Some(this) = Self::live(&weak) {
                    if this.is_open() && inside.is_outside(event.target.as_ref()) {
                        this.close();
                    }
                }
                Handled::Continue
            }),
        );

        let weak = Rc::downgrade(self);
        self.host.listen(
            ListenTarget::Document,
            EventKind::KeyDown,
            Box::new(move |event| {
                if let Some(this) = Self::live(&weak) {
                    if event.is_key("Escape") {
                        this.close();
                    }
                }
                Handled::Continue
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{MemoryElement, MemoryHost};

    fn page() -> (Rc<MemoryHost>, MemoryElement, MemoryElement, MemoryElement) {
        let host = MemoryHost::new(400);
        let body = host.body();
        let trigger = body.append("button").with_id("searchButton");
        let drawer = body
            .append("div")
            .with_id("searchDrawer")
            .with_attr("data-drawer", "")
            .with_attr("data-drawer-trigger", "#searchButton");
        let input = drawer.append("input").with_attr("type", "text");
        (host, trigger, drawer, input)
    }

    #[test]
    fn test_trigger_opens_and_focuses_later() {
        let (host, trigger, drawer_el, input) = page();
        let drawer = Drawer::attach(host.clone(), drawer_el.clone(), &BehaviorSettings::default()).unwrap();

        host.click(&trigger);
        assert!(drawer.is_open());
        assert!(!input.is_focused());
        host.advance(100);
        assert!(input.is_focused());
        assert_eq!(drawer_el.attribute(DRAWER_BOUND_ATTRIBUTE).as_deref(), Some("true"));

        host.click(&trigger);
        assert!(!drawer.is_open());
    }

    #[test]
    fn test_outside_click_and_escape_close() {
        let (host, trigger, drawer_el, input) = page();
        let outside = host.body().append("main");
        let drawer = Drawer::attach(host.clone(), drawer_el, &BehaviorSettings::default()).unwrap();

        host.click(&trigger);
        host.click(&input);
        assert!(drawer.is_open(), "clicks inside keep it open");
        host.click(&outside);
        assert!(!drawer.is_open());

        host.click(&trigger);
        host.key_down("Escape");
        assert!(!drawer.is_open());
        host.advance(500);
        assert!(!input.is_focused(), "closing cancels the pending focus");
    }

    #[test]
    fn test_custom_open_class() {
        let (host, trigger, drawer_el, _) = page();
        let drawer_el = drawer_el.with_attr("data-drawer-class", "open");
        let _drawer = Drawer::attach(host.clone(), drawer_el.clone(), &BehaviorSettings::default()).unwrap();
        host.click(&trigger);
        assert!(drawer_el.has_class("open"));
        assert!(!drawer_el.has_class("show"));
    }

    #[test]
    fn test_missing_trigger() {
        let host = MemoryHost::new(400);
        let el = host
            .body()
            .append("div")
            .with_id("orphan")
            .with_attr("data-drawer", "")
            .with_attr("data-drawer-trigger", "#nothing");
        let err = Drawer::attach(host, el, &BehaviorSettings::default()).err().unwrap();
        assert_eq!(
            err,
            BehaviorError::ElementNotFound("trigger for drawer orphan".into())
        );
    }
}
