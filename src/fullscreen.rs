//! Fullscreen mode for the main layout.

use std::rc::Rc;

use crate::dom::{Element, EventKind, Handled, Host, ListenTarget};

const LAYOUT_SELECTOR: &str = ".main-layout";
const FULLSCREEN_CLASS: &str = "fullscreen-mode";
const ICON_SELECTOR: &str = "#fullscreenIcon, #fullscreenIconMobile";
const TOGGLE_SELECTOR: &str = "[data-action=\"toggle-fullscreen\"]";

/// Icon name shown on the toggle buttons for a given state.
pub fn icon_name(fullscreen: bool) -> &'static str {
    if fullscreen {
        "fullscreen_exit"
    } else {
        "fullscreen"
    }
}

pub struct FullscreenToggle<H: Host> {
    host: Rc<H>,
}

impl<H: Host> FullscreenToggle<H> {
    pub fn attach(host: Rc<H>) -> Rc<Self> {
        let this = Rc::new(Self { host });
        let weak = Rc::downgrade(&this);
        this.host.listen(
            ListenTarget::Document,
            EventKind::Click,
            Box::new(move |event| {
                let on_toggle = event
                    .target
                    .as_ref()
                    .is_some_and(|t| t.closest(TOGGLE_SELECTOR).is_some());
                match weak.upgrade() {
                    Some(this) if on_toggle && this.toggle().is_some() => Handled::PreventDefault,
                    _ => Handled::Continue,
                }
            }),
        );
        this
    }

    pub fn is_fullscreen(&self) -> bool {
        self.host
            .query(LAYOUT_SELECTOR)
            .is_some_and(|layout| layout.has_class(FULLSCREEN_CLASS))
    }

    /// Flip fullscreen mode. Returns the new state, or None without a main layout.
    pub fn toggle(&self) -> Option<bool> {
        let layout = self.host.query(LAYOUT_SELECTOR)?;
        let fullscreen = !layout.has_class(FULLSCREEN_CLASS);
        layout.toggle_class(FULLSCREEN_CLASS, fullscreen);
        for icon in self.host.query_all(ICON_SELECTOR) {
            icon.set_attribute("name", icon_name(fullscreen));
        }
        tracing::debug!("Fullscreen mode {}", if fullscreen { "on" } else { "off" });
        Some(fullscreen)
    }
}
