//! Host ports: the DOM and browser surface every behavior is written against.
//!
//! The browser implementation lives in `crate::web` (wasm32 only); the
//! in-memory implementation in `memory` (feature `testing`) backs the test suite.

use crate::events::UiEvent;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

// =============================================================================
// Element
// =============================================================================

/// A handle to a DOM element.
///
/// Handles are cheap to clone and compare by identity. Mutating methods take
/// `&self` because the underlying document is shared.
pub trait Element: Clone + PartialEq + 'static {
    fn has_class(&self, class: &str) -> bool;
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);

    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);
    fn remove_attribute(&self, name: &str);

    /// Set an inline style property. An empty value clears it.
    fn set_style(&self, property: &str, value: &str);

    /// Read a layout property so pending style changes are flushed.
    fn force_layout(&self);

    /// True when `other` is this element or one of its descendants.
    fn contains(&self, other: &Self) -> bool;

    fn query(&self, selector: &str) -> Option<Self>;
    fn query_all(&self, selector: &str) -> Vec<Self>;
    fn closest(&self, selector: &str) -> Option<Self>;

    fn text(&self) -> Option<String>;
    fn set_text(&self, text: &str);

    /// Full height of the content in px, including overflow (`scrollHeight`).
    fn content_height(&self) -> i32;

    /// Computed line height in px.
    fn line_height(&self) -> f64;

    /// Current value of an input or select. None for other elements.
    fn value(&self) -> Option<String>;
    fn set_value(&self, value: &str);

    fn checked(&self) -> bool;
    fn set_checked(&self, checked: bool);
    fn set_indeterminate(&self, indeterminate: bool);

    fn click(&self);
    fn focus(&self);

    /// Submit a form element. No-op for other elements.
    fn submit(&self);

    fn id(&self) -> Option<String> {
        self.attribute("id").filter(|id| !id.is_empty())
    }

    /// Add `class` when `on`, remove it otherwise.
    fn toggle_class(&self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }
}

// =============================================================================
// Events
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    KeyDown,
    Input,
    Change,
    Resize,
    Scroll,
    /// Initial document parse finished (`DOMContentLoaded`).
    DomReady,
    /// Partial page replacement finished (`htmx:afterSwap`, `turbo:load`).
    ContentSwap,
    /// `prefers-color-scheme` media query changed.
    ColorSchemeChange,
}

/// Where a listener is attached.
#[derive(Clone, Debug, PartialEq)]
pub enum ListenTarget<E> {
    Window,
    Document,
    Element(E),
}

/// What a handler wants done with the event after it ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Handled {
    #[default]
    Continue,
    PreventDefault,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HostEvent<E> {
    pub kind: EventKind,
    pub target: Option<E>,
    pub key: Option<String>,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub alt_key: bool,
    pub shift_key: bool,
}

impl<E> HostEvent<E> {
    pub fn new(kind: EventKind, target: Option<E>) -> Self {
        Self {
            kind,
            target,
            key: None,
            ctrl_key: false,
            meta_key: false,
            alt_key: false,
            shift_key: false,
        }
    }

    pub fn is_key(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }
}

pub type Handler<E> = Box<dyn FnMut(&HostEvent<E>) -> Handled>;

/// Opaque id of a scheduled timeout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub i32);

// =============================================================================
// Host
// =============================================================================

/// The page environment: document, viewport, timers and event plumbing.
pub trait Host: 'static {
    type Element: Element;

    /// The document root (`<html>`).
    fn root(&self) -> Self::Element;

    fn query(&self, selector: &str) -> Option<Self::Element> {
        self.root().query(selector)
    }

    fn query_all(&self, selector: &str) -> Vec<Self::Element> {
        self.root().query_all(selector)
    }

    fn element_by_id(&self, id: &str) -> Option<Self::Element> {
        self.query(&format!("#{}", id))
    }

    fn viewport_width(&self) -> u32;
    fn viewport_height(&self) -> u32;
    fn scroll_top(&self) -> i32;
    fn scroll_height(&self) -> i32;
    fn prefers_dark(&self) -> bool;

    fn listen(
        &self,
        target: ListenTarget<Self::Element>,
        kind: EventKind,
        handler: Handler<Self::Element>,
    );

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle;
    fn clear_timeout(&self, handle: TimerHandle);
    fn request_animation_frame(&self, callback: Box<dyn FnOnce()>);

    /// Dispatch a bubbling custom event on `target`.
    fn dispatch(&self, target: &Self::Element, event: &UiEvent);
}
