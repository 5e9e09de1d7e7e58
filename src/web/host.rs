//! `Host` implementation over `web-sys`.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, CustomEvent, CustomEventInit, Document,
    EventTarget, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlSelectElement,
    HtmlTextAreaElement, KeyboardEvent, MediaQueryList, Window,
};

use crate::dom::{Element, EventKind, Handled, Handler, Host, HostEvent, ListenTarget, TimerHandle};
use crate::events::UiEvent;

const DARK_SCHEME_QUERY: &str = "(prefers-color-scheme: dark)";
const DEFAULT_FONT_SIZE_PX: f64 = 16.0;
const LINE_HEIGHT_FACTOR: f64 = 1.4;

fn log_js_error(operation: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        tracing::debug!("{} failed: {:?}", operation, e);
    }
}

// =============================================================================
// BrowserElement
// =============================================================================

#[derive(Clone, Debug)]
pub struct BrowserElement(pub web_sys::Element);

impl PartialEq for BrowserElement {
    fn eq(&self, other: &Self) -> bool {
        js_sys::Object::is(self.0.as_ref(), other.0.as_ref())
    }
}

impl BrowserElement {
    fn html(&self) -> Option<&HtmlElement> {
        self.0.dyn_ref::<HtmlElement>()
    }
}

impl Element for BrowserElement {
    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn add_class(&self, class: &str) {
        log_js_error("classList.add", self.0.class_list().add_1(class));
    }

    fn remove_class(&self, class: &str) {
        log_js_error("classList.remove", self.0.class_list().remove_1(class));
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        log_js_error("setAttribute", self.0.set_attribute(name, value));
    }

    fn remove_attribute(&self, name: &str) {
        log_js_error("removeAttribute", self.0.remove_attribute(name));
    }

    fn set_style(&self, property: &str, value: &str) {
        let Some(html) = self.html() else {
            return;
        };
        let style = html.style();
        if value.is_empty() {
            log_js_error("style.removeProperty", style.remove_property(property).map(|_| ()));
        } else {
            log_js_error("style.setProperty", style.set_property(property, value));
        }
    }

    fn force_layout(&self) {
        if let Some(html) = self.html() {
            // Reading a layout property flushes pending style changes.
            let _ = html.offset_height();
        }
    }

    fn contains(&self, other: &Self) -> bool {
        let node: &web_sys::Node = &other.0;
        self.0.contains(Some(node))
    }

    fn query(&self, selector: &str) -> Option<Self> {
        self.0.query_selector(selector).ok().flatten().map(BrowserElement)
    }

    fn query_all(&self, selector: &str) -> Vec<Self> {
        let Ok(list) = self.0.query_selector_all(selector) else {
            tracing::debug!("Invalid selector {:?}", selector);
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .map(BrowserElement)
            .collect()
    }

    fn closest(&self, selector: &str) -> Option<Self> {
        self.0.closest(selector).ok().flatten().map(BrowserElement)
    }

    fn text(&self) -> Option<String> {
        self.0.text_content()
    }

    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn content_height(&self) -> i32 {
        self.0.scroll_height()
    }

    fn line_height(&self) -> f64 {
        let style = self
            .0
            .owner_document()
            .and_then(|doc| doc.default_view())
            .and_then(|window| window.get_computed_style(&self.0).ok().flatten());
        let Some(style) = style else {
            return DEFAULT_FONT_SIZE_PX * LINE_HEIGHT_FACTOR;
        };
        let px = |property: &str| {
            style
                .get_property_value(property)
                .ok()
                .and_then(|v| v.trim().trim_end_matches("px").parse::<f64>().ok())
        };
        // `normal` has no px value; estimate from the font size.
        px("line-height").unwrap_or_else(|| {
            px("font-size").unwrap_or(DEFAULT_FONT_SIZE_PX) * LINE_HEIGHT_FACTOR
        })
    }

    fn value(&self) -> Option<String> {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            return Some(input.value());
        }
        if let Some(area) = self.0.dyn_ref::<HtmlTextAreaElement>() {
            return Some(area.value());
        }
        self.0.dyn_ref::<HtmlSelectElement>().map(|select| select.value())
    }

    fn set_value(&self, value: &str) {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = self.0.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else if let Some(select) = self.0.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        }
    }

    fn checked(&self) -> bool {
        self.0
            .dyn_ref::<HtmlInputElement>()
            .is_some_and(|input| input.checked())
    }

    fn set_checked(&self, checked: bool) {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.set_checked(checked);
        }
    }

    fn set_indeterminate(&self, indeterminate: bool) {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.set_indeterminate(indeterminate);
        }
    }

    fn click(&self) {
        if let Some(html) = self.html() {
            html.click();
        }
    }

    fn focus(&self) {
        if let Some(html) = self.html() {
            log_js_error("focus", html.focus());
        }
    }

    fn submit(&self) {
        if let Some(form) = self.0.dyn_ref::<HtmlFormElement>() {
            log_js_error("form.submit", form.submit());
        }
    }
}

// =============================================================================
// BrowserHost
// =============================================================================

type ListenerClosure = Closure<dyn FnMut(web_sys::Event)>;

pub struct BrowserHost {
    window: Window,
    document: Document,
    root: web_sys::Element,
    dark_query: Option<MediaQueryList>,
    // Listener closures live as long as the page.
    listeners: RefCell<Vec<ListenerClosure>>,
}

impl BrowserHost {
    pub fn new() -> Result<Rc<Self>, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let root = document
            .document_element()
            .ok_or_else(|| JsValue::from_str("no document element"))?;
        let dark_query = window.match_media(DARK_SCHEME_QUERY).ok().flatten();

        Ok(Rc::new(Self {
            window,
            document,
            root,
            dark_query,
            listeners: RefCell::new(Vec::new()),
        }))
    }

    /// True while the initial HTML is still being parsed.
    pub fn is_loading(&self) -> bool {
        self.document.ready_state() == "loading"
    }

    fn event_target(&self, target: &ListenTarget<BrowserElement>) -> EventTarget {
        match target {
            ListenTarget::Window => self.window.clone().into(),
            ListenTarget::Document => self.document.clone().into(),
            ListenTarget::Element(el) => el.0.clone().into(),
        }
    }

    /// Resolve an event kind to the concrete DOM targets and event names.
    fn bindings(
        &self,
        target: &ListenTarget<BrowserElement>,
        kind: EventKind,
    ) -> Vec<(EventTarget, &'static str)> {
        let at = |name| vec![(self.event_target(target), name)];
        match kind {
            EventKind::Click => at("click"),
            EventKind::KeyDown => at("keydown"),
            EventKind::Input => at("input"),
            EventKind::Change => at("change"),
            EventKind::Resize => at("resize"),
            EventKind::Scroll => at("scroll"),
            EventKind::DomReady => vec![(self.document.clone().into(), "DOMContentLoaded")],
            EventKind::ContentSwap => vec![
                (self.document.clone().into(), "htmx:afterSwap"),
                (self.document.clone().into(), "turbo:load"),
            ],
            EventKind::ColorSchemeChange => match &self.dark_query {
                Some(query) => vec![(query.clone().into(), "change")],
                None => Vec::new(),
            },
        }
    }
}

fn host_event(kind: EventKind, event: &web_sys::Event) -> HostEvent<BrowserElement> {
    let target = event
        .target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .map(BrowserElement);
    let mut host_event = HostEvent::new(kind, target);
    if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
        host_event.key = Some(key.key());
        host_event.ctrl_key = key.ctrl_key();
        host_event.meta_key = key.meta_key();
        host_event.alt_key = key.alt_key();
        host_event.shift_key = key.shift_key();
    }
    host_event
}

impl Host for BrowserHost {
    type Element = BrowserElement;

    fn root(&self) -> BrowserElement {
        BrowserElement(self.root.clone())
    }

    fn element_by_id(&self, id: &str) -> Option<BrowserElement> {
        self.document.get_element_by_id(id).map(BrowserElement)
    }

    fn viewport_width(&self) -> u32 {
        self.window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .map_or(0, |w| w as u32)
    }

    fn viewport_height(&self) -> u32 {
        self.window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .map_or(0, |h| h as u32)
    }

    fn scroll_top(&self) -> i32 {
        self.window.scroll_y().map_or(0, |y| y as i32)
    }

    fn scroll_height(&self) -> i32 {
        self.root.scroll_height()
    }

    fn prefers_dark(&self) -> bool {
        self.dark_query.as_ref().is_some_and(|q| q.matches())
    }

    fn listen(
        &self,
        target: ListenTarget<BrowserElement>,
        kind: EventKind,
        handler: Handler<BrowserElement>,
    ) {
        let handler = Rc::new(RefCell::new(handler));
        for (event_target, name) in self.bindings(&target, kind) {
            let handler = handler.clone();
            let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
                let Ok(mut handler) = handler.try_borrow_mut() else {
                    return;
                };
                if handler(&host_event(kind, &event)) == Handled::PreventDefault {
                    event.prevent_default();
                }
            });

            let callback: &js_sys::Function = closure.as_ref().unchecked_ref();
            let result = if kind == EventKind::Scroll {
                let options = AddEventListenerOptions::new();
                options.set_passive(true);
                event_target.add_event_listener_with_callback_and_add_event_listener_options(
                    name, callback, &options,
                )
            } else {
                event_target.add_event_listener_with_callback(name, callback)
            };
            match result {
                Ok(()) => self.listeners.borrow_mut().push(closure),
                Err(e) => tracing::warn!("Failed to listen for {}: {:?}", name, e),
            }
        }
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let function = Closure::once_into_js(move || callback());
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                function.unchecked_ref(),
                delay_ms.min(i32::MAX as u32) as i32,
            ) {
            Ok(id) => TimerHandle(id),
            Err(e) => {
                tracing::warn!("setTimeout failed: {:?}", e);
                TimerHandle(0)
            }
        }
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.window.clear_timeout_with_handle(handle.0);
    }

    fn request_animation_frame(&self, callback: Box<dyn FnOnce()>) {
        let function = Closure::once_into_js(move || callback());
        if let Err(e) = self.window.request_animation_frame(function.unchecked_ref()) {
            tracing::warn!("requestAnimationFrame failed: {:?}", e);
        }
    }

    fn dispatch(&self, target: &BrowserElement, event: &UiEvent) {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let detail = match serde::Serialize::serialize(&event.detail(), &serializer) {
            Ok(detail) => detail,
            Err(e) => {
                tracing::warn!("Failed to serialize {} detail: {}", event.name(), e);
                JsValue::NULL
            }
        };

        let init = CustomEventInit::new();
        init.set_bubbles(true);
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(event.name(), &init) {
            Ok(custom) => {
                log_js_error("dispatchEvent", target.0.dispatch_event(&custom).map(|_| ()));
            }
            Err(e) => tracing::warn!("Failed to create {} event: {:?}", event.name(), e),
        }
    }
}
