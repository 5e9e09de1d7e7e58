//! In-memory document and host.
//!
//! A small arena-backed DOM with a CSS selector subset (type, `#id`, `.class`,
//! `[attr]`, `[attr="value"]`, descendant combinator, selector lists), a
//! virtual clock for timeouts, an animation-frame queue and a log of
//! dispatched custom events. Every mutating element call is counted so tests
//! can assert that an operation touched nothing.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::{Element, EventKind, Handled, Handler, Host, HostEvent, ListenTarget, TimerHandle};
use crate::events::UiEvent;

// =============================================================================
// Document arena
// =============================================================================

#[derive(Default)]
struct Node {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    parent: Option<usize>,
    children: Vec<usize>,
    text: Option<String>,
    value: Option<String>,
    checked: bool,
    indeterminate: bool,
    content_height: i32,
    line_height: f64,
    clicks: u32,
    submits: u32,
}

impl Node {
    fn new(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let value = matches!(tag.as_str(), "input" | "select" | "textarea").then(String::new);
        Self {
            tag,
            value,
            line_height: 24.0,
            ..Default::default()
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        if name == "class" {
            return (!self.classes.is_empty()).then(|| self.classes.join(" "));
        }
        self.attributes.get(name).cloned()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Window,
    Document,
    Node(usize),
}

struct Listener {
    slot: Slot,
    kind: EventKind,
    handler: Rc<RefCell<Handler<MemoryElement>>>,
}

#[derive(Default)]
struct Document {
    nodes: RefCell<Vec<Node>>,
    listeners: RefCell<Vec<Listener>>,
    mutations: Cell<u64>,
    focused: Cell<Option<usize>>,
}

impl Document {
    fn bump(&self) {
        self.mutations.set(self.mutations.get() + 1);
    }

    fn ancestors(&self, index: usize) -> Vec<usize> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut current = nodes[index].parent;
        while let Some(i) = current {
            out.push(i);
            current = nodes[i].parent;
        }
        out
    }

    fn descendants(&self, index: usize) -> Vec<usize> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<usize> = nodes[index].children.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            out.push(i);
            stack.extend(nodes[i].children.iter().rev().copied());
        }
        out
    }

    /// Run listeners along the propagation path of an event raised at `origin`.
    fn fire(self: &Rc<Self>, origin: Slot, event: &HostEvent<MemoryElement>) -> Handled {
        let mut path = Vec::new();
        match origin {
            Slot::Node(index) => {
                path.push(Slot::Node(index));
                path.extend(self.ancestors(index).into_iter().map(Slot::Node));
                path.push(Slot::Document);
                path.push(Slot::Window);
            }
            Slot::Document => {
                path.push(Slot::Document);
                path.push(Slot::Window);
            }
            Slot::Window => path.push(Slot::Window),
        }

        let mut outcome = Handled::Continue;
        for slot in path {
            let handlers: Vec<_> = self
                .listeners
                .borrow()
                .iter()
                .filter(|l| l.slot == slot && l.kind == event.kind)
                .map(|l| l.handler.clone())
                .collect();

            for handler in handlers {
                // A handler re-entering itself (e.g. clicking its own target) is skipped.
                let Ok(mut handler) = handler.try_borrow_mut() else {
                    continue;
                };
                if handler(event) == Handled::PreventDefault {
                    outcome = Handled::PreventDefault;
                }
            }
        }
        outcome
    }
}

// =============================================================================
// MemoryElement
// =============================================================================

#[derive(Clone)]
pub struct MemoryElement {
    doc: Rc<Document>,
    index: usize,
}

impl PartialEq for MemoryElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.doc, &other.doc) && self.index == other.index
    }
}

impl fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.doc.nodes.borrow();
        let node = &nodes[self.index];
        write!(f, "<{}", node.tag)?;
        if let Some(id) = node.attributes.get("id") {
            write!(f, " id=\"{}\"", id)?;
        }
        if !node.classes.is_empty() {
            write!(f, " class=\"{}\"", node.classes.join(" "))?;
        }
        write!(f, ">")
    }
}

impl MemoryElement {
    fn with_node<R>(&self, f: impl FnOnce(&Node) -> R) -> R {
        f(&self.doc.nodes.borrow()[self.index])
    }

    fn with_node_mut<R>(&self, f: impl FnOnce(&mut Node) -> R) -> R {
        self.doc.bump();
        f(&mut self.doc.nodes.borrow_mut()[self.index])
    }

    fn handle(&self, index: usize) -> Self {
        Self {
            doc: self.doc.clone(),
            index,
        }
    }

    /// Create a child element and return it.
    pub fn append(&self, tag: &str) -> MemoryElement {
        let mut nodes = self.doc.nodes.borrow_mut();
        let index = nodes.len();
        let mut node = Node::new(tag);
        node.parent = Some(self.index);
        nodes.push(node);
        nodes[self.index].children.push(index);
        drop(nodes);
        self.handle(index)
    }

    /// Detach this element from its parent.
    pub fn remove(&self) {
        let mut nodes = self.doc.nodes.borrow_mut();
        if let Some(parent) = nodes[self.index].parent.take() {
            nodes[parent].children.retain(|&c| c != self.index);
        }
    }

    pub fn with_id(self, id: &str) -> Self {
        self.set_attribute("id", id);
        self
    }

    pub fn with_class(self, classes: &str) -> Self {
        for class in classes.split_whitespace() {
            self.add_class(class);
        }
        self
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn with_value(self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    /// Give the element a rendered content height and line height (px).
    pub fn with_layout(self, content_height: i32, line_height: f64) -> Self {
        self.with_node_mut(|n| {
            n.content_height = content_height;
            n.line_height = line_height;
        });
        self
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.with_node(|n| n.style.get(property).cloned())
    }

    pub fn is_indeterminate(&self) -> bool {
        self.with_node(|n| n.indeterminate)
    }

    pub fn clicks(&self) -> u32 {
        self.with_node(|n| n.clicks)
    }

    pub fn submissions(&self) -> u32 {
        self.with_node(|n| n.submits)
    }

    pub fn is_focused(&self) -> bool {
        self.doc.focused.get() == Some(self.index)
    }

    fn matches(&self, selectors: &[Vec<Compound>]) -> bool {
        let nodes = self.doc.nodes.borrow();
        selectors
            .iter()
            .any(|chain| matches_chain(&nodes, self.index, chain))
    }
}

impl Element for MemoryElement {
    fn has_class(&self, class: &str) -> bool {
        self.with_node(|n| n.classes.iter().any(|c| c == class))
    }

    fn add_class(&self, class: &str) {
        self.with_node_mut(|n| {
            if !n.classes.iter().any(|c| c == class) {
                n.classes.push(class.to_string());
            }
        })
    }

    fn remove_class(&self, class: &str) {
        self.with_node_mut(|n| n.classes.retain(|c| c != class))
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.with_node(|n| n.attribute(name))
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.with_node_mut(|n| {
            if name == "class" {
                n.classes = value.split_whitespace().map(str::to_string).collect();
            } else {
                n.attributes.insert(name.to_string(), value.to_string());
            }
        })
    }

    fn remove_attribute(&self, name: &str) {
        self.with_node_mut(|n| {
            if name == "class" {
                n.classes.clear();
            } else {
                n.attributes.remove(name);
            }
        })
    }

    fn set_style(&self, property: &str, value: &str) {
        self.with_node_mut(|n| {
            if value.is_empty() {
                n.style.remove(property);
            } else {
                n.style.insert(property.to_string(), value.to_string());
            }
        })
    }

    fn force_layout(&self) {}

    fn contains(&self, other: &Self) -> bool {
        if !Rc::ptr_eq(&self.doc, &other.doc) {
            return false;
        }
        other.index == self.index || self.doc.ancestors(other.index).contains(&self.index)
    }

    fn query(&self, selector: &str) -> Option<Self> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<Self> {
        let selectors = parse_selector_list(selector);
        if selectors.is_empty() {
            return Vec::new();
        }
        let nodes = self.doc.descendants(self.index);
        let arena = self.doc.nodes.borrow();
        nodes
            .into_iter()
            .filter(|&i| selectors.iter().any(|chain| matches_chain(&arena, i, chain)))
            .map(|i| self.handle(i))
            .collect()
    }

    fn closest(&self, selector: &str) -> Option<Self> {
        let selectors = parse_selector_list(selector);
        if self.matches(&selectors) {
            return Some(self.clone());
        }
        self.doc
            .ancestors(self.index)
            .into_iter()
            .map(|i| self.handle(i))
            .find(|el| el.matches(&selectors))
    }

    fn text(&self) -> Option<String> {
        self.with_node(|n| n.text.clone())
    }

    fn set_text(&self, text: &str) {
        self.with_node_mut(|n| n.text = Some(text.to_string()))
    }

    fn content_height(&self) -> i32 {
        self.with_node(|n| n.content_height)
    }

    fn line_height(&self) -> f64 {
        self.with_node(|n| n.line_height)
    }

    fn value(&self) -> Option<String> {
        self.with_node(|n| n.value.clone())
    }

    fn set_value(&self, value: &str) {
        self.with_node_mut(|n| n.value = Some(value.to_string()))
    }

    fn checked(&self) -> bool {
        self.with_node(|n| n.checked)
    }

    fn set_checked(&self, checked: bool) {
        self.with_node_mut(|n| n.checked = checked)
    }

    fn set_indeterminate(&self, indeterminate: bool) {
        self.with_node_mut(|n| n.indeterminate = indeterminate)
    }

    fn click(&self) {
        self.doc.nodes.borrow_mut()[self.index].clicks += 1;
        let event = HostEvent::new(EventKind::Click, Some(self.clone()));
        self.doc.fire(Slot::Node(self.index), &event);
    }

    fn focus(&self) {
        self.doc.focused.set(Some(self.index));
    }

    fn submit(&self) {
        let mut nodes = self.doc.nodes.borrow_mut();
        if nodes[self.index].tag == "form" {
            nodes[self.index].submits += 1;
        }
    }
}

// =============================================================================
// Selector subset
// =============================================================================

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, node: &Node) -> bool {
        if let Some(tag) = &self.tag {
            if &node.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.attributes.get("id") != Some(id) {
                return false;
            }
        }
        if !self
            .classes
            .iter()
            .all(|c| node.classes.iter().any(|nc| nc == c))
        {
            return false;
        }
        self.attrs.iter().all(|(name, value)| match (node.attribute(name), value) {
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => &actual == expected,
            (None, _) => false,
        })
    }
}

/// Split on `sep` outside brackets and quotes.
fn split_top_level(s: &str, sep: impl Fn(char) -> bool) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in s.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                current.push(c);
            }
            (None, '[') => {
                depth += 1;
                current.push(c);
            }
            (None, ']') => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            (None, c) if depth == 0 && sep(c) => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            (None, c) => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn parse_selector_list(selector: &str) -> Vec<Vec<Compound>> {
    split_top_level(selector, |c| c == ',')
        .iter()
        .filter_map(|complex| {
            let compounds: Option<Vec<_>> = split_top_level(complex, char::is_whitespace)
                .iter()
                .map(|s| parse_compound(s))
                .collect();
            compounds.filter(|c| !c.is_empty())
        })
        .collect()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &[char], i: &mut usize) -> Option<String> {
    let start = *i;
    while *i < chars.len() && is_ident_char(chars[*i]) {
        *i += 1;
    }
    (*i > start).then(|| chars[start..*i].iter().collect())
}

fn parse_compound(s: &str) -> Option<Compound> {
    let chars: Vec<char> = s.chars().collect();
    let mut compound = Compound::default();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                compound.classes.push(read_ident(&chars, &mut i)?);
            }
            '#' => {
                i += 1;
                compound.id = Some(read_ident(&chars, &mut i)?);
            }
            '*' => i += 1,
            '[' => {
                let close = closing_bracket(&chars, i)?;
                let inner: String = chars[i + 1..close].iter().collect();
                compound.attrs.push(parse_attribute(&inner)?);
                i = close + 1;
            }
            c if c.is_ascii_alphabetic() => {
                compound.tag = Some(read_ident(&chars, &mut i)?.to_ascii_lowercase());
            }
            _ => return None,
        }
    }
    Some(compound)
}

/// Index of the `]` closing the bracket opened at `open`, skipping quoted text.
fn closing_bracket(chars: &[char], open: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (offset, &c) in chars[open + 1..].iter().enumerate() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ']') => return Some(open + 1 + offset),
            (None, _) => {}
        }
    }
    None
}

fn parse_attribute(inner: &str) -> Option<(String, Option<String>)> {
    match inner.split_once('=') {
        None => {
            let name = inner.trim();
            (!name.is_empty()).then(|| (name.to_string(), None))
        }
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() || !name.chars().all(is_ident_char) {
                return None;
            }
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            Some((name.to_string(), Some(value.to_string())))
        }
    }
}

/// Match a descendant-combinator chain against `index`.
fn matches_chain(nodes: &[Node], index: usize, chain: &[Compound]) -> bool {
    let Some((last, rest)) = chain.split_last() else {
        return false;
    };
    if !last.matches(&nodes[index]) {
        return false;
    }
    let mut remaining = rest.len();
    let mut current = nodes[index].parent;
    while remaining > 0 {
        let Some(i) = current else {
            return false;
        };
        if rest[remaining - 1].matches(&nodes[i]) {
            remaining -= 1;
        }
        current = nodes[i].parent;
    }
    true
}

// =============================================================================
// MemoryHost
// =============================================================================

struct Timer {
    handle: TimerHandle,
    due: u64,
    callback: Box<dyn FnOnce()>,
}

/// Host with a virtual clock. Timeouts run only inside [`MemoryHost::advance`]
/// and animation frames only inside [`MemoryHost::run_animation_frames`].
pub struct MemoryHost {
    doc: Rc<Document>,
    root: usize,
    body: usize,
    width: Cell<u32>,
    height: Cell<u32>,
    scroll_top: Cell<i32>,
    scroll_height: Cell<i32>,
    prefers_dark: Cell<bool>,
    now: Cell<u64>,
    next_timer: Cell<i32>,
    timers: RefCell<Vec<Timer>>,
    frames: RefCell<Vec<Box<dyn FnOnce()>>>,
    dispatched: RefCell<Vec<(MemoryElement, UiEvent)>>,
}

impl MemoryHost {
    /// An empty `<html><body></body></html>` document at the given viewport width.
    pub fn new(width: u32) -> Rc<Self> {
        let doc = Rc::new(Document::default());
        {
            let mut nodes = doc.nodes.borrow_mut();
            nodes.push(Node::new("html"));
            let mut body = Node::new("body");
            body.parent = Some(0);
            nodes.push(body);
            nodes[0].children.push(1);
        }
        Rc::new(Self {
            doc,
            root: 0,
            body: 1,
            width: Cell::new(width),
            height: Cell::new(800),
            scroll_top: Cell::new(0),
            scroll_height: Cell::new(800),
            prefers_dark: Cell::new(false),
            now: Cell::new(0),
            next_timer: Cell::new(1),
            timers: RefCell::new(Vec::new()),
            frames: RefCell::new(Vec::new()),
            dispatched: RefCell::new(Vec::new()),
        })
    }

    fn element(&self, index: usize) -> MemoryElement {
        MemoryElement {
            doc: self.doc.clone(),
            index,
        }
    }

    pub fn body(&self) -> MemoryElement {
        self.element(self.body)
    }

    /// Count of mutating element calls since the document was created.
    pub fn mutations(&self) -> u64 {
        self.doc.mutations.get()
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Move the virtual clock forward, running due timeouts in order.
    pub fn advance(&self, ms: u64) {
        let target = self.now.get() + ms;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let position = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.handle.0))
                    .map(|(i, _)| i);
                position.map(|i| timers.remove(i))
            };
            let Some(timer) = next else {
                break;
            };
            self.now.set(timer.due);
            (timer.callback)();
        }
        self.now.set(target);
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Run the frames queued so far; frames requested meanwhile wait for the next call.
    pub fn run_animation_frames(&self) {
        let frames = std::mem::take(&mut *self.frames.borrow_mut());
        for frame in frames {
            frame();
        }
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn set_width(&self, width: u32) {
        self.width.set(width);
    }

    /// Change the viewport width and fire `resize` on the window.
    pub fn resize(&self, width: u32) {
        self.width.set(width);
        self.doc
            .fire(Slot::Window, &HostEvent::new(EventKind::Resize, None));
    }

    pub fn set_page_height(&self, viewport: u32, document: i32) {
        self.height.set(viewport);
        self.scroll_height.set(document);
    }

    /// Scroll the window and fire `scroll`.
    pub fn scroll_to(&self, top: i32) {
        self.scroll_top.set(top);
        self.doc
            .fire(Slot::Window, &HostEvent::new(EventKind::Scroll, None));
    }

    pub fn set_prefers_dark(&self, dark: bool) {
        self.prefers_dark.set(dark);
        self.doc.fire(
            Slot::Window,
            &HostEvent::new(EventKind::ColorSchemeChange, None),
        );
    }

    pub fn click(&self, element: &MemoryElement) {
        element.click();
    }

    /// Press a key with the body as target.
    pub fn key_down(&self, key: &str) -> Handled {
        self.key_chord(key, false, false)
    }

    pub fn key_chord(&self, key: &str, ctrl: bool, meta: bool) -> Handled {
        let mut event = HostEvent::new(EventKind::KeyDown, Some(self.body()));
        event.key = Some(key.to_string());
        event.ctrl_key = ctrl;
        event.meta_key = meta;
        self.doc.fire(Slot::Node(self.body), &event)
    }

    /// Press a key while `element` has focus.
    pub fn key_down_on(&self, element: &MemoryElement, key: &str) -> Handled {
        let mut event = HostEvent::new(EventKind::KeyDown, Some(element.clone()));
        event.key = Some(key.to_string());
        self.doc.fire(Slot::Node(element.index), &event)
    }

    /// Set an input's value and fire `input`.
    pub fn type_into(&self, element: &MemoryElement, value: &str) {
        element.set_value(value);
        self.doc.fire(
            Slot::Node(element.index),
            &HostEvent::new(EventKind::Input, Some(element.clone())),
        );
    }

    /// Fire `change` on an element (after setting its value/checked state).
    pub fn change(&self, element: &MemoryElement) {
        self.doc.fire(
            Slot::Node(element.index),
            &HostEvent::new(EventKind::Change, Some(element.clone())),
        );
    }

    pub fn dom_ready(&self) {
        self.doc
            .fire(Slot::Document, &HostEvent::new(EventKind::DomReady, None));
    }

    /// Fire the content-swap notification a partial page replacement raises.
    pub fn swap_content(&self) {
        self.doc
            .fire(Slot::Document, &HostEvent::new(EventKind::ContentSwap, None));
    }

    /// Custom events dispatched so far, in order.
    pub fn events(&self) -> Vec<UiEvent> {
        self.dispatched
            .borrow()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn events_for(&self, panel: &str) -> Vec<UiEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.panel() == Some(panel))
            .collect()
    }

    pub fn event_targets(&self) -> Vec<MemoryElement> {
        self.dispatched
            .borrow()
            .iter()
            .map(|(t, _)| t.clone())
            .collect()
    }

    pub fn clear_events(&self) {
        self.dispatched.borrow_mut().clear();
    }
}

impl Host for MemoryHost {
    type Element = MemoryElement;

    fn root(&self) -> MemoryElement {
        self.element(self.root)
    }

    fn query(&self, selector: &str) -> Option<MemoryElement> {
        let root = self.root();
        if root.matches(&parse_selector_list(selector)) {
            return Some(root);
        }
        root.query(selector)
    }

    fn viewport_width(&self) -> u32 {
        self.width.get()
    }

    fn viewport_height(&self) -> u32 {
        self.height.get()
    }

    fn scroll_top(&self) -> i32 {
        self.scroll_top.get()
    }

    fn scroll_height(&self) -> i32 {
        self.scroll_height.get()
    }

    fn prefers_dark(&self) -> bool {
        self.prefers_dark.get()
    }

    fn listen(
        &self,
        target: ListenTarget<MemoryElement>,
        kind: EventKind,
        handler: Handler<MemoryElement>,
    ) {
        let slot = match target {
            ListenTarget::Window => Slot::Window,
            ListenTarget::Document => Slot::Document,
            ListenTarget::Element(el) => Slot::Node(el.index),
        };
        self.doc.listeners.borrow_mut().push(Listener {
            slot,
            kind,
            handler: Rc::new(RefCell::new(handler)),
        });
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let handle = TimerHandle(self.next_timer.get());
        self.next_timer.set(handle.0 + 1);
        self.timers.borrow_mut().push(Timer {
            handle,
            due: self.now.get() + u64::from(delay_ms),
            callback,
        });
        handle
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.timers.borrow_mut().retain(|t| t.handle != handle);
    }

    fn request_animation_frame(&self, callback: Box<dyn FnOnce()>) {
        self.frames.borrow_mut().push(callback);
    }

    fn dispatch(&self, target: &MemoryElement, event: &UiEvent) {
        tracing::debug!("dispatch {} on {:?}", event.name(), target);
        self.dispatched
            .borrow_mut()
            .push((target.clone(), event.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Rc<MemoryHost>, MemoryElement, MemoryElement) {
        let host = MemoryHost::new(1280);
        let layout = host.body().append("div").with_class("page-layout");
        let sidebar = layout
            .append("aside")
            .with_id("left")
            .with_class("page-sidebar sidebar")
            .with_attr("data-collapsible", "true");
        let button = sidebar
            .append("button")
            .with_attr("data-action", "toggle-sidebar");
        (host, sidebar, button)
    }

    #[test]
    fn test_selector_subset() {
        let (host, sidebar, button) = sample();
        assert_eq!(host.query("#left"), Some(sidebar.clone()));
        assert_eq!(host.query(".page-sidebar.sidebar"), Some(sidebar.clone()));
        assert_eq!(host.query("aside[data-collapsible=\"true\"]"), Some(sidebar.clone()));
        assert_eq!(host.query("[data-action='toggle-sidebar']"), Some(button.clone()));
        assert_eq!(host.query(".page-layout button"), Some(button.clone()));
        assert_eq!(host.query(".missing button"), None);
        assert_eq!(host.query_all("#left, button").len(), 2);
        assert_eq!(host.query("html"), Some(host.root()));
        assert!(host.query("div > aside").is_none());
    }

    #[test]
    fn test_closest_and_contains() {
        let (host, sidebar, button) = sample();
        assert_eq!(button.closest(".page-layout"), sidebar.closest(".page-layout"));
        assert_eq!(button.closest("aside"), Some(sidebar.clone()));
        assert!(sidebar.contains(&button));
        assert!(sidebar.contains(&sidebar));
        assert!(!button.contains(&sidebar));
        assert!(!sidebar.contains(&host.body()));
    }

    #[test]
    fn test_click_bubbles_to_document() {
        let (host, sidebar, button) = sample();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = seen.clone();
        host.listen(
            ListenTarget::Document,
            EventKind::Click,
            Box::new(move |_| {
                log.borrow_mut().push("document");
                Handled::Continue
            }),
        );
        let log = seen.clone();
        host.listen(
            ListenTarget::Element(sidebar.clone()),
            EventKind::Click,
            Box::new(move |_| {
                log.borrow_mut().push("sidebar");
                Handled::Continue
            }),
        );
        button.click();
        assert_eq!(*seen.borrow(), vec!["sidebar", "document"]);

        let log = seen.clone();
        host.listen(
            ListenTarget::Element(button.clone()),
            EventKind::Click,
            Box::new(move |_| {
                log.borrow_mut().push("button");
                Handled::PreventDefault
            }),
        );
        seen.borrow_mut().clear();
        button.click();
        assert_eq!(*seen.borrow(), vec!["button", "sidebar", "document"]);
        assert_eq!(button.clicks(), 2);
    }

    #[test]
    fn test_timers_run_in_due_order() {
        let host = MemoryHost::new(1024);
        let order = Rc::new(RefCell::new(Vec::new()));
        let o = order.clone();
        host.set_timeout(200, Box::new(move || o.borrow_mut().push(200)));
        let o = order.clone();
        let cancelled = host.set_timeout(50, Box::new(move || o.borrow_mut().push(50)));
        let o = order.clone();
        host.set_timeout(100, Box::new(move || o.borrow_mut().push(100)));
        host.clear_timeout(cancelled);

        host.advance(150);
        assert_eq!(*order.borrow(), vec![100]);
        host.advance(50);
        assert_eq!(*order.borrow(), vec![100, 200]);
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(host.now(), 200);
    }

    #[test]
    fn test_mutations_are_counted() {
        let (host, sidebar, _) = sample();
        let before = host.mutations();
        let _ = sidebar.has_class("collapsed");
        let _ = sidebar.attribute("id");
        assert_eq!(host.mutations(), before);
        sidebar.add_class("collapsed");
        sidebar.set_style("transition", "none");
        assert_eq!(host.mutations(), before + 2);
        assert_eq!(sidebar.style("transition").as_deref(), Some("none"));
        sidebar.set_style("transition", "");
        assert_eq!(sidebar.style("transition"), None);
    }
}
