//! Keyboard shortcuts declared in markup.
//!
//! `data-shortcut="mod+i"` clicks the element when the chord is pressed.
//! `mod` means Ctrl or Cmd. Elements are looked up on every key press, so
//! content swapped in later picks up its shortcuts without rebinding. Parsed
//! chords are cached per element and declaration.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::{Element, EventKind, Handled, Host, HostEvent, ListenTarget};

const SHORTCUT_ELEMENTS: &str = "[data-shortcut], .page-info-btn";
const PAGE_INFO_CLASS: &str = "page-info-btn";
const PAGE_INFO_CHORD: &str = "mod+i";

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct KeyChord {
    pub key: String,
    /// Ctrl or Meta, whichever the platform uses.
    pub primary: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyChord {
    /// Parse `mod+shift+k` style chords. The last token is the key.
    pub fn parse(raw: &str) -> Option<Self> {
        let tokens: Vec<String> = raw
            .split('+')
            .map(|t| t.trim().to_ascii_lowercase())
            .collect();
        let (key, modifiers) = tokens.split_last()?;
        if key.is_empty() {
            return None;
        }

        let mut chord = KeyChord {
            key: key.clone(),
            ..Default::default()
        };
        for modifier in modifiers {
            match modifier.as_str() {
                "mod" => chord.primary = true,
                "ctrl" | "control" => chord.ctrl = true,
                "meta" | "cmd" => chord.meta = true,
                "alt" | "option" => chord.alt = true,
                "shift" => chord.shift = true,
                _ => return None,
            }
        }
        Some(chord)
    }

    pub fn matches<E>(&self, event: &HostEvent<E>) -> bool {
        let Some(key) = event.key.as_deref() else {
            return false;
        };
        if !key.eq_ignore_ascii_case(&self.key) {
            return false;
        }
        let ctrl_meta = if self.primary {
            event.ctrl_key || event.meta_key
        } else {
            event.ctrl_key == self.ctrl && event.meta_key == self.meta
        };
        ctrl_meta && event.alt_key == self.alt && event.shift_key == self.shift
    }
}

/// The chord declaration an element carries, if any.
pub fn declared_chord<E: Element>(element: &E) -> Option<String> {
    element.attribute("data-shortcut").or_else(|| {
        element
            .has_class(PAGE_INFO_CLASS)
            .then(|| PAGE_INFO_CHORD.to_string())
    })
}

struct Binding<E> {
    element: E,
    declared: String,
    chord: Option<KeyChord>,
}

pub struct Shortcuts<H: Host> {
    host: Rc<H>,
    bindings: RefCell<Vec<Binding<H::Element>>>,
}

impl<H: Host> Shortcuts<H> {
    pub fn attach(host: Rc<H>) -> Rc<Self> {
        let this = Rc::new(Self {
            host,
            bindings: RefCell::new(Vec::new()),
        });
        let weak = Rc::downgrade(&this);
        this.host.listen(
            ListenTarget::Document,
            EventKind::KeyDown,
            Box::new(move |event| match weak.upgrade() {
                Some(this) if this.handle_key(event) => Handled::PreventDefault,
                _ => Handled::Continue,
            }),
        );
        this
    }

    /// Click the first element bound to the pressed chord.
    pub fn handle_key(&self, event: &HostEvent<H::Element>) -> bool {
        self.refresh();
        let target = self
            .bindings
            .borrow()
            .iter()
            .find(|b| b.chord.as_ref().is_some_and(|chord| chord.matches(event)))
            .map(|b| b.element.clone());
        match target {
            Some(el) => {
                el.click();
                true
            }
            None => false,
        }
    }

    /// Rebuild the binding list from the document, reusing parsed chords for
    /// elements whose declaration is unchanged. Only new declarations are
    /// parsed, so an invalid one is reported once. Returns how many were parsed.
    fn refresh(&self) -> usize {
        let mut parsed = 0;
        let mut previous = self.bindings.take();
        let mut current = Vec::new();
        for element in self.host.query_all(SHORTCUT_ELEMENTS) {
            let Some(declared) = declared_chord(&element) else {
                continue;
            };
            let cached = previous
                .iter()
                .position(|b| b.element == element && b.declared == declared);
            let binding = match cached {
                Some(index) => previous.swap_remove(index),
                None => {
                    parsed += 1;
                    let chord = KeyChord::parse(&declared);
                    if chord.is_none() {
                        tracing::warn!(
                            "Ignoring invalid shortcut {:?} on {:?}",
                            declared,
                            element.id()
                        );
                    }
                    Binding {
                        element,
                        declared,
                        chord,
                    }
                }
            };
            current.push(binding);
        }
        self.bindings.replace(current);
        parsed
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemoryHost;

    #[test]
    fn test_parse() {
        let chord = KeyChord::parse("mod+i").unwrap();
        assert!(chord.primary);
        assert_eq!(chord.key, "i");

        let chord = KeyChord::parse("Ctrl + Shift + K").unwrap();
        assert!(chord.ctrl && chord.shift && !chord.meta);
        assert_eq!(chord.key, "k");

        assert_eq!(KeyChord::parse("hyper+x"), None);
        assert_eq!(KeyChord::parse("mod+"), None);
        assert_eq!(KeyChord::parse(""), None);
    }

    #[test]
    fn test_matches() {
        let mut event: HostEvent<()> = HostEvent::new(EventKind::KeyDown, None);
        event.key = Some("i".into());
        let chord = KeyChord::parse("mod+i").unwrap();
        assert!(!chord.matches(&event));

        event.meta_key = true;
        assert!(chord.matches(&event));
        event.meta_key = false;
        event.ctrl_key = true;
        assert!(chord.matches(&event));

        event.alt_key = true;
        assert!(!chord.matches(&event));
    }

    #[test]
    fn test_page_info_button_default_chord() {
        let host = MemoryHost::new(1280);
        let info = host.body().append("button").with_class("page-info-btn");
        let _shortcuts = Shortcuts::attach(host.clone());

        assert_eq!(host.key_chord("i", false, false), Handled::Continue);
        assert_eq!(info.clicks(), 0);
        assert_eq!(host.key_chord("i", true, false), Handled::PreventDefault);
        assert_eq!(info.clicks(), 1);
        assert_eq!(host.key_chord("i", false, true), Handled::PreventDefault);
        assert_eq!(info.clicks(), 2);
    }

    #[test]
    fn test_declared_shortcut_needs_exact_modifiers() {
        let host = MemoryHost::new(1280);
        let filters = host
            .body()
            .append("button")
            .with_attr("data-shortcut", "ctrl+f");
        let _shortcuts = Shortcuts::attach(host.clone());

        host.key_chord("f", false, true);
        assert_eq!(filters.clicks(), 0, "meta is not ctrl");
        host.key_chord("f", true, false);
        assert_eq!(filters.clicks(), 1);
    }

    #[test]
    fn test_declarations_parsed_once_per_element() {
        let host = MemoryHost::new(1280);
        let broken = host
            .body()
            .append("button")
            .with_attr("data-shortcut", "hyper+x");
        host.body().append("button").with_class("page-info-btn");
        let shortcuts = Shortcuts::attach(host.clone());

        assert_eq!(shortcuts.refresh(), 2);
        host.key_down("x");
        host.key_down("x");
        assert_eq!(shortcuts.refresh(), 0, "invalid chord is not re-parsed per key press");

        broken.set_attribute("data-shortcut", "alt+x");
        assert_eq!(shortcuts.refresh(), 1);
        broken.remove();
        assert_eq!(shortcuts.refresh(), 0);
        assert_eq!(shortcuts.bindings.borrow().len(), 1);
    }
}
