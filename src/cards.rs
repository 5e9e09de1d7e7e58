//! "Show more" buttons on card text.
//!
//! Card text is clamped by CSS until the card carries `text-expanded`. Buttons
//! under text that fits anyway are hidden once the page has laid out.

use std::rc::Rc;

use crate::config::BehaviorSettings;
use crate::debounce::Debouncer;
use crate::dom::{Element, EventKind, Handled, Host, ListenTarget};

const EXPAND_BUTTONS: &str = ".expand-btn";
const CARD_BODY: &str = ".card-body";
const CARD_TEXT: &str = ".card-text";
const EXPAND_LABEL: &str = ".expand-label";
const EXPANDED_CLASS: &str = "text-expanded";

/// Lines shown while collapsed.
pub const COLLAPSED_LINES: f64 = 6.0;

pub fn is_truncated(content_height: i32, line_height: f64) -> bool {
    f64::from(content_height) > line_height * COLLAPSED_LINES
}

fn card_text<E: Element>(button: &E) -> Option<E> {
    button.closest(CARD_BODY)?.query(CARD_TEXT)
}

pub struct CardExpand<H: Host> {
    host: Rc<H>,
    measure: Debouncer<H>,
}

impl<H: Host> CardExpand<H> {
    pub fn attach(host: Rc<H>, settings: &BehaviorSettings) -> Rc<Self> {
        let this = Rc::new(Self {
            measure: Debouncer::new(host.clone(), settings.expand_check_delay_ms),
            host,
        });
        let weak = Rc::downgrade(&this);
        this.host.listen(
            ListenTarget::Document,
            EventKind::Click,
            Box::new(move |event| {
                let button = event.target.as_ref().and_then(|t| t.closest(EXPAND_BUTTONS));
                match (weak.upgrade(), button) {
                    (Some(this), Some(button)) if this.toggle(&button).is_some() => {
                        Handled::PreventDefault
                    }
                    _ => Handled::Continue,
                }
            }),
        );
        this
    }

    /// Measure card text after the configured delay, replacing a pending measurement.
    pub fn schedule_measure(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.measure.schedule(move || {
            if let Some(this) = weak.upgrade() {
                this.hide_untruncated();
            }
        });
    }

    /// Hide buttons whose card text fits without clamping. Returns how many were hidden.
    pub fn hide_untruncated(&self) -> usize {
        let mut hidden = 0;
        for button in self.host.query_all(EXPAND_BUTTONS) {
            let Some(text) = card_text(&button) else {
                continue;
            };
            if !is_truncated(text.content_height(), text.line_height()) {
                button.set_style("display", "none");
                hidden += 1;
            }
        }
        hidden
    }

    /// Expand or collapse the card text under `button`. Returns the new
    /// expanded state, or None when the card has no text element.
    pub fn toggle(&self, button: &H::Element) -> Option<bool> {
        let Some(text) = card_text(button) else {
            tracing::warn!("Card text element not found");
            return None;
        };
        let expanded = !text.has_class(EXPANDED_CLASS);
        text.toggle_class(EXPANDED_CLASS, expanded);

        button.set_attribute("aria-expanded", if expanded { "true" } else { "false" });
        if let Some(icon) = button.query("i") {
            icon.toggle_class("bi-chevron-up", expanded);
            icon.toggle_class("bi-chevron-down", !expanded);
        }
        if let Some(label) = button.query(EXPAND_LABEL) {
            label.set_text(if expanded { "Show less" } else { "Show more" });
        }
        Some(expanded)
    }
}
