//! Search field and ordering select synchronization, filter reset and tag
//! filter buttons.
//!
//! A list page renders the same search box in several places (toolbar,
//! offcanvas, hidden filter form). Typing in one keeps the others in step and
//! submits the filter form once typing pauses.

use std::rc::Rc;

use crate::config::BehaviorSettings;
use crate::debounce::Debouncer;
use crate::dom::{Element, EventKind, Handled, Host, ListenTarget};

const SEARCH_FIELDS: &str = ".search-field, input[name=\"search\"]";
const HIDDEN_SEARCH_ID: &str = "search-hidden";
const FILTER_FORM_ID: &str = "filterForm";
const ORDERING_FIELDS: &str = ".ordering-field";
const SIDEBAR_FORM_ID: &str = "sidebarFilterForm";
const FILTER_CONTROLS: &str = "input, select, textarea";
const CLEAR_FILTERS: &str = "[data-action=\"clear-filters\"]";
const TAG_FILTERS: &str = "[data-tag-filters] .btn-outline-primary";
const ACTIVE_TAG_FILTERS: &str = "[data-tag-filters] .btn-outline-primary.active";

/// Copy `value` into every element of `fields` except `source`.
fn mirror_value<E: Element>(fields: &[E], source: &E, value: &str) {
    for field in fields.iter().filter(|f| *f != source) {
        field.set_value(value);
    }
}

pub struct SearchSync<H: Host> {
    host: Rc<H>,
    fields: Vec<H::Element>,
    submit: Debouncer<H>,
}

impl<H: Host> SearchSync<H> {
    pub fn attach(host: Rc<H>, settings: &BehaviorSettings) -> Option<Rc<Self>> {
        let fields = host.query_all(SEARCH_FIELDS);
        if fields.is_empty() {
            return None;
        }

        let this = Rc::new(Self {
            submit: Debouncer::new(host.clone(), settings.search_debounce_ms),
            host,
            fields,
        });

        for field in &this.fields {
            let weak = Rc::downgrade(&this);
            let source = field.clone();
            this.host.listen(
                ListenTarget::Element(field.clone()),
                EventKind::Input,
                Box::new(move |_| {
                    if let Some(this) = weak.upgrade() {
                        this.handle_input(&source);
                    }
                    Handled::Continue
                }),
            );

            let weak = Rc::downgrade(&this);
            this.host.listen(
                ListenTarget::Element(field.clone()),
                EventKind::KeyDown,
                Box::new(move |event| match weak.upgrade() {
                    Some(this) if event.is_key("Enter") && this.submit_now() => {
                        Handled::PreventDefault
                    }
                    _ => Handled::Continue,
                }),
            );
        }

        tracing::debug!("Synchronizing {} search fields", this.fields.len());
        Some(this)
    }

    pub fn handle_input(&self, source: &H::Element) {
        let value = source.value().unwrap_or_default();
        mirror_value(&self.fields, source, &value);
        if let Some(hidden) = self.host.element_by_id(HIDDEN_SEARCH_ID) {
            hidden.set_value(&value);
        }

        if self.host.element_by_id(FILTER_FORM_ID).is_some() {
            let host = self.host.clone();
            self.submit.schedule(move || {
                if let Some(form) = host.element_by_id(FILTER_FORM_ID) {
                    form.submit();
                }
            });
        }
    }

    /// Submit the filter form immediately, dropping any pending submit.
    /// Returns false when the page has no filter form.
    pub fn submit_now(&self) -> bool {
        self.submit.cancel();
        match self.host.element_by_id(FILTER_FORM_ID) {
            Some(form) => {
                form.submit();
                true
            }
            None => false,
        }
    }

    pub fn is_submit_pending(&self) -> bool {
        self.submit.is_pending()
    }
}

pub struct OrderingSync<H: Host> {
    host: Rc<H>,
    selects: Vec<H::Element>,
}

impl<H: Host> OrderingSync<H> {
    pub fn attach(host: Rc<H>) -> Option<Rc<Self>> {
        let selects = host.query_all(ORDERING_FIELDS);
        if selects.is_empty() {
            return None;
        }
        let this = Rc::new(Self { host, selects });

        for select in &this.selects {
            let weak = Rc::downgrade(&this);
            let source = select.clone();
            this.host.listen(
                ListenTarget::Element(select.clone()),
                EventKind::Change,
                Box::new(move |_| {
                    if let Some(this) = weak.upgrade() {
                        this.handle_change(&source);
                    }
                    Handled::Continue
                }),
            );
        }
        Some(this)
    }

    pub fn handle_change(&self, source: &H::Element) {
        let value = source.value().unwrap_or_default();
        tracing::debug!("Sort changed to: {}", value);
        mirror_value(&self.selects, source, &value);
        if let Some(form) = self.host.element_by_id(SIDEBAR_FORM_ID) {
            form.submit();
        }
    }
}

/// Clear every non-hidden control of the filter form and any active tag
/// filter, then submit the form. Returns false when the page has no filter form.
pub fn clear_filters<H: Host>(host: &H) -> bool {
    let Some(form) = host.element_by_id(FILTER_FORM_ID) else {
        return false;
    };
    for control in form.query_all(FILTER_CONTROLS) {
        let kind = control.attribute("type").map(|t| t.to_ascii_lowercase());
        match kind.as_deref() {
            Some("hidden") => {}
            Some("checkbox" | "radio") => control.set_checked(false),
            _ => control.set_value(""),
        }
    }
    for tag in host.query_all(ACTIVE_TAG_FILTERS) {
        tag.remove_class("active");
    }
    tracing::debug!("All filters cleared");
    form.submit();
    true
}

/// Delegated clicks for "clear filters" buttons and tag filter buttons, so
/// swapped-in markup works without rebinding.
pub struct FilterButtons<H: Host> {
    host: Rc<H>,
}

impl<H: Host> FilterButtons<H> {
    pub fn attach(host: Rc<H>) -> Rc<Self> {
        let this = Rc::new(Self { host });
        let weak = Rc::downgrade(&this);
        this.host.listen(
            ListenTarget::Document,
            EventKind::Click,
            Box::new(move |event| {
                let (Some(this), Some(target)) = (weak.upgrade(), event.target.as_ref()) else {
                    return Handled::Continue;
                };
                this.handle_click(target)
            }),
        );
        this
    }

    /// Clear the filter form and submit it. Returns false without a filter form.
    pub fn clear(&self) -> bool {
        clear_filters(&*self.host)
    }

    fn handle_click(&self, target: &H::Element) -> Handled {
        if target.closest(CLEAR_FILTERS).is_some() {
            return if self.clear() {
                Handled::PreventDefault
            } else {
                Handled::Continue
            };
        }
        if let Some(tag) = target.closest(TAG_FILTERS) {
            let active = !tag.has_class("active");
            tag.toggle_class("active", active);
            tag.set_attribute("aria-pressed", if active { "true" } else { "false" });
        }
        Handled::Continue
    }
}
