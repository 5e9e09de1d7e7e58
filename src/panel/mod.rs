//! Collapsible panel controller.
//!
//! One controller owns one panel element and its toggle control. The
//! collapsed flag lives in three places that must agree after every
//! operation: the controller, the panel's class list, and storage.
//!
//! Responsive panels switch to overlay mode below their breakpoint. In overlay
//! mode the collapsed class is removed and toggling is ignored; the page's
//! offcanvas component shows and hides the panel instead.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::config::{BehaviorSettings, PanelConfig, BOUND_ATTRIBUTE};
use crate::debounce::Debouncer;
use crate::dom::{Element, EventKind, Handled, Host, ListenTarget};
use crate::error::{BehaviorError, Result};
use crate::events::UiEvent;
use crate::outside::InsideSet;
use crate::storage::{Preference, Storages};

pub struct PanelController<H: Host> {
    host: Rc<H>,
    config: PanelConfig,
    panel: H::Element,
    toggle: H::Element,
    preference: Preference,
    collapsed: Cell<bool>,
    overlay: Cell<bool>,
    initialized: Cell<bool>,
    resize: Debouncer<H>,
}

impl<H: Host> PanelController<H> {
    /// Build a controller. Resolves the toggle control but leaves the DOM untouched.
    pub fn new(
        host: Rc<H>,
        panel: H::Element,
        config: PanelConfig,
        storages: &Storages,
        settings: &BehaviorSettings,
    ) -> Result<Rc<Self>> {
        let toggle = config.find_toggle(&*host, &panel).ok_or_else(|| {
            BehaviorError::ElementNotFound(format!(
                "toggle control for panel {}",
                config.panel_id
            ))
        })?;
        let preference = Preference::new(
            storages.scoped(config.persistence_scope),
            config.persistence_key.clone(),
        );
        let resize = Debouncer::new(host.clone(), settings.resize_debounce_ms);

        Ok(Rc::new(Self {
            host,
            config,
            panel,
            toggle,
            preference,
            collapsed: Cell::new(false),
            overlay: Cell::new(false),
            initialized: Cell::new(false),
            resize,
        }))
    }

    /// Build a controller for the first element matching `selector`,
    /// configured from that element's attributes.
    pub fn for_selector(
        host: Rc<H>,
        selector: &str,
        storages: &Storages,
        settings: &BehaviorSettings,
    ) -> Result<Rc<Self>> {
        let panel = host
            .query(selector)
            .ok_or_else(|| BehaviorError::ElementNotFound(format!("panel {}", selector)))?;
        let config = PanelConfig::from_element(&panel, settings, selector);
        Self::new(host, panel, config, storages, settings)
    }

    pub fn panel_id(&self) -> &str {
        &self.config.panel_id
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn panel(&self) -> &H::Element {
        &self.panel
    }

    pub fn toggle_control(&self) -> &H::Element {
        &self.toggle
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed.get()
    }

    /// Whether the panel element is still part of the document. A content swap
    /// can replace it, after which this controller no longer reacts to events.
    pub fn is_attached(&self) -> bool {
        self.host.root().contains(&self.panel)
    }

    fn live(weak: &Weak<Self>) -> Option<Rc<Self>> {
        weak.upgrade().filter(|this| this.is_attached())
    }

    /// Whether the panel was in overlay mode at the last viewport check.
    pub fn is_overlay(&self) -> bool {
        self.overlay.get()
    }

    fn below_breakpoint(&self) -> bool {
        self.config.responsive && self.config.breakpoint.is_below(self.host.viewport_width())
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Restore the persisted state and attach listeners. Runs once.
    pub fn initialize(self: &Rc<Self>) {
        if self.initialized.replace(true) {
            tracing::debug!("Panel {} already initialized", self.config.panel_id);
            return;
        }

        let collapsed = self.preference.load_flag();
        self.collapsed.set(collapsed);
        let overlay = self.below_breakpoint();
        self.overlay.set(overlay);

        if overlay {
            self.panel.remove_class(&self.config.collapsed_class);
        } else if collapsed {
            if self.root_flag_applied() {
                // The head script already rendered the state; only track it.
                self.panel.add_class(&self.config.collapsed_class);
            } else {
                self.apply_without_transition(true);
            }
        }
        self.sync_aria(collapsed && !overlay);

        self.attach_listeners();
        self.panel.set_attribute(BOUND_ATTRIBUTE, "true");

        tracing::debug!(
            "Panel {} initialized (collapsed: {}, overlay: {})",
            self.config.panel_id,
            collapsed,
            overlay
        );
        self.host.dispatch(
            &self.panel,
            &UiEvent::Initialized {
                panel: self.config.panel_id.clone(),
                collapsed,
            },
        );
    }

    /// Flip the collapsed state. Returns false when ignored in overlay mode.
    pub fn toggle(&self) -> bool {
        if self.below_breakpoint() {
            tracing::debug!(
                "Ignoring toggle of {} below {} breakpoint",
                self.config.panel_id,
                self.config.breakpoint
            );
            return false;
        }

        let collapsed = !self.collapsed.get();
        self.collapsed.set(collapsed);
        self.preference.store_flag(collapsed);
        self.render(collapsed);

        self.host.dispatch(
            &self.panel,
            &UiEvent::state_change(&self.config.panel_id, collapsed),
        );
        true
    }

    /// React to a viewport width change. Only a breakpoint crossing has effects.
    pub fn handle_viewport_change(&self) {
        let below = self.below_breakpoint();
        if below == self.overlay.get() {
            return;
        }
        self.overlay.set(below);
        let panel = self.config.panel_id.clone();

        if below {
            self.panel.remove_class(&self.config.collapsed_class);
            self.sync_aria(false);
            tracing::debug!("Panel {} entered overlay mode", panel);
            self.host
                .dispatch(&self.panel, &UiEvent::OverlayEntered { panel });
        } else {
            let collapsed = self.collapsed.get();
            if collapsed {
                self.apply_without_transition(true);
            }
            self.sync_aria(collapsed);
            tracing::debug!("Panel {} left overlay mode", panel);
            self.host
                .dispatch(&self.panel, &UiEvent::OverlayExited { panel });
        }
    }

    /// Hide an open overlay. Returns false when not in overlay mode or not open.
    pub fn dismiss(&self) -> bool {
        if !self.below_breakpoint() || !self.panel.has_class(&self.config.overlay_class) {
            return false;
        }
        self.panel.remove_class(&self.config.overlay_class);
        self.panel.set_attribute("aria-hidden", "true");
        self.toggle.set_attribute("aria-expanded", "false");
        self.host.dispatch(
            &self.panel,
            &UiEvent::Dismissed {
                panel: self.config.panel_id.clone(),
            },
        );
        true
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    fn render(&self, collapsed: bool) {
        self.panel
            .toggle_class(&self.config.collapsed_class, collapsed);
        self.sync_aria(collapsed);
        self.mirror_root_flag(collapsed);
    }

    /// Apply the class with transitions suspended until the next frame, so a
    /// restored state appears without animating from the server-rendered one.
    fn apply_without_transition(&self, collapsed: bool) {
        self.panel.set_style("transition", "none");
        self.panel
            .toggle_class(&self.config.collapsed_class, collapsed);
        self.panel.force_layout();

        let panel = self.panel.clone();
        self.host
            .request_animation_frame(Box::new(move || panel.set_style("transition", "")));
    }

    fn sync_aria(&self, collapsed: bool) {
        self.toggle
            .set_attribute("aria-expanded", if collapsed { "false" } else { "true" });
        self.panel
            .set_attribute("aria-hidden", if collapsed { "true" } else { "false" });

        if let Some(icon) = self.toggle.query("i") {
            if collapsed {
                icon.remove_class("bi-arrow-bar-right");
                icon.add_class("bi-arrow-bar-left");
                self.toggle.set_attribute("aria-label", "Expand sidebar");
            } else {
                icon.remove_class("bi-arrow-bar-left");
                icon.add_class("bi-arrow-bar-right");
                self.toggle.set_attribute("aria-label", "Collapse sidebar");
            }
        }
    }

    fn mirror_root_flag(&self, collapsed: bool) {
        let Some(flag) = &self.config.root_flag else {
            return;
        };
        let root = self.host.root();
        if collapsed {
            root.set_attribute(flag, "true");
        } else {
            root.remove_attribute(flag);
        }
    }

    fn root_flag_applied(&self) -> bool {
        self.config
            .root_flag
            .as_ref()
            .is_some_and(|flag| self.host.root().attribute(flag).is_some())
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    fn attach_listeners(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.host.listen(
            ListenTarget::Element(self.toggle.clone()),
            EventKind::Click,
            Box::new(move |_| {
                if let Some(this) = Self::live(&weak) {
                    this.toggle();
                }
                Handled::PreventDefault
            }),
        );

        let weak = Rc::downgrade(self);
        self.host.listen(
            ListenTarget::Window,
            EventKind::Resize,
            Box::new(move |_| {
                if let Some(this) = Self::live(&weak) {
                    this.schedule_viewport_check();
                }
                Handled::Continue
            }),
        );

        if self.config.dismissible {
            self.attach_dismiss_listeners();
        }
    }

    fn schedule_viewport_check(self: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(self);
        self.resize.schedule(move || {
            if let Some(this) = Self::live(&weak) {
                this.handle_viewport_change();
            }
        });
    }

    fn attach_dismiss_listeners(self: &Rc<Self>) {
        let inside = InsideSet::new(vec![self.panel.clone(), self.toggle.clone()]);
        let weak = Rc::downgrade(self);
        self.host.listen(
            ListenTarget::Document,
            EventKind::Click,
            Box::new(move |event| {
                if let Some(this) = Self::live(&weak) {
                    if inside.is_outside(event.target.as_ref()) {
                        this.dismiss();
                    }
                }
                Handled::Continue
            }),
        );

        let weak = Rc::downgrade(self);
        self.host.listen(
            ListenTarget::Document,
            EventKind::KeyDown,
            Box::new(move |event| match Self::live(&weak) {
                Some(this) if event.is_key("Escape") && this.dismiss() => Handled::PreventDefault,
                _ => Handled::Continue,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{MemoryElement, MemoryHost};
    use crate::storage::{MemoryStorage, StoragePort};

    struct Fixture {
        host: Rc<MemoryHost>,
        panel: MemoryElement,
        toggle: MemoryElement,
        storage: Rc<MemoryStorage>,
        storages: Storages,
    }

    fn fixture(width: u32, attrs: &[(&str, &str)]) -> Fixture {
        let host = MemoryHost::new(width);
        let mut panel = host
            .body()
            .append("aside")
            .with_id("sidebar")
            .with_class("sidebar")
            .with_attr("data-collapsible", "true");
        for (name, value) in attrs {
            panel = panel.with_attr(name, value);
        }
        let toggle = panel.append("button").with_class("sidebar-toggle");
        toggle.append("i").with_class("bi bi-arrow-bar-right");
        let storage = Rc::new(MemoryStorage::new());
        let storages = Storages::new(storage.clone(), Rc::new(MemoryStorage::new()));
        Fixture {
            host,
            panel,
            toggle,
            storage,
            storages,
        }
    }

    fn controller(f: &Fixture) -> Rc<PanelController<MemoryHost>> {
        PanelController::for_selector(
            f.host.clone(),
            "#sidebar",
            &f.storages,
            &BehaviorSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_construction_does_not_touch_dom() {
        let f = fixture(1280, &[]);
        let before = f.host.mutations();
        let c = controller(&f);
        assert_eq!(f.host.mutations(), before);
        assert_eq!(c.toggle_control(), &f.toggle);
        assert!(f.host.events().is_empty());
    }

    #[test]
    fn test_restore_suspends_transition_until_next_frame() {
        let f = fixture(1280, &[]);
        f.storage.set("sidebarCollapsed", "true").unwrap();
        let c = controller(&f);
        c.initialize();

        assert!(c.is_collapsed());
        assert!(f.panel.has_class("collapsed"));
        assert_eq!(f.panel.style("transition").as_deref(), Some("none"));
        assert_eq!(f.host.pending_frames(), 1);

        f.host.run_animation_frames();
        assert_eq!(f.panel.style("transition"), None);
        assert_eq!(f.toggle.attribute("aria-expanded").as_deref(), Some("false"));
        assert_eq!(f.toggle.attribute("aria-label").as_deref(), Some("Expand sidebar"));
        assert_eq!(
            f.host.events(),
            vec![UiEvent::Initialized {
                panel: "sidebar".into(),
                collapsed: true
            }]
        );
    }

    #[test]
    fn test_restore_expanded_needs_no_frame() {
        let f = fixture(1280, &[]);
        let c = controller(&f);
        c.initialize();
        assert!(!f.panel.has_class("collapsed"));
        assert_eq!(f.host.pending_frames(), 0);
        assert_eq!(f.panel.attribute("aria-hidden").as_deref(), Some("false"));
        assert_eq!(f.panel.attribute(BOUND_ATTRIBUTE).as_deref(), Some("true"));
    }

    #[test]
    fn test_initialize_twice_is_harmless() {
        let f = fixture(1280, &[]);
        let c = controller(&f);
        c.initialize();
        c.initialize();
        f.host.click(&f.toggle);
        assert!(c.is_collapsed(), "a second listener would have toggled back");
        assert_eq!(f.host.events().len(), 2);
    }

    #[test]
    fn test_overlay_start_strips_server_rendered_class() {
        let f = fixture(600, &[("data-breakpoint", "md")]);
        f.panel.add_class("collapsed");
        f.storage.set("sidebarCollapsed", "true").unwrap();
        let c = controller(&f);
        c.initialize();
        assert!(c.is_overlay());
        assert!(c.is_collapsed());
        assert!(!f.panel.has_class("collapsed"));
        assert_eq!(f.host.pending_frames(), 0);
    }

    #[test]
    fn test_root_flag_mirror() {
        let f = fixture(1280, &[("data-root-flag", "data-page-sidebar-collapsed")]);
        let c = controller(&f);
        c.initialize();
        let root = f.host.root();

        c.toggle();
        assert_eq!(root.attribute("data-page-sidebar-collapsed").as_deref(), Some("true"));
        c.toggle();
        assert_eq!(root.attribute("data-page-sidebar-collapsed"), None);
    }

    #[test]
    fn test_pre_applied_root_flag_skips_transition_dance() {
        let f = fixture(1280, &[("data-root-flag", "data-page-sidebar-collapsed")]);
        f.host.root().set_attribute("data-page-sidebar-collapsed", "true");
        f.storage.set("sidebarCollapsed", "true").unwrap();
        let c = controller(&f);
        c.initialize();
        assert!(f.panel.has_class("collapsed"));
        assert_eq!(f.panel.style("transition"), None);
        assert_eq!(f.host.pending_frames(), 0);
    }

    #[test]
    fn test_resize_is_debounced() {
        let f = fixture(1280, &[("data-breakpoint", "lg")]);
        let c = controller(&f);
        c.initialize();
        f.host.clear_events();

        f.host.resize(1000);
        f.host.advance(100);
        f.host.resize(900);
        f.host.advance(100);
        assert!(!c.is_overlay(), "still settling");

        f.host.resize(800);
        f.host.advance(150);
        assert!(c.is_overlay());
        assert_eq!(
            f.host.events(),
            vec![UiEvent::OverlayEntered {
                panel: "sidebar".into()
            }]
        );
    }

    #[test]
    fn test_dismiss_on_outside_click_and_escape() {
        let f = fixture(500, &[("data-breakpoint", "lg"), ("data-dismissible", "true")]);
        let outside = f.host.body().append("main");
        let c = controller(&f);
        c.initialize();
        f.host.clear_events();

        f.panel.add_class("show");
        f.host.click(&f.panel);
        assert!(f.panel.has_class("show"), "click inside keeps it open");

        f.host.click(&outside);
        assert!(!f.panel.has_class("show"));
        assert_eq!(f.panel.attribute("aria-hidden").as_deref(), Some("true"));
        assert_eq!(
            f.host.events(),
            vec![UiEvent::Dismissed {
                panel: "sidebar".into()
            }]
        );

        f.panel.add_class("show");
        assert_eq!(f.host.key_down("Escape"), Handled::PreventDefault);
        assert!(!f.panel.has_class("show"));
        assert!(!c.is_collapsed(), "dismissal never touches the collapse flag");
        assert_eq!(f.storage.writes(), 0);
    }

    #[test]
    fn test_dismiss_inactive_above_breakpoint() {
        let f = fixture(1280, &[("data-breakpoint", "lg"), ("data-dismissible", "true")]);
        let outside = f.host.body().append("main");
        let c = controller(&f);
        c.initialize();
        f.panel.add_class("show");
        f.host.click(&outside);
        assert!(f.panel.has_class("show"));
        assert_eq!(f.host.key_down("Escape"), Handled::Continue);
    }

    #[test]
    fn test_detached_panel_ignores_window_events() {
        let f = fixture(1280, &[("data-breakpoint", "lg")]);
        let c = controller(&f);
        c.initialize();
        assert!(c.is_attached());

        f.panel.remove();
        assert!(!c.is_attached());
        f.host.clear_events();
        f.host.resize(600);
        f.host.advance(500);
        assert!(!c.is_overlay());
        assert!(f.host.events().is_empty());
    }

    #[test]
    fn test_missing_toggle_is_element_not_found() {
        let host = MemoryHost::new(1280);
        host.body().append("aside").with_id("lonely");
        let err = PanelController::for_selector(
            host.clone(),
            "#lonely",
            &Storages::in_memory(),
            &BehaviorSettings::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, BehaviorError::ElementNotFound(_)));

        let err = PanelController::for_selector(
            host,
            "#absent",
            &Storages::in_memory(),
            &BehaviorSettings::default(),
        )
        .err()
        .unwrap();
        assert_eq!(err, BehaviorError::ElementNotFound("panel #absent".into()));
    }
}
