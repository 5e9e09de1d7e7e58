//! Page orchestration: wires every behavior into one document.
//!
//! Panels and drawers are discovered by attribute and bound once; a content
//! swap (htmx, Turbo) rescans, releases controllers whose elements were
//! swapped out, and binds only what is new. Page-wide behaviors
//! (theme, toolbar, search, filter buttons, fullscreen, card expansion,
//! select-all, shortcuts) are attached once.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cards::CardExpand;
use crate::config::{is_enabled, BehaviorSettings, PanelConfig, BOUND_ATTRIBUTE};
use crate::dom::{Element, EventKind, Handled, Host, ListenTarget};
use crate::drawer::{Drawer, DRAWER_BOUND_ATTRIBUTE, DRAWER_SELECTOR};
use crate::filters::{FilterButtons, OrderingSync, SearchSync};
use crate::fullscreen::FullscreenToggle;
use crate::panel::PanelController;
use crate::selection::SelectAll;
use crate::shortcuts::Shortcuts;
use crate::storage::{Preference, Storages};
use crate::theme::ThemeSwitcher;
use crate::toolbar::MobileToolbar;

const PANEL_SELECTOR: &str = "[data-collapsible]";

pub struct Page<H: Host> {
    host: Rc<H>,
    storages: Storages,
    settings: BehaviorSettings,
    panels: RefCell<Vec<Rc<PanelController<H>>>>,
    drawers: RefCell<Vec<Rc<Drawer<H>>>>,
    theme: Rc<ThemeSwitcher<H>>,
    toolbar: Option<Rc<MobileToolbar<H>>>,
    search: Option<Rc<SearchSync<H>>>,
    ordering: Option<Rc<OrderingSync<H>>>,
    filter_buttons: Rc<FilterButtons<H>>,
    fullscreen: Rc<FullscreenToggle<H>>,
    cards: Rc<CardExpand<H>>,
    select_all: Option<Rc<SelectAll<H>>>,
    shortcuts: Rc<Shortcuts<H>>,
}

impl<H: Host> Page<H> {
    /// Attach every behavior to the current document.
    pub fn attach(host: Rc<H>, storages: Storages, settings: BehaviorSettings) -> Rc<Self> {
        let theme = ThemeSwitcher::new(
            host.clone(),
            Preference::new(
                storages.permanent.clone(),
                settings.theme_storage_key.clone(),
            ),
        );
        theme.initialize();

        let page = Rc::new(Self {
            toolbar: MobileToolbar::attach(host.clone(), &settings),
            search: SearchSync::attach(host.clone(), &settings),
            ordering: OrderingSync::attach(host.clone()),
            filter_buttons: FilterButtons::attach(host.clone()),
            fullscreen: FullscreenToggle::attach(host.clone()),
            cards: CardExpand::attach(host.clone(), &settings),
            select_all: SelectAll::attach(host.clone()),
            shortcuts: Shortcuts::attach(host.clone()),
            panels: RefCell::new(Vec::new()),
            drawers: RefCell::new(Vec::new()),
            theme,
            host,
            storages,
            settings,
        });

        let bound = page.rescan();
        tracing::info!(
            "Layout behaviors attached ({} panels, toolbar: {}, search: {})",
            bound,
            page.toolbar.is_some(),
            page.search.is_some()
        );

        let weak = Rc::downgrade(&page);
        page.host.listen(
            ListenTarget::Document,
            EventKind::ContentSwap,
            Box::new(move |_| {
                if let Some(page) = weak.upgrade() {
                    let bound = page.rescan();
                    tracing::debug!("Content swapped, bound {} new panels", bound);
                }
                Handled::Continue
            }),
        );
        page
    }

    /// Release panels and drawers whose elements left the document, then bind
    /// those that are not bound yet. Returns the number of panels bound by
    /// this call.
    pub fn rescan(&self) -> usize {
        self.release_detached();
        self.bind_drawers();
        self.cards.schedule_measure();
        self.bind_panels()
    }

    fn release_detached(&self) {
        let mut panels = self.panels.borrow_mut();
        let before = panels.len();
        panels.retain(|p| p.is_attached());
        let mut drawers = self.drawers.borrow_mut();
        let drawers_before = drawers.len();
        drawers.retain(|d| d.is_attached());

        let released = (before - panels.len()) + (drawers_before - drawers.len());
        if released > 0 {
            tracing::debug!("Released {} swapped-out behaviors", released);
        }
    }

    fn bind_panels(&self) -> usize {
        // Unnamed panels are numbered by document position, so their storage
        // keys stay stable across reloads and swaps.
        let candidates: Vec<_> = self
            .host
            .query_all(PANEL_SELECTOR)
            .into_iter()
            .filter(|el| is_enabled(el.attribute("data-collapsible").as_deref()))
            .enumerate()
            .filter(|(_, el)| el.attribute(BOUND_ATTRIBUTE).is_none())
            .collect();

        let mut bound = 0;
        for (position, element) in candidates {
            let fallback_id = format!("panel-{}", position + 1);
            let config = PanelConfig::from_element(&element, &self.settings, &fallback_id);
            let panel_id = config.panel_id.clone();

            match PanelController::new(
                self.host.clone(),
                element,
                config,
                &self.storages,
                &self.settings,
            ) {
                Ok(controller) => {
                    controller.initialize();
                    self.panels.borrow_mut().push(controller);
                    bound += 1;
                }
                Err(e) => tracing::warn!("Skipping panel {}: {}", panel_id, e),
            }
        }
        bound
    }

    fn bind_drawers(&self) {
        let candidates: Vec<_> = self
            .host
            .query_all(DRAWER_SELECTOR)
            .into_iter()
            .filter(|el| el.attribute(DRAWER_BOUND_ATTRIBUTE).is_none())
            .collect();

        for element in candidates {
            match Drawer::attach(self.host.clone(), element, &self.settings) {
                Ok(drawer) => self.drawers.borrow_mut().push(drawer),
                Err(e) => tracing::warn!("Skipping drawer: {}", e),
            }
        }
    }

    /// The live controller for `panel_id`. Controllers of swapped-out panels
    /// are never returned, even before the next rescan releases them.
    pub fn panel(&self, panel_id: &str) -> Option<Rc<PanelController<H>>> {
        self.panels
            .borrow()
            .iter()
            .find(|p| p.panel_id() == panel_id && p.is_attached())
            .cloned()
    }

    pub fn panels(&self) -> Vec<Rc<PanelController<H>>> {
        self.panels
            .borrow()
            .iter()
            .filter(|p| p.is_attached())
            .cloned()
            .collect()
    }

    pub fn drawers(&self) -> Vec<Rc<Drawer<H>>> {
        self.drawers
            .borrow()
            .iter()
            .filter(|d| d.is_attached())
            .cloned()
            .collect()
    }

    pub fn theme(&self) -> &Rc<ThemeSwitcher<H>> {
        &self.theme
    }

    pub fn toolbar(&self) -> Option<&Rc<MobileToolbar<H>>> {
        self.toolbar.as_ref()
    }

    pub fn search(&self) -> Option<&Rc<SearchSync<H>>> {
        self.search.as_ref()
    }

    pub fn ordering(&self) -> Option<&Rc<OrderingSync<H>>> {
        self.ordering.as_ref()
    }

    pub fn filter_buttons(&self) -> &Rc<FilterButtons<H>> {
        &self.filter_buttons
    }

    pub fn fullscreen(&self) -> &Rc<FullscreenToggle<H>> {
        &self.fullscreen
    }

    pub fn cards(&self) -> &Rc<CardExpand<H>> {
        &self.cards
    }

    pub fn select_all(&self) -> Option<&Rc<SelectAll<H>>> {
        self.select_all.as_ref()
    }

    pub fn shortcuts(&self) -> &Rc<Shortcuts<H>> {
        &self.shortcuts
    }

    pub fn settings(&self) -> &BehaviorSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemoryHost;

    #[test]
    fn test_bad_panel_does_not_block_others() {
        let host = MemoryHost::new(1280);
        host.body()
            .append("aside")
            .with_id("broken")
            .with_attr("data-collapsible", "true");
        let good = host
            .body()
            .append("aside")
            .with_id("good")
            .with_attr("data-collapsible", "TRUE");
        good.append("button").with_class("sidebar-toggle");
        host.body()
            .append("aside")
            .with_id("off")
            .with_attr("data-collapsible", "false")
            .append("button")
            .with_class("sidebar-toggle");

        let page = Page::attach(host, Storages::in_memory(), BehaviorSettings::default());
        assert_eq!(page.panels().len(), 1);
        assert!(page.panel("good").is_some());
        assert!(page.panel("broken").is_none());
        assert!(page.panel("off").is_none());
    }

    #[test]
    fn test_unnamed_panel_gets_fallback_id() {
        let host = MemoryHost::new(1280);
        host.body()
            .append("aside")
            .with_attr("data-collapsible", "true")
            .append("button")
            .with_class("collapse-toggle");
        let page = Page::attach(host, Storages::in_memory(), BehaviorSettings::default());
        let panel = page.panel("panel-1").unwrap();
        assert_eq!(panel.config().persistence_key, "panel-1Collapsed");
    }
}
