//! Browser entry point.
//!
//! The module's `start` function runs when the WebAssembly module loads. It
//! installs the panic hook and console logging, reads settings from the page
//! and attaches every behavior once the document is parsed.

mod console;
pub mod host;
pub mod storage;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::config::{load_settings, BehaviorSettings};
use crate::dom::{EventKind, Handled, Host, ListenTarget};
use crate::page::Page;

pub use host::{BrowserElement, BrowserHost};
pub use storage::{browser_storages, BrowserStorage};

thread_local! {
    static PAGE: RefCell<Option<Rc<Page<BrowserHost>>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let host = BrowserHost::new()?;

    if host.is_loading() {
        let weak = Rc::downgrade(&host);
        host.listen(
            ListenTarget::Document,
            EventKind::DomReady,
            Box::new(move |_| {
                if let Some(host) = weak.upgrade() {
                    boot(host);
                }
                Handled::Continue
            }),
        );
    } else {
        boot(host);
    }
    Ok(())
}

fn boot(host: Rc<BrowserHost>) {
    if PAGE.with(|page| page.borrow().is_some()) {
        return;
    }

    let loaded = load_settings(&*host);
    let level = loaded
        .as_ref()
        .map_or(tracing::Level::INFO, BehaviorSettings::tracing_level);
    console::init_tracing(level);
    tracing::info!("layout-behaviors {}", crate::VERSION);

    let settings = loaded.unwrap_or_else(|e| {
        tracing::warn!("{:#}, using defaults", e);
        BehaviorSettings::default()
    });

    let page = Page::attach(host, browser_storages(), settings);
    PAGE.with(|slot| *slot.borrow_mut() = Some(page));
}

fn with_page<R>(f: impl FnOnce(&Page<BrowserHost>) -> R) -> Option<R> {
    let page = PAGE.with(|slot| slot.borrow().clone())?;
    Some(f(&page))
}

/// Bind panels and drawers added to the page since the last scan.
#[wasm_bindgen(js_name = rescanPanels)]
pub fn rescan_panels() -> u32 {
    with_page(|page| page.rescan() as u32).unwrap_or(0)
}

/// Toggle a panel by id. Returns false when unknown or in overlay mode.
#[wasm_bindgen(js_name = togglePanel)]
pub fn toggle_panel(panel_id: &str) -> bool {
    with_page(|page| page.panel(panel_id).is_some_and(|panel| panel.toggle())).unwrap_or(false)
}

#[wasm_bindgen(js_name = isPanelCollapsed)]
pub fn is_panel_collapsed(panel_id: &str) -> Option<bool> {
    with_page(|page| page.panel(panel_id).map(|panel| panel.is_collapsed())).flatten()
}

/// Select `light`, `dark` or `auto`.
#[wasm_bindgen(js_name = setTheme)]
pub fn set_theme(theme: &str) -> bool {
    with_page(|page| page.theme().select_named(theme)).unwrap_or(false)
}

/// Clear the filter form and submit it. Returns false without a filter form.
#[wasm_bindgen(js_name = clearAllFilters)]
pub fn clear_all_filters() -> bool {
    with_page(|page| page.filter_buttons().clear()).unwrap_or(false)
}

/// Flip fullscreen mode. Returns the new state, or undefined without a main layout.
#[wasm_bindgen(js_name = toggleFullscreen)]
pub fn toggle_fullscreen() -> Option<bool> {
    with_page(|page| page.fullscreen().toggle()).flatten()
}
