//! Configuration management
//!
//! Page-wide settings come from an optional JSON blob rendered by the server;
//! per-panel settings come from the panel element's attributes.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::breakpoint::Breakpoint;
use crate::dom::{Element, Host};
use crate::storage::PersistenceScope;

/// Id of the `<script type="application/json">` element holding settings overrides.
pub const SETTINGS_ELEMENT_ID: &str = "layout-behaviors-config";

/// Attribute set on a panel once a controller owns it.
pub const BOUND_ATTRIBUTE: &str = "data-panel-bound";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BehaviorSettings {
    #[serde(default = "default_resize_debounce_ms")]
    pub resize_debounce_ms: u32,

    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u32,

    #[serde(default = "default_toolbar_idle_ms")]
    pub toolbar_idle_ms: u32,

    /// Scroll offset (px) below which scrolling down never hides the toolbar.
    #[serde(default = "default_toolbar_hide_offset")]
    pub toolbar_hide_offset: i32,

    /// Distance (px) from the page bottom inside which the idle toolbar stays hidden.
    #[serde(default = "default_toolbar_bottom_margin")]
    pub toolbar_bottom_margin: i32,

    #[serde(default = "default_drawer_focus_delay_ms")]
    pub drawer_focus_delay_ms: u32,

    /// Delay before card text is measured for "Show more" buttons.
    #[serde(default = "default_expand_check_delay_ms")]
    pub expand_check_delay_ms: u32,

    #[serde(default = "default_theme_storage_key")]
    pub theme_storage_key: String,

    #[serde(default)]
    pub default_breakpoint: Breakpoint,

    /// Console log level (`error`, `warn`, `info`, `debug`, `trace`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_resize_debounce_ms() -> u32 {
    150
}

fn default_search_debounce_ms() -> u32 {
    500
}

fn default_toolbar_idle_ms() -> u32 {
    150
}

fn default_toolbar_hide_offset() -> i32 {
    100
}

fn default_toolbar_bottom_margin() -> i32 {
    50
}

fn default_drawer_focus_delay_ms() -> u32 {
    100
}

fn default_expand_check_delay_ms() -> u32 {
    100
}

fn default_theme_storage_key() -> String {
    "theme".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            resize_debounce_ms: default_resize_debounce_ms(),
            search_debounce_ms: default_search_debounce_ms(),
            toolbar_idle_ms: default_toolbar_idle_ms(),
            toolbar_hide_offset: default_toolbar_hide_offset(),
            toolbar_bottom_margin: default_toolbar_bottom_margin(),
            drawer_focus_delay_ms: default_drawer_focus_delay_ms(),
            expand_check_delay_ms: default_expand_check_delay_ms(),
            theme_storage_key: default_theme_storage_key(),
            default_breakpoint: Breakpoint::default(),
            log_level: default_log_level(),
        }
    }
}

impl BehaviorSettings {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Invalid layout behaviors settings JSON")
    }

    /// The configured log level, or `info` when unrecognized.
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

/// Load settings from the page's settings element, or defaults when absent.
pub fn load_settings<H: Host>(host: &H) -> Result<BehaviorSettings> {
    let Some(element) = host.element_by_id(SETTINGS_ELEMENT_ID) else {
        return Ok(BehaviorSettings::default());
    };
    let raw = element.text().unwrap_or_default();
    if raw.trim().is_empty() {
        return Ok(BehaviorSettings::default());
    }
    BehaviorSettings::from_json(&raw)
        .with_context(|| format!("Failed to load settings from #{}", SETTINGS_ELEMENT_ID))
}

// =============================================================================
// PanelConfig
// =============================================================================

/// Toggle selectors tried inside the panel when no explicit or targeted toggle exists.
const FALLBACK_TOGGLE_SELECTORS: &[&str] = &[
    "[data-action=\"toggle-sidebar\"]",
    ".sidebar-toggle",
    ".collapse-toggle",
    ".inner-primary-toggle",
];

/// Declarative configuration of one collapsible panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    pub panel_id: String,
    /// Explicit toggle selector (`data-toggle`), searched document-wide.
    pub toggle_selector: Option<String>,
    pub persistence_key: String,
    pub persistence_scope: PersistenceScope,
    pub responsive: bool,
    pub breakpoint: Breakpoint,
    pub dismissible: bool,
    pub collapsed_class: String,
    pub overlay_class: String,
    pub root_flag: Option<String>,
}

/// True for `data-collapsible` values that enable a panel.
pub fn is_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn parse_bool(value: Option<String>) -> Option<bool> {
    value.map(|v| {
        let v = v.trim();
        v.is_empty() || v.eq_ignore_ascii_case("true") || v == "1"
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl PanelConfig {
    /// Read the configuration from a panel element's attributes.
    ///
    /// `fallback_id` names panels that carry neither `data-panel` nor `id`.
    pub fn from_element<E: Element>(
        element: &E,
        settings: &BehaviorSettings,
        fallback_id: &str,
    ) -> Self {
        let panel_id = non_empty(element.attribute("data-panel"))
            .or_else(|| element.id())
            .unwrap_or_else(|| fallback_id.to_string());

        let breakpoint_attr = non_empty(element.attribute("data-breakpoint"))
            .or_else(|| non_empty(element.attribute("data-sidebar-breakpoint")));
        let breakpoint = match &breakpoint_attr {
            Some(name) => Breakpoint::parse(name).unwrap_or_else(|| {
                tracing::warn!(
                    "Unknown breakpoint {:?} on panel {}, using lg",
                    name,
                    panel_id
                );
                Breakpoint::Lg
            }),
            None => settings.default_breakpoint,
        };
        let responsive =
            parse_bool(element.attribute("data-responsive")).unwrap_or(breakpoint_attr.is_some());

        let persistence_key = non_empty(element.attribute("data-storage-key"))
            .unwrap_or_else(|| format!("{}Collapsed", panel_id));

        Self {
            toggle_selector: non_empty(element.attribute("data-toggle")),
            persistence_key,
            persistence_scope: element
                .attribute("data-storage")
                .map(|s| PersistenceScope::parse(&s))
                .unwrap_or_default(),
            responsive,
            breakpoint,
            dismissible: parse_bool(element.attribute("data-dismissible")).unwrap_or(false),
            collapsed_class: non_empty(element.attribute("data-collapsed-class"))
                .unwrap_or_else(|| "collapsed".to_string()),
            overlay_class: non_empty(element.attribute("data-overlay-class"))
                .unwrap_or_else(|| "show".to_string()),
            root_flag: non_empty(element.attribute("data-root-flag")),
            panel_id,
        }
    }

    /// Locate the toggle control for `panel`.
    pub fn find_toggle<H: Host>(&self, host: &H, panel: &H::Element) -> Option<H::Element> {
        if let Some(selector) = &self.toggle_selector {
            return host.query(selector);
        }
        let targeted = format!(
            "[data-action=\"toggle-sidebar\"][data-target=\"{}\"]",
            self.panel_id
        );
        host.query(&targeted).or_else(|| {
            FALLBACK_TOGGLE_SELECTORS
                .iter()
                .find_map(|selector| panel.query(selector))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemoryHost;

    #[test]
    fn test_settings_defaults() {
        let settings = BehaviorSettings::from_json("{}").unwrap();
        assert_eq!(settings, BehaviorSettings::default());
        assert_eq!(settings.resize_debounce_ms, 150);
        assert_eq!(settings.search_debounce_ms, 500);
        assert_eq!(settings.theme_storage_key, "theme");
        assert_eq!(settings.default_breakpoint, Breakpoint::Lg);
    }

    #[test]
    fn test_settings_partial_override() {
        let settings =
            BehaviorSettings::from_json(r#"{"resize_debounce_ms": 50, "default_breakpoint": "md"}"#)
                .unwrap();
        assert_eq!(settings.resize_debounce_ms, 50);
        assert_eq!(settings.default_breakpoint, Breakpoint::Md);
        assert_eq!(settings.toolbar_hide_offset, 100);
    }

    #[test]
    fn test_tracing_level() {
        let settings = BehaviorSettings::from_json(r#"{"log_level": "debug"}"#).unwrap();
        assert_eq!(settings.tracing_level(), tracing::Level::DEBUG);
        let settings = BehaviorSettings::from_json(r#"{"log_level": "chatty"}"#).unwrap();
        assert_eq!(settings.tracing_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_load_settings_from_page() {
        let host = MemoryHost::new(1280);
        assert_eq!(load_settings(&*host).unwrap(), BehaviorSettings::default());

        host.body()
            .append("script")
            .with_id(SETTINGS_ELEMENT_ID)
            .with_attr("type", "application/json")
            .with_text(r#"{"search_debounce_ms": 250}"#);
        assert_eq!(load_settings(&*host).unwrap().search_debounce_ms, 250);
    }

    #[test]
    fn test_load_settings_rejects_bad_json() {
        let host = MemoryHost::new(1280);
        host.body()
            .append("script")
            .with_id(SETTINGS_ELEMENT_ID)
            .with_text("{not json");
        let err = load_settings(&*host).unwrap_err();
        assert!(err.to_string().contains(SETTINGS_ELEMENT_ID));
    }

    #[test]
    fn test_panel_config_defaults() {
        let host = MemoryHost::new(1280);
        let panel = host
            .body()
            .append("aside")
            .with_id("sidebarLeft")
            .with_attr("data-collapsible", "True");
        let config = PanelConfig::from_element(&panel, &BehaviorSettings::default(), "panel-0");
        assert_eq!(config.panel_id, "sidebarLeft");
        assert_eq!(config.persistence_key, "sidebarLeftCollapsed");
        assert_eq!(config.persistence_scope, PersistenceScope::Permanent);
        assert!(!config.responsive);
        assert_eq!(config.breakpoint, Breakpoint::Lg);
        assert_eq!(config.collapsed_class, "collapsed");
        assert_eq!(config.overlay_class, "show");
        assert!(!config.dismissible);
        assert!(config.root_flag.is_none());
        assert!(is_enabled(panel.attribute("data-collapsible").as_deref()));
    }

    #[test]
    fn test_panel_config_from_attributes() {
        let host = MemoryHost::new(1280);
        let panel = host
            .body()
            .append("aside")
            .with_attr("data-panel", "inner")
            .with_attr("data-sidebar-breakpoint", "md")
            .with_attr("data-storage", "session")
            .with_attr("data-storage-key", "innerLayoutSidebarCollapsed")
            .with_attr("data-dismissible", "")
            .with_attr("data-root-flag", "data-page-sidebar-collapsed");
        let config = PanelConfig::from_element(&panel, &BehaviorSettings::default(), "panel-3");
        assert_eq!(config.panel_id, "inner");
        assert!(config.responsive);
        assert_eq!(config.breakpoint, Breakpoint::Md);
        assert_eq!(config.persistence_scope, PersistenceScope::Session);
        assert_eq!(config.persistence_key, "innerLayoutSidebarCollapsed");
        assert!(config.dismissible);
        assert_eq!(config.root_flag.as_deref(), Some("data-page-sidebar-collapsed"));
    }

    #[test]
    fn test_panel_config_unknown_breakpoint_and_fallback_id() {
        let host = MemoryHost::new(1280);
        let panel = host
            .body()
            .append("aside")
            .with_attr("data-breakpoint", "giant")
            .with_attr("data-responsive", "false");
        let config = PanelConfig::from_element(&panel, &BehaviorSettings::default(), "panel-7");
        assert_eq!(config.panel_id, "panel-7");
        assert_eq!(config.breakpoint, Breakpoint::Lg);
        assert!(!config.responsive);
    }

    #[test]
    fn test_find_toggle_order() {
        let host = MemoryHost::new(1280);
        let body = host.body();
        let panel = body.append("aside").with_id("right");
        let inner = panel.append("button").with_class("sidebar-toggle");
        let settings = BehaviorSettings::default();

        let config = PanelConfig::from_element(&panel, &settings, "p");
        assert_eq!(config.find_toggle(&*host, &panel), Some(inner.clone()));

        let targeted = body
            .append("button")
            .with_attr("data-action", "toggle-sidebar")
            .with_attr("data-target", "right");
        assert_eq!(config.find_toggle(&*host, &panel), Some(targeted));

        let explicit = body.append("a").with_id("open-right");
        panel.set_attribute("data-toggle", "#open-right");
        let config = PanelConfig::from_element(&panel, &settings, "p");
        assert_eq!(config.find_toggle(&*host, &panel), Some(explicit));
    }
}
