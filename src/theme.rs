//! Theme management with localStorage persistence.
//!
//! Handles the theme switcher dropdown (light/dark/auto) and the simple
//! light/dark toggle buttons. The selected theme is written to the root
//! element's `data-bs-theme` attribute; `auto` follows the system preference.

use std::cell::Cell;
use std::rc::Rc;

use crate::dom::{Element, EventKind, Handled, Host, ListenTarget};
use crate::events::UiEvent;
use crate::storage::Preference;

/// Attribute on the root element carrying the resolved theme.
pub const THEME_ATTRIBUTE: &str = "data-bs-theme";

const SWITCHER_SELECTOR: &str = "[data-theme-switcher=\"true\"]";
const TOGGLE_SELECTOR: &str = "#themeToggle, #mobileThemeToggle, [data-action=\"toggle-theme\"]";
const NAVBAR_ICON_SELECTOR: &str = ".nav-link i, .nav-link svg";
const NAVBAR_ICON_CLASSES: [&str; 3] = ["bi-sun", "bi-moon-stars-fill", "bi-circle-half"];

/// Theme options
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Auto,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }

    /// Parse a stored or attribute value. Unknown values are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "auto" => Some(Theme::Auto),
            _ => None,
        }
    }

    /// The concrete theme to render, given the system preference.
    pub fn resolve(&self, prefers_dark: bool) -> Theme {
        match self {
            Theme::Auto if prefers_dark => Theme::Dark,
            Theme::Auto => Theme::Light,
            other => *other,
        }
    }

    /// Icon class shown in the navbar for this selection.
    pub fn navbar_icon(&self, resolved: Theme) -> &'static str {
        match (self, resolved) {
            (Theme::Auto, _) => "bi-circle-half",
            (_, Theme::Dark) => "bi-moon-stars-fill",
            _ => "bi-sun",
        }
    }

    /// The opposite concrete theme, for two-state toggle buttons.
    pub fn flipped(&self, prefers_dark: bool) -> Theme {
        match self.resolve(prefers_dark) {
            Theme::Dark => Theme::Light,
            _ => Theme::Dark,
        }
    }
}

/// Page-wide theme state.
pub struct ThemeSwitcher<H: Host> {
    host: Rc<H>,
    preference: Preference,
    current: Cell<Theme>,
}

impl<H: Host> ThemeSwitcher<H> {
    pub fn new(host: Rc<H>, preference: Preference) -> Rc<Self> {
        Rc::new(Self {
            host,
            preference,
            current: Cell::new(Theme::default()),
        })
    }

    /// Get current theme
    pub fn get(&self) -> Theme {
        self.current.get()
    }

    /// Stored theme, or light when missing, invalid or unreadable.
    pub fn stored(&self) -> Theme {
        self.preference
            .load()
            .and_then(|v| Theme::parse(&v))
            .unwrap_or_default()
    }

    /// Apply the stored theme and attach listeners.
    pub fn initialize(self: &Rc<Self>) {
        self.apply(self.stored());

        match self.host.query(SWITCHER_SELECTOR) {
            Some(switcher) => {
                for option in switcher.query_all("[data-theme]") {
                    let weak = Rc::downgrade(self);
                    let value = option.attribute("data-theme").unwrap_or_default();
                    self.host.listen(
                        ListenTarget::Element(option),
                        EventKind::Click,
                        Box::new(move |_| {
                            if let Some(this) = weak.upgrade() {
                                this.select_named(&value);
                            }
                            Handled::PreventDefault
                        }),
                    );
                }
            }
            None => tracing::warn!("Theme switcher not found on page"),
        }

        for button in self.host.query_all(TOGGLE_SELECTOR) {
            let weak = Rc::downgrade(self);
            self.host.listen(
                ListenTarget::Element(button),
                EventKind::Click,
                Box::new(move |_| {
                    if let Some(this) = weak.upgrade() {
                        this.toggle();
                    }
                    Handled::PreventDefault
                }),
            );
        }

        let weak = Rc::downgrade(self);
        self.host.listen(
            ListenTarget::Window,
            EventKind::ColorSchemeChange,
            Box::new(move |_| {
                if let Some(this) = weak.upgrade() {
                    this.handle_system_change();
                }
                Handled::Continue
            }),
        );
    }

    /// Set and persist theme
    pub fn set(&self, theme: Theme) {
        self.apply(theme);
        self.preference.store(theme.as_str());
    }

    /// Select a theme by its attribute value. Unknown names are logged and ignored.
    pub fn select_named(&self, name: &str) -> bool {
        match Theme::parse(name) {
            Some(theme) => {
                self.set(theme);
                true
            }
            None => {
                tracing::error!("Invalid theme: {:?}", name);
                false
            }
        }
    }

    /// Flip between light and dark.
    pub fn toggle(&self) {
        let next = self.get().flipped(self.host.prefers_dark());
        self.set(next);
    }

    /// Re-apply when following the system preference.
    pub fn handle_system_change(&self) {
        if self.stored() == Theme::Auto || self.get() == Theme::Auto {
            self.apply(Theme::Auto);
        }
    }

    fn apply(&self, theme: Theme) {
        self.current.set(theme);
        let resolved = theme.resolve(self.host.prefers_dark());
        self.host
            .root()
            .set_attribute(THEME_ATTRIBUTE, resolved.as_str());

        self.update_indicators(theme, resolved);
        self.update_toggle_icons(resolved);

        tracing::debug!("Applied theme {} ({})", theme.as_str(), resolved.as_str());
        self.host.dispatch(
            &self.host.root(),
            &UiEvent::ThemeChanged {
                theme: theme.as_str().to_string(),
                resolved: resolved.as_str().to_string(),
            },
        );
    }

    fn update_indicators(&self, theme: Theme, resolved: Theme) {
        let Some(switcher) = self.host.query(SWITCHER_SELECTOR) else {
            return;
        };

        for option in switcher.query_all("[data-theme]") {
            let active = option.attribute("data-theme").as_deref() == Some(theme.as_str());
            option.toggle_class("active", active);

            // The last icon is the checkmark; the first is the theme's own icon.
            let icons = option.query_all("i, svg");
            if icons.len() >= 2 {
                if let Some(check) = icons.last() {
                    check.set_style("display", if active { "inline" } else { "none" });
                }
            }
        }

        if let Some(icon) = switcher.query(NAVBAR_ICON_SELECTOR) {
            for class in NAVBAR_ICON_CLASSES {
                icon.remove_class(class);
            }
            icon.add_class(theme.navbar_icon(resolved));
        }
    }

    fn update_toggle_icons(&self, resolved: Theme) {
        let glyph = match resolved {
            Theme::Dark => "bi-moon-fill",
            _ => "bi-sun-fill",
        };
        if let Some(icon) = self.host.element_by_id("themeIcon") {
            icon.set_attribute("class", &format!("bi {}", glyph));
        }
        if let Some(icon) = self.host.element_by_id("mobileThemeIcon") {
            icon.set_attribute("class", &format!("bi {} me-2", glyph));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("auto"), Some(Theme::Auto));
        assert_eq!(Theme::parse("oled"), None);
        assert_eq!(Theme::parse("Dark"), None);
    }

    #[test]
    fn test_resolve_auto() {
        assert_eq!(Theme::Auto.resolve(true), Theme::Dark);
        assert_eq!(Theme::Auto.resolve(false), Theme::Light);
        assert_eq!(Theme::Light.resolve(true), Theme::Light);
    }

    #[test]
    fn test_navbar_icon() {
        assert_eq!(Theme::Auto.navbar_icon(Theme::Dark), "bi-circle-half");
        assert_eq!(Theme::Dark.navbar_icon(Theme::Dark), "bi-moon-stars-fill");
        assert_eq!(Theme::Light.navbar_icon(Theme::Light), "bi-sun");
    }

    #[test]
    fn test_flipped_uses_resolved_theme() {
        assert_eq!(Theme::Light.flipped(false), Theme::Dark);
        assert_eq!(Theme::Dark.flipped(false), Theme::Light);
        assert_eq!(Theme::Auto.flipped(true), Theme::Light);
        assert_eq!(Theme::Auto.flipped(false), Theme::Dark);
    }
}
