//! Custom events published to other page scripts.
//!
//! Each variant maps to a bubbling DOM `CustomEvent` whose `detail` is the
//! variant's fields as a plain JSON object.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum UiEvent {
    Initialized { panel: String, collapsed: bool },
    Collapsed { panel: String },
    Expanded { panel: String },
    OverlayEntered { panel: String },
    OverlayExited { panel: String },
    Dismissed { panel: String },
    ThemeChanged { theme: String, resolved: String },
}

impl UiEvent {
    /// DOM event name listeners subscribe to.
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::Initialized { .. } => "panel:initialized",
            UiEvent::Collapsed { .. } => "panel:collapsed",
            UiEvent::Expanded { .. } => "panel:expanded",
            UiEvent::OverlayEntered { .. } => "panel:overlay-entered",
            UiEvent::OverlayExited { .. } => "panel:overlay-exited",
            UiEvent::Dismissed { .. } => "panel:dismissed",
            UiEvent::ThemeChanged { .. } => "theme:changed",
        }
    }

    /// Event detail as a JSON object.
    pub fn detail(&self) -> serde_json::Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|mut v| v.get_mut("detail").map(serde_json::Value::take))
            .unwrap_or(serde_json::Value::Null)
    }

    /// Panel identifier for panel events.
    pub fn panel(&self) -> Option<&str> {
        match self {
            UiEvent::Initialized { panel, .. }
            | UiEvent::Collapsed { panel }
            | UiEvent::Expanded { panel }
            | UiEvent::OverlayEntered { panel }
            | UiEvent::OverlayExited { panel }
            | UiEvent::Dismissed { panel } => Some(panel),
            UiEvent::ThemeChanged { .. } => None,
        }
    }

    /// Collapsed or expanded, depending on the new state.
    pub fn state_change(panel: &str, collapsed: bool) -> Self {
        let panel = panel.to_string();
        if collapsed {
            UiEvent::Collapsed { panel }
        } else {
            UiEvent::Expanded { panel }
        }
    }
}
