//! Named viewport breakpoints.
//!
//! Panels marked responsive switch to overlay mode when the viewport is
//! narrower than their breakpoint.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Sm,
    Md,
    #[default]
    Lg,
    Xl,
    Xxl,
}

impl Breakpoint {
    pub const ALL: [Breakpoint; 5] = [
        Breakpoint::Sm,
        Breakpoint::Md,
        Breakpoint::Lg,
        Breakpoint::Xl,
        Breakpoint::Xxl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Breakpoint::Sm => "sm",
            Breakpoint::Md => "md",
            Breakpoint::Lg => "lg",
            Breakpoint::Xl => "xl",
            Breakpoint::Xxl => "xxl",
        }
    }

    /// Minimum viewport width (px) at which the panel is in-flow.
    pub fn min_width(&self) -> u32 {
        match self {
            Breakpoint::Sm => 576,
            Breakpoint::Md => 768,
            Breakpoint::Lg => 992,
            Breakpoint::Xl => 1200,
            Breakpoint::Xxl => 1400,
        }
    }

    /// Parse a breakpoint name. Returns None for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sm" => Some(Breakpoint::Sm),
            "md" => Some(Breakpoint::Md),
            "lg" => Some(Breakpoint::Lg),
            "xl" => Some(Breakpoint::Xl),
            "xxl" => Some(Breakpoint::Xxl),
            _ => None,
        }
    }

    pub fn is_below(&self, width: u32) -> bool {
        width < self.min_width()
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// True when `width` is strictly narrower than the named breakpoint.
/// Unknown names fall back to `lg`.
pub fn is_below_breakpoint(width: u32, name: &str) -> bool {
    Breakpoint::parse(name).unwrap_or_default().is_below(width)
}
