//! Layout Behaviors - Rust Implementation
//!
//! Client-side behaviors for server-rendered dashboard layouts, compiled to
//! WebAssembly and driven by `data-*` attributes in the markup.
//!
//! This library provides:
//! - Collapsible panels with persisted state and responsive overlay mode
//! - Light/dark/auto theme switching
//! - Auto-hiding mobile toolbar
//! - Search field and ordering synchronization for list views
//! - Filter reset, tag filters, fullscreen mode and expandable card text
//! - Table select-all, slide-in drawers and keyboard shortcuts
//!
//! Behaviors talk to the page through the [`dom::Host`] trait. The browser
//! implementation lives in `web` (wasm32 only); `dom::memory` (feature
//! `testing`) provides an in-memory document for tests.

pub mod breakpoint;
pub mod cards;
pub mod config;
pub mod debounce;
pub mod dom;
pub mod drawer;
pub mod error;
pub mod events;
pub mod filters;
pub mod fullscreen;
pub mod outside;
pub mod page;
pub mod panel;
pub mod selection;
pub mod shortcuts;
pub mod storage;
pub mod theme;
pub mod toolbar;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use breakpoint::{is_below_breakpoint, Breakpoint};
pub use config::{BehaviorSettings, PanelConfig};
pub use error::BehaviorError;
pub use events::UiEvent;
pub use page::Page;
pub use panel::PanelController;

/// Version string baked in at build time.
pub const VERSION: &str = env!("LAYOUT_BEHAVIORS_VERSION");
