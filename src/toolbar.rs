//! Mobile toolbar that hides while scrolling down and returns on scroll up.

use std::cell::Cell;
use std::rc::Rc;

use crate::config::BehaviorSettings;
use crate::debounce::Debouncer;
use crate::dom::{Element, EventKind, Handled, Host, ListenTarget};

const TOOLBAR_SELECTOR: &str = ".mobile-toolbar.sticky";
const VISIBLE_CLASS: &str = "show";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Show,
    Hide,
    Keep,
}

/// Decide visibility from the new scroll offset and the previous one.
pub fn visibility_for(top: i32, last_top: i32, hide_offset: i32) -> Visibility {
    let delta = top - last_top;
    if top <= 0 {
        Visibility::Show
    } else if delta > 0 && top > hide_offset {
        Visibility::Hide
    } else if delta < 0 {
        Visibility::Show
    } else {
        Visibility::Keep
    }
}

/// Whether the toolbar comes back once scrolling stops at `top`: not at the
/// very top (already shown) and not near the bottom of the page.
pub fn show_when_idle(top: i32, viewport_height: u32, scroll_height: i32, bottom_margin: i32) -> bool {
    top > 0 && (viewport_height as i32 + top) < scroll_height - bottom_margin
}

pub struct MobileToolbar<H: Host> {
    host: Rc<H>,
    toolbar: H::Element,
    last_top: Cell<i32>,
    ticking: Cell<bool>,
    idle: Debouncer<H>,
    hide_offset: i32,
    bottom_margin: i32,
}

impl<H: Host> MobileToolbar<H> {
    /// Attach to the page's sticky mobile toolbar, if there is one.
    pub fn attach(host: Rc<H>, settings: &BehaviorSettings) -> Option<Rc<Self>> {
        let toolbar = host.query(TOOLBAR_SELECTOR)?;
        toolbar.add_class("animated");
        toolbar.add_class(VISIBLE_CLASS);

        let this = Rc::new(Self {
            idle: Debouncer::new(host.clone(), settings.toolbar_idle_ms),
            last_top: Cell::new(host.scroll_top()),
            host,
            toolbar,
            ticking: Cell::new(false),
            hide_offset: settings.toolbar_hide_offset,
            bottom_margin: settings.toolbar_bottom_margin,
        });

        let weak = Rc::downgrade(&this);
        this.host.listen(
            ListenTarget::Window,
            EventKind::Scroll,
            Box::new(move |_| {
                if let Some(this) = weak.upgrade() {
                    this.request_update();
                }
                Handled::Continue
            }),
        );
        Some(this)
    }

    pub fn is_visible(&self) -> bool {
        self.toolbar.has_class(VISIBLE_CLASS)
    }

    /// Coalesce scroll events into one update per animation frame.
    fn request_update(self: &Rc<Self>) {
        if self.ticking.replace(true) {
            return;
        }
        let weak = Rc::downgrade(self);
        self.host.request_animation_frame(Box::new(move || {
            if let Some(this) = weak.upgrade() {
                this.update();
            }
        }));
    }

    fn update(&self) {
        let top = self.host.scroll_top();
        match visibility_for(top, self.last_top.get(), self.hide_offset) {
            Visibility::Show => self.toolbar.add_class(VISIBLE_CLASS),
            Visibility::Hide => self.toolbar.remove_class(VISIBLE_CLASS),
            Visibility::Keep => {}
        }

        let host = self.host.clone();
        let toolbar = self.toolbar.clone();
        let margin = self.bottom_margin;
        self.idle.schedule(move || {
            if show_when_idle(top, host.viewport_height(), host.scroll_height(), margin) {
                toolbar.add_class(VISIBLE_CLASS);
            }
        });

        self.last_top.set(top);
        self.ticking.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemoryHost;

    #[test]
    fn test_visibility_rules() {
        assert_eq!(visibility_for(0, 200, 100), Visibility::Show);
        assert_eq!(visibility_for(150, 120, 100), Visibility::Hide);
        assert_eq!(visibility_for(80, 40, 100), Visibility::Keep);
        assert_eq!(visibility_for(300, 400, 100), Visibility::Show);
        assert_eq!(visibility_for(300, 300, 100), Visibility::Keep);
    }

    #[test]
    fn test_idle_rule() {
        assert!(show_when_idle(500, 800, 3000, 50));
        assert!(!show_when_idle(0, 800, 3000, 50));
        assert!(!show_when_idle(2160, 800, 3000, 50));
    }

    #[test]
    fn test_toolbar_hides_then_returns_when_idle() {
        let host = MemoryHost::new(400);
        host.set_page_height(800, 4000);
        let toolbar = host.body().append("nav").with_class("mobile-toolbar sticky");
        let bar = MobileToolbar::attach(host.clone(), &BehaviorSettings::default()).unwrap();
        assert!(toolbar.has_class("animated"));
        assert!(bar.is_visible());

        host.scroll_to(300);
        host.scroll_to(320);
        assert_eq!(host.pending_frames(), 1, "scroll events share one frame");
        host.run_animation_frames();
        assert!(!bar.is_visible());

        host.advance(149);
        assert!(!bar.is_visible());
        host.advance(1);
        assert!(bar.is_visible());
    }

    #[test]
    fn test_toolbar_stays_hidden_near_bottom() {
        let host = MemoryHost::new(400);
        host.set_page_height(800, 1200);
        host.body().append("nav").with_class("mobile-toolbar sticky");
        let bar = MobileToolbar::attach(host.clone(), &BehaviorSettings::default()).unwrap();

        host.scroll_to(380);
        host.run_animation_frames();
        assert!(!bar.is_visible());
        host.advance(500);
        assert!(!bar.is_visible());

        host.scroll_to(200);
        host.run_animation_frames();
        assert!(bar.is_visible());
    }

    #[test]
    fn test_attach_without_toolbar() {
        let host = MemoryHost::new(400);
        host.body().append("nav").with_class("mobile-toolbar");
        assert!(MobileToolbar::attach(host, &BehaviorSettings::default()).is_none());
    }
}
