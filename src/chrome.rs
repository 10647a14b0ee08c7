//! Navigation toggle, sticky header and nav auto-close.
//!
//! The only state lives in the document: the nav's `open` class, the header's
//! `scrolled` class and the trigger's `aria-expanded` attribute.

use crate::dom::{Document, NodeId};
use crate::logging::{self, obj, v_num, v_str, Domain};

pub const OPEN_CLASS: &str = "open";
pub const SCROLLED_CLASS: &str = "scrolled";
pub const ARIA_EXPANDED: &str = "aria-expanded";

#[derive(Debug, Clone)]
pub struct ChromeController {
    header: NodeId,
    burger: NodeId,
    nav: NodeId,
    sticky_threshold: f64,
}

impl ChromeController {
    pub fn new(header: NodeId, burger: NodeId, nav: NodeId, sticky_threshold: f64) -> Self {
        logging::debug(
            Domain::Chrome,
            "wired",
            obj(&[("sticky_threshold", v_num(sticky_threshold))]),
        );
        Self {
            header,
            burger,
            nav,
            sticky_threshold,
        }
    }

    pub fn header(&self) -> NodeId {
        self.header
    }

    pub fn burger(&self) -> NodeId {
        self.burger
    }

    pub fn nav(&self) -> NodeId {
        self.nav
    }

    pub fn is_nav_open(&self, doc: &Document) -> bool {
        doc.has_class(self.nav, OPEN_CLASS)
    }

    pub fn is_header_scrolled(&self, doc: &Document) -> bool {
        doc.has_class(self.header, SCROLLED_CLASS)
    }

    /// Route a click to both listeners. Returns the nav's open state if it changed.
    pub fn on_click(&self, doc: &mut Document, target: NodeId) -> Option<bool> {
        let mut changed = None;
        if doc.contains(self.burger, target) {
            changed = Some(self.toggle_nav(doc));
        }
        if doc.contains(self.nav, target) && self.close_on_link(doc, target) {
            changed = Some(false);
        }
        changed
    }

    fn toggle_nav(&self, doc: &mut Document) -> bool {
        let open = doc.toggle_class(self.nav, OPEN_CLASS);
        doc.set_attribute(self.burger, ARIA_EXPANDED, if open { "true" } else { "false" });
        logging::debug(
            Domain::Chrome,
            "nav_toggle",
            obj(&[("open", v_str(if open { "true" } else { "false" }))]),
        );
        open
    }

    fn close_on_link(&self, doc: &mut Document, target: NodeId) -> bool {
        if doc.tag(target) != "a" || !self.is_nav_open(doc) {
            return false;
        }
        doc.remove_class(self.nav, OPEN_CLASS);
        doc.set_attribute(self.burger, ARIA_EXPANDED, "false");
        logging::debug(Domain::Chrome, "nav_auto_close", obj(&[]));
        true
    }

    /// Returns whether the header is marked scrolled after this offset.
    pub fn on_scroll(&self, doc: &mut Document, scroll_y: f64) -> bool {
        let scrolled = scroll_y > self.sticky_threshold;
        if scrolled {
            doc.add_class(self.header, SCROLLED_CLASS);
        } else {
            doc.remove_class(self.header, SCROLLED_CLASS);
        }
        scrolled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        doc: Document,
        chrome: ChromeController,
        link: NodeId,
        label: NodeId,
        icon: NodeId,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let root = doc.root();
        let header = doc.create_element("header");
        let burger = doc.create_element("button");
        doc.set_attribute(burger, ARIA_EXPANDED, "false");
        let icon = doc.create_element("span");
        doc.append_child(burger, icon);
        let nav = doc.create_element("nav");
        let link = doc.create_element_with("a", None, "Stats");
        let label = doc.create_element_with("span", None, "Menu");
        doc.append(nav, &[link, label]);
        doc.append(header, &[burger, nav]);
        doc.append_child(root, header);
        let chrome = ChromeController::new(header, burger, nav, 10.0);
        Fixture {
            doc,
            chrome,
            link,
            label,
            icon,
        }
    }

    #[test]
    fn test_burger_toggles_and_mirrors_aria() {
        let mut f = fixture();
        let burger = f.chrome.burger();
        assert_eq!(f.chrome.on_click(&mut f.doc, burger), Some(true));
        assert!(f.chrome.is_nav_open(&f.doc));
        assert_eq!(f.doc.attribute(burger, ARIA_EXPANDED).as_deref(), Some("true"));
        assert_eq!(f.chrome.on_click(&mut f.doc, burger), Some(false));
        assert_eq!(f.doc.attribute(burger, ARIA_EXPANDED).as_deref(), Some("false"));
    }

    #[test]
    fn test_click_inside_burger_bubbles() {
        let mut f = fixture();
        let icon = f.icon;
        assert_eq!(f.chrome.on_click(&mut f.doc, icon), Some(true));
    }

    #[test]
    fn test_link_click_closes_open_nav() {
        let mut f = fixture();
        let burger = f.chrome.burger();
        let link = f.link;
        f.chrome.on_click(&mut f.doc, burger);
        assert_eq!(f.chrome.on_click(&mut f.doc, link), Some(false));
        assert!(!f.chrome.is_nav_open(&f.doc));
        assert_eq!(f.doc.attribute(burger, ARIA_EXPANDED).as_deref(), Some("false"));
    }

    #[test]
    fn test_non_link_or_closed_nav_is_ignored() {
        let mut f = fixture();
        let burger = f.chrome.burger();
        let (link, label) = (f.link, f.label);
        assert_eq!(f.chrome.on_click(&mut f.doc, link), None);
        f.chrome.on_click(&mut f.doc, burger);
        assert_eq!(f.chrome.on_click(&mut f.doc, label), None);
        assert!(f.chrome.is_nav_open(&f.doc));
    }

    #[test]
    fn test_sticky_header_threshold() {
        let mut f = fixture();
        assert!(!f.chrome.on_scroll(&mut f.doc, 5.0));
        assert!(!f.chrome.is_header_scrolled(&f.doc));
        assert!(f.chrome.on_scroll(&mut f.doc, 15.0));
        assert!(f.chrome.is_header_scrolled(&f.doc));
        assert!(!f.chrome.on_scroll(&mut f.doc, 10.0));
        assert!(!f.chrome.is_header_scrolled(&f.doc));
    }
}
