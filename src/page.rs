//! Page orchestration.
//!
//! Construction resolves every page role and wires the chrome; loading is a
//! separate step, so chrome events can be dispatched while a load is pending.

use std::fmt;

use crate::chrome::ChromeController;
use crate::config::Config;
use crate::counter::{Animator, Clock};
use crate::dom::{Document, NodeId};
use crate::loader::{DataLoader, LoadOutcome};
use crate::logging::{self, obj, v_num, v_str, Domain};
use crate::model::ProfileDocument;
use crate::render::{plan_identity, HighlightRenderer, StatRenderer};
use crate::visibility::Viewport;

/// A page role whose selector matched nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTarget {
    pub role: &'static str,
    pub selector: String,
}

impl fmt::Display for MissingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page has no {} element ({})", self.role, self.selector)
    }
}

impl std::error::Error for MissingTarget {}

fn resolve(doc: &Document, role: &'static str, selector: &str) -> Result<NodeId, MissingTarget> {
    doc.query(selector).ok_or_else(|| MissingTarget {
        role,
        selector: selector.to_string(),
    })
}

#[derive(Debug, Clone, Copy)]
struct IdentityTargets {
    photo: NodeId,
    name: NodeId,
    tagline: NodeId,
    note: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageEvent {
    Click(NodeId),
    Scroll(f64),
    Resize(f64),
    /// A display refresh opportunity.
    Frame,
}

pub struct Page {
    doc: Document,
    config: Config,
    chrome: ChromeController,
    stats: StatRenderer,
    highlights: HighlightRenderer,
    identity: IdentityTargets,
    animator: Animator,
    viewport: Viewport,
}

impl Page {
    pub fn new(doc: Document, config: Config) -> Result<Self, MissingTarget> {
        let sel = &config.selectors;
        let chrome = ChromeController::new(
            resolve(&doc, "header", &sel.header)?,
            resolve(&doc, "nav toggle", &sel.burger)?,
            resolve(&doc, "nav", &sel.nav)?,
            config.sticky_threshold,
        );
        let stats = StatRenderer::new(resolve(&doc, "stats", &sel.stats)?, config.reveal_threshold);
        let highlights = HighlightRenderer::new(resolve(&doc, "highlights grid", &sel.highlights_grid)?);
        let identity = IdentityTargets {
            photo: resolve(&doc, "player photo", &sel.player_photo)?,
            name: resolve(&doc, "player name", &sel.player_name)?,
            tagline: resolve(&doc, "player tagline", &sel.player_tagline)?,
            note: resolve(&doc, "player note", &sel.player_note)?,
        };
        let animator = Animator::new(config.counter_duration_ms);
        let viewport = Viewport::new(config.viewport_height);
        logging::info(Domain::Page, "ready", obj(&[("data_url", v_str(&config.data_url))]));
        Ok(Self {
            doc,
            config,
            chrome,
            stats,
            highlights,
            identity,
            animator,
            viewport,
        })
    }

    /// Load the profile and populate the page when it arrives. The clock is
    /// read once the load settles, so counters already in view start then.
    pub async fn init(&mut self, loader: &DataLoader, clock: &dyn Clock) -> LoadOutcome {
        let outcome = loader.load(&self.config.data_url).await;
        self.apply(&outcome, clock.now_ms());
        outcome
    }

    /// Returns whether the page was populated. An absent document leaves the
    /// static shell untouched.
    pub fn apply(&mut self, outcome: &LoadOutcome, now_ms: f64) -> bool {
        match &outcome.document {
            Some(profile) => {
                self.populate(profile, now_ms);
                true
            }
            None => {
                logging::info(
                    Domain::Page,
                    "static_shell",
                    obj(&[("location", v_str(&outcome.location))]),
                );
                false
            }
        }
    }

    /// Write identity and cards, then lay out and take the observer's initial
    /// measurement: stat numbers already in view start counting at `now_ms`.
    pub fn populate(&mut self, profile: &ProfileDocument, now_ms: f64) {
        let identity = plan_identity(profile);
        let t = self.identity;
        self.doc.set_text(t.name, &identity.name);
        self.doc.set_text(t.tagline, &identity.tagline);
        self.doc.set_text(t.note, &identity.note);
        self.doc.set_attribute(t.photo, "src", &identity.photo);

        self.stats.render(&mut self.doc, &profile.stats);
        self.highlights.render(&mut self.doc, &profile.highlights);
        logging::info(
            Domain::Page,
            "populated",
            obj(&[
                ("stats", v_num(profile.stats.len() as f64)),
                ("highlights", v_num(profile.highlights.len() as f64)),
            ]),
        );
        self.layout();
        self.refresh_visibility(now_ms);
    }

    /// Lay the document out; returns its height.
    pub fn layout(&mut self) -> f64 {
        self.doc.layout(self.config.block_height)
    }

    pub fn dispatch(&mut self, event: PageEvent, now_ms: f64) {
        match event {
            PageEvent::Click(target) => {
                self.chrome.on_click(&mut self.doc, target);
            }
            PageEvent::Scroll(y) => {
                self.viewport.scroll_y = y;
                self.chrome.on_scroll(&mut self.doc, y);
                self.refresh_visibility(now_ms);
            }
            PageEvent::Resize(height) => {
                self.viewport.height = height;
                self.refresh_visibility(now_ms);
            }
            PageEvent::Frame => {
                self.animator.tick(&mut self.doc, now_ms);
            }
        }
    }

    /// Re-measure observed stat numbers against the current viewport.
    pub fn refresh_visibility(&mut self, now_ms: f64) -> Vec<NodeId> {
        self.stats
            .reveal(&self.doc, self.viewport, &mut self.animator, now_ms)
    }

    /// No counter is running.
    pub fn is_settled(&self) -> bool {
        self.animator.is_idle()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn chrome(&self) -> &ChromeController {
        &self.chrome
    }

    pub fn stats(&self) -> &StatRenderer {
        &self.stats
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn html(&self) -> String {
        self.doc.html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HighlightEntry, StatEntry};
    use crate::shell;

    fn page() -> Page {
        let config = Config::default();
        Page::new(shell::document(), config).unwrap()
    }

    fn profile() -> ProfileDocument {
        ProfileDocument {
            name: Some("Ada Striker".into()),
            tagline: Some("Forward · FC Example".into()),
            note: Some("Captain since 2021".into()),
            photo: Some("img/ada.jpg".into()),
            stats: vec![
                StatEntry::new(1200.0, Some("+"), "Goals"),
                StatEntry::new(0.0, None, "Red cards"),
            ],
            highlights: vec![HighlightEntry {
                title: Some("Golden Boot".into()),
                text: Some("Top scorer three seasons running.".into()),
            }],
        }
    }

    #[test]
    fn test_missing_role_fails_fast() {
        let config = Config::default();
        let mut sel = config.selectors.clone();
        sel.stats = "#nowhere".into();
        let doc = shell::document();
        let err = Page::new(doc, Config { selectors: sel, ..config }).err().unwrap();
        assert_eq!(err.role, "stats");
        assert_eq!(err.selector, "#nowhere");
    }

    #[test]
    fn test_invalid_role_selector_is_missing() {
        let config = Config::default();
        let mut sel = config.selectors.clone();
        sel.nav = "nav[".into();
        let err = Page::new(shell::document(), Config { selectors: sel, ..config })
            .err()
            .unwrap();
        assert_eq!(err.role, "nav");
    }

    #[test]
    fn test_roles_resolve_through_complex_selectors() {
        let config = Config::default();
        let mut sel = config.selectors.clone();
        sel.header = "body > header".into();
        sel.burger = "header button[aria-controls='main-nav']".into();
        sel.nav = "header nav".into();
        sel.stats = "#stats-section .stats".into();
        sel.player_name = "section.hero h1".into();
        let mut p = Page::new(shell::document(), Config { selectors: sel, ..config }).unwrap();
        let burger = p.chrome().burger();
        assert_eq!(p.document().attribute(burger, "id").as_deref(), Some("burger"));
        p.dispatch(PageEvent::Click(burger), 0.0);
        assert!(p.chrome().is_nav_open(p.document()));
        assert_eq!(p.document().attribute(p.stats().container(), "id").as_deref(), Some("stats"));
    }

    #[test]
    fn test_populate_sets_identity() {
        let mut p = page();
        p.populate(&profile(), 0.0);
        let doc = p.document();
        let name = doc.query("#player-name").unwrap();
        let photo = doc.query("#player-photo").unwrap();
        assert_eq!(doc.text(name), "Ada Striker");
        assert_eq!(doc.attribute(photo, "src").as_deref(), Some("img/ada.jpg"));
        let stats = doc.query("#stats").unwrap();
        assert_eq!(doc.query_all(stats, ".stat-card").len(), 2);
        let grid = doc.query("#highlights-grid").unwrap();
        assert_eq!(doc.query_all(grid, "article.highlight").len(), 1);
    }

    #[test]
    fn test_numbers_in_view_start_on_populate() {
        let mut p = page();
        p.populate(&profile(), 0.0);
        assert!(p.stats().observer().is_none());
        assert_eq!(p.animator().active_count(), 2);

        p.dispatch(PageEvent::Frame, 500.0);
        let numbers = p.document().query_all(p.stats().container(), ".stat-number");
        assert_eq!(p.document().text(numbers[0]), "600+");
        p.dispatch(PageEvent::Frame, 1000.0);
        assert_eq!(p.document().text(numbers[0]), "1200+");
        assert_eq!(p.document().text(numbers[1]), "0");
        assert!(p.is_settled());
    }

    #[test]
    fn test_numbers_below_the_fold_wait_for_scroll() {
        let mut p = page();
        p.dispatch(PageEvent::Resize(200.0), 0.0);
        p.populate(&profile(), 0.0);
        assert!(p.is_settled());
        let numbers = p.document().query_all(p.stats().container(), ".stat-number");
        assert!(p.stats().observer().unwrap().is_observing(numbers[0]));

        let top = p.document().rect(numbers[0]).unwrap().top;
        p.dispatch(PageEvent::Scroll(top), 100.0);
        assert!(p.animator().is_running(numbers[0]));
        p.dispatch(PageEvent::Frame, 600.0);
        assert_eq!(p.document().text(numbers[0]), "600+");
    }

    #[test]
    fn test_scroll_event_drives_sticky_header() {
        let mut p = page();
        p.dispatch(PageEvent::Scroll(5.0), 0.0);
        assert!(!p.chrome().is_header_scrolled(p.document()));
        p.dispatch(PageEvent::Scroll(15.0), 0.0);
        assert!(p.chrome().is_header_scrolled(p.document()));
        p.dispatch(PageEvent::Scroll(3.0), 0.0);
        assert!(!p.chrome().is_header_scrolled(p.document()));
    }
}
