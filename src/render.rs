//! Card rendering.
//!
//! Two layers: `plan_*` functions turn profile data into plain card
//! descriptions, and the renderers write those descriptions into their
//! container as a full clear-and-rebuild.

use crate::counter::Animator;
use crate::dom::{Document, NodeId};
use crate::logging::{self, obj, v_num, Domain};
use crate::model::{HighlightEntry, ProfileDocument, StatEntry};
use crate::visibility::{IntersectionEntry, Viewport, VisibilityObserver};

pub const HIGHLIGHT_ICON: &str = "🏆";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCardPlan {
    pub number_text: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightCardPlan {
    pub icon: &'static str,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPlan {
    pub name: String,
    pub tagline: String,
    pub note: String,
    pub photo: String,
}

pub fn plan_stats(stats: &[StatEntry]) -> Vec<StatCardPlan> {
    stats
        .iter()
        .map(|s| StatCardPlan {
            number_text: s.display_text(),
            label: s.label.clone().unwrap_or_default(),
        })
        .collect()
}

pub fn plan_highlights(highlights: &[HighlightEntry]) -> Vec<HighlightCardPlan> {
    highlights
        .iter()
        .map(|h| HighlightCardPlan {
            icon: HIGHLIGHT_ICON,
            title: h.title.clone().unwrap_or_default(),
            text: h.text.clone().unwrap_or_default(),
        })
        .collect()
}

/// Missing identity fields become empty strings.
pub fn plan_identity(profile: &ProfileDocument) -> IdentityPlan {
    IdentityPlan {
        name: profile.name.clone().unwrap_or_default(),
        tagline: profile.tagline.clone().unwrap_or_default(),
        note: profile.note.clone().unwrap_or_default(),
        photo: profile.photo.clone().unwrap_or_default(),
    }
}

/// Builds stat cards and arms each number for reveal-on-scroll.
#[derive(Debug)]
pub struct StatRenderer {
    container: NodeId,
    threshold: f64,
    observer: Option<VisibilityObserver>,
}

impl StatRenderer {
    pub fn new(container: NodeId, threshold: f64) -> Self {
        Self {
            container,
            threshold,
            observer: None,
        }
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn observer(&self) -> Option<&VisibilityObserver> {
        self.observer.as_ref()
    }

    /// Replace the container's cards; returns the new number elements.
    pub fn render(&mut self, doc: &mut Document, stats: &[StatEntry]) -> Vec<NodeId> {
        if let Some(mut previous) = self.observer.take() {
            previous.disconnect();
        }
        doc.clear_children(self.container);
        for plan in plan_stats(stats) {
            let card = doc.create_element_with("div", Some("stat-card"), "");
            let number = doc.create_element_with("span", Some("stat-number"), &plan.number_text);
            let label = doc.create_element_with("span", Some("stat-label"), &plan.label);
            doc.append(card, &[number, label]);
            doc.append_child(self.container, card);
        }

        let numbers = doc.query_all(self.container, ".stat-number");
        let mut observer = VisibilityObserver::new(self.threshold);
        for &n in &numbers {
            observer.observe(n);
        }
        if !observer.is_empty() {
            self.observer = Some(observer);
        }
        logging::info(
            Domain::Render,
            "stats_rendered",
            obj(&[("cards", v_num(numbers.len() as f64))]),
        );
        numbers
    }

    /// Measure observed numbers against `viewport` and start counters for
    /// those that became visible.
    pub fn reveal(
        &mut self,
        doc: &Document,
        viewport: Viewport,
        animator: &mut Animator,
        now_ms: f64,
    ) -> Vec<NodeId> {
        let entries = match &self.observer {
            Some(observer) => observer.measure(doc, viewport),
            None => return Vec::new(),
        };
        self.on_intersection(doc, &entries, animator, now_ms)
    }

    /// Observer callback: each visible number starts its counter and is
    /// never observed again. Once every card has fired the observer retires.
    pub fn on_intersection(
        &mut self,
        doc: &Document,
        entries: &[IntersectionEntry],
        animator: &mut Animator,
        now_ms: f64,
    ) -> Vec<NodeId> {
        let observer = match self.observer.as_mut() {
            Some(observer) => observer,
            None => return Vec::new(),
        };
        let fired = observer.take_triggered(entries);
        for &node in &fired {
            animator.animate(doc, node, now_ms);
        }
        if observer.is_empty() {
            self.observer = None;
            logging::debug(Domain::Render, "observer_retired", obj(&[]));
        }
        fired
    }
}

/// Builds highlight cards; nothing dynamic.
#[derive(Debug)]
pub struct HighlightRenderer {
    container: NodeId,
}

impl HighlightRenderer {
    pub fn new(container: NodeId) -> Self {
        Self { container }
    }

    pub fn render(&self, doc: &mut Document, highlights: &[HighlightEntry]) -> Vec<NodeId> {
        doc.clear_children(self.container);
        let mut cards = Vec::with_capacity(highlights.len());
        for plan in plan_highlights(highlights) {
            let card = doc.create_element_with("article", Some("highlight"), "");
            let icon = doc.create_element_with("div", Some("icon"), plan.icon);
            let body = doc.create_element_with("div", Some("highlight-body"), "");
            let title = doc.create_element_with("h3", None, &plan.title);
            let text = doc.create_element_with("p", None, &plan.text);
            doc.append(body, &[title, text]);
            doc.append(card, &[icon, body]);
            doc.append_child(self.container, card);
            cards.push(card);
        }
        logging::info(
            Domain::Render,
            "highlights_rendered",
            obj(&[("cards", v_num(cards.len() as f64))]),
        );
        cards
    }
}
