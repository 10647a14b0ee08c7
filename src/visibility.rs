//! Viewport geometry and the visibility observer behind reveal-on-scroll.

use crate::dom::{Document, NodeId, Rect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_y: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(height: f64) -> Self {
        Self {
            scroll_y: 0.0,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.scroll_y + self.height
    }

    /// Fraction of `rect` inside the viewport. A zero-height rect is either
    /// fully in or fully out.
    pub fn intersection_ratio(&self, rect: Rect) -> f64 {
        if rect.height <= 0.0 {
            let inside = rect.top >= self.scroll_y && rect.top <= self.bottom();
            return if inside { 1.0 } else { 0.0 };
        }
        let top = rect.top.max(self.scroll_y);
        let bottom = rect.bottom().min(self.bottom());
        ((bottom - top).max(0.0) / rect.height).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub ratio: f64,
}

/// Watches a set of elements and reports those that crossed the threshold.
/// A target that fires is unobserved, so each one fires at most once.
#[derive(Debug, Clone)]
pub struct VisibilityObserver {
    threshold: f64,
    targets: Vec<NodeId>,
}

impl VisibilityObserver {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            targets: Vec::new(),
        }
    }

    pub fn observe(&mut self, node: NodeId) {
        if !self.targets.contains(&node) {
            self.targets.push(node);
        }
    }

    pub fn unobserve(&mut self, node: NodeId) {
        self.targets.retain(|&t| t != node);
    }

    pub fn disconnect(&mut self) {
        self.targets.clear();
    }

    pub fn is_observing(&self, node: NodeId) -> bool {
        self.targets.contains(&node)
    }

    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Current ratio of every observed target; unlaid-out targets read as 0.
    pub fn measure(&self, doc: &Document, viewport: Viewport) -> Vec<IntersectionEntry> {
        self.targets
            .iter()
            .map(|&target| IntersectionEntry {
                target,
                ratio: doc
                    .rect(target)
                    .map(|r| viewport.intersection_ratio(r))
                    .unwrap_or(0.0),
            })
            .collect()
    }

    /// Targets among `entries` that are observed and visible enough; each is
    /// unobserved before being returned.
    pub fn take_triggered(&mut self, entries: &[IntersectionEntry]) -> Vec<NodeId> {
        let mut fired = Vec::new();
        for entry in entries {
            if entry.ratio > 0.0 && entry.ratio >= self.threshold && self.is_observing(entry.target) {
                self.unobserve(entry.target);
                fired.push(entry.target);
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_ratio() {
        let vp = Viewport { scroll_y: 100.0, height: 200.0 };
        assert_eq!(vp.intersection_ratio(Rect { top: 150.0, height: 40.0 }), 1.0);
        assert_eq!(vp.intersection_ratio(Rect { top: 280.0, height: 40.0 }), 0.5);
        assert_eq!(vp.intersection_ratio(Rect { top: 80.0, height: 40.0 }), 0.5);
        assert_eq!(vp.intersection_ratio(Rect { top: 400.0, height: 40.0 }), 0.0);
        assert_eq!(vp.intersection_ratio(Rect { top: 120.0, height: 0.0 }), 1.0);
    }

    #[test]
    fn test_trigger_respects_threshold_and_fires_once() {
        let mut doc = Document::new();
        let a = doc.create_element("span");
        let b = doc.create_element("span");
        let mut obs = VisibilityObserver::new(0.5);
        obs.observe(a);
        obs.observe(b);

        let entries = [
            IntersectionEntry { target: a, ratio: 0.6 },
            IntersectionEntry { target: b, ratio: 0.4 },
        ];
        assert_eq!(obs.take_triggered(&entries), vec![a]);
        assert!(!obs.is_observing(a));
        assert!(obs.is_observing(b));
        assert!(obs.take_triggered(&entries).is_empty());

        assert_eq!(obs.take_triggered(&[IntersectionEntry { target: b, ratio: 0.5 }]), vec![b]);
        assert!(obs.is_empty());
    }

    #[test]
    fn test_measure_uses_layout() {
        let mut doc = Document::new();
        let root = doc.root();
        let top = doc.create_element("p");
        let low = doc.create_element("p");
        doc.append(root, &[top, low]);
        doc.layout(100.0);
        let mut obs = VisibilityObserver::new(0.5);
        obs.observe(top);
        obs.observe(low);
        let entries = obs.measure(&doc, Viewport::new(150.0));
        assert_eq!(entries[0].ratio, 1.0);
        assert_eq!(entries[1].ratio, 0.5);
    }

    #[test]
    fn test_unlaid_out_target_is_invisible() {
        let mut doc = Document::new();
        let el = doc.create_element("span");
        let mut obs = VisibilityObserver::new(0.5);
        obs.observe(el);
        assert_eq!(obs.measure(&doc, Viewport::new(800.0))[0].ratio, 0.0);
    }
}
