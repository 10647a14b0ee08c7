//! Number reveal animation.
//!
//! Each counter is a small state machine, `Idle -> Running -> Done`, advanced by
//! an external tick carrying the current time. The displayed value at progress
//! `t` is `floor(t * target)` followed by the untouched suffix; the last frame
//! always writes the exact target.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::dom::{Document, NodeId};
use crate::logging::{self, obj, v_num, v_str, Domain};

pub const DEFAULT_DURATION_MS: f64 = 1000.0;

/// Source of frame timestamps in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for deterministic frame sequences.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Terminal value of a counter plus the text that rides along with it.
///
/// Every ASCII digit in the source text, wherever it sits, forms the number;
/// every other character, in order, forms the suffix. `"12a34"` is 1234 with
/// suffix `"a"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterTarget {
    pub value: u64,
    pub suffix: String,
}

impl CounterTarget {
    /// `None` when the text has no digits or the digits overflow.
    pub fn parse(text: &str) -> Option<Self> {
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }
        let value = digits.parse().ok()?;
        let suffix = text.chars().filter(|c| !c.is_ascii_digit()).collect();
        Some(Self { value, suffix })
    }

    pub fn render(&self, value: u64) -> String {
        format!("{}{}", value, self.suffix)
    }
}

/// Elapsed fraction of the tween, clamped to `[0, 1]`.
pub fn progress(start_ms: f64, now_ms: f64, duration_ms: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    ((now_ms - start_ms) / duration_ms).clamp(0.0, 1.0)
}

pub fn frame_value(t: f64, target: u64) -> u64 {
    ((t * target as f64).floor() as u64).min(target)
}

#[derive(Debug, Clone, PartialEq)]
pub enum CounterPhase {
    Idle,
    Running { start_ms: f64, target: CounterTarget },
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub text: String,
    pub done: bool,
}

#[derive(Debug, Clone)]
pub struct Counter {
    phase: CounterPhase,
    duration_ms: f64,
}

impl Counter {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            phase: CounterPhase::Idle,
            duration_ms,
        }
    }

    pub fn phase(&self) -> &CounterPhase {
        &self.phase
    }

    /// Only an idle counter can start; returns whether it did.
    pub fn start(&mut self, target: CounterTarget, now_ms: f64) -> bool {
        match self.phase {
            CounterPhase::Idle => {
                self.phase = CounterPhase::Running {
                    start_ms: now_ms,
                    target,
                };
                true
            }
            _ => false,
        }
    }

    pub fn tick(&mut self, now_ms: f64) -> Option<Frame> {
        let (start_ms, target) = match &self.phase {
            CounterPhase::Running { start_ms, target } => (*start_ms, target),
            _ => return None,
        };
        let t = progress(start_ms, now_ms, self.duration_ms);
        if t < 1.0 {
            return Some(Frame {
                text: target.render(frame_value(t, target.value)),
                done: false,
            });
        }
        let text = target.render(target.value);
        self.phase = CounterPhase::Done;
        Some(Frame { text, done: true })
    }
}

/// Drives every running counter on the page, one per element.
#[derive(Debug)]
pub struct Animator {
    duration_ms: f64,
    active: BTreeMap<NodeId, Counter>,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MS)
    }
}

impl Animator {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            active: BTreeMap::new(),
        }
    }

    /// Read the element's text and count it up. No-op when there are no digits.
    pub fn animate(&mut self, doc: &Document, node: NodeId, now_ms: f64) -> bool {
        let text = doc.text(node);
        match CounterTarget::parse(&text) {
            Some(target) => self.start(node, target, now_ms),
            None => {
                logging::debug(
                    Domain::Counter,
                    "skip_unparsable",
                    obj(&[("text", v_str(&text))]),
                );
                false
            }
        }
    }

    /// Start a tween toward `target`; refused while one is already running on `node`.
    pub fn start(&mut self, node: NodeId, target: CounterTarget, now_ms: f64) -> bool {
        if self.active.contains_key(&node) {
            return false;
        }
        logging::debug(
            Domain::Counter,
            "start",
            obj(&[
                ("target", v_num(target.value as f64)),
                ("suffix", v_str(&target.suffix)),
                ("duration_ms", v_num(self.duration_ms)),
            ]),
        );
        let mut counter = Counter::new(self.duration_ms);
        counter.start(target, now_ms);
        self.active.insert(node, counter);
        true
    }

    /// Advance all running counters to `now_ms`; returns how many are still running.
    pub fn tick(&mut self, doc: &mut Document, now_ms: f64) -> usize {
        let mut finished = Vec::new();
        for (&node, counter) in self.active.iter_mut() {
            if let Some(frame) = counter.tick(now_ms) {
                doc.set_text(node, &frame.text);
                if frame.done {
                    finished.push((node, frame.text));
                }
            }
        }
        for (node, text) in finished {
            self.active.remove(&node);
            logging::debug(Domain::Counter, "done", obj(&[("text", v_str(&text))]));
        }
        self.active.len()
    }

    pub fn is_running(&self, node: NodeId) -> bool {
        self.active.contains_key(&node)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }
}
