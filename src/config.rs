//! Runtime configuration.
//!
//! Every knob has a default and an env override; unparsable values fall back
//! to the default.

/// Selectors for the page roles the runtime populates but never creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub header: String,
    pub burger: String,
    pub nav: String,
    pub stats: String,
    pub highlights_grid: String,
    pub player_photo: String,
    pub player_name: String,
    pub player_tagline: String,
    pub player_note: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            header: "#site-header".to_string(),
            burger: "#burger".to_string(),
            nav: "#main-nav".to_string(),
            stats: "#stats".to_string(),
            highlights_grid: "#highlights-grid".to_string(),
            player_photo: "#player-photo".to_string(),
            player_name: "#player-name".to_string(),
            player_tagline: "#player-tagline".to_string(),
            player_note: "#player-note".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Location of the profile document, relative to `base` unless absolute.
    pub data_url: String,
    /// Directory or http(s) URL that relative `data_url` values resolve against.
    pub base: String,
    pub counter_duration_ms: f64,
    /// Vertical scroll offset above which the header counts as scrolled.
    pub sticky_threshold: f64,
    /// Visible fraction of a stat number that triggers its counter.
    pub reveal_threshold: f64,
    pub viewport_height: f64,
    pub block_height: f64,
    pub frame_interval_ms: u64,
    pub scroll_step: f64,
    /// Host page to populate instead of the bundled shell.
    pub shell_path: Option<String>,
    pub selectors: Selectors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_url: "data/player.json".to_string(),
            base: ".".to_string(),
            counter_duration_ms: 1000.0,
            sticky_threshold: 10.0,
            reveal_threshold: 0.5,
            viewport_height: 800.0,
            block_height: 40.0,
            frame_interval_ms: 16,
            scroll_step: 120.0,
            shell_path: None,
            selectors: Selectors::default(),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            data_url: std::env::var("PROFILE_DATA_URL").unwrap_or(d.data_url),
            base: std::env::var("PROFILE_BASE").unwrap_or(d.base),
            counter_duration_ms: env_or("COUNTER_DURATION_MS", d.counter_duration_ms),
            sticky_threshold: env_or("STICKY_THRESHOLD", d.sticky_threshold),
            reveal_threshold: env_or("REVEAL_THRESHOLD", d.reveal_threshold),
            viewport_height: env_or("VIEWPORT_HEIGHT", d.viewport_height),
            block_height: env_or("BLOCK_HEIGHT", d.block_height),
            frame_interval_ms: env_or("FRAME_INTERVAL_MS", d.frame_interval_ms),
            scroll_step: env_or("SCROLL_STEP", d.scroll_step),
            shell_path: std::env::var("PAGE_SHELL").ok().filter(|p| !p.is_empty()),
            selectors: d.selectors,
        }
    }
}
