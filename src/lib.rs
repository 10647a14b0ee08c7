//! Athlete profile page runtime: loads a player document and renders it into
//! a page shell, with reveal-on-scroll stat counters and navigation chrome.

pub mod chrome;
pub mod config;
pub mod counter;
pub mod dom;
pub mod loader;
pub mod logging;
pub mod model;
pub mod page;
pub mod render;
pub mod selector;
pub mod shell;
pub mod visibility;
