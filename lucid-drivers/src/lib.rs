//! Driver layer for rendering pages in a real browser.
//!
//! - [`browser::driver::LucidDriver`]: WebDriver session wrapper
//! - [`browser::page::LucidPage`]: navigation plus HTML capture
//! - [`browser::cdp`]: DevTools commands sent through chromedriver
//! - [`browser::fingerprint`]: per-session user agent, viewport, locale, timezone
//! - [`browser::behavioral::BehavioralEngine`]: jittered settle delays
//! - [`browser::stealth`]: launch arguments and JS evasions per stealth level
pub mod browser;
