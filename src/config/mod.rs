//! Configuration management for icescan.
//!
//! Provides XDG-compliant settings lookup with defaults for every tunable.

mod settings;

pub use settings::{Paths, Settings};
