//! # minutes-settings
//!
//! Layered configuration for the summarizer, lowest priority first:
//!
//! 1. [`MinutesSettings::default()`]
//! 2. `~/.minutes/settings.json`, deep-merged over the defaults
//! 3. `MINUTES_*` environment variables
//!
//! Credentials never live in the settings file; the binary reads the API
//! key from the environment.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_overrides, deep_merge, load_settings, load_settings_from_path, parse_in_range, settings_path};
pub use types::*;
