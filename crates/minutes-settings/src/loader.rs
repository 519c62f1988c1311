//! Reads `~/.minutes/settings.json`, lays it over the compiled defaults and
//! then applies `MINUTES_*` environment overrides.
//!
//! The file only needs the keys a user wants to change. Nested objects are
//! merged key by key; arrays and scalars are replaced; `null` means "keep
//! the default".

use std::io::ErrorKind;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::{MinutesSettings, TranscriptSourceKind};

pub fn settings_path() -> PathBuf {
    let home = std::env::var_os("HOME").map_or_else(std::env::temp_dir, PathBuf::from);
    home.join(".minutes").join("settings.json")
}

pub fn load_settings() -> Result<MinutesSettings> {
    load_settings_from_path(&settings_path())
}

/// Defaults, then the file at `path` (if present), then the environment.
/// The result is validated before it is returned.
pub fn load_settings_from_path(path: &Path) -> Result<MinutesSettings> {
    let mut settings = load_file_layer(path)?;
    apply_overrides(&mut settings, |name| std::env::var(name).ok());
    settings.validate()?;
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<MinutesSettings> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file absent");
            return Ok(MinutesSettings::default());
        }
        Err(source) => return Err(SettingsError::Read { path: path.into(), source }),
    };

    let overlay: Value =
        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse { path: path.into(), source })?;
    debug!(path = %path.display(), "applying settings file");

    let base = serde_json::to_value(MinutesSettings::default())?;
    Ok(serde_json::from_value(deep_merge(base, overlay))?)
}

/// Merge `source` over `target`: objects key by key, everything else
/// replaced wholesale. `null` in `source` leaves the target value alone.
pub fn deep_merge(mut target: Value, source: Value) -> Value {
    merge_into(&mut target, source);
    target
}

fn merge_into(target: &mut Value, source: Value) {
    match (target, source) {
        (_, Value::Null) => {}
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None if !value.is_null() => {
                        let _ = target_map.insert(key, value);
                    }
                    None => {}
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Apply `MINUTES_*` overrides read through `lookup`.
///
/// Numbers must parse and fall inside their range, otherwise the override
/// is skipped with a warning. Empty strings count as unset.
pub fn apply_overrides(settings: &mut MinutesSettings, lookup: impl Fn(&str) -> Option<String>) {
    let env = Overrides { lookup };

    if let Some(v) = env.text("MINUTES_MODEL") {
        settings.generation.default_model = v;
    }
    if let Some(v) = env.text("MINUTES_BASE_URL") {
        settings.generation.base_url = v;
    }
    if let Some(v) = env.number("MINUTES_TIMEOUT_MS", 1_000..=3_600_000) {
        settings.generation.request_timeout_ms = v;
    }

    if let Some(v) = env.number("MINUTES_BUDGET", 1..=10_000_000) {
        settings.pipeline.budget_tokens = v;
    }
    if let Some(v) = env.number("MINUTES_MAP_CONCURRENCY", 1..=64) {
        settings.pipeline.map_concurrency = v;
    }

    if let Some(v) = env.number("MINUTES_MAX_RETRIES", 0..=10) {
        settings.retry.max_retries = v;
    }

    // A directory or URL override also picks the matching source kind.
    if let Some(v) = env.text("MINUTES_TRANSCRIPT_DIR") {
        settings.transcripts.directory = v;
        settings.transcripts.source = TranscriptSourceKind::Directory;
    }
    if let Some(v) = env.text("MINUTES_TRANSCRIPT_URL") {
        settings.transcripts.base_url = Some(v);
        settings.transcripts.source = TranscriptSourceKind::Http;
    }

    if let Some(v) = env.text("MINUTES_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.text("MINUTES_LOG_FORMAT") {
        settings.logging.format = v;
    }
}

/// Parse `raw` (surrounding whitespace allowed) and keep it only if it
/// lies within `range`.
pub fn parse_in_range<T>(raw: &str, range: RangeInclusive<T>) -> Option<T>
where
    T: FromStr + PartialOrd,
{
    raw.trim().parse::<T>().ok().filter(|n| range.contains(n))
}

struct Overrides<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Overrides<F> {
    fn text(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn number<T>(&self, name: &str, range: RangeInclusive<T>) -> Option<T>
    where
        T: FromStr + PartialOrd + Clone + std::fmt::Display,
    {
        let raw = self.text(name)?;
        let parsed = parse_in_range(&raw, range.clone());
        if parsed.is_none() {
            warn!(
                var = name,
                value = %raw,
                min = %range.start(),
                max = %range.end(),
                "ignoring out-of-range override"
            );
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| pairs.iter().find(|(k, _)| *k == name).map(|(_, v)| (*v).to_owned())
    }

    fn write_settings(body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, body).unwrap();
        (dir, path)
    }

    #[test]
    fn merge_keeps_untouched_siblings() {
        let merged = deep_merge(
            json!({"pipeline": {"budgetTokens": 12000, "mapConcurrency": 4}, "retry": {"maxRetries": 3}}),
            json!({"pipeline": {"budgetTokens": 3000}}),
        );
        assert_eq!(
            merged,
            json!({"pipeline": {"budgetTokens": 3000, "mapConcurrency": 4}, "retry": {"maxRetries": 3}})
        );
    }

    #[test]
    fn merge_replaces_non_objects() {
        let merged = deep_merge(
            json!({"list": [1, 2, 3], "nested": {"deep": true}, "n": 1}),
            json!({"list": [9], "nested": "flat", "n": null, "extra": null}),
        );
        assert_eq!(merged, json!({"list": [9], "nested": "flat", "n": 1}));
    }

    #[test]
    fn absent_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_file_layer(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.pipeline.budget_tokens, 12_000);
    }

    #[test]
    fn partial_file_overlays_defaults() {
        let (_dir, path) =
            write_settings(r#"{"generation": {"defaultModel": "gpt-4o"}, "pipeline": {"mapConcurrency": 2}}"#);
        let settings = load_file_layer(&path).unwrap();
        assert_eq!(settings.generation.default_model, "gpt-4o");
        assert_eq!(settings.generation.base_url, "https://api.openai.com/v1");
        assert_eq!(settings.pipeline.map_concurrency, 2);
        assert_eq!(settings.pipeline.budget_tokens, 12_000);
    }

    #[test]
    fn broken_file_reported() {
        let (_dir, path) = write_settings("{not json");
        assert!(matches!(load_file_layer(&path), Err(SettingsError::Parse { .. })));

        let (_dir, path) = write_settings(r#"{"pipeline": {"budgetTokens": "lots"}}"#);
        assert!(matches!(load_file_layer(&path), Err(SettingsError::Shape(_))));
    }

    #[test]
    fn zero_budget_rejected_on_load() {
        let (_dir, path) = write_settings(r#"{"pipeline": {"budgetTokens": 0}}"#);
        assert!(matches!(load_settings_from_path(&path), Err(SettingsError::InvalidValue(_))));
    }

    #[test]
    fn environment_wins() {
        let mut settings = MinutesSettings::default();
        apply_overrides(
            &mut settings,
            env(&[
                ("MINUTES_MODEL", "gpt-4"),
                ("MINUTES_BUDGET", "3500"),
                ("MINUTES_MAP_CONCURRENCY", "8"),
                ("MINUTES_MAX_RETRIES", "0"),
                ("MINUTES_LOG_FORMAT", "json"),
            ]),
        );
        assert_eq!(settings.generation.default_model, "gpt-4");
        assert_eq!(settings.pipeline.budget_tokens, 3500);
        assert_eq!(settings.pipeline.map_concurrency, 8);
        assert_eq!(settings.retry.max_retries, 0);
        assert_eq!(settings.logging.format, "json");
    }

    #[test]
    fn bad_overrides_leave_defaults() {
        let mut settings = MinutesSettings::default();
        apply_overrides(
            &mut settings,
            env(&[
                ("MINUTES_MODEL", ""),
                ("MINUTES_BUDGET", "0"),
                ("MINUTES_MAP_CONCURRENCY", "1000"),
                ("MINUTES_TIMEOUT_MS", "fast"),
            ]),
        );
        let defaults = MinutesSettings::default();
        assert_eq!(settings.generation.default_model, defaults.generation.default_model);
        assert_eq!(settings.pipeline.budget_tokens, defaults.pipeline.budget_tokens);
        assert_eq!(settings.pipeline.map_concurrency, defaults.pipeline.map_concurrency);
        assert_eq!(settings.generation.request_timeout_ms, defaults.generation.request_timeout_ms);
    }

    #[test]
    fn transcript_overrides_select_source() {
        let mut settings = MinutesSettings::default();
        apply_overrides(&mut settings, env(&[("MINUTES_TRANSCRIPT_URL", "https://t.example.com")]));
        assert_eq!(settings.transcripts.source, TranscriptSourceKind::Http);
        assert_eq!(settings.transcripts.base_url.as_deref(), Some("https://t.example.com"));

        apply_overrides(&mut settings, env(&[("MINUTES_TRANSCRIPT_DIR", "/srv/transcripts")]));
        assert_eq!(settings.transcripts.source, TranscriptSourceKind::Directory);
        assert_eq!(settings.transcripts.directory, "/srv/transcripts");
    }

    #[test]
    fn range_parsing() {
        assert_eq!(parse_in_range(" 5 ", 0u64..=10), Some(5));
        assert_eq!(parse_in_range("11", 0u64..=10), None);
        assert_eq!(parse_in_range("-1", 0u64..=10), None);
        assert_eq!(parse_in_range("64", 1usize..=64), Some(64));
        assert_eq!(parse_in_range("0", 1usize..=64), None);
    }
}
