//! Configuration loading and validation for the attention engine
//!
//! Thresholds are process-wide constants with the defaults below and can be
//! overridden at engine construction, either programmatically or from a TOML
//! file. Durations accept humantime strings (`"10m"`, `"3days"`) or integer
//! milliseconds. Validation reports field-path error messages.

use crate::{AttentionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default bundle window: 10 minutes.
pub const BUNDLE_WINDOW_MS: u64 = 600_000;
/// Default maximum number of items per bundle.
pub const MAX_BUNDLE_SIZE: usize = 5;
/// Default urgent due-date window: 1 hour.
pub const URGENT_DUE_WINDOW_MS: u64 = 3_600_000;
/// Default attention due-date window: 3 days.
pub const ATTENTION_DUE_WINDOW_MS: u64 = 259_200_000;
/// Default look-ahead for calendar events: 24 hours.
pub const CALENDAR_EVENT_WINDOW_MS: u64 = 86_400_000;
/// Default badge cap; larger counts render as `"9+"`.
pub const BADGE_CAP: usize = 9;

/// Upper bound accepted for any configured window.
const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Display metadata for a module registered through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    /// Name used in bundle titles
    pub display_name: String,
    /// Optional icon name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Engine thresholds and module registrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Maximum span, from a bundle's first item, during which it accepts more
    #[serde(default = "default_bundle_window", with = "duration_serde")]
    pub bundle_window: Duration,
    /// Maximum number of items in one bundle
    #[serde(default = "default_max_bundle_size")]
    pub max_bundle_size: usize,
    /// Due dates closer than this classify as urgent
    #[serde(default = "default_urgent_due_window", with = "duration_serde")]
    pub urgent_due_window: Duration,
    /// Due dates closer than this classify as attention
    #[serde(default = "default_attention_due_window", with = "duration_serde")]
    pub attention_due_window: Duration,
    /// Calendar events starting within this window classify as attention
    #[serde(default = "default_calendar_event_window", with = "duration_serde")]
    pub calendar_event_window: Duration,
    /// Largest count the badge renders verbatim
    #[serde(default = "default_badge_cap")]
    pub badge_cap: usize,
    /// Extra modules keyed by id
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleConfig>,
}

fn default_bundle_window() -> Duration {
    Duration::from_millis(BUNDLE_WINDOW_MS)
}

fn default_max_bundle_size() -> usize {
    MAX_BUNDLE_SIZE
}

fn default_urgent_due_window() -> Duration {
    Duration::from_millis(URGENT_DUE_WINDOW_MS)
}

fn default_attention_due_window() -> Duration {
    Duration::from_millis(ATTENTION_DUE_WINDOW_MS)
}

fn default_calendar_event_window() -> Duration {
    Duration::from_millis(CALENDAR_EVENT_WINDOW_MS)
}

fn default_badge_cap() -> usize {
    BADGE_CAP
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bundle_window: default_bundle_window(),
            max_bundle_size: default_max_bundle_size(),
            urgent_due_window: default_urgent_due_window(),
            attention_due_window: default_attention_due_window(),
            calendar_event_window: default_calendar_event_window(),
            badge_cap: default_badge_cap(),
            modules: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Overrides the bundle window.
    #[must_use]
    pub const fn with_bundle_window(mut self, window: Duration) -> Self {
        self.bundle_window = window;
        self
    }

    /// Overrides the maximum bundle size.
    #[must_use]
    pub const fn with_max_bundle_size(mut self, size: usize) -> Self {
        self.max_bundle_size = size;
        self
    }

    /// Overrides the urgent due-date window.
    #[must_use]
    pub const fn with_urgent_due_window(mut self, window: Duration) -> Self {
        self.urgent_due_window = window;
        self
    }

    /// Overrides the attention due-date window.
    #[must_use]
    pub const fn with_attention_due_window(mut self, window: Duration) -> Self {
        self.attention_due_window = window;
        self
    }

    /// Registers an extra module.
    #[must_use]
    pub fn with_module(mut self, id: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.modules.insert(
            id.into(),
            ModuleConfig {
                display_name: display_name.into(),
                icon: None,
            },
        );
        self
    }

    /// Bundle window as a signed delta for timestamp arithmetic.
    #[must_use]
    pub fn bundle_window_delta(&self) -> chrono::Duration {
        to_delta(self.bundle_window)
    }

    /// Urgent window as a signed delta.
    #[must_use]
    pub fn urgent_due_delta(&self) -> chrono::Duration {
        to_delta(self.urgent_due_window)
    }

    /// Attention window as a signed delta.
    #[must_use]
    pub fn attention_due_delta(&self) -> chrono::Duration {
        to_delta(self.attention_due_window)
    }

    /// Calendar look-ahead as a signed delta.
    #[must_use]
    pub fn calendar_event_delta(&self) -> chrono::Duration {
        to_delta(self.calendar_event_window)
    }

    /// Validate the configuration and return `Result<()>` with field-path errors
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("bundleWindow", self.bundle_window),
            ("urgentDueWindow", self.urgent_due_window),
            ("attentionDueWindow", self.attention_due_window),
            ("calendarEventWindow", self.calendar_event_window),
        ];
        for (field, window) in windows {
            if window.is_zero() {
                return Err(AttentionError::Configuration(format!(
                    "{field}: must be greater than zero"
                )));
            }
            if window > MAX_WINDOW {
                return Err(AttentionError::Configuration(format!(
                    "{field}: must not exceed 365 days"
                )));
            }
        }

        if self.max_bundle_size == 0 {
            return Err(AttentionError::Configuration(
                "maxBundleSize: must be at least 1".to_string(),
            ));
        }

        if self.badge_cap == 0 {
            return Err(AttentionError::Configuration(
                "badgeCap: must be at least 1".to_string(),
            ));
        }

        if self.urgent_due_window > self.attention_due_window {
            return Err(AttentionError::Configuration(
                "urgentDueWindow: must not exceed attentionDueWindow".to_string(),
            ));
        }

        for (id, module) in &self.modules {
            if id.trim().is_empty() {
                return Err(AttentionError::Configuration(
                    "modules: module id (table name) cannot be empty".to_string(),
                ));
            }
            if module.display_name.trim().is_empty() {
                return Err(AttentionError::Configuration(format!(
                    "modules.{id}.displayName: cannot be empty"
                )));
            }
        }

        Ok(())
    }
}

fn to_delta(window: Duration) -> chrono::Duration {
    chrono::Duration::from_std(window.min(MAX_WINDOW))
        .unwrap_or_else(|_| chrono::Duration::days(365))
}

/// Load engine config from a TOML string
pub fn load_config_from_toml_str(input: &str) -> Result<EngineConfig> {
    let cfg: EngineConfig = toml::from_str(input)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load engine config from a TOML file path
pub fn load_config_from_toml_path(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let data = fs::read_to_string(&path).map_err(|e| {
        AttentionError::Configuration(format!(
            "Failed to read config {:?}: {}",
            path.as_ref(),
            e
        ))
    })?;
    load_config_from_toml_str(&data)
}

/// Serde adapter for durations: humantime strings or integer milliseconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Millis(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match RawDuration::deserialize(deserializer)? {
            RawDuration::Millis(ms) => Ok(Duration::from_millis(ms)),
            RawDuration::Text(text) => humantime::parse_duration(text.trim())
                .map_err(|e| serde::de::Error::custom(format!("invalid duration '{text}': {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.bundle_window, Duration::from_secs(600));
        assert_eq!(cfg.max_bundle_size, 5);
        assert_eq!(cfg.urgent_due_window, Duration::from_secs(3600));
        assert_eq!(cfg.attention_due_window, Duration::from_secs(3 * 24 * 3600));
        assert_eq!(cfg.badge_cap, 9);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let cfg = load_config_from_toml_str("").expect("empty config is valid");
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn test_humantime_and_millis() {
        let toml = r#"
bundleWindow = "5m"
urgentDueWindow = 1800000
attentionDueWindow = "2days"
maxBundleSize = 3

[modules.fitness]
displayName = "Fitness"
icon = "barbell-outline"
"#;
        let cfg = load_config_from_toml_str(toml).expect("valid config");
        assert_eq!(cfg.bundle_window, Duration::from_secs(300));
        assert_eq!(cfg.urgent_due_window, Duration::from_secs(1800));
        assert_eq!(cfg.attention_due_window, Duration::from_secs(2 * 86_400));
        assert_eq!(cfg.max_bundle_size, 3);
        assert_eq!(cfg.modules["fitness"].display_name, "Fitness");
    }

    #[test]
    fn test_invalid_duration_reports_error() {
        let err = load_config_from_toml_str(r#"bundleWindow = "soon""#).unwrap_err();
        assert_eq!(err.code(), "ATTN005");
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn test_validation_field_paths() {
        let err = load_config_from_toml_str("maxBundleSize = 0").unwrap_err();
        assert!(err.to_string().contains("maxBundleSize"));

        let err = load_config_from_toml_str("badgeCap = 0").unwrap_err();
        assert!(err.to_string().contains("badgeCap: must be at least 1"));

        let err = load_config_from_toml_str(r#"bundleWindow = "0s""#).unwrap_err();
        assert!(err.to_string().contains("bundleWindow"));

        let err = load_config_from_toml_str(
            r#"
urgentDueWindow = "4days"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("urgentDueWindow"));

        let err = load_config_from_toml_str(
            r#"
[modules.fitness]
displayName = " "
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("modules.fitness.displayName"));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beacon.toml");
        fs::write(&path, "badgeCap = 99\n").unwrap();
        let cfg = load_config_from_toml_path(&path).expect("load");
        assert_eq!(cfg.badge_cap, 99);

        let missing = load_config_from_toml_path(dir.path().join("missing.toml")).unwrap_err();
        assert_eq!(missing.code(), "ATTN005");
    }

    #[test]
    fn test_serialize_uses_humantime() {
        let json = serde_json::to_value(EngineConfig::default()).unwrap();
        assert_eq!(json["bundleWindow"], "10m");
        assert_eq!(json["urgentDueWindow"], "1h");
    }
}
