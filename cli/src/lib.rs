//! Beacon CLI library
//!
//! Command handlers behind the `beacon` binary. Each handler drives the
//! attention engine and returns the text to print, so the binary only parses
//! arguments and writes output.

pub mod error;

pub use error::{CliError, Result};

use beacon_core::badge::BadgeView;
use beacon_core::config::load_config_from_toml_path;
use beacon_core::{
    AttentionBundle, AttentionCounts, AttentionEngine, AttentionFilter, DesktopNotifier,
    DismissTarget, EngineConfig, FocusModeSettings, JsonFileStore, KeyValueStore,
    NewAttentionItem, PriorityTier, SqliteStore,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Options for opening the engine behind the CLI.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// State file; `.json` selects the JSON file store, anything else SQLite
    pub state: Option<PathBuf>,
    /// Engine configuration file (TOML)
    pub config: Option<PathBuf>,
    /// Show desktop notifications for delivered items
    pub notify: bool,
}

/// Opens the storage adapter for a state path.
pub fn open_storage(path: &Path) -> Result<Arc<dyn KeyValueStore>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        debug!("Using JSON state file {}", path.display());
        Ok(Arc::new(JsonFileStore::new(path)))
    } else {
        Ok(Arc::new(SqliteStore::open(path)?))
    }
}

/// Builds and restores the engine described by `options`.
pub async fn open_engine(options: &EngineOptions) -> Result<AttentionEngine> {
    let config = match &options.config {
        Some(path) => load_config_from_toml_path(path)
            .map_err(|e| CliError::ConfigError(format!("{}: {}", path.display(), e)))?,
        None => EngineConfig::default(),
    };
    let state = options
        .state
        .clone()
        .unwrap_or_else(beacon_core::persistence::default_state_path);

    let mut builder = AttentionEngine::builder()
        .config(config)
        .storage(open_storage(&state)?);
    if options.notify {
        builder = builder.notifier(DesktopNotifier);
    }
    let engine = builder.restore().await?;
    info!("Attention state loaded from {}", state.display());
    Ok(engine)
}

/// Arguments of `beacon add`.
#[derive(Debug, Clone, Default)]
pub struct AddRequest {
    pub module: String,
    pub title: String,
    pub summary: Option<String>,
    pub action: Option<String>,
    pub id: Option<String>,
    pub due: Option<String>,
    pub priority: Option<String>,
    /// Extra `KEY=VALUE` metadata; values parse as JSON when possible
    pub meta: Vec<String>,
}

impl AddRequest {
    /// Converts the request into a producer payload.
    pub fn into_item(self) -> Result<NewAttentionItem> {
        let mut item = NewAttentionItem::new(self.module, self.title);
        if let Some(summary) = self.summary {
            item = item.with_summary(summary);
        }
        if let Some(action) = self.action {
            item = item.with_action_label(action);
        }
        if let Some(id) = self.id {
            item = item.with_id(id);
        }
        for pair in &self.meta {
            let (key, value) = parse_meta(pair)?;
            item = item.with_metadata(key, value);
        }
        if let Some(due) = self.due {
            item = item.with_metadata("dueDate", Value::String(due));
        }
        if let Some(priority) = self.priority {
            item = item.with_metadata("priority", Value::String(priority));
        }
        Ok(item)
    }
}

fn parse_meta(pair: &str) -> Result<(String, Value)> {
    let (key, raw) = pair
        .split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .ok_or_else(|| CliError::InvalidArgument(format!("--meta expects KEY=VALUE, got '{pair}'")))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.trim().to_string(), value))
}

/// Focus-mode subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusAction {
    /// Enable focus mode, optionally replacing the allow-list
    On {
        modules: Vec<String>,
        block_urgent: bool,
    },
    Off,
    Allow(String),
    Deny(String),
    Status,
}

/// Command handlers over a loaded engine.
#[derive(Debug)]
pub struct Client {
    engine: AttentionEngine,
    json: bool,
}

impl Client {
    pub fn new(engine: AttentionEngine, json: bool) -> Self {
        Self { engine, json }
    }

    /// The underlying engine.
    pub fn engine(&self) -> &AttentionEngine {
        &self.engine
    }

    /// `beacon add`
    pub async fn add(&self, request: AddRequest) -> Result<String> {
        let (admission, persisted) = self.engine.add_item(request.into_item()?).await?;
        require_saved(&admission.item.id, persisted)?;
        if self.json {
            return Ok(serde_json::to_string_pretty(&json!({
                "item": admission.item,
                "bundleId": admission.bundle_id,
                "isNewBundle": admission.is_new_bundle,
                "delivered": admission.delivered,
            }))?);
        }

        let mut out = format!(
            "✓ Added {} [{}] to {}{}",
            admission.item.id,
            admission.item.priority,
            admission.bundle_id,
            if admission.is_new_bundle { " (new bundle)" } else { "" }
        );
        if !admission.delivered {
            out.push_str("\n  Suppressed by focus mode");
        }
        Ok(out)
    }

    /// `beacon list`
    pub fn list(&self, filter: &AttentionFilter) -> Result<String> {
        let bundles = self.engine.get_all(filter);
        if self.json {
            return Ok(serde_json::to_string_pretty(&bundles)?);
        }
        if bundles.is_empty() {
            return Ok("Nothing needs your attention".to_string());
        }
        Ok(bundles.iter().map(render_bundle).collect::<Vec<_>>().join("\n"))
    }

    /// `beacon counts`
    pub fn counts(&self, all: bool) -> Result<String> {
        let counts = if all {
            self.engine.counts(false)
        } else {
            self.engine.get_counts()
        };
        if self.json {
            return Ok(serde_json::to_string_pretty(&counts)?);
        }
        Ok(render_counts(&counts))
    }

    /// `beacon badge`
    pub fn badge(&self) -> Result<String> {
        let badge = BadgeView::from_counts(&self.engine.get_counts(), self.engine.config().badge_cap);
        if self.json {
            let value = badge.map_or(Value::Null, |b| {
                json!({ "label": b.label, "tier": b.tier, "color": b.color })
            });
            return Ok(serde_json::to_string_pretty(&value)?);
        }
        Ok(badge.map_or_else(
            || "No badge".to_string(),
            |b| format!("{} ({}, {})", b.label, b.tier, b.color),
        ))
    }

    /// `beacon dismiss`
    pub async fn dismiss(&self, id: &str) -> Result<String> {
        let target = self.engine.dismiss(id).await?;
        let kind = match target {
            DismissTarget::Bundle => "bundle",
            DismissTarget::Item => "item",
        };
        if self.json {
            return Ok(serde_json::to_string_pretty(&json!({ "dismissed": id, "target": kind }))?);
        }
        Ok(format!("✓ Dismissed {kind} {id}"))
    }

    /// `beacon focus`
    pub async fn focus(&self, action: FocusAction) -> Result<String> {
        let current = self.engine.focus_settings();
        let next = match action {
            FocusAction::Status => None,
            FocusAction::On {
                modules,
                block_urgent,
            } => {
                let mut settings = if modules.is_empty() {
                    FocusModeSettings {
                        enabled: true,
                        ..current
                    }
                } else {
                    FocusModeSettings::enabled_with(modules)
                };
                settings.allow_urgent = !block_urgent;
                Some(settings)
            }
            FocusAction::Off => Some(FocusModeSettings {
                enabled: false,
                ..current
            }),
            FocusAction::Allow(module) => Some(current.allow_module(module)),
            FocusAction::Deny(module) => Some(current.deny_module(&module)),
        };

        if let Some(settings) = next {
            self.engine.set_focus(settings).await?;
        }

        let settings = self.engine.focus_settings();
        if self.json {
            return Ok(serde_json::to_string_pretty(&settings)?);
        }
        Ok(render_focus(&settings))
    }
}

/// Maps a storage failure after an in-memory change to a command failure
/// naming what was left unsaved.
fn require_saved(id: &str, persisted: beacon_core::Result<()>) -> Result<()> {
    persisted.map_err(|e| CliError::CommandFailed(format!("{id} was recorded but not saved: {e}")))
}

fn render_bundle(bundle: &AttentionBundle) -> String {
    let mut lines = vec![format!(
        "{}\t[{}]\t{}\t({}, {} item{})",
        bundle.id,
        bundle.priority,
        bundle.title,
        bundle.state,
        bundle.len(),
        if bundle.len() == 1 { "" } else { "s" }
    )];
    if bundle.len() > 1 {
        for item in &bundle.items {
            lines.push(format!("  - {}\t{}", item.id, item.title));
        }
    } else if let Some(item) = bundle.items.first() {
        lines.push(format!("  - {}", item.id));
    }
    lines.join("\n")
}

fn render_counts(counts: &AttentionCounts) -> String {
    let mut lines: Vec<String> = PriorityTier::ALL
        .iter()
        .map(|tier| format!("{}: {}", tier, counts.for_tier(*tier)))
        .collect();
    lines.push(format!("total: {}", counts.total()));
    lines.join("\n")
}

fn render_focus(settings: &FocusModeSettings) -> String {
    let modules = if settings.allowed_modules.is_empty() {
        "(none)".to_string()
    } else {
        settings
            .allowed_modules
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "Focus mode: {}\n  Urgent bypass: {}\n  Allowed modules: {}",
        if settings.enabled { "on" } else { "off" },
        if settings.allow_urgent { "yes" } else { "no" },
        modules
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meta_values() {
        assert_eq!(parse_meta("direct=false").unwrap(), ("direct".into(), json!(false)));
        assert_eq!(parse_meta("room=ops").unwrap(), ("room".into(), json!("ops")));
        assert_eq!(parse_meta(" n =3").unwrap(), ("n".into(), json!(3)));
        assert!(parse_meta("novalue").is_err());
        assert!(parse_meta("=x").is_err());
    }

    #[test]
    fn test_add_request_sets_due_and_priority() {
        let item = AddRequest {
            module: "planner".into(),
            title: "Ship".into(),
            due: Some("2026-10-19".into()),
            priority: Some("urgent".into()),
            meta: vec!["dueDate=ignored".into()],
            ..AddRequest::default()
        }
        .into_item()
        .unwrap();

        assert_eq!(item.metadata["dueDate"], json!("2026-10-19"));
        assert_eq!(item.metadata["priority"], json!("urgent"));
    }

    #[test]
    fn test_require_saved_reports_unsaved_item() {
        assert!(require_saved("a", Ok(())).is_ok());

        let err = require_saved(
            "task-7",
            Err(beacon_core::AttentionError::Persistence("disk full".into())),
        )
        .unwrap_err();
        assert_eq!(err.code(), "CLI001");
        assert_eq!(
            err.to_string(),
            "Command failed: task-7 was recorded but not saved: Persistence error: disk full"
        );
    }

    #[test]
    fn test_render_counts() {
        let counts = AttentionCounts {
            urgent: 1,
            attention: 2,
            fyi: 0,
        };
        assert_eq!(
            render_counts(&counts),
            "urgent: 1\nattention: 2\nfyi: 0\ntotal: 3"
        );
    }

    #[test]
    fn test_render_focus() {
        let settings = FocusModeSettings::enabled_with(["planner", "calendar"]);
        assert_eq!(
            render_focus(&settings),
            "Focus mode: on\n  Urgent bypass: yes\n  Allowed modules: calendar, planner"
        );
    }
}
