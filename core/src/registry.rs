//! Module id → display metadata lookup, built once at engine construction

use crate::config::EngineConfig;
use schema::ModuleKind;
use std::collections::HashMap;

/// Display metadata for a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Name used in bundle titles and notifications
    pub display_name: String,
    /// Icon name
    pub icon: String,
}

/// Static lookup table from module id to display metadata.
///
/// Seeded with every [`ModuleKind`]; configuration may add or override
/// entries. Ids are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    modules: HashMap<String, ModuleInfo>,
}

const FALLBACK_ICON: &str = "notifications-outline";

impl Default for ModuleRegistry {
    fn default() -> Self {
        let modules = ModuleKind::ALL
            .into_iter()
            .map(|kind| {
                (
                    kind.id().to_string(),
                    ModuleInfo {
                        display_name: kind.display_name().to_string(),
                        icon: kind.icon().to_string(),
                    },
                )
            })
            .collect();
        Self { modules }
    }
}

impl ModuleRegistry {
    /// Builds the registry from the built-in modules plus configured extras.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut registry = Self::default();
        for (id, module) in &config.modules {
            registry.register(
                id,
                ModuleInfo {
                    display_name: module.display_name.clone(),
                    icon: module
                        .icon
                        .clone()
                        .unwrap_or_else(|| FALLBACK_ICON.to_string()),
                },
            );
        }
        registry
    }

    /// Adds or replaces a module entry.
    pub fn register(&mut self, id: &str, info: ModuleInfo) {
        self.modules.insert(id.trim().to_lowercase(), info);
    }

    /// Looks up a registered module.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ModuleInfo> {
        self.modules.get(&id.trim().to_lowercase())
    }

    /// Display name for a module; unknown ids are capitalized.
    #[must_use]
    pub fn display_name(&self, id: &str) -> String {
        self.get(id)
            .map_or_else(|| capitalize(id.trim()), |info| info.display_name.clone())
    }

    /// Icon name for a module; unknown ids get a generic icon.
    #[must_use]
    pub fn icon(&self, id: &str) -> &str {
        self.get(id).map_or(FALLBACK_ICON, |info| info.icon.as_str())
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_modules() {
        let registry = ModuleRegistry::default();
        assert_eq!(registry.len(), ModuleKind::ALL.len());
        assert_eq!(registry.display_name("messages"), "Messages");
        assert_eq!(registry.display_name("Planner"), "Planner");
        assert_eq!(registry.icon("budget"), "wallet-outline");
    }

    #[test]
    fn test_unknown_module_fallback() {
        let registry = ModuleRegistry::default();
        assert!(registry.get("fitness").is_none());
        assert_eq!(registry.display_name("fitness"), "Fitness");
        assert_eq!(registry.icon("fitness"), FALLBACK_ICON);
        assert_eq!(registry.display_name(""), "");
    }

    #[test]
    fn test_configured_modules() {
        let config = EngineConfig::default()
            .with_module("fitness", "Workouts")
            .with_module("notes", "Journal");
        let registry = ModuleRegistry::from_config(&config);
        assert_eq!(registry.display_name("fitness"), "Workouts");
        assert_eq!(registry.display_name("notes"), "Journal");
        assert_eq!(registry.icon("fitness"), FALLBACK_ICON);
    }
}
