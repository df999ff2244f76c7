//! Known originating modules of the super-app

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Feature area that produced an attention item.
///
/// Module identifiers on items stay free-form strings so that new modules
/// can publish without a schema change; this enum covers the modules that
/// ship with the app and carry a display name and icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// Planner (tasks with due dates and projects)
    Planner,
    /// Direct and group messages
    Messages,
    /// Budget and expense tracking
    Budget,
    /// Calendar events
    Calendar,
    /// Notes
    Notes,
    /// Standalone task lists
    Tasks,
    /// Contacts and birthdays
    Contacts,
}

impl ModuleKind {
    /// Every built-in module, in registry order.
    pub const ALL: [Self; 7] = [
        Self::Planner,
        Self::Messages,
        Self::Budget,
        Self::Calendar,
        Self::Notes,
        Self::Tasks,
        Self::Contacts,
    ];

    /// Returns the identifier used on items.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Messages => "messages",
            Self::Budget => "budget",
            Self::Calendar => "calendar",
            Self::Notes => "notes",
            Self::Tasks => "tasks",
            Self::Contacts => "contacts",
        }
    }

    /// Returns the display name for the module.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Planner => "Planner",
            Self::Messages => "Messages",
            Self::Budget => "Budget",
            Self::Calendar => "Calendar",
            Self::Notes => "Notes",
            Self::Tasks => "Tasks",
            Self::Contacts => "Contacts",
        }
    }

    /// Returns the icon name rendered next to the module's bundles.
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        match self {
            Self::Planner => "checkbox-outline",
            Self::Messages => "chatbubbles-outline",
            Self::Budget => "wallet-outline",
            Self::Calendar => "calendar-outline",
            Self::Notes => "document-text-outline",
            Self::Tasks => "list-outline",
            Self::Contacts => "people-outline",
        }
    }

    /// Looks up a built-in module by identifier (case-insensitive).
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(id))
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id() {
        assert_eq!(ModuleKind::from_id("planner"), Some(ModuleKind::Planner));
        assert_eq!(ModuleKind::from_id("MESSAGES"), Some(ModuleKind::Messages));
        assert_eq!(ModuleKind::from_id(" budget "), Some(ModuleKind::Budget));
        assert_eq!(ModuleKind::from_id("fitness"), None);
        assert_eq!(ModuleKind::from_id(""), None);
    }

    #[test]
    fn test_ids_roundtrip() {
        for kind in ModuleKind::ALL {
            assert_eq!(ModuleKind::from_id(kind.id()), Some(kind));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ModuleKind::Messages.to_string(), "Messages");
        assert_eq!(ModuleKind::Calendar.to_string(), "Calendar");
    }
}
