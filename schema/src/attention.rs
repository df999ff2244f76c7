//! Attention items, bundles and focus-mode settings

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Module-supplied key/value data used for classification.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Priority tier assigned to an item at intake.
///
/// Ordering follows importance: `Fyi < Attention < Urgent`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    /// Informational, no action expected soon
    Fyi,
    /// Needs attention within days
    Attention,
    /// Needs attention now
    Urgent,
}

impl PriorityTier {
    /// All tiers, most important first.
    pub const ALL: [Self; 3] = [Self::Urgent, Self::Attention, Self::Fyi];

    /// Returns the canonical lowercase form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Attention => "attention",
            Self::Fyi => "fyi",
        }
    }

    /// Parses a tier, case-insensitively. Returns `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "urgent" => Some(Self::Urgent),
            "attention" => Some(Self::Attention),
            "fyi" => Some(Self::Fyi),
            _ => None,
        }
    }
}

impl std::fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PriorityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown priority tier '{s}'"))
    }
}

/// Payload a producer submits to the engine.
///
/// The engine assigns `priority` and `createdAt`, and an `id` when the
/// producer did not supply one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAttentionItem {
    /// Producer-supplied identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Originating module identifier
    pub module: String,
    /// Short display label
    pub title: String,
    /// One-line description
    #[serde(default)]
    pub summary: String,
    /// Label of the primary action button
    #[serde(default)]
    pub action_label: String,
    /// Classification hints such as `dueDate` or `priority`
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewAttentionItem {
    /// Creates a new item payload with empty summary, action and metadata.
    #[must_use]
    pub fn new(module: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: None,
            module: module.into(),
            title: title.into(),
            summary: String::new(),
            action_label: String::new(),
            metadata: Metadata::new(),
        }
    }

    /// Sets the summary line.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Sets the action label.
    #[must_use]
    pub fn with_action_label(mut self, label: impl Into<String>) -> Self {
        self.action_label = label.into();
        self
    }

    /// Sets a producer-supplied id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a single metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A single notification-worthy event held by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttentionItem {
    /// Unique identifier
    pub id: String,
    /// Originating module identifier
    pub module: String,
    /// Tier assigned at intake; never changes afterwards
    pub priority: PriorityTier,
    /// Short display label
    pub title: String,
    /// One-line description
    pub summary: String,
    /// Label of the primary action button
    pub action_label: String,
    /// When the engine accepted the item
    pub created_at: DateTime<Utc>,
    /// Classification hints, never rendered verbatim
    #[serde(default)]
    pub metadata: Metadata,
}

/// Lifecycle of a bundle: `open` → `closed` → `dismissed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BundleState {
    /// Accepting new items
    #[default]
    Open,
    /// Window or size limit reached; immutable
    Closed,
    /// Dismissed by the user; terminal
    Dismissed,
}

impl BundleState {
    /// Returns the canonical lowercase form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Dismissed => "dismissed",
        }
    }
}

impl std::fmt::Display for BundleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A time- and size-bounded group of same-module, same-tier items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttentionBundle {
    /// Identifier derived from module and creation time
    pub id: String,
    /// Module shared by every member
    pub module: String,
    /// Tier shared by every member
    pub priority: PriorityTier,
    /// Display label
    pub title: String,
    /// Members in arrival order
    pub items: Vec<AttentionItem>,
    /// Arrival time of the first member
    pub window_start: DateTime<Utc>,
    /// Lifecycle state
    #[serde(default)]
    pub state: BundleState,
    /// Members dismissed individually
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dismissed_item_ids: BTreeSet<String>,
}

impl AttentionBundle {
    /// Number of members, dismissed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the bundle has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Members that have not been dismissed.
    pub fn visible_items(&self) -> impl Iterator<Item = &AttentionItem> {
        self.items
            .iter()
            .filter(|item| !self.dismissed_item_ids.contains(&item.id))
    }

    /// Number of members that have not been dismissed.
    #[must_use]
    pub fn visible_len(&self) -> usize {
        self.visible_items().count()
    }

    /// Whether the bundle has been dismissed.
    #[must_use]
    pub fn is_dismissed(&self) -> bool {
        self.state == BundleState::Dismissed
    }
}

/// Focus-mode policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FocusModeSettings {
    /// Whether focus mode is active
    #[serde(default)]
    pub enabled: bool,
    /// Urgent items bypass the module allow-list
    #[serde(default = "default_allow_urgent")]
    pub allow_urgent: bool,
    /// Modules allowed to surface while focus mode is active
    #[serde(default)]
    pub allowed_modules: BTreeSet<String>,
}

fn default_allow_urgent() -> bool {
    true
}

impl Default for FocusModeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_urgent: default_allow_urgent(),
            allowed_modules: BTreeSet::new(),
        }
    }
}

impl FocusModeSettings {
    /// Enabled settings allowing exactly the given modules.
    #[must_use]
    pub fn enabled_with<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: true,
            allow_urgent: true,
            allowed_modules: modules.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds a module to the allow-list.
    #[must_use]
    pub fn allow_module(mut self, module: impl Into<String>) -> Self {
        self.allowed_modules.insert(module.into());
        self
    }

    /// Removes a module from the allow-list.
    #[must_use]
    pub fn deny_module(mut self, module: &str) -> Self {
        self.allowed_modules.remove(module);
        self
    }

    /// Whether the module is on the allow-list.
    #[must_use]
    pub fn is_module_allowed(&self, module: &str) -> bool {
        self.allowed_modules.contains(module)
    }
}

/// Undismissed item counts per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttentionCounts {
    /// Urgent items
    pub urgent: usize,
    /// Attention items
    pub attention: usize,
    /// Informational items
    pub fyi: usize,
}

impl AttentionCounts {
    /// Sum over all tiers.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.urgent + self.attention + self.fyi
    }

    /// Count for a single tier.
    #[must_use]
    pub const fn for_tier(&self, tier: PriorityTier) -> usize {
        match tier {
            PriorityTier::Urgent => self.urgent,
            PriorityTier::Attention => self.attention,
            PriorityTier::Fyi => self.fyi,
        }
    }

    /// Adds `n` to the count of a tier.
    pub fn add(&mut self, tier: PriorityTier, n: usize) {
        match tier {
            PriorityTier::Urgent => self.urgent += n,
            PriorityTier::Attention => self.attention += n,
            PriorityTier::Fyi => self.fyi += n,
        }
    }
}

/// Query filter for listing bundles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttentionFilter {
    /// Only bundles from this module
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Only bundles of this tier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<PriorityTier>,
    /// Hide bundles suppressed by focus mode
    #[serde(default)]
    pub respect_focus: bool,
    /// Maximum number of bundles to return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl AttentionFilter {
    /// Filter on a single module.
    #[must_use]
    pub fn for_module(module: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            ..Self::default()
        }
    }

    /// Filter on a single tier.
    #[must_use]
    pub fn for_tier(priority: PriorityTier) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    /// Hides bundles suppressed by focus mode.
    #[must_use]
    pub const fn respecting_focus(mut self) -> Self {
        self.respect_focus = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> AttentionItem {
        AttentionItem {
            id: id.to_string(),
            module: "planner".to_string(),
            priority: PriorityTier::Attention,
            title: format!("Task {id}"),
            summary: String::new(),
            action_label: "Open".to_string(),
            created_at: Utc::now(),
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_tier_ordering() {
        assert!(PriorityTier::Urgent > PriorityTier::Attention);
        assert!(PriorityTier::Attention > PriorityTier::Fyi);
        assert_eq!(PriorityTier::ALL[0], PriorityTier::Urgent);
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!(PriorityTier::parse("URGENT"), Some(PriorityTier::Urgent));
        assert_eq!(PriorityTier::parse("fyi"), Some(PriorityTier::Fyi));
        assert_eq!(PriorityTier::parse("high"), None);
        assert!("nope".parse::<PriorityTier>().is_err());
    }

    #[test]
    fn test_visible_items_skip_dismissed() {
        let mut bundle = AttentionBundle {
            id: "bundle-planner-1".to_string(),
            module: "planner".to_string(),
            priority: PriorityTier::Attention,
            title: "2 Planner updates".to_string(),
            items: vec![item("a"), item("b")],
            window_start: Utc::now(),
            state: BundleState::Open,
            dismissed_item_ids: BTreeSet::new(),
        };
        assert_eq!(bundle.visible_len(), 2);

        bundle.dismissed_item_ids.insert("a".to_string());
        let ids: Vec<_> = bundle.visible_items().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(bundle.len(), 2);
    }

    #[test]
    fn test_counts() {
        let mut counts = AttentionCounts::default();
        counts.add(PriorityTier::Urgent, 2);
        counts.add(PriorityTier::Fyi, 1);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.for_tier(PriorityTier::Urgent), 2);
        assert_eq!(counts.for_tier(PriorityTier::Attention), 0);
    }

    #[test]
    fn test_focus_allow_and_deny() {
        let settings = FocusModeSettings::enabled_with(["planner"]).allow_module("calendar");
        assert!(settings.is_module_allowed("calendar"));
        let settings = settings.deny_module("planner");
        assert!(!settings.is_module_allowed("planner"));
    }
}
