//! Change notifications emitted by the attention engine
//!
//! Every mutating engine call produces exactly one event, delivered
//! synchronously to subscribers once the state update has completed.
//! Events carry identifiers rather than full items; subscribers read the
//! current state back through the engine's query API.

use crate::attention::{FocusModeSettings, PriorityTier};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What a dismiss call targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DismissTarget {
    /// A whole bundle
    Bundle,
    /// A single item inside a bundle
    Item,
}

/// Events emitted after a mutation of the attention store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "eventType", rename_all = "camelCase")]
pub enum AttentionEvent {
    /// A new item was admitted
    #[serde(rename_all = "camelCase")]
    ItemAdded {
        /// Identifier of the admitted item
        item_id: String,
        /// Bundle the item landed in
        bundle_id: String,
        /// Originating module
        module: String,
        /// Assigned tier
        priority: PriorityTier,
        /// Whether admission opened a new bundle
        is_new_bundle: bool,
        /// Whether the focus filter let the item surface live
        delivered: bool,
    },

    /// A bundle or item was dismissed
    #[serde(rename_all = "camelCase")]
    Dismissed {
        /// Identifier passed to dismiss
        id: String,
        /// Whether the id named a bundle or an item
        target: DismissTarget,
        /// Bundle affected by the dismissal
        bundle_id: String,
    },

    /// Focus-mode settings were replaced
    #[serde(rename_all = "camelCase")]
    FocusChanged {
        /// The new settings
        settings: FocusModeSettings,
    },

    /// State was reloaded from persistent storage
    #[serde(rename_all = "camelCase")]
    Restored {
        /// Number of bundles loaded
        bundle_count: usize,
    },
}

impl AttentionEvent {
    /// Get the event type as a string
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::ItemAdded { .. } => "itemAdded",
            Self::Dismissed { .. } => "dismissed",
            Self::FocusChanged { .. } => "focusChanged",
            Self::Restored { .. } => "restored",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_tag() {
        let event = AttentionEvent::ItemAdded {
            item_id: "i1".into(),
            bundle_id: "bundle-planner-1".into(),
            module: "planner".into(),
            priority: PriorityTier::Attention,
            is_new_bundle: true,
            delivered: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventType"], "itemAdded");
        assert_eq!(json["bundleId"], "bundle-planner-1");
        assert_eq!(json["isNewBundle"], true);
        assert_eq!(event.event_type(), "itemAdded");
    }

    #[test]
    fn test_dismissed_event_shape() {
        let event = AttentionEvent::Dismissed {
            id: "i1".into(),
            target: DismissTarget::Item,
            bundle_id: "b1".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["target"], "item");
        assert_eq!(event.event_type(), "dismissed");
    }
}
