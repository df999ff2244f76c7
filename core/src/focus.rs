//! Focus-mode delivery policy

use schema::{AttentionBundle, AttentionItem, FocusModeSettings, PriorityTier};

/// Whether an item surfaces live under the given focus settings.
///
/// Suppressed items are still recorded; this only decides what counts and
/// notifications show while focus mode stays enabled.
#[must_use]
pub fn should_deliver(item: &AttentionItem, settings: &FocusModeSettings) -> bool {
    passes(&item.module, item.priority, settings)
}

/// Bundle-level variant of [`should_deliver`]; members share module and tier.
#[must_use]
pub fn should_deliver_bundle(bundle: &AttentionBundle, settings: &FocusModeSettings) -> bool {
    passes(&bundle.module, bundle.priority, settings)
}

fn passes(module: &str, priority: PriorityTier, settings: &FocusModeSettings) -> bool {
    if !settings.enabled {
        return true;
    }
    (priority == PriorityTier::Urgent && settings.allow_urgent) || settings.is_module_allowed(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use schema::Metadata;

    fn item(module: &str, priority: PriorityTier) -> AttentionItem {
        AttentionItem {
            id: format!("{module}-{priority}"),
            module: module.to_string(),
            priority,
            title: "t".to_string(),
            summary: String::new(),
            action_label: String::new(),
            created_at: Utc::now(),
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_disabled_delivers_everything() {
        let settings = FocusModeSettings::default();
        for tier in PriorityTier::ALL {
            assert!(should_deliver(&item("messages", tier), &settings));
        }
    }

    #[test]
    fn test_enabled_with_allow_list() {
        let settings = FocusModeSettings::enabled_with(["planner"]);
        assert!(!should_deliver(&item("messages", PriorityTier::Fyi), &settings));
        assert!(should_deliver(&item("messages", PriorityTier::Urgent), &settings));
        assert!(should_deliver(&item("planner", PriorityTier::Attention), &settings));
        assert!(should_deliver(&item("planner", PriorityTier::Fyi), &settings));
    }

    #[test]
    fn test_urgent_blocked_when_not_allowed() {
        let mut settings = FocusModeSettings::enabled_with(Vec::<String>::new());
        settings.allow_urgent = false;
        assert!(!should_deliver(&item("messages", PriorityTier::Urgent), &settings));
    }
}
