//! Header badge formatting

use schema::{AttentionCounts, PriorityTier};

/// What the header badge renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeView {
    /// Label, e.g. `"3"` or `"9+"`
    pub label: String,
    /// Most important non-empty tier
    pub tier: PriorityTier,
    /// Hex color for the tier
    pub color: &'static str,
}

impl BadgeView {
    /// Builds the badge for the given counts, or `None` when nothing is pending.
    #[must_use]
    pub fn from_counts(counts: &AttentionCounts, cap: usize) -> Option<Self> {
        let tier = badge_tier(counts)?;
        let label = format_badge(counts.total(), cap)?;
        Some(Self {
            label,
            tier,
            color: tier_color(tier),
        })
    }
}

/// Formats a count for the badge; `None` for zero, `"{cap}+"` above the cap.
#[must_use]
pub fn format_badge(count: usize, cap: usize) -> Option<String> {
    match count {
        0 => None,
        n if n > cap => Some(format!("{cap}+")),
        n => Some(n.to_string()),
    }
}

/// Most important tier with a non-zero count.
#[must_use]
pub fn badge_tier(counts: &AttentionCounts) -> Option<PriorityTier> {
    PriorityTier::ALL
        .into_iter()
        .find(|tier| counts.for_tier(*tier) > 0)
}

/// Badge color per tier.
#[must_use]
pub const fn tier_color(tier: PriorityTier) -> &'static str {
    match tier {
        PriorityTier::Urgent => "#E53935",
        PriorityTier::Attention => "#FB8C00",
        PriorityTier::Fyi => "#1E88E5",
    }
}
