//! Priority classification of incoming items
//!
//! Maps a module id plus classification metadata to a [`PriorityTier`].
//! Rules are evaluated in order and the first match wins:
//!
//! 1. due within the urgent window (overdue included), or an explicit
//!    `priority: "urgent"` hint with a due date of today or earlier → urgent
//! 2. due within the attention window, a direct message, or a calendar event
//!    starting within the calendar window → attention
//! 3. anything else → fyi
//!
//! Classification is total: malformed due dates are treated as absent here.
//! Rejecting them is the engine's job at intake (see [`parse_due_date`]).

use crate::config::EngineConfig;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use schema::{Metadata, ModuleKind, PriorityTier};
use serde_json::Value;

/// Metadata key holding the due date.
pub const DUE_DATE_KEY: &str = "dueDate";
/// Metadata key holding the producer's priority hint.
pub const PRIORITY_KEY: &str = "priority";
/// Metadata key holding a calendar event's start time.
pub const STARTS_AT_KEY: &str = "startsAt";
/// Metadata key marking a message as not direct (`false`).
pub const DIRECT_KEY: &str = "direct";

/// Result of interpreting a due-date metadata value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueDate {
    /// Key missing, `null` or blank
    Absent,
    /// Parsed instant
    Valid(DateTime<Utc>),
    /// Present but not interpretable as a date
    Malformed(String),
}

impl DueDate {
    /// The parsed instant, if any.
    #[must_use]
    pub const fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Valid(at) => Some(*at),
            Self::Absent | Self::Malformed(_) => None,
        }
    }
}

/// Interprets a due-date value.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS` (taken as UTC),
/// `YYYY-MM-DD` (end of that UTC day) and integer epoch milliseconds.
#[must_use]
pub fn parse_due_date(value: Option<&Value>) -> DueDate {
    match value {
        None | Some(Value::Null) => DueDate::Absent,
        Some(Value::String(raw)) => parse_date_str(raw),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map_or_else(|| DueDate::Malformed(n.to_string()), DueDate::Valid),
        Some(other) => DueDate::Malformed(other.to_string()),
    }
}

fn parse_date_str(raw: &str) -> DueDate {
    let s = raw.trim();
    if s.is_empty() {
        return DueDate::Absent;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return DueDate::Valid(at.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return DueDate::Valid(naive.and_utc());
    }
    if let Some(end_of_day) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
    {
        return DueDate::Valid(end_of_day.and_utc());
    }
    DueDate::Malformed(raw.to_string())
}

/// Priority classifier configured with the engine's windows.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    urgent_window: Duration,
    attention_window: Duration,
    calendar_window: Duration,
}

impl Classifier {
    /// Creates a classifier from the engine configuration.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            urgent_window: config.urgent_due_delta(),
            attention_window: config.attention_due_delta(),
            calendar_window: config.calendar_event_delta(),
        }
    }

    /// Classifies an item. Pure and infallible.
    #[must_use]
    pub fn classify(&self, module: &str, metadata: &Metadata, now: DateTime<Utc>) -> PriorityTier {
        let due = parse_due_date(metadata.get(DUE_DATE_KEY)).instant();

        if let Some(due) = due {
            if due - now <= self.urgent_window {
                return PriorityTier::Urgent;
            }
            if has_urgent_hint(metadata) && due.date_naive() <= now.date_naive() {
                return PriorityTier::Urgent;
            }
            if due - now <= self.attention_window {
                return PriorityTier::Attention;
            }
        }

        match ModuleKind::from_id(module) {
            Some(ModuleKind::Messages) if is_direct_message(metadata) => PriorityTier::Attention,
            Some(ModuleKind::Calendar) if self.is_upcoming_event(metadata, due, now) => {
                PriorityTier::Attention
            }
            _ => PriorityTier::Fyi,
        }
    }

    fn is_upcoming_event(
        &self,
        metadata: &Metadata,
        due: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        parse_due_date(metadata.get(STARTS_AT_KEY))
            .instant()
            .or(due)
            .is_some_and(|start| start >= now && start - now <= self.calendar_window)
    }
}

/// Classifies an item with the given configuration.
#[must_use]
pub fn classify(
    module: &str,
    metadata: &Metadata,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> PriorityTier {
    Classifier::new(config).classify(module, metadata, now)
}

fn has_urgent_hint(metadata: &Metadata) -> bool {
    metadata
        .get(PRIORITY_KEY)
        .and_then(Value::as_str)
        .is_some_and(|hint| hint.trim().eq_ignore_ascii_case("urgent"))
}

fn is_direct_message(metadata: &Metadata) -> bool {
    !matches!(metadata.get(DIRECT_KEY), Some(Value::Bool(false)))
}
