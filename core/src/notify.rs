//! Live notification delivery for admitted items.

use crate::error::{AttentionError, Result};
use crate::registry::ModuleRegistry;
use schema::{AttentionItem, PriorityTier};
use tracing::{debug, warn};

/// Trait for notification backends, allowing for mocking in tests.
pub trait NotificationBackend: Send + Sync {
    /// Send a notification with the given summary and body.
    fn send(&self, summary: &str, body: &str) -> Result<()>;
}

impl<T: NotificationBackend + ?Sized> NotificationBackend for Box<T> {
    fn send(&self, summary: &str, body: &str) -> Result<()> {
        (**self).send(summary, body)
    }
}

/// Desktop notification backend using notify-rust.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl NotificationBackend for DesktopNotifier {
    fn send(&self, summary: &str, body: &str) -> Result<()> {
        use notify_rust::Notification;

        debug!("Sending notification: {}", summary);

        Notification::new()
            .appname("Beacon")
            .summary(summary)
            .body(body)
            .icon("dialog-information")
            .timeout(notify_rust::Timeout::Milliseconds(5000))
            .show()
            .map_err(|e| {
                warn!("Failed to send notification: {}", e);
                AttentionError::Notification(e.to_string())
            })?;

        Ok(())
    }
}

/// Notifier that formats and sends attention notifications.
pub struct Notifier<B: NotificationBackend = DesktopNotifier> {
    backend: B,
    registry: ModuleRegistry,
}

impl<B: NotificationBackend> std::fmt::Debug for Notifier<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}

impl Default for Notifier<DesktopNotifier> {
    fn default() -> Self {
        Self::new(DesktopNotifier, ModuleRegistry::default())
    }
}

impl<B: NotificationBackend> Notifier<B> {
    /// Creates a new notifier with the given backend.
    pub const fn new(backend: B, registry: ModuleRegistry) -> Self {
        Self { backend, registry }
    }

    /// Sends a notification for a single item.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification cannot be sent.
    pub fn send_item(&self, item: &AttentionItem) -> Result<()> {
        let (summary, body) = format_item_notification(&self.registry, item);
        self.backend.send(&summary, &body)
    }
}

fn tier_marker(priority: PriorityTier) -> &'static str {
    match priority {
        PriorityTier::Urgent => "[!] ",
        PriorityTier::Attention | PriorityTier::Fyi => "",
    }
}

/// Formats an item into notification summary and body.
#[must_use]
pub fn format_item_notification(
    registry: &ModuleRegistry,
    item: &AttentionItem,
) -> (String, String) {
    let summary = format!(
        "{}[{}] {}",
        tier_marker(item.priority),
        registry.display_name(&item.module),
        truncate(&item.title, 60)
    );

    let mut body = truncate(&item.summary, 100);
    if !item.action_label.is_empty() {
        if !body.is_empty() {
            body.push_str("\n\n");
        }
        body.push_str("Action: ");
        body.push_str(&truncate(&item.action_label, 40));
    }

    (summary, body)
}

/// Truncates a string to a maximum length, adding "..." if truncated.
/// Handles Unicode correctly by respecting character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncate_at = max_len.saturating_sub(3);
        let truncated: String = s.chars().take(truncate_at).collect();
        format!("{truncated}...")
    }
}
