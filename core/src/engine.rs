//! The attention store: intake, queries, dismissal, focus mode and
//! change subscriptions.
//!
//! [`AttentionEngine`] is an explicit context object. Construct it once at
//! process start and share it by `Arc` with producers and UI consumers.
//!
//! Every mutating call is indivisible: the bundler and store are updated
//! under the state lock, the lock is released, and subscribers are then
//! called synchronously, once, before the next mutation may begin.
//! Subscribers may read counts and lists from inside a callback but must not
//! mutate the engine there, and should hand any slow work off elsewhere.
//!
//! In-memory state is updated synchronously and is the source of truth for
//! the session. The async variants (`add_item`, `dismiss`, `set_focus`) then
//! write the new state to the storage collaborator and report its outcome;
//! the engine never retries.

use crate::bundler::{bundle_title, Bundler};
use crate::classifier::{parse_due_date, Classifier, DueDate, DUE_DATE_KEY, STARTS_AT_KEY};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{AttentionError, Result};
use crate::focus::{should_deliver, should_deliver_bundle};
use crate::notify::{NotificationBackend, Notifier};
use crate::persistence::{AttentionSnapshot, KeyValueStore, FOCUS_KEY, SNAPSHOT_KEY};
use crate::registry::ModuleRegistry;
use schema::{
    AttentionBundle, AttentionCounts, AttentionEvent, AttentionFilter, AttentionItem, BundleState,
    DismissTarget, FocusModeSettings, NewAttentionItem,
};
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Result of admitting an item.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// The stored item
    pub item: AttentionItem,
    /// Bundle the item landed in
    pub bundle_id: String,
    /// Whether the item opened that bundle
    pub is_new_bundle: bool,
    /// Whether the focus filter let the item surface live
    pub delivered: bool,
}

type Callback = dyn Fn(&AttentionEvent) + Send + Sync;

#[derive(Default)]
struct SubscriberList {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Arc<Callback>)>>,
}

impl SubscriberList {
    fn entries(&self) -> MutexGuard<'_, Vec<(u64, Arc<Callback>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add(&self, callback: Arc<Callback>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.entries().push((id, callback));
        id
    }

    fn remove(&self, id: u64) {
        self.entries().retain(|(entry_id, _)| *entry_id != id);
    }

    fn snapshot(&self) -> Vec<(u64, Arc<Callback>)> {
        self.entries().clone()
    }
}

/// Handle returned by [`AttentionEngine::subscribe`].
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to stop receiving events.
pub struct Subscription {
    id: u64,
    list: Weak<SubscriberList>,
    active: AtomicBool,
}

impl Subscription {
    /// Stops delivery to this subscriber. Safe to call more than once.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            if let Some(list) = self.list.upgrade() {
                list.remove(self.id);
            }
        }
    }

    /// Whether the subscription still receives events.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && self.list.strong_count() > 0
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

struct EngineState {
    bundler: Bundler,
    focus: FocusModeSettings,
}

/// Builder for [`AttentionEngine`].
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
    storage: Option<Arc<dyn KeyValueStore>>,
    backend: Option<Box<dyn NotificationBackend>>,
    focus: Option<FocusModeSettings>,
}

impl EngineBuilder {
    /// Uses the given thresholds and module registrations.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses the given time source instead of the system clock.
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Persists state through the given storage collaborator.
    #[must_use]
    pub fn storage(mut self, storage: impl KeyValueStore + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Sends live notifications for delivered items through `backend`.
    #[must_use]
    pub fn notifier(mut self, backend: impl NotificationBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    /// Initial focus-mode settings (disabled by default).
    #[must_use]
    pub fn focus(mut self, settings: FocusModeSettings) -> Self {
        self.focus = Some(settings);
        self
    }

    /// Builds an engine with empty state.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::Configuration`] if the config is invalid.
    pub fn build(self) -> Result<AttentionEngine> {
        self.config.validate()?;
        let registry = ModuleRegistry::from_config(&self.config);
        let classifier = Classifier::new(&self.config);
        let bundler = Bundler::new(&self.config, registry.clone());

        Ok(AttentionEngine {
            classifier,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            storage: self.storage,
            notifier: self.backend.map(|backend| Notifier::new(backend, registry)),
            state: Mutex::new(EngineState {
                bundler,
                focus: self.focus.unwrap_or_default(),
            }),
            mutation: Mutex::new(()),
            persist: tokio::sync::Mutex::new(()),
            subscribers: Arc::new(SubscriberList::default()),
            config: self.config,
        })
    }

    /// Builds an engine and loads any state previously persisted in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or storage cannot be read.
    /// Unreadable snapshots are logged and ignored.
    pub async fn restore(self) -> Result<AttentionEngine> {
        let engine = self.build()?;
        engine.reload().await?;
        Ok(engine)
    }
}

/// Cross-module attention store.
pub struct AttentionEngine {
    config: EngineConfig,
    classifier: Classifier,
    clock: Arc<dyn Clock>,
    storage: Option<Arc<dyn KeyValueStore>>,
    notifier: Option<Notifier<Box<dyn NotificationBackend>>>,
    state: Mutex<EngineState>,
    mutation: Mutex<()>,
    persist: tokio::sync::Mutex<()>,
    subscribers: Arc<SubscriberList>,
}

impl std::fmt::Debug for AttentionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttentionEngine")
            .field("config", &self.config)
            .field("persistent", &self.storage.is_some())
            .finish_non_exhaustive()
    }
}

impl AttentionEngine {
    /// Starts building an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// In-memory engine with the given config and the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::Configuration`] if the config is invalid.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_mutation(&self) -> MutexGuard<'_, ()> {
        self.mutation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Intake ---

    /// Validates, classifies and bundles an item, then notifies subscribers.
    /// In-memory only; see [`Self::add_item`] for the persisted variant.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::InvalidItem`] for a missing module, an empty
    /// title, or a malformed `dueDate`/`startsAt`. Nothing is stored then.
    pub fn admit_item(&self, raw: NewAttentionItem) -> Result<Admission> {
        validate(&raw)?;

        let _mutation = self.begin_mutation();
        let now = self.clock.now();
        let module = raw.module.trim().to_string();
        let item = AttentionItem {
            id: raw.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            priority: self.classifier.classify(&module, &raw.metadata, now),
            module,
            title: raw.title,
            summary: raw.summary,
            action_label: raw.action_label,
            created_at: now,
            metadata: raw.metadata,
        };

        let (admitted, delivered) = {
            let mut state = self.lock_state();
            state.bundler.sweep(now);
            let admitted = state.bundler.admit(item.clone())?;
            (admitted, should_deliver(&item, &state.focus))
        };

        debug!(
            "Admitted {} item {} into {} (new bundle: {}, delivered: {})",
            item.priority, item.id, admitted.bundle_id, admitted.is_new_bundle, delivered
        );

        // One live notification per bundle; later members only update the list.
        if delivered && admitted.is_new_bundle {
            if let Some(notifier) = &self.notifier {
                if let Err(e) = notifier.send_item(&item) {
                    warn!("Live notification for {} failed: {}", item.id, e);
                }
            }
        }

        self.publish(&AttentionEvent::ItemAdded {
            item_id: item.id.clone(),
            bundle_id: admitted.bundle_id.clone(),
            module: item.module.clone(),
            priority: item.priority,
            is_new_bundle: admitted.is_new_bundle,
            delivered,
        });

        Ok(Admission {
            item,
            bundle_id: admitted.bundle_id,
            is_new_bundle: admitted.is_new_bundle,
            delivered,
        })
    }

    /// [`Self::admit_item`] followed by persisting the new state.
    ///
    /// The admission is returned together with the persistence outcome, so
    /// the caller can still reference the stored item when saving failed.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::InvalidItem`] before any mutation. A storage
    /// failure is reported as `Err(AttentionError::Persistence)` in the second
    /// element while the in-memory state already holds the item.
    pub async fn add_item(&self, raw: NewAttentionItem) -> Result<(Admission, Result<()>)> {
        let admission = self.admit_item(raw)?;
        let persisted = self.persist_snapshot().await;
        if let Err(e) = &persisted {
            warn!("Item {} admitted but not persisted: {}", admission.item.id, e);
        }
        Ok((admission, persisted))
    }

    // --- Queries ---

    /// Undismissed item counts per tier, honouring focus mode. This is the
    /// badge view.
    #[must_use]
    pub fn get_counts(&self) -> AttentionCounts {
        self.counts(true)
    }

    /// Undismissed item counts per tier; `respect_focus = false` includes
    /// items suppressed by focus mode.
    #[must_use]
    pub fn counts(&self, respect_focus: bool) -> AttentionCounts {
        let state = self.lock_state();
        let mut counts = AttentionCounts::default();
        for bundle in state.bundler.bundles() {
            if bundle.is_dismissed() {
                continue;
            }
            if respect_focus && !should_deliver_bundle(bundle, &state.focus) {
                continue;
            }
            counts.add(bundle.priority, bundle.visible_len());
        }
        counts
    }

    /// Undismissed bundles matching the filter, newest first. Dismissed
    /// members are left out of the returned copies.
    #[must_use]
    pub fn get_all(&self, filter: &AttentionFilter) -> Vec<AttentionBundle> {
        let now = self.clock.now();
        let window = self.config.bundle_window_delta();
        let state = self.lock_state();
        let registry = state.bundler.registry();

        let mut bundles: Vec<AttentionBundle> = state
            .bundler
            .bundles()
            .iter()
            .rev()
            .filter(|bundle| !bundle.is_dismissed())
            .filter(|bundle| filter.module.as_deref().map_or(true, |m| bundle.module == m))
            .filter(|bundle| filter.priority.map_or(true, |p| bundle.priority == p))
            .filter(|bundle| !filter.respect_focus || should_deliver_bundle(bundle, &state.focus))
            .map(|bundle| {
                let mut view = bundle.clone();
                view.items.retain(|item| !bundle.dismissed_item_ids.contains(&item.id));
                view.dismissed_item_ids = BTreeSet::new();
                view.title = bundle_title(registry, &view);
                if view.state == BundleState::Open && now - view.window_start > window {
                    view.state = BundleState::Closed;
                }
                view
            })
            .collect();

        bundles.sort_by(|a, b| b.window_start.cmp(&a.window_start));
        if let Some(limit) = filter.limit {
            bundles.truncate(limit);
        }
        bundles
    }

    /// Looks up a stored item, dismissed or not.
    #[must_use]
    pub fn get_item(&self, item_id: &str) -> Option<AttentionItem> {
        self.lock_state().bundler.item(item_id).cloned()
    }

    /// Looks up a stored bundle as tracked, dismissed members included.
    #[must_use]
    pub fn get_bundle(&self, bundle_id: &str) -> Option<AttentionBundle> {
        self.lock_state().bundler.bundle(bundle_id).cloned()
    }

    // --- Dismissal ---

    /// Dismisses a bundle or a single item. In-memory only.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::UnknownEntity`] when the id matches no
    /// undismissed bundle or item; nothing changes and no event is emitted.
    pub fn dismiss_now(&self, id: &str) -> Result<DismissTarget> {
        let _mutation = self.begin_mutation();

        let outcome = {
            let mut state = self.lock_state();
            if state.bundler.is_bundle(id) {
                state
                    .bundler
                    .dismiss_bundle(id)
                    .map(|bundle_id| (DismissTarget::Bundle, bundle_id))
            } else {
                state
                    .bundler
                    .dismiss_item(id)
                    .map(|bundle_id| (DismissTarget::Item, bundle_id))
            }
        };

        let Some((target, bundle_id)) = outcome else {
            warn!("Dismiss ignored: {} is not a tracked attention entity", id);
            return Err(AttentionError::UnknownEntity(id.to_string()));
        };

        debug!("Dismissed {:?} {}", target, id);
        self.publish(&AttentionEvent::Dismissed {
            id: id.to_string(),
            target,
            bundle_id,
        });
        Ok(target)
    }

    /// [`Self::dismiss_now`] followed by persisting the new state.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::UnknownEntity`] for untracked ids, or
    /// [`AttentionError::Persistence`] after the dismissal took effect.
    pub async fn dismiss(&self, id: &str) -> Result<DismissTarget> {
        let target = self.dismiss_now(id)?;
        self.persist_snapshot().await?;
        Ok(target)
    }

    // --- Focus mode ---

    /// Current focus-mode settings.
    #[must_use]
    pub fn focus_settings(&self) -> FocusModeSettings {
        self.lock_state().focus.clone()
    }

    /// Replaces focus-mode settings and notifies subscribers. In-memory only.
    pub fn update_focus(&self, settings: FocusModeSettings) {
        let _mutation = self.begin_mutation();
        self.lock_state().focus = settings.clone();
        info!(
            "Focus mode {} ({} allowed modules)",
            if settings.enabled { "enabled" } else { "disabled" },
            settings.allowed_modules.len()
        );
        self.publish(&AttentionEvent::FocusChanged { settings });
    }

    /// [`Self::update_focus`] followed by persisting the settings.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::Persistence`] after the settings took effect.
    pub async fn set_focus(&self, settings: FocusModeSettings) -> Result<()> {
        self.update_focus(settings);
        self.persist_focus().await
    }

    // --- Subscriptions ---

    /// Registers a callback invoked synchronously after every mutation.
    ///
    /// A panicking callback is logged and does not affect other subscribers
    /// or the mutating call.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AttentionEvent) + Send + Sync + 'static,
    {
        let id = self.subscribers.add(Arc::new(callback));
        Subscription {
            id,
            list: Arc::downgrade(&self.subscribers),
            active: AtomicBool::new(true),
        }
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.entries().len()
    }

    fn publish(&self, event: &AttentionEvent) {
        for (id, callback) in self.subscribers.snapshot() {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(event))) {
                error!(
                    "Attention subscriber {} panicked on {}: {}",
                    id,
                    event.event_type(),
                    panic_message(panic.as_ref())
                );
            }
        }
    }

    // --- Persistence ---

    /// Writes bundles and focus settings to storage.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::Persistence`] if either write fails.
    pub async fn flush(&self) -> Result<()> {
        self.persist_snapshot().await?;
        self.persist_focus().await
    }

    async fn persist_snapshot(&self) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let _persist = self.persist.lock().await;
        let raw = {
            let state = self.lock_state();
            AttentionSnapshot::new(state.bundler.bundles().to_vec(), self.clock.now()).encode()?
        };
        storage
            .set(SNAPSHOT_KEY, raw)
            .await
            .map_err(into_persistence)
    }

    async fn persist_focus(&self) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let _persist = self.persist.lock().await;
        let raw = serde_json::to_string(&self.focus_settings())?;
        storage.set(FOCUS_KEY, raw).await.map_err(into_persistence)
    }

    /// Replaces in-memory state with what storage holds.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::Persistence`] if storage cannot be read.
    /// Unreadable snapshots or settings are logged and replaced by empty
    /// state.
    pub async fn reload(&self) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };

        let bundles = match storage.get(SNAPSHOT_KEY).await.map_err(into_persistence)? {
            Some(raw) => match AttentionSnapshot::decode(&raw) {
                Ok(snapshot) => snapshot.bundles,
                Err(e) => {
                    warn!("Ignoring unreadable attention snapshot: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let focus = match storage.get(FOCUS_KEY).await.map_err(into_persistence)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring unreadable focus settings: {}", e);
                FocusModeSettings::default()
            }),
            None => FocusModeSettings::default(),
        };

        let bundle_count = bundles.len();
        {
            let _mutation = self.begin_mutation();
            {
                let mut state = self.lock_state();
                state.bundler.restore(bundles);
                state.bundler.sweep(self.clock.now());
                state.focus = focus;
            }
            info!("Restored {} attention bundles", bundle_count);
            self.publish(&AttentionEvent::Restored { bundle_count });
        }
        Ok(())
    }
}

fn validate(raw: &NewAttentionItem) -> Result<()> {
    if raw.module.trim().is_empty() {
        return Err(AttentionError::InvalidItem("module is required".into()));
    }
    if raw.title.trim().is_empty() {
        return Err(AttentionError::InvalidItem("title is required".into()));
    }
    if raw.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
        return Err(AttentionError::InvalidItem("id cannot be empty".into()));
    }
    for key in [DUE_DATE_KEY, STARTS_AT_KEY] {
        if let DueDate::Malformed(value) = parse_due_date(raw.metadata.get(key)) {
            return Err(AttentionError::InvalidItem(format!(
                "metadata.{key} is not a date: {value}"
            )));
        }
    }
    Ok(())
}

fn into_persistence(err: AttentionError) -> AttentionError {
    match err {
        AttentionError::Persistence(_) => err,
        other => AttentionError::Persistence(other.to_string()),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
