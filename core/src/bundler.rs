//! Time- and size-bounded grouping of items into bundles
//!
//! Items from the same module and tier that arrive within the bundle window
//! of the bundle's first item are appended to it, up to the maximum bundle
//! size. A bundle that reached its size limit or whose window elapsed is
//! closed and never accepts items again; matching items open a new bundle.
//! Window expiry is checked against the arriving item's timestamp before
//! every admission decision, with no grace period.

use crate::config::EngineConfig;
use crate::error::{AttentionError, Result};
use crate::registry::ModuleRegistry;
use chrono::{DateTime, Duration, Utc};
use schema::{AttentionBundle, AttentionItem, BundleState, PriorityTier};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Outcome of admitting an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleAdmission {
    /// Bundle the item was placed in
    pub bundle_id: String,
    /// Whether the item opened that bundle
    pub is_new_bundle: bool,
}

type BundleKey = (String, PriorityTier);

/// Owner of every bundle and the open-bundle index.
#[derive(Debug)]
pub struct Bundler {
    window: Duration,
    max_size: usize,
    registry: ModuleRegistry,
    bundles: Vec<AttentionBundle>,
    by_id: HashMap<String, usize>,
    by_item: HashMap<String, usize>,
    open: HashMap<BundleKey, usize>,
}

impl Bundler {
    /// Creates an empty bundler.
    #[must_use]
    pub fn new(config: &EngineConfig, registry: ModuleRegistry) -> Self {
        Self {
            window: config.bundle_window_delta(),
            max_size: config.max_bundle_size.max(1),
            registry,
            bundles: Vec::new(),
            by_id: HashMap::new(),
            by_item: HashMap::new(),
            open: HashMap::new(),
        }
    }

    /// Module registry used for titles.
    #[must_use]
    pub const fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Places an item into the most recent open bundle for its module and
    /// tier, or into a new bundle when that one is full, expired or missing.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::InvalidItem`] for an empty module, an empty
    /// id, or an id that is already tracked.
    pub fn admit(&mut self, item: AttentionItem) -> Result<BundleAdmission> {
        if item.module.trim().is_empty() {
            return Err(AttentionError::InvalidItem("module is required".into()));
        }
        if item.id.trim().is_empty() {
            return Err(AttentionError::InvalidItem("id cannot be empty".into()));
        }
        if self.by_item.contains_key(&item.id) {
            return Err(AttentionError::InvalidItem(format!(
                "duplicate item id {}",
                item.id
            )));
        }

        let key: BundleKey = (item.module.clone(), item.priority);

        if let Some(&pos) = self.open.get(&key) {
            if self.accepts(pos, item.created_at) {
                return Ok(self.append(pos, key, item));
            }
            self.close(pos);
        }

        Ok(self.open_new(key, item))
    }

    fn accepts(&self, pos: usize, at: DateTime<Utc>) -> bool {
        let bundle = &self.bundles[pos];
        bundle.state == BundleState::Open
            && at - bundle.window_start <= self.window
            && bundle.items.len() < self.max_size
    }

    fn append(&mut self, pos: usize, key: BundleKey, item: AttentionItem) -> BundleAdmission {
        self.by_item.insert(item.id.clone(), pos);
        let bundle = &mut self.bundles[pos];
        bundle.items.push(item);
        bundle.title = bundle_title(&self.registry, bundle);
        let bundle_id = bundle.id.clone();
        debug!(
            "Appended to bundle {} ({} items)",
            bundle_id,
            bundle.items.len()
        );

        if bundle.items.len() >= self.max_size {
            self.close(pos);
            self.open.remove(&key);
        }

        BundleAdmission {
            bundle_id,
            is_new_bundle: false,
        }
    }

    fn open_new(&mut self, key: BundleKey, item: AttentionItem) -> BundleAdmission {
        let id = self.next_bundle_id(&item.module, item.created_at);
        let pos = self.bundles.len();

        let mut bundle = AttentionBundle {
            id: id.clone(),
            module: item.module.clone(),
            priority: item.priority,
            title: String::new(),
            window_start: item.created_at,
            items: Vec::with_capacity(self.max_size),
            state: BundleState::Open,
            dismissed_item_ids: BTreeSet::new(),
        };
        self.by_item.insert(item.id.clone(), pos);
        bundle.items.push(item);
        bundle.title = bundle_title(&self.registry, &bundle);
        if bundle.items.len() >= self.max_size {
            bundle.state = BundleState::Closed;
        }

        let still_open = bundle.state == BundleState::Open;
        self.bundles.push(bundle);
        self.by_id.insert(id.clone(), pos);
        if still_open {
            self.open.insert(key, pos);
        } else {
            self.open.remove(&key);
        }

        debug!("Opened bundle {}", id);
        BundleAdmission {
            bundle_id: id,
            is_new_bundle: true,
        }
    }

    fn close(&mut self, pos: usize) {
        let bundle = &mut self.bundles[pos];
        if bundle.state == BundleState::Open {
            bundle.state = BundleState::Closed;
            debug!("Closed bundle {}", bundle.id);
        }
        let key = (bundle.module.clone(), bundle.priority);
        if self.open.get(&key) == Some(&pos) {
            self.open.remove(&key);
        }
    }

    fn next_bundle_id(&self, module: &str, at: DateTime<Utc>) -> String {
        let base = format!("bundle-{}-{}", module, at.timestamp_millis());
        if !self.by_id.contains_key(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !self.by_id.contains_key(candidate))
            .unwrap_or(base)
    }

    /// Closes open bundles whose window elapsed by `now`. Returns how many.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let expired: Vec<usize> = self
            .open
            .values()
            .copied()
            .filter(|&pos| now - self.bundles[pos].window_start > self.window)
            .collect();
        for &pos in &expired {
            self.close(pos);
        }
        expired.len()
    }

    /// Dismisses a whole bundle. Returns `None` when the id is unknown or the
    /// bundle was already dismissed.
    pub fn dismiss_bundle(&mut self, bundle_id: &str) -> Option<String> {
        let pos = *self.by_id.get(bundle_id)?;
        if self.bundles[pos].is_dismissed() {
            return None;
        }
        self.close(pos);
        self.bundles[pos].state = BundleState::Dismissed;
        Some(self.bundles[pos].id.clone())
    }

    /// Dismisses a single item. The bundle becomes dismissed once every
    /// member is. Returns the bundle id, or `None` when the item is unknown
    /// or already dismissed.
    pub fn dismiss_item(&mut self, item_id: &str) -> Option<String> {
        let pos = *self.by_item.get(item_id)?;
        if self.bundles[pos].is_dismissed()
            || self.bundles[pos].dismissed_item_ids.contains(item_id)
        {
            return None;
        }

        self.bundles[pos]
            .dismissed_item_ids
            .insert(item_id.to_string());
        if self.bundles[pos].visible_len() == 0 {
            self.close(pos);
            self.bundles[pos].state = BundleState::Dismissed;
        }
        Some(self.bundles[pos].id.clone())
    }

    /// All bundles in creation order, dismissed ones included.
    #[must_use]
    pub fn bundles(&self) -> &[AttentionBundle] {
        &self.bundles
    }

    /// Looks up a bundle by id.
    #[must_use]
    pub fn bundle(&self, bundle_id: &str) -> Option<&AttentionBundle> {
        self.by_id.get(bundle_id).map(|&pos| &self.bundles[pos])
    }

    /// Looks up the bundle holding an item.
    #[must_use]
    pub fn bundle_of_item(&self, item_id: &str) -> Option<&AttentionBundle> {
        self.by_item.get(item_id).map(|&pos| &self.bundles[pos])
    }

    /// Looks up an item by id.
    #[must_use]
    pub fn item(&self, item_id: &str) -> Option<&AttentionItem> {
        self.bundle_of_item(item_id)?
            .items
            .iter()
            .find(|item| item.id == item_id)
    }

    /// Whether an id names a tracked bundle or item.
    #[must_use]
    pub fn is_bundle(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Replaces all state with previously persisted bundles.
    pub fn restore(&mut self, bundles: Vec<AttentionBundle>) {
        self.bundles = bundles;
        self.by_id.clear();
        self.by_item.clear();
        self.open.clear();

        for (pos, bundle) in self.bundles.iter().enumerate() {
            self.by_id.insert(bundle.id.clone(), pos);
            for item in &bundle.items {
                self.by_item.insert(item.id.clone(), pos);
            }
            if bundle.state == BundleState::Open {
                self.open
                    .insert((bundle.module.clone(), bundle.priority), pos);
            }
        }
    }
}

/// Display title: the item's own title for a single member, otherwise
/// `"{N} {Module} updates"`.
#[must_use]
pub fn bundle_title(registry: &ModuleRegistry, bundle: &AttentionBundle) -> String {
    match bundle.items.as_slice() {
        [only] => only.title.clone(),
        items => format!(
            "{} {} updates",
            items.len(),
            registry.display_name(&bundle.module)
        ),
    }
}
