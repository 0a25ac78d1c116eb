use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::OnceCell;
use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

use crate::settings::source::SettingsSource;
use crate::settings::types::LllSettings;

/// Per-resource settings, fetched lazily and kept until invalidated.
///
/// Each resource owns a [`OnceCell`]; callers racing on the same uncached
/// resource all await the single query issued by whichever got there first.
/// A failed query leaves the cell empty, so the next `get` asks again.
///
/// When the client cannot answer `workspace/configuration` the cache runs in
/// global mode and hands out one settings value for every resource.
pub struct SettingsCache {
    source: Arc<dyn SettingsSource>,
    per_resource: AtomicBool,
    global: RwLock<LllSettings>,
    entries: Mutex<HashMap<Url, Arc<OnceCell<LllSettings>>>>,
}

impl SettingsCache {
    pub fn new(source: Arc<dyn SettingsSource>) -> Self {
        Self {
            source,
            per_resource: AtomicBool::new(false),
            global: RwLock::new(LllSettings::default()),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Switches between per-resource queries and the global value.
    pub fn set_per_resource(&self, enabled: bool) {
        self.per_resource.store(enabled, Ordering::Release);
    }

    pub fn is_per_resource(&self) -> bool {
        self.per_resource.load(Ordering::Acquire)
    }

    /// Replaces the value used in global mode.
    pub fn set_global(&self, settings: LllSettings) {
        *self.global.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    pub fn global(&self) -> LllSettings {
        self.global
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Claims the cache entry for `uri`; [`SettingsLookup::resolve`] then
    /// queries the client at most once per entry.
    ///
    /// The entry exists from this call on, so an `invalidate` issued after it
    /// also drops whatever the returned lookup resolves to.
    pub fn lookup(&self, uri: &Url) -> SettingsLookup<'_> {
        let cell = self.is_per_resource().then(|| {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(uri.clone()).or_default())
        });

        SettingsLookup {
            cache: self,
            uri: uri.clone(),
            cell,
        }
    }

    /// Drops the entry for one resource.
    pub fn invalidate(&self, uri: &Url) {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(uri);
        if removed.is_some() {
            debug!(uri = %uri, "settings cache entry invalidated");
        }
    }

    /// Drops every entry. Queries still in flight resolve into cells that are
    /// no longer reachable, so their results are never reused.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(count = entries.len(), "settings cache cleared");
        entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A claimed cache entry, see [`SettingsCache::lookup`]
pub struct SettingsLookup<'a> {
    cache: &'a SettingsCache,
    uri: Url,
    /// `None` in global mode
    cell: Option<Arc<OnceCell<LllSettings>>>,
}

impl SettingsLookup<'_> {
    /// Returns the settings, falling back to the defaults when the query fails.
    pub async fn resolve(self) -> LllSettings {
        let Some(cell) = self.cell else {
            return self.cache.global();
        };

        let source = &self.cache.source;
        let uri = &self.uri;
        let result = cell
            .get_or_try_init(|| async {
                source.fetch(uri).await.and_then(LllSettings::validated)
            })
            .await;

        match result {
            Ok(settings) => settings.clone(),
            Err(e) => {
                warn!(uri = %uri, error = %e, "Failed to fetch settings, using defaults");
                LllSettings::default()
            }
        }
    }
}
