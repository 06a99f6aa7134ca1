use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use device_adapter::{ObjectHandle, UiDevice};
use tracing::{debug, warn};
use uiauto_core_types::{ElementKey, UiSelector};

use crate::errors::CacheError;

pub const DEFAULT_MAX_ENUMERATION: u32 = 1000;

#[derive(Clone)]
pub struct CachedElement {
    pub key: ElementKey,
    pub handle: ObjectHandle,
    /// Element the node was searched under, if any.
    pub context: Option<ElementKey>,
}

impl std::fmt::Debug for CachedElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedElement")
            .field("key", &self.key)
            .field("selector", &self.handle.selector().to_string())
            .field("context", &self.context)
            .finish()
    }
}

/// Process-lifetime map from keys to element handles. Entries are never
/// evicted; keys come from one counter and are never reused.
pub struct ElementCache {
    next_key: AtomicU64,
    entries: DashMap<ElementKey, CachedElement>,
    max_enumeration: u32,
}

impl Default for ElementCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENUMERATION)
    }
}

impl ElementCache {
    pub fn new(max_enumeration: u32) -> Self {
        Self {
            next_key: AtomicU64::new(1),
            entries: DashMap::new(),
            max_enumeration: max_enumeration.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mints a key for `handle`.
    pub fn store(&self, handle: ObjectHandle, context: Option<&ElementKey>) -> ElementKey {
        let key = ElementKey::new(self.next_key.fetch_add(1, Ordering::SeqCst).to_string());
        debug!(key = %key, selector = %handle.selector(), "caching element");
        self.entries.insert(
            key.clone(),
            CachedElement {
                key: key.clone(),
                handle,
                context: context.cloned(),
            },
        );
        key
    }

    /// Entry for `key` without checking that its node is still attached.
    pub fn lookup(&self, key: &ElementKey) -> Option<CachedElement> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Live handle for `key`. Device failures other than a detached node
    /// pass through as [`CacheError::Device`].
    pub async fn resolve(&self, key: &ElementKey) -> Result<ObjectHandle, CacheError> {
        let entry = self
            .lookup(key)
            .ok_or_else(|| CacheError::NotInHash(key.to_string()))?;
        if entry.handle.exists().await? {
            Ok(entry.handle)
        } else {
            Err(CacheError::Stale(key.to_string()))
        }
    }

    /// Finds the first match of `selector`, under `context` when given, and
    /// caches it.
    pub async fn get_element(
        &self,
        device: &dyn UiDevice,
        selector: &UiSelector,
        context: Option<&ElementKey>,
    ) -> Result<Option<ElementKey>, CacheError> {
        let found = self.find_handle(device, selector, context).await?;
        Ok(found.map(|handle| self.store(handle, context)))
    }

    /// Caches every match of `selector` by probing increasing instance
    /// numbers on its target level until nothing matches.
    pub async fn get_elements(
        &self,
        device: &dyn UiDevice,
        selector: &UiSelector,
        context: Option<&ElementKey>,
    ) -> Result<Vec<ElementKey>, CacheError> {
        if selector.target().instance_index().is_some() {
            let single = self.get_element(device, selector, context).await?;
            return Ok(single.into_iter().collect());
        }

        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for instance in 0..self.max_enumeration {
            let probe = selector.with_target_instance(instance);
            let Some(handle) = self.find_handle(device, &probe, context).await? else {
                break;
            };
            if seen.insert(handle.fingerprint()) {
                keys.push(self.store(handle, context));
            }
            if instance + 1 == self.max_enumeration {
                warn!(
                    selector = %selector,
                    limit = self.max_enumeration,
                    "stopped enumerating matches at the configured limit"
                );
            }
        }
        Ok(keys)
    }

    /// First match of `selector` without caching it.
    pub async fn find_handle(
        &self,
        device: &dyn UiDevice,
        selector: &UiSelector,
        context: Option<&ElementKey>,
    ) -> Result<Option<ObjectHandle>, CacheError> {
        match context {
            None => Ok(device.find_object(selector).await?),
            Some(key) => {
                let parent = self.resolve(key).await?;
                Ok(parent.child(selector).await?)
            }
        }
    }
}
