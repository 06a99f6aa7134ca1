//! Element finder: resolves a find request and caches what it locates.

use std::collections::HashSet;
use std::sync::Arc;

use device_adapter::UiDevice;
use tracing::{debug, info, warn};
use uiauto_core_types::{ElementKey, NodeFlag, UiSelector};
use uiauto_registry::ElementCache;

use crate::dynamic::{DynamicMode, DynamicQuery, DynamicSelector};
use crate::errors::LocatorError;
use crate::resolver::SelectorResolver;
use crate::types::{Criteria, FindOutcome, FindRequest, FoundItem};

const LIST_VIEW_CLASS: &str = "android.widget.ListView";

pub struct ElementFinder {
    cache: Arc<ElementCache>,
    resolver: SelectorResolver,
}

impl ElementFinder {
    pub fn new(cache: Arc<ElementCache>, resolver: SelectorResolver) -> Self {
        Self { cache, resolver }
    }

    pub fn cache(&self) -> &Arc<ElementCache> {
        &self.cache
    }

    fn device(&self) -> &dyn UiDevice {
        self.resolver.device().as_ref()
    }

    pub async fn find(&self, request: &FindRequest) -> Result<FindOutcome, LocatorError> {
        if !request.strategy.is_supported() {
            return Err(LocatorError::UnsupportedStrategy(
                request.strategy.token().to_string(),
            ));
        }
        let context = request.context.as_ref();
        if let Some(ctx) = context {
            // Surfaces unknown or detached context keys before searching.
            self.cache.resolve(ctx).await?;
        }

        if let Criteria::Dynamic(query) = &request.criteria {
            return self.find_dynamic(query, request.multiple, context).await;
        }

        let resolved = self
            .resolver
            .resolve(request.strategy, &request.criteria, request.multiple)
            .await?;

        if request.multiple {
            let keys = self.find_all(resolved.predicates(), context).await?;
            info!(strategy = request.strategy.token(), count = keys.len(), "found elements");
            return Ok(FindOutcome::Elements(keys));
        }

        for predicate in resolved.predicates() {
            if let Some(key) = self
                .cache
                .get_element(self.device(), predicate, context)
                .await?
            {
                info!(strategy = request.strategy.token(), key = %key, "found element");
                return Ok(FindOutcome::Element(key));
            }
        }
        Err(not_found())
    }

    /// Every match of every predicate, de-duplicated by node identity.
    async fn find_all(
        &self,
        predicates: &[UiSelector],
        context: Option<&ElementKey>,
    ) -> Result<Vec<ElementKey>, LocatorError> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for predicate in predicates {
            for key in self
                .cache
                .get_elements(self.device(), predicate, context)
                .await?
            {
                let fingerprint = self.cache.lookup(&key).map(|e| e.handle.fingerprint());
                if fingerprint.map_or(true, |fp| seen.insert(fp)) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    async fn find_dynamic(
        &self,
        query: &DynamicQuery,
        multiple: bool,
        context: Option<&ElementKey>,
    ) -> Result<FindOutcome, LocatorError> {
        match query.mode {
            DynamicMode::All => self.find_dynamic_all(query, context).await,
            DynamicMode::Scroll => {
                let container = self.scroll_container().await?;
                for entry in &query.selectors {
                    if let Some(container) = &container {
                        let found = self
                            .device()
                            .scroll_into_view(container, &entry.selector)
                            .await?;
                        debug!(selector = %entry.selector, found, "scrolled for dynamic selector");
                        if !found {
                            continue;
                        }
                    }
                    if let Some(outcome) = self.first_of(entry, context).await? {
                        return Ok(outcome);
                    }
                }
                Err(not_found())
            }
            DynamicMode::First if multiple => {
                let keys = self.find_all(&query.predicates(), context).await?;
                Ok(FindOutcome::Elements(keys))
            }
            DynamicMode::First => {
                for entry in &query.selectors {
                    if let Some(outcome) = self.first_of(entry, context).await? {
                        return Ok(outcome);
                    }
                }
                Err(not_found())
            }
        }
    }

    /// Finalized values first, then de-duplicated elements. Empty is fine.
    async fn find_dynamic_all(
        &self,
        query: &DynamicQuery,
        context: Option<&ElementKey>,
    ) -> Result<FindOutcome, LocatorError> {
        let mut values = Vec::new();
        let mut plain = Vec::new();
        for entry in &query.selectors {
            match entry.finalizer {
                Some(finalizer) => {
                    if let Some(handle) = self
                        .cache
                        .find_handle(self.device(), &entry.selector, context)
                        .await?
                    {
                        values.push(FoundItem::Value(finalizer.apply(handle.as_ref()).await?));
                    }
                }
                None => plain.push(entry.selector.clone()),
            }
        }
        let elements = self.find_all(&plain, context).await?;
        info!(values = values.len(), elements = elements.len(), "dynamic search finished");
        values.extend(elements.into_iter().map(FoundItem::Element));
        Ok(FindOutcome::Items(values))
    }

    async fn first_of(
        &self,
        entry: &DynamicSelector,
        context: Option<&ElementKey>,
    ) -> Result<Option<FindOutcome>, LocatorError> {
        let Some(handle) = self
            .cache
            .find_handle(self.device(), &entry.selector, context)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(match entry.finalizer {
            Some(finalizer) => FindOutcome::Value(finalizer.apply(handle.as_ref()).await?),
            None => FindOutcome::Element(self.cache.store(handle, context)),
        }))
    }

    /// A scrollable list, else any scrollable node.
    async fn scroll_container(&self) -> Result<Option<UiSelector>, LocatorError> {
        let candidates = [
            UiSelector::new()
                .class_name(LIST_VIEW_CLASS)
                .flag(NodeFlag::Scrollable, true),
            UiSelector::new().flag(NodeFlag::Scrollable, true),
        ];
        for candidate in candidates {
            if self.device().find_object(&candidate).await?.is_some() {
                return Ok(Some(candidate));
            }
        }
        warn!("no scrollable container on screen; searching without scrolling");
        Ok(None)
    }
}

fn not_found() -> LocatorError {
    LocatorError::ElementNotFound(
        "An element could not be located on the page using the given search parameters."
            .to_string(),
    )
}
