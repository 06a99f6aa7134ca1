//! State shared by every handler for the lifetime of the agent.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use action_locator::{ElementFinder, SelectorResolver};
use action_primitives::GestureSynthesizer;
use device_adapter::{ObjectHandle, StringTable, UiDevice};
use tracing::info;
use uiauto_registry::ElementCache;

use crate::errors::CommandError;
use crate::model::Command;
use crate::settings::AgentSettings;

pub struct AgentContext {
    device: Arc<dyn UiDevice>,
    cache: Arc<ElementCache>,
    finder: ElementFinder,
    gestures: GestureSynthesizer,
    strings: Arc<StringTable>,
    compressed: AtomicBool,
    settings: AgentSettings,
}

impl AgentContext {
    pub fn new(device: Arc<dyn UiDevice>, settings: AgentSettings) -> Self {
        Self::with_strings(device, settings, Arc::new(StringTable::new()))
    }

    pub fn with_strings(
        device: Arc<dyn UiDevice>,
        settings: AgentSettings,
        strings: Arc<StringTable>,
    ) -> Self {
        let cache = Arc::new(ElementCache::new(settings.max_enumeration));
        let resolver = SelectorResolver::new(device.clone(), strings.clone())
            .with_app_package(settings.app_package.clone())
            .with_max_enumeration(settings.max_enumeration);
        Self {
            finder: ElementFinder::new(cache.clone(), resolver),
            gestures: GestureSynthesizer::new(device.clone(), settings.gesture_config()),
            compressed: AtomicBool::new(settings.compressed_layout),
            device,
            cache,
            strings,
            settings,
        }
    }

    pub fn device(&self) -> &dyn UiDevice {
        self.device.as_ref()
    }

    pub fn cache(&self) -> &ElementCache {
        &self.cache
    }

    pub fn finder(&self) -> &ElementFinder {
        &self.finder
    }

    pub fn gestures(&self) -> &GestureSynthesizer {
        &self.gestures
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn compressed_layout(&self) -> bool {
        self.compressed.load(Ordering::SeqCst)
    }

    pub fn set_compressed_layout(&self, compressed: bool) {
        self.compressed.store(compressed, Ordering::SeqCst);
    }

    /// Replaces the string table with the JSON object stored at `path`.
    pub async fn load_strings(&self, path: &Path) -> Result<usize, CommandError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            CommandError::Unknown(format!("could not read strings from {}: {e}", path.display()))
        })?;
        let count = self.strings.replace_json(&raw)?;
        info!(path = %path.display(), count, "loaded string resources");
        Ok(count)
    }

    /// Live handle for the command's element; the element id is required.
    pub async fn element(&self, command: &Command) -> Result<ObjectHandle, CommandError> {
        let key = command
            .element_key()
            .ok_or_else(|| CommandError::missing("elementId"))?;
        Ok(self.cache.resolve(&key).await?)
    }

    pub async fn optional_element(
        &self,
        command: &Command,
    ) -> Result<Option<ObjectHandle>, CommandError> {
        match command.element_key() {
            Some(key) => Ok(Some(self.cache.resolve(&key).await?)),
            None => Ok(None),
        }
    }
}
