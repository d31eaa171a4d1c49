//! Settings persistence
//!
//! `DataStore` is the opaque per-plugin blob storage; `SettingsStore` layers
//! the defaults overlay on top of it.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::settings::Settings;
use crate::constants::storage;

/// Opaque JSON blob storage keyed by plugin identity
pub trait DataStore {
    /// Returns `None` if nothing was ever saved
    fn load_data(&self) -> Result<Option<Value>>;
    fn save_data(&self, data: &Value) -> Result<()>;
}

/// Stores the blob as `<root>/<plugin-id>/data.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store under the platform config dir (`~/.config/focus-veil/<plugin-id>`)
    pub fn for_plugin(plugin_id: &str) -> Self {
        let mut root = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        root.push(storage::APP_DIR);
        Self::in_dir(&root, plugin_id)
    }

    pub fn in_dir(root: &Path, plugin_id: &str) -> Self {
        Self {
            path: root.join(plugin_id).join(storage::FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataStore for JsonFileStore {
    fn load_data(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No saved settings");
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {:?}", self.path))?;
        let value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {:?}", self.path))?;
        Ok(Some(value))
    }

    fn save_data(&self, data: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(data).context("Failed to serialize settings to JSON")?;

        // Write beside the target and rename so readers never see a torn document
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write settings to {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move settings into place at {:?}", self.path))?;

        debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }
}

/// Loads settings over the defaults and writes the full document back
pub struct SettingsStore {
    backend: Box<dyn DataStore>,
}

impl SettingsStore {
    pub fn new(backend: impl DataStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn load(&self) -> Result<Settings> {
        let saved = self
            .backend
            .load_data()?
            .unwrap_or_else(|| Value::Object(Default::default()));
        let settings = Settings::from_document(&saved)?;
        info!(settings = ?settings, "Loaded settings");
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        let document = settings.to_document()?;
        self.backend.save_data(&document)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// In-memory store that counts writes
    #[derive(Clone, Default)]
    pub struct MemoryStore {
        pub data: Rc<RefCell<Option<Value>>>,
        pub saves: Rc<Cell<usize>>,
    }

    impl MemoryStore {
        pub fn with_data(data: Value) -> Self {
            let store = Self::default();
            *store.data.borrow_mut() = Some(data);
            store
        }
    }

    impl DataStore for MemoryStore {
        fn load_data(&self) -> Result<Option<Value>> {
            Ok(self.data.borrow().clone())
        }

        fn save_data(&self, data: &Value) -> Result<()> {
            *self.data.borrow_mut() = Some(data.clone());
            self.saves.set(self.saves.get() + 1);
            Ok(())
        }
    }
}
