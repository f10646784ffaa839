//! Comment-preserving routing document editor.
//!
//! The document is hand-maintained, so every mutation parses the existing
//! file into a `toml_edit` document, touches exactly the target key, and
//! writes the whole document back in one write — comments, key order, and
//! formatting elsewhere survive untouched. Mutations are serialized behind
//! a lock: two concurrent edits must not interleave their
//! read-parse-write cycle.

use crate::RoutingDefaults;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use toml_edit::{DocumentMut, Item, Table, value};

/// Mutates the routing document in place.
pub struct ConfigEditor {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ConfigEditor {
    /// Create an editor for the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Create an editor on the global config path (`~/.rudder/rudder.toml`).
    pub fn global() -> Self {
        Self::new(crate::config::config_path())
    }

    /// Set a credential-profile entry, creating the `[routing.profiles]`
    /// table if needed. Replaces any existing entry with the same name.
    pub fn save_profile(&self, name: &str, settings_path: &Path) -> Result<()> {
        let _guard = self.lock.lock().expect("config editor lock poisoned");
        let mut doc = self.read_document()?;

        let routing = ensure_table(doc.as_table_mut(), "routing")?;
        let profiles = ensure_table(routing, "profiles")?;
        profiles.insert(name, value(settings_path.to_string_lossy().as_ref()));

        self.write_document(&doc)?;
        tracing::info!(profile = name, "saved credential profile");
        Ok(())
    }

    /// Remove a credential-profile entry. Returns `false` — without
    /// touching the file — when the file, the table, or the entry does
    /// not exist.
    pub fn delete_profile(&self, name: &str) -> Result<bool> {
        let _guard = self.lock.lock().expect("config editor lock poisoned");
        if !self.path.exists() {
            return Ok(false);
        }
        let mut doc = self.read_document()?;

        let removed = doc
            .get_mut("routing")
            .and_then(Item::as_table_like_mut)
            .and_then(|routing| routing.get_mut("profiles"))
            .and_then(Item::as_table_like_mut)
            .is_some_and(|profiles| profiles.remove(name).is_some());
        if !removed {
            return Ok(false);
        }

        self.write_document(&doc)?;
        tracing::info!(profile = name, "deleted credential profile");
        Ok(true)
    }

    /// Merge the given defaults into `[routing.defaults]`. Only fields set
    /// in `defaults` are written; sibling keys keep their values.
    pub fn update_defaults(&self, defaults: &RoutingDefaults) -> Result<()> {
        let _guard = self.lock.lock().expect("config editor lock poisoned");
        let mut doc = self.read_document()?;

        let routing = ensure_table(doc.as_table_mut(), "routing")?;
        let table = ensure_table(routing, "defaults")?;
        if let Some(provider) = &defaults.provider {
            table.insert("provider", value(provider.as_str()));
        }
        if let Some(model) = &defaults.model {
            table.insert("model", value(model.as_str()));
        }

        self.write_document(&doc)?;
        tracing::info!("updated routing defaults");
        Ok(())
    }

    fn read_document(&self) -> Result<DocumentMut> {
        if !self.path.exists() {
            return Ok(DocumentMut::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        raw.parse::<DocumentMut>()
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    fn write_document(&self, doc: &DocumentMut) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.path, doc.to_string())
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

/// Get or create the named sub-table. Created tables are implicit so a
/// bare `[routing]` header never appears in the written document.
fn ensure_table<'a>(parent: &'a mut Table, key: &str) -> Result<&'a mut Table> {
    let item = parent.entry(key).or_insert_with(|| {
        let mut table = Table::new();
        table.set_implicit(true);
        Item::Table(table)
    });
    item.as_table_mut()
        .with_context(|| format!("config key '{key}' is not a table"))
}
