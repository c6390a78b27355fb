//! Durable storage of the cumulative revealed path, keyed by (client, scene).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{UmbraError, UmbraResult};
use crate::geometry::path::{Digest, PathCommands};

/// Key/value contract for persisted fog.
///
/// Engine callers treat write failures as non-fatal: the in-scene update still applies.
pub trait PersistenceStore: Send {
    /// Stored cumulative path, if any.
    fn read(&self, client_id: &str, scene_id: &str) -> UmbraResult<Option<PathCommands>>;

    /// Replace the stored cumulative path.
    fn write(&mut self, client_id: &str, scene_id: &str, commands: &PathCommands)
    -> UmbraResult<()>;

    /// Remove the stored path; absent entries are not an error.
    fn clear(&mut self, client_id: &str, scene_id: &str) -> UmbraResult<()>;
}

/// Process-local store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<(String, String), PathCommands>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PersistenceStore for MemoryStore {
    fn read(&self, client_id: &str, scene_id: &str) -> UmbraResult<Option<PathCommands>> {
        Ok(self
            .entries
            .get(&(client_id.to_string(), scene_id.to_string()))
            .cloned())
    }

    fn write(
        &mut self,
        client_id: &str,
        scene_id: &str,
        commands: &PathCommands,
    ) -> UmbraResult<()> {
        self.entries.insert(
            (client_id.to_string(), scene_id.to_string()),
            commands.clone(),
        );
        Ok(())
    }

    fn clear(&mut self, client_id: &str, scene_id: &str) -> UmbraResult<()> {
        self.entries
            .remove(&(client_id.to_string(), scene_id.to_string()));
        Ok(())
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredFog {
    digest: Digest,
    commands: PathCommands,
}

/// One JSON file per (client, scene) under `root/fog-cache/<client>/<scene>.json`.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Store rooted at `root`; directories are created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing the (client, scene) entry.
    pub fn entry_path(&self, client_id: &str, scene_id: &str) -> PathBuf {
        self.root
            .join("fog-cache")
            .join(sanitize_key(client_id))
            .join(format!("{}.json", sanitize_key(scene_id)))
    }
}

impl PersistenceStore for JsonFileStore {
    #[tracing::instrument(skip(self))]
    fn read(&self, client_id: &str, scene_id: &str) -> UmbraResult<Option<PathCommands>> {
        let path = self.entry_path(client_id, scene_id);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("read fog cache '{}'", path.display()))?;
        let items: Vec<StoredFog> = serde_json::from_str(&text).map_err(|e| {
            UmbraError::storage(format!("corrupt fog cache '{}': {e}", path.display()))
        })?;
        Ok(items
            .into_iter()
            .find(|i| i.digest.is_cumulative())
            .map(|i| i.commands))
    }

    #[tracing::instrument(skip(self, commands), fields(commands = commands.len()))]
    fn write(
        &mut self,
        client_id: &str,
        scene_id: &str,
        commands: &PathCommands,
    ) -> UmbraResult<()> {
        let path = self.entry_path(client_id, scene_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create fog cache dir '{}'", parent.display()))?;
        }
        let items = [StoredFog {
            digest: Digest::cumulative(),
            commands: commands.clone(),
        }];
        let text = serde_json::to_string(&items)?;

        let tmp = path.with_extension("json.tmp");
        let mut guard = TempFileGuard(Some(tmp.clone()));
        std::fs::write(&tmp, text)
            .with_context(|| format!("write fog cache '{}'", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("replace fog cache '{}'", path.display()))?;
        guard.0 = None;
        Ok(())
    }

    fn clear(&mut self, client_id: &str, scene_id: &str) -> UmbraResult<()> {
        let path = self.entry_path(client_id, scene_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(UmbraError::storage(format!(
                "remove fog cache '{}': {e}",
                path.display()
            ))),
        }
    }
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Keep keys to a single safe path component.
fn sanitize_key(key: &str) -> String {
    let s = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();
    if s.is_empty() { "_".to_string() } else { s }
}

#[cfg(test)]
#[path = "../../tests/unit/fog/store.rs"]
mod tests;
