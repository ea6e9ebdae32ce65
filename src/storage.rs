//! Key-value persistence: player name, settings flags and the leaderboard
//! all go through an opaque get/set string store.

use std::collections::HashMap;
use std::path::PathBuf;

use log::warn;

pub const PLAYER_NAME_KEY: &str = "player_name";
pub const NARRATION_KEY: &str = "narration_enabled";
pub const SUSPENSE_KEY: &str = "suspense_enabled";
pub const RANKINGS_KEY: &str = "rankings";

pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

impl<S: KvStore + ?Sized> KvStore for &mut S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        (**self).set(key, value)
    }
}

/// Boolean settings flags are serialized as JSON `"true"`/`"false"`;
/// anything unreadable falls back to the default.
pub fn get_flag(store: &impl KvStore, key: &str, default: bool) -> bool {
    store
        .get(key)
        .and_then(|value| serde_json::from_str(&value).ok())
        .unwrap_or(default)
}

pub fn set_flag(store: &mut impl KvStore, key: &str, value: bool) {
    store.set(key, if value { "true" } else { "false" });
}

/// File-backed store: one JSON object per file, loaded once at open and
/// rewritten on every set. I/O failures are logged and swallowed - losing a
/// setting must never break the game.
pub struct FileStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!("store file {} is corrupt ({err}), starting empty", path.display());
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self { path, values }
    }

    fn persist(&self) {
        let raw = match serde_json::to_string_pretty(&self.values) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("failed to serialize store: {err}");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, raw) {
            warn!("failed to write store file {}: {err}", self.path.display());
        }
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.persist();
    }
}

#[cfg(test)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }
}

#[cfg(test)]
impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}
