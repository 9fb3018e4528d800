use lazy_static::lazy_static;
use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex},
};

use super::{Filesystem, Listing};
use crate::{err_at, Result};

type Store = Arc<Mutex<HashMap<String, Vec<u8>>>>;

lazy_static! {
    static ref REGISTRY: Mutex<HashMap<String, Store>> = Mutex::new(HashMap::new());
}

/// An in-memory filesystem backend, addressed by `mem://<name>/...`. Every
/// [`MemoryFs::shared`] call for the same `name` returns a handle onto the
/// same store for the lifetime of the process, so a dry run's writes are
/// visible to anything else resolving that name without touching disk.
#[derive(Clone)]
pub struct MemoryFs {
    store: Store,
}

impl MemoryFs {
    pub fn shared(name: &str) -> MemoryFs {
        let mut registry = REGISTRY.lock().expect("memory fs registry lock poisoned");
        let store = registry
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(HashMap::new())))
            .clone();
        MemoryFs { store }
    }

    /// A store never shared with any other name, for isolated unit tests.
    pub fn isolated() -> MemoryFs {
        MemoryFs {
            store: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

fn norm(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

impl Filesystem for MemoryFs {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let store = self.store.lock().expect("memory fs lock poisoned");
        match store.get(&norm(path)) {
            Some(data) => Ok(data.clone()),
            None => err_at!(Io, msg: "no such file {:?}", path),
        }
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut store = self.store.lock().expect("memory fs lock poisoned");
        store.insert(norm(path), data.to_vec());
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let store = self.store.lock().expect("memory fs lock poisoned");
        let key = norm(path);
        let prefix = format!("{}/", key);
        Ok(store.contains_key(&key) || store.keys().any(|k| k.starts_with(&prefix)))
    }

    fn create_dir_all(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        let mut store = self.store.lock().expect("memory fs lock poisoned");
        store.remove(&norm(path));
        Ok(())
    }

    fn remove_dir_all(&self, path: &str) -> Result<()> {
        let mut store = self.store.lock().expect("memory fs lock poisoned");
        let key = norm(path);
        let prefix = format!("{}/", key);
        store.retain(|k, _| *k != key && !k.starts_with(&prefix));
        Ok(())
    }

    fn list(&self, path: &str) -> Result<Vec<Listing>> {
        let store = self.store.lock().expect("memory fs lock poisoned");
        let key = norm(path);
        let prefix = if key.is_empty() {
            key
        } else {
            format!("{}/", key)
        };

        let mut heads = BTreeSet::new();
        for k in store.keys() {
            if let Some(rest) = k.strip_prefix(&prefix) {
                let head = rest.split('/').next().unwrap_or(rest);
                heads.insert(head.to_string());
            }
        }

        Ok(heads
            .into_iter()
            .map(|name| {
                let full = format!("{}{}", prefix, name);
                let child_prefix = format!("{}/", full);
                let is_dir = store.keys().any(|k| *k != full && k.starts_with(&child_prefix));
                let len = store.get(&full).map(|d| d.len() as u64).unwrap_or(0);
                Listing { path: full, is_dir, len }
            })
            .collect())
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        let mut store = self.store.lock().expect("memory fs lock poisoned");
        match store.remove(&norm(from)) {
            Some(data) => {
                store.insert(norm(to), data);
                Ok(())
            }
            None => err_at!(Io, msg: "no such file {:?}", from),
        }
    }

    fn atomic_move(&self) -> bool {
        true
    }

    fn create_new(&self, path: &str, data: &[u8]) -> Result<bool> {
        let mut store = self.store.lock().expect("memory fs lock poisoned");
        let key = norm(path);
        if store.contains_key(&key) {
            return Ok(false);
        }
        store.insert(key, data.to_vec());
        Ok(true)
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;
