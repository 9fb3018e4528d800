//! `--dry-run` (§6, ambient stack §10.2): a decorator that answers every
//! read truthfully against the wrapped backend but logs and no-ops every
//! mutating call, so the append engine can run its full validate/journal/
//! write sequence against a backend that never actually touches disk.

use super::{Filesystem, Listing};
use crate::Result;

pub struct DryRunFs<'a> {
    inner: &'a dyn Filesystem,
}

impl<'a> DryRunFs<'a> {
    pub fn wrap(inner: &'a dyn Filesystem) -> DryRunFs<'a> {
        DryRunFs { inner }
    }
}

impl<'a> Filesystem for DryRunFs<'a> {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.inner.read(path)
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        log::info!("dry-run: would write {} bytes to {:?}", data.len(), path);
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<bool> {
        self.inner.exists(path)
    }

    fn create_dir_all(&self, path: &str) -> Result<()> {
        log::info!("dry-run: would create directory {:?}", path);
        Ok(())
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        log::info!("dry-run: would remove {:?}", path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &str) -> Result<()> {
        log::info!("dry-run: would recursively remove {:?}", path);
        Ok(())
    }

    fn list(&self, path: &str) -> Result<Vec<Listing>> {
        self.inner.list(path)
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        log::info!("dry-run: would move {:?} -> {:?}", from, to);
        Ok(())
    }

    fn atomic_move(&self) -> bool {
        self.inner.atomic_move()
    }

    fn create_new(&self, path: &str, _data: &[u8]) -> Result<bool> {
        log::info!("dry-run: would create {:?}", path);
        Ok(true)
    }
}

#[cfg(test)]
#[path = "dryrun_test.rs"]
mod dryrun_test;
