use std::{fs, io::Write, path::Path};

use super::{Filesystem, Listing};
use crate::{err_at, Result};

/// Local-disk backend. Paths are plain OS paths; `rename` is the OS's
/// atomic same-volume rename, matching the teacher's `util::files`
/// `create_file_a`/`sync_write` idiom of fsync-then-trust.
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        err_at!(Io, fs::read(path), "reading {:?}", path)
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            err_at!(Io, fs::create_dir_all(parent), "creating {:?}", parent)?;
        }
        let mut file = err_at!(Io, fs::File::create(path), "creating {:?}", path)?;
        err_at!(Io, file.write_all(data), "writing {:?}", path)?;
        err_at!(Io, file.sync_all(), "fsync {:?}", path)
    }

    fn exists(&self, path: &str) -> Result<bool> {
        Ok(Path::new(path).exists())
    }

    fn create_dir_all(&self, path: &str) -> Result<()> {
        err_at!(Io, fs::create_dir_all(path), "creating {:?}", path)
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => err_at!(Io, Err(e), "removing {:?}", path),
        }
    }

    fn remove_dir_all(&self, path: &str) -> Result<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => err_at!(Io, Err(e), "removing {:?}", path),
        }
    }

    fn list(&self, path: &str) -> Result<Vec<Listing>> {
        let mut out = Vec::new();
        let dirs = err_at!(Io, fs::read_dir(path), "read_dir {:?}", path)?;
        for entry in dirs {
            let entry = err_at!(Io, entry)?;
            let meta = err_at!(Io, entry.metadata(), "stat {:?}", entry.path())?;
            out.push(Listing {
                path: entry.path().to_string_lossy().into_owned(),
                is_dir: meta.is_dir(),
                len: meta.len(),
            });
        }
        Ok(out)
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        if let Some(parent) = Path::new(to).parent() {
            err_at!(Io, fs::create_dir_all(parent), "creating {:?}", parent)?;
        }
        err_at!(Io, fs::rename(from, to), "renaming {:?} -> {:?}", from, to)
    }

    fn atomic_move(&self) -> bool {
        true
    }

    fn create_new(&self, path: &str, data: &[u8]) -> Result<bool> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return err_at!(
                    Config,
                    msg: "cannot create {:?}: parent directory {:?} does not exist",
                    path,
                    parent
                );
            }
        }
        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return err_at!(Io, Err(e), "creating {:?}", path),
        };
        err_at!(Io, file.write_all(data), "writing {:?}", path)?;
        err_at!(Io, file.sync_all(), "fsync {:?}", path)?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod local_test;
