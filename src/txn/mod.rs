//! Transaction journal & rollback (§4.5): a per-append scratch directory
//! under `temp_dir` recording every mutation this transaction intends, with
//! enough information to undo them. Grounded on `wral::journal.rs`'s
//! Working/Archive split (a transaction is "working" until its commit
//! marker lands, then effectively archived/discarded) and `wral::batch.rs`'s
//! length-prefixed CBOR record shape — adapted to one record per file since
//! the abstract filesystem facade this crate drives has no append primitive
//! (see `record.rs`).

mod record;
mod rollback;

use uuid::Uuid;

use crate::fsys::Filesystem;
use crate::{Error, Result};

pub use record::{ActionRecord, Kind, Manifest, PreState};
pub use rollback::recover_stale;

fn manifest_path(dir: &str) -> String {
    format!("{}/manifest.cbor", dir)
}

fn actions_dir(dir: &str) -> String {
    format!("{}/actions", dir)
}

fn action_path(dir: &str, seq: u64) -> String {
    format!("{}/{:08}.cbor", actions_dir(dir), seq)
}

fn backups_dir(dir: &str) -> String {
    format!("{}/backups", dir)
}

fn backup_path(dir: &str, seq: u64) -> String {
    format!("{}/{:08}.bin", backups_dir(dir), seq)
}

fn commit_marker_path(dir: &str) -> String {
    format!("{}/COMMIT", dir)
}

/// One in-progress append or create transaction. Holds the directory, the
/// kind/target recorded in its manifest, and every action recorded so far so
/// that `abort` can roll back without re-reading the manifest from disk.
pub struct Transaction<'a> {
    fs: &'a dyn Filesystem,
    dir: String,
    kind: Kind,
    target: String,
    next_seq: u64,
    actions: Vec<ActionRecord>,
    disabled: bool,
}

impl<'a> Transaction<'a> {
    /// Open a fresh transaction directory under `temp_dir` and persist its
    /// manifest. When `disable_rollback` is set, no directory or record is
    /// ever written — every method on the returned `Transaction` becomes a
    /// no-op other than bookkeeping, per the configuration opt-out in §4.5.
    pub fn open(
        fs: &'a dyn Filesystem,
        temp_dir: &str,
        kind: Kind,
        target: &str,
        pre_state: Vec<PreState>,
        disable_rollback: bool,
    ) -> Result<Transaction<'a>> {
        let dir = format!("{}/cubeward-txn-{}", temp_dir.trim_end_matches('/'), Uuid::new_v4());

        if !disable_rollback {
            fs.create_dir_all(&actions_dir(&dir))?;
            fs.create_dir_all(&backups_dir(&dir))?;
            let manifest = Manifest {
                kind,
                target: target.to_string(),
                pre_state,
            };
            fs.write(&manifest_path(&dir), &record::into_cbor_bytes(manifest)?)?;
        }

        Ok(Transaction {
            fs,
            dir,
            kind,
            target: target.to_string(),
            next_seq: 0,
            actions: Vec::new(),
            disabled: disable_rollback,
        })
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    fn record(&mut self, rec: ActionRecord) -> Result<()> {
        if self.disabled {
            return Ok(());
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let path = action_path(&self.dir, seq);
        self.fs.write(&path, &record::into_cbor_bytes(rec.clone())?)?;
        self.actions.push(rec);
        Ok(())
    }

    /// Record that `path` is about to be created fresh (it doesn't exist
    /// yet). Rollback deletes it.
    pub fn add(&mut self, path: &str) -> Result<()> {
        self.record(ActionRecord::Added { path: path.to_string() })
    }

    /// Record that `path` is about to be overwritten, backing up its
    /// current bytes first. Degrades to [`Transaction::add`] if `path`
    /// doesn't exist yet (nothing to back up).
    pub fn replace(&mut self, path: &str) -> Result<()> {
        if !self.fs.exists(path)? {
            return self.add(path);
        }
        if self.disabled {
            return Ok(());
        }
        let backup = backup_path(&self.dir, self.next_seq);
        let bytes = self.fs.read(path)?;
        self.fs.write(&backup, &bytes)?;
        self.record(ActionRecord::Replaced { path: path.to_string(), backup })
    }

    /// Record that `path` is about to be deleted, backing up its current
    /// bytes first. A no-op if `path` doesn't exist (nothing to undo).
    pub fn delete(&mut self, path: &str) -> Result<()> {
        if !self.fs.exists(path)? {
            return Ok(());
        }
        if self.disabled {
            return Ok(());
        }
        let backup = backup_path(&self.dir, self.next_seq);
        let bytes = self.fs.read(path)?;
        self.fs.write(&backup, &bytes)?;
        self.record(ActionRecord::Deleted { path: path.to_string(), backup })
    }

    /// Commit: write the durable marker, then best-effort remove backups
    /// and the transaction directory (§4.5). Once the marker is written,
    /// forward progress is guaranteed regardless of what happens next, so
    /// cleanup failures here are swallowed rather than surfaced — a future
    /// [`recover_stale`] finishes the job.
    pub fn commit(self) -> Result<()> {
        if self.disabled {
            return Ok(());
        }
        self.fs.write(&commit_marker_path(&self.dir), b"committed")?;
        for rec in &self.actions {
            if let Some(backup) = rec.backup() {
                self.fs.remove_file(backup).ok();
            }
        }
        self.fs.remove_dir_all(&self.dir).ok();
        Ok(())
    }

    /// Roll back every recorded action in reverse order, then remove the
    /// transaction directory. Returns `cause`, with any rollback failure
    /// attached as a note rather than replacing it (§7 policy: the first
    /// user-visible error is always the original cause).
    pub fn abort(self, cause: Error) -> Error {
        if self.disabled {
            return cause;
        }
        let mut cause = cause;
        if let Err(note) = rollback::apply(self.fs, self.kind, &self.target, &self.actions) {
            cause = cause.with_note(format!("rollback: {}", note));
        }
        self.fs.remove_dir_all(&self.dir).ok();
        cause
    }
}
