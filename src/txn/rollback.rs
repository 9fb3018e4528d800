//! Rollback and crash recovery (§4.5): undoing a transaction's action
//! records, either synchronously from an in-memory `Transaction::abort` or
//! by replaying a stale transaction directory found at startup.

use crate::fsys::Filesystem;
use crate::Result;

use super::record::{self, ActionRecord, Kind};
use super::{actions_dir, commit_marker_path, manifest_path};

/// Undo `actions` in reverse order, then — for a CREATE transaction —
/// recursively delete `target` to clean up any directory structure that
/// individual file deletes leave behind (§4.5: "for CREATE transactions,
/// rollback recursively deletes the target").
///
/// Every step is written to be idempotent: a missing path or a missing
/// backup is treated as "already undone", not an error, since rollback must
/// be safe to re-run after a crash mid-rollback.
pub(super) fn apply(fs: &dyn Filesystem, kind: Kind, target: &str, actions: &[ActionRecord]) -> Result<()> {
    for rec in actions.iter().rev() {
        undo_one(fs, rec)?;
    }
    if kind == Kind::Create {
        fs.remove_dir_all(target)?;
    }
    Ok(())
}

fn undo_one(fs: &dyn Filesystem, rec: &ActionRecord) -> Result<()> {
    match rec {
        ActionRecord::Added { path } => {
            if fs.exists(path)? {
                fs.remove_file(path)?;
            }
            Ok(())
        }
        ActionRecord::Replaced { path, backup } | ActionRecord::Deleted { path, backup } => {
            if fs.exists(backup)? {
                let bytes = fs.read(backup)?;
                fs.write(path, &bytes)?;
            }
            Ok(())
        }
    }
}

/// Scan `temp_dir` for leftover transaction directories from a prior run
/// that crashed mid-transaction, and finish each one: roll it back if no
/// commit marker landed, or finish its cleanup if one did (§4.5 startup
/// recovery). Called once by the processor before any new transaction
/// opens, while the target's lock is already held.
pub fn recover_stale(fs: &dyn Filesystem, temp_dir: &str) -> Result<Vec<String>> {
    let mut recovered = Vec::new();
    let entries = match fs.list(temp_dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(recovered),
    };

    for entry in entries {
        if !entry.is_dir {
            continue;
        }
        let name = entry.path.rsplit('/').next().unwrap_or(&entry.path);
        if !name.starts_with("cubeward-txn-") {
            continue;
        }
        finish_one(fs, &entry.path)?;
        recovered.push(entry.path);
    }

    Ok(recovered)
}

fn finish_one(fs: &dyn Filesystem, dir: &str) -> Result<()> {
    if fs.exists(&commit_marker_path(dir))? {
        // Committed but not yet swept: the actions themselves are already
        // durable, only the backups and the directory remain to be dropped.
        if let Ok(actions) = read_actions(fs, dir) {
            for rec in &actions {
                if let Some(backup) = rec.backup() {
                    fs.remove_file(backup).ok();
                }
            }
        }
        fs.remove_dir_all(dir).ok();
        return Ok(());
    }

    let manifest = match read_manifest(fs, dir) {
        Ok(m) => m,
        Err(_) => {
            // No manifest means nothing was ever durably recorded about
            // this transaction's target; the safest recovery is to discard
            // the scratch directory without touching any target path.
            fs.remove_dir_all(dir).ok();
            return Ok(());
        }
    };
    let actions = read_actions(fs, dir).unwrap_or_default();
    apply(fs, manifest.kind, &manifest.target, &actions)?;
    fs.remove_dir_all(dir).ok();
    Ok(())
}

fn read_manifest(fs: &dyn Filesystem, dir: &str) -> Result<super::Manifest> {
    let bytes = fs.read(&manifest_path(dir))?;
    record::from_cbor_bytes(&bytes)
}

fn read_actions(fs: &dyn Filesystem, dir: &str) -> Result<Vec<ActionRecord>> {
    let mut out = Vec::new();
    let dir_path = actions_dir(dir);
    let mut listing = match fs.list(&dir_path) {
        Ok(l) => l,
        Err(_) => return Ok(out),
    };
    listing.sort_by(|a, b| a.path.cmp(&b.path));
    for entry in listing {
        if entry.is_dir {
            continue;
        }
        let bytes = fs.read(&entry.path)?;
        out.push(record::from_cbor_bytes(&bytes)?);
    }
    Ok(out)
}
