//! Processor (§4.8): the outermost coordinator driving lock → recovery →
//! force-new → (per slice: acquire → append → commit) → release.
//!
//! Grounded on the teacher's top-level `Db` methods sequencing a `wral`
//! journal around each mutating call: lock acquisition and the transaction
//! journal here play the equivalent roles, just promoted to span a whole
//! run instead of one key/value write.

use crate::append;
use crate::cancel::CancellationToken;
use crate::config::Config;
use crate::fsys::{self, DryRunFs, Filesystem, Resolved};
use crate::lock::{Lock, WaitPolicy};
use crate::slice::{self, Dataset, SliceHandle};
use crate::store;
use crate::txn;
use crate::{err_at, Result};

pub use crate::append::Outcome;

/// Drives one run of the append engine over a slice sequence. Holds the
/// configuration for the run and a cancellation token a caller can trip from
/// another thread between slices.
pub struct Processor {
    config: Config,
    cancel: CancellationToken,
}

impl Processor {
    pub fn new(config: Config) -> Processor {
        Processor { config, cancel: CancellationToken::new() }
    }

    /// A clone of this processor's cancellation token, to hand to whatever
    /// external signal (Ctrl-C handler, RPC) should be able to stop it.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run to completion (or the first failure) over `slices`, returning the
    /// outcome of every slice that committed before that point.
    pub fn run(&self, slices: impl IntoIterator<Item = SliceHandle>) -> Result<Vec<Outcome>> {
        drive(&self.config, slices, &self.cancel)
    }
}

/// Programmatic entry point (§6): `process(slices, config)`. CLI-style
/// overrides (`--target`, `--force-new`, `--dry-run`) are expected to have
/// already been folded into `config` via [`crate::config::Overrides`].
pub fn process(slices: impl IntoIterator<Item = SliceHandle>, config: Config) -> Result<Vec<Outcome>> {
    Processor::new(config).run(slices)
}

// `append::run` journals a transaction under `temp_dir` through the very
// same `Filesystem` handle it writes the cube through (see `txn::Transaction`),
// so unlike the target, `temp_dir` is not independently resolved to its own
// backend here: it is always a path on the target's backend. `temp_storage_options`
// is reserved for the day that constraint is lifted (see DESIGN.md).
fn drive(config: &Config, slices: impl IntoIterator<Item = SliceHandle>, cancel: &CancellationToken) -> Result<Vec<Outcome>> {
    let resolved_target = fsys::resolve(&config.target_dir, &config.target_storage_options)?;
    let dry_target = DryRunFs::wrap(resolved_target.backend.as_ref());
    let target_fs: &dyn Filesystem = if config.dry_run { &dry_target } else { resolved_target.backend.as_ref() };
    let temp_path = config.temp_dir.trim_end_matches('/').to_string();

    let lock = acquire_lock(config, &resolved_target)?;
    let outcome = drive_locked(target_fs, &resolved_target.path, &temp_path, config, slices, cancel);

    match lock {
        None => outcome,
        Some(lock) => match (outcome, lock.release()) {
            (Ok(out), Ok(())) => Ok(out),
            (Ok(_), Err(release_err)) => Err(release_err),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(release_err)) => Err(e.with_note(format!("releasing lock: {}", release_err))),
        },
    }
}

fn drive_locked(
    fs: &dyn Filesystem,
    target_path: &str,
    temp_path: &str,
    config: &Config,
    slices: impl IntoIterator<Item = SliceHandle>,
    cancel: &CancellationToken,
) -> Result<Vec<Outcome>> {
    txn::recover_stale(fs, temp_path)?;
    apply_force_new(fs, target_path, config)?;

    let mut outcomes = Vec::new();
    for (index, handle) in slices.into_iter().enumerate() {
        if cancel.is_cancelled() {
            return err_at!(Cancelled, msg: "cancelled before slice {}", index);
        }

        let dataset = resolve_dataset(fs, temp_path, config, index, handle)?;

        match append::run(fs, target_path, temp_path, config, dataset) {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => return Err(e.with_note(format!("slice index {} failed", index))),
        }
    }
    Ok(outcomes)
}

/// Acquire the lock, folding in the `force_new` + stale-lock reconciliation:
/// a plain conflict is `TargetLocked`, but when `force_new` is set a
/// conflict is read as a prior run's abandoned lock and is reclaimed so this
/// run's own lock can be taken cleanly — the lock is always acquired before
/// [`apply_force_new`]'s destructive delete ever runs (Open Question ii).
///
/// The lease is created and removed through `resolved_target`'s own backend
/// (not always local disk), so it co-locates with the cube wherever that is.
fn acquire_lock(config: &Config, resolved_target: &Resolved) -> Result<Option<Lock>> {
    if config.dry_run {
        log::info!("dry-run: skipping lock acquisition");
        return Ok(None);
    }

    let policy = WaitPolicy::from_polling(&config.slice_polling);
    let fs = resolved_target.backend.clone();
    let target_path = &resolved_target.path;
    match Lock::acquire(fs.clone(), target_path, policy) {
        Ok(lock) => Ok(Some(lock)),
        Err(e) if config.force_new && e.is_kind(crate::Kind::TargetLocked) => {
            let path = Lock::path_for(target_path);
            log::warn!("force_new: reclaiming lock {:?} left behind by a prior run", path);
            fs.remove_file(&path).ok();
            Ok(Some(Lock::acquire(fs, target_path, policy)?))
        }
        Err(e) => Err(e),
    }
}

/// `force_new` destroys an existing cube up front, non-transactionally and
/// warning-logged (§4.6 edge policy); the lock is already held by the time
/// this runs.
fn apply_force_new(fs: &dyn Filesystem, target: &str, config: &Config) -> Result<()> {
    if !config.force_new {
        return Ok(());
    }
    if fs.exists(&store::group_meta_path(target))? {
        log::warn!("force_new: deleting existing cube at {:?}", target);
        fs.remove_dir_all(target)?;
    }
    Ok(())
}

fn resolve_dataset(
    fs: &dyn Filesystem,
    temp_path: &str,
    config: &Config,
    index: usize,
    handle: SliceHandle,
) -> Result<Dataset> {
    match handle {
        SliceHandle::Memory(dataset) if config.persist_mem_slices => {
            persist_and_reread(fs, temp_path, index, dataset)
        }
        other => Ok(slice::acquire(other, index, config)?.into_dataset()),
    }
}

/// `persist_mem_slices`: materialize an in-memory slice to a scratch Zarr
/// group under `temp_dir` and re-resolve it as a normal on-disk slice,
/// rather than feeding the append engine an in-memory `Dataset` directly.
fn persist_and_reread(fs: &dyn Filesystem, temp_path: &str, index: usize, dataset: Dataset) -> Result<Dataset> {
    let scratch = format!("{}/cubeward-slice-{:08}", temp_path.trim_end_matches('/'), index);
    slice::persist_to_temp(fs, &scratch, &dataset)?;
    let read_back = slice::read_dataset(fs, &scratch)?;
    fs.remove_dir_all(&scratch).ok();
    Ok(read_back)
}

#[cfg(test)]
#[path = "processor_test.rs"]
mod processor_test;
