//! Single-writer exclusion (§4.7): an atomic, create-if-absent lease file
//! co-located with the cube on whichever backend holds it. Grounded on
//! `file_lock.rs`'s raw-lock wrapper for the acquire/wait/release shape,
//! routed through [`crate::fsys::Filesystem::create_new`] instead of a raw
//! `std::fs` call so a `mem://`/`s3://` target leases beside itself rather
//! than on local disk; the lease content itself follows `wral::mod::Config`'s
//! plain-struct-of-fields style.

use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use crate::config::Polling;
use crate::fsys::Filesystem;
use crate::{err_at, Result};

/// Contents written into the `.lock` file: enough for an operator reading it
/// by hand to identify the stuck process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub pid: u32,
    pub host: String,
    pub start_time: u64,
}

impl Lease {
    fn current() -> Lease {
        Lease {
            pid: std::process::id(),
            host: sys_info::hostname().unwrap_or_else(|_| "unknown".to_string()),
            start_time: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }
}

/// Lock-contention behaviour (§4.7): fail immediately, or poll until a
/// timeout like slice acquisition does.
#[derive(Debug, Clone, Copy)]
pub enum WaitPolicy {
    FailFast,
    Wait { interval: Duration, timeout: Duration },
}

impl WaitPolicy {
    pub fn from_polling(polling: &Polling) -> WaitPolicy {
        if polling.enabled {
            WaitPolicy::Wait { interval: polling.interval, timeout: polling.timeout }
        } else {
            WaitPolicy::FailFast
        }
    }
}

/// An acquired lock. Dropping without calling [`Lock::release`] still
/// removes the lease file on a best-effort basis, but callers should call
/// `release` explicitly so release failures are reported rather than
/// silently swallowed.
pub struct Lock {
    fs: Arc<dyn Filesystem>,
    path: String,
    released: bool,
}

impl Lock {
    /// `target_path` is the cube's backend-relative path; the lease path is
    /// its sibling with a `.lock` suffix appended to the final path segment.
    pub fn path_for(target_path: &str) -> String {
        let target_path = target_path.trim_end_matches('/');
        match target_path.rfind('/') {
            Some(idx) => format!("{}{}.lock", &target_path[..idx + 1], &target_path[idx + 1..]),
            None => format!("{}.lock", target_path),
        }
    }

    /// Acquire the lock at `target_path`'s lease path on `fs`, per `policy`.
    pub fn acquire(fs: Arc<dyn Filesystem>, target_path: &str, policy: WaitPolicy) -> Result<Lock> {
        let path = Lock::path_for(target_path);

        let deadline = match policy {
            WaitPolicy::Wait { timeout, .. } => Some(Instant::now() + timeout),
            WaitPolicy::FailFast => None,
        };

        loop {
            let lease = Lease::current();
            let body = serde_json::to_vec_pretty(&lease).unwrap_or_default();
            match fs.create_new(&path, &body) {
                Ok(true) => return Ok(Lock { fs, path, released: false }),
                Ok(false) => match policy {
                    WaitPolicy::FailFast => {
                        return err_at!(TargetLocked, msg: "lock {:?} is held by another process", path)
                    }
                    WaitPolicy::Wait { interval, .. } => {
                        let deadline = deadline.expect("wait policy always has a deadline");
                        if Instant::now() >= deadline {
                            return err_at!(
                                TargetLocked,
                                msg: "lock {:?} still held after timeout",
                                path
                            );
                        }
                        let wait = jittered(interval).min(deadline.saturating_duration_since(Instant::now()));
                        thread::sleep(wait);
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }

    pub fn release(mut self) -> Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.fs.remove_file(&self.path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        self.release_inner().ok();
    }
}

/// Jitter a retry interval by up to ±20% so that multiple processes woken
/// by the same `TargetLocked` conflict don't keep retrying in lockstep.
fn jittered(interval: Duration) -> Duration {
    use rand::Rng;
    let factor = rand::thread_rng().gen_range(0.8..1.2);
    interval.mul_f64(factor)
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod lock_test;
