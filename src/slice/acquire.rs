//! Resolves a [`super::SliceHandle`] into an open [`Dataset`], polling for
//! path-based handles when configured and guaranteeing a user source's
//! `close` runs on every exit from [`Acquired`]'s scope.
//!
//! Grounded on `wral::wral::Wal::load`'s open-by-scanning-the-directory
//! idiom and `util::thread::Thread`'s `Drop`-based cleanup guarantee.

use ndarray::ArrayD;
use serde_json::Value;
use std::{thread, time::Instant};

use super::{Dataset, Variable};
use crate::config::{Config, Polling};
use crate::fsys::{self, Filesystem};
use crate::store::{self, ArrayMeta};
use crate::{err_at, Result};

/// A user-provided slice source: a factory function or stateful object that
/// yields one dataset per call and must run `close` exactly once, whatever
/// the outcome of the scope it was opened in.
pub trait SliceSource: Send {
    fn open(&mut self, args: &SliceArgs) -> Result<Dataset>;
    fn close(&mut self);
}

/// Context passed to a [`SliceSource::open`] call.
pub struct SliceArgs<'a> {
    pub index: usize,
    pub config: &'a Config,
}

/// An acquired slice, scoped so a user source's `close` runs when this value
/// is dropped — on success, on error (the `?` unwind), or on cancellation.
pub struct Acquired {
    pub dataset: Dataset,
    source: Option<Box<dyn SliceSource>>,
}

impl Drop for Acquired {
    fn drop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
        }
    }
}

impl Acquired {
    /// Take ownership of the dataset, leaving an empty one in its place so
    /// `Drop` can still run (a type with a manual `Drop` impl cannot be
    /// field-by-field destructured): the user source's `close` still fires
    /// when the returned value's scope ends.
    pub fn into_dataset(mut self) -> Dataset {
        std::mem::take(&mut self.dataset)
    }
}

/// Resolve `handle` into an [`Acquired`] dataset.
pub fn acquire(
    handle: super::SliceHandle,
    index: usize,
    config: &Config,
) -> Result<Acquired> {
    match handle {
        super::SliceHandle::Memory(dataset) => Ok(Acquired { dataset, source: None }),
        super::SliceHandle::Path { uri, storage_options } => {
            let dataset = acquire_path(&uri, &storage_options, &config.slice_polling)?;
            Ok(Acquired { dataset, source: None })
        }
        super::SliceHandle::Source(mut source) => {
            let args = SliceArgs { index, config };
            match source.open(&args) {
                Ok(dataset) => Ok(Acquired { dataset, source: Some(source) }),
                Err(err) => {
                    source.close();
                    Err(err)
                }
            }
        }
    }
}

fn acquire_path(
    uri: &str,
    storage_options: &std::collections::HashMap<String, String>,
    polling: &Polling,
) -> Result<Dataset> {
    let resolved = fsys::resolve(uri, storage_options)?;
    let deadline = Instant::now() + polling.timeout;

    loop {
        let present = resolved.backend.exists(&store::group_meta_path(&resolved.path))?
            || resolved.backend.exists(&resolved.path)?;

        if !present {
            if !polling.enabled || Instant::now() >= deadline {
                return err_at!(SliceUnavailable, msg: "slice {:?} did not become available", uri);
            }
            thread::sleep(polling.interval.min(deadline.saturating_duration_since(Instant::now())));
            continue;
        }

        // Present: a parse failure from here on is "malformed", not
        // "absent", and fails immediately rather than retrying (§4.4).
        return read_dataset(resolved.backend.as_ref(), &resolved.path);
    }
}

/// Read a whole dataset (slice or cube) rooted at `base`: every immediate
/// subdirectory that carries a `.zarray` is one variable.
pub fn read_dataset(fs: &dyn Filesystem, base: &str) -> Result<Dataset> {
    let attrs = store::read_attrs(fs, &store::group_attrs_path(base))?;

    let mut variables = std::collections::HashMap::new();
    for entry in fs.list(base)? {
        if !entry.is_dir {
            continue;
        }
        let name = match entry.path.rsplit('/').next() {
            Some(n) => n.to_string(),
            None => continue,
        };
        let meta_path = store::array_meta_path(base, &name);
        if !fs.exists(&meta_path)? {
            continue;
        }
        let meta_json: Value = {
            let bytes = fs.read(&meta_path)?;
            err_at!(Transaction, serde_json::from_slice(&bytes), "parsing {:?}", meta_path)?
        };
        let meta = ArrayMeta::from_json(&meta_json)?;
        let var_attrs = store::read_attrs(fs, &store::array_attrs_path(base, &name))?;
        let dims = store::dims_from_attrs(&var_attrs, meta.shape.len());

        let flat = store::read_array(fs, base, &name, &meta)?;
        let shape: Vec<usize> = meta.shape.iter().map(|&n| n as usize).collect();
        let data = err_at!(
            Internal,
            ArrayD::from_shape_vec(shape, flat),
            "reshaping variable {:?}",
            name
        )?;

        variables.insert(
            name,
            Variable { dims, dtype: meta.dtype, data, attrs: var_attrs },
        );
    }

    Ok(Dataset { variables, attrs })
}

#[cfg(test)]
#[path = "acquire_test.rs"]
mod acquire_test;
