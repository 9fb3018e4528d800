//! On-disk shape of one transaction: a [`Manifest`] plus a sequence of
//! [`ActionRecord`]s, each encoded with `cbordata`'s `Cborize` derive the
//! same way the teacher's `wral::batch::Batch`/`wral::Entry` are — the only
//! difference is that each record here is its own small file under the
//! transaction directory rather than an appended span inside one growing
//! log file, because the abstract [`crate::fsys::Filesystem`] facade this
//! crate drives exposes whole-file `write`, not an append primitive (see
//! DESIGN.md). A crash mid-write of one record still leaves every prior
//! record file intact and readable.

use cbordata::{Cbor, Cborize, FromCbor, IntoCbor};

use crate::{err_at, Result};

/// Transaction kind, recorded in the manifest for recovery to branch on
/// (CREATE rollback recursively deletes the target; APPEND rollback
/// restores individual files).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Cborize)]
pub enum Kind {
    Create,
    Append,
}

impl Kind {
    const ID: u32 = 0x63_62_6b_31; // "cbk1"
}

/// One fixed-size pre-transaction fact: a variable's append-axis length
/// before this transaction touched it (empty for CREATE, since the cube
/// didn't exist).
#[derive(Debug, Clone, Eq, PartialEq, Cborize)]
pub struct PreState {
    pub variable: String,
    pub append_length: u64,
}

impl PreState {
    const ID: u32 = 0x63_62_70_31; // "cbp1"
}

/// The transaction manifest: written once, before any action record, and
/// read back during crash recovery to decide how to roll the transaction
/// back (§4.5).
#[derive(Debug, Clone, Eq, PartialEq, Cborize)]
pub struct Manifest {
    pub kind: Kind,
    pub target: String,
    pub pre_state: Vec<PreState>,
}

impl Manifest {
    const ID: u32 = 0x63_62_6d_31; // "cbm1"
}

/// One journalled mutation and, where applicable, the backup copy needed to
/// undo it (§4.5).
#[derive(Debug, Clone, Eq, PartialEq, Cborize)]
pub enum ActionRecord {
    /// `path` was created fresh by this transaction; rollback deletes it.
    Added { path: String },
    /// `path` existed before; its prior bytes are saved at `backup`.
    /// Rollback restores `backup` over `path`.
    Replaced { path: String, backup: String },
    /// `path` was removed by this transaction; its prior bytes are saved at
    /// `backup`. Rollback restores `backup` to `path`.
    Deleted { path: String, backup: String },
}

impl ActionRecord {
    const ID: u32 = 0x63_62_61_31; // "cba1"

    pub fn backup(&self) -> Option<&str> {
        match self {
            ActionRecord::Added { .. } => None,
            ActionRecord::Replaced { backup, .. } => Some(backup),
            ActionRecord::Deleted { backup, .. } => Some(backup),
        }
    }
}

/// Serialize a `Cborize` value to its CBOR byte encoding, mirroring the
/// teacher's `util::into_cbor_bytes` helper.
pub fn into_cbor_bytes<T: IntoCbor>(val: T) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let cbor = err_at!(Transaction, val.into_cbor())?;
    err_at!(Transaction, cbor.encode(&mut data))?;
    Ok(data)
}

/// Inverse of [`into_cbor_bytes`].
pub fn from_cbor_bytes<T: FromCbor>(mut data: &[u8]) -> Result<T> {
    let (val, _) = err_at!(Transaction, Cbor::decode(&mut data))?;
    err_at!(Transaction, T::from_cbor(val))
}

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;
