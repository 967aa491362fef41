//! Persisted inverted index mapping descriptor keys to occurrences across the
//! structure library.
//!
//! Each descriptor key maps to one logical bin; a bin is read in full on first
//! access and holds one record per contributing structure. The store is
//! immutable once built, so concurrent reads need no locking. An absent bin is
//! a normal corpus-sparsity outcome and yields an empty record list, never an
//! error.

pub mod file;
pub mod memory;

use crate::core::models::identifiers::StructureIdentifier;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index I/O failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Malformed bin contents. Fatal for that bin only; the assembler skips
    /// the offending bin and continues.
    #[error("corrupt index bin for key {key:#x}: {reason}")]
    Corruption { key: u64, reason: String },

    #[error("malformed index header: {0}")]
    InvalidHeader(String),
}

/// One structure's contribution to a descriptor bin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceRecord {
    pub structure_id: StructureIdentifier,
    pub operator_id: String,
    /// Packed residue pairs (see [`crate::core::descriptor::occurrence`]), in
    /// canonical descriptor slot order.
    pub residue_pairs: Vec<u32>,
}

/// Read surface of the inverted index.
///
/// Implementations are read-only at query time; occurrences are produced once
/// during index construction and are immutable afterward.
pub trait DescriptorStore: Sync {
    /// All occurrences in the bin for `key`; an empty `Vec` if the bin is
    /// absent.
    fn select(&self, key: u64) -> Result<Vec<OccurrenceRecord>, IndexError>;

    /// Every populated descriptor key. Intended for corpus introspection and
    /// benchmarking, not for query-time use.
    fn known_descriptors(&self) -> Result<Vec<u64>, IndexError>;
}
