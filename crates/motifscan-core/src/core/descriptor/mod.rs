//! Discretization and canonical encoding of pairwise residue geometry.
//!
//! The 3D relationship between two residues (their types, two cross
//! anchor-to-anchor distances, and the angle between their anchor vectors) is
//! bucketized ([`bins`]) and packed into a single canonical integer key
//! ([`codec`]). Occurrences of a descriptor in a structure pack the two residue
//! indices into one integer ([`occurrence`]).

pub mod bins;
pub mod codec;
pub mod occurrence;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DescriptorError {
    /// A distance or angle outside the encodable domain. Never silently
    /// clamped; callers must clamp explicitly if that is desired.
    #[error("{kind} value {value} is outside the encodable domain")]
    OutOfDomain { kind: &'static str, value: f64 },

    #[error("descriptor key {key:#x} contains invalid bit patterns")]
    InvalidKey { key: u64 },
}
