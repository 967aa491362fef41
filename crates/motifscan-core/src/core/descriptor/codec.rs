use super::DescriptorError;
use super::bins::{AngleBin, DistanceBin};
use crate::core::models::residue::ResidueType;
use nalgebra::Point3;

// Key bit layout, low to high:
//   bits  0..4   reserved, always zero
//   bits  4..8   angle bucket (0..=8)
//   bits  8..14  distance bucket b (0..=63)
//   bits 14..20  distance bucket a (0..=63)
//   bits 20..25  residue type b (0..=28)
//   bits 25..30  residue type a (0..=28)
const ANGLE_SHIFT: u64 = 4;
const DIST_B_SHIFT: u64 = 8;
const DIST_A_SHIFT: u64 = 14;
const TYPE_B_SHIFT: u64 = 20;
const TYPE_A_SHIFT: u64 = 25;
const TYPE_MASK: u64 = 0x1f;
const DIST_MASK: u64 = 0x3f;
const ANGLE_MASK: u64 = 0x0f;
const KEY_MASK: u64 = (1 << 30) - 1;

/// Side-chain vectors shorter than this carry no orientation; the pair angle
/// degenerates to zero (glycine fallback anchors coincide with the backbone).
const DEGENERATE_VECTOR_NORM: f64 = 1e-6;

/// Canonical key for the pairwise geometry of two residues.
///
/// The `(type, distance)` slots are ordered by the fixed total order
/// `(type code, distance bucket)`, so the symmetric re-presentation of the
/// same pair always encodes to the identical key and index lookups are
/// order-independent.
///
/// `exchange_context` marks descriptors derived through a residue-type
/// exchange during query expansion. It is carried on the value but is NOT
/// part of the integer key: raw and exchange-derived descriptors share one
/// key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResiduePairDescriptor {
    pub type_a: ResidueType,
    pub type_b: ResidueType,
    pub distance_a: DistanceBin,
    pub distance_b: DistanceBin,
    pub angle: AngleBin,
    pub exchange_context: bool,
}

impl ResiduePairDescriptor {
    /// Builds the canonical descriptor for a presented pair.
    ///
    /// The returned flag is true when canonicalization swapped the two
    /// `(type, distance)` slots relative to the presentation order; callers
    /// that track which residue fills which slot must apply the same swap.
    pub fn canonicalize(
        type_1: ResidueType,
        type_2: ResidueType,
        distance_1: DistanceBin,
        distance_2: DistanceBin,
        angle: AngleBin,
    ) -> (Self, bool) {
        let slot_1 = (type_1.to_u8(), distance_1.index());
        let slot_2 = (type_2.to_u8(), distance_2.index());
        let swapped = slot_2 < slot_1;
        let descriptor = if swapped {
            Self {
                type_a: type_2,
                type_b: type_1,
                distance_a: distance_2,
                distance_b: distance_1,
                angle,
                exchange_context: false,
            }
        } else {
            Self {
                type_a: type_1,
                type_b: type_2,
                distance_a: distance_1,
                distance_b: distance_2,
                angle,
                exchange_context: false,
            }
        };
        (descriptor, swapped)
    }

    /// Computes and canonicalizes the descriptor for two residues given their
    /// backbone and side-chain anchor positions.
    ///
    /// The two distances are the cross anchor distances `|bb_1 - sc_2|` and
    /// `|bb_2 - sc_1|` (so that swapping the residues swaps the distance
    /// slots); the angle is between the two backbone-to-side-chain vectors.
    pub fn from_anchors(
        type_1: ResidueType,
        bb_1: Point3<f64>,
        sc_1: Point3<f64>,
        type_2: ResidueType,
        bb_2: Point3<f64>,
        sc_2: Point3<f64>,
    ) -> Result<(Self, bool), DescriptorError> {
        let distance_1 = DistanceBin::from_value((bb_1 - sc_2).norm())?;
        let distance_2 = DistanceBin::from_value((bb_2 - sc_1).norm())?;

        let v_1 = sc_1 - bb_1;
        let v_2 = sc_2 - bb_2;
        let angle_degrees = if v_1.norm() < DEGENERATE_VECTOR_NORM
            || v_2.norm() < DEGENERATE_VECTOR_NORM
        {
            0.0
        } else {
            let cosine = (v_1.dot(&v_2) / (v_1.norm() * v_2.norm())).clamp(-1.0, 1.0);
            cosine.acos().to_degrees()
        };
        let angle = AngleBin::from_value(angle_degrees)?;

        Ok(Self::canonicalize(type_1, type_2, distance_1, distance_2, angle))
    }

    pub fn with_exchange_context(mut self, exchange_context: bool) -> Self {
        self.exchange_context = exchange_context;
        self
    }

    /// Compact integer key. Bit-reversible; the exchange-context flag is not
    /// encoded.
    pub fn key(&self) -> u64 {
        (self.type_a.to_u8() as u64) << TYPE_A_SHIFT
            | (self.type_b.to_u8() as u64) << TYPE_B_SHIFT
            | (self.distance_a.index() as u64) << DIST_A_SHIFT
            | (self.distance_b.index() as u64) << DIST_B_SHIFT
            | (self.angle.index() as u64) << ANGLE_SHIFT
    }

    /// Decodes a key back into its exact discretized components.
    pub fn from_key(key: u64) -> Result<Self, DescriptorError> {
        if key & !KEY_MASK != 0 || key & ((1 << ANGLE_SHIFT) - 1) != 0 {
            return Err(DescriptorError::InvalidKey { key });
        }
        let type_a_code = ((key >> TYPE_A_SHIFT) & TYPE_MASK) as u8;
        let type_b_code = ((key >> TYPE_B_SHIFT) & TYPE_MASK) as u8;
        let type_a = ResidueType::from_u8(type_a_code);
        let type_b = ResidueType::from_u8(type_b_code);
        if type_a.to_u8() != type_a_code || type_b.to_u8() != type_b_code {
            return Err(DescriptorError::InvalidKey { key });
        }
        let distance_a = DistanceBin::from_index(((key >> DIST_A_SHIFT) & DIST_MASK) as u8)
            .ok_or(DescriptorError::InvalidKey { key })?;
        let distance_b = DistanceBin::from_index(((key >> DIST_B_SHIFT) & DIST_MASK) as u8)
            .ok_or(DescriptorError::InvalidKey { key })?;
        let angle = AngleBin::from_index(((key >> ANGLE_SHIFT) & ANGLE_MASK) as u8)
            .ok_or(DescriptorError::InvalidKey { key })?;
        Ok(Self {
            type_a,
            type_b,
            distance_a,
            distance_b,
            angle,
            exchange_context: false,
        })
    }
}
