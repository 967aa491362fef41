/// One physically observed residue pair satisfying a descriptor, stored as a
/// `{descriptor key, packed residue pair}` pair in the inverted index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResiduePairOccurrence {
    pub key: u64,
    pub residue_pair: u32,
}

impl ResiduePairOccurrence {
    pub fn new(key: u64, index_a: u16, index_b: u16) -> Self {
        Self {
            key,
            residue_pair: pack_residue_pair(index_a, index_b),
        }
    }

    /// Structural indices of the two residues, in canonical descriptor slot
    /// order (slot a first).
    pub fn residue_indices(&self) -> (u16, u16) {
        unpack_residue_pair(self.residue_pair)
    }
}

/// Packs two structural residue indices into a single integer. The index in
/// canonical slot a occupies the high half.
pub fn pack_residue_pair(index_a: u16, index_b: u16) -> u32 {
    (index_a as u32) << 16 | index_b as u32
}

pub fn unpack_residue_pair(packed: u32) -> (u16, u16) {
    ((packed >> 16) as u16, (packed & 0xffff) as u16)
}
