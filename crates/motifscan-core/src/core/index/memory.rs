use super::{DescriptorStore, IndexError, OccurrenceRecord};
use crate::core::descriptor::codec::ResiduePairDescriptor;
use crate::core::descriptor::occurrence::ResiduePairOccurrence;
use crate::core::models::identifiers::{IDENTITY_OPERATOR, StructureIdentifier};
use crate::core::models::structure::Structure;
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::warn;

/// Heap-backed inverted index.
///
/// Used by build collaborators before serialization and by tests; bins are
/// append-only while building and read-only at query time.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    bins: BTreeMap<u64, Vec<OccurrenceRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: u64,
        structure_id: &StructureIdentifier,
        operator_id: &str,
        residue_pair: u32,
    ) {
        let records = self.bins.entry(key).or_default();
        match records
            .iter_mut()
            .find(|r| r.structure_id == *structure_id && r.operator_id == operator_id)
        {
            Some(record) => record.residue_pairs.push(residue_pair),
            None => records.push(OccurrenceRecord {
                structure_id: structure_id.clone(),
                operator_id: operator_id.to_string(),
                residue_pairs: vec![residue_pair],
            }),
        }
    }

    /// Adds every in-domain residue pair of `structure` to the index.
    ///
    /// Pairs whose geometry falls outside the encodable domain are simply not
    /// indexed; such arrangements are too distant to form a motif.
    pub fn index_structure(&mut self, structure: &Structure) {
        for (occurrence, operator_id) in enumerate_occurrences(structure) {
            self.insert(occurrence.key, structure.id(), &operator_id, occurrence.residue_pair);
        }
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn bins_iter(&self) -> impl Iterator<Item = (u64, &[OccurrenceRecord])> {
        self.bins.iter().map(|(&key, records)| (key, records.as_slice()))
    }
}

impl DescriptorStore for InMemoryIndex {
    fn select(&self, key: u64) -> Result<Vec<OccurrenceRecord>, IndexError> {
        Ok(self.bins.get(&key).cloned().unwrap_or_default())
    }

    fn known_descriptors(&self) -> Result<Vec<u64>, IndexError> {
        Ok(self.bins.keys().copied().collect())
    }
}

/// Enumerates `(occurrence, operator context)` for every unordered residue
/// pair of a structure whose geometry is encodable.
///
/// Packed pairs follow canonical descriptor slot order. A pair spanning two
/// different assembly operators is filed under the identity operator.
pub fn enumerate_occurrences(structure: &Structure) -> Vec<(ResiduePairOccurrence, String)> {
    // Occurrences hold structural indices as u16.
    if structure.residue_count() > usize::from(u16::MAX) + 1 {
        warn!(
            structure = %structure.id(),
            residues = structure.residue_count(),
            "skipping structure whose residue indices overflow the occurrence format"
        );
        return Vec::new();
    }

    let residues: Vec<_> = structure.residues_by_index().collect();
    let mut occurrences = Vec::new();

    for pair in residues.iter().combinations(2) {
        let (index_1, id_1, residue_1) = *pair[0];
        let (index_2, id_2, residue_2) = *pair[1];

        let (Some(bb_1), Some(sc_1), Some(bb_2), Some(sc_2)) = (
            structure.backbone_anchor(id_1),
            structure.side_chain_anchor(id_1),
            structure.backbone_anchor(id_2),
            structure.side_chain_anchor(id_2),
        ) else {
            continue;
        };

        let Ok((descriptor, swapped)) = ResiduePairDescriptor::from_anchors(
            residue_1.residue_type,
            bb_1,
            sc_1,
            residue_2.residue_type,
            bb_2,
            sc_2,
        ) else {
            continue;
        };

        let (slot_a, slot_b) = if swapped {
            (index_2 as u16, index_1 as u16)
        } else {
            (index_1 as u16, index_2 as u16)
        };

        let operator_1 = structure.operator_of(id_1).unwrap_or(IDENTITY_OPERATOR);
        let operator_2 = structure.operator_of(id_2).unwrap_or(IDENTITY_OPERATOR);
        let operator = if operator_1 == operator_2 {
            operator_1.to_string()
        } else {
            IDENTITY_OPERATOR.to_string()
        };

        occurrences.push((
            ResiduePairOccurrence::new(descriptor.key(), slot_a, slot_b),
            operator,
        ));
    }

    occurrences
}
