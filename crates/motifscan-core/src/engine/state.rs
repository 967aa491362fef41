use crate::core::models::identifiers::{LabelSelection, StructureIdentifier};
use crate::core::models::residue::ResidueType;
use nalgebra::Matrix4;
use serde::Serialize;

/// A residue correspondence in a target structure satisfying the query
/// fingerprint, before alignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub structure_id: StructureIdentifier,
    pub operator_id: String,
    /// Matched residues, aligned with the query motif's selection order.
    pub selections: Vec<LabelSelection>,
    /// Mean bucket deviation from the query fingerprint; 0 for an exact
    /// descriptor match.
    pub descriptor_score: f64,
}

/// A hit with its optimal rigid superposition onto the query.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedHit {
    pub hit: Hit,
    pub residue_types: Vec<ResidueType>,
    pub rmsd: f64,
    /// Homogeneous transformation mapping query coordinates onto the matched
    /// residues.
    pub transformation: Matrix4<f64>,
}

/// Final, ranked outcome of a search.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Hits sorted by ascending RMSD (ties broken by structure id and
    /// matched selections for determinism).
    pub hits: Vec<TransformedHit>,
}

impl SearchResult {
    pub fn new(mut hits: Vec<TransformedHit>) -> Self {
        hits.sort_by(|a, b| {
            a.rmsd
                .partial_cmp(&b.rmsd)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.hit.structure_id.cmp(&b.hit.structure_id))
                .then_with(|| a.hit.selections.cmp(&b.hit.selections))
        });
        Self { hits }
    }

    pub fn truncated(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.hits.truncate(limit);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}
