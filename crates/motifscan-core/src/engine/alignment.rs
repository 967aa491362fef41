use super::assembler::SimpleHit;
use super::cancel::CancellationToken;
use super::config::SearchConfig;
use super::error::SearchError;
use super::extractor::QueryMotif;
use super::state::{Hit, TransformedHit};
use crate::core::models::store::StructureStore;
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::superpose;
use nalgebra::Point3;
use tracing::{debug, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Superposes each candidate onto the query and packages those within the
/// RMSD cutoff.
///
/// A candidate whose structure is missing from the store, whose anchors
/// cannot be gathered, or whose superposition fails numerically is demoted to
/// unscored and excluded from ranked output; it never fails the pipeline.
#[instrument(skip_all, name = "alignment_scoring", fields(candidates = candidates.len()))]
pub fn align_and_score(
    structures: &dyn StructureStore,
    query_structure: &Structure,
    motif: &QueryMotif,
    candidates: Vec<SimpleHit>,
    config: &SearchConfig,
    token: &CancellationToken,
) -> Result<Vec<TransformedHit>, SearchError> {
    let query_coords = anchor_coordinates(query_structure, &motif.residues)
        .ok_or_else(|| SearchError::StructureNotFound(motif.structure_id.clone()))?;

    let score_one = |candidate: &SimpleHit| -> Result<Option<TransformedHit>, SearchError> {
        token.checkpoint()?;
        Ok(score_candidate(structures, &query_coords, candidate, config))
    };

    #[cfg(feature = "parallel")]
    let scored: Result<Vec<Option<TransformedHit>>, SearchError> =
        candidates.par_iter().map(score_one).collect();
    #[cfg(not(feature = "parallel"))]
    let scored: Result<Vec<Option<TransformedHit>>, SearchError> =
        candidates.iter().map(score_one).collect();

    Ok(scored?.into_iter().flatten().collect())
}

fn score_candidate(
    structures: &dyn StructureStore,
    query_coords: &[Point3<f64>],
    candidate: &SimpleHit,
    config: &SearchConfig,
) -> Option<TransformedHit> {
    let Some(structure) = structures.get(&candidate.structure_id) else {
        warn!(structure = %candidate.structure_id, "candidate structure missing from store");
        return None;
    };

    let residue_ids: Option<Vec<_>> = candidate
        .residues
        .iter()
        .map(|&index| structure.residue_by_index(index as usize))
        .collect();
    let residue_ids = residue_ids?;

    let candidate_coords = anchor_coordinates(structure, &residue_ids)?;

    let Some(superposition) = superpose(&candidate_coords, query_coords) else {
        debug!(structure = %candidate.structure_id, "degenerate candidate demoted to unscored");
        return None;
    };
    if superposition.rmsd > config.rmsd_cutoff {
        return None;
    }

    let selections: Option<Vec<_>> = residue_ids
        .iter()
        .map(|&id| structure.label_selection(id))
        .collect();
    let residue_types: Option<Vec<_>> = residue_ids
        .iter()
        .map(|&id| structure.residue(id).map(|r| r.residue_type))
        .collect();

    Some(TransformedHit {
        hit: Hit {
            structure_id: candidate.structure_id.clone(),
            operator_id: candidate.operator_id.clone(),
            selections: selections?,
            descriptor_score: candidate.descriptor_score,
        },
        residue_types: residue_types?,
        rmsd: superposition.rmsd,
        transformation: superposition.to_homogeneous(),
    })
}

/// Backbone and side-chain anchors for each residue, two points per residue
/// in residue order.
fn anchor_coordinates(
    structure: &Structure,
    residue_ids: &[crate::core::models::ids::ResidueId],
) -> Option<Vec<Point3<f64>>> {
    let mut coords = Vec::with_capacity(residue_ids.len() * 2);
    for &id in residue_ids {
        coords.push(structure.backbone_anchor(id)?);
        coords.push(structure.side_chain_anchor(id)?);
    }
    Some(coords)
}
