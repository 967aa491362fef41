use super::cancel::CancellationToken;
use super::config::SearchConfig;
use super::error::SearchError;
use super::expansion::expand;
use super::extractor::QueryMotif;
use crate::core::descriptor::occurrence::unpack_residue_pair;
use crate::core::index::{DescriptorStore, IndexError};
use crate::core::models::identifiers::StructureIdentifier;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A complete, node-consistent assignment of query positions to residues of
/// one target structure, prior to alignment.
#[derive(Debug, Clone)]
pub struct SimpleHit {
    pub structure_id: StructureIdentifier,
    /// Assembly-operator context under which the match occurred.
    pub operator_id: String,
    /// Structural residue indices, aligned with the query motif's selection
    /// order.
    pub residues: Vec<u16>,
    /// Mean bucket deviation from the query fingerprint across all edges.
    pub descriptor_score: f64,
}

/// One permitted occurrence of a query edge in a target structure, with its
/// residue slots already mapped back to query node indices.
#[derive(Debug, Clone)]
struct EdgeCandidate {
    node_a: usize,
    node_b: usize,
    residue_a: u16,
    residue_b: u16,
    deviation: u32,
    operator_id: String,
}

#[derive(Debug, Clone)]
struct PartialAssignment {
    nodes: Vec<Option<u16>>,
    deviation: u32,
    operator_id: String,
}

impl PartialAssignment {
    /// Attempts to extend with a candidate; shared nodes must map
    /// consistently and no residue may serve two nodes.
    fn extend(&self, candidate: &EdgeCandidate) -> Option<Self> {
        let consistent = |node: usize, residue: u16| match self.nodes[node] {
            Some(assigned) => (assigned == residue).then_some(false),
            None => {
                if self.nodes.iter().flatten().any(|&used| used == residue) {
                    None
                } else {
                    Some(true)
                }
            }
        };
        let fresh_a = consistent(candidate.node_a, candidate.residue_a)?;
        let fresh_b = if candidate.residue_a == candidate.residue_b {
            return None;
        } else {
            consistent(candidate.node_b, candidate.residue_b)?
        };

        let mut extended = self.clone();
        if fresh_a {
            extended.nodes[candidate.node_a] = Some(candidate.residue_a);
        }
        if fresh_b {
            extended.nodes[candidate.node_b] = Some(candidate.residue_b);
        }
        extended.deviation += candidate.deviation;
        Some(extended)
    }

    fn is_complete(&self) -> bool {
        self.nodes.iter().all(Option::is_some)
    }
}

/// Performs the indexed multi-way join: fetches the permitted occurrences of
/// every query edge, then backtracks over partial node assignments per target
/// structure until every edge is satisfied simultaneously.
#[instrument(skip_all, name = "candidate_assembly", fields(motif_size = motif.size()))]
pub fn assemble(
    index: &dyn DescriptorStore,
    motif: &QueryMotif,
    config: &SearchConfig,
    token: &CancellationToken,
) -> Result<Vec<SimpleHit>, SearchError> {
    if motif.pairs.is_empty() {
        return Ok(Vec::new());
    }

    let edges = collect_edge_candidates(index, motif, config, token)?;

    // Most selective edge first maximizes early pruning; after that, prefer
    // edges sharing a node with those already processed.
    let edge_order = selectivity_order(motif, &edges);

    // A structure missing occurrences for any edge cannot satisfy the motif.
    let mut targets: Vec<(&StructureIdentifier, Vec<&[EdgeCandidate]>)> = Vec::new();
    'structures: for structure_id in edges[edge_order[0]].keys() {
        let mut per_edge = Vec::with_capacity(edge_order.len());
        for &edge_index in &edge_order {
            match edges[edge_index].get(structure_id) {
                Some(candidates) => per_edge.push(candidates.as_slice()),
                None => continue 'structures,
            }
        }
        targets.push((structure_id, per_edge));
    }
    targets.sort_by_key(|(structure_id, _)| (*structure_id).clone());

    debug!(targets = targets.len(), "assembling candidate structures");

    let node_count = motif.size();
    let edge_count = motif.pairs.len();
    let assemble_one = |(structure_id, per_edge): &(&StructureIdentifier, Vec<&[EdgeCandidate]>)| {
        token.checkpoint()?;
        Ok(assemble_structure(structure_id, per_edge, node_count, edge_count))
    };

    #[cfg(feature = "parallel")]
    let per_structure: Result<Vec<Vec<SimpleHit>>, SearchError> =
        targets.par_iter().map(assemble_one).collect();
    #[cfg(not(feature = "parallel"))]
    let per_structure: Result<Vec<Vec<SimpleHit>>, SearchError> =
        targets.iter().map(assemble_one).collect();

    Ok(per_structure?.into_iter().flatten().collect())
}

fn collect_edge_candidates(
    index: &dyn DescriptorStore,
    motif: &QueryMotif,
    config: &SearchConfig,
    token: &CancellationToken,
) -> Result<Vec<HashMap<StructureIdentifier, Vec<EdgeCandidate>>>, SearchError> {
    let mut edges = Vec::with_capacity(motif.pairs.len());

    for pair in &motif.pairs {
        token.checkpoint()?;

        let exchange_first = config.exchange_set(&motif.selections[pair.a]);
        let exchange_second = config.exchange_set(&motif.selections[pair.b]);
        let (exchanges_slot_a, exchanges_slot_b) = if pair.swapped {
            (exchange_second, exchange_first)
        } else {
            (exchange_first, exchange_second)
        };

        let expanded = expand(
            &pair.descriptor,
            exchanges_slot_a,
            exchanges_slot_b,
            config.distance_tolerance,
            config.angle_tolerance,
        );

        let mut candidates: HashMap<StructureIdentifier, Vec<EdgeCandidate>> = HashMap::new();
        for expansion in &expanded {
            let records = match index.select(expansion.key) {
                Ok(records) => records,
                Err(IndexError::Corruption { key, reason }) => {
                    // Fatal for this bin only; the query continues without it.
                    warn!(key, %reason, "skipping corrupt index bin");
                    continue;
                }
                Err(error) => return Err(error.into()),
            };

            // Occurrence slot a corresponds to the matched key's canonical
            // slot a; compose the two swaps to map it back to query nodes.
            let slots_swapped = pair.swapped ^ expansion.swapped;
            let (node_a, node_b) = if slots_swapped {
                (pair.b, pair.a)
            } else {
                (pair.a, pair.b)
            };

            for record in records {
                let target = candidates.entry(record.structure_id.clone()).or_default();
                for packed in record.residue_pairs {
                    let (residue_a, residue_b) = unpack_residue_pair(packed);
                    target.push(EdgeCandidate {
                        node_a,
                        node_b,
                        residue_a,
                        residue_b,
                        deviation: expansion.deviation,
                        operator_id: record.operator_id.clone(),
                    });
                    // A symmetric key carries no slot orientation; the
                    // occurrence may correspond to the query pair either way.
                    if expansion.symmetric {
                        target.push(EdgeCandidate {
                            node_a,
                            node_b,
                            residue_a: residue_b,
                            residue_b: residue_a,
                            deviation: expansion.deviation,
                            operator_id: record.operator_id.clone(),
                        });
                    }
                }
            }
        }
        edges.push(candidates);
    }

    Ok(edges)
}

/// Orders edge indices by ascending total occurrence count, then greedily
/// moves up edges that share a node with the already-covered set.
fn selectivity_order(
    motif: &QueryMotif,
    edges: &[HashMap<StructureIdentifier, Vec<EdgeCandidate>>],
) -> Vec<usize> {
    let mut by_count: Vec<usize> = (0..edges.len()).collect();
    by_count.sort_by_key(|&edge| {
        edges[edge]
            .values()
            .map(|candidates| candidates.len())
            .sum::<usize>()
    });

    let mut order = Vec::with_capacity(by_count.len());
    let mut covered_nodes: Vec<usize> = Vec::new();
    let mut remaining = by_count;
    while !remaining.is_empty() {
        let position = remaining
            .iter()
            .position(|&edge| {
                covered_nodes.contains(&motif.pairs[edge].a)
                    || covered_nodes.contains(&motif.pairs[edge].b)
            })
            .unwrap_or(0);
        let edge = remaining.remove(position);
        for node in [motif.pairs[edge].a, motif.pairs[edge].b] {
            if !covered_nodes.contains(&node) {
                covered_nodes.push(node);
            }
        }
        order.push(edge);
    }
    order
}

fn assemble_structure(
    structure_id: &StructureIdentifier,
    per_edge: &[&[EdgeCandidate]],
    node_count: usize,
    edge_count: usize,
) -> Vec<SimpleHit> {
    let mut partials: Vec<PartialAssignment> = Vec::new();
    for candidate in per_edge[0] {
        let seed = PartialAssignment {
            nodes: vec![None; node_count],
            deviation: 0,
            operator_id: candidate.operator_id.clone(),
        };
        if let Some(extended) = seed.extend(candidate) {
            partials.push(extended);
        }
    }

    for candidates in &per_edge[1..] {
        let mut extended = Vec::new();
        for partial in &partials {
            for candidate in *candidates {
                if let Some(next) = partial.extend(candidate) {
                    extended.push(next);
                }
            }
        }
        partials = extended;
        if partials.is_empty() {
            return Vec::new();
        }
    }

    let mut hits = Vec::new();
    let mut seen: Vec<Vec<u16>> = Vec::new();
    for partial in partials {
        if !partial.is_complete() {
            continue;
        }
        let residues: Vec<u16> = partial.nodes.iter().flatten().copied().collect();
        // The same assignment can be reached through several expansion paths.
        if seen.contains(&residues) {
            continue;
        }
        seen.push(residues.clone());
        hits.push(SimpleHit {
            structure_id: structure_id.clone(),
            operator_id: partial.operator_id.clone(),
            residues,
            descriptor_score: partial.deviation as f64 / edge_count as f64,
        });
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::index::memory::InMemoryIndex;
    use crate::core::models::identifiers::{IDENTITY_OPERATOR, LabelSelection};
    use crate::core::models::residue::ResidueType;
    use crate::core::models::structure::{Structure, StructureBuilder};
    use crate::engine::extractor::{QueryMotif, extract};
    use nalgebra::{Point3, Vector3};

    fn triad(code: &str, spread: f64) -> Structure {
        let mut builder = StructureBuilder::new(StructureIdentifier::new(code));
        builder
            .start_chain("A", IDENTITY_OPERATOR)
            .start_residue(ResidueType::Histidine, 57)
            .add_atom("CA", Point3::new(0.0, 0.0, 0.0))
            .add_atom("CB", Point3::new(1.5, 0.0, 0.0))
            .start_residue(ResidueType::AsparticAcid, 102)
            .add_atom("CA", Point3::new(spread, 0.0, 0.0))
            .add_atom("CB", Point3::new(spread + 1.5, 0.0, 0.0))
            .start_residue(ResidueType::Serine, 195)
            .add_atom("CA", Point3::new(0.0, spread, 0.0))
            .add_atom("CB", Point3::new(1.5, spread, 0.0));
        builder.build()
    }

    fn selections() -> Vec<LabelSelection> {
        vec![
            LabelSelection::new("A", IDENTITY_OPERATOR, 57),
            LabelSelection::new("A", IDENTITY_OPERATOR, 102),
            LabelSelection::new("A", IDENTITY_OPERATOR, 195),
        ]
    }

    #[test]
    fn reference_structure_matches_itself_exactly() {
        let reference = triad("1ref", 6.0);
        let mut index = InMemoryIndex::new();
        index.index_structure(&reference);

        let motif = extract(&reference, &selections()).unwrap();
        let hits = assemble(
            &index,
            &motif,
            &SearchConfig::exact(),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.structure_id, StructureIdentifier::new("1ref"));
        assert_eq!(hit.residues, vec![0, 1, 2]);
        assert_eq!(hit.descriptor_score, 0.0);
    }

    #[test]
    fn hits_are_node_consistent_and_injective() {
        let reference = triad("1ref", 6.0);
        let mut index = InMemoryIndex::new();
        index.index_structure(&reference);
        index.index_structure(&triad("2oth", 6.0));

        let motif = extract(&reference, &selections()).unwrap();
        let config = SearchConfig::default();
        let hits = assemble(&index, &motif, &config, &CancellationToken::new()).unwrap();

        assert!(!hits.is_empty());
        for hit in &hits {
            let mut residues = hit.residues.clone();
            residues.sort_unstable();
            residues.dedup();
            assert_eq!(residues.len(), motif.size());
        }
    }

    #[test]
    fn geometrically_different_structure_is_not_matched() {
        let reference = triad("1ref", 6.0);
        let distant = triad("2far", 30.0);
        let mut index = InMemoryIndex::new();
        index.index_structure(&reference);
        index.index_structure(&distant);

        let motif = extract(&reference, &selections()).unwrap();
        let hits = assemble(
            &index,
            &motif,
            &SearchConfig::exact(),
            &CancellationToken::new(),
        )
        .unwrap();

        assert!(hits.iter().all(|hit| hit.structure_id == StructureIdentifier::new("1ref")));
    }

    #[test]
    fn widened_tolerance_matches_a_perturbed_structure() {
        let reference = triad("1ref", 6.0);
        let perturbed = triad("2per", 6.8);
        let mut index = InMemoryIndex::new();
        index.index_structure(&reference);
        index.index_structure(&perturbed);

        let motif = extract(&reference, &selections()).unwrap();

        let exact_hits = assemble(
            &index,
            &motif,
            &SearchConfig::exact(),
            &CancellationToken::new(),
        )
        .unwrap();
        let tolerant_hits = assemble(
            &index,
            &motif,
            &SearchConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        let ids = |hits: &[SimpleHit]| -> Vec<StructureIdentifier> {
            hits.iter().map(|h| h.structure_id.clone()).collect()
        };
        assert!(tolerant_hits.len() >= exact_hits.len());
        for id in ids(&exact_hits) {
            assert!(ids(&tolerant_hits).contains(&id));
        }
        assert!(ids(&tolerant_hits).contains(&StructureIdentifier::new("2per")));
    }

    // Two serines whose cross anchor distances fall in the same bucket, so the
    // serine-serine descriptor has indistinguishable slots, plus a histidine
    // whose edges to each serine are distinct. Swapping the build order of the
    // serines reverses their structural indices without moving any atom.
    fn serine_pair(code: &str, swap_serines: bool) -> Structure {
        let near = Point3::new(0.0, 0.0, 0.0);
        let far = Point3::new(6.0, 0.0, 0.0);
        let (first, second) = if swap_serines { (far, near) } else { (near, far) };
        let up = Vector3::new(0.0, 1.5, 0.0);
        let mut builder = StructureBuilder::new(StructureIdentifier::new(code));
        builder
            .start_chain("A", IDENTITY_OPERATOR)
            .start_residue(ResidueType::Serine, 10)
            .add_atom("CA", first)
            .add_atom("CB", first + up)
            .start_residue(ResidueType::Serine, 20)
            .add_atom("CA", second)
            .add_atom("CB", second + up)
            .start_residue(ResidueType::Histidine, 30)
            .add_atom("CA", Point3::new(1.0, 5.0, 0.0))
            .add_atom("CB", Point3::new(1.0, 6.5, 0.0));
        builder.build()
    }

    #[test]
    fn symmetric_edge_matches_oppositely_ordered_residues() {
        let query = serine_pair("1qry", false);
        let target = serine_pair("2tgt", true);
        let mut index = InMemoryIndex::new();
        index.index_structure(&query);
        index.index_structure(&target);

        let selections = vec![
            LabelSelection::new("A", IDENTITY_OPERATOR, 10),
            LabelSelection::new("A", IDENTITY_OPERATOR, 20),
            LabelSelection::new("A", IDENTITY_OPERATOR, 30),
        ];
        let motif = extract(&query, &selections).unwrap();
        let hits = assemble(
            &index,
            &motif,
            &SearchConfig::exact(),
            &CancellationToken::new(),
        )
        .unwrap();

        // The histidine edges pin each serine node to one spatial site, so the
        // target (whose serine indices are reversed relative to the query) can
        // only match if the orientation-free serine-serine edge is tried both
        // ways.
        let target_hit = hits
            .iter()
            .find(|hit| hit.structure_id == StructureIdentifier::new("2tgt"))
            .expect("identical geometry with reversed serine indices must match");
        assert_eq!(target_hit.residues, vec![1, 0, 2]);
    }

    #[test]
    fn motif_without_pairs_yields_no_hits() {
        let index = InMemoryIndex::new();
        let motif = QueryMotif {
            structure_id: StructureIdentifier::new("1emp"),
            selections: Vec::new(),
            residues: Vec::new(),
            pairs: Vec::new(),
        };
        let hits = assemble(
            &index,
            &motif,
            &SearchConfig::exact(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn symmetry_copies_yield_separately_tagged_hits() {
        let spread = 6.0;
        let mut builder = StructureBuilder::new(StructureIdentifier::new("2sym"));
        for (operator, shift) in [("1", 0.0), ("2", 100.0)] {
            builder
                .start_chain("A", operator)
                .start_residue(ResidueType::Histidine, 57)
                .add_atom("CA", Point3::new(shift, 0.0, 0.0))
                .add_atom("CB", Point3::new(shift + 1.5, 0.0, 0.0))
                .start_residue(ResidueType::AsparticAcid, 102)
                .add_atom("CA", Point3::new(shift + spread, 0.0, 0.0))
                .add_atom("CB", Point3::new(shift + spread + 1.5, 0.0, 0.0))
                .start_residue(ResidueType::Serine, 195)
                .add_atom("CA", Point3::new(shift, spread, 0.0))
                .add_atom("CB", Point3::new(shift + 1.5, spread, 0.0));
        }
        let target = builder.build();

        let reference = triad("1ref", spread);
        let mut index = InMemoryIndex::new();
        index.index_structure(&reference);
        index.index_structure(&target);

        let motif = extract(&reference, &selections()).unwrap();
        let hits = assemble(
            &index,
            &motif,
            &SearchConfig::exact(),
            &CancellationToken::new(),
        )
        .unwrap();

        // The copies are far enough apart that no cross-copy pair is within
        // the descriptor distance domain, so each symmetry copy matches on its
        // own and the hit carries that copy's operator.
        let mut tagged: Vec<(String, Vec<u16>)> = hits
            .iter()
            .filter(|hit| hit.structure_id == StructureIdentifier::new("2sym"))
            .map(|hit| (hit.operator_id.clone(), hit.residues.clone()))
            .collect();
        tagged.sort();
        assert_eq!(
            tagged,
            vec![
                ("1".to_string(), vec![0, 1, 2]),
                ("2".to_string(), vec![3, 4, 5]),
            ]
        );
    }

    #[test]
    fn cancelled_token_aborts_assembly() {
        let reference = triad("1ref", 6.0);
        let mut index = InMemoryIndex::new();
        index.index_structure(&reference);
        let motif = extract(&reference, &selections()).unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let result = assemble(&index, &motif, &SearchConfig::exact(), &token);
        assert!(matches!(result, Err(SearchError::Cancelled)));
    }
}
