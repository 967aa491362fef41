use crate::core::descriptor::codec::ResiduePairDescriptor;
use crate::core::models::residue::ResidueType;
use std::collections::{HashMap, HashSet};

/// One key reachable from a query descriptor under the configured tolerances
/// and exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandedDescriptor {
    pub key: u64,
    /// Total bucket distance from the query descriptor plus one per
    /// exchanged position; feeds the geometric descriptor score.
    pub deviation: u32,
    /// True when re-canonicalization swapped the slots relative to the query
    /// descriptor's orientation.
    pub swapped: bool,
    /// True when the key's two slots are indistinguishable (equal type and
    /// distance bucket); such a key carries no slot orientation.
    pub symmetric: bool,
    /// True when at least one residue type came from an exchange set.
    pub exchange: bool,
}

/// Enumerates the deduplicated set of descriptor keys compatible with one
/// query descriptor: the cross product of residue-type substitutions per slot
/// and independent bucket offsets within tolerance per distance/angle axis,
/// each result re-canonicalized.
///
/// Exchange sets are oriented to the descriptor's canonical slots (slot a
/// first), not to the presentation order of the query pair. Offsets that fall
/// off the domain are skipped; they denote no representable geometry. With
/// zero tolerances and empty exchange sets the result is exactly the
/// singleton containing the original canonical key.
pub fn expand(
    descriptor: &ResiduePairDescriptor,
    exchanges_a: Option<&HashSet<ResidueType>>,
    exchanges_b: Option<&HashSet<ResidueType>>,
    distance_tolerance: u8,
    angle_tolerance: u8,
) -> Vec<ExpandedDescriptor> {
    let types_a = slot_candidates(descriptor.type_a, exchanges_a);
    let types_b = slot_candidates(descriptor.type_b, exchanges_b);
    let distance_span = distance_tolerance as i16;
    let angle_span = angle_tolerance as i16;

    let mut best: HashMap<u64, ExpandedDescriptor> = HashMap::new();

    for &type_a in &types_a {
        for &type_b in &types_b {
            let exchanged = u32::from(type_a != descriptor.type_a)
                + u32::from(type_b != descriptor.type_b);
            for delta_a in -distance_span..=distance_span {
                let Some(distance_a) = descriptor.distance_a.offset(delta_a) else {
                    continue;
                };
                for delta_b in -distance_span..=distance_span {
                    let Some(distance_b) = descriptor.distance_b.offset(delta_b) else {
                        continue;
                    };
                    for delta_angle in -angle_span..=angle_span {
                        let Some(angle) = descriptor.angle.offset(delta_angle) else {
                            continue;
                        };
                        let (candidate, swapped) = ResiduePairDescriptor::canonicalize(
                            type_a, type_b, distance_a, distance_b, angle,
                        );
                        let expanded = ExpandedDescriptor {
                            key: candidate.key(),
                            deviation: delta_a.unsigned_abs() as u32
                                + delta_b.unsigned_abs() as u32
                                + delta_angle.unsigned_abs() as u32
                                + exchanged,
                            swapped,
                            symmetric: candidate.type_a == candidate.type_b
                                && candidate.distance_a == candidate.distance_b,
                            exchange: exchanged > 0,
                        };
                        best.entry(expanded.key)
                            .and_modify(|current| {
                                if expanded.deviation < current.deviation {
                                    *current = expanded;
                                }
                            })
                            .or_insert(expanded);
                    }
                }
            }
        }
    }

    let mut result: Vec<ExpandedDescriptor> = best.into_values().collect();
    result.sort_by_key(|expanded| expanded.key);
    result
}

fn slot_candidates(
    original: ResidueType,
    exchanges: Option<&HashSet<ResidueType>>,
) -> Vec<ResidueType> {
    let mut candidates = vec![original];
    if let Some(set) = exchanges {
        for &residue_type in set {
            if !candidates.contains(&residue_type) {
                candidates.push(residue_type);
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::bins::{AngleBin, DistanceBin};

    fn descriptor(
        type_1: ResidueType,
        type_2: ResidueType,
        dist_1: u8,
        dist_2: u8,
        angle: u8,
    ) -> ResiduePairDescriptor {
        ResiduePairDescriptor::canonicalize(
            type_1,
            type_2,
            DistanceBin::from_index(dist_1).unwrap(),
            DistanceBin::from_index(dist_2).unwrap(),
            AngleBin::from_index(angle).unwrap(),
        )
        .0
    }

    fn assert_no_duplicate_keys(expanded: &[ExpandedDescriptor]) {
        let distinct: HashSet<u64> = expanded.iter().map(|e| e.key).collect();
        assert_eq!(distinct.len(), expanded.len());
    }

    #[test]
    fn zero_tolerance_without_exchanges_yields_the_singleton() {
        let query = descriptor(ResidueType::Histidine, ResidueType::Serine, 7, 9, 3);
        let expanded = expand(&query, None, None, 0, 0);
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].key, query.key());
        assert_eq!(expanded[0].deviation, 0);
        assert!(!expanded[0].exchange);
        assert!(!expanded[0].swapped);
    }

    #[test]
    fn one_step_tolerance_expands_each_axis_independently() {
        let query = descriptor(ResidueType::Histidine, ResidueType::Serine, 7, 9, 3);
        let expanded = expand(&query, None, None, 1, 1);
        // Interior buckets on every axis: full 3 * 3 * 3 cross product.
        assert_eq!(expanded.len(), 27);
        assert_no_duplicate_keys(&expanded);
        assert!(expanded.iter().any(|e| e.key == query.key() && e.deviation == 0));
    }

    #[test]
    fn offsets_past_the_domain_edge_are_skipped() {
        let query = descriptor(ResidueType::Histidine, ResidueType::Serine, 0, 63, 0);
        let expanded = expand(&query, None, None, 1, 1);
        // Each of the three axes sits at a domain edge: 2 * 2 * 2.
        assert_eq!(expanded.len(), 8);
        assert_no_duplicate_keys(&expanded);
    }

    #[test]
    fn exchange_set_with_tolerance_dedups_and_keeps_both_types() {
        // Regression shape: 1-step tolerance on all axes plus a 2-element
        // exchange set at one position must keep distinct keys only and
        // represent at least two residue types at that position.
        let query = descriptor(ResidueType::Histidine, ResidueType::AsparticAcid, 7, 9, 3);
        let exchange: HashSet<ResidueType> =
            [ResidueType::AsparticAcid, ResidueType::GlutamicAcid].into();
        let (slot_a_exchange, slot_b_exchange) =
            if query.type_a == ResidueType::AsparticAcid {
                (Some(&exchange), None)
            } else {
                (None, Some(&exchange))
            };
        let expanded = expand(&query, slot_a_exchange, slot_b_exchange, 1, 1);

        assert_no_duplicate_keys(&expanded);
        let types_at_position: HashSet<u8> = expanded
            .iter()
            .map(|e| {
                let decoded = ResiduePairDescriptor::from_key(e.key).unwrap();
                let slot_type = if query.type_a == ResidueType::AsparticAcid {
                    if e.swapped { decoded.type_b } else { decoded.type_a }
                } else if e.swapped {
                    decoded.type_a
                } else {
                    decoded.type_b
                };
                slot_type.to_u8()
            })
            .collect();
        assert!(types_at_position.len() >= 2);
    }

    #[test]
    fn slot_symmetric_keys_are_flagged_per_expanded_key() {
        let query = descriptor(ResidueType::Serine, ResidueType::Serine, 6, 6, 0);
        let expanded = expand(&query, None, None, 0, 0);
        assert!(expanded[0].symmetric);

        // Tolerance offsets reach asymmetric neighbors of a symmetric query
        // descriptor and vice versa; the flag follows each key, not the query.
        let query = descriptor(ResidueType::Serine, ResidueType::Serine, 5, 6, 0);
        let expanded = expand(&query, None, None, 1, 0);
        assert!(expanded.iter().any(|e| e.symmetric));
        assert!(expanded.iter().any(|e| !e.symmetric));
    }

    #[test]
    fn exchanged_keys_carry_the_exchange_flag_and_penalty() {
        let query = descriptor(ResidueType::Histidine, ResidueType::Serine, 7, 9, 3);
        let exchange: HashSet<ResidueType> = [ResidueType::Threonine].into();
        let slot = if query.type_a == ResidueType::Serine {
            (Some(&exchange), None)
        } else {
            (None, Some(&exchange))
        };
        let expanded = expand(&query, slot.0, slot.1, 0, 0);

        assert_eq!(expanded.len(), 2);
        let original = expanded.iter().find(|e| !e.exchange).unwrap();
        let exchanged = expanded.iter().find(|e| e.exchange).unwrap();
        assert_eq!(original.deviation, 0);
        assert_eq!(exchanged.deviation, 1);
        assert_ne!(original.key, exchanged.key);
    }

    #[test]
    fn identical_exchange_type_does_not_duplicate_the_original() {
        let query = descriptor(ResidueType::Histidine, ResidueType::Serine, 7, 9, 3);
        let exchange: HashSet<ResidueType> = [query.type_a].into();
        let expanded = expand(&query, Some(&exchange), None, 0, 0);
        assert_eq!(expanded.len(), 1);
        assert!(!expanded[0].exchange);
    }
}
