use super::error::SearchError;
use crate::core::descriptor::codec::ResiduePairDescriptor;
use crate::core::models::identifiers::{LabelSelection, ResidueIdentifier, StructureIdentifier};
use crate::core::models::ids::ResidueId;
use crate::core::models::structure::Structure;
use itertools::Itertools;
use std::collections::HashSet;

/// One edge of the query fingerprint: a pair of selections and the canonical
/// descriptor of their geometry.
///
/// `swapped` records whether canonicalization put selection `b`'s residue into
/// descriptor slot a; consumers that map occurrence slots back to selections
/// must honor it.
#[derive(Debug, Clone)]
pub struct MotifPair {
    /// Index of the first selection in [`QueryMotif::selections`].
    pub a: usize,
    /// Index of the second selection in [`QueryMotif::selections`].
    pub b: usize,
    pub descriptor: ResiduePairDescriptor,
    pub swapped: bool,
}

/// The geometric fingerprint of a query motif: all pairwise descriptors over
/// the selected residues, plus the resolved residues themselves.
#[derive(Debug, Clone)]
pub struct QueryMotif {
    pub structure_id: StructureIdentifier,
    pub selections: Vec<LabelSelection>,
    pub residues: Vec<ResidueId>,
    pub pairs: Vec<MotifPair>,
}

impl QueryMotif {
    pub fn size(&self) -> usize {
        self.selections.len()
    }
}

/// Resolves the selected residues and computes the full pairwise fingerprint.
///
/// The selections are sorted first so the pair enumeration is stable and
/// deterministic regardless of presentation order. Selections that resolve to
/// the same residue identity (microheterogeneity) collapse to one position.
pub fn extract(
    structure: &Structure,
    selections: &[LabelSelection],
) -> Result<QueryMotif, SearchError> {
    let mut sorted: Vec<LabelSelection> = selections.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut seen: HashSet<ResidueIdentifier> = HashSet::new();
    let mut resolved: Vec<(LabelSelection, ResidueId)> = Vec::with_capacity(sorted.len());
    for selection in sorted {
        let residue_id = structure
            .resolve(&selection)
            .ok_or_else(|| SearchError::UnresolvableSelection(selection.clone()))?;
        let identifier = structure
            .residue_identifier(residue_id)
            .ok_or_else(|| SearchError::UnresolvableSelection(selection.clone()))?;
        if seen.insert(identifier) {
            resolved.push((selection, residue_id));
        }
    }

    if resolved.len() < 2 {
        return Err(SearchError::InsufficientMotifSize(resolved.len()));
    }

    let mut pairs = Vec::with_capacity(resolved.len() * (resolved.len() - 1) / 2);
    for (index_1, index_2) in (0..resolved.len()).tuple_combinations() {
        let (_, id_1) = &resolved[index_1];
        let (_, id_2) = &resolved[index_2];
        let (descriptor, swapped) = pair_descriptor(structure, *id_1, *id_2)?;
        pairs.push(MotifPair {
            a: index_1,
            b: index_2,
            descriptor,
            swapped,
        });
    }

    let (selections, residues): (Vec<_>, Vec<_>) = resolved.into_iter().unzip();
    Ok(QueryMotif {
        structure_id: structure.id().clone(),
        selections,
        residues,
        pairs,
    })
}

fn pair_descriptor(
    structure: &Structure,
    id_1: ResidueId,
    id_2: ResidueId,
) -> Result<(ResiduePairDescriptor, bool), SearchError> {
    let anchors = |id: ResidueId| {
        Some((
            structure.residue(id)?.residue_type,
            structure.backbone_anchor(id)?,
            structure.side_chain_anchor(id)?,
        ))
    };
    let (type_1, bb_1, sc_1) = anchors(id_1).ok_or_else(|| {
        selection_error(structure, id_1)
    })?;
    let (type_2, bb_2, sc_2) = anchors(id_2).ok_or_else(|| {
        selection_error(structure, id_2)
    })?;
    Ok(ResiduePairDescriptor::from_anchors(
        type_1, bb_1, sc_1, type_2, bb_2, sc_2,
    )?)
}

fn selection_error(structure: &Structure, id: ResidueId) -> SearchError {
    match structure.label_selection(id) {
        Some(selection) => SearchError::UnresolvableSelection(selection),
        None => SearchError::UnresolvableSelection(LabelSelection::new("?", "?", 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::identifiers::IDENTITY_OPERATOR;
    use crate::core::models::residue::ResidueType;
    use crate::core::models::structure::StructureBuilder;
    use nalgebra::Point3;

    fn triad_structure() -> Structure {
        let mut builder = StructureBuilder::new(StructureIdentifier::new("1tri"));
        builder
            .start_chain("A", IDENTITY_OPERATOR)
            .start_residue(ResidueType::Histidine, 57)
            .add_atom("CA", Point3::new(0.0, 0.0, 0.0))
            .add_atom("CB", Point3::new(1.5, 0.0, 0.0))
            .start_residue(ResidueType::AsparticAcid, 102)
            .add_atom("CA", Point3::new(6.0, 0.0, 0.0))
            .add_atom("CB", Point3::new(7.5, 0.0, 0.0))
            .start_residue(ResidueType::Serine, 195)
            .add_atom("CA", Point3::new(0.0, 5.0, 0.0))
            .add_atom("CB", Point3::new(1.5, 5.0, 0.0));
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
    fn extracts_all_unordered_pairs() {
        let motif = extract(&triad_structure(), &selections()).unwrap();
        assert_eq!(motif.size(), 3);
        assert_eq!(motif.pairs.len(), 3);
        let edges: Vec<(usize, usize)> = motif.pairs.iter().map(|p| (p.a, p.b)).collect();
        assert_eq!(edges, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn enumeration_is_stable_under_presentation_order() {
        let structure = triad_structure();
        let forward = extract(&structure, &selections()).unwrap();
        let mut shuffled = selections();
        shuffled.reverse();
        let backward = extract(&structure, &shuffled).unwrap();

        assert_eq!(forward.selections, backward.selections);
        let keys = |motif: &QueryMotif| -> Vec<u64> {
            motif.pairs.iter().map(|p| p.descriptor.key()).collect()
        };
        assert_eq!(keys(&forward), keys(&backward));
    }

    #[test]
    fn unresolvable_selection_aborts_the_query() {
        let result = extract(
            &triad_structure(),
            &[
                LabelSelection::new("A", IDENTITY_OPERATOR, 57),
                LabelSelection::new("A", IDENTITY_OPERATOR, 999),
            ],
        );
        assert!(matches!(result, Err(SearchError::UnresolvableSelection(s)) if s.label_seq_id == 999));
    }

    #[test]
    fn fewer_than_two_selections_is_rejected() {
        let structure = triad_structure();
        let result = extract(&structure, &[LabelSelection::new("A", IDENTITY_OPERATOR, 57)]);
        assert!(matches!(result, Err(SearchError::InsufficientMotifSize(1))));
        let result = extract(&structure, &[]);
        assert!(matches!(result, Err(SearchError::InsufficientMotifSize(0))));
    }

    #[test]
    fn duplicate_selections_collapse_to_one_position() {
        let structure = triad_structure();
        let result = extract(
            &structure,
            &[
                LabelSelection::new("A", IDENTITY_OPERATOR, 57),
                LabelSelection::new("A", IDENTITY_OPERATOR, 57),
            ],
        );
        assert!(matches!(result, Err(SearchError::InsufficientMotifSize(1))));
    }
}
