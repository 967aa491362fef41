use super::identifiers::{ChainIdentifier, LabelSelection, ResidueIdentifier, StructureIdentifier};
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::ResidueType;
use nalgebra::Point3;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub name: String,
    pub position: Point3<f64>,
}

#[derive(Debug, Clone)]
pub struct Residue {
    pub residue_type: ResidueType,
    pub label_seq_id: i64,                  // Sequence position from the source file
    pub chain_id: ChainId,                  // ID of the parent chain
    pub(crate) atoms: Vec<AtomId>,          // Atoms belonging to this residue
    atom_name_map: HashMap<String, AtomId>, // Map from atom name to its stable ID
}

impl Residue {
    pub(crate) fn new(residue_type: ResidueType, label_seq_id: i64, chain_id: ChainId) -> Self {
        Self {
            residue_type,
            label_seq_id,
            chain_id,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map.insert(atom_name.to_string(), atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }
}

#[derive(Debug, Clone)]
pub struct Chain {
    pub identifier: ChainIdentifier,
    pub(crate) residues: Vec<ResidueId>,
}

impl Chain {
    pub(crate) fn new(identifier: ChainIdentifier) -> Self {
        Self {
            identifier,
            residues: Vec::new(),
        }
    }

    pub fn residues(&self) -> &[ResidueId] {
        &self.residues
    }
}

/// Compact, renumbered representation of one structure (with its symmetry
/// copies already expanded into separate chains).
///
/// Residues are assigned a stable structural index in insertion order; that
/// index is what the inverted index packs into residue-pair occurrences, so it
/// must match between the index build and query-time resolution.
#[derive(Debug, Clone)]
pub struct Structure {
    id: StructureIdentifier,
    atoms: SlotMap<AtomId, Atom>,
    residues: SlotMap<ResidueId, Residue>,
    chains: SlotMap<ChainId, Chain>,
    residue_order: Vec<ResidueId>,
    residue_indices: SecondaryMap<ResidueId, usize>,
    chain_map: HashMap<ChainIdentifier, ChainId>,
    residue_lookup: HashMap<(ChainId, i64), ResidueId>,
}

impl Structure {
    pub fn id(&self) -> &StructureIdentifier {
        &self.id
    }

    pub fn residue_count(&self) -> usize {
        self.residue_order.len()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chains.iter()
    }

    /// Residues in stable structural-index order.
    pub fn residues_by_index(&self) -> impl Iterator<Item = (usize, ResidueId, &Residue)> {
        self.residue_order
            .iter()
            .enumerate()
            .map(|(index, &id)| (index, id, &self.residues[id]))
    }

    pub fn residue_by_index(&self, index: usize) -> Option<ResidueId> {
        self.residue_order.get(index).copied()
    }

    pub fn residue_index(&self, id: ResidueId) -> Option<usize> {
        self.residue_indices.get(id).copied()
    }

    /// Resolves a user-facing selection to the residue it addresses.
    pub fn resolve(&self, selection: &LabelSelection) -> Option<ResidueId> {
        let chain_identifier =
            ChainIdentifier::new(&selection.chain_name, &selection.operator_id);
        let chain_id = self.chain_map.get(&chain_identifier)?;
        self.residue_lookup
            .get(&(*chain_id, selection.label_seq_id))
            .copied()
    }

    pub fn residue_identifier(&self, id: ResidueId) -> Option<ResidueIdentifier> {
        let residue = self.residues.get(id)?;
        let index = self.residue_index(id)?;
        Some(ResidueIdentifier::new(
            residue.residue_type,
            residue.label_seq_id,
            index,
        ))
    }

    pub fn label_selection(&self, id: ResidueId) -> Option<LabelSelection> {
        let residue = self.residues.get(id)?;
        let chain = self.chains.get(residue.chain_id)?;
        Some(LabelSelection::new(
            &chain.identifier.name,
            &chain.identifier.operator_id,
            residue.label_seq_id,
        ))
    }

    pub fn operator_of(&self, id: ResidueId) -> Option<&str> {
        let residue = self.residues.get(id)?;
        let chain = self.chains.get(residue.chain_id)?;
        Some(&chain.identifier.operator_id)
    }

    /// Position of the residue's backbone anchor atom (CA for amino acids,
    /// C4' for nucleotides).
    pub fn backbone_anchor(&self, id: ResidueId) -> Option<Point3<f64>> {
        let residue = self.residues.get(id)?;
        let atom_id = residue.get_atom_id_by_name(residue.residue_type.backbone_anchor_atom())?;
        Some(self.atoms[atom_id].position)
    }

    /// Position of the residue's side-chain anchor atom (CB / C1').
    ///
    /// Falls back to the backbone anchor when the side-chain atom is absent
    /// (glycine, truncated side chains).
    pub fn side_chain_anchor(&self, id: ResidueId) -> Option<Point3<f64>> {
        let residue = self.residues.get(id)?;
        match residue.get_atom_id_by_name(residue.residue_type.side_chain_anchor_atom()) {
            Some(atom_id) => Some(self.atoms[atom_id].position),
            None => self.backbone_anchor(id),
        }
    }
}

pub struct StructureBuilder {
    structure: Structure,
    current_chain: Option<ChainId>,
    current_residue: Option<ResidueId>,
}

impl StructureBuilder {
    pub fn new(id: StructureIdentifier) -> Self {
        Self {
            structure: Structure {
                id,
                atoms: SlotMap::with_key(),
                residues: SlotMap::with_key(),
                chains: SlotMap::with_key(),
                residue_order: Vec::new(),
                residue_indices: SecondaryMap::new(),
                chain_map: HashMap::new(),
                residue_lookup: HashMap::new(),
            },
            current_chain: None,
            current_residue: None,
        }
    }

    pub fn start_chain(&mut self, name: &str, operator_id: &str) -> &mut Self {
        let identifier = ChainIdentifier::new(name, operator_id);
        let chain_id = match self.structure.chain_map.get(&identifier) {
            Some(&id) => id,
            None => {
                let id = self.structure.chains.insert(Chain::new(identifier.clone()));
                self.structure.chain_map.insert(identifier, id);
                id
            }
        };
        self.current_chain = Some(chain_id);
        self.current_residue = None;
        self
    }

    pub fn start_residue(&mut self, residue_type: ResidueType, label_seq_id: i64) -> &mut Self {
        let chain_id = self
            .current_chain
            .expect("must start a chain before starting a residue");
        // Microheterogeneity: an alternate assignment at an already-present
        // sequence position reuses the existing residue identity.
        let residue_id = match self.structure.residue_lookup.get(&(chain_id, label_seq_id)) {
            Some(&id) => id,
            None => {
                let id = self
                    .structure
                    .residues
                    .insert(Residue::new(residue_type, label_seq_id, chain_id));
                let index = self.structure.residue_order.len();
                self.structure.residue_order.push(id);
                self.structure.residue_indices.insert(id, index);
                self.structure.residue_lookup.insert((chain_id, label_seq_id), id);
                self.structure.chains[chain_id].residues.push(id);
                id
            }
        };
        self.current_residue = Some(residue_id);
        self
    }

    pub fn add_atom(&mut self, name: &str, position: Point3<f64>) -> &mut Self {
        let residue_id = self
            .current_residue
            .expect("must start a residue before adding an atom");
        let atom_id = self.structure.atoms.insert(Atom {
            name: name.to_string(),
            position,
        });
        self.structure.residues[residue_id].add_atom(name, atom_id);
        self
    }

    pub fn build(self) -> Structure {
        self.structure
    }
}
