use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of polymer classes a residue can belong to.
///
/// Anchor-atom selection is dispatched by a `match` on this tag; the set is
/// small and closed, so no trait object is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolymerClass {
    AminoAcid,
    Nucleotide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ResidueType {
    // --- Amino acids ---
    Alanine,
    Arginine,
    Asparagine,
    AsparticAcid,
    Cysteine,
    GlutamicAcid,
    Glutamine,
    Glycine,
    Histidine,
    Isoleucine,
    Leucine,
    Lysine,
    Methionine,
    Phenylalanine,
    Proline,
    Serine,
    Threonine,
    Tryptophan,
    Tyrosine,
    Valine,

    // --- Ribonucleotides ---
    Adenosine,
    Cytidine,
    Guanosine,
    Uridine,

    // --- Deoxyribonucleotides ---
    Deoxyadenosine,
    Deoxycytidine,
    Deoxyguanosine,
    Deoxythymidine,

    Unknown,
}

static THREE_LETTER_CODES: Map<&'static str, ResidueType> = phf_map! {
    "ALA" => ResidueType::Alanine,
    "ARG" => ResidueType::Arginine,
    "ASN" => ResidueType::Asparagine,
    "ASP" => ResidueType::AsparticAcid,
    "CYS" => ResidueType::Cysteine,
    "GLU" => ResidueType::GlutamicAcid,
    "GLN" => ResidueType::Glutamine,
    "GLY" => ResidueType::Glycine,
    "HIS" => ResidueType::Histidine,
    "ILE" => ResidueType::Isoleucine,
    "LEU" => ResidueType::Leucine,
    "LYS" => ResidueType::Lysine,
    "MET" => ResidueType::Methionine,
    "PHE" => ResidueType::Phenylalanine,
    "PRO" => ResidueType::Proline,
    "SER" => ResidueType::Serine,
    "THR" => ResidueType::Threonine,
    "TRP" => ResidueType::Tryptophan,
    "TYR" => ResidueType::Tyrosine,
    "VAL" => ResidueType::Valine,
    "A" => ResidueType::Adenosine,
    "C" => ResidueType::Cytidine,
    "G" => ResidueType::Guanosine,
    "U" => ResidueType::Uridine,
    "DA" => ResidueType::Deoxyadenosine,
    "DC" => ResidueType::Deoxycytidine,
    "DG" => ResidueType::Deoxyguanosine,
    "DT" => ResidueType::Deoxythymidine,
};

impl ResidueType {
    /// Stable numeric code used by the descriptor codec (5 bits).
    pub fn to_u8(self) -> u8 {
        match self {
            ResidueType::Alanine => 0,
            ResidueType::Arginine => 1,
            ResidueType::Asparagine => 2,
            ResidueType::AsparticAcid => 3,
            ResidueType::Cysteine => 4,
            ResidueType::GlutamicAcid => 5,
            ResidueType::Glutamine => 6,
            ResidueType::Glycine => 7,
            ResidueType::Histidine => 8,
            ResidueType::Isoleucine => 9,
            ResidueType::Leucine => 10,
            ResidueType::Lysine => 11,
            ResidueType::Methionine => 12,
            ResidueType::Phenylalanine => 13,
            ResidueType::Proline => 14,
            ResidueType::Serine => 15,
            ResidueType::Threonine => 16,
            ResidueType::Tryptophan => 17,
            ResidueType::Tyrosine => 18,
            ResidueType::Valine => 19,
            ResidueType::Adenosine => 20,
            ResidueType::Cytidine => 21,
            ResidueType::Guanosine => 22,
            ResidueType::Uridine => 23,
            ResidueType::Deoxyadenosine => 24,
            ResidueType::Deoxycytidine => 25,
            ResidueType::Deoxyguanosine => 26,
            ResidueType::Deoxythymidine => 27,
            ResidueType::Unknown => 28,
        }
    }

    /// Inverse of [`ResidueType::to_u8`]; unassigned codes map to `Unknown`.
    pub fn from_u8(code: u8) -> Self {
        match code {
            0 => ResidueType::Alanine,
            1 => ResidueType::Arginine,
            2 => ResidueType::Asparagine,
            3 => ResidueType::AsparticAcid,
            4 => ResidueType::Cysteine,
            5 => ResidueType::GlutamicAcid,
            6 => ResidueType::Glutamine,
            7 => ResidueType::Glycine,
            8 => ResidueType::Histidine,
            9 => ResidueType::Isoleucine,
            10 => ResidueType::Leucine,
            11 => ResidueType::Lysine,
            12 => ResidueType::Methionine,
            13 => ResidueType::Phenylalanine,
            14 => ResidueType::Proline,
            15 => ResidueType::Serine,
            16 => ResidueType::Threonine,
            17 => ResidueType::Tryptophan,
            18 => ResidueType::Tyrosine,
            19 => ResidueType::Valine,
            20 => ResidueType::Adenosine,
            21 => ResidueType::Cytidine,
            22 => ResidueType::Guanosine,
            23 => ResidueType::Uridine,
            24 => ResidueType::Deoxyadenosine,
            25 => ResidueType::Deoxycytidine,
            26 => ResidueType::Deoxyguanosine,
            27 => ResidueType::Deoxythymidine,
            _ => ResidueType::Unknown,
        }
    }

    pub fn polymer_class(self) -> PolymerClass {
        match self {
            ResidueType::Adenosine
            | ResidueType::Cytidine
            | ResidueType::Guanosine
            | ResidueType::Uridine
            | ResidueType::Deoxyadenosine
            | ResidueType::Deoxycytidine
            | ResidueType::Deoxyguanosine
            | ResidueType::Deoxythymidine => PolymerClass::Nucleotide,
            _ => PolymerClass::AminoAcid,
        }
    }

    pub fn one_letter_code(self) -> char {
        match self {
            ResidueType::Alanine => 'A',
            ResidueType::Arginine => 'R',
            ResidueType::Asparagine => 'N',
            ResidueType::AsparticAcid => 'D',
            ResidueType::Cysteine => 'C',
            ResidueType::GlutamicAcid => 'E',
            ResidueType::Glutamine => 'Q',
            ResidueType::Glycine => 'G',
            ResidueType::Histidine => 'H',
            ResidueType::Isoleucine => 'I',
            ResidueType::Leucine => 'L',
            ResidueType::Lysine => 'K',
            ResidueType::Methionine => 'M',
            ResidueType::Phenylalanine => 'F',
            ResidueType::Proline => 'P',
            ResidueType::Serine => 'S',
            ResidueType::Threonine => 'T',
            ResidueType::Tryptophan => 'W',
            ResidueType::Tyrosine => 'Y',
            ResidueType::Valine => 'V',
            ResidueType::Adenosine | ResidueType::Deoxyadenosine => 'a',
            ResidueType::Cytidine | ResidueType::Deoxycytidine => 'c',
            ResidueType::Guanosine | ResidueType::Deoxyguanosine => 'g',
            ResidueType::Uridine => 'u',
            ResidueType::Deoxythymidine => 't',
            ResidueType::Unknown => 'X',
        }
    }

    /// Name of the backbone anchor atom for this residue's polymer class.
    pub fn backbone_anchor_atom(self) -> &'static str {
        match self.polymer_class() {
            PolymerClass::AminoAcid => "CA",
            PolymerClass::Nucleotide => "C4'",
        }
    }

    /// Name of the side-chain (interaction) anchor atom.
    ///
    /// Glycine has no side-chain heavy atom; its side-chain anchor falls back
    /// to the backbone anchor at resolution time.
    pub fn side_chain_anchor_atom(self) -> &'static str {
        match self.polymer_class() {
            PolymerClass::AminoAcid => "CB",
            PolymerClass::Nucleotide => "C1'",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown residue name: {0}")]
pub struct ParseResidueTypeError(String);

impl FromStr for ResidueType {
    type Err = ParseResidueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        THREE_LETTER_CODES
            .get(trimmed.to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| ParseResidueTypeError(trimmed.to_string()))
    }
}

impl fmt::Display for ResidueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.one_letter_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_round_trip_for_all_assigned_types() {
        for code in 0..=28u8 {
            let residue_type = ResidueType::from_u8(code);
            assert_eq!(residue_type.to_u8(), code);
        }
    }

    #[test]
    fn unassigned_codes_map_to_unknown() {
        assert_eq!(ResidueType::from_u8(29), ResidueType::Unknown);
        assert_eq!(ResidueType::from_u8(255), ResidueType::Unknown);
    }

    #[test]
    fn parses_three_letter_codes_case_insensitively() {
        assert_eq!("HIS".parse::<ResidueType>().unwrap(), ResidueType::Histidine);
        assert_eq!("asp".parse::<ResidueType>().unwrap(), ResidueType::AsparticAcid);
        assert_eq!(" gly ".parse::<ResidueType>().unwrap(), ResidueType::Glycine);
        assert!("ZZZ".parse::<ResidueType>().is_err());
    }

    #[test]
    fn polymer_class_dispatches_anchor_atoms() {
        assert_eq!(ResidueType::Serine.backbone_anchor_atom(), "CA");
        assert_eq!(ResidueType::Serine.side_chain_anchor_atom(), "CB");
        assert_eq!(ResidueType::Guanosine.backbone_anchor_atom(), "C4'");
        assert_eq!(ResidueType::Guanosine.side_chain_anchor_atom(), "C1'");
        assert_eq!(ResidueType::Deoxythymidine.polymer_class(), PolymerClass::Nucleotide);
        assert_eq!(ResidueType::Unknown.polymer_class(), PolymerClass::AminoAcid);
    }
}
