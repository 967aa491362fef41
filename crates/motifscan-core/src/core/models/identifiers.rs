use super::residue::ResidueType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The assembly operator that leaves a chain untransformed.
pub const IDENTITY_OPERATOR: &str = "1";

/// Stable, lower-cased structure code (e.g. `"4cha"`).
///
/// Construction lower-cases the input, which makes equality and hashing
/// effectively case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureIdentifier(String);

impl StructureIdentifier {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StructureIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one chain instance, distinguishing symmetry-generated copies of
/// the same chain by their assembly operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainIdentifier {
    pub name: String,
    pub operator_id: String,
}

impl ChainIdentifier {
    pub fn new(name: &str, operator_id: &str) -> Self {
        Self {
            name: name.to_string(),
            operator_id: operator_id.to_string(),
        }
    }

    pub fn original(name: &str) -> Self {
        Self::new(name, IDENTITY_OPERATOR)
    }
}

impl fmt::Display for ChainIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.operator_id)
    }
}

/// The externally addressable unit a user selects as part of a query motif.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelSelection {
    pub chain_name: String,
    pub operator_id: String,
    pub label_seq_id: i64,
}

impl LabelSelection {
    pub fn new(chain_name: &str, operator_id: &str, label_seq_id: i64) -> Self {
        Self {
            chain_name: chain_name.to_string(),
            operator_id: operator_id.to_string(),
            label_seq_id,
        }
    }
}

impl fmt::Display for LabelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}-{}", self.chain_name, self.operator_id, self.label_seq_id)
    }
}

/// Identity of one residue within a structure.
///
/// Equality and hashing deliberately ignore the residue type: alternate residue
/// assignments at the same sequence position and structural index
/// (microheterogeneity) are treated as the same residue identity. Changing this
/// would silently alter match sets; it must hold across all index and query code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResidueIdentifier {
    pub residue_type: ResidueType,
    pub label_seq_id: i64,
    pub index: usize,
}

impl ResidueIdentifier {
    pub fn new(residue_type: ResidueType, label_seq_id: i64, index: usize) -> Self {
        Self {
            residue_type,
            label_seq_id,
            index,
        }
    }
}

impl PartialEq for ResidueIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.label_seq_id == other.label_seq_id && self.index == other.index
    }
}

impl Eq for ResidueIdentifier {}

impl Hash for ResidueIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label_seq_id.hash(state);
        self.index.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn structure_identifier_equality_is_case_insensitive() {
        assert_eq!(StructureIdentifier::new("4CHA"), StructureIdentifier::new("4cha"));
        assert_eq!(StructureIdentifier::new(" 1ABC "), StructureIdentifier::new("1abc"));
        assert_eq!(StructureIdentifier::new("4CHA").as_str(), "4cha");
    }

    #[test]
    fn chain_identifier_distinguishes_operators() {
        let original = ChainIdentifier::original("A");
        let copy = ChainIdentifier::new("A", "2");
        assert_ne!(original, copy);
        assert_eq!(original.operator_id, IDENTITY_OPERATOR);
    }

    #[test]
    fn residue_identifier_equality_ignores_residue_type() {
        let a = ResidueIdentifier::new(ResidueType::Histidine, 57, 4);
        let b = ResidueIdentifier::new(ResidueType::AsparticAcid, 57, 4);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn residue_identifier_differs_by_position_or_index() {
        let a = ResidueIdentifier::new(ResidueType::Histidine, 57, 4);
        let b = ResidueIdentifier::new(ResidueType::Histidine, 58, 4);
        let c = ResidueIdentifier::new(ResidueType::Histidine, 57, 5);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
