use super::identifiers::StructureIdentifier;
use super::structure::Structure;
use std::collections::HashMap;

/// Access to renumbered structures, keyed by structure identifier.
///
/// This is the seam to the structure-store collaborator: the search engine
/// needs coordinates and residue identities for query extraction and hit
/// alignment, but never parses raw structural file formats itself.
pub trait StructureStore: Sync {
    fn get(&self, id: &StructureIdentifier) -> Option<&Structure>;
}

#[derive(Debug, Default)]
pub struct InMemoryStructureStore {
    structures: HashMap<StructureIdentifier, Structure>,
}

impl InMemoryStructureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, structure: Structure) {
        self.structures.insert(structure.id().clone(), structure);
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}

impl StructureStore for InMemoryStructureStore {
    fn get(&self, id: &StructureIdentifier) -> Option<&Structure> {
        self.structures.get(id)
    }
}
