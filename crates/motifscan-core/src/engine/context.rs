use crate::core::index::DescriptorStore;
use crate::core::models::store::StructureStore;

/// Explicit handle on everything a search needs: the inverted index and the
/// structure store. Constructed by the caller and passed to query operations;
/// there is no process-wide singleton.
#[derive(Clone, Copy)]
pub struct SearchContext<'a> {
    pub index: &'a dyn DescriptorStore,
    pub structures: &'a dyn StructureStore,
}

impl<'a> SearchContext<'a> {
    pub fn new(index: &'a dyn DescriptorStore, structures: &'a dyn StructureStore) -> Self {
        Self { index, structures }
    }
}
