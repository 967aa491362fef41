use crate::core::descriptor::DescriptorError;
use crate::core::index::IndexError;
use crate::core::models::identifiers::{LabelSelection, StructureIdentifier};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Query geometry outside the encodable range. A caller error; not
    /// retried.
    #[error("query geometry not encodable: {source}")]
    Descriptor {
        #[from]
        source: DescriptorError,
    },

    #[error("selection {0} does not resolve to a residue")]
    UnresolvableSelection(LabelSelection),

    #[error("a motif needs at least two residues, got {0}")]
    InsufficientMotifSize(usize),

    #[error("query structure {0} not present in the structure store")]
    StructureNotFound(StructureIdentifier),

    #[error("index access failed: {source}")]
    Index {
        #[from]
        source: IndexError,
    },

    /// Deadline or cancel token tripped. Partial results are discarded, never
    /// silently truncated.
    #[error("search cancelled")]
    Cancelled,
}
