pub mod identifiers;
pub mod ids;
pub mod residue;
pub mod store;
pub mod structure;
