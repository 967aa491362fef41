//! # Workflows Module
//!
//! This module provides the high-level entry points that orchestrate complete
//! motif searches against an indexed structure library.
//!
//! ## Overview
//!
//! Workflows tie the `core` and `engine` layers together: a user describes a
//! query motif as residue selections on a reference structure, and the search
//! workflow takes it through extraction, candidate assembly, and alignment
//! scoring, returning hits ranked by RMSD.
//!
//! ## Architecture
//!
//! - **Search Workflow** ([`search`]) - Complete motif search, from a
//!   [`search::MotifDefinition`] to a ranked
//!   [`crate::engine::state::SearchResult`], with progress reporting and
//!   cooperative cancellation.

pub mod search;
