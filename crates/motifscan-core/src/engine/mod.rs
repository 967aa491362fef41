//! # Engine Module
//!
//! This module implements the search engine for structural motif detection,
//! providing the stateful logic that turns a query motif into ranked hits
//! against an indexed structure library.
//!
//! ## Overview
//!
//! A search flows through four stages: the query motif is resolved and its
//! pairwise geometric fingerprint extracted ([`extractor`]); each pair
//! descriptor is expanded into the set of keys compatible with the configured
//! tolerances and residue exchanges ([`expansion`]); the inverted index is
//! joined edge-by-edge into self-consistent residue correspondences per target
//! structure ([`assembler`]); and surviving candidates are superposed and
//! scored by RMSD ([`alignment`]).
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Tolerances, exchanges, cutoffs, and limits
//! - **Search Context** ([`context`]) - Explicit handle on the index and structure stores
//! - **Cancellation** ([`cancel`]) - Cooperative deadline/cancel checks between work units
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Result Types** ([`state`]) - Hits, transformed hits, and result aggregation
//! - **Error Handling** ([`error`]) - Search-specific error taxonomy

pub mod assembler;
pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod expansion;
pub mod extractor;
pub mod progress;
pub mod state;

pub(crate) mod alignment;
