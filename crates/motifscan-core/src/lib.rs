//! # Motifscan Core Library
//!
//! A high-performance library for detecting three-dimensional structural motifs,
//! such as catalytic triads, across large libraries of macromolecular structures.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`Structure`,
//!   residue and chain identifiers), the geometric descriptor codec that maps
//!   pairwise residue geometry to compact integer keys, the persisted inverted
//!   index over those keys, and pure geometry utilities (optimal superposition).
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates a search:
//!   query motif extraction, tolerance/exchange-aware descriptor expansion, the
//!   backtracking candidate assembler that performs the indexed multi-way join,
//!   and rigid-body alignment scoring of candidates.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing
//!   layer. It ties the `engine` and `core` together to execute a complete motif
//!   search against an index and structure store, returning ranked hits.

pub mod core;
pub mod engine;
pub mod workflows;
