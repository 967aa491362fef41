//! # Core Module
//!
//! This module provides the fundamental building blocks for structural motif
//! detection, serving as the stateless foundation of the library.
//!
//! ## Overview
//!
//! The core module implements the data structures and codecs required to turn
//! residue-pair geometry into compact, canonical descriptor keys, to persist and
//! query the inverted index that maps those keys to occurrences across a structure
//! library, and to superpose matched coordinate sets for scoring.
//!
//! ## Architecture
//!
//! The module is organized into specialized submodules that handle different
//! aspects of the problem:
//!
//! - **Structural Representation** ([`models`]) - Residue types, identifiers, and the compact structure model
//! - **Descriptor Codec** ([`descriptor`]) - Discretization and canonical encoding of pairwise geometry
//! - **Inverted Index** ([`index`]) - Persisted descriptor-to-occurrence bins with random access
//! - **Geometry Utilities** ([`utils`]) - Optimal rigid-body superposition and RMSD

pub mod descriptor;
pub mod index;
pub mod models;
pub mod utils;
