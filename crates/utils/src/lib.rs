// Copyright 2024-2025 Irreducible Inc.

//! Shared plumbing for the droplet crates: error macros, the byte-level serialization traits,
//! and process setup for tracing and the rayon thread pool.

pub mod env;
pub mod error_utils;
pub mod rayon;
pub mod serialization;
pub mod tracing;

pub use serialization::{DeserializeBytes, SerializeBytes};
