// Copyright 2024-2025 Irreducible Inc.

//! Rateless erasure coding of messages into fragments, with a KZG commitment that lets anyone
//! check a fragment set against a published digest.
//!
//! The crate is synchronous and free of global state: codec parameters and commitment material
//! are explicit values passed into every operation.

pub mod commitment;
pub mod dispersal;
pub mod fountain;
pub mod store;
pub mod transcript;
