// Copyright 2024-2025 Irreducible Inc.

//! Hashing helpers shared by the codec and the commitment layer.

pub mod payload;
pub mod serialization;

pub use digest::{Digest, Output};
pub use payload::*;
pub use serialization::*;
