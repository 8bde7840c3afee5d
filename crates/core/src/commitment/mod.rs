// Copyright 2024-2025 Irreducible Inc.

//! KZG polynomial commitments over BN254.
//!
//! Fragment payloads are hashed into field elements, committed as polynomial coefficients and
//! opened at a point derived from the commitment through a Fiat-Shamir [`Transcript`]. The
//! prover never chooses the point.
//!
//! [`Transcript`]: crate::transcript::Transcript

mod error;
mod kzg;
mod material;
mod setup;

pub use error::*;
pub use kzg::*;
pub use material::*;
pub use setup::*;
