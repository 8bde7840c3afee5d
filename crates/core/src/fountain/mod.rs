// Copyright 2024-2025 Irreducible Inc.

//! Rateless LT fountain code: soliton degree sampling, fragment generation and the peeling
//! decoder.

mod block;
pub mod degree;
mod decode;
mod encode;
mod error;
mod fragment;
mod params;
pub mod rng;

pub use block::*;
pub use decode::*;
pub use encode::*;
pub use error::*;
pub use fragment::*;
pub use params::*;
