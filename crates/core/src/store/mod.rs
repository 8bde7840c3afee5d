// Copyright 2024-2025 Irreducible Inc.

//! Storage contracts the codec relies on, with in-memory implementations.
//!
//! Every store takes `&self` and is `Send + Sync`, so one handle can be shared by any number of
//! generators and decoders.

mod error;
mod fragment;
mod object;
mod parameter;

pub use error::*;
pub use fragment::*;
pub use object::*;
pub use parameter::*;
