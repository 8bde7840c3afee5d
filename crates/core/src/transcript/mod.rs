// Copyright 2024-2025 Irreducible Inc.

//! Fiat-Shamir transcript used to derive the commitment evaluation point.
//!
//! The prover and the verifier each run an identical sequence of [`Transcript::bind`] and
//! [`Transcript::challenge`] calls, so any challenge is a deterministic function of everything
//! bound before it. There is no randomness and no I/O.

use digest::{Digest, FixedOutputReset, Output};
use sha2::Sha256;

const CHALLENGE_TAG: &[u8] = b"challenge";

/// A running hash state with label-separated absorption.
///
/// Every absorbed field is length-prefixed, so binding the same bytes under two different labels
/// (or splitting the same byte string differently across calls) yields distinct states.
#[derive(Debug, Clone)]
pub struct Transcript<H: Digest = Sha256> {
	hasher: H,
}

impl<H: Digest> Default for Transcript<H> {
	fn default() -> Self {
		Self { hasher: H::new() }
	}
}

impl<H> Transcript<H>
where
	H: Digest + FixedOutputReset,
{
	pub fn new() -> Self {
		Self::default()
	}

	/// Absorbs `label` and then `data`.
	pub fn bind(&mut self, label: &str, data: &[u8]) -> &mut Self {
		self.absorb(label.as_bytes());
		self.absorb(data);
		self
	}

	/// Squeezes a challenge under `label`.
	///
	/// The state is consumed: the hasher is reset and re-seeded with the challenge itself, so a
	/// later challenge only repeats an earlier one if everything bound in between is identical.
	pub fn challenge(&mut self, label: &str) -> Output<H> {
		self.absorb(CHALLENGE_TAG);
		self.absorb(label.as_bytes());

		let challenge = Digest::finalize_reset(&mut self.hasher);

		// feed forward to the empty state
		Digest::update(&mut self.hasher, &challenge);

		challenge
	}

	fn absorb(&mut self, bytes: &[u8]) {
		Digest::update(&mut self.hasher, (bytes.len() as u64).to_le_bytes());
		Digest::update(&mut self.hasher, bytes);
	}
}
