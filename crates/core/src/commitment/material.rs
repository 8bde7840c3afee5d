// Copyright 2024-2025 Irreducible Inc.

use ark_bn254::{Fr, G1Affine};
use ark_ff::{PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use droplet_hash::{payload_digest, sha256_concat};
use getset::{CopyGetters, Getters};
use itertools::Itertools;
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use tracing::instrument;

use super::{
	error::{Error, VerificationError},
	kzg::{commit, open, prove, vanishing_polynomial, verify, verify_opening, Commitment, OpeningProof},
	setup::Srs,
};
use crate::fountain::Fragment;

fn unique_by_id(fragments: &[Fragment]) -> Vec<&Fragment> {
	fragments
		.iter()
		.sorted_by_key(|fragment| fragment.id)
		.dedup_by(|a, b| a.id == b.id)
		.collect()
}

/// One field element per fragment: the SHA-256 of its payload read big-endian modulo `r`,
/// ordered by fragment id. Repeated ids contribute once.
pub fn fragment_values(fragments: &[Fragment]) -> Vec<Fr> {
	unique_by_id(fragments)
		.par_iter()
		.map(|fragment| Fr::from_be_bytes_mod_order(&payload_digest(&fragment.payload)))
		.collect()
}

/// The root a fragment contributes to the roots polynomial: SHA-256 of `id ‖ payload`, so the
/// id is bound as well as the payload.
pub fn fragment_root(fragment: &Fragment) -> Fr {
	let id = fragment.id.to_le_bytes();
	Fr::from_be_bytes_mod_order(&sha256_concat([id.as_slice(), fragment.payload.as_slice()]))
}

/// Roots of every fragment, ordered by id. Repeated ids contribute once.
pub fn fragment_roots(fragments: &[Fragment]) -> Vec<Fr> {
	unique_by_id(fragments)
		.par_iter()
		.map(|fragment| fragment_root(fragment))
		.collect()
}

/// Opening of the roots polynomial at one fragment's root, where it evaluates to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct FragmentProof {
	pub id: u64,
	pub quotient: G1Affine,
}

/// Setup output and proofs for one message instance, published next to its codec parameters.
///
/// Two polynomials are committed under the same setup:
/// - the fragment values as coefficients, opened at the point derived from its digest;
/// - `∏ (X - root)` over the fragment roots, which any single fragment can be opened against.
#[derive(
	Debug, Clone, PartialEq, Eq, Getters, CopyGetters, CanonicalSerialize, CanonicalDeserialize,
)]
pub struct CommitmentMaterial {
	#[get = "pub"]
	srs: Srs,
	#[get_copy = "pub"]
	digest: Commitment,
	#[get_copy = "pub"]
	point: Fr,
	#[get_copy = "pub"]
	proof: OpeningProof,
	#[get_copy = "pub"]
	roots_digest: Commitment,
}

impl CommitmentMaterial {
	/// Runs a fresh trusted setup sized to `fragments`, proves the fragment polynomial and
	/// commits to the roots polynomial.
	#[instrument(skip_all, level = "debug", fields(fragments = fragments.len()))]
	pub fn create(
		fragments: &[Fragment],
		rng: &mut (impl RngCore + CryptoRng),
	) -> Result<Self, Error> {
		let values = fragment_values(fragments);
		if values.is_empty() {
			return Err(Error::EmptyInput);
		}
		// The roots polynomial has one more coefficient than there are fragments.
		let srs = Srs::generate(values.len(), rng);
		let (digest, point, proof) = prove(&values, srs.proving_key())?;
		let roots = vanishing_polynomial(&fragment_roots(fragments));
		let roots_digest = commit(&roots, srs.proving_key())?;
		Ok(Self {
			srs,
			digest,
			point,
			proof,
			roots_digest,
		})
	}

	/// Checks the published proof against its own digest.
	pub fn verify(&self) -> Result<(), VerificationError> {
		verify(&self.digest, &self.proof, self.point, &self.srs.verifying_key())
	}

	/// Recommits to `fragments` and checks both digests match the published ones, then verifies
	/// the published opening.
	#[instrument(skip_all, level = "debug", fields(fragments = fragments.len()))]
	pub fn verify_fragment_set(&self, fragments: &[Fragment]) -> Result<(), Error> {
		let values = fragment_values(fragments);
		let digest = commit(&values, self.srs.proving_key())?;
		if digest != self.digest {
			return Err(VerificationError::DigestMismatch.into());
		}
		self.roots_polynomial(fragments)?;
		Ok(self.verify()?)
	}

	/// Proves that fragment `id` of the committed set belongs to it.
	///
	/// `fragments` must be the whole committed set.
	pub fn prove_fragment(&self, fragments: &[Fragment], id: u64) -> Result<FragmentProof, Error> {
		let fragment = fragments
			.iter()
			.find(|fragment| fragment.id == id)
			.ok_or(Error::UnknownFragment { id })?;
		let roots = self.roots_polynomial(fragments)?;
		self.open_root(&roots, fragment)
	}

	/// Proofs for every fragment of the committed set, ordered by id.
	#[instrument(skip_all, level = "debug", fields(fragments = fragments.len()))]
	pub fn prove_fragments(&self, fragments: &[Fragment]) -> Result<Vec<FragmentProof>, Error> {
		let roots = self.roots_polynomial(fragments)?;
		unique_by_id(fragments)
			.into_par_iter()
			.map(|fragment| self.open_root(&roots, fragment))
			.collect()
	}

	/// Checks a single fragment against the roots digest, without the rest of the set.
	pub fn verify_fragment(
		&self,
		fragment: &Fragment,
		proof: &FragmentProof,
	) -> Result<(), VerificationError> {
		if proof.id != fragment.id {
			return Err(VerificationError::FragmentIdMismatch {
				proof: proof.id,
				fragment: fragment.id,
			});
		}
		let opening = OpeningProof {
			quotient: proof.quotient,
			claimed_value: Fr::zero(),
		};
		verify_opening(
			&self.roots_digest,
			&opening,
			fragment_root(fragment),
			&self.srs.verifying_key(),
		)
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let mut bytes = Vec::with_capacity(self.compressed_size());
		self.serialize_compressed(&mut bytes)
			.expect("serializing into a Vec<u8> cannot fail");
		bytes
	}

	/// Parses and validates material, including the shape of the reference string.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
		Ok(Self::deserialize_compressed(bytes)?)
	}

	/// Coefficients of the roots polynomial of `fragments`, provided it is the committed one.
	fn roots_polynomial(&self, fragments: &[Fragment]) -> Result<Vec<Fr>, Error> {
		let roots = vanishing_polynomial(&fragment_roots(fragments));
		if commit(&roots, self.srs.proving_key())? != self.roots_digest {
			return Err(VerificationError::DigestMismatch.into());
		}
		Ok(roots)
	}

	fn open_root(&self, roots: &[Fr], fragment: &Fragment) -> Result<FragmentProof, Error> {
		let opening = open(roots, fragment_root(fragment), self.srs.proving_key())?;
		debug_assert!(opening.claimed_value.is_zero());
		Ok(FragmentProof {
			id: fragment.id,
			quotient: opening.quotient,
		})
	}
}
