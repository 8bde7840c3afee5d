// Copyright 2024-2025 Irreducible Inc.

use ark_bn254::{Bn254, Fr, G1Affine, G1Projective, G2Projective};
use ark_ec::{pairing::Pairing, CurveGroup, VariableBaseMSM};
use ark_ff::{One, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use droplet_utils::{bail, ensure};
use tracing::instrument;

use super::{
	error::{Error, VerificationError},
	setup::{ProvingKey, VerifyingKey},
};
use crate::transcript::Transcript;

pub const DIGEST_LABEL: &str = "commitment_digest";
pub const POINT_LABEL: &str = "evaluation_point";

/// A KZG commitment, the digest of a polynomial given by its coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Commitment(pub G1Affine);

impl Commitment {
	/// Compressed encoding, the bytes bound into the transcript.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut bytes = Vec::with_capacity(self.compressed_size());
		self.serialize_compressed(&mut bytes)
			.expect("serializing into a Vec<u8> cannot fail");
		bytes
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct OpeningProof {
	/// Commitment to `q(X) = (p(X) - p(z)) / (X - z)`.
	pub quotient: G1Affine,
	/// `p(z)`.
	pub claimed_value: Fr,
}

/// Commits to the polynomial whose `i`-th coefficient is `values[i]`.
pub fn commit(values: &[Fr], pk: ProvingKey) -> Result<Commitment, Error> {
	ensure!(!values.is_empty(), Error::EmptyInput);
	ensure!(
		values.len() <= pk.capacity(),
		Error::DegreeTooLarge {
			len: values.len(),
			max: pk.capacity(),
		}
	);
	Ok(Commitment(msm(&pk.powers[..values.len()], values).into_affine()))
}

/// The point a commitment must be opened at, derived from the digest alone.
pub fn evaluation_point(commitment: &Commitment) -> Fr {
	let mut transcript: Transcript = Transcript::new();
	transcript.bind(DIGEST_LABEL, &commitment.to_bytes());
	let challenge = transcript.challenge(POINT_LABEL);
	Fr::from_be_bytes_mod_order(&challenge)
}

/// Proves the value of the committed polynomial at `point`.
pub fn open(values: &[Fr], point: Fr, pk: ProvingKey) -> Result<OpeningProof, Error> {
	ensure!(!values.is_empty(), Error::EmptyInput);
	ensure!(
		values.len() <= pk.capacity(),
		Error::DegreeTooLarge {
			len: values.len(),
			max: pk.capacity(),
		}
	);

	let (quotient, claimed_value) = divide_by_linear(values, point);
	let quotient = if quotient.is_empty() {
		G1Projective::zero()
	} else {
		msm(&pk.powers[..quotient.len()], &quotient)
	};

	Ok(OpeningProof {
		quotient: quotient.into_affine(),
		claimed_value,
	})
}

/// Commits, derives the evaluation point and opens there.
#[instrument(skip_all, level = "debug", fields(len = values.len()))]
pub fn prove(values: &[Fr], pk: ProvingKey) -> Result<(Commitment, Fr, OpeningProof), Error> {
	let commitment = commit(values, pk)?;
	let point = evaluation_point(&commitment);
	let proof = open(values, point, pk)?;
	Ok((commitment, point, proof))
}

/// Checks that `point` is the challenge bound to `commitment`, then the pairing equation
/// `e(C - y·G1, G2) == e(π, τ·G2 - z·G2)`.
#[instrument(skip_all, level = "debug")]
pub fn verify(
	commitment: &Commitment,
	proof: &OpeningProof,
	point: Fr,
	vk: &VerifyingKey,
) -> Result<(), VerificationError> {
	if evaluation_point(commitment) != point {
		bail!(VerificationError::ChallengeMismatch);
	}
	verify_opening(commitment, proof, point, vk)
}

/// The pairing check alone, for openings at a point the verifier picked itself.
pub fn verify_opening(
	commitment: &Commitment,
	proof: &OpeningProof,
	point: Fr,
	vk: &VerifyingKey,
) -> Result<(), VerificationError> {
	let lhs = G1Projective::from(commitment.0) - vk.g1 * proof.claimed_value;
	let rhs = G2Projective::from(vk.tau_g2) - vk.g2 * point;
	if Bn254::pairing(lhs, vk.g2) != Bn254::pairing(proof.quotient, rhs) {
		bail!(VerificationError::PairingCheckFailed);
	}
	Ok(())
}

fn msm(bases: &[G1Affine], scalars: &[Fr]) -> G1Projective {
	G1Projective::msm(bases, scalars).expect("bases and scalars have equal length")
}

/// Coefficients of `∏ (X - r)` over `roots`, lowest degree first.
pub fn vanishing_polynomial(roots: &[Fr]) -> Vec<Fr> {
	let mut coeffs = Vec::with_capacity(roots.len() + 1);
	coeffs.push(Fr::one());
	for &root in roots {
		coeffs.push(Fr::zero());
		for i in (1..coeffs.len()).rev() {
			coeffs[i] = coeffs[i - 1] - root * coeffs[i];
		}
		coeffs[0] *= -root;
	}
	coeffs
}

/// Synthetic division of `p` by `X - z`, returning the quotient coefficients and `p(z)`.
fn divide_by_linear(coeffs: &[Fr], z: Fr) -> (Vec<Fr>, Fr) {
	let mut quotient = vec![Fr::zero(); coeffs.len().saturating_sub(1)];
	let mut acc = Fr::zero();
	for i in (0..coeffs.len()).rev() {
		acc = acc * z + coeffs[i];
		if i > 0 {
			quotient[i - 1] = acc;
		}
	}
	(quotient, acc)
}
