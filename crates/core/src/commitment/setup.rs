// Copyright 2024-2025 Irreducible Inc.

use ark_bn254::{Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::{CurveGroup, Group};
use ark_ff::One;
use ark_serialize::{
	CanonicalDeserialize, CanonicalSerialize, Compress, Read, SerializationError, Valid, Validate,
};
use ark_std::UniformRand;
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use tracing::instrument;
use zeroize::Zeroize;

/// Structured reference string: `τ^i·G1` and `τ^i·G2` for `i = 0..=max_degree`.
///
/// The secret `τ` exists only inside [`Srs::from_secret`]. A deserialized string is checked to
/// hold at least `τ^0` and `τ^1` in both groups, with as many G2 powers as G1 powers.
#[derive(Debug, Clone, PartialEq, Eq, CanonicalSerialize)]
pub struct Srs {
	g1_powers: Vec<G1Affine>,
	g2_powers: Vec<G2Affine>,
}

/// The G1 powers a prover needs to commit and open.
#[derive(Debug, Clone, Copy)]
pub struct ProvingKey<'a> {
	pub powers: &'a [G1Affine],
}

impl ProvingKey<'_> {
	/// Largest number of coefficients this key can commit to.
	pub fn capacity(&self) -> usize {
		self.powers.len()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyingKey {
	pub g1: G1Affine,
	pub g2: G2Affine,
	pub tau_g2: G2Affine,
}

impl Srs {
	/// Runs a trusted setup with a secret drawn from `rng`.
	pub fn generate(max_degree: usize, rng: &mut (impl RngCore + CryptoRng)) -> Self {
		let secret = Fr::rand(rng);
		Self::from_secret(max_degree, secret)
	}

	/// Derives the powers of `secret` in both groups, then wipes the secret and every scalar
	/// power derived from it.
	#[instrument(skip_all, level = "debug", fields(max_degree = max_degree))]
	pub fn from_secret(max_degree: usize, mut secret: Fr) -> Self {
		// Verification always needs τ·G2.
		let max_degree = max_degree.max(1);

		let mut scalars = Vec::with_capacity(max_degree + 1);
		let mut power = Fr::one();
		for _ in 0..=max_degree {
			scalars.push(power);
			power *= secret;
		}
		power.zeroize();
		secret.zeroize();

		let g1 = G1Projective::generator();
		let g2 = G2Projective::generator();
		let g1_powers = scalars.par_iter().map(|s| g1 * s).collect::<Vec<_>>();
		let g2_powers = scalars.par_iter().map(|s| g2 * s).collect::<Vec<_>>();
		scalars.zeroize();

		Self {
			g1_powers: G1Projective::normalize_batch(&g1_powers),
			g2_powers: G2Projective::normalize_batch(&g2_powers),
		}
	}

	pub fn max_degree(&self) -> usize {
		self.g1_powers.len() - 1
	}

	pub fn proving_key(&self) -> ProvingKey<'_> {
		ProvingKey {
			powers: &self.g1_powers,
		}
	}

	pub fn verifying_key(&self) -> VerifyingKey {
		VerifyingKey {
			g1: self.g1_powers[0],
			g2: self.g2_powers[0],
			tau_g2: self.g2_powers[1],
		}
	}

	pub fn g2_powers(&self) -> &[G2Affine] {
		&self.g2_powers
	}
}

impl Valid for Srs {
	fn check(&self) -> Result<(), SerializationError> {
		if self.g1_powers.len() < 2 || self.g1_powers.len() != self.g2_powers.len() {
			return Err(SerializationError::InvalidData);
		}
		self.g1_powers.check()?;
		self.g2_powers.check()
	}
}

impl CanonicalDeserialize for Srs {
	fn deserialize_with_mode<R: Read>(
		mut reader: R,
		compress: Compress,
		validate: Validate,
	) -> Result<Self, SerializationError> {
		let g1_powers = Vec::<G1Affine>::deserialize_with_mode(&mut reader, compress, validate)?;
		let g2_powers = Vec::<G2Affine>::deserialize_with_mode(&mut reader, compress, validate)?;
		let srs = Self {
			g1_powers,
			g2_powers,
		};
		// Key views index the first two powers.
		if srs.g1_powers.len() < 2 || srs.g1_powers.len() != srs.g2_powers.len() {
			return Err(SerializationError::InvalidData);
		}
		if let Validate::Yes = validate {
			srs.check()?;
		}
		Ok(srs)
	}
}

#[cfg(test)]
mod tests {
	use ark_bn254::Bn254;
	use ark_ec::{pairing::Pairing, AffineRepr};
	use assert_matches::assert_matches;
	use rand::{rngs::StdRng, SeedableRng};

	use super::*;

	#[test]
	fn test_powers_are_consistent_across_groups() {
		let srs = Srs::from_secret(4, Fr::from(7u64));
		assert_eq!(srs.max_degree(), 4);
		assert_eq!(srs.g2_powers().len(), 5);
		assert_eq!(srs.proving_key().powers[0], G1Affine::generator());
		assert_eq!(srs.proving_key().powers[2], (G1Projective::generator() * Fr::from(49u64)).into_affine());

		let vk = srs.verifying_key();
		for i in 1..=srs.max_degree() {
			// e(τ^i G1, G2) == e(τ^(i-1) G1, τ G2)
			assert_eq!(
				Bn254::pairing(srs.proving_key().powers[i], vk.g2),
				Bn254::pairing(srs.proving_key().powers[i - 1], vk.tau_g2)
			);
		}
	}

	#[test]
	fn test_fresh_secrets_differ() {
		let mut rng = StdRng::seed_from_u64(0);
		let a = Srs::generate(2, &mut rng);
		let b = Srs::generate(2, &mut rng);
		assert_ne!(a.verifying_key().tau_g2, b.verifying_key().tau_g2);
	}

	#[test]
	fn test_serialization_reads_back() {
		let srs = Srs::generate(3, &mut StdRng::seed_from_u64(1));
		let mut bytes = Vec::new();
		srs.serialize_compressed(&mut bytes).unwrap();
		assert_eq!(Srs::deserialize_compressed(bytes.as_slice()).unwrap(), srs);
	}

	#[test]
	fn test_malformed_shapes_are_rejected() {
		let srs = Srs::generate(3, &mut StdRng::seed_from_u64(2));
		let shapes = [
			(vec![], vec![]),
			(srs.g1_powers[..1].to_vec(), srs.g2_powers[..1].to_vec()),
			(srs.g1_powers.clone(), srs.g2_powers[..2].to_vec()),
		];
		for (g1_powers, g2_powers) in shapes {
			let mut bytes = Vec::new();
			g1_powers.serialize_compressed(&mut bytes).unwrap();
			g2_powers.serialize_compressed(&mut bytes).unwrap();
			assert_matches!(
				Srs::deserialize_compressed(bytes.as_slice()),
				Err(SerializationError::InvalidData)
			);
			assert_matches!(
				Srs::deserialize_compressed_unchecked(bytes.as_slice()),
				Err(SerializationError::InvalidData)
			);
		}
	}
}
