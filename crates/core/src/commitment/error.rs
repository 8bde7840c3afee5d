// Copyright 2024-2025 Irreducible Inc.

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("cannot commit to an empty value vector")]
	EmptyInput,
	#[error("{len} values exceed the {max} coefficients supported by the reference string")]
	DegreeTooLarge { len: usize, max: usize },
	#[error("fragment {id} is not part of the given set")]
	UnknownFragment { id: u64 },
	#[error("verification failure: {0}")]
	Verification(#[from] VerificationError),
	#[error("serialization error: {0}")]
	Serialization(#[from] ark_serialize::SerializationError),
}

/// A proof or fragment set that does not match its commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
	#[error("the evaluation point does not match the challenge derived from the digest")]
	ChallengeMismatch,
	#[error("the pairing check failed")]
	PairingCheckFailed,
	#[error("the fragment set commits to a different digest")]
	DigestMismatch,
	#[error("the proof is for fragment {proof}, not fragment {fragment}")]
	FragmentIdMismatch { proof: u64, fragment: u64 },
}
