// Copyright 2024-2025 Irreducible Inc.

use digest::Digest;
use sha2::Sha256;

/// Length in bytes of a SHA-256 digest.
pub const SHA256_DIGEST_LEN: usize = 32;

/// SHA-256 of a fragment payload, as a plain array.
///
/// This is the per-fragment value the commitment layer maps into the scalar field.
pub fn payload_digest(payload: &[u8]) -> [u8; SHA256_DIGEST_LEN] {
	Sha256::digest(payload).into()
}

/// SHA-256 over the concatenation of `parts`, without any framing between them.
pub fn sha256_concat<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> [u8; SHA256_DIGEST_LEN] {
	parts
		.into_iter()
		.fold(Sha256::new(), |hasher, part| hasher.chain_update(part))
		.finalize()
		.into()
}
