// Copyright 2024-2025 Irreducible Inc.

use std::borrow::Borrow;

use bytes::{buf::UninitSlice, BufMut};
use digest::{Digest, Output};
use droplet_utils::serialization::SerializeBytes;

const STAGING_LEN: usize = 128;

/// Adapter that wraps a [`Digest`] reference and exposes the [`BufMut`] interface.
///
/// Bytes are staged in a small fixed buffer and forwarded to the hasher whenever it fills up,
/// so that records implementing [`SerializeBytes`] can be hashed without materialising their
/// full encoding. The staged tail is flushed on drop.
#[derive(Debug)]
pub struct HashBuffer<'a, D: Digest> {
	digest: &'a mut D,
	staging: [u8; STAGING_LEN],
	/// Invariant: `filled < STAGING_LEN` between calls.
	filled: usize,
}

impl<'a, D: Digest> HashBuffer<'a, D> {
	pub fn new(digest: &'a mut D) -> Self {
		Self {
			digest,
			staging: [0u8; STAGING_LEN],
			filled: 0,
		}
	}

	fn flush(&mut self) {
		if self.filled > 0 {
			self.digest.update(&self.staging[..self.filled]);
			self.filled = 0;
		}
	}
}

unsafe impl<D: Digest> BufMut for HashBuffer<'_, D> {
	fn remaining_mut(&self) -> usize {
		usize::MAX
	}

	unsafe fn advance_mut(&mut self, cnt: usize) {
		assert!(cnt <= STAGING_LEN - self.filled);
		self.filled += cnt;
		if self.filled == STAGING_LEN {
			self.flush();
		}
	}

	fn chunk_mut(&mut self) -> &mut UninitSlice {
		(&mut self.staging[self.filled..]).into()
	}

	fn put_slice(&mut self, src: &[u8]) {
		// Large writes bypass the staging buffer once it has been drained.
		if src.len() >= STAGING_LEN - self.filled {
			self.flush();
			self.digest.update(src);
		} else {
			self.staging[self.filled..self.filled + src.len()].copy_from_slice(src);
			self.filled += src.len();
		}
	}
}

impl<D: Digest> Drop for HashBuffer<'_, D> {
	fn drop(&mut self) {
		self.flush()
	}
}

/// Hashes a sequence of serializable items.
pub fn hash_serialize<T, D>(items: impl IntoIterator<Item = impl Borrow<T>>) -> Output<D>
where
	T: SerializeBytes,
	D: Digest,
{
	let mut hasher = D::new();
	{
		let mut buffer = HashBuffer::new(&mut hasher);
		for item in items {
			item.borrow()
				.serialize(&mut buffer)
				.expect("HashBuffer has infinite capacity");
		}
	}
	hasher.finalize()
}

#[cfg(test)]
mod tests {
	use sha2::Sha256;

	use super::*;

	#[test]
	fn test_hash_buffer_updates() {
		let message = b"fountain codes let any large enough subset of droplets refill the bucket, \
			regardless of which droplets happened to arrive first";
		assert!(message.len() > STAGING_LEN);

		let expected_digest = Sha256::digest(message);

		let mut hasher = Sha256::new();
		{
			let mut buffer = HashBuffer::new(&mut hasher);
			for byte_chunk in message.chunks(7) {
				buffer.put_slice(byte_chunk);
			}
		}
		assert_eq!(hasher.finalize(), expected_digest);
	}

	#[test]
	fn test_hash_serialize_matches_encoding() {
		let values = [3u64, 1 << 40, u64::MAX];
		let mut encoded = Vec::new();
		for value in &values {
			value.serialize(&mut encoded).unwrap();
		}
		assert_eq!(hash_serialize::<u64, Sha256>(values), Sha256::digest(&encoded));
	}
}
