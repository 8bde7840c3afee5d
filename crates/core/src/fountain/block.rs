// Copyright 2024-2025 Irreducible Inc.

use droplet_utils::ensure;

use super::{error::ConfigError, params::CodecParameters};

/// XORs `src` into `dst` byte by byte.
///
/// ## Preconditions
///
/// * `dst` and `src` must have the same length.
pub fn xor_into(dst: &mut [u8], src: &[u8]) {
	assert_eq!(dst.len(), src.len(), "XOR operands must have the same length");
	for (d, s) in dst.iter_mut().zip(src) {
		*d ^= s;
	}
}

/// The message cut into `k` blocks of `block_size` bytes, the last one zero-padded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBlocks {
	block_size: usize,
	data: Vec<u8>,
}

impl SourceBlocks {
	pub fn split(params: &CodecParameters, message: &[u8]) -> Result<Self, ConfigError> {
		ensure!(
			message.len() == params.message_size(),
			ConfigError::MessageLengthMismatch {
				expected: params.message_size(),
				actual: message.len(),
			}
		);

		let mut data = vec![0u8; params.block_size() * params.source_block_count()];
		data[..message.len()].copy_from_slice(message);

		Ok(Self {
			block_size: params.block_size(),
			data,
		})
	}

	pub fn len(&self) -> usize {
		self.data.len() / self.block_size
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn block_size(&self) -> usize {
		self.block_size
	}

	pub fn block(&self, index: usize) -> &[u8] {
		&self.data[index * self.block_size..(index + 1) * self.block_size]
	}

	pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
		self.data.chunks_exact(self.block_size)
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;

	use super::*;

	#[test]
	fn test_split_pads_last_block() {
		let params = CodecParameters::ideal(3, 6, 0, 7).unwrap();
		let blocks = SourceBlocks::split(&params, b"abcdefg").unwrap();
		assert_eq!(blocks.len(), 3);
		assert_eq!(blocks.block(0), b"abc");
		assert_eq!(blocks.block(1), b"def");
		assert_eq!(blocks.block(2), b"g\0\0");
		assert_eq!(blocks.iter().count(), 3);
	}

	#[test]
	fn test_split_rejects_wrong_length() {
		let params = CodecParameters::ideal(3, 6, 0, 7).unwrap();
		assert_matches!(
			SourceBlocks::split(&params, b"abcdef"),
			Err(ConfigError::MessageLengthMismatch {
				expected: 7,
				actual: 6
			})
		);
	}

	#[test]
	fn test_xor_into_is_involutive() {
		let mut dst = *b"hello";
		xor_into(&mut dst, b"world");
		assert_ne!(&dst, b"hello");
		xor_into(&mut dst, b"world");
		assert_eq!(&dst, b"hello");
	}
}
