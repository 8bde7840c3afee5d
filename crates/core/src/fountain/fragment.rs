// Copyright 2024-2025 Irreducible Inc.

use bytes::{Buf, BufMut};
use droplet_utils::serialization::{
	self, deserialize_byte_vec, serialize_byte_slice, DeserializeBytes, SerializeBytes,
};

/// An encoded unit, the XOR of a pseudorandom subset of source blocks.
///
/// Only the id travels with the payload; the degree and indices are re-derived from the codec
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fragment {
	pub id: u64,
	pub payload: Vec<u8>,
}

impl Fragment {
	pub fn new(id: u64, payload: Vec<u8>) -> Self {
		Self { id, payload }
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let mut buf = Vec::with_capacity(16 + self.payload.len());
		self.serialize(&mut buf)
			.expect("Vec<u8> write buffer grows as needed");
		buf
	}

	/// Parses exactly one fragment, rejecting trailing bytes.
	pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, serialization::Error> {
		let fragment = Self::deserialize(&mut bytes)?;
		if !bytes.is_empty() {
			return Err(serialization::Error::TrailingBytes {
				remaining: bytes.len(),
			});
		}
		Ok(fragment)
	}
}

impl SerializeBytes for Fragment {
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), serialization::Error> {
		self.id.serialize(&mut write_buf)?;
		serialize_byte_slice(&self.payload, write_buf)
	}
}

impl DeserializeBytes for Fragment {
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, serialization::Error> {
		let id = u64::deserialize(&mut read_buf)?;
		let payload = deserialize_byte_vec(read_buf)?;
		Ok(Self { id, payload })
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;

	use super::*;

	#[test]
	fn test_wire_layout() {
		let fragment = Fragment::new(0x0102, vec![0xaa, 0xbb]);
		let bytes = fragment.to_bytes();
		assert_eq!(
			bytes,
			[
				0x02, 0x01, 0, 0, 0, 0, 0, 0, // id
				2, 0, 0, 0, 0, 0, 0, 0, // payload length
				0xaa, 0xbb,
			]
		);
		assert_eq!(Fragment::from_bytes(&bytes).unwrap(), fragment);
	}

	#[test]
	fn test_malformed_bytes() {
		let bytes = Fragment::new(5, vec![1, 2, 3]).to_bytes();

		assert_matches!(
			Fragment::from_bytes(&bytes[..bytes.len() - 1]),
			Err(serialization::Error::LengthOutOfBounds { len: 3, remaining: 2 })
		);
		assert_matches!(Fragment::from_bytes(&bytes[..4]), Err(serialization::Error::NotEnoughBytes));

		let mut padded = bytes.clone();
		padded.push(0);
		assert_matches!(
			Fragment::from_bytes(&padded),
			Err(serialization::Error::TrailingBytes { remaining: 1 })
		);
	}
}
