// Copyright 2024-2025 Irreducible Inc.

//! Fixed little-endian byte encoding for the plain records exchanged between workers.
//!
//! Integers are written little-endian, `usize` always as 8 bytes, `f64` as its IEEE-754 bit
//! pattern so that every party reads back the identical value. Variable-length sequences carry
//! a `u64` length prefix.

use bytes::{Buf, BufMut};

#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
	#[error("Write buffer is full")]
	WriteBufferFull,
	#[error("Not enough data in read buffer to deserialize")]
	NotEnoughBytes,
	#[error("Length prefix {len} exceeds the {remaining} bytes left in the buffer")]
	LengthOutOfBounds { len: u64, remaining: usize },
	#[error("Value {value} does not fit into the target integer type")]
	IntegerOverflow { value: u64 },
	#[error("{remaining} unexpected bytes after the end of the record")]
	TrailingBytes { remaining: usize },
	#[error("Unknown enum variant index {name}::{index}")]
	UnknownEnumVariant { name: &'static str, index: u8 },
}

/// Represents type that can be serialized to a byte buffer.
pub trait SerializeBytes {
	fn serialize(&self, write_buf: impl BufMut) -> Result<(), Error>;
}

/// Represents type that can be deserialized from a byte buffer.
pub trait DeserializeBytes {
	fn deserialize(read_buf: impl Buf) -> Result<Self, Error>
	where
		Self: Sized;
}

fn ensure_writable(write_buf: &impl BufMut, n: usize) -> Result<(), Error> {
	if write_buf.remaining_mut() < n {
		return Err(Error::WriteBufferFull);
	}
	Ok(())
}

fn ensure_readable(read_buf: &impl Buf, n: usize) -> Result<(), Error> {
	if read_buf.remaining() < n {
		return Err(Error::NotEnoughBytes);
	}
	Ok(())
}

impl SerializeBytes for u8 {
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), Error> {
		ensure_writable(&write_buf, 1)?;
		write_buf.put_u8(*self);
		Ok(())
	}
}

impl DeserializeBytes for u8 {
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, Error> {
		ensure_readable(&read_buf, 1)?;
		Ok(read_buf.get_u8())
	}
}

impl SerializeBytes for u64 {
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), Error> {
		ensure_writable(&write_buf, 8)?;
		write_buf.put_u64_le(*self);
		Ok(())
	}
}

impl DeserializeBytes for u64 {
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, Error> {
		ensure_readable(&read_buf, 8)?;
		Ok(read_buf.get_u64_le())
	}
}

impl SerializeBytes for usize {
	fn serialize(&self, write_buf: impl BufMut) -> Result<(), Error> {
		(*self as u64).serialize(write_buf)
	}
}

impl DeserializeBytes for usize {
	fn deserialize(read_buf: impl Buf) -> Result<Self, Error> {
		let value = u64::deserialize(read_buf)?;
		usize::try_from(value).map_err(|_| Error::IntegerOverflow { value })
	}
}

impl SerializeBytes for f64 {
	fn serialize(&self, write_buf: impl BufMut) -> Result<(), Error> {
		self.to_bits().serialize(write_buf)
	}
}

impl DeserializeBytes for f64 {
	fn deserialize(read_buf: impl Buf) -> Result<Self, Error> {
		u64::deserialize(read_buf).map(f64::from_bits)
	}
}

impl<const N: usize> SerializeBytes for [u8; N] {
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), Error> {
		ensure_writable(&write_buf, N)?;
		write_buf.put_slice(self);
		Ok(())
	}
}

impl<const N: usize> DeserializeBytes for [u8; N] {
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, Error> {
		ensure_readable(&read_buf, N)?;
		let mut ret = [0u8; N];
		read_buf.copy_to_slice(&mut ret);
		Ok(ret)
	}
}

/// Writes a `u64` length prefix followed by the raw bytes.
pub fn serialize_byte_slice(bytes: &[u8], mut write_buf: impl BufMut) -> Result<(), Error> {
	bytes.len().serialize(&mut write_buf)?;
	ensure_writable(&write_buf, bytes.len())?;
	write_buf.put_slice(bytes);
	Ok(())
}

/// Reads a byte string written by [`serialize_byte_slice`].
pub fn deserialize_byte_vec(mut read_buf: impl Buf) -> Result<Vec<u8>, Error> {
	let len = u64::deserialize(&mut read_buf)?;
	if len > read_buf.remaining() as u64 {
		return Err(Error::LengthOutOfBounds {
			len,
			remaining: read_buf.remaining(),
		});
	}
	let mut ret = vec![0u8; len as usize];
	read_buf.copy_to_slice(&mut ret);
	Ok(ret)
}

impl<T: SerializeBytes> SerializeBytes for Vec<T> {
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), Error> {
		self.len().serialize(&mut write_buf)?;
		for item in self {
			item.serialize(&mut write_buf)?;
		}
		Ok(())
	}
}

impl<T: DeserializeBytes> DeserializeBytes for Vec<T> {
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, Error> {
		let len = u64::deserialize(&mut read_buf)?;
		// Every element occupies at least one byte, which bounds the allocation below.
		if len > read_buf.remaining() as u64 {
			return Err(Error::LengthOutOfBounds {
				len,
				remaining: read_buf.remaining(),
			});
		}
		(0..len).map(|_| T::deserialize(&mut read_buf)).collect()
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;
	use rand::{rngs::StdRng, RngCore, SeedableRng};

	use super::*;

	#[test]
	fn test_fixed_array_serialize_deserialize() {
		let mut rng = StdRng::seed_from_u64(0);

		let mut data = [0u8; 32];
		rng.fill_bytes(&mut data);

		let mut buf = Vec::new();
		data.serialize(&mut buf).unwrap();

		let data_deserialized = <[u8; 32]>::deserialize(&mut buf.as_slice()).unwrap();
		assert_eq!(data_deserialized, data);
	}

	#[test]
	fn test_f64_keeps_bit_pattern() {
		let value = 1.0f64 / 3.0;
		let mut buf = Vec::new();
		value.serialize(&mut buf).unwrap();
		assert_eq!(buf, value.to_bits().to_le_bytes());
		assert_eq!(f64::deserialize(buf.as_slice()).unwrap().to_bits(), value.to_bits());
	}

	#[test]
	fn test_truncated_input_is_rejected() {
		let mut buf = Vec::new();
		vec![1u64, 2, 3].serialize(&mut buf).unwrap();
		buf.truncate(buf.len() - 1);
		assert_eq!(Vec::<u64>::deserialize(buf.as_slice()), Err(Error::NotEnoughBytes));
	}

	#[test]
	fn test_oversized_length_prefix_is_rejected() {
		let mut buf = Vec::new();
		u64::MAX.serialize(&mut buf).unwrap();
		buf.extend_from_slice(&[0u8; 4]);
		assert_eq!(
			deserialize_byte_vec(buf.as_slice()),
			Err(Error::LengthOutOfBounds {
				len: u64::MAX,
				remaining: 4
			})
		);
	}

	#[test]
	fn test_write_buffer_full() {
		let mut storage = [0u8; 4];
		let write_buf = &mut storage[..];
		assert_eq!(7u64.serialize(write_buf), Err(Error::WriteBufferFull));
	}

	proptest! {
		#[test]
		fn test_byte_slice_prefix(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
			let mut buf = Vec::new();
			serialize_byte_slice(&bytes, &mut buf).unwrap();
			prop_assert_eq!(buf.len(), bytes.len() + 8);
			prop_assert_eq!(deserialize_byte_vec(buf.as_slice()).unwrap(), bytes);
		}
	}
}
