// Copyright 2024-2025 Irreducible Inc.

use std::fmt::Write as _;

use auto_impl::auto_impl;
use bytes::BufMut;
use dashmap::{mapref::entry::Entry, DashMap};
use droplet_utils::serialization::{
	self, deserialize_byte_vec, serialize_byte_slice, DeserializeBytes, SerializeBytes,
};

use super::error::Error;
use crate::{commitment::CommitmentMaterial, fountain::CodecParameters};

/// The single immutable record of a message instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRecord {
	pub params: CodecParameters,
	pub commitment: Option<CommitmentMaterial>,
}

impl ParameterRecord {
	/// Hex fingerprint of the codec parameters, the key the record is published under.
	pub fn instance_id(&self) -> String {
		instance_id(&self.params)
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let mut buf = Vec::new();
		self.serialize(&mut buf)
			.expect("Vec<u8> write buffer grows as needed");
		buf
	}

	/// Parses a record, re-validating the parameters and the commitment encoding.
	pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, Error> {
		let params = CodecParameters::from_bytes(&mut bytes)?;
		let commitment = match u8::deserialize(&mut bytes)? {
			0 => None,
			1 => {
				let encoded = deserialize_byte_vec(&mut bytes)?;
				Some(CommitmentMaterial::from_bytes(&encoded)?)
			}
			index => {
				return Err(serialization::Error::UnknownEnumVariant {
					name: "ParameterRecord::commitment",
					index,
				}
				.into())
			}
		};
		if !bytes.is_empty() {
			return Err(serialization::Error::TrailingBytes {
				remaining: bytes.len(),
			}
			.into());
		}
		Ok(Self { params, commitment })
	}
}

impl SerializeBytes for ParameterRecord {
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), serialization::Error> {
		self.params.serialize(&mut write_buf)?;
		match &self.commitment {
			None => 0u8.serialize(write_buf),
			Some(material) => {
				1u8.serialize(&mut write_buf)?;
				serialize_byte_slice(&material.to_bytes(), write_buf)
			}
		}
	}
}

pub fn instance_id(params: &CodecParameters) -> String {
	params
		.fingerprint()
		.iter()
		.fold(String::with_capacity(64), |mut hex, byte| {
			let _ = write!(hex, "{byte:02x}");
			hex
		})
}

/// Write-once storage of parameter records keyed by instance id.
#[auto_impl(&, Box, Arc)]
pub trait ParameterStore: Send + Sync {
	/// Publishes `record` under its instance id.
	///
	/// Publishing a byte-identical record again succeeds without effect; publishing a different
	/// record under an existing id fails with [`Error::RecordExists`].
	fn publish(&self, record: &ParameterRecord) -> Result<(), Error>;

	fn load(&self, instance: &str) -> Result<ParameterRecord, Error>;
}

/// Keeps records in their serialized form, so `load` exercises the same parsing a remote
/// store would.
#[derive(Debug, Default)]
pub struct MemoryParameterStore {
	records: DashMap<String, Vec<u8>>,
}

impl MemoryParameterStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl ParameterStore for MemoryParameterStore {
	fn publish(&self, record: &ParameterRecord) -> Result<(), Error> {
		let instance = record.instance_id();
		let bytes = record.to_bytes();
		match self.records.entry(instance.clone()) {
			Entry::Occupied(existing) if *existing.get() == bytes => Ok(()),
			Entry::Occupied(_) => Err(Error::RecordExists { instance }),
			Entry::Vacant(entry) => {
				entry.insert(bytes);
				Ok(())
			}
		}
	}

	fn load(&self, instance: &str) -> Result<ParameterRecord, Error> {
		let bytes = self
			.records
			.get(instance)
			.map(|record| record.value().clone())
			.ok_or_else(|| Error::RecordNotFound {
				instance: instance.to_owned(),
			})?;
		ParameterRecord::from_bytes(&bytes)
	}
}
