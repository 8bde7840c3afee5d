// Copyright 2024-2025 Irreducible Inc.

use bytes::{Buf, BufMut};
use droplet_hash::hash_serialize;
use droplet_utils::{
	ensure,
	serialization::{self, DeserializeBytes, SerializeBytes},
};
use getset::{CopyGetters, Getters};
use sha2::Sha256;

use super::{
	degree::{ideal_soliton_cdf, sample_degree, validate_cdf},
	error::{ConfigError, Error},
	rng::FragmentRng,
};

/// The published, immutable description of one message instance.
///
/// Every generator and decoder of the instance reads the same record, and every fragment's
/// degree and source indices are a pure function of `(global_seed, degree_cdf, id)`.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct CodecParameters {
	#[get = "pub"]
	degree_cdf: Vec<f64>,
	#[get_copy = "pub"]
	global_seed: u64,
	#[get_copy = "pub"]
	source_block_count: usize,
	#[get_copy = "pub"]
	fragment_count: usize,
	#[get_copy = "pub"]
	message_size: usize,
	/// `ceil(message_size / source_block_count)`.
	#[get_copy = "pub"]
	block_size: usize,
}

/// The source blocks XORed into a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
	pub degree: usize,
	/// Distinct source block indices in ascending order; `indices.len() == degree`.
	pub indices: Vec<usize>,
}

impl CodecParameters {
	pub fn new(
		degree_cdf: Vec<f64>,
		global_seed: u64,
		source_block_count: usize,
		fragment_count: usize,
		message_size: usize,
	) -> Result<Self, ConfigError> {
		ensure!(source_block_count > 0, ConfigError::ZeroSourceBlocks);
		ensure!(message_size > 0, ConfigError::ZeroMessageSize);
		validate_cdf(&degree_cdf, source_block_count)?;

		Ok(Self {
			degree_cdf,
			global_seed,
			source_block_count,
			fragment_count,
			message_size,
			block_size: message_size.div_ceil(source_block_count),
		})
	}

	/// Parameters using the ideal soliton distribution over `source_block_count` degrees.
	pub fn ideal(
		source_block_count: usize,
		fragment_count: usize,
		global_seed: u64,
		message_size: usize,
	) -> Result<Self, ConfigError> {
		let degree_cdf = ideal_soliton_cdf(source_block_count)?;
		Self::new(degree_cdf, global_seed, source_block_count, fragment_count, message_size)
	}

	/// Derives the degree and source indices of fragment `id`.
	///
	/// One degree is drawn from the CDF, then that many distinct indices are drawn uniformly
	/// from `[0, k)`, all from the fragment's own [`FragmentRng`].
	pub fn composition(&self, id: u64) -> Composition {
		let mut rng = FragmentRng::new(self.global_seed, id);
		let degree = sample_degree(&self.degree_cdf, rng.next_unit());

		let mut indices = Vec::with_capacity(degree);
		while indices.len() < degree {
			let index = rng.index_below(self.source_block_count);
			if !indices.contains(&index) {
				indices.push(index);
			}
		}
		indices.sort_unstable();

		Composition { degree, indices }
	}

	/// SHA-256 over the serialized record, used to name the message instance in stores.
	pub fn fingerprint(&self) -> [u8; 32] {
		hash_serialize::<Self, Sha256>([self]).into()
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let mut buf = Vec::new();
		self.serialize(&mut buf)
			.expect("Vec<u8> write buffer grows as needed");
		buf
	}

	/// Reads a record written by [`SerializeBytes::serialize`] and re-validates it.
	pub fn from_bytes(mut read_buf: impl Buf) -> Result<Self, Error> {
		let degree_cdf = Vec::<f64>::deserialize(&mut read_buf)?;
		let global_seed = u64::deserialize(&mut read_buf)?;
		let source_block_count = usize::deserialize(&mut read_buf)?;
		let fragment_count = usize::deserialize(&mut read_buf)?;
		let message_size = usize::deserialize(&mut read_buf)?;
		Ok(Self::new(degree_cdf, global_seed, source_block_count, fragment_count, message_size)?)
	}
}

impl SerializeBytes for CodecParameters {
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), serialization::Error> {
		self.degree_cdf.serialize(&mut write_buf)?;
		self.global_seed.serialize(&mut write_buf)?;
		self.source_block_count.serialize(&mut write_buf)?;
		self.fragment_count.serialize(&mut write_buf)?;
		self.message_size.serialize(&mut write_buf)
	}
}
