// Copyright 2024-2025 Irreducible Inc.

use droplet_utils::rayon::min_chunk_len;
use rayon::prelude::*;
use tracing::instrument;

use super::{
	block::{xor_into, SourceBlocks},
	error::Error,
	fragment::Fragment,
	params::CodecParameters,
};

/// Generates fragments of one message instance.
///
/// Generation is a pure function of `(params, id)`; an encoder holds no mutable state and can
/// be shared freely between threads.
#[derive(Debug, Clone)]
pub struct Encoder {
	params: CodecParameters,
	blocks: SourceBlocks,
}

impl Encoder {
	pub fn new(params: CodecParameters, message: &[u8]) -> Result<Self, Error> {
		let blocks = SourceBlocks::split(&params, message)?;
		Ok(Self { params, blocks })
	}

	pub fn params(&self) -> &CodecParameters {
		&self.params
	}

	pub fn generate_fragment(&self, id: u64) -> Fragment {
		let composition = self.params.composition(id);
		let mut payload = vec![0u8; self.blocks.block_size()];
		for &index in &composition.indices {
			xor_into(&mut payload, self.blocks.block(index));
		}
		Fragment::new(id, payload)
	}

	/// Generates every id of `ids` in parallel, preserving the order of `ids`.
	#[instrument(skip_all, level = "debug", fields(count = ids.len()))]
	pub fn generate_range(&self, ids: &[u64]) -> Vec<Fragment> {
		ids.par_iter()
			.with_min_len(min_chunk_len(ids.len()))
			.map(|&id| self.generate_fragment(id))
			.collect()
	}

	/// Generates fragments `0..fragment_count` of the published parameters.
	pub fn generate_all(&self) -> Vec<Fragment> {
		let ids = (0..self.params.fragment_count() as u64).collect::<Vec<_>>();
		self.generate_range(&ids)
	}
}
