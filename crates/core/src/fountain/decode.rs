// Copyright 2024-2025 Irreducible Inc.

use std::collections::{hash_map::Entry, HashMap, HashSet, VecDeque};

use tracing::{debug, instrument, trace, warn};

use super::{
	block::xor_into,
	error::Error,
	fragment::Fragment,
	params::{CodecParameters, Composition},
};

/// Per-batch report of [`PeelingDecoder::add_fragments`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
	/// Fragments that still reference at least one unresolved block.
	pub admitted: usize,
	/// Fragments whose id was already seen.
	pub duplicates: usize,
	/// New fragments whose blocks were all resolved already.
	pub redundant: usize,
	/// Fragments that could not be parsed or have the wrong payload length. They are dropped.
	pub rejected: usize,
}

#[derive(Debug)]
struct PendingFragment {
	/// Payload with every resolved block XORed out.
	payload: Vec<u8>,
	/// Unresolved block indices still folded into `payload`.
	indices: Vec<usize>,
}

enum Outcome {
	Admitted,
	Duplicate,
	Redundant,
	Rejected,
}

/// Incremental peeling decoder over the fragment/block dependency graph.
///
/// Fragments can be added in any order and in any number of batches; [`Self::try_decode`] runs
/// the cascade to its fixed point each time it is called.
#[derive(Debug)]
pub struct PeelingDecoder {
	params: CodecParameters,
	seen: HashSet<u64>,
	pending: HashMap<u64, PendingFragment>,
	blocks: Vec<Option<Vec<u8>>>,
	/// For each block index, the ids of pending fragments referencing it. Entries of fragments
	/// that left `pending` are skipped lazily.
	dependents: Vec<Vec<u64>>,
	ready: VecDeque<u64>,
	resolved: usize,
}

impl PeelingDecoder {
	pub fn new(params: CodecParameters) -> Self {
		let k = params.source_block_count();
		Self {
			params,
			seen: HashSet::new(),
			pending: HashMap::new(),
			blocks: vec![None; k],
			dependents: vec![Vec::new(); k],
			ready: VecDeque::new(),
			resolved: 0,
		}
	}

	pub fn params(&self) -> &CodecParameters {
		&self.params
	}

	pub fn resolved_count(&self) -> usize {
		self.resolved
	}

	pub fn unresolved_count(&self) -> usize {
		self.params.source_block_count() - self.resolved
	}

	pub fn is_complete(&self) -> bool {
		self.unresolved_count() == 0
	}

	/// Number of admitted fragments still waiting on two or more blocks, or queued for peeling.
	pub fn pending_count(&self) -> usize {
		self.pending.len()
	}

	#[instrument(skip_all, level = "debug")]
	pub fn add_fragments(&mut self, fragments: impl IntoIterator<Item = Fragment>) -> Admission {
		let mut admission = Admission::default();
		for fragment in fragments {
			self.record(&mut admission, fragment);
		}
		debug!(?admission, pending = self.pending.len(), "fragments admitted");
		admission
	}

	/// Like [`Self::add_fragments`], parsing each entry from its wire form first.
	#[instrument(skip_all, level = "debug")]
	pub fn add_encoded<B: AsRef<[u8]>>(
		&mut self,
		encoded: impl IntoIterator<Item = B>,
	) -> Admission {
		let mut admission = Admission::default();
		for bytes in encoded {
			match Fragment::from_bytes(bytes.as_ref()) {
				Ok(fragment) => self.record(&mut admission, fragment),
				Err(err) => {
					warn!(%err, "dropping unparsable fragment");
					admission.rejected += 1;
				}
			}
		}
		debug!(?admission, pending = self.pending.len(), "encoded fragments admitted");
		admission
	}

	/// Peels until no degree-one fragment is left, then returns the message if every block is
	/// known.
	///
	/// Safe to call repeatedly; fragments added between calls continue the same cascade.
	#[instrument(skip_all, level = "debug")]
	pub fn try_decode(&mut self) -> Result<Vec<u8>, Error> {
		let before = self.resolved;
		self.peel();
		trace!(
			newly_resolved = self.resolved - before,
			unresolved = self.unresolved_count(),
			"peeling pass finished"
		);

		if !self.is_complete() {
			return Err(Error::InsufficientFragments {
				unresolved: self.unresolved_count(),
				total: self.params.source_block_count(),
			});
		}

		let mut message = Vec::with_capacity(self.params.block_size() * self.blocks.len());
		for block in self.blocks.iter().flatten() {
			message.extend_from_slice(block);
		}
		message.truncate(self.params.message_size());
		Ok(message)
	}

	fn record(&mut self, admission: &mut Admission, fragment: Fragment) {
		match self.admit(fragment) {
			Outcome::Admitted => admission.admitted += 1,
			Outcome::Duplicate => admission.duplicates += 1,
			Outcome::Redundant => admission.redundant += 1,
			Outcome::Rejected => admission.rejected += 1,
		}
	}

	fn admit(&mut self, fragment: Fragment) -> Outcome {
		let Fragment { id, mut payload } = fragment;
		if payload.len() != self.params.block_size() {
			warn!(
				id,
				len = payload.len(),
				expected = self.params.block_size(),
				"dropping fragment with wrong payload length"
			);
			return Outcome::Rejected;
		}
		if !self.seen.insert(id) {
			return Outcome::Duplicate;
		}

		let Composition { indices, .. } = self.params.composition(id);
		let mut remaining = Vec::with_capacity(indices.len());
		for index in indices {
			match &self.blocks[index] {
				Some(block) => xor_into(&mut payload, block),
				None => remaining.push(index),
			}
		}

		if remaining.is_empty() {
			return Outcome::Redundant;
		}
		for &index in &remaining {
			self.dependents[index].push(id);
		}
		if remaining.len() == 1 {
			self.ready.push_back(id);
		}
		self.pending.insert(
			id,
			PendingFragment {
				payload,
				indices: remaining,
			},
		);
		Outcome::Admitted
	}

	fn peel(&mut self) {
		while let Some(id) = self.ready.pop_front() {
			// Fragments emptied by an earlier resolution have already left `pending`.
			let Some(fragment) = self.pending.remove(&id) else {
				continue;
			};
			debug_assert_eq!(fragment.indices.len(), 1);
			let index = fragment.indices[0];
			self.resolve(index, fragment.payload);
		}
	}

	fn resolve(&mut self, index: usize, bytes: Vec<u8>) {
		for id in std::mem::take(&mut self.dependents[index]) {
			let Entry::Occupied(mut entry) = self.pending.entry(id) else {
				continue;
			};
			let fragment = entry.get_mut();
			if let Some(position) = fragment.indices.iter().position(|&i| i == index) {
				fragment.indices.swap_remove(position);
				xor_into(&mut fragment.payload, &bytes);
			}
			match fragment.indices.len() {
				0 => {
					entry.remove();
				}
				1 => self.ready.push_back(id),
				_ => {}
			}
		}

		self.blocks[index] = Some(bytes);
		self.resolved += 1;
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;
	use itertools::Itertools;
	use rand::{rngs::StdRng, seq::SliceRandom, RngCore, SeedableRng};

	use super::*;
	use crate::fountain::encode::Encoder;

	fn setup(k: usize, message_size: usize, seed: u64) -> (Vec<u8>, Encoder) {
		let mut message = vec![0u8; message_size];
		StdRng::seed_from_u64(seed).fill_bytes(&mut message);
		let params = CodecParameters::ideal(k, 4 * k, seed, message_size).unwrap();
		let encoder = Encoder::new(params, &message).unwrap();
		(message, encoder)
	}

	/// Fixed point of the peeling rule computed by brute force.
	fn reference_unresolved(params: &CodecParameters, ids: &[u64]) -> usize {
		let compositions = ids
			.iter()
			.unique()
			.map(|&id| params.composition(id).indices)
			.collect::<Vec<_>>();
		let mut known = vec![false; params.source_block_count()];
		loop {
			let mut progress = false;
			for indices in &compositions {
				let unknown = indices.iter().filter(|&&i| !known[i]).collect::<Vec<_>>();
				if let [&index] = unknown.as_slice() {
					known[index] = true;
					progress = true;
				}
			}
			if !progress {
				break;
			}
		}
		known.iter().filter(|&&k| !k).count()
	}

	/// Adds ids `0, 1, 2, ...` one at a time until decoding succeeds.
	fn decode_incrementally(encoder: &Encoder, limit: u64) -> (Vec<u8>, u64) {
		let mut decoder = PeelingDecoder::new(encoder.params().clone());
		for id in 0..limit {
			decoder.add_fragments([encoder.generate_fragment(id)]);
			if let Ok(message) = decoder.try_decode() {
				return (message, id + 1);
			}
		}
		panic!("decoding did not finish within {limit} fragments");
	}

	#[test]
	fn test_too_few_fragments_is_insufficient() {
		let (_, encoder) = setup(10, 160, 42);
		let ids = (0..5).collect::<Vec<u64>>();
		let mut decoder = PeelingDecoder::new(encoder.params().clone());
		decoder.add_fragments(encoder.generate_range(&ids));

		let expected = reference_unresolved(encoder.params(), &ids);
		assert!(expected > 0);
		assert_matches!(
			decoder.try_decode(),
			Err(Error::InsufficientFragments { unresolved, total: 10 }) if unresolved == expected
		);
		assert!(decoder.resolved_count() < 10);
		assert!(!decoder.is_complete());
	}

	#[test]
	fn test_unresolved_count_matches_reference() {
		let (_, encoder) = setup(24, 24 * 8, 7);
		let mut rng = StdRng::seed_from_u64(0);
		for _ in 0..20 {
			let count = rng.next_u64() % 40;
			let ids = (0..count).map(|_| rng.next_u64() % 64).collect::<Vec<_>>();

			let mut decoder = PeelingDecoder::new(encoder.params().clone());
			decoder.add_fragments(ids.iter().map(|&id| encoder.generate_fragment(id)));
			let _ = decoder.try_decode();
			assert_eq!(decoder.unresolved_count(), reference_unresolved(encoder.params(), &ids));
		}
	}

	#[test]
	fn test_incremental_round_trip() {
		for seed in 0..8 {
			let (message, encoder) = setup(10, 160, seed);
			let (decoded, _) = decode_incrementally(&encoder, 500);
			assert_eq!(decoded, message);
		}

		let (message, encoder) = setup(13, 200, 99);
		assert_eq!(decode_incrementally(&encoder, 1000).0, message);
	}

	#[test]
	fn test_arrival_order_does_not_matter() {
		let (message, encoder) = setup(16, 250, 3);
		let (_, needed) = decode_incrementally(&encoder, 1000);
		let mut fragments = encoder.generate_range(&(0..needed).collect::<Vec<_>>());

		let mut rng = StdRng::seed_from_u64(11);
		for _ in 0..5 {
			fragments.shuffle(&mut rng);
			let mut decoder = PeelingDecoder::new(encoder.params().clone());
			decoder.add_fragments(fragments.iter().cloned());
			assert_eq!(decoder.try_decode().unwrap(), message);
		}
	}

	#[test]
	fn test_duplicates_and_redundant_fragments() {
		let (message, encoder) = setup(10, 160, 42);
		let (_, needed) = decode_incrementally(&encoder, 500);
		let fragments = encoder.generate_range(&(0..needed).collect::<Vec<_>>());

		let mut decoder = PeelingDecoder::new(encoder.params().clone());
		let first = decoder.add_fragments(fragments.iter().cloned());
		assert_eq!(first.admitted + first.redundant, fragments.len());
		assert_eq!(first.duplicates, 0);

		let again = decoder.add_fragments(fragments.iter().cloned());
		assert_eq!(again.duplicates, fragments.len());
		assert_eq!(again.admitted, 0);

		assert_eq!(decoder.try_decode().unwrap(), message);
		assert_eq!(decoder.pending_count(), 0);

		let late = decoder.add_fragments([encoder.generate_fragment(needed + 100)]);
		assert_eq!(late.redundant, 1);
		assert_eq!(decoder.try_decode().unwrap(), message);
	}

	#[test]
	fn test_malformed_fragments_are_dropped() {
		let (message, encoder) = setup(10, 160, 42);
		let (_, needed) = decode_incrementally(&encoder, 500);

		let mut encoded = (0..needed)
			.map(|id| encoder.generate_fragment(id).to_bytes())
			.collect::<Vec<_>>();
		encoded.push(vec![1, 2, 3]);
		encoded.push(Fragment::new(needed, vec![0u8; 15]).to_bytes());

		let mut decoder = PeelingDecoder::new(encoder.params().clone());
		let admission = decoder.add_encoded(&encoded);
		assert_eq!(admission.rejected, 2);
		assert_eq!(decoder.try_decode().unwrap(), message);
	}

	#[test]
	fn test_unpadded_message_is_truncated() {
		let (message, encoder) = setup(7, 100, 5);
		assert_eq!(encoder.params().block_size(), 15);
		let (decoded, _) = decode_incrementally(&encoder, 1000);
		assert_eq!(decoded.len(), 100);
		assert_eq!(decoded, message);
	}
}
