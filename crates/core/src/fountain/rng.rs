// Copyright 2024-2025 Irreducible Inc.

use droplet_hash::{sha256_concat, SHA256_DIGEST_LEN};
use rand::RngCore;

const DOMAIN: &[u8] = b"droplet.fragment-rng.v1";

/// Deterministic pseudo-random stream owned by a single fragment id.
///
/// The stream is SHA-256 in counter mode under a key derived from `(global_seed, id)`, so any
/// party can reproduce the draws for any id without replaying the ids before it. Bytes are
/// consumed in order; integers are read little-endian.
#[derive(Debug, Clone)]
pub struct FragmentRng {
	key: [u8; SHA256_DIGEST_LEN],
	counter: u64,
	block: [u8; SHA256_DIGEST_LEN],
	/// Invariant: `offset <= SHA256_DIGEST_LEN`; equality means the block is spent.
	offset: usize,
}

impl FragmentRng {
	pub fn new(global_seed: u64, id: u64) -> Self {
		let key = sha256_concat([DOMAIN, &global_seed.to_le_bytes()[..], &id.to_le_bytes()[..]]);
		Self {
			key,
			counter: 0,
			block: [0u8; SHA256_DIGEST_LEN],
			offset: SHA256_DIGEST_LEN,
		}
	}

	fn refill(&mut self) {
		self.block = sha256_concat([&self.key[..], &self.counter.to_le_bytes()[..]]);
		self.counter += 1;
		self.offset = 0;
	}

	/// A draw in `[0, 1)` built from the top 53 bits of the next `u64`.
	pub fn next_unit(&mut self) -> f64 {
		const SCALE: f64 = 1.0 / (1u64 << 53) as f64;
		(self.next_u64() >> 11) as f64 * SCALE
	}

	/// A uniform integer in `[0, n)`, rejecting the biased tail of the `u64` range.
	///
	/// ## Preconditions
	///
	/// * `n` must be positive.
	pub fn index_below(&mut self, n: usize) -> usize {
		assert!(n > 0, "index_below requires a non-empty range");
		let n = n as u64;
		// 2^64 mod n; draws at or above 2^64 - rem would favour small residues.
		let rem = (u64::MAX % n + 1) % n;
		loop {
			let x = self.next_u64();
			if rem == 0 || x < u64::MAX - rem + 1 {
				return (x % n) as usize;
			}
		}
	}
}

impl RngCore for FragmentRng {
	fn next_u32(&mut self) -> u32 {
		let mut bytes = [0u8; 4];
		self.fill_bytes(&mut bytes);
		u32::from_le_bytes(bytes)
	}

	fn next_u64(&mut self) -> u64 {
		let mut bytes = [0u8; 8];
		self.fill_bytes(&mut bytes);
		u64::from_le_bytes(bytes)
	}

	fn fill_bytes(&mut self, dest: &mut [u8]) {
		let mut written = 0;
		while written < dest.len() {
			if self.offset == SHA256_DIGEST_LEN {
				self.refill();
			}
			let take = (SHA256_DIGEST_LEN - self.offset).min(dest.len() - written);
			dest[written..written + take]
				.copy_from_slice(&self.block[self.offset..self.offset + take]);
			self.offset += take;
			written += take;
		}
	}

	fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
		self.fill_bytes(dest);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_stream_is_pure_in_seed_and_id() {
		let mut a = FragmentRng::new(42, 7);
		let mut b = FragmentRng::new(42, 7);
		let draws_a = (0..10).map(|_| a.next_u64()).collect::<Vec<_>>();
		let draws_b = (0..10).map(|_| b.next_u64()).collect::<Vec<_>>();
		assert_eq!(draws_a, draws_b);

		assert_ne!(FragmentRng::new(42, 8).next_u64(), draws_a[0]);
		assert_ne!(FragmentRng::new(43, 7).next_u64(), draws_a[0]);
	}

	#[test]
	fn test_first_block_matches_counter_zero() {
		let mut rng = FragmentRng::new(1, 2);
		let mut out = [0u8; SHA256_DIGEST_LEN];
		rng.fill_bytes(&mut out);

		let key = sha256_concat([DOMAIN, &1u64.to_le_bytes()[..], &2u64.to_le_bytes()[..]]);
		assert_eq!(out, sha256_concat([&key[..], &0u64.to_le_bytes()[..]]));
	}

	#[test]
	fn test_split_reads_match_bulk_read() {
		let mut bulk = FragmentRng::new(9, 9);
		let mut expected = [0u8; 100];
		bulk.fill_bytes(&mut expected);

		let mut split = FragmentRng::new(9, 9);
		let mut actual = [0u8; 100];
		for chunk in actual.chunks_mut(13) {
			split.fill_bytes(chunk);
		}
		assert_eq!(actual, expected);
	}

	#[test]
	fn test_unit_draws_in_range() {
		let mut rng = FragmentRng::new(0, 0);
		for _ in 0..1000 {
			let x = rng.next_unit();
			assert!((0.0..1.0).contains(&x));
		}
	}

	#[test]
	fn test_index_below_covers_range() {
		let mut rng = FragmentRng::new(5, 11);
		let mut seen = [false; 10];
		for _ in 0..500 {
			seen[rng.index_below(10)] = true;
		}
		assert!(seen.iter().all(|&hit| hit));
		assert_eq!(rng.index_below(1), 0);
	}
}
