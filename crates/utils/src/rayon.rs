// Copyright 2024-2025 Irreducible Inc.

use std::sync::OnceLock;

use crate::env::usize_env_var;

/// Configures the global rayon pool from `RAYON_NUM_THREADS` before first use.
///
/// A single thread is run on the calling thread (`use_current_thread`) so that profiles of
/// fragment generation and hashing stay readable. Any other value is left to rayon's own
/// handling of the variable.
///
/// NOTE: rayon refuses to build the global pool twice, so the result is memoised and a
/// reference is returned because `ThreadPoolBuildError` doesn't implement `Clone`. Call this at
/// the beginning of `main`.
pub fn adjust_thread_pool() -> &'static Result<(), rayon::ThreadPoolBuildError> {
	static ONCE_GUARD: OnceLock<Result<(), rayon::ThreadPoolBuildError>> = OnceLock::new();

	ONCE_GUARD.get_or_init(|| match usize_env_var("RAYON_NUM_THREADS") {
		Some(1) => rayon::ThreadPoolBuilder::new()
			.num_threads(1)
			.use_current_thread()
			.build_global(),
		_ => Ok(()),
	})
}

/// Number of fragments a single rayon task should generate for a batch of `n_items`.
pub fn min_chunk_len(n_items: usize) -> usize {
	n_items.div_ceil(4 * rayon::current_num_threads()).max(1)
}
