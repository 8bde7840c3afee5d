// Copyright 2024-2025 Irreducible Inc.

//! Degree distributions over `1..=k`, stored as cumulative probabilities.
//!
//! Entry `i` of a CDF is the probability that a fragment has degree at most `i + 1`. The CDF is
//! published as part of the codec parameters and every party samples from the published values,
//! so it is treated as data rather than recomputed per party.

use droplet_utils::{bail, ensure};

use super::error::ConfigError;

/// How far the last CDF entry may sit from 1 before the distribution is rejected.
pub const CDF_TOLERANCE: f64 = 1e-9;

/// The ideal soliton distribution: `ρ(1) = 1/k`, `ρ(i) = 1/(i(i-1))` for `i = 2..=k`.
///
/// The running sum is accumulated left to right in `f64`.
pub fn ideal_soliton_cdf(k: usize) -> Result<Vec<f64>, ConfigError> {
	ensure!(k > 0, ConfigError::ZeroSourceBlocks);

	let mut cdf = Vec::with_capacity(k);
	let mut acc = 1.0 / k as f64;
	cdf.push(acc);
	for i in 2..=k {
		acc += 1.0 / (i as f64 * (i - 1) as f64);
		cdf.push(acc);
	}
	Ok(cdf)
}

/// Luby's robust soliton distribution with tuning constants `c` and `delta`.
///
/// Adds the spike `τ` at `k/R` (with `R = c·ln(k/δ)·√k`) to the ideal soliton and renormalises,
/// which keeps the ripple of degree-one fragments from running dry during peeling.
pub fn robust_soliton_cdf(k: usize, c: f64, delta: f64) -> Result<Vec<f64>, ConfigError> {
	ensure!(k > 0, ConfigError::ZeroSourceBlocks);
	if !(c > 0.0 && delta > 0.0 && delta < 1.0) {
		bail!(ConfigError::InvalidRobustSoliton);
	}

	let k_f = k as f64;
	let r = c * (k_f / delta).ln() * k_f.sqrt();
	let spike = ((k_f / r).floor() as usize).clamp(1, k);

	let pmf = (1..=k)
		.map(|i| {
			let rho = if i == 1 {
				1.0 / k_f
			} else {
				1.0 / (i as f64 * (i - 1) as f64)
			};
			let tau = match i.cmp(&spike) {
				std::cmp::Ordering::Less => r / (i as f64 * k_f),
				std::cmp::Ordering::Equal => r * (r / delta).ln() / k_f,
				std::cmp::Ordering::Greater => 0.0,
			};
			rho + tau.max(0.0)
		})
		.collect::<Vec<_>>();

	let beta = pmf.iter().sum::<f64>();
	let mut acc = 0.0;
	let mut cdf = pmf
		.into_iter()
		.map(|p| {
			acc += p / beta;
			acc
		})
		.collect::<Vec<_>>();
	// Pin the tail so that sampling never falls off the end.
	cdf[k - 1] = 1.0;
	Ok(cdf)
}

/// Checks that `cdf` is a well-formed CDF over degrees `1..=k`.
pub fn validate_cdf(cdf: &[f64], k: usize) -> Result<(), ConfigError> {
	ensure!(k > 0, ConfigError::ZeroSourceBlocks);
	ensure!(
		cdf.len() == k,
		ConfigError::CdfLengthMismatch {
			expected: k,
			actual: cdf.len(),
		}
	);

	let mut prev = 0.0;
	for (index, &value) in cdf.iter().enumerate() {
		if !(0.0..=1.0 + CDF_TOLERANCE).contains(&value) {
			bail!(ConfigError::CdfOutOfRange { index, value });
		}
		ensure!(value >= prev, ConfigError::CdfDecreasing { index });
		prev = value;
	}

	let last = cdf[k - 1];
	ensure!((last - 1.0).abs() <= CDF_TOLERANCE, ConfigError::CdfIncomplete { last });
	Ok(())
}

/// Returns the smallest degree `d` with `cdf[d - 1] >= draw`, for `draw` in `[0, 1)`.
///
/// If rounding leaves the last entry just below `draw`, the maximum degree is returned.
///
/// ## Preconditions
///
/// * `cdf` must be non-empty and non-decreasing.
pub fn sample_degree(cdf: &[f64], draw: f64) -> usize {
	debug_assert!(!cdf.is_empty());
	let index = cdf.partition_point(|&p| p < draw);
	(index + 1).min(cdf.len())
}
