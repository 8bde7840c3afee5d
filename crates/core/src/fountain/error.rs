// Copyright 2024-2025 Irreducible Inc.

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid codec configuration: {0}")]
	Configuration(#[from] ConfigError),
	#[error("insufficient fragments: {unresolved} of {total} source blocks are unresolved")]
	InsufficientFragments { unresolved: usize, total: usize },
	#[error("serialization error: {0}")]
	Serialization(#[from] droplet_utils::serialization::Error),
}

/// Codec parameters that are missing or internally inconsistent. Never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
	#[error("the source block count must be positive")]
	ZeroSourceBlocks,
	#[error("the message size must be positive")]
	ZeroMessageSize,
	#[error("the degree CDF has {actual} entries, expected one per source block ({expected})")]
	CdfLengthMismatch { expected: usize, actual: usize },
	#[error("degree CDF entry {index} is {value}, outside of [0, 1]")]
	CdfOutOfRange { index: usize, value: f64 },
	#[error("degree CDF decreases at entry {index}")]
	CdfDecreasing { index: usize },
	#[error("degree CDF ends at {last}, expected 1")]
	CdfIncomplete { last: f64 },
	#[error("robust soliton parameters must satisfy c > 0 and 0 < delta < 1")]
	InvalidRobustSoliton,
	#[error("message has {actual} bytes, the parameters describe {expected}")]
	MessageLengthMismatch { expected: usize, actual: usize },
}
