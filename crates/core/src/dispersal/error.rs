// Copyright 2024-2025 Irreducible Inc.

use crate::{commitment, fountain, store};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("codec error: {0}")]
	Codec(#[from] fountain::Error),
	#[error("commitment error: {0}")]
	Commitment(#[from] commitment::Error),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
	#[error("the record for instance {instance} carries no commitment material")]
	MissingCommitment { instance: String },
	#[error("the decoded message differs from the stored object {key}")]
	DecodedMismatch { key: String },
}
