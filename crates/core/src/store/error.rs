// Copyright 2024-2025 Irreducible Inc.

use crate::{commitment, fountain};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("a different record is already published for instance {instance}")]
	RecordExists { instance: String },
	#[error("no record is published for instance {instance}")]
	RecordNotFound { instance: String },
	#[error("no object is stored under {key}")]
	ObjectNotFound { key: String },
	#[error("codec error: {0}")]
	Codec(#[from] fountain::Error),
	#[error("commitment error: {0}")]
	Commitment(#[from] commitment::Error),
	#[error("serialization error: {0}")]
	Serialization(#[from] droplet_utils::serialization::Error),
}
