// Copyright 2024-2025 Irreducible Inc.

use auto_impl::auto_impl;
use dashmap::{mapref::entry::Entry, DashMap};

use super::error::Error;
use crate::fountain::Fragment;

/// Write-once storage of fragments keyed by id.
#[auto_impl(&, Box, Arc)]
pub trait FragmentStore: Send + Sync {
	/// Stores `fragment` unless its id is already present. Returns whether it was inserted.
	///
	/// A second insert under the same id leaves the stored fragment untouched, whatever its
	/// payload, so independent workers may generate the same id without coordinating.
	fn insert_if_absent(&self, fragment: Fragment) -> Result<bool, Error>;

	/// Every stored fragment in ascending id order.
	fn scan(&self) -> Result<Vec<Fragment>, Error>;

	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[derive(Debug, Default)]
pub struct MemoryFragmentStore {
	fragments: DashMap<u64, Vec<u8>>,
}

impl MemoryFragmentStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl FragmentStore for MemoryFragmentStore {
	fn insert_if_absent(&self, fragment: Fragment) -> Result<bool, Error> {
		match self.fragments.entry(fragment.id) {
			Entry::Occupied(_) => Ok(false),
			Entry::Vacant(entry) => {
				entry.insert(fragment.payload);
				Ok(true)
			}
		}
	}

	fn scan(&self) -> Result<Vec<Fragment>, Error> {
		let mut fragments = self
			.fragments
			.iter()
			.map(|entry| Fragment::new(*entry.key(), entry.value().clone()))
			.collect::<Vec<_>>();
		fragments.sort_unstable_by_key(|fragment| fragment.id);
		Ok(fragments)
	}

	fn len(&self) -> usize {
		self.fragments.len()
	}
}
