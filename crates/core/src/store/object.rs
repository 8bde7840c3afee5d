// Copyright 2024-2025 Irreducible Inc.

use auto_impl::auto_impl;
use dashmap::DashMap;

use super::error::Error;

/// Bulk storage for plaintext messages too large to sit next to the codec parameters.
#[auto_impl(&, Box, Arc)]
pub trait ObjectStore: Send + Sync {
	fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), Error>;

	fn get(&self, key: &str) -> Result<Vec<u8>, Error>;
}

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
	objects: DashMap<String, Vec<u8>>,
}

impl MemoryObjectStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl ObjectStore for MemoryObjectStore {
	fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), Error> {
		self.objects.insert(key.to_owned(), bytes);
		Ok(())
	}

	fn get(&self, key: &str) -> Result<Vec<u8>, Error> {
		self.objects
			.get(key)
			.map(|object| object.value().clone())
			.ok_or_else(|| Error::ObjectNotFound {
				key: key.to_owned(),
			})
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;

	use super::*;

	#[test]
	fn test_put_then_get() {
		let store = MemoryObjectStore::new();
		store.put("message", b"payload".to_vec()).unwrap();
		assert_eq!(store.get("message").unwrap(), b"payload");
		assert_matches!(store.get("other"), Err(Error::ObjectNotFound { key }) if key == "other");
	}
}
