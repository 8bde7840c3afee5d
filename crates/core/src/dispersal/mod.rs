// Copyright 2024-2025 Irreducible Inc.

//! One message instance end to end: parameters, fragments and commitment material are prepared
//! once and published; decoders and auditors then work from the stores alone.

mod error;

pub use error::*;
use rand::{CryptoRng, RngCore};
use tracing::{debug, info, instrument};

use crate::{
	commitment::{CommitmentMaterial, FragmentProof},
	fountain::{CodecParameters, Encoder, Fragment, PeelingDecoder},
	store::{FragmentStore, ObjectStore, ParameterRecord, ParameterStore},
};

/// Everything the producer of a message instance publishes.
#[derive(Debug, Clone)]
pub struct Dispersal {
	record: ParameterRecord,
	message: Vec<u8>,
	fragments: Vec<Fragment>,
}

impl Dispersal {
	/// Splits `message` into `source_block_count` blocks under the ideal soliton distribution,
	/// generates fragments `0..fragment_count` and commits to them under a fresh setup.
	#[instrument(
		skip_all,
		level = "debug",
		fields(source_block_count = source_block_count, fragment_count = fragment_count)
	)]
	pub fn prepare(
		message: &[u8],
		source_block_count: usize,
		fragment_count: usize,
		global_seed: u64,
		rng: &mut (impl RngCore + CryptoRng),
	) -> Result<Self, Error> {
		let params = CodecParameters::ideal(
			source_block_count,
			fragment_count,
			global_seed,
			message.len(),
		)
		.map_err(crate::fountain::Error::from)?;
		let encoder = Encoder::new(params.clone(), message)?;
		let fragments = encoder.generate_all();
		let commitment = CommitmentMaterial::create(&fragments, rng)?;

		Ok(Self {
			record: ParameterRecord {
				params,
				commitment: Some(commitment),
			},
			message: message.to_vec(),
			fragments,
		})
	}

	pub fn record(&self) -> &ParameterRecord {
		&self.record
	}

	pub fn fragments(&self) -> &[Fragment] {
		&self.fragments
	}

	pub fn instance_id(&self) -> String {
		self.record.instance_id()
	}

	/// Membership proofs for every published fragment, ordered by id.
	pub fn fragment_proofs(&self) -> Result<Vec<FragmentProof>, Error> {
		Ok(commitment_of(&self.record)?.prove_fragments(&self.fragments)?)
	}

	/// Publishes the record, the plaintext and every fragment. Returns how many fragments were
	/// newly inserted; fragments already present are left alone.
	#[instrument(skip_all, level = "debug")]
	pub fn publish(
		&self,
		params_store: &impl ParameterStore,
		fragment_store: &impl FragmentStore,
		object_store: &impl ObjectStore,
	) -> Result<usize, Error> {
		let instance = self.instance_id();
		params_store.publish(&self.record)?;
		object_store.put(&instance, self.message.clone())?;

		let mut inserted = 0;
		for fragment in &self.fragments {
			if fragment_store.insert_if_absent(fragment.clone())? {
				inserted += 1;
			}
		}
		info!(%instance, inserted, total = self.fragments.len(), "message instance published");
		Ok(inserted)
	}
}

/// Decodes whatever the fragment store currently holds.
///
/// Fails with [`crate::fountain::Error::InsufficientFragments`] while too few fragments are
/// available; the caller may retry once more have arrived.
#[instrument(skip_all, level = "debug")]
pub fn reconstruct(params: &CodecParameters, store: &impl FragmentStore) -> Result<Vec<u8>, Error> {
	let fragments = store.scan()?;
	let mut decoder = PeelingDecoder::new(params.clone());
	let admission = decoder.add_fragments(fragments);
	debug!(?admission, "fragment store scanned");
	Ok(decoder.try_decode()?)
}

fn commitment_of(record: &ParameterRecord) -> Result<&CommitmentMaterial, Error> {
	record
		.commitment
		.as_ref()
		.ok_or_else(|| Error::MissingCommitment {
			instance: record.instance_id(),
		})
}

/// Checks that `fragments` are exactly the fragment set the record commits to.
#[instrument(skip_all, level = "debug")]
pub fn audit(record: &ParameterRecord, fragments: &[Fragment]) -> Result<(), Error> {
	commitment_of(record)?.verify_fragment_set(fragments)?;
	Ok(())
}

/// Checks one fragment against the record's commitment, without the rest of the set.
pub fn audit_fragment(
	record: &ParameterRecord,
	fragment: &Fragment,
	proof: &FragmentProof,
) -> Result<(), Error> {
	commitment_of(record)?
		.verify_fragment(fragment, proof)
		.map_err(crate::commitment::Error::from)?;
	Ok(())
}

/// Compares a decoded message with the plaintext kept in the object store.
pub fn verify_decoded(
	object_store: &impl ObjectStore,
	instance: &str,
	decoded: &[u8],
) -> Result<(), Error> {
	let stored = object_store.get(instance)?;
	if stored != decoded {
		return Err(Error::DecodedMismatch {
			key: instance.to_owned(),
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;
	use rand::{rngs::StdRng, SeedableRng};

	use super::*;
	use crate::{
		commitment::{self, VerificationError},
		fountain,
		store::{MemoryFragmentStore, MemoryObjectStore, MemoryParameterStore},
	};

	fn prepared(seed: u64) -> Dispersal {
		let message = (0..160u32).map(|i| (i * 7 + 3) as u8).collect::<Vec<_>>();
		Dispersal::prepare(&message, 10, 200, seed, &mut StdRng::seed_from_u64(seed)).unwrap()
	}

	#[test]
	fn test_publish_then_reconstruct() {
		let dispersal = prepared(42);
		let params_store = MemoryParameterStore::new();
		let fragment_store = MemoryFragmentStore::new();
		let object_store = MemoryObjectStore::new();

		assert_eq!(dispersal.publish(&params_store, &fragment_store, &object_store).unwrap(), 200);
		// A second producer of the same instance changes nothing.
		assert_eq!(dispersal.publish(&params_store, &fragment_store, &object_store).unwrap(), 0);

		let record = params_store.load(&dispersal.instance_id()).unwrap();
		assert_eq!(&record, dispersal.record());

		let stored = fragment_store.scan().unwrap();
		audit(&record, &stored).unwrap();

		let decoded = reconstruct(&record.params, &fragment_store).unwrap();
		verify_decoded(&object_store, &dispersal.instance_id(), &decoded).unwrap();
	}

	#[test]
	fn test_reconstruct_reports_missing_blocks() {
		let dispersal = prepared(42);
		let fragment_store = MemoryFragmentStore::new();
		for fragment in &dispersal.fragments()[..3] {
			fragment_store.insert_if_absent(fragment.clone()).unwrap();
		}
		assert_matches!(
			reconstruct(&dispersal.record().params, &fragment_store),
			Err(Error::Codec(fountain::Error::InsufficientFragments { unresolved, total: 10 })) if unresolved > 0
		);
	}

	#[test]
	fn test_audit_rejects_foreign_fragments() {
		let dispersal = prepared(1);
		let mut fragments = dispersal.fragments().to_vec();
		fragments[0].payload[0] ^= 1;
		assert_matches!(
			audit(dispersal.record(), &fragments),
			Err(Error::Commitment(commitment::Error::Verification(
				VerificationError::DigestMismatch
			)))
		);

		let bare = ParameterRecord {
			commitment: None,
			..dispersal.record().clone()
		};
		assert_matches!(
			audit(&bare, dispersal.fragments()),
			Err(Error::MissingCommitment { .. })
		);
	}

	#[test]
	fn test_audit_single_fragments() {
		let message = (0..160u32).map(|i| (i * 11) as u8).collect::<Vec<_>>();
		let dispersal =
			Dispersal::prepare(&message, 10, 60, 7, &mut StdRng::seed_from_u64(7)).unwrap();
		let proofs = dispersal.fragment_proofs().unwrap();
		assert_eq!(proofs.len(), 60);
		for id in [0usize, 57, 59] {
			audit_fragment(dispersal.record(), &dispersal.fragments()[id], &proofs[id]).unwrap();
		}

		let mut tampered = dispersal.fragments()[57].clone();
		tampered.payload[0] ^= 1;
		assert_matches!(
			audit_fragment(dispersal.record(), &tampered, &proofs[57]),
			Err(Error::Commitment(commitment::Error::Verification(
				VerificationError::PairingCheckFailed
			)))
		);
		assert_matches!(
			audit_fragment(dispersal.record(), &dispersal.fragments()[56], &proofs[57]),
			Err(Error::Commitment(commitment::Error::Verification(
				VerificationError::FragmentIdMismatch { proof: 57, fragment: 56 }
			)))
		);
	}

	#[test]
	fn test_decoded_mismatch() {
		let object_store = MemoryObjectStore::new();
		object_store.put("instance", vec![1, 2, 3]).unwrap();
		assert_matches!(
			verify_decoded(&object_store, "instance", &[1, 2, 4]),
			Err(Error::DecodedMismatch { .. })
		);
	}
}
