// Copyright 2024-2025 Irreducible Inc.

use std::time::Instant;

use anyhow::{ensure, Result};
use bytesize::ByteSize;
use clap::{value_parser, Parser};
use droplet_core::{
	dispersal::{audit, audit_fragment, reconstruct, verify_decoded, Dispersal},
	fountain::{self, Encoder, PeelingDecoder},
	store::{
		FragmentStore, MemoryFragmentStore, MemoryObjectStore, MemoryParameterStore, ObjectStore,
		ParameterStore,
	},
};
use droplet_utils::{rayon::adjust_thread_pool, tracing::init_tracing};
use rand::{rngs::OsRng, seq::SliceRandom, thread_rng, RngCore};
use rayon::prelude::*;
use tracing::{info, warn};

#[derive(Debug, Parser)]
struct Args {
	/// Size of the random message in bytes.
	#[arg(long, default_value_t = 1 << 16, value_parser = value_parser!(u64).range(1..))]
	message_size: u64,
	/// Number of source blocks the message is split into.
	#[arg(long, default_value_t = 64, value_parser = value_parser!(u64).range(1..))]
	source_blocks: u64,
	/// Number of fragments generated and committed to.
	#[arg(long, default_value_t = 256, value_parser = value_parser!(u64).range(1..))]
	fragments: u64,
	/// Seed of the per-fragment generators.
	#[arg(long, default_value_t = 42)]
	seed: u64,
	/// Number of workers generating overlapping fragment ranges.
	#[arg(long, default_value_t = 4, value_parser = value_parser!(u64).range(1..))]
	workers: u64,
}

fn main() -> Result<()> {
	adjust_thread_pool()
		.as_ref()
		.expect("failed to init thread pool");
	init_tracing();

	let args = Args::parse();
	let message_size = args.message_size as usize;
	let source_blocks = args.source_blocks as usize;
	let fragment_count = args.fragments as usize;

	println!(
		"Dispersing a {} message into {} source blocks and {} fragments",
		ByteSize::b(args.message_size),
		source_blocks,
		fragment_count
	);

	let mut message = vec![0u8; message_size];
	thread_rng().fill_bytes(&mut message);

	let start = Instant::now();
	let dispersal =
		Dispersal::prepare(&message, source_blocks, fragment_count, args.seed, &mut OsRng)?;
	info!(elapsed = ?start.elapsed(), "fragments generated and committed");

	let params_store = MemoryParameterStore::new();
	let object_store = MemoryObjectStore::new();
	let fragment_store = MemoryFragmentStore::new();
	let instance = dispersal.instance_id();
	params_store.publish(dispersal.record())?;
	object_store.put(&instance, message)?;

	// Workers only see the published record and plaintext, and overlap on half of their ranges.
	let record = params_store.load(&instance)?;
	let encoder = Encoder::new(record.params.clone(), &object_store.get(&instance)?)?;
	let stride = fragment_count.div_ceil(args.workers as usize);
	let inserted = (0..args.workers as usize)
		.into_par_iter()
		.map(|worker| -> Result<usize> {
			let start = worker * stride;
			let end = (start + 2 * stride).min(fragment_count);
			let mut inserted = 0;
			for id in start.min(end)..end {
				if fragment_store.insert_if_absent(encoder.generate_fragment(id as u64))? {
					inserted += 1;
				}
			}
			Ok(inserted)
		})
		.sum::<Result<usize>>()?;
	println!("{inserted} of {} fragments stored", fragment_count);

	// A decoder polls the store in shuffled batches until the message comes back.
	let mut available = fragment_store.scan()?;
	available.shuffle(&mut thread_rng());
	let mut decoder = PeelingDecoder::new(record.params.clone());
	let mut used = 0;
	let decoded = loop {
		let batch = available.len().min(used + source_blocks / 4 + 1);
		decoder.add_fragments(available[used..batch].iter().cloned());
		used = batch;
		match decoder.try_decode() {
			Ok(decoded) => break decoded,
			Err(fountain::Error::InsufficientFragments { unresolved, .. })
				if used < available.len() =>
			{
				info!(used, unresolved, "waiting for more fragments");
			}
			Err(err) => return Err(err.into()),
		}
	};
	verify_decoded(&object_store, &instance, &decoded)?;
	println!(
		"Decoded {} from {} of {} fragments ({:.2}x overhead)",
		ByteSize::b(decoded.len() as u64),
		used,
		available.len(),
		used as f64 / source_blocks as f64
	);

	// The store-wide reconstruction agrees with the incremental one.
	ensure!(reconstruct(&record.params, &fragment_store)? == decoded, "reconstructions disagree");

	let start = Instant::now();
	match audit(&record, &available) {
		Ok(()) => println!("Fragment set matches the published commitment"),
		Err(err) => warn!(%err, "fragment set does not match the published commitment"),
	}
	info!(elapsed = ?start.elapsed(), "audit finished");

	let start = Instant::now();
	let proofs = dispersal.fragment_proofs()?;
	let rejected = available
		.iter()
		.filter(|fragment| {
			proofs
				.get(fragment.id as usize)
				.map_or(true, |proof| audit_fragment(&record, fragment, proof).is_err())
		})
		.count();
	ensure!(rejected == 0, "{rejected} fragments failed their membership proof");
	println!("Every stored fragment verifies on its own");
	info!(elapsed = ?start.elapsed(), "per-fragment audit finished");

	Ok(())
}
