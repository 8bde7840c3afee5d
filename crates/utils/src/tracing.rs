// Copyright 2024-2025 Irreducible Inc.

use tracing_subscriber::{
	fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::env::boolean_env_flag_set;

/// Installs the global tracing subscriber for binaries and benches.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Setting `DROPLET_TRACE_SPANS` also logs
/// span close events with their busy time, which is how codec and commitment timings are read.
/// Calling this more than once is harmless; later calls leave the first subscriber in place.
pub fn init_tracing() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let span_events = if boolean_env_flag_set("DROPLET_TRACE_SPANS") {
		FmtSpan::CLOSE
	} else {
		FmtSpan::NONE
	};

	let _ = tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_span_events(span_events))
		.try_init();
}
