// Copyright 2024-2025 Irreducible Inc.

/// Returns early with the given error, converted with `Into`.
///
/// With the `bail_panic` feature enabled the error panics instead, which makes the failing call
/// site show up in a backtrace while debugging.
#[cfg(feature = "bail_panic")]
#[macro_export]
macro_rules! bail {
	($err:expr) => {
		panic!("{}", $err);
	};
}

#[cfg(not(feature = "bail_panic"))]
#[macro_export]
macro_rules! bail {
	($err:expr) => {
		return Err($err.into());
	};
}

/// Bails with `$err` unless `$cond` holds.
#[macro_export]
macro_rules! ensure {
	($cond:expr, $err:expr) => {
		if !$cond {
			$crate::bail!($err);
		}
	};
}
