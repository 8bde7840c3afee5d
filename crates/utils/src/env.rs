// Copyright 2024-2025 Irreducible Inc.

const TRUTHY: [&str; 4] = ["1", "on", "true", "yes"];

/// Whether the environment variable `flag` is set to a truthy value (`1`, `on`, `true`, `yes`,
/// in any case). Unset, non-unicode and any other value count as off.
pub fn boolean_env_flag_set(flag: &str) -> bool {
	std::env::var(flag).is_ok_and(|value| {
		let value = value.trim();
		TRUTHY.iter().any(|truthy| value.eq_ignore_ascii_case(truthy))
	})
}

/// Read an unsigned integer from the environment, `None` when unset or unparsable.
pub fn usize_env_var(name: &str) -> Option<usize> {
	std::env::var(name).ok()?.trim().parse().ok()
}
