// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "SENTINEL_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Filter precedence: `--log-level`, `SENTINEL_LOG`, `RUST_LOG`, then `warn`.
fn env_filter(log_level: Option<&str>) -> EnvFilter {
	log_level
		.and_then(|level| EnvFilter::try_new(level).ok())
		.or_else(|| EnvFilter::try_from_env(LOG_ENV).ok())
		.or_else(|| EnvFilter::try_from_default_env().ok())
		.unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Logs go to stderr; stdout carries only the
/// safe's response.
pub fn init(log_level: Option<&str>, json: bool) {
	let filter = env_filter(log_level);

	if json {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().json().with_writer(std::io::stderr))
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().compact().with_writer(std::io::stderr))
			.init();
	}
}
