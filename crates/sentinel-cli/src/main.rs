// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod args;
mod config;
mod error;
mod logging;
mod orchestrator;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sentinel_spiffe::{PemDirectorySource, SafeServicePolicy};
use sentinel_transport::MtlsTransport;
use tracing::debug;

use crate::args::Args;
use crate::config::SentinelConfig;
use crate::error::CommandError;
use crate::orchestrator::Orchestrator;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	let args = Args::parse();
	logging::init(args.log_level.as_deref(), args.json_logs);

	match run(&args).await {
		Ok(body) => match write_body(&body) {
			Ok(()) => ExitCode::SUCCESS,
			Err(e) => {
				eprintln!("error: failed to write response: {e}");
				ExitCode::FAILURE
			}
		},
		Err(e) => {
			eprintln!("{}", e.report());
			ExitCode::from(e.exit_code())
		}
	}
}

/// The safe's response is passed through untouched, followed by a newline.
fn write_body(body: &[u8]) -> std::io::Result<()> {
	let mut stdout = std::io::stdout().lock();
	stdout.write_all(body)?;
	stdout.write_all(b"\n")?;
	stdout.flush()
}

async fn run(args: &Args) -> Result<Vec<u8>, CommandError> {
	let config = SentinelConfig::from_env()?;
	debug!(
		endpoint = %config.safe_endpoint_url,
		svid_dir = %config.svid_dir.display(),
		default_store = %config.default_backing_store,
		"Loaded configuration"
	);

	let policy = SafeServicePolicy::new(config.safe_svid_prefix.clone()).map_err(|e| {
		CommandError::Configuration(format!("invalid SENTINEL_SAFE_SVID_PREFIX: {e}"))
	})?;
	let source = PemDirectorySource::new(config.svid_dir.clone());

	let orchestrator = Orchestrator::new(config, source, MtlsTransport::new(), Arc::new(policy));
	orchestrator.run(&args.invocation()).await
}
