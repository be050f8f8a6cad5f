// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::error::Error as _;
use std::fmt::Write as _;

use sentinel_request::RequestError;
use sentinel_spiffe::IdentityError;
use sentinel_transport::TransportError;
use thiserror::Error;

use crate::config::ConfigError;

/// Operator input that cannot form a valid command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
	#[error("Please provide a workload name.")]
	WorkloadRequired,

	#[error("Please provide a secret.")]
	SecretRequired,

	#[error("Encrypting a value without a workload cannot be combined with --delete.")]
	EncryptWithDelete,
}

/// Every way a command can stop short of printing a response.
#[derive(Debug, Error)]
pub enum CommandError {
	#[error(transparent)]
	Input(#[from] InputError),

	#[error("failed to acquire workload identity: {0}")]
	Identity(#[from] IdentityError),

	#[error("refusing to send secrets: peer {peer} is not a recognized safe service")]
	Authorization { peer: String },

	#[error("configuration error: {0}")]
	Configuration(String),

	#[error(transparent)]
	Encoding(#[from] RequestError),

	#[error("{0}")]
	Transport(#[source] TransportError),

	#[error("{0}")]
	Response(#[source] TransportError),
}

impl CommandError {
	pub fn exit_code(&self) -> u8 {
		match self {
			CommandError::Input(_) => 2,
			CommandError::Identity(_) => 3,
			CommandError::Authorization { .. } => 4,
			CommandError::Configuration(_) => 5,
			CommandError::Encoding(_) => 6,
			CommandError::Transport(_) => 7,
			CommandError::Response(_) => 8,
		}
	}

	/// Operator-facing report: the error, its causes, and a usage hint for
	/// input errors.
	pub fn report(&self) -> String {
		let mut out = self.to_string();
		let mut source = self.source();
		while let Some(cause) = source {
			// Most layers already embed their cause in their own message.
			let text = cause.to_string();
			if !out.contains(&text) {
				let _ = write!(out, "\n  caused by: {text}");
			}
			source = cause.source();
		}
		if let CommandError::Input(_) = self {
			out.push_str("\nType `sentinel -h` for usage.");
		}
		out
	}
}

impl From<TransportError> for CommandError {
	fn from(err: TransportError) -> Self {
		match err {
			TransportError::Configuration(message) => CommandError::Configuration(message),
			TransportError::Unauthorized { peer } => CommandError::Authorization { peer },
			TransportError::Response(_) => CommandError::Response(err),
			TransportError::Identity(_) | TransportError::Tls(_) | TransportError::Request(_) => {
				CommandError::Transport(err)
			}
		}
	}
}

impl From<ConfigError> for CommandError {
	fn from(err: ConfigError) -> Self {
		CommandError::Configuration(err.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn reqwest_error() -> reqwest::Error {
		reqwest::Client::new().get("not a url").build().unwrap_err()
	}

	fn encoding_error() -> RequestError {
		RequestError::Encoding(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
	}

	#[test]
	fn exit_codes_are_distinct() {
		let errors = [
			CommandError::Input(InputError::WorkloadRequired),
			CommandError::Identity(IdentityError::Cancelled),
			CommandError::Authorization {
				peer: "spiffe://sentinel.local/x".into(),
			},
			CommandError::Configuration("bad".into()),
			CommandError::Encoding(encoding_error()),
			CommandError::Transport(TransportError::Tls("bad".into())),
			CommandError::Response(TransportError::Response(reqwest_error())),
		];
		let codes: Vec<u8> = errors.iter().map(CommandError::exit_code).collect();
		assert_eq!(codes, vec![2, 3, 4, 5, 6, 7, 8]);
	}

	#[test]
	fn transport_errors_map_to_taxonomy() {
		let err: CommandError = TransportError::Unauthorized {
			peer: "spiffe://evil.local/safe".into(),
		}
		.into();
		assert_eq!(err.exit_code(), 4);
		assert!(err.to_string().contains("spiffe://evil.local/safe"));

		let err: CommandError = TransportError::Configuration("no host".into()).into();
		assert_eq!(err.exit_code(), 5);

		let err: CommandError = TransportError::Identity("bad key".into()).into();
		assert_eq!(err.exit_code(), 7);

		let err: CommandError = TransportError::Request(reqwest_error()).into();
		assert!(matches!(err, CommandError::Transport(_)));
		assert_eq!(err.exit_code(), 7);

		let err: CommandError = TransportError::Response(reqwest_error()).into();
		assert!(matches!(err, CommandError::Response(_)));
		assert_eq!(err.exit_code(), 8);
	}

	#[test]
	fn encoding_errors_keep_their_message() {
		let err: CommandError = encoding_error().into();
		assert_eq!(err.exit_code(), 6);
		assert!(err.to_string().starts_with("failed to encode secret request"));
	}

	#[test]
	fn input_report_carries_guidance() {
		let report = CommandError::Input(InputError::SecretRequired).report();
		assert!(report.starts_with("Please provide a secret."));
		assert!(report.contains("sentinel -h"));
	}

	#[test]
	fn report_includes_causes() {
		let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
		let err = CommandError::Identity(IdentityError::Io {
			path: "/run/spiffe/certs/svid.pem".into(),
			source: io,
		});
		let report = err.report();
		assert_eq!(
			report,
			"failed to acquire workload identity: failed to read /run/spiffe/certs/svid.pem: denied"
		);
	}
}
