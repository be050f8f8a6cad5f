// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the safe transport.

use thiserror::Error;

/// Errors that can occur while talking to the safe service.
#[derive(Debug, Error)]
pub enum TransportError {
	/// The endpoint URL is malformed or unusable.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// The workload identity could not be used as TLS client material.
	#[error("unusable workload identity: {0}")]
	Identity(String),

	/// TLS client setup failed.
	#[error("TLS setup failed: {0}")]
	Tls(String),

	/// The peer failed the authorization policy; nothing was sent.
	#[error("peer {peer} is not authorized to receive secrets")]
	Unauthorized { peer: String },

	/// Connecting, handshaking or exchanging the request failed.
	#[error("request to safe failed: {0}")]
	Request(#[source] reqwest::Error),

	/// The response body could not be read.
	#[error("failed to read response from safe: {0}")]
	Response(#[source] reqwest::Error),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
