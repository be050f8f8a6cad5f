// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for SPIFFE identity handling.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while parsing a SPIFFE ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpiffeIdError {
	#[error("SPIFFE ID is empty")]
	Empty,

	#[error("SPIFFE ID exceeds {max} bytes")]
	TooLong { max: usize },

	#[error("SPIFFE ID must start with spiffe://")]
	MissingScheme,

	#[error("SPIFFE ID has an empty trust domain")]
	EmptyTrustDomain,

	#[error("trust domain contains invalid character {0:?}")]
	InvalidTrustDomainChar(char),

	#[error("path contains an empty segment")]
	EmptySegment,

	#[error("path contains a dot segment")]
	DotSegment,

	#[error("path contains invalid character {0:?}")]
	InvalidPathChar(char),

	#[error("path has a trailing slash")]
	TrailingSlash,
}

/// Errors that can occur while acquiring a workload identity.
#[derive(Debug, Error)]
pub enum IdentityError {
	/// The identity helper has not written the material yet.
	#[error("identity material not available: {}", path.display())]
	NotReady { path: PathBuf },

	/// Reading identity material failed.
	#[error("failed to read {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// Certificate, key or bundle could not be parsed, or the key does not
	/// belong to the certificate.
	#[error("malformed identity material: {0}")]
	Malformed(String),

	/// The SVID does not carry a valid SPIFFE ID.
	#[error("invalid SPIFFE ID in SVID: {0}")]
	InvalidSpiffeId(#[from] SpiffeIdError),

	/// The SVID is past its not-after time.
	#[error("SVID expired at {0}")]
	Expired(DateTime<Utc>),

	/// No valid identity was obtained before the deadline.
	#[error("timed out after {waited:?} waiting for workload identity: {last_error}")]
	Timeout { waited: Duration, last_error: String },

	/// The owning command cancelled the wait.
	#[error("identity acquisition cancelled")]
	Cancelled,
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
