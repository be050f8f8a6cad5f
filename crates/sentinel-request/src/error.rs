// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Errors that can occur while encoding or decoding a secret request.
#[derive(Debug, Error)]
pub enum RequestError {
	#[error("failed to encode secret request: {0}")]
	Encoding(#[source] serde_json::Error),

	#[error("failed to decode secret request: {0}")]
	Decoding(#[source] serde_json::Error),
}

/// Result type for request operations.
pub type RequestResult<T> = Result<T, RequestError>;
