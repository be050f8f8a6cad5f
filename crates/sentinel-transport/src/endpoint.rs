// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use url::Url;

use crate::error::{TransportError, TransportResult};

/// Path of the secrets API on the safe service.
pub const SECRETS_PATH: &str = "/sentinel/v1/secrets";

/// Join the safe base URL with the secrets API path.
///
/// The base must be an `https` URL with a host. Any path on the base is kept
/// as a prefix.
pub fn secrets_endpoint(base: &str) -> TransportResult<Url> {
	let mut url = Url::parse(base).map_err(|e| {
		TransportError::Configuration(format!("invalid safe endpoint URL {base:?}: {e}"))
	})?;

	if url.scheme() != "https" {
		return Err(TransportError::Configuration(format!(
			"safe endpoint URL must use https, got {:?}",
			url.scheme()
		)));
	}
	if url.host_str().map_or(true, str::is_empty) {
		return Err(TransportError::Configuration(
			"safe endpoint URL has no host".to_string(),
		));
	}

	let path = format!("{}{SECRETS_PATH}", url.path().trim_end_matches('/'));
	url.set_path(&path);
	Ok(url)
}
