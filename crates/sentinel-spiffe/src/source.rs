// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workload identity acquisition.
//!
//! The node-local identity helper writes the SVID chain, its key and the trust
//! bundle as PEM files into a directory shared with the workload. [`acquire`]
//! waits for a complete, valid set to appear, bounded by a deadline and a
//! cancellation token owned by the caller.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use zeroize::Zeroizing;

use crate::error::{IdentityError, IdentityResult};
use crate::svid::X509Identity;

pub const SVID_FILE_NAME: &str = "svid.pem";
pub const KEY_FILE_NAME: &str = "svid_key.pem";
pub const BUNDLE_FILE_NAME: &str = "svid_bundle.pem";

/// Delay between attempts while the identity is not yet available.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A provider of X.509 workload identities.
#[async_trait]
pub trait IdentitySource: Send + Sync {
	/// Make a single attempt to load a complete identity.
	async fn fetch(&self) -> IdentityResult<X509Identity>;
}

/// Reads `svid.pem`, `svid_key.pem` and `svid_bundle.pem` from a directory.
#[derive(Debug, Clone)]
pub struct PemDirectorySource {
	dir: PathBuf,
}

impl PemDirectorySource {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	async fn read(&self, name: &str) -> IdentityResult<Zeroizing<Vec<u8>>> {
		let path = self.dir.join(name);
		match tokio::fs::read(&path).await {
			Ok(bytes) => Ok(Zeroizing::new(bytes)),
			Err(e) if e.kind() == ErrorKind::NotFound => Err(IdentityError::NotReady { path }),
			Err(source) => Err(IdentityError::Io { path, source }),
		}
	}
}

#[async_trait]
impl IdentitySource for PemDirectorySource {
	async fn fetch(&self) -> IdentityResult<X509Identity> {
		let cert_chain = self.read(SVID_FILE_NAME).await?;
		let private_key = self.read(KEY_FILE_NAME).await?;
		let bundle = self.read(BUNDLE_FILE_NAME).await?;
		X509Identity::from_pem(&cert_chain, &private_key, &bundle)
	}
}

/// Acquire a workload identity from `source`.
///
/// Retries every 250ms until the source yields a valid identity, `timeout`
/// elapses ([`IdentityError::Timeout`] carrying the last failure), or `cancel`
/// fires ([`IdentityError::Cancelled`]).
#[instrument(skip_all, fields(timeout = ?timeout))]
pub async fn acquire<S>(
	source: &S,
	timeout: Duration,
	cancel: &CancellationToken,
) -> IdentityResult<X509Identity>
where
	S: IdentitySource + ?Sized,
{
	let deadline = Instant::now() + timeout;

	loop {
		let attempt = tokio::select! {
			biased;
			_ = cancel.cancelled() => return Err(IdentityError::Cancelled),
			result = tokio::time::timeout_at(deadline, source.fetch()) => result,
		};

		let last_error = match attempt {
			Ok(Ok(identity)) => {
				info!(
					spiffe_id = %identity.spiffe_id(),
					expires_at = %identity.expires_at(),
					"Acquired workload identity"
				);
				return Ok(identity);
			}
			Ok(Err(e)) => e,
			Err(_) => {
				return Err(IdentityError::Timeout {
					waited: timeout,
					last_error: "identity provider did not respond".to_string(),
				});
			}
		};

		debug!(error = %last_error, "Workload identity not ready");

		let now = Instant::now();
		if now >= deadline {
			return Err(IdentityError::Timeout {
				waited: timeout,
				last_error: last_error.to_string(),
			});
		}

		let wake = (now + POLL_INTERVAL).min(deadline);
		tokio::select! {
			biased;
			_ = cancel.cancelled() => return Err(IdentityError::Cancelled),
			_ = tokio::time::sleep_until(wake) => {}
		}
	}
}
