// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use std::time::Duration;

use sentinel_request::BackingStore;
use thiserror::Error;

pub const DEFAULT_SAFE_ENDPOINT_URL: &str =
	"https://sentinel-safe.sentinel-system.svc.cluster.local:8443/";
pub const DEFAULT_SAFE_SVID_PREFIX: &str =
	"spiffe://sentinel.local/workload/sentinel-safe/ns/sentinel-system/sa/sentinel-safe/n/";
pub const DEFAULT_SVID_DIR: &str = "/run/spiffe/certs";
pub const DEFAULT_IDENTITY_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("invalid value for {name}: {message}")]
	InvalidValue { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Process-wide settings, read once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct SentinelConfig {
	pub safe_endpoint_url: String,
	/// Used when `--store` is absent or not `file`/`memory`.
	pub default_backing_store: BackingStore,
	/// ORed with `--use-k8s`.
	pub use_kubernetes_secrets: bool,
	pub safe_svid_prefix: String,
	pub svid_dir: PathBuf,
	pub identity_timeout: Duration,
}

impl SentinelConfig {
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let safe_endpoint_url = optional_env(
			&env,
			"SENTINEL_SAFE_ENDPOINT_URL",
			DEFAULT_SAFE_ENDPOINT_URL,
		);
		let default_backing_store = env("SENTINEL_SAFE_BACKING_STORE")
			.and_then(|v| BackingStore::from_flag(&v))
			.unwrap_or(BackingStore::File);
		let use_kubernetes_secrets = env("SENTINEL_SAFE_USE_KUBERNETES_SECRETS")
			.map(|v| v == "true" || v == "1")
			.unwrap_or(false);
		let safe_svid_prefix =
			optional_env(&env, "SENTINEL_SAFE_SVID_PREFIX", DEFAULT_SAFE_SVID_PREFIX);
		let svid_dir = PathBuf::from(optional_env(&env, "SENTINEL_SVID_DIR", DEFAULT_SVID_DIR));
		let identity_timeout_secs: u64 = optional_env_parse(
			&env,
			"SENTINEL_IDENTITY_TIMEOUT_SECS",
			DEFAULT_IDENTITY_TIMEOUT_SECS,
		)?;

		if identity_timeout_secs == 0 {
			return Err(ConfigError::InvalidValue {
				name: "SENTINEL_IDENTITY_TIMEOUT_SECS".into(),
				message: "must be greater than zero".into(),
			});
		}

		Ok(SentinelConfig {
			safe_endpoint_url,
			default_backing_store,
			use_kubernetes_secrets,
			safe_svid_prefix,
			svid_dir,
			identity_timeout: Duration::from_secs(identity_timeout_secs),
		})
	}
}

fn optional_env(env: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
	env(name)
		.filter(|v| !v.is_empty())
		.unwrap_or_else(|| default.to_string())
}

fn optional_env_parse<T: std::str::FromStr>(
	env: &impl Fn(&str) -> Option<String>,
	name: &str,
	default: T,
) -> Result<T>
where
	T::Err: std::fmt::Display,
{
	match env(name) {
		Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
			name: name.to_string(),
			message: e.to_string(),
		}),
		None => Ok(default),
	}
}
