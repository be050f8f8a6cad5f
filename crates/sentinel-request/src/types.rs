// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{RequestError, RequestResult};

/// Where the remote service persists the secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackingStore {
	File,
	Memory,
}

impl BackingStore {
	/// Exact match on `"file"` / `"memory"`; anything else is unset.
	pub fn from_flag(flag: &str) -> Option<Self> {
		match flag {
			"file" => Some(BackingStore::File),
			"memory" => Some(BackingStore::Memory),
			_ => None,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			BackingStore::File => "file",
			BackingStore::Memory => "memory",
		}
	}
}

impl fmt::Display for BackingStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Rendering of template output. Only meaningful when a template is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretFormat {
	#[default]
	Json,
	Yaml,
}

impl SecretFormat {
	/// `"yaml"` selects YAML, `"json"` and everything else JSON.
	pub fn from_flag(flag: &str) -> Self {
		match flag {
			"yaml" => SecretFormat::Yaml,
			_ => SecretFormat::Json,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			SecretFormat::Json => "json",
			SecretFormat::Yaml => "yaml",
		}
	}
}

/// The network operation a request is dispatched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
	/// Create or update the workload's secret (`POST`).
	Upsert,
	/// Remove the workload's secret (`DELETE`).
	Delete,
}

/// The body sent to the secrets service for upsert and delete.
///
/// Every field is always serialized, so the service can tell an explicit
/// `false` from an absent field. Built once per invocation and never mutated.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRequest {
	pub(crate) workload_id: String,
	pub(crate) backing_store: BackingStore,
	pub(crate) namespace: String,
	pub(crate) use_kubernetes: bool,
	pub(crate) template: String,
	pub(crate) format: SecretFormat,
	pub(crate) encrypt: bool,
	pub(crate) append_value: bool,
	pub(crate) value: String,
}

impl SecretRequest {
	pub fn workload_id(&self) -> &str {
		&self.workload_id
	}

	pub fn backing_store(&self) -> BackingStore {
		self.backing_store
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn use_kubernetes(&self) -> bool {
		self.use_kubernetes
	}

	/// Server-side transform; empty when none.
	pub fn template(&self) -> &str {
		&self.template
	}

	pub fn format(&self) -> SecretFormat {
		self.format
	}

	pub fn encrypt(&self) -> bool {
		self.encrypt
	}

	pub fn append_value(&self) -> bool {
		self.append_value
	}

	/// The secret payload. Never log this.
	pub fn value(&self) -> &str {
		&self.value
	}

	/// Serialize to the canonical JSON wire form.
	pub fn to_json(&self) -> RequestResult<EncodedPayload> {
		serde_json::to_vec(self)
			.map(|bytes| EncodedPayload(Zeroizing::new(bytes)))
			.map_err(RequestError::Encoding)
	}

	pub fn from_json(bytes: &[u8]) -> RequestResult<Self> {
		serde_json::from_slice(bytes).map_err(RequestError::Decoding)
	}
}

impl Drop for SecretRequest {
	fn drop(&mut self) {
		self.value.zeroize();
	}
}

impl fmt::Debug for SecretRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SecretRequest")
			.field("workload_id", &self.workload_id)
			.field("backing_store", &self.backing_store)
			.field("namespace", &self.namespace)
			.field("use_kubernetes", &self.use_kubernetes)
			.field("template", &self.template)
			.field("format", &self.format)
			.field("encrypt", &self.encrypt)
			.field("append_value", &self.append_value)
			.field("value", &"[REDACTED]")
			.finish()
	}
}

/// Serialized request body. Zeroized on drop since it embeds the secret.
pub struct EncodedPayload(Zeroizing<Vec<u8>>);

impl EncodedPayload {
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for EncodedPayload {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EncodedPayload")
			.field("len", &self.0.len())
			.finish()
	}
}
