// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use crate::types::{BackingStore, Operation, SecretFormat, SecretRequest};

/// Namespace used when none is given.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Raw inputs for one invocation. Empty strings mean "not provided".
#[derive(Clone, Copy, Default)]
pub struct RequestInputs<'a> {
	pub workload_id: &'a str,
	pub value: &'a str,
	pub namespace: &'a str,
	pub backing_store: &'a str,
	pub use_kubernetes: bool,
	pub template: &'a str,
	pub format: &'a str,
	pub encrypt: bool,
	pub delete: bool,
	pub append: bool,
}

impl fmt::Debug for RequestInputs<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RequestInputs")
			.field("workload_id", &self.workload_id)
			.field("value", &if self.value.is_empty() { "" } else { "[REDACTED]" })
			.field("namespace", &self.namespace)
			.field("backing_store", &self.backing_store)
			.field("use_kubernetes", &self.use_kubernetes)
			.field("template", &self.template)
			.field("format", &self.format)
			.field("encrypt", &self.encrypt)
			.field("delete", &self.delete)
			.field("append", &self.append)
			.finish()
	}
}

/// A request together with the operation it is sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
	pub operation: Operation,
	pub request: SecretRequest,
}

/// Resolve raw inputs into a request.
///
/// Never fails: unrecognised backing stores fall back to `default_store`,
/// unrecognised formats to JSON, and an empty namespace to `"default"`.
/// Precondition checks (workload and value presence) belong to the caller.
pub fn resolve(inputs: &RequestInputs<'_>, default_store: BackingStore) -> ResolvedRequest {
	let backing_store = BackingStore::from_flag(inputs.backing_store).unwrap_or(default_store);
	let namespace = if inputs.namespace.is_empty() {
		DEFAULT_NAMESPACE
	} else {
		inputs.namespace
	};
	let operation = if inputs.delete {
		Operation::Delete
	} else {
		Operation::Upsert
	};

	ResolvedRequest {
		operation,
		request: SecretRequest {
			workload_id: inputs.workload_id.to_string(),
			backing_store,
			namespace: namespace.to_string(),
			use_kubernetes: inputs.use_kubernetes,
			template: inputs.template.to_string(),
			format: SecretFormat::from_flag(inputs.format),
			encrypt: inputs.encrypt,
			append_value: inputs.append,
			value: inputs.value.to_string(),
		},
	}
}
