// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One command invocation, end to end.
//!
//! Inputs are checked and a [`Mode`] chosen before any I/O. The workload
//! identity is then acquired under a cancellation token owned by the run,
//! used for exactly one request, and closed whether the request succeeded
//! or not.

use std::sync::Arc;

use sentinel_request::{resolve, RequestInputs};
use sentinel_spiffe::{acquire, IdentitySource, PeerPolicy, X509Identity};
use sentinel_transport::{secrets_endpoint, Dispatch, SecretsTransport};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::SentinelConfig;
use crate::error::{CommandError, InputError};

/// Everything the operator asked for in one invocation.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
	pub list: bool,
	pub request: RequestInputs<'a>,
}

/// What a command does. Exactly one per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
	/// Read back the registered secrets.
	List,
	/// Create or replace a workload's secret.
	Upsert,
	/// Remove a workload's secret.
	Delete,
	/// Have the safe encrypt a value without storing it for any workload.
	Encrypt,
}

impl Mode {
	/// Pick the mode, or the first input problem. List wins over everything;
	/// `--encrypt` without a workload is standalone encryption.
	pub fn select(invocation: &Invocation<'_>) -> Result<Self, InputError> {
		let request = &invocation.request;
		if invocation.list {
			return Ok(Mode::List);
		}

		if request.workload_id.is_empty() {
			if !request.encrypt {
				return Err(InputError::WorkloadRequired);
			}
			if request.delete {
				return Err(InputError::EncryptWithDelete);
			}
			if request.value.is_empty() {
				return Err(InputError::SecretRequired);
			}
			return Ok(Mode::Encrypt);
		}

		if request.delete {
			Ok(Mode::Delete)
		} else if request.value.is_empty() {
			Err(InputError::SecretRequired)
		} else {
			Ok(Mode::Upsert)
		}
	}
}

pub struct Orchestrator<S, T> {
	config: SentinelConfig,
	source: S,
	transport: T,
	policy: Arc<dyn PeerPolicy>,
}

impl<S, T> Orchestrator<S, T>
where
	S: IdentitySource,
	T: SecretsTransport,
{
	pub fn new(
		config: SentinelConfig,
		source: S,
		transport: T,
		policy: Arc<dyn PeerPolicy>,
	) -> Self {
		Self {
			config,
			source,
			transport,
			policy,
		}
	}

	/// Run the command and return the safe's response body.
	#[instrument(skip_all, fields(mode = tracing::field::Empty))]
	pub async fn run(&self, invocation: &Invocation<'_>) -> Result<Vec<u8>, CommandError> {
		let mode = Mode::select(invocation)?;
		tracing::Span::current().record("mode", tracing::field::debug(&mode));

		let endpoint = secrets_endpoint(&self.config.safe_endpoint_url)?;

		let cancel = CancellationToken::new();
		let _cancel_on_exit = cancel.clone().drop_guard();
		let identity = acquire(&self.source, self.config.identity_timeout, &cancel).await?;

		let result = self.exchange(mode, &invocation.request, &identity, &endpoint).await;
		identity.close();
		result
	}

	async fn exchange(
		&self,
		mode: Mode,
		inputs: &RequestInputs<'_>,
		identity: &X509Identity,
		endpoint: &Url,
	) -> Result<Vec<u8>, CommandError> {
		let dispatch = match mode {
			Mode::List => Dispatch::List,
			Mode::Upsert | Mode::Delete | Mode::Encrypt => {
				let inputs = RequestInputs {
					use_kubernetes: inputs.use_kubernetes || self.config.use_kubernetes_secrets,
					..*inputs
				};
				let resolved = resolve(&inputs, self.config.default_backing_store);
				let request = &resolved.request;
				debug!(
					workload = %request.workload_id(),
					namespace = %request.namespace(),
					store = %request.backing_store(),
					use_kubernetes = request.use_kubernetes(),
					encrypt = request.encrypt(),
					append = request.append_value(),
					"Resolved secret request"
				);
				Dispatch::for_operation(resolved.operation, request.to_json()?)
			}
		};

		let body = self
			.transport
			.send(identity, self.policy.clone(), endpoint, dispatch)
			.await?;
		info!(bytes = body.len(), "Safe responded");
		Ok(body)
	}
}
