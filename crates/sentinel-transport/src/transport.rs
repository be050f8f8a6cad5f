// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Single-request dispatch to the safe service.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use sentinel_request::{EncodedPayload, Operation};
use sentinel_spiffe::{PeerPolicy, X509Identity};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{TransportError, TransportResult};
use crate::tls::mtls_client_config;
use crate::verifier::RejectedPeer;

/// What to send to the secrets endpoint.
#[derive(Debug)]
pub enum Dispatch {
	/// `POST` the payload.
	Upsert(EncodedPayload),
	/// `DELETE` with the payload as body.
	Delete(EncodedPayload),
	/// `GET`, no body.
	List,
}

impl Dispatch {
	pub fn for_operation(operation: Operation, payload: EncodedPayload) -> Self {
		match operation {
			Operation::Upsert => Dispatch::Upsert(payload),
			Operation::Delete => Dispatch::Delete(payload),
		}
	}

	pub fn method(&self) -> Method {
		match self {
			Dispatch::Upsert(_) => Method::POST,
			Dispatch::Delete(_) => Method::DELETE,
			Dispatch::List => Method::GET,
		}
	}

	fn payload(&self) -> Option<&EncodedPayload> {
		match self {
			Dispatch::Upsert(payload) | Dispatch::Delete(payload) => Some(payload),
			Dispatch::List => None,
		}
	}
}

/// Sends one request to the safe over an authenticated channel.
#[async_trait]
pub trait SecretsTransport: Send + Sync {
	/// Send `dispatch` to `endpoint` and return the raw response body.
	///
	/// The peer must pass `policy` before any request bytes are written.
	/// A non-success status is not an error; the body is returned as is.
	async fn send(
		&self,
		identity: &X509Identity,
		policy: Arc<dyn PeerPolicy>,
		endpoint: &Url,
		dispatch: Dispatch,
	) -> TransportResult<Vec<u8>>;
}

/// `User-Agent` sent with every request.
pub fn user_agent() -> String {
	format!("sentinel/{}", env!("CARGO_PKG_VERSION"))
}

/// Mutual TLS transport backed by reqwest and rustls.
///
/// Each call builds a fresh client from the identity it is given, so no
/// connection or key material outlives the exchange.
#[derive(Debug, Clone)]
pub struct MtlsTransport {
	user_agent: String,
}

impl MtlsTransport {
	pub fn new() -> Self {
		Self {
			user_agent: user_agent(),
		}
	}
}

impl Default for MtlsTransport {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl SecretsTransport for MtlsTransport {
	#[instrument(skip_all, fields(method = %dispatch.method(), endpoint = %endpoint))]
	async fn send(
		&self,
		identity: &X509Identity,
		policy: Arc<dyn PeerPolicy>,
		endpoint: &Url,
		dispatch: Dispatch,
	) -> TransportResult<Vec<u8>> {
		let rejected = RejectedPeer::default();
		let tls = mtls_client_config(identity, policy, rejected.clone())?;

		let client = reqwest::Client::builder()
			.use_preconfigured_tls(tls)
			.user_agent(&self.user_agent)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(|e| TransportError::Tls(format!("failed to create HTTP client: {e}")))?;

		let mut request = client.request(dispatch.method(), endpoint.clone());
		if let Some(payload) = dispatch.payload() {
			debug!(bytes = payload.len(), "Sending request body");
			request = request
				.header(CONTENT_TYPE, "application/json")
				.body(payload.as_bytes().to_vec());
		}

		let response = match request.send().await {
			Ok(response) => response,
			Err(e) => {
				if let Some(peer) = rejected.get() {
					return Err(TransportError::Unauthorized {
						peer: peer.to_string(),
					});
				}
				return Err(TransportError::Request(e));
			}
		};

		let status = response.status();
		if status.is_success() {
			debug!(status = %status, "Safe accepted request");
		} else {
			warn!(status = %status, "Safe returned a non-success status");
		}

		let body = response.bytes().await.map_err(TransportError::Response)?;
		Ok(body.to_vec())
	}
}
