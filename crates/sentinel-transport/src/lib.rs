// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mutual TLS transport to the safe service.
//!
//! Builds one HTTP client per invocation that:
//!
//! - presents the workload's X.509 SVID as its client certificate
//! - trusts only the workload's trust bundle
//! - hands the peer's SPIFFE ID to a [`PeerPolicy`](sentinel_spiffe::PeerPolicy)
//!   during the handshake, before any request bytes are written
//!
//! and issues exactly one request against `{base}/sentinel/v1/secrets`.

mod endpoint;
mod error;
mod tls;
mod transport;
mod verifier;

pub use endpoint::{secrets_endpoint, SECRETS_PATH};
pub use error::{TransportError, TransportResult};
pub use tls::mtls_client_config;
pub use transport::{user_agent, Dispatch, MtlsTransport, SecretsTransport};
pub use verifier::{RejectedPeer, SpiffeServerVerifier};
