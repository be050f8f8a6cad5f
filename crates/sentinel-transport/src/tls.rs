// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};
use sentinel_spiffe::{PeerPolicy, X509Identity};

use crate::error::{TransportError, TransportResult};
use crate::verifier::{RejectedPeer, SpiffeServerVerifier};

/// Build the rustls client configuration for one mutual TLS exchange.
///
/// Trust anchors come only from the identity's bundle; the system store is
/// never consulted. `rejected` is filled in if `policy` refuses the peer.
pub fn mtls_client_config(
	identity: &X509Identity,
	policy: Arc<dyn PeerPolicy>,
	rejected: RejectedPeer,
) -> TransportResult<ClientConfig> {
	let provider = Arc::new(rustls::crypto::ring::default_provider());

	let mut roots = RootCertStore::empty();
	for cert in identity.bundle() {
		roots.add(cert.clone()).map_err(|e| {
			TransportError::Identity(format!("invalid trust bundle certificate: {e}"))
		})?;
	}

	let key = identity
		.private_key()
		.map_err(|e| TransportError::Identity(e.to_string()))?;

	let verifier = SpiffeServerVerifier::new(Arc::new(roots), policy, provider.clone(), rejected);

	ClientConfig::builder_with_provider(provider)
		.with_safe_default_protocol_versions()
		.map_err(|e| TransportError::Tls(e.to_string()))?
		.dangerous()
		.with_custom_certificate_verifier(Arc::new(verifier))
		.with_client_auth_cert(identity.cert_chain().to_vec(), key)
		.map_err(|e| TransportError::Identity(format!("client certificate rejected: {e}")))
}
