// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::sync::{Arc, OnceLock};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::verify_server_cert_signed_by_trust_anchor;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use rustls::{CertificateError, DigitallySignedStruct, RootCertStore, SignatureScheme};
use sentinel_spiffe::{peer_uri_sans, PeerDecision, PeerPolicy};
use tracing::{debug, warn};

/// Identity a handshake was refused for, if any.
///
/// rustls flattens verifier errors into I/O errors by the time they reach
/// the HTTP client, so the verifier records its refusal here instead.
#[derive(Clone, Default)]
pub struct RejectedPeer(Arc<OnceLock<String>>);

impl RejectedPeer {
	fn record(&self, peer: &str) {
		let peer = if peer.is_empty() { "<none>" } else { peer };
		let _ = self.0.set(peer.to_string());
	}

	pub fn get(&self) -> Option<&str> {
		self.0.get().map(String::as_str)
	}
}

impl fmt::Debug for RejectedPeer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("RejectedPeer").field(&self.get()).finish()
	}
}

/// Server certificate verifier that authorizes by SPIFFE ID.
///
/// The chain is verified against the workload's trust bundle first. The
/// leaf's single URI SAN is then handed to the [`PeerPolicy`]; a leaf with
/// zero or several URI SANs is evaluated as an empty identity. DNS names are
/// not checked: the SPIFFE ID is the server's identity.
#[derive(Debug)]
pub struct SpiffeServerVerifier {
	roots: Arc<RootCertStore>,
	policy: Arc<dyn PeerPolicy>,
	provider: Arc<CryptoProvider>,
	rejected: RejectedPeer,
}

impl SpiffeServerVerifier {
	pub fn new(
		roots: Arc<RootCertStore>,
		policy: Arc<dyn PeerPolicy>,
		provider: Arc<CryptoProvider>,
		rejected: RejectedPeer,
	) -> Self {
		Self {
			roots,
			policy,
			provider,
			rejected,
		}
	}
}

fn single_uri_san(der: &[u8]) -> String {
	match peer_uri_sans(der) {
		Ok(uris) if uris.len() == 1 => uris.into_iter().next().unwrap_or_default(),
		Ok(uris) => {
			debug!(count = uris.len(), "Peer certificate does not carry exactly one URI SAN");
			String::new()
		}
		Err(e) => {
			debug!(error = %e, "Failed to read URI SANs from peer certificate");
			String::new()
		}
	}
}

impl ServerCertVerifier for SpiffeServerVerifier {
	fn verify_server_cert(
		&self,
		end_entity: &CertificateDer<'_>,
		intermediates: &[CertificateDer<'_>],
		_server_name: &ServerName<'_>,
		_ocsp_response: &[u8],
		now: UnixTime,
	) -> Result<ServerCertVerified, rustls::Error> {
		let cert = ParsedCertificate::try_from(end_entity)?;
		verify_server_cert_signed_by_trust_anchor(
			&cert,
			&self.roots,
			intermediates,
			now,
			self.provider.signature_verification_algorithms.all,
		)?;

		let peer = single_uri_san(end_entity);
		match self.policy.evaluate(&peer) {
			PeerDecision::Allow => {
				debug!(peer = %peer, "Peer authorized");
				Ok(ServerCertVerified::assertion())
			}
			PeerDecision::Deny => {
				warn!(peer = %peer, "Peer rejected by authorization policy");
				self.rejected.record(&peer);
				Err(rustls::Error::InvalidCertificate(
					CertificateError::ApplicationVerificationFailure,
				))
			}
		}
	}

	fn verify_tls12_signature(
		&self,
		message: &[u8],
		cert: &CertificateDer<'_>,
		dss: &DigitallySignedStruct,
	) -> Result<HandshakeSignatureValid, rustls::Error> {
		verify_tls12_signature(
			message,
			cert,
			dss,
			&self.provider.signature_verification_algorithms,
		)
	}

	fn verify_tls13_signature(
		&self,
		message: &[u8],
		cert: &CertificateDer<'_>,
		dss: &DigitallySignedStruct,
	) -> Result<HandshakeSignatureValid, rustls::Error> {
		verify_tls13_signature(
			message,
			cert,
			dss,
			&self.provider.signature_verification_algorithms,
		)
	}

	fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
		self.provider
			.signature_verification_algorithms
			.supported_schemes()
	}
}
