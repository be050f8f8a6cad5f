// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! X.509 SVID material held for the lifetime of one command.

use std::fmt;

use chrono::{DateTime, Utc};
use rustls::sign::CertifiedKey;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tracing::debug;
use x509_parser::prelude::{FromDer, GeneralName, X509Certificate};
use zeroize::Zeroizing;

use crate::error::{IdentityError, IdentityResult};
use crate::id::SpiffeId;

/// A workload's X.509 identity: SVID chain, private key and trust bundle.
///
/// Exclusively owned by the command for one invocation. The private key is
/// kept as PEM in a zeroizing buffer; it is wiped when the identity is closed
/// or dropped, including on early returns and unwinding.
pub struct X509Identity {
	spiffe_id: SpiffeId,
	cert_chain: Vec<CertificateDer<'static>>,
	private_key_pem: Zeroizing<Vec<u8>>,
	bundle: Vec<CertificateDer<'static>>,
	expires_at: DateTime<Utc>,
}

impl X509Identity {
	/// Build an identity from PEM-encoded SVID chain, private key and bundle.
	///
	/// The leaf certificate must carry exactly one URI SAN holding a valid
	/// SPIFFE ID, must not be expired and must certify the public half of
	/// `private_key_pem`. The bundle must contain at least one certificate.
	pub fn from_pem(
		cert_chain_pem: &[u8],
		private_key_pem: &[u8],
		bundle_pem: &[u8],
	) -> IdentityResult<Self> {
		let cert_chain = parse_certs(cert_chain_pem, "SVID certificate")?;
		let bundle = parse_certs(bundle_pem, "trust bundle")?;

		let private_key_pem = Zeroizing::new(private_key_pem.to_vec());
		let key = parse_private_key(&private_key_pem)?;
		ensure_key_matches(&cert_chain, &key)?;

		let leaf = &cert_chain[0];
		let spiffe_id = spiffe_id_from_der(leaf)?;
		let expires_at = not_after(leaf)?;
		if expires_at <= Utc::now() {
			return Err(IdentityError::Expired(expires_at));
		}

		Ok(Self {
			spiffe_id,
			cert_chain,
			private_key_pem,
			bundle,
			expires_at,
		})
	}

	pub fn spiffe_id(&self) -> &SpiffeId {
		&self.spiffe_id
	}

	/// Leaf certificate first, followed by any intermediates.
	pub fn cert_chain(&self) -> &[CertificateDer<'static>] {
		&self.cert_chain
	}

	/// Root certificates for validating peers in the trust domain.
	pub fn bundle(&self) -> &[CertificateDer<'static>] {
		&self.bundle
	}

	/// Decode the private key for handing to the TLS layer.
	pub fn private_key(&self) -> IdentityResult<PrivateKeyDer<'static>> {
		parse_private_key(&self.private_key_pem)
	}

	pub fn expires_at(&self) -> DateTime<Utc> {
		self.expires_at
	}

	pub fn is_expired(&self) -> bool {
		Utc::now() >= self.expires_at
	}

	/// Release the identity. Key material is zeroized.
	pub fn close(self) {
		debug!(spiffe_id = %self.spiffe_id, "Released workload identity");
	}
}

impl fmt::Debug for X509Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("X509Identity")
			.field("spiffe_id", &self.spiffe_id.to_string())
			.field("cert_chain_len", &self.cert_chain.len())
			.field("private_key", &"[REDACTED]")
			.field("bundle_len", &self.bundle.len())
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// All URI subject alternative names on a DER certificate.
pub fn peer_uri_sans(der: &[u8]) -> IdentityResult<Vec<String>> {
	let cert = parse_x509(der)?;
	let sans = cert
		.subject_alternative_name()
		.map_err(|e| IdentityError::Malformed(format!("invalid subjectAltName: {e}")))?;

	Ok(match sans {
		Some(ext) => ext
			.value
			.general_names
			.iter()
			.filter_map(|name| match name {
				GeneralName::URI(uri) => Some(uri.to_string()),
				_ => None,
			})
			.collect(),
		None => Vec::new(),
	})
}

fn spiffe_id_from_der(der: &[u8]) -> IdentityResult<SpiffeId> {
	let uris = peer_uri_sans(der)?;
	match uris.as_slice() {
		[uri] => Ok(SpiffeId::parse(uri)?),
		[] => Err(IdentityError::Malformed(
			"SVID certificate has no URI SAN".to_string(),
		)),
		_ => Err(IdentityError::Malformed(
			"SVID certificate has more than one URI SAN".to_string(),
		)),
	}
}

fn not_after(der: &[u8]) -> IdentityResult<DateTime<Utc>> {
	let cert = parse_x509(der)?;
	let timestamp = cert.validity().not_after.timestamp();
	DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
		IdentityError::Malformed(format!("certificate not-after out of range: {timestamp}"))
	})
}

fn parse_x509(der: &[u8]) -> IdentityResult<X509Certificate<'_>> {
	X509Certificate::from_der(der)
		.map(|(_, cert)| cert)
		.map_err(|e| IdentityError::Malformed(format!("invalid certificate: {e}")))
}

fn parse_certs(pem: &[u8], what: &str) -> IdentityResult<Vec<CertificateDer<'static>>> {
	let certs = rustls_pemfile::certs(&mut &pem[..])
		.collect::<Result<Vec<_>, _>>()
		.map_err(|e| IdentityError::Malformed(format!("failed to parse {what}: {e}")))?;
	if certs.is_empty() {
		return Err(IdentityError::Malformed(format!(
			"{what} contains no certificates"
		)));
	}
	Ok(certs)
}

fn parse_private_key(pem: &[u8]) -> IdentityResult<PrivateKeyDer<'static>> {
	rustls_pemfile::private_key(&mut &pem[..])
		.map_err(|e| IdentityError::Malformed(format!("failed to parse private key: {e}")))?
		.ok_or_else(|| IdentityError::Malformed("no private key found".to_string()))
}

fn ensure_key_matches(
	cert_chain: &[CertificateDer<'static>],
	key: &PrivateKeyDer<'static>,
) -> IdentityResult<()> {
	let signing_key = rustls::crypto::ring::sign::any_supported_type(key)
		.map_err(|e| IdentityError::Malformed(format!("unsupported private key: {e}")))?;
	CertifiedKey::new(cert_chain.to_vec(), signing_key)
		.keys_match()
		.map_err(|e| {
			IdentityError::Malformed(format!(
				"private key does not match SVID certificate: {e}"
			))
		})
}
