// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Test support for sentinel.
//!
//! [`TestPki`] is a throwaway certificate authority that issues X.509 SVIDs
//! (a single URI SAN carrying the SPIFFE ID) so tests can exercise identity
//! loading and mutual TLS without a real identity provider.

use std::path::Path;

use anyhow::Result;
use rcgen::{
	BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType,
	ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose, SanType,
};
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

/// A certificate authority acting as the root of one trust domain.
pub struct TestPki {
	ca_cert: Certificate,
	ca_key: KeyPair,
}

/// An SVID issued by [`TestPki`], with its key and the issuing bundle.
pub struct IssuedSvid {
	pub cert_pem: String,
	pub key_pem: String,
	pub bundle_pem: String,
	pub cert_der: CertificateDer<'static>,
	pub key_der: PrivateKeyDer<'static>,
}

impl TestPki {
	pub fn new() -> Result<Self> {
		let ca_key = KeyPair::generate()?;
		let mut params = CertificateParams::new(Vec::<String>::new())?;
		params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
		params.distinguished_name = DistinguishedName::new();
		params
			.distinguished_name
			.push(DnType::CommonName, "sentinel test root");
		params.key_usages = vec![
			KeyUsagePurpose::KeyCertSign,
			KeyUsagePurpose::CrlSign,
			KeyUsagePurpose::DigitalSignature,
		];
		let ca_cert = params.self_signed(&ca_key)?;
		Ok(Self { ca_cert, ca_key })
	}

	pub fn bundle_pem(&self) -> String {
		self.ca_cert.pem()
	}

	pub fn bundle_der(&self) -> CertificateDer<'static> {
		self.ca_cert.der().clone()
	}

	/// Issue an SVID whose only URI SAN is `uri`.
	pub fn issue(&self, uri: &str) -> Result<IssuedSvid> {
		let mut params = svid_params()?;
		params.subject_alt_names = vec![SanType::URI(uri.to_string().try_into()?)];
		self.sign(params)
	}

	/// Issue an SVID that expired long ago.
	pub fn issue_expired(&self, uri: &str) -> Result<IssuedSvid> {
		let mut params = svid_params()?;
		params.subject_alt_names = vec![SanType::URI(uri.to_string().try_into()?)];
		params.not_before = rcgen::date_time_ymd(2000, 1, 1);
		params.not_after = rcgen::date_time_ymd(2001, 1, 1);
		self.sign(params)
	}

	/// Issue a certificate with no URI SAN at all.
	pub fn issue_without_uri(&self) -> Result<IssuedSvid> {
		self.sign(svid_params()?)
	}

	fn sign(&self, params: CertificateParams) -> Result<IssuedSvid> {
		let key = KeyPair::generate()?;
		let cert = params.signed_by(&key, &self.ca_cert, &self.ca_key)?;
		Ok(IssuedSvid {
			cert_pem: cert.pem(),
			key_pem: key.serialize_pem(),
			bundle_pem: self.bundle_pem(),
			cert_der: cert.der().clone(),
			key_der: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der())),
		})
	}
}

impl IssuedSvid {
	/// Write the files the workload identity helper would produce.
	pub fn write_to(&self, dir: &Path) -> std::io::Result<()> {
		std::fs::write(dir.join("svid.pem"), &self.cert_pem)?;
		std::fs::write(dir.join("svid_key.pem"), &self.key_pem)?;
		std::fs::write(dir.join("svid_bundle.pem"), &self.bundle_pem)?;
		Ok(())
	}
}

fn svid_params() -> Result<CertificateParams> {
	let mut params = CertificateParams::new(Vec::<String>::new())?;
	params.is_ca = IsCa::ExplicitNoCa;
	params.key_usages = vec![
		KeyUsagePurpose::DigitalSignature,
		KeyUsagePurpose::KeyEncipherment,
		KeyUsagePurpose::KeyAgreement,
	];
	params.extended_key_usages = vec![
		ExtendedKeyUsagePurpose::ServerAuth,
		ExtendedKeyUsagePurpose::ClientAuth,
	];
	Ok(params)
}
