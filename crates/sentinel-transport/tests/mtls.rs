// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end mutual TLS tests against an in-process safe.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use sentinel_request::{resolve, BackingStore, EncodedPayload, RequestInputs};
use sentinel_spiffe::{FixedPolicy, PeerPolicy, SafeServicePolicy, X509Identity};
use sentinel_testsupport::{IssuedSvid, TestPki};
use sentinel_transport::{
	secrets_endpoint, Dispatch, MtlsTransport, SecretsTransport, TransportError,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

const SAFE_PREFIX: &str =
	"spiffe://sentinel.local/workload/sentinel-safe/ns/sentinel-system/sa/sentinel-safe/n/";
const SAFE_ID: &str =
	"spiffe://sentinel.local/workload/sentinel-safe/ns/sentinel-system/sa/sentinel-safe/n/safe-0";
const CLIENT_ID: &str =
	"spiffe://sentinel.local/workload/sentinel/ns/sentinel-system/sa/sentinel/n/cli";

/// What the safe saw on its single accepted connection.
struct Received {
	handshake_ok: bool,
	bytes: Vec<u8>,
}

impl Received {
	fn text(&self) -> String {
		String::from_utf8_lossy(&self.bytes).into_owned()
	}
}

fn server_config(pki: &TestPki, svid: &IssuedSvid) -> Arc<ServerConfig> {
	let provider = Arc::new(rustls::crypto::ring::default_provider());
	let mut roots = RootCertStore::empty();
	roots.add(pki.bundle_der()).unwrap();
	let client_verifier =
		WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider.clone())
			.build()
			.unwrap();

	let config = ServerConfig::builder_with_provider(provider)
		.with_safe_default_protocol_versions()
		.unwrap()
		.with_client_cert_verifier(client_verifier)
		.with_single_cert(vec![svid.cert_der.clone()], svid.key_der.clone_key())
		.unwrap();
	Arc::new(config)
}

async fn read_request<S: AsyncRead + Unpin>(stream: &mut S) -> Vec<u8> {
	let mut buf = Vec::new();
	let mut chunk = [0u8; 4096];
	loop {
		if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
			let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
			let body_len = head
				.lines()
				.find_map(|line| line.strip_prefix("content-length:"))
				.and_then(|v| v.trim().parse::<usize>().ok())
				.unwrap_or(0);
			if buf.len() >= end + 4 + body_len {
				return buf;
			}
		}
		let n = stream.read(&mut chunk).await.unwrap_or(0);
		if n == 0 {
			return buf;
		}
		buf.extend_from_slice(&chunk[..n]);
	}
}

/// Accept one connection, answer with `status` and `body`, report what arrived.
async fn spawn_safe(
	pki: &TestPki,
	svid: &IssuedSvid,
	status: &'static str,
	body: &'static [u8],
) -> (SocketAddr, JoinHandle<Received>) {
	let acceptor = TlsAcceptor::from(server_config(pki, svid));
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	let handle = tokio::spawn(async move {
		let (tcp, _) = listener.accept().await.unwrap();
		let mut tls = match acceptor.accept(tcp).await {
			Ok(tls) => tls,
			Err(_) => {
				return Received {
					handshake_ok: false,
					bytes: Vec::new(),
				}
			}
		};

		let bytes = read_request(&mut tls).await;
		let head = format!(
			"HTTP/1.1 {status}\r\n\
			 content-type: application/octet-stream\r\n\
			 content-length: {}\r\n\
			 connection: close\r\n\r\n",
			body.len()
		);
		let _ = tls.write_all(head.as_bytes()).await;
		let _ = tls.write_all(body).await;
		let _ = tls.shutdown().await;

		Received {
			handshake_ok: true,
			bytes,
		}
	});

	(addr, handle)
}

fn client_identity(pki: &TestPki) -> X509Identity {
	let svid = pki.issue(CLIENT_ID).unwrap();
	X509Identity::from_pem(
		svid.cert_pem.as_bytes(),
		svid.key_pem.as_bytes(),
		svid.bundle_pem.as_bytes(),
	)
	.unwrap()
}

fn payload(delete: bool) -> EncodedPayload {
	resolve(
		&RequestInputs {
			workload_id: "billing-api",
			value: if delete { "" } else { "s3cr3t" },
			delete,
			..Default::default()
		},
		BackingStore::File,
	)
	.request
	.to_json()
	.unwrap()
}

fn safe_policy() -> Arc<dyn PeerPolicy> {
	Arc::new(SafeServicePolicy::new(SAFE_PREFIX).unwrap())
}

async fn send(
	identity: &X509Identity,
	policy: Arc<dyn PeerPolicy>,
	addr: SocketAddr,
	dispatch: Dispatch,
) -> Result<Vec<u8>, TransportError> {
	let endpoint = secrets_endpoint(&format!("https://127.0.0.1:{}/", addr.port())).unwrap();
	tokio::time::timeout(
		Duration::from_secs(10),
		MtlsTransport::new().send(identity, policy, &endpoint, dispatch),
	)
	.await
	.expect("transport hung")
}

async fn received(handle: JoinHandle<Received>) -> Received {
	tokio::time::timeout(Duration::from_secs(10), handle)
		.await
		.expect("safe hung")
		.unwrap()
}

#[tokio::test]
async fn upsert_posts_json_to_secrets_path() {
	let pki = TestPki::new().unwrap();
	let (addr, handle) = spawn_safe(&pki, &pki.issue(SAFE_ID).unwrap(), "200 OK", b"OK").await;
	let identity = client_identity(&pki);

	let body = send(&identity, safe_policy(), addr, Dispatch::Upsert(payload(false)))
		.await
		.unwrap();
	assert_eq!(body, b"OK");

	let seen = received(handle).await;
	assert!(seen.handshake_ok);
	let text = seen.text();
	assert!(text.starts_with("POST /sentinel/v1/secrets HTTP/1.1\r\n"), "{text}");
	assert!(text.to_ascii_lowercase().contains("content-type: application/json"));
	assert!(text.contains(r#""workloadId":"billing-api""#));
	assert!(text.contains(r#""value":"s3cr3t""#));
}

#[tokio::test]
async fn delete_sends_body_with_delete_method() {
	let pki = TestPki::new().unwrap();
	let (addr, handle) = spawn_safe(&pki, &pki.issue(SAFE_ID).unwrap(), "200 OK", b"OK").await;
	let identity = client_identity(&pki);

	send(&identity, safe_policy(), addr, Dispatch::Delete(payload(true)))
		.await
		.unwrap();

	let text = received(handle).await.text();
	assert!(text.starts_with("DELETE /sentinel/v1/secrets HTTP/1.1\r\n"), "{text}");
	assert!(text.contains(r#""workloadId":"billing-api""#));
	assert!(text.contains(r#""namespace":"default""#));
}

#[tokio::test]
async fn list_issues_get_without_body() {
	let pki = TestPki::new().unwrap();
	let listing = br#"{"secrets":[{"name":"billing-api"}]}"#;
	let (addr, handle) = spawn_safe(&pki, &pki.issue(SAFE_ID).unwrap(), "200 OK", listing).await;
	let identity = client_identity(&pki);

	let body = send(&identity, safe_policy(), addr, Dispatch::List)
		.await
		.unwrap();
	assert_eq!(body, listing);

	let text = received(handle).await.text();
	assert!(text.starts_with("GET /sentinel/v1/secrets HTTP/1.1\r\n"), "{text}");
	assert!(text.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn non_success_body_is_returned_verbatim() {
	let pki = TestPki::new().unwrap();
	let (addr, handle) = spawn_safe(
		&pki,
		&pki.issue(SAFE_ID).unwrap(),
		"400 Bad Request",
		b"workload not registered",
	)
	.await;
	let identity = client_identity(&pki);

	let body = send(&identity, safe_policy(), addr, Dispatch::Upsert(payload(false)))
		.await
		.unwrap();
	assert_eq!(body, b"workload not registered");
	received(handle).await;
}

#[tokio::test]
async fn binary_body_is_returned_byte_for_byte() {
	let pki = TestPki::new().unwrap();
	let ciphertext: &'static [u8] = b"ct:\xff\xfe\x80end";
	let (addr, handle) = spawn_safe(&pki, &pki.issue(SAFE_ID).unwrap(), "200 OK", ciphertext).await;
	let identity = client_identity(&pki);

	let body = send(&identity, safe_policy(), addr, Dispatch::List)
		.await
		.unwrap();
	assert_eq!(body, ciphertext);
	received(handle).await;
}

#[tokio::test]
async fn denied_peer_receives_no_request_bytes() {
	let pki = TestPki::new().unwrap();
	let (addr, handle) = spawn_safe(&pki, &pki.issue(SAFE_ID).unwrap(), "200 OK", b"OK").await;
	let identity = client_identity(&pki);

	let err = send(
		&identity,
		Arc::new(FixedPolicy::deny_all()),
		addr,
		Dispatch::Upsert(payload(false)),
	)
	.await
	.unwrap_err();
	assert!(
		matches!(err, TransportError::Unauthorized { ref peer } if peer == SAFE_ID),
		"{err:?}"
	);

	let seen = received(handle).await;
	assert!(!seen.handshake_ok);
	assert!(seen.bytes.is_empty());
}

#[tokio::test]
async fn impostor_outside_safe_prefix_is_refused() {
	let pki = TestPki::new().unwrap();
	let impostor = "spiffe://sentinel.local/workload/billing-api/ns/default/sa/billing/n/pod";
	let (addr, handle) = spawn_safe(&pki, &pki.issue(impostor).unwrap(), "200 OK", b"OK").await;
	let identity = client_identity(&pki);

	let err = send(&identity, safe_policy(), addr, Dispatch::Upsert(payload(false)))
		.await
		.unwrap_err();
	assert!(
		matches!(err, TransportError::Unauthorized { ref peer } if peer == impostor),
		"{err:?}"
	);
	assert!(received(handle).await.bytes.is_empty());
}

#[tokio::test]
async fn server_from_foreign_trust_domain_fails_as_transport_error() {
	let pki = TestPki::new().unwrap();
	let foreign = TestPki::new().unwrap();
	let server = foreign.issue(SAFE_ID).unwrap();
	let (addr, handle) = spawn_safe(&foreign, &server, "200 OK", b"OK").await;
	let identity = client_identity(&pki);

	let err = send(&identity, safe_policy(), addr, Dispatch::List).await.unwrap_err();
	assert!(matches!(err, TransportError::Request(_)), "{err:?}");
	assert!(received(handle).await.bytes.is_empty());
}

#[tokio::test]
async fn unreachable_safe_is_transport_error() {
	let pki = TestPki::new().unwrap();
	let addr = {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		listener.local_addr().unwrap()
	};
	let identity = client_identity(&pki);

	let err = send(&identity, safe_policy(), addr, Dispatch::List).await.unwrap_err();
	assert!(matches!(err, TransportError::Request(_)), "{err:?}");
}
