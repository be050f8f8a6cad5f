// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SPIFFE identity handling for sentinel.
//!
//! This crate provides the two leaf capabilities the command needs before it
//! is allowed to talk to the network:
//!
//! - **Identity acquisition**: load an X.509 SVID, its private key and the trust
//!   bundle from the node-local workload identity helper, bounded by a deadline
//!   and a cancellation token ([`acquire`], [`IdentitySource`]).
//! - **Peer authorization**: decide whether a peer-presented SPIFFE ID is the
//!   safe service ([`PeerPolicy`], [`SafeServicePolicy`]).
//!
//! # Security Design
//!
//! - Private key material lives in zeroizing buffers and is wiped when the
//!   [`X509Identity`] is closed or dropped
//! - Policies are fail-closed: empty or unparseable identities are denied
//! - `Debug` output of identities never includes key material

mod error;
pub mod id;
pub mod policy;
pub mod source;
pub mod svid;

pub use error::{IdentityError, IdentityResult, SpiffeIdError};
pub use id::SpiffeId;
pub use policy::{FixedPolicy, PeerDecision, PeerPolicy, SafeServicePolicy};
pub use source::{
	acquire, IdentitySource, PemDirectorySource, BUNDLE_FILE_NAME, KEY_FILE_NAME, SVID_FILE_NAME,
};
pub use svid::{peer_uri_sans, X509Identity};
