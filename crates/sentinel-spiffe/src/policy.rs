// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Peer authorization policies.
//!
//! A policy is consulted synchronously during the TLS handshake with the
//! SPIFFE ID the peer presented. Anything other than an explicit allow aborts
//! the handshake.

use std::fmt;

use crate::error::SpiffeIdError;
use crate::id::SpiffeId;

/// Outcome of evaluating a peer identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerDecision {
	Allow,
	Deny,
}

impl PeerDecision {
	pub fn is_allowed(self) -> bool {
		self == PeerDecision::Allow
	}
}

/// Decides whether a peer-presented identity may receive the request.
///
/// Implementations must be stateless and free of side effects beyond the
/// decision itself.
pub trait PeerPolicy: Send + Sync + fmt::Debug {
	fn evaluate(&self, peer_identity: &str) -> PeerDecision;
}

/// Allows only the safe service: a valid SPIFFE ID under a configured prefix.
///
/// The prefix is matched on whole path segments, so
/// `spiffe://sentinel.local/workload/sentinel-safe` admits
/// `.../sentinel-safe` and `.../sentinel-safe/n/0` but never
/// `.../sentinel-safe-evil`. A prefix ending in `/` admits children only.
#[derive(Debug, Clone)]
pub struct SafeServicePolicy {
	prefix: String,
	base: SpiffeId,
	children_only: bool,
}

impl SafeServicePolicy {
	/// Create a policy for the given SPIFFE ID prefix, e.g.
	/// `spiffe://sentinel.local/workload/sentinel-safe/ns/sentinel-system/sa/sentinel-safe/n/`.
	///
	/// The prefix must itself name a valid trust domain and path once any
	/// trailing slash is removed.
	pub fn new(prefix: impl Into<String>) -> Result<Self, SpiffeIdError> {
		let prefix = prefix.into();
		let base = SpiffeId::parse(prefix.trim_end_matches('/'))?;
		let children_only = prefix.ends_with('/');
		Ok(Self {
			prefix,
			base,
			children_only,
		})
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}
}

impl PeerPolicy for SafeServicePolicy {
	fn evaluate(&self, peer_identity: &str) -> PeerDecision {
		let id = match SpiffeId::parse(peer_identity) {
			Ok(id) if id.is_member_of(self.base.trust_domain()) => id,
			_ => return PeerDecision::Deny,
		};

		match id.path().strip_prefix(self.base.path()) {
			Some(rest) if rest.starts_with('/') => PeerDecision::Allow,
			Some("") if !self.children_only => PeerDecision::Allow,
			_ => PeerDecision::Deny,
		}
	}
}

/// A policy that returns the same decision for every peer.
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub PeerDecision);

impl FixedPolicy {
	pub fn allow_all() -> Self {
		Self(PeerDecision::Allow)
	}

	pub fn deny_all() -> Self {
		Self(PeerDecision::Deny)
	}
}

impl PeerPolicy for FixedPolicy {
	fn evaluate(&self, _peer_identity: &str) -> PeerDecision {
		self.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const PREFIX: &str =
		"spiffe://sentinel.local/workload/sentinel-safe/ns/sentinel-system/sa/sentinel-safe/n/";

	fn policy() -> SafeServicePolicy {
		SafeServicePolicy::new(PREFIX).unwrap()
	}

	#[test]
	fn allows_safe_service() {
		let peer = format!("{PREFIX}sentinel-safe-7d9f");
		assert_eq!(policy().evaluate(&peer), PeerDecision::Allow);
	}

	#[test]
	fn denies_other_workloads() {
		let peer = "spiffe://sentinel.local/workload/billing-api/ns/default/sa/billing/n/x";
		assert_eq!(policy().evaluate(peer), PeerDecision::Deny);
	}

	#[test]
	fn denies_other_trust_domain() {
		assert_eq!(
			policy().evaluate(
				"spiffe://evil.local/workload/sentinel-safe/ns/sentinel-system/sa/sentinel-safe/n/x"
			),
			PeerDecision::Deny
		);
	}

	#[test]
	fn denies_empty_and_malformed() {
		assert_eq!(policy().evaluate(""), PeerDecision::Deny);
		assert_eq!(policy().evaluate("not a spiffe id"), PeerDecision::Deny);
		let traversal = format!("{PREFIX}../../admin");
		assert_eq!(policy().evaluate(&traversal), PeerDecision::Deny);
	}

	#[test]
	fn prefix_matches_whole_segments() {
		let base = "spiffe://sentinel.local/workload/sentinel-safe";
		let policy = SafeServicePolicy::new(base).unwrap();

		assert!(policy.evaluate(base).is_allowed());
		assert!(policy.evaluate(&format!("{base}/n/safe-0")).is_allowed());
		assert!(!policy.evaluate(&format!("{base}-evil")).is_allowed());
		assert!(!policy.evaluate(&format!("{base}-evil/n/safe-0")).is_allowed());
	}

	#[test]
	fn trailing_slash_admits_children_only() {
		let policy = SafeServicePolicy::new("spiffe://sentinel.local/workload/sentinel-safe/")
			.unwrap();

		assert!(policy
			.evaluate("spiffe://sentinel.local/workload/sentinel-safe/n/safe-0")
			.is_allowed());
		assert!(!policy
			.evaluate("spiffe://sentinel.local/workload/sentinel-safe")
			.is_allowed());
		assert!(!policy
			.evaluate("spiffe://sentinel.local/workload/sentinel-safe-evil/n/safe-0")
			.is_allowed());
	}

	#[test]
	fn trust_domain_prefix_admits_any_member() {
		let policy = SafeServicePolicy::new("spiffe://sentinel.local/").unwrap();

		assert!(policy
			.evaluate("spiffe://sentinel.local/workload/sentinel-safe")
			.is_allowed());
		assert!(!policy.evaluate("spiffe://sentinel.local").is_allowed());
		assert!(!policy
			.evaluate("spiffe://sentinel.localhost/workload/sentinel-safe")
			.is_allowed());
	}

	#[test]
	fn rejects_invalid_prefix() {
		assert!(SafeServicePolicy::new("https://sentinel.local/").is_err());
		assert!(SafeServicePolicy::new("").is_err());
	}

	#[test]
	fn fixed_policies() {
		assert!(FixedPolicy::allow_all().evaluate("").is_allowed());
		assert!(!FixedPolicy::deny_all()
			.evaluate(&format!("{PREFIX}x"))
			.is_allowed());
	}
}
