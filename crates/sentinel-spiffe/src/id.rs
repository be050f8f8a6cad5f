// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SPIFFE ID parsing.
//!
//! A SPIFFE ID has the form `spiffe://{trust-domain}/{path}`. Trust domains are
//! lowercase letters, digits, `-`, `.` and `_`; path segments are non-empty,
//! never `.` or `..`, and use letters, digits, `-`, `.` and `_`.

use std::fmt;
use std::str::FromStr;

use crate::error::SpiffeIdError;

const SCHEME: &str = "spiffe://";

/// Maximum length of a SPIFFE ID in bytes.
pub const MAX_SPIFFE_ID_LEN: usize = 2048;

/// A validated SPIFFE ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpiffeId {
	trust_domain: String,
	path: String,
}

impl SpiffeId {
	/// Parse and validate a SPIFFE ID string.
	pub fn parse(id: &str) -> Result<Self, SpiffeIdError> {
		if id.is_empty() {
			return Err(SpiffeIdError::Empty);
		}
		if id.len() > MAX_SPIFFE_ID_LEN {
			return Err(SpiffeIdError::TooLong {
				max: MAX_SPIFFE_ID_LEN,
			});
		}

		let rest = id.strip_prefix(SCHEME).ok_or(SpiffeIdError::MissingScheme)?;
		let (trust_domain, path) = match rest.find('/') {
			Some(idx) => rest.split_at(idx),
			None => (rest, ""),
		};

		if trust_domain.is_empty() {
			return Err(SpiffeIdError::EmptyTrustDomain);
		}
		if let Some(c) = trust_domain.chars().find(|c| !is_trust_domain_char(*c)) {
			return Err(SpiffeIdError::InvalidTrustDomainChar(c));
		}
		validate_path(path)?;

		Ok(Self {
			trust_domain: trust_domain.to_string(),
			path: path.to_string(),
		})
	}

	/// The trust domain, e.g. `example.org`.
	pub fn trust_domain(&self) -> &str {
		&self.trust_domain
	}

	/// The path including its leading slash, or empty for a trust domain ID.
	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn is_member_of(&self, trust_domain: &str) -> bool {
		self.trust_domain == trust_domain
	}
}

impl fmt::Display for SpiffeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{SCHEME}{}{}", self.trust_domain, self.path)
	}
}

impl FromStr for SpiffeId {
	type Err = SpiffeIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

fn validate_path(path: &str) -> Result<(), SpiffeIdError> {
	let Some(segments) = path.strip_prefix('/') else {
		return Ok(());
	};
	if segments.is_empty() || segments.ends_with('/') {
		return Err(SpiffeIdError::TrailingSlash);
	}

	for segment in segments.split('/') {
		if segment.is_empty() {
			return Err(SpiffeIdError::EmptySegment);
		}
		if segment == "." || segment == ".." {
			return Err(SpiffeIdError::DotSegment);
		}
		if let Some(c) = segment.chars().find(|c| !is_path_char(*c)) {
			return Err(SpiffeIdError::InvalidPathChar(c));
		}
	}
	Ok(())
}

fn is_trust_domain_char(c: char) -> bool {
	c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_')
}

fn is_path_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')
}
