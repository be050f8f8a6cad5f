// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret request resolution and encoding.
//!
//! Turns the primitive inputs of one command invocation into an immutable
//! [`SecretRequest`] plus the [`Operation`] it is dispatched with:
//!
//! - `backingStore`: `"file"` or `"memory"` verbatim, anything else falls back
//!   to the configured default
//! - `format`: `"json"` or `"yaml"` verbatim, anything else is JSON
//! - `namespace`: `"default"` when empty
//!
//! # Example
//!
//! ```
//! use sentinel_request::{resolve, BackingStore, Operation, RequestInputs, SecretFormat};
//!
//! let resolved = resolve(
//!     &RequestInputs {
//!         workload_id: "billing-api",
//!         value: "s3cr3t",
//!         ..Default::default()
//!     },
//!     BackingStore::File,
//! );
//!
//! assert_eq!(resolved.operation, Operation::Upsert);
//! assert_eq!(resolved.request.namespace(), "default");
//! assert_eq!(resolved.request.format(), SecretFormat::Json);
//! ```

mod error;
mod resolve;
mod types;

pub use error::{RequestError, RequestResult};
pub use resolve::{resolve, RequestInputs, ResolvedRequest, DEFAULT_NAMESPACE};
pub use types::{BackingStore, EncodedPayload, Operation, SecretFormat, SecretRequest};
