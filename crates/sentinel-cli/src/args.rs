// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use clap::Parser;
use sentinel_request::RequestInputs;

use crate::orchestrator::Invocation;

#[derive(Parser, Debug)]
#[command(
	name = "sentinel",
	version,
	about = "Submit, update or delete workload secrets in the sentinel safe",
	long_about = None
)]
pub struct Args {
	/// List the secrets registered in the safe
	#[arg(short, long)]
	pub list: bool,

	/// Also mirror the secret into a Kubernetes Secret
	#[arg(short = 'k', long = "use-k8s")]
	pub use_k8s: bool,

	/// Delete the workload's secret
	#[arg(short, long)]
	pub delete: bool,

	/// Append to the existing secret instead of replacing it
	#[arg(short, long)]
	pub append: bool,

	/// Namespace of the workload
	#[arg(short, long, default_value = "default")]
	pub namespace: String,

	/// Backing store: file or memory
	#[arg(short = 'b', long = "store", value_name = "STORE")]
	pub store: Option<String>,

	/// Workload name
	#[arg(short, long)]
	pub workload: Option<String>,

	/// Secret value
	#[arg(short, long)]
	pub secret: Option<String>,

	/// Template applied to the secret by the safe
	#[arg(short, long)]
	pub template: Option<String>,

	/// Output format of the templated secret: json or yaml
	#[arg(short, long)]
	pub format: Option<String>,

	/// Encrypt the value; without a workload, only return the ciphertext
	#[arg(short, long)]
	pub encrypt: bool,

	/// Log filter, e.g. "debug" or "sentinel_transport=trace"
	#[arg(long, value_name = "FILTER")]
	pub log_level: Option<String>,

	/// Emit logs as JSON
	#[arg(long)]
	pub json_logs: bool,
}

impl Args {
	pub fn invocation(&self) -> Invocation<'_> {
		Invocation {
			list: self.list,
			request: RequestInputs {
				workload_id: self.workload.as_deref().unwrap_or_default(),
				value: self.secret.as_deref().unwrap_or_default(),
				namespace: &self.namespace,
				backing_store: self.store.as_deref().unwrap_or_default(),
				use_kubernetes: self.use_k8s,
				template: self.template.as_deref().unwrap_or_default(),
				format: self.format.as_deref().unwrap_or_default(),
				encrypt: self.encrypt,
				delete: self.delete,
				append: self.append,
			},
		}
	}
}
