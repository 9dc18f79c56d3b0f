// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use parley_common_core::{ToolContext, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::resolve;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WriteFileArgs {
	pub file_path: String,
	pub content: String,
}

#[derive(Debug, Serialize)]
struct WriteFileResult {
	success: bool,
	message: String,
	file_path: String,
	bytes_written: usize,
}

pub(crate) async fn run(args: WriteFileArgs, ctx: &ToolContext) -> Result<Value, ToolError> {
	let path = resolve(&args.file_path, ctx)?;

	tracing::debug!(path = %path.display(), len = args.content.len(), "writing file");

	if let Some(parent) = path.parent() {
		tokio::fs::create_dir_all(parent).await?;
	}
	tokio::fs::write(&path, args.content.as_bytes()).await?;

	let bytes_written = args.content.len();
	tracing::info!(path = %path.display(), bytes_written, "wrote file");

	let result = WriteFileResult {
		success: true,
		message: format!("Wrote {bytes_written} bytes to {}", args.file_path),
		file_path: args.file_path,
		bytes_written,
	};
	serde_json::to_value(result).map_err(|e| ToolError::Serialization(e.to_string()))
}
