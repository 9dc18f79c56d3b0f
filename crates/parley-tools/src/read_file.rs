// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::io::ErrorKind;

use parley_common_core::{ToolContext, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::resolve;

/// Largest file `read_file` will return.
pub const MAX_READ_BYTES: u64 = 500 * 1024;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ReadFileArgs {
	pub file_path: String,
}

#[derive(Debug, Serialize)]
struct ReadFileResult {
	file_path: String,
	content: String,
	size: u64,
}

pub(crate) async fn run(args: ReadFileArgs, ctx: &ToolContext) -> Result<Value, ToolError> {
	let path = resolve(&args.file_path, ctx)?;

	tracing::debug!(path = %path.display(), "reading file");

	let metadata = match tokio::fs::metadata(&path).await {
		Ok(metadata) => metadata,
		Err(e) if e.kind() == ErrorKind::NotFound => return Err(ToolError::NotFound(path)),
		Err(e) => return Err(e.into()),
	};

	if metadata.is_dir() {
		return Err(ToolError::IsDirectory(path));
	}
	if !metadata.is_file() {
		return Err(ToolError::InvalidArguments(format!(
			"not a regular file: {}",
			path.display()
		)));
	}

	let size = metadata.len();
	if size > MAX_READ_BYTES {
		tracing::debug!(path = %path.display(), size, limit = MAX_READ_BYTES, "file too large");
		return Err(ToolError::TooLarge {
			path,
			size,
			limit: MAX_READ_BYTES,
		});
	}

	let bytes = tokio::fs::read(&path).await?;
	let content = String::from_utf8(bytes).map_err(|_| ToolError::NotText(path.clone()))?;

	tracing::debug!(path = %path.display(), size, "read file");

	let result = ReadFileResult {
		file_path: args.file_path,
		content,
		size,
	};
	serde_json::to_value(result).map_err(|e| ToolError::Serialization(e.to_string()))
}
