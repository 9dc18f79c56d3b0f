// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use parley_common_core::{ToolContext, ToolError};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct WorkingDirectoryResult {
	working_directory: String,
}

pub(crate) fn run(ctx: &ToolContext) -> Result<Value, ToolError> {
	let dir = ctx.working_directory()?;
	tracing::debug!(working_directory = %dir.display(), "reporting working directory");

	let result = WorkingDirectoryResult {
		working_directory: dir.display().to_string(),
	};
	serde_json::to_value(result).map_err(|e| ToolError::Serialization(e.to_string()))
}
