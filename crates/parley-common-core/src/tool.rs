// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// Tool catalog entry as presented to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
	pub name: String,
	pub description: String,
	pub input_schema: serde_json::Value,
}

impl ToolDefinition {
	pub fn new(
		name: impl Into<String>,
		description: impl Into<String>,
		input_schema: serde_json::Value,
	) -> Self {
		Self {
			name: name.into(),
			description: description.into(),
			input_schema,
		}
	}
}

/// Where tools run: the caller's project directory, if any.
#[derive(Clone, Debug, Default)]
pub struct ToolContext {
	project_dir: Option<PathBuf>,
}

impl ToolContext {
	pub fn new(project_dir: impl Into<PathBuf>) -> Self {
		let project_dir = project_dir.into();
		tracing::debug!(project_dir = %project_dir.display(), "creating tool context");
		Self {
			project_dir: Some(project_dir),
		}
	}

	/// No project supplied; tools fall back to the process directory.
	pub fn detached() -> Self {
		Self { project_dir: None }
	}

	pub fn project_dir(&self) -> Option<&Path> {
		self.project_dir.as_deref()
	}

	/// The project directory, or the process working directory as fallback.
	pub fn working_directory(&self) -> Result<PathBuf, ToolError> {
		match &self.project_dir {
			Some(dir) => Ok(dir.clone()),
			None => Ok(std::env::current_dir()?),
		}
	}
}
