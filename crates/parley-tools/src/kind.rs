// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use parley_common_core::{ToolContext, ToolDefinition, ToolError};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::list_directory::{self, ListDirectoryArgs};
use crate::read_file::{self, ReadFileArgs};
use crate::working_directory;
use crate::write_file::{self, WriteFileArgs};

/// Every tool Parley knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
	WriteFile,
	ReadFile,
	ListDirectory,
	GetWorkingDirectory,
}

impl ToolKind {
	pub const ALL: [ToolKind; 4] = [
		ToolKind::WriteFile,
		ToolKind::ReadFile,
		ToolKind::ListDirectory,
		ToolKind::GetWorkingDirectory,
	];

	pub fn name(self) -> &'static str {
		match self {
			ToolKind::WriteFile => "write_file",
			ToolKind::ReadFile => "read_file",
			ToolKind::ListDirectory => "list_directory",
			ToolKind::GetWorkingDirectory => "get_working_directory",
		}
	}

	pub fn from_name(name: &str) -> Option<ToolKind> {
		Self::ALL.into_iter().find(|kind| kind.name() == name)
	}

	pub fn description(self) -> &'static str {
		match self {
			ToolKind::WriteFile => {
				"Write text content to a file in the project, creating parent directories \
				 and overwriting any existing file."
			}
			ToolKind::ReadFile => {
				"Read a text file from the project. Files larger than 500 KiB are rejected."
			}
			ToolKind::ListDirectory => {
				"List the immediate children of a directory, each tagged as file or directory."
			}
			ToolKind::GetWorkingDirectory => "Return the project's working directory path.",
		}
	}

	pub fn input_schema(self) -> Value {
		match self {
			ToolKind::WriteFile => json!({
				"type": "object",
				"properties": {
					"file_path": {
						"type": "string",
						"description": "File path, relative to the working directory or absolute"
					},
					"content": {
						"type": "string",
						"description": "Full text to write to the file"
					}
				},
				"required": ["file_path", "content"]
			}),
			ToolKind::ReadFile => json!({
				"type": "object",
				"properties": {
					"file_path": {
						"type": "string",
						"description": "File path, relative to the working directory or absolute"
					}
				},
				"required": ["file_path"]
			}),
			ToolKind::ListDirectory => json!({
				"type": "object",
				"properties": {
					"directory_path": {
						"type": "string",
						"description": "Directory path, relative to the working directory or absolute"
					}
				},
				"required": ["directory_path"]
			}),
			ToolKind::GetWorkingDirectory => json!({
				"type": "object",
				"properties": {},
				"required": []
			}),
		}
	}

	pub fn definition(self) -> ToolDefinition {
		ToolDefinition::new(self.name(), self.description(), self.input_schema())
	}
}

/// A validated tool call, ready to run.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolInvocation {
	WriteFile(WriteFileArgs),
	ReadFile(ReadFileArgs),
	ListDirectory(ListDirectoryArgs),
	GetWorkingDirectory,
}

impl ToolInvocation {
	/// Resolves the tool name and checks the input against its schema.
	pub fn parse(name: &str, input: Value) -> Result<Self, ToolError> {
		let kind = ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
		Ok(match kind {
			ToolKind::WriteFile => ToolInvocation::WriteFile(args(input)?),
			ToolKind::ReadFile => ToolInvocation::ReadFile(args(input)?),
			ToolKind::ListDirectory => ToolInvocation::ListDirectory(args(input)?),
			ToolKind::GetWorkingDirectory => ToolInvocation::GetWorkingDirectory,
		})
	}

	pub fn kind(&self) -> ToolKind {
		match self {
			ToolInvocation::WriteFile(_) => ToolKind::WriteFile,
			ToolInvocation::ReadFile(_) => ToolKind::ReadFile,
			ToolInvocation::ListDirectory(_) => ToolKind::ListDirectory,
			ToolInvocation::GetWorkingDirectory => ToolKind::GetWorkingDirectory,
		}
	}

	pub async fn execute(self, ctx: &ToolContext) -> Result<Value, ToolError> {
		match self {
			ToolInvocation::WriteFile(args) => write_file::run(args, ctx).await,
			ToolInvocation::ReadFile(args) => read_file::run(args, ctx).await,
			ToolInvocation::ListDirectory(args) => list_directory::run(args, ctx).await,
			ToolInvocation::GetWorkingDirectory => working_directory::run(ctx),
		}
	}
}

fn args<T: DeserializeOwned>(input: Value) -> Result<T, ToolError> {
	let input = if input.is_null() { json!({}) } else { input };
	serde_json::from_value(input).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}
