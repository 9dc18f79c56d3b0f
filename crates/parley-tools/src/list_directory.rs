// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::io::ErrorKind;

use parley_common_core::{ToolContext, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::resolve;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListDirectoryArgs {
	pub directory_path: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
	File,
	Directory,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
	pub name: String,
	#[serde(rename = "type")]
	pub kind: EntryKind,
}

#[derive(Debug, Serialize)]
struct ListDirectoryResult {
	directory_path: String,
	entries: Vec<DirectoryEntry>,
}

pub(crate) async fn run(args: ListDirectoryArgs, ctx: &ToolContext) -> Result<Value, ToolError> {
	let path = resolve(&args.directory_path, ctx)?;

	tracing::debug!(path = %path.display(), "listing directory");

	let metadata = match tokio::fs::metadata(&path).await {
		Ok(metadata) => metadata,
		Err(e) if e.kind() == ErrorKind::NotFound => return Err(ToolError::NotFound(path)),
		Err(e) => return Err(e.into()),
	};
	if !metadata.is_dir() {
		return Err(ToolError::NotADirectory(path));
	}

	let mut entries = Vec::new();
	let mut read_dir = tokio::fs::read_dir(&path).await?;
	while let Some(entry) = read_dir.next_entry().await? {
		// Follow symlinks so a linked directory is reported as one.
		let is_dir = match tokio::fs::metadata(entry.path()).await {
			Ok(meta) => meta.is_dir(),
			Err(_) => entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false),
		};
		entries.push(DirectoryEntry {
			name: entry.file_name().to_string_lossy().into_owned(),
			kind: if is_dir {
				EntryKind::Directory
			} else {
				EntryKind::File
			},
		});
	}
	entries.sort_by(|a, b| a.name.cmp(&b.name));

	tracing::debug!(path = %path.display(), count = entries.len(), "listed directory");

	let result = ListDirectoryResult {
		directory_path: args.directory_path,
		entries,
	};
	serde_json::to_value(result).map_err(|e| ToolError::Serialization(e.to_string()))
}
