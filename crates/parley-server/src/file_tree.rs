// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Project file listing for the explorer UI.

use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use parley_tools::EntryKind;
use serde::Serialize;
use tracing::debug;

/// Deepest level whose directories still get their children listed.
pub const MAX_DEPTH: usize = 3;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileNode {
	pub name: String,
	#[serde(rename = "type")]
	pub kind: EntryKind,
	pub path: String,
	pub size: u64,
	pub modified: String,
	pub created: String,
	/// Present on directories only; empty unless listed recursively.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub children: Option<Vec<FileNode>>,
}

/// Lists `root` sorted by name. Unreadable directories list as empty.
///
/// Blocking; call from `spawn_blocking`.
pub fn build_tree(root: &Path, recursive: bool) -> Vec<FileNode> {
	walk(root, recursive, 0)
}

fn walk(dir: &Path, recursive: bool, depth: usize) -> Vec<FileNode> {
	let read = match std::fs::read_dir(dir) {
		Ok(read) => read,
		Err(e) => {
			debug!(path = %dir.display(), error = %e, "skipping unreadable directory");
			return Vec::new();
		}
	};

	let mut entries: Vec<_> = read.filter_map(Result::ok).collect();
	entries.sort_by_key(|e| e.file_name());

	entries
		.into_iter()
		.map(|entry| {
			let path = entry.path();
			let metadata = std::fs::metadata(&path).ok();
			let is_dir = metadata.as_ref().is_some_and(Metadata::is_dir);

			let children = is_dir.then(|| {
				if recursive && depth < MAX_DEPTH {
					walk(&path, recursive, depth + 1)
				} else {
					Vec::new()
				}
			});

			FileNode {
				name: entry.file_name().to_string_lossy().into_owned(),
				kind: if is_dir {
					EntryKind::Directory
				} else {
					EntryKind::File
				},
				path: path.to_string_lossy().into_owned(),
				size: metadata.as_ref().map_or(0, Metadata::len),
				modified: stamp(metadata.as_ref().and_then(|m| m.modified().ok())),
				created: stamp(
					metadata
						.as_ref()
						.and_then(|m| m.created().or_else(|_| m.modified()).ok()),
				),
				children,
			}
		})
		.collect()
}

fn stamp(time: Option<SystemTime>) -> String {
	time.map(|t| DateTime::<Local>::from(t).format(TIMESTAMP_FORMAT).to_string())
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn nested(depth: usize) -> TempDir {
		let dir = TempDir::new().unwrap();
		let mut path = dir.path().to_path_buf();
		for level in 0..depth {
			path = path.join(format!("d{level}"));
			std::fs::create_dir(&path).unwrap();
		}
		std::fs::write(dir.path().join("README.md"), "# Demo\n").unwrap();
		dir
	}

	#[test]
	fn flat_listing_sorted_with_metadata() {
		let dir = nested(1);
		let tree = build_tree(dir.path(), false);

		assert_eq!(tree.len(), 2);
		assert_eq!(tree[0].name, "README.md");
		assert_eq!(tree[0].kind, EntryKind::File);
		assert_eq!(tree[0].size, 7);
		assert!(tree[0].children.is_none());
		assert_eq!(tree[0].modified.len(), "2025-01-01 12:00".len());

		assert_eq!(tree[1].name, "d0");
		assert_eq!(tree[1].kind, EntryKind::Directory);
		assert_eq!(tree[1].children, Some(Vec::new()));
	}

	#[test]
	fn recursion_stops_at_max_depth() {
		let dir = nested(6);
		let tree = build_tree(dir.path(), true);

		let mut node = tree.iter().find(|n| n.name == "d0").unwrap();
		let mut levels = 1;
		while let Some(child) = node.children.as_ref().and_then(|c| c.first()) {
			node = child;
			levels += 1;
		}
		// d0..d2 are expanded; d3 is listed without children.
		assert_eq!(levels, MAX_DEPTH + 1);
		assert_eq!(node.children, Some(Vec::new()));
	}

	#[test]
	fn missing_root_is_empty() {
		let dir = TempDir::new().unwrap();
		assert!(build_tree(&dir.path().join("gone"), true).is_empty());
	}

	#[test]
	fn wire_shape() {
		let dir = nested(1);
		let json = serde_json::to_value(build_tree(dir.path(), false)).unwrap();
		assert_eq!(json[0]["type"], "file");
		assert!(json[0].get("children").is_none());
		assert_eq!(json[1]["type"], "directory");
		assert_eq!(json[1]["children"], serde_json::json!([]));
	}
}
