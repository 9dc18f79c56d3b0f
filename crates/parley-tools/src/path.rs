// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::{Path, PathBuf};

use parley_common_core::{ToolContext, ToolError};

/// Resolves a model-supplied path against the tool context.
///
/// Any path containing `..` is refused before the filesystem is touched.
/// Relative paths join the working directory; absolute paths are used as-is.
pub(crate) fn resolve(raw: &str, ctx: &ToolContext) -> Result<PathBuf, ToolError> {
	if raw.contains("..") {
		tracing::warn!(path = %raw, "rejected path with parent-directory component");
		return Err(ToolError::PathTraversal(raw.to_string()));
	}

	let path = Path::new(raw);
	if path.is_absolute() {
		Ok(path.to_path_buf())
	} else {
		Ok(ctx.working_directory()?.join(path))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn relative_paths_join_project_dir() {
		let ctx = ToolContext::new("/srv/projects/demo");
		assert_eq!(
			resolve("docs/prd.md", &ctx).unwrap(),
			PathBuf::from("/srv/projects/demo/docs/prd.md")
		);
	}

	#[test]
	fn absolute_paths_pass_through() {
		let ctx = ToolContext::new("/srv/projects/demo");
		assert_eq!(
			resolve("/etc/hostname", &ctx).unwrap(),
			PathBuf::from("/etc/hostname")
		);
	}

	#[test]
	fn any_double_dot_is_refused() {
		let ctx = ToolContext::new("/srv/projects/demo");
		for raw in ["../secret", "a/../b", "notes..txt", "/abs/.."] {
			assert!(matches!(
				resolve(raw, &ctx),
				Err(ToolError::PathTraversal(_))
			));
		}
	}

	proptest! {
		#[test]
		fn traversal_rejected_wherever_it_appears(prefix in "[a-z/]{0,12}", suffix in "[a-z/]{0,12}") {
			let ctx = ToolContext::new("/srv/projects/demo");
			let raw = format!("{prefix}..{suffix}");
			prop_assert!(matches!(resolve(&raw, &ctx), Err(ToolError::PathTraversal(_))));
		}
	}
}
