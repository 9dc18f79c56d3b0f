// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Project file browsing handlers.

use axum::{
	extract::{Path, Query, State},
	Json,
};
use parley_common_core::ToolContext;
use parley_tools::{ReadFileArgs, ToolInvocation};
use serde::{Deserialize, Serialize};

use crate::{
	api::AppState,
	error::ServerError,
	file_tree::{build_tree, FileNode},
	project_store::Project,
};

#[derive(Debug, Default, Deserialize)]
pub struct FilesQuery {
	#[serde(default)]
	pub recursive: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
	#[serde(default)]
	pub path: String,
}

#[derive(Debug, Serialize)]
pub struct FileContentResponse {
	pub content: String,
	pub size: u64,
}

async fn project(state: &AppState, id: &str) -> Result<Project, ServerError> {
	state
		.projects
		.get(id)
		.await
		.ok_or_else(|| ServerError::NotFound(format!("Project not found: {id}")))
}

/// GET /api/projects/{id}/files?recursive=true
pub async fn list_files(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Query(query): Query<FilesQuery>,
) -> Result<Json<Vec<FileNode>>, ServerError> {
	let project = project(&state, &id).await?;
	let recursive = query
		.recursive
		.is_some_and(|v| v.eq_ignore_ascii_case("true"));

	let root = project.path;
	let tree = tokio::task::spawn_blocking(move || build_tree(&root, recursive))
		.await
		.map_err(|e| ServerError::Internal(format!("file tree task failed: {e}")))?;
	Ok(Json(tree))
}

/// GET /api/projects/{id}/files/content?path=<relative path>
pub async fn file_content(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Query(query): Query<ContentQuery>,
) -> Result<Json<FileContentResponse>, ServerError> {
	if query.path.trim().is_empty() {
		return Err(ServerError::BadRequest("path is required".to_string()));
	}
	let project = project(&state, &id).await?;

	let value = ToolInvocation::ReadFile(ReadFileArgs {
		file_path: query.path,
	})
	.execute(&ToolContext::new(project.path))
	.await?;

	let content = value["content"].as_str().unwrap_or_default().to_string();
	let size = value["size"].as_u64().unwrap_or(content.len() as u64);
	Ok(Json(FileContentResponse { content, size }))
}
