// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Project CRUD handlers.

use std::path::{Path as FsPath, PathBuf};

use axum::{
	extract::{Path, State},
	Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{api::AppState, error::ServerError, project_store::Project};

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub path: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteProjectResponse {
	pub success: bool,
}

/// GET /api/projects
pub async fn list_projects(State(state): State<AppState>) -> Json<Vec<Project>> {
	Json(state.projects.list().await)
}

/// POST /api/projects - Creates the directory and a starter README when absent.
pub async fn create_project(
	State(state): State<AppState>,
	Json(request): Json<CreateProjectRequest>,
) -> Result<Json<Project>, ServerError> {
	let name = request.name.trim();
	let path = request.path.trim();
	if name.is_empty() || path.is_empty() {
		return Err(ServerError::BadRequest(
			"name and path must not be empty".to_string(),
		));
	}

	let path = PathBuf::from(path);
	scaffold(name, &path).await?;

	let project = state.projects.create(name, &path).await?;
	Ok(Json(project))
}

/// GET /api/projects/{id}
pub async fn get_project(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Project>, ServerError> {
	state
		.projects
		.get(&id)
		.await
		.map(Json)
		.ok_or_else(|| ServerError::NotFound(format!("Project not found: {id}")))
}

/// DELETE /api/projects/{id} - Forgets the record; the directory stays.
pub async fn delete_project(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<DeleteProjectResponse>, ServerError> {
	if !state.projects.delete(&id).await? {
		return Err(ServerError::NotFound(format!("Project not found: {id}")));
	}
	Ok(Json(DeleteProjectResponse { success: true }))
}

async fn scaffold(name: &str, path: &FsPath) -> Result<(), ServerError> {
	tokio::fs::create_dir_all(path).await.map_err(|e| {
		ServerError::BadRequest(format!("cannot create {}: {e}", path.display()))
	})?;

	let readme = path.join("README.md");
	if tokio::fs::try_exists(&readme).await.unwrap_or(false) {
		return Ok(());
	}

	tokio::fs::write(&readme, readme_template(name, path))
		.await
		.map_err(|e| ServerError::Internal(format!("failed to write {}: {e}", readme.display())))?;
	info!(path = %readme.display(), "wrote starter README");
	Ok(())
}

fn readme_template(name: &str, path: &FsPath) -> String {
	format!(
		"# {name}\n\n\
		 Project path: {}\n\n\
		 ## Description\n\n\
		 Describe the project here...\n\n\
		 ## Getting Started\n\n\
		 1. \n2. \n3. \n",
		path.display()
	)
}
