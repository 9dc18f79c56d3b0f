// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! JSON-file project store.
//!
//! The whole collection lives in memory behind one mutex and every mutation
//! rewrites the file atomically (temp file, then rename). Holding the lock
//! across the write serializes concurrent chats on the same project.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parley_common_core::{ConversationEntry, ConversationStore, StoreError};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
	pub id: String,
	pub name: String,
	pub path: PathBuf,
	#[serde(default)]
	pub conversations: Vec<ConversationEntry>,
}

pub struct ProjectStore {
	file: PathBuf,
	projects: Mutex<Vec<Project>>,
}

impl ProjectStore {
	/// Loads `file` if it exists; otherwise starts empty. Nothing is written
	/// until the first mutation.
	pub async fn open(file: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let file = file.into();
		let projects = match tokio::fs::read(&file).await {
			Ok(bytes) => serde_json::from_slice(&bytes)?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
			Err(e) => return Err(e.into()),
		};
		info!(path = %file.display(), count = projects.len(), "project store opened");
		Ok(Self {
			file,
			projects: Mutex::new(projects),
		})
	}

	pub fn file(&self) -> &Path {
		&self.file
	}

	pub async fn list(&self) -> Vec<Project> {
		self.projects.lock().await.clone()
	}

	pub async fn get(&self, id: &str) -> Option<Project> {
		self.projects.lock().await.iter().find(|p| p.id == id).cloned()
	}

	#[instrument(skip(self, path), fields(path = %path.display()))]
	pub async fn create(&self, name: &str, path: &Path) -> Result<Project, StoreError> {
		let project = Project {
			id: uuid::Uuid::new_v4().to_string(),
			name: name.to_string(),
			path: path.to_path_buf(),
			conversations: Vec::new(),
		};

		let mut guard = self.projects.lock().await;
		let mut next = guard.clone();
		next.push(project.clone());
		self.persist(&next).await?;
		*guard = next;

		info!(project_id = %project.id, "project created");
		Ok(project)
	}

	/// Returns false when no project had `id`.
	pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
		let mut guard = self.projects.lock().await;
		if !guard.iter().any(|p| p.id == id) {
			return Ok(false);
		}
		let next: Vec<Project> = guard.iter().filter(|p| p.id != id).cloned().collect();
		self.persist(&next).await?;
		*guard = next;

		info!(project_id = %id, "project deleted");
		Ok(true)
	}

	async fn persist(&self, projects: &[Project]) -> Result<(), StoreError> {
		if let Some(parent) = self.file.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent).await?;
		}

		let json = serde_json::to_vec_pretty(projects)?;
		let tmp = self.file.with_extension("json.tmp");
		tokio::fs::write(&tmp, &json).await?;
		tokio::fs::rename(&tmp, &self.file).await?;

		debug!(path = %self.file.display(), bytes = json.len(), "project store written");
		Ok(())
	}
}

#[async_trait]
impl ConversationStore for ProjectStore {
	async fn append_conversation(
		&self,
		project_id: &str,
		entries: Vec<ConversationEntry>,
	) -> Result<(), StoreError> {
		let mut guard = self.projects.lock().await;
		let mut next = guard.clone();
		let project = next
			.iter_mut()
			.find(|p| p.id == project_id)
			.ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))?;
		let added = entries.len();
		project.conversations.extend(entries);

		self.persist(&next).await?;
		*guard = next;

		debug!(project_id, added, "conversation appended");
		Ok(())
	}
}
