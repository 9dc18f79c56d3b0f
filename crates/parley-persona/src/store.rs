// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::PersonaError;
use crate::persona::{parse_persona, Persona};

/// Reads persona definitions (`*.md`) from a directory.
///
/// Definitions are re-read on every call so edits on disk show up without a
/// restart.
#[derive(Clone, Debug)]
pub struct PersonaStore {
	dir: PathBuf,
}

impl PersonaStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Every persona that parses, ordered by file name.
	///
	/// Unreadable or malformed files are skipped with a warning, as is any
	/// file repeating an id already loaded. A missing directory yields an
	/// empty list.
	pub async fn load_all(&self) -> Result<Vec<Persona>, PersonaError> {
		let mut read_dir = match tokio::fs::read_dir(&self.dir).await {
			Ok(read_dir) => read_dir,
			Err(e) if e.kind() == ErrorKind::NotFound => {
				tracing::debug!(dir = %self.dir.display(), "persona directory missing");
				return Ok(Vec::new());
			}
			Err(source) => {
				return Err(PersonaError::Io {
					path: self.dir.clone(),
					source,
				})
			}
		};

		let mut paths = Vec::new();
		while let Some(entry) = read_dir.next_entry().await.map_err(|source| PersonaError::Io {
			path: self.dir.clone(),
			source,
		})? {
			let path = entry.path();
			if path.extension().is_some_and(|ext| ext == "md") {
				paths.push(path);
			}
		}
		paths.sort();

		let mut seen = HashSet::new();
		let mut personas = Vec::with_capacity(paths.len());
		for path in paths {
			let source = match tokio::fs::read_to_string(&path).await {
				Ok(source) => source,
				Err(e) => {
					tracing::warn!(path = %path.display(), error = %e, "skipping unreadable persona file");
					continue;
				}
			};

			let persona = match parse_persona(&source) {
				Ok(persona) => persona,
				Err(e) => {
					tracing::warn!(path = %path.display(), error = %e, "skipping persona file");
					continue;
				}
			};

			if !seen.insert(persona.id.clone()) {
				tracing::warn!(path = %path.display(), id = %persona.id, "skipping duplicate persona id");
				continue;
			}
			personas.push(persona);
		}

		tracing::debug!(dir = %self.dir.display(), count = personas.len(), "loaded personas");
		Ok(personas)
	}

	pub async fn get_by_id(&self, id: &str) -> Result<Persona, PersonaError> {
		self.load_all()
			.await?
			.into_iter()
			.find(|persona| persona.id == id)
			.ok_or_else(|| PersonaError::NotFound(id.to_string()))
	}
}
