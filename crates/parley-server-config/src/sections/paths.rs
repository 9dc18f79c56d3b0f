// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server paths configuration section.

use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_PERSONAS_DIR: &str = ".bmad-core/agents";

/// `$XDG_DATA_HOME/parley` where the platform has one, else `./data`.
fn default_data_dir() -> PathBuf {
	dirs::data_dir()
		.map(|dir| dir.join("parley"))
		.unwrap_or_else(|| PathBuf::from("./data"))
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PathsConfigLayer {
	pub data_dir: Option<PathBuf>,
	pub personas_dir: Option<PathBuf>,
}

impl PathsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.data_dir.is_some() {
			self.data_dir = other.data_dir;
		}
		if other.personas_dir.is_some() {
			self.personas_dir = other.personas_dir;
		}
	}

	pub fn finalize(self) -> PathsConfig {
		PathsConfig {
			data_dir: self.data_dir.unwrap_or_else(default_data_dir),
			personas_dir: self
				.personas_dir
				.unwrap_or_else(|| PathBuf::from(DEFAULT_PERSONAS_DIR)),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathsConfig {
	/// Holds `projects.json`.
	pub data_dir: PathBuf,
	/// Persona definition files (`*.md`).
	pub personas_dir: PathBuf,
}

impl PathsConfig {
	pub fn projects_file(&self) -> PathBuf {
		self.data_dir.join("projects.json")
	}
}

impl Default for PathsConfig {
	fn default() -> Self {
		PathsConfigLayer::default().finalize()
	}
}
