// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersonaError {
	#[error("persona not found: {0}")]
	NotFound(String),

	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("no ```yaml block found")]
	MissingBlock,

	#[error("invalid persona YAML: {0}")]
	InvalidYaml(String),

	#[error("persona has no agent.id")]
	MissingId,
}
