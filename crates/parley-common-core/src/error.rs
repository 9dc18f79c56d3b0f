// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while talking to a language-model backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LlmError {
	#[error("HTTP error: {0}")]
	Http(String),

	#[error("API error: {0}")]
	Api(String),

	#[error("request timed out")]
	Timeout,

	#[error("invalid response: {0}")]
	InvalidResponse(String),

	#[error("rate limited, retry after {retry_after_secs:?} seconds")]
	RateLimited { retry_after_secs: Option<u64> },
}

/// Reasons a single tool call failed.
///
/// The `Display` text is what the model sees in the `{"error": ...}` payload,
/// so it stays short and free of internal detail.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ToolError {
	#[error("invalid path (parent-directory traversal is not allowed): {0}")]
	PathTraversal(String),

	#[error("not found: {}", .0.display())]
	NotFound(PathBuf),

	#[error("is a directory: {}", .0.display())]
	IsDirectory(PathBuf),

	#[error("not a directory: {}", .0.display())]
	NotADirectory(PathBuf),

	#[error("too large: {} is {size} bytes (limit {limit} bytes)", .path.display())]
	TooLarge {
		path: PathBuf,
		size: u64,
		limit: u64,
	},

	#[error("not a UTF-8 text file: {}", .0.display())]
	NotText(PathBuf),

	#[error("invalid arguments: {0}")]
	InvalidArguments(String),

	#[error("unknown tool")]
	UnknownTool(String),

	#[error("I/O error: {0}")]
	Io(String),

	#[error("serialization error: {0}")]
	Serialization(String),
}

impl From<std::io::Error> for ToolError {
	fn from(err: std::io::Error) -> Self {
		ToolError::Io(err.to_string())
	}
}

/// Errors from the conversation store.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("project not found: {0}")]
	ProjectNotFound(String),
}

/// Request-level failure of a chat exchange.
///
/// Tool failures never appear here; they are fed back to the model as
/// tool results.
#[derive(Debug, Error)]
pub enum ChatError {
	#[error("invalid request: {0}")]
	Validation(String),

	#[error("{0}")]
	NotFound(String),

	#[error("model backend error: {0}")]
	Transport(LlmError),

	#[error("timed out: {0}")]
	Timeout(String),

	#[error("store error: {0}")]
	Store(#[from] StoreError),
}

impl From<LlmError> for ChatError {
	fn from(err: LlmError) -> Self {
		match err {
			LlmError::Timeout => ChatError::Timeout("model request timed out".to_string()),
			other => ChatError::Transport(other),
		}
	}
}

pub type ChatResult<T> = Result<T, ChatError>;
