// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use parley_common_core::{ChatError, StoreError, ToolError};
use parley_persona::PersonaError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// Missing or malformed request fields.
	#[error("Invalid request: {0}")]
	BadRequest(String),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Too large: {0}")]
	PayloadTooLarge(String),

	/// The model backend failed.
	#[error("Upstream error: {0}")]
	UpstreamError(String),

	#[error("Upstream timeout: {0}")]
	UpstreamTimeout(String),

	#[error("Store error: {0}")]
	Store(#[from] StoreError),

	#[error("Internal error: {0}")]
	Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl ServerError {
	/// Status, machine-readable code and the summary shown to clients.
	pub fn parts(&self) -> (StatusCode, &'static str, String) {
		match self {
			ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
			ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
			ServerError::PayloadTooLarge(msg) => {
				(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg.clone())
			}
			ServerError::UpstreamError(msg) => (StatusCode::BAD_GATEWAY, "upstream_error", msg.clone()),
			ServerError::UpstreamTimeout(msg) => {
				(StatusCode::GATEWAY_TIMEOUT, "upstream_timeout", msg.clone())
			}
			ServerError::Store(_) => (
				StatusCode::INTERNAL_SERVER_ERROR,
				"store_error",
				"Failed to save project data".to_string(),
			),
			ServerError::Internal(_) => (
				StatusCode::INTERNAL_SERVER_ERROR,
				"internal_error",
				"An internal error occurred".to_string(),
			),
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		match &self {
			ServerError::Store(e) => tracing::error!(error = %e, "store error"),
			ServerError::Internal(msg) => tracing::error!(error = %msg, "internal error"),
			ServerError::UpstreamError(msg) => tracing::warn!(error = %msg, "upstream error"),
			ServerError::UpstreamTimeout(msg) => tracing::warn!(error = %msg, "upstream timeout"),
			_ => {}
		}

		let (status, error, message) = self.parts();
		(
			status,
			Json(ErrorResponse {
				error: error.to_string(),
				message,
			}),
		)
			.into_response()
	}
}

impl From<ChatError> for ServerError {
	fn from(err: ChatError) -> Self {
		match err {
			ChatError::Validation(msg) => ServerError::BadRequest(msg),
			ChatError::NotFound(msg) => ServerError::NotFound(msg),
			ChatError::Transport(e) => ServerError::UpstreamError(e.to_string()),
			ChatError::Timeout(msg) => ServerError::UpstreamTimeout(msg),
			ChatError::Store(e) => ServerError::Store(e),
		}
	}
}

impl From<PersonaError> for ServerError {
	fn from(err: PersonaError) -> Self {
		match err {
			PersonaError::NotFound(id) => ServerError::NotFound(format!("Agent not found: {id}")),
			other => ServerError::Internal(other.to_string()),
		}
	}
}

/// Maps `read_file` failures on the file-content route.
impl From<ToolError> for ServerError {
	fn from(err: ToolError) -> Self {
		match err {
			ToolError::PathTraversal(_)
			| ToolError::IsDirectory(_)
			| ToolError::NotADirectory(_)
			| ToolError::NotText(_)
			| ToolError::InvalidArguments(_) => ServerError::BadRequest(err.to_string()),
			ToolError::NotFound(_) => ServerError::NotFound(err.to_string()),
			ToolError::TooLarge { .. } => ServerError::PayloadTooLarge(err.to_string()),
			ToolError::UnknownTool(_) | ToolError::Io(_) | ToolError::Serialization(_) => {
				ServerError::Internal(err.to_string())
			}
		}
	}
}
