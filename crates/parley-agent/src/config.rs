// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::time::Duration;

/// Model round-trips allowed per chat request.
pub const MAX_TOOL_ITERATIONS: u32 = 5;

/// Reply used when the cap is hit before the model produced any text.
pub const INCOMPLETE_REPLY_MARKER: &str = "[incomplete: tool iteration limit reached]";

#[derive(Clone, Debug)]
pub struct LoopConfig {
	pub model: String,
	pub max_tokens: u32,
	pub max_iterations: u32,
	/// Deadline for the model and tool phase. Persistence is outside it.
	pub request_timeout: Option<Duration>,
}

impl LoopConfig {
	pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
		Self {
			model: model.into(),
			max_tokens,
			max_iterations: MAX_TOOL_ITERATIONS,
			request_timeout: None,
		}
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);
		self
	}
}
