// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Anthropic Messages API implementation of [`parley_common_core::LlmClient`].
//!
//! Supports blocking and SSE streaming completions, tool use, and retries
//! transient failures through `parley_common_http::retry`.

mod client;
mod stream;
mod types;

pub use client::AnthropicClient;
pub use types::{
	AnthropicConfig, AnthropicContent, AnthropicMessage, AnthropicMessageContent, AnthropicRequest,
	AnthropicResponse, AnthropicTool, DEFAULT_BASE_URL,
};
