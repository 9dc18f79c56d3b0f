// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Wire types for the Messages API and conversions to the core types.

use std::time::Duration;

use parley_common_core::{
	ContentBlock, LlmRequest, LlmResponse, Message, MessageContent, Usage,
};
use parley_common_secret::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

#[derive(Clone, Debug)]
pub struct AnthropicConfig {
	pub api_key: SecretString,
	pub base_url: String,
	/// Per-attempt HTTP timeout.
	pub timeout: Duration,
}

impl AnthropicConfig {
	pub fn new(api_key: SecretString) -> Self {
		Self {
			api_key,
			base_url: DEFAULT_BASE_URL.to_string(),
			timeout: Duration::from_secs(300),
		}
	}

	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into().trim_end_matches('/').to_string();
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct AnthropicRequest {
	pub model: String,
	pub messages: Vec<AnthropicMessage>,
	pub max_tokens: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub system: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tools: Option<Vec<AnthropicTool>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stream: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessage {
	pub role: String,
	pub content: AnthropicMessageContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnthropicMessageContent {
	Text(String),
	Blocks(Vec<AnthropicContent>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicContent {
	Text {
		text: String,
	},
	ToolUse {
		id: String,
		name: String,
		input: serde_json::Value,
	},
	ToolResult {
		tool_use_id: String,
		content: String,
		#[serde(skip_serializing_if = "Option::is_none")]
		is_error: Option<bool>,
	},
	/// Block types this client does not model, such as `thinking`.
	#[serde(other)]
	Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnthropicTool {
	pub name: String,
	pub description: String,
	pub input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicResponse {
	pub id: String,
	pub model: String,
	pub content: Vec<AnthropicContent>,
	pub stop_reason: Option<String>,
	pub usage: AnthropicUsage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicUsage {
	pub input_tokens: u32,
	pub output_tokens: u32,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicError {
	pub error: AnthropicErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicErrorDetail {
	#[serde(rename = "type")]
	pub error_type: String,
	pub message: String,
}

impl From<&ContentBlock> for AnthropicContent {
	fn from(block: &ContentBlock) -> Self {
		match block {
			ContentBlock::Text { text } => AnthropicContent::Text { text: text.clone() },
			ContentBlock::ToolUse { id, name, input } => AnthropicContent::ToolUse {
				id: id.clone(),
				name: name.clone(),
				input: input.clone(),
			},
			ContentBlock::ToolResult {
				tool_use_id,
				content,
				is_error,
			} => AnthropicContent::ToolResult {
				tool_use_id: tool_use_id.clone(),
				content: content.clone(),
				is_error: is_error.then_some(true),
			},
		}
	}
}

impl From<&Message> for AnthropicMessage {
	fn from(msg: &Message) -> Self {
		let content = match &msg.content {
			MessageContent::Text(text) => AnthropicMessageContent::Text(text.clone()),
			MessageContent::Blocks(blocks) => {
				AnthropicMessageContent::Blocks(blocks.iter().map(AnthropicContent::from).collect())
			}
		};
		Self {
			role: msg.role.as_str().to_string(),
			content,
		}
	}
}

impl From<&LlmRequest> for AnthropicRequest {
	fn from(req: &LlmRequest) -> Self {
		let tools = if req.tools.is_empty() {
			None
		} else {
			Some(
				req.tools
					.iter()
					.map(|t| AnthropicTool {
						name: t.name.clone(),
						description: t.description.clone(),
						input_schema: t.input_schema.clone(),
					})
					.collect(),
			)
		};

		AnthropicRequest {
			model: req.model.clone(),
			messages: req.messages.iter().map(AnthropicMessage::from).collect(),
			max_tokens: req.max_tokens,
			system: req.system.clone(),
			tools,
			stream: None,
		}
	}
}

impl From<AnthropicResponse> for LlmResponse {
	fn from(resp: AnthropicResponse) -> Self {
		let content = resp
			.content
			.into_iter()
			.filter_map(|block| match block {
				AnthropicContent::Text { text } => Some(ContentBlock::Text { text }),
				AnthropicContent::ToolUse { id, name, input } => {
					Some(ContentBlock::ToolUse { id, name, input })
				}
				// Never sent by the API in responses.
				AnthropicContent::ToolResult { .. } => None,
				AnthropicContent::Unknown => {
					debug!("dropping unsupported content block");
					None
				}
			})
			.collect();

		LlmResponse {
			content,
			usage: Usage {
				input_tokens: resp.usage.input_tokens,
				output_tokens: resp.usage.output_tokens,
			},
			stop_reason: resp.stop_reason,
		}
	}
}
