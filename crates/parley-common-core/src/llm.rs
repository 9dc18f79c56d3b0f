// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Model-client boundary: requests, responses and streaming events.

use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use pin_project_lite::pin_project;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::message::{ContentBlock, Message, ToolCall};
use crate::tool::ToolDefinition;

/// One model round-trip: system instruction, ordered messages, optional tools.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmRequest {
	pub model: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub system: Option<String>,
	pub messages: Vec<Message>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tools: Vec<ToolDefinition>,
	pub max_tokens: u32,
	/// Project directory, for backends that run inside it.
	#[serde(skip)]
	pub working_directory: Option<PathBuf>,
}

impl LlmRequest {
	pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
		Self {
			model: model.into(),
			system: None,
			messages: Vec::new(),
			tools: Vec::new(),
			max_tokens,
			working_directory: None,
		}
	}

	pub fn with_system(mut self, system: impl Into<String>) -> Self {
		self.system = Some(system.into());
		self
	}

	pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
		self.messages = messages;
		self
	}

	pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
		self.tools = tools;
		self
	}

	pub fn with_working_directory(mut self, dir: Option<PathBuf>) -> Self {
		self.working_directory = dir;
		self
	}
}

/// Token counters reported by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
	pub input_tokens: u32,
	pub output_tokens: u32,
}

impl std::ops::AddAssign for Usage {
	fn add_assign(&mut self, rhs: Usage) {
		self.input_tokens = self.input_tokens.saturating_add(rhs.input_tokens);
		self.output_tokens = self.output_tokens.saturating_add(rhs.output_tokens);
	}
}

/// A complete model response: ordered text and tool-use blocks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
	pub content: Vec<ContentBlock>,
	pub usage: Usage,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stop_reason: Option<String>,
}

impl LlmResponse {
	pub fn text(&self) -> String {
		self.content
			.iter()
			.filter_map(|block| match block {
				ContentBlock::Text { text } => Some(text.as_str()),
				_ => None,
			})
			.collect()
	}

	/// Tool-use blocks in the order the model emitted them.
	pub fn tool_calls(&self) -> Vec<ToolCall> {
		self.content
			.iter()
			.filter_map(|block| match block {
				ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
					id: id.clone(),
					name: name.clone(),
					input: input.clone(),
				}),
				_ => None,
			})
			.collect()
	}

	pub fn has_tool_calls(&self) -> bool {
		self.content
			.iter()
			.any(|block| matches!(block, ContentBlock::ToolUse { .. }))
	}

}

/// Streaming events. A stream ends with exactly one `Completed` or `Error`.
#[derive(Clone, Debug)]
pub enum LlmEvent {
	TextDelta {
		content: String,
	},
	ToolCallDelta {
		call_id: String,
		tool_name: String,
		arguments_fragment: String,
	},
	Completed(LlmResponse),
	Error(LlmError),
}

pin_project! {
	/// Boxed stream of [`LlmEvent`]s returned by [`LlmClient::complete_streaming`].
	pub struct LlmStream {
		#[pin]
		inner: Pin<Box<dyn Stream<Item = LlmEvent> + Send>>,
	}
}

impl LlmStream {
	pub fn new(inner: Pin<Box<dyn Stream<Item = LlmEvent> + Send>>) -> Self {
		Self { inner }
	}

	/// A stream over already-known events.
	pub fn from_events(events: Vec<LlmEvent>) -> Self {
		Self::new(Box::pin(futures::stream::iter(events)))
	}

	pub async fn next(&mut self) -> Option<LlmEvent> {
		use futures::StreamExt;
		self.inner.next().await
	}
}

impl Stream for LlmStream {
	type Item = LlmEvent;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.project().inner.poll_next(cx)
	}
}

/// A language-model backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
	async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;

	async fn complete_streaming(&self, request: LlmRequest) -> Result<LlmStream, LlmError>;

	/// Whether responses can contain tool calls. Backends that return plain
	/// text are never offered tools.
	fn supports_tools(&self) -> bool {
		true
	}
}
