// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Transcript messages exchanged with the model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Assistant,
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::User => "user",
			Role::Assistant => "assistant",
		}
	}

	/// Parses `user` / `assistant`; anything else is rejected.
	pub fn parse(s: &str) -> Option<Role> {
		match s {
			"user" => Some(Role::User),
			"assistant" => Some(Role::Assistant),
			_ => None,
		}
	}
}

impl std::fmt::Display for Role {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A model-issued request to run a named tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
	pub id: String,
	pub name: String,
	pub input: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
	Text {
		text: String,
	},
	ToolUse {
		id: String,
		name: String,
		input: Value,
	},
	ToolResult {
		tool_use_id: String,
		content: String,
		#[serde(default, skip_serializing_if = "std::ops::Not::not")]
		is_error: bool,
	},
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
	Text(String),
	Blocks(Vec<ContentBlock>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
	pub role: Role,
	pub content: MessageContent,
}

impl Message {
	pub fn user(text: impl Into<String>) -> Self {
		Self {
			role: Role::User,
			content: MessageContent::Text(text.into()),
		}
	}

	pub fn assistant(text: impl Into<String>) -> Self {
		Self {
			role: Role::Assistant,
			content: MessageContent::Text(text.into()),
		}
	}

	pub fn text(role: Role, text: impl Into<String>) -> Self {
		Self {
			role,
			content: MessageContent::Text(text.into()),
		}
	}

	/// Assistant entry recording one tool call.
	pub fn tool_use(call: &ToolCall) -> Self {
		Self {
			role: Role::Assistant,
			content: MessageContent::Blocks(vec![ContentBlock::ToolUse {
				id: call.id.clone(),
				name: call.name.clone(),
				input: call.input.clone(),
			}]),
		}
	}

	/// User entry carrying a serialized tool result for `tool_use_id`.
	pub fn tool_result(tool_use_id: impl Into<String>, payload: &Value, is_error: bool) -> Self {
		Self {
			role: Role::User,
			content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
				tool_use_id: tool_use_id.into(),
				content: payload.to_string(),
				is_error,
			}]),
		}
	}

	/// Concatenated text blocks, in order. Tool blocks contribute nothing.
	pub fn plain_text(&self) -> String {
		match &self.content {
			MessageContent::Text(text) => text.clone(),
			MessageContent::Blocks(blocks) => blocks
				.iter()
				.filter_map(|b| match b {
					ContentBlock::Text { text } => Some(text.as_str()),
					_ => None,
				})
				.collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn plain_text_message_serializes_as_string_content() {
		let json = serde_json::to_value(Message::user("hello")).unwrap();
		assert_eq!(json, json!({"role": "user", "content": "hello"}));
	}

	#[test]
	fn tool_use_entry_is_assistant_with_one_block() {
		let call = ToolCall {
			id: "toolu_1".into(),
			name: "read_file".into(),
			input: json!({"file_path": "README.md"}),
		};
		let json = serde_json::to_value(Message::tool_use(&call)).unwrap();
		assert_eq!(
			json,
			json!({
				"role": "assistant",
				"content": [{
					"type": "tool_use",
					"id": "toolu_1",
					"name": "read_file",
					"input": {"file_path": "README.md"}
				}]
			})
		);
	}

	#[test]
	fn tool_result_entry_is_user_and_correlated() {
		let msg = Message::tool_result("toolu_1", &json!({"error": "unknown tool"}), true);
		assert_eq!(msg.role, Role::User);
		let MessageContent::Blocks(blocks) = &msg.content else {
			panic!("expected blocks");
		};
		assert_eq!(
			blocks[0],
			ContentBlock::ToolResult {
				tool_use_id: "toolu_1".into(),
				content: r#"{"error":"unknown tool"}"#.into(),
				is_error: true,
			}
		);
	}

	#[test]
	fn successful_tool_result_omits_is_error() {
		let msg = Message::tool_result("toolu_2", &json!({"size": 3}), false);
		let json = serde_json::to_string(&msg).unwrap();
		assert!(!json.contains("is_error"));
	}

	#[test]
	fn plain_text_joins_text_blocks_only() {
		let msg = Message {
			role: Role::Assistant,
			content: MessageContent::Blocks(vec![
				ContentBlock::Text { text: "a".into() },
				ContentBlock::ToolUse {
					id: "x".into(),
					name: "n".into(),
					input: json!({}),
				},
				ContentBlock::Text { text: "b".into() },
			]),
		};
		assert_eq!(msg.plain_text(), "ab");
	}

	#[test]
	fn role_parse_rejects_system() {
		assert_eq!(Role::parse("user"), Some(Role::User));
		assert_eq!(Role::parse("assistant"), Some(Role::Assistant));
		assert_eq!(Role::parse("system"), None);
	}

	#[test]
	fn block_content_deserializes() {
		let msg: Message = serde_json::from_value(json!({
			"role": "assistant",
			"content": [{"type": "text", "text": "hi"}]
		}))
		.unwrap();
		assert_eq!(msg.plain_text(), "hi");
	}
}
