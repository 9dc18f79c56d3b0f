// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use parley_common_core::{Message, ToolCall, ToolContext, ToolDefinition, ToolError};
use serde_json::{json, Value};

use crate::kind::{ToolInvocation, ToolKind};

/// Outcome of one tool call.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolOutcome {
	Success(Value),
	Failure(ToolError),
}

/// A finished tool call, correlated to the model's call id.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolResult {
	pub tool_call_id: String,
	pub tool_name: String,
	pub outcome: ToolOutcome,
}

impl ToolResult {
	/// The JSON the model sees. Failures become `{"error": "<message>"}`.
	pub fn payload(&self) -> Value {
		match &self.outcome {
			ToolOutcome::Success(value) => value.clone(),
			ToolOutcome::Failure(err) => json!({ "error": err.to_string() }),
		}
	}

	pub fn is_error(&self) -> bool {
		matches!(self.outcome, ToolOutcome::Failure(_))
	}

	pub fn to_message(&self) -> Message {
		Message::tool_result(self.tool_call_id.clone(), &self.payload(), self.is_error())
	}
}

/// The tool catalog offered to the model, and the dispatcher for its calls.
#[derive(Clone, Debug)]
pub struct ToolRegistry {
	kinds: Vec<ToolKind>,
}

impl ToolRegistry {
	/// All built-in tools.
	pub fn new() -> Self {
		Self {
			kinds: ToolKind::ALL.to_vec(),
		}
	}

	/// A registry that offers nothing.
	pub fn empty() -> Self {
		Self { kinds: Vec::new() }
	}

	pub fn definitions(&self) -> Vec<ToolDefinition> {
		self.kinds.iter().map(|kind| kind.definition()).collect()
	}

	/// Runs one call. Never fails: every error is captured in the result.
	pub async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> ToolResult {
		let outcome = match self.invoke(call, ctx).await {
			Ok(value) => ToolOutcome::Success(value),
			Err(err) => {
				tracing::warn!(
					tool_call_id = %call.id,
					tool_name = %call.name,
					error = %err,
					"tool call failed"
				);
				ToolOutcome::Failure(err)
			}
		};

		ToolResult {
			tool_call_id: call.id.clone(),
			tool_name: call.name.clone(),
			outcome,
		}
	}

	async fn invoke(&self, call: &ToolCall, ctx: &ToolContext) -> Result<Value, ToolError> {
		let invocation = ToolInvocation::parse(&call.name, call.input.clone())?;
		if !self.kinds.contains(&invocation.kind()) {
			return Err(ToolError::UnknownTool(call.name.clone()));
		}

		tracing::debug!(tool_call_id = %call.id, tool_name = %call.name, "executing tool");
		invocation.execute(ctx).await
	}
}

impl Default for ToolRegistry {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use tempfile::TempDir;

	fn call(id: &str, name: &str, input: Value) -> ToolCall {
		ToolCall {
			id: id.to_string(),
			name: name.to_string(),
			input,
		}
	}

	#[test]
	fn catalog_lists_all_four_tools_in_order() {
		let names: Vec<_> = ToolRegistry::new()
			.definitions()
			.into_iter()
			.map(|d| d.name)
			.collect();
		assert_eq!(
			names,
			[
				"write_file",
				"read_file",
				"list_directory",
				"get_working_directory"
			]
		);
	}

	#[tokio::test]
	async fn unknown_tool_yields_error_payload() {
		let registry = ToolRegistry::new();
		let result = registry
			.execute(
				&call("toolu_9", "format_disk", json!({})),
				&ToolContext::detached(),
			)
			.await;
		assert!(result.is_error());
		assert_eq!(result.tool_call_id, "toolu_9");
		assert_eq!(result.payload(), json!({"error": "unknown tool"}));
	}

	#[tokio::test]
	async fn missing_argument_yields_error_payload() {
		let registry = ToolRegistry::new();
		let result = registry
			.execute(&call("t", "read_file", json!({})), &ToolContext::detached())
			.await;
		let payload = result.payload();
		let msg = payload["error"].as_str().unwrap();
		assert!(msg.contains("file_path"), "got {msg}");
	}

	#[tokio::test]
	async fn empty_registry_refuses_every_call() {
		let result = ToolRegistry::empty()
			.execute(
				&call("t", "get_working_directory", json!({})),
				&ToolContext::detached(),
			)
			.await;
		assert_eq!(result.payload(), json!({"error": "unknown tool"}));
	}

	/// **Test: a file written through the registry reads back unchanged**
	#[tokio::test]
	async fn write_then_read_round_trips_content() {
		let dir = TempDir::new().unwrap();
		let ctx = ToolContext::new(dir.path());
		let registry = ToolRegistry::new();
		let body = "# Architecture\n\nUnicode survives: café ✓\n";

		let written = registry
			.execute(
				&call(
					"w",
					"write_file",
					json!({"file_path": "docs/architecture.md", "content": body}),
				),
				&ctx,
			)
			.await;
		assert!(!written.is_error(), "{:?}", written.payload());

		let read = registry
			.execute(
				&call("r", "read_file", json!({"file_path": "docs/architecture.md"})),
				&ctx,
			)
			.await;
		assert_eq!(read.payload()["content"], body);
	}

	#[tokio::test]
	async fn result_message_is_user_tool_result() {
		let registry = ToolRegistry::new();
		let result = registry
			.execute(&call("abc", "nope", json!({})), &ToolContext::detached())
			.await;
		let msg = result.to_message();
		assert_eq!(msg.role, parley_common_core::Role::User);
		let parley_common_core::MessageContent::Blocks(blocks) = msg.content else {
			panic!("expected blocks");
		};
		assert!(matches!(
			&blocks[0],
			parley_common_core::ContentBlock::ToolResult { tool_use_id, is_error: true, .. }
				if tool_use_id == "abc"
		));
	}

	proptest! {
		/// Any read_file path containing `..` fails with a traversal error,
		/// whether or not the target exists.
		#[test]
		fn read_file_refuses_traversal(prefix in "[a-zA-Z0-9_/]{0,16}", suffix in "[a-zA-Z0-9_/.]{0,16}") {
			let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
			let dir = TempDir::new().unwrap();
			let ctx = ToolContext::new(dir.path());
			let path = format!("{prefix}..{suffix}");
			let result = rt.block_on(ToolRegistry::new().execute(
				&call("t", "read_file", json!({"file_path": path})),
				&ctx,
			));
			let payload = result.payload();
			let msg = payload["error"].as_str().unwrap_or_default().to_string();
			prop_assert!(msg.starts_with("invalid path"), "got {}", msg);
		}
	}
}
