// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Persisted conversation turns and the store boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::message::{Message, Role};

/// One persisted turn: the user's message or the final assistant reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
	pub role: Role,
	pub content: String,
}

impl ConversationEntry {
	pub fn user(content: impl Into<String>) -> Self {
		Self {
			role: Role::User,
			content: content.into(),
		}
	}

	pub fn assistant(content: impl Into<String>) -> Self {
		Self {
			role: Role::Assistant,
			content: content.into(),
		}
	}

	pub fn to_message(&self) -> Message {
		Message::text(self.role, self.content.clone())
	}
}

/// Append-only conversation log, keyed by project.
///
/// Implementations must serialize writes for a project so concurrent chats
/// never lose entries.
#[async_trait]
pub trait ConversationStore: Send + Sync {
	/// Appends `entries` in order as one write.
	async fn append_conversation(
		&self,
		project_id: &str,
		entries: Vec<ConversationEntry>,
	) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn entry_wire_shape() {
		let json = serde_json::to_value(ConversationEntry::assistant("hi")).unwrap();
		assert_eq!(json, json!({"role": "assistant", "content": "hi"}));
	}

	#[test]
	fn entry_becomes_plain_text_message() {
		let msg = ConversationEntry::user("hello").to_message();
		assert_eq!(msg, Message::user("hello"));
	}
}
