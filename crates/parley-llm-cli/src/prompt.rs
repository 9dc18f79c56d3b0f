// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use parley_common_core::{LlmRequest, Role};

/// Flattens a request into one prompt: the system instruction, then each
/// message as a `User:` or `Assistant:` paragraph. Tool blocks carry no text
/// and are dropped.
pub fn render_prompt(request: &LlmRequest) -> String {
	let mut parts = Vec::with_capacity(request.messages.len() + 1);
	if let Some(system) = request.system.as_deref().filter(|s| !s.trim().is_empty()) {
		parts.push(system.trim_end().to_string());
	}

	for message in &request.messages {
		let text = message.plain_text();
		if text.trim().is_empty() {
			continue;
		}
		let speaker = match message.role {
			Role::User => "User",
			Role::Assistant => "Assistant",
		};
		parts.push(format!("{speaker}: {}", text.trim_end()));
	}

	parts.join("\n\n")
}
