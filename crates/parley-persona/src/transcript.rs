// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::Path;

use parley_common_core::{ConversationEntry, Message, ToolDefinition};

use crate::persona::{Persona, PersonaCommand};

/// Renders a persona as a system instruction.
///
/// Sections always appear in the same order, so the output depends only on
/// the persona, the offered tools and the working directory. An empty `tools`
/// slice omits the tool section entirely.
pub fn build_system_instruction(
	persona: &Persona,
	tools: &[ToolDefinition],
	working_directory: Option<&Path>,
) -> String {
	let mut out = format!("You are {}, {}.\n", persona.name, persona.title);

	section(&mut out, "Role", &persona.role);
	section(&mut out, "Style", &persona.style);
	section(&mut out, "Identity", &persona.identity);
	section(&mut out, "Focus", &persona.focus);

	out.push_str("\n## Core Principles\n");
	for (i, principle) in persona.core_principles.iter().enumerate() {
		out.push_str(&format!("{}. {}\n", i + 1, principle));
	}

	out.push_str("\n## Available Commands\n");
	for command in &persona.commands {
		match command {
			PersonaCommand::Described { name, description } => {
				out.push_str(&format!("- *{name}: {description}\n"));
			}
			PersonaCommand::Bare(name) => out.push_str(&format!("- *{name}\n")),
		}
	}

	section(&mut out, "When to Use", &persona.when_to_use);

	out.push_str(&format!(
		"\nRespond as {} throughout this conversation. Answer questions, carry out commands \
		 and offer expert advice where appropriate.\n",
		persona.name
	));

	if !tools.is_empty() {
		out.push_str("\n## Tools\nYou can call these tools to work with files in the project:\n");
		for tool in tools {
			out.push_str(&format!("- {}: {}\n", tool.name, tool.description));
		}
		if let Some(dir) = working_directory {
			out.push_str(&format!(
				"\nThe project working directory is {}. Relative paths are resolved against it.\n",
				dir.display()
			));
		}
	}

	out
}

fn section(out: &mut String, heading: &str, body: &str) {
	out.push_str(&format!("\n## {heading}\n{body}\n"));
}

/// Prior history followed by the new user message.
pub fn build_messages(history: &[ConversationEntry], message: &str) -> Vec<Message> {
	history
		.iter()
		.map(ConversationEntry::to_message)
		.chain(std::iter::once(Message::user(message)))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use parley_common_core::Role;
	use proptest::prelude::*;
	use serde_json::json;

	fn architect() -> Persona {
		Persona {
			id: "architect".into(),
			name: "Winston".into(),
			title: "Architect".into(),
			icon: "🏗️".into(),
			when_to_use: "Use for system design".into(),
			role: "Holistic System Architect".into(),
			style: "Comprehensive, pragmatic".into(),
			identity: "Master of holistic application design".into(),
			focus: "Complete systems architecture".into(),
			core_principles: vec!["Holistic System Thinking".into(), "User Experience Drives Architecture".into()],
			commands: vec![
				PersonaCommand::Described {
					name: "help".into(),
					description: "Show commands".into(),
				},
				PersonaCommand::Bare("exit".into()),
			],
		}
	}

	fn tools() -> Vec<ToolDefinition> {
		vec![ToolDefinition::new(
			"read_file",
			"Read a text file",
			json!({"type": "object"}),
		)]
	}

	#[test]
	fn renders_sections_in_fixed_order() {
		let text = build_system_instruction(&architect(), &[], None);
		let order = [
			"You are Winston, Architect.",
			"## Role\nHolistic System Architect",
			"## Style\n",
			"## Identity\n",
			"## Focus\n",
			"## Core Principles\n1. Holistic System Thinking\n2. User Experience Drives Architecture\n",
			"## Available Commands\n- *help: Show commands\n- *exit\n",
			"## When to Use\nUse for system design",
			"Respond as Winston",
		];
		let mut cursor = 0;
		for marker in order {
			let at = text[cursor..]
				.find(marker)
				.unwrap_or_else(|| panic!("missing or out of order: {marker}"));
			cursor += at + marker.len();
		}
		assert!(!text.contains("## Tools"));
	}

	#[test]
	fn tool_section_lists_tools_and_directory() {
		let text = build_system_instruction(
			&architect(),
			&tools(),
			Some(Path::new("/srv/projects/demo")),
		);
		assert!(text.contains("## Tools\n"));
		assert!(text.contains("- read_file: Read a text file\n"));
		assert!(text.contains("/srv/projects/demo"));
	}

	#[test]
	fn tool_section_without_directory_omits_it() {
		let text = build_system_instruction(&architect(), &tools(), None);
		assert!(text.contains("## Tools\n"));
		assert!(!text.contains("working directory is"));
	}

	#[test]
	fn messages_append_new_user_turn() {
		let history = [
			ConversationEntry::user("Hi"),
			ConversationEntry::assistant("Hello, I'm Winston."),
		];
		let messages = build_messages(&history, "Design a cache");
		assert_eq!(messages.len(), 3);
		assert_eq!(messages[1].role, Role::Assistant);
		assert_eq!(messages[2], Message::user("Design a cache"));
	}

	prop_compose! {
		fn arb_persona()(
			name in "[A-Za-z ]{0,12}",
			title in "[A-Za-z ]{0,12}",
			role in ".{0,40}",
			principles in prop::collection::vec(".{0,20}", 0..5),
			commands in prop::collection::vec(("[a-z-]{1,10}", prop::option::of(".{0,20}")), 0..5),
		) -> Persona {
			Persona {
				id: "p".into(),
				name,
				title,
				role,
				core_principles: principles,
				commands: commands
					.into_iter()
					.map(|(name, description)| match description {
						Some(description) => PersonaCommand::Described { name, description },
						None => PersonaCommand::Bare(name),
					})
					.collect(),
				..Persona::default()
			}
		}
	}

	proptest! {
		/// **Test: instruction text is a pure function of its inputs**
		///
		/// Why important: reproducible prompts are what make loop tests and
		/// cached model fixtures stable.
		#[test]
		fn instruction_is_deterministic(persona in arb_persona(), with_tools in any::<bool>()) {
			let offered = if with_tools { tools() } else { Vec::new() };
			let dir = Path::new("/work");
			let first = build_system_instruction(&persona, &offered, Some(dir));
			let second = build_system_instruction(&persona.clone(), &offered.clone(), Some(dir));
			prop_assert_eq!(&first, &second);
			prop_assert_eq!(first.contains("## Tools"), with_tools);
		}
	}
}
