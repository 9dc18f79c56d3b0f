// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::LazyLock;

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_yaml::Value as Yaml;

use crate::error::PersonaError;

static YAML_BLOCK: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)```yaml\r?\n(.*?)```").unwrap());

/// A persona agent, as parsed from its definition file.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
	pub id: String,
	pub name: String,
	pub title: String,
	pub icon: String,
	pub when_to_use: String,
	pub role: String,
	pub style: String,
	pub identity: String,
	pub focus: String,
	pub core_principles: Vec<String>,
	pub commands: Vec<PersonaCommand>,
}

/// A command the persona advertises: a bare name or `name: description`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersonaCommand {
	Bare(String),
	Described { name: String, description: String },
}

impl PersonaCommand {
	pub fn name(&self) -> &str {
		match self {
			PersonaCommand::Bare(name) => name,
			PersonaCommand::Described { name, .. } => name,
		}
	}
}

impl Serialize for PersonaCommand {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			PersonaCommand::Bare(name) => serializer.serialize_str(name),
			PersonaCommand::Described { name, description } => {
				let mut map = serializer.serialize_map(Some(1))?;
				map.serialize_entry(name, description)?;
				map.end()
			}
		}
	}
}

#[derive(Debug, Default, Deserialize)]
struct RawDefinition {
	#[serde(default)]
	agent: RawAgent,
	#[serde(default)]
	persona: RawPersona,
	#[serde(default)]
	commands: Yaml,
}

#[derive(Debug, Default, Deserialize)]
struct RawAgent {
	#[serde(default)]
	id: Yaml,
	#[serde(default)]
	name: Yaml,
	#[serde(default)]
	title: Yaml,
	#[serde(default)]
	icon: Yaml,
	#[serde(default, rename = "whenToUse")]
	when_to_use: Yaml,
}

#[derive(Debug, Default, Deserialize)]
struct RawPersona {
	#[serde(default)]
	role: Yaml,
	#[serde(default)]
	style: Yaml,
	#[serde(default)]
	identity: Yaml,
	#[serde(default)]
	focus: Yaml,
	#[serde(default)]
	core_principles: Vec<Yaml>,
}

/// Parses the first ```` ```yaml ```` block of a persona document.
pub fn parse_persona(source: &str) -> Result<Persona, PersonaError> {
	let block = YAML_BLOCK
		.captures(source)
		.and_then(|caps| caps.get(1))
		.ok_or(PersonaError::MissingBlock)?;

	let raw: Option<RawDefinition> =
		serde_yaml::from_str(block.as_str()).map_err(|e| PersonaError::InvalidYaml(e.to_string()))?;
	let raw = raw.ok_or_else(|| PersonaError::InvalidYaml("empty document".to_string()))?;

	let id = scalar(&raw.agent.id);
	if id.trim().is_empty() {
		return Err(PersonaError::MissingId);
	}

	Ok(Persona {
		id,
		name: scalar(&raw.agent.name),
		title: scalar(&raw.agent.title),
		icon: scalar(&raw.agent.icon),
		when_to_use: scalar(&raw.agent.when_to_use),
		role: scalar(&raw.persona.role),
		style: scalar(&raw.persona.style),
		identity: scalar(&raw.persona.identity),
		focus: scalar(&raw.persona.focus),
		core_principles: raw.persona.core_principles.iter().map(flatten).collect(),
		commands: commands(&raw.commands),
	})
}

fn commands(value: &Yaml) -> Vec<PersonaCommand> {
	match value {
		Yaml::Sequence(items) => items.iter().flat_map(command_entries).collect(),
		Yaml::Mapping(_) => command_entries(value),
		_ => Vec::new(),
	}
}

fn command_entries(item: &Yaml) -> Vec<PersonaCommand> {
	match item {
		Yaml::Mapping(map) => map
			.iter()
			.map(|(name, description)| PersonaCommand::Described {
				name: scalar(name),
				description: flatten(description),
			})
			.collect(),
		Yaml::Null => Vec::new(),
		other => vec![PersonaCommand::Bare(scalar(other))],
	}
}

fn scalar(value: &Yaml) -> String {
	match value {
		Yaml::Null => String::new(),
		Yaml::Bool(b) => b.to_string(),
		Yaml::Number(n) => n.to_string(),
		Yaml::String(s) => s.trim_end().to_string(),
		Yaml::Tagged(tagged) => scalar(&tagged.value),
		Yaml::Sequence(_) | Yaml::Mapping(_) => flatten(value),
	}
}

// Unquoted `Key: text` list items parse as one-entry maps; render them back.
fn flatten(value: &Yaml) -> String {
	match value {
		Yaml::Mapping(map) => map
			.iter()
			.map(|(k, v)| format!("{}: {}", scalar(k), flatten(v)))
			.collect::<Vec<_>>()
			.join("; "),
		Yaml::Sequence(items) => items.iter().map(flatten).collect::<Vec<_>>().join(", "),
		other => scalar(other),
	}
}
