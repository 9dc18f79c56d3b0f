// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! LLM configuration section.

use parley_common_secret::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_CLI_COMMAND: &str = "claude";
pub const DEFAULT_CLI_TIMEOUT_SECS: u64 = 120;

/// Which backend answers chat turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
	/// Anthropic Messages API over HTTPS.
	#[default]
	Anthropic,
	/// A local model CLI run as a subprocess. Never calls tools.
	Cli,
}

impl std::fmt::Display for LlmProvider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			LlmProvider::Anthropic => write!(f, "anthropic"),
			LlmProvider::Cli => write!(f, "cli"),
		}
	}
}

impl std::str::FromStr for LlmProvider {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"anthropic" => Ok(LlmProvider::Anthropic),
			"cli" => Ok(LlmProvider::Cli),
			_ => Err(ConfigError::InvalidValue {
				key: "llm.provider".to_string(),
				message: format!("unknown provider '{s}', expected 'anthropic' or 'cli'"),
			}),
		}
	}
}

/// LLM configuration layer (for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmConfigLayer {
	#[serde(default)]
	pub provider: Option<LlmProvider>,
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub api_key: Option<SecretString>,
	#[serde(default)]
	pub model: Option<String>,
	#[serde(default)]
	pub max_tokens: Option<u32>,
	#[serde(default)]
	pub cli_command: Option<String>,
	#[serde(default)]
	pub cli_args: Option<Vec<String>>,
	#[serde(default)]
	pub cli_timeout_secs: Option<u64>,
}

impl LlmConfigLayer {
	pub fn merge(&mut self, other: LlmConfigLayer) {
		if other.provider.is_some() {
			self.provider = other.provider;
		}
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.api_key.is_some() {
			self.api_key = other.api_key;
		}
		if other.model.is_some() {
			self.model = other.model;
		}
		if other.max_tokens.is_some() {
			self.max_tokens = other.max_tokens;
		}
		if other.cli_command.is_some() {
			self.cli_command = other.cli_command;
		}
		if other.cli_args.is_some() {
			self.cli_args = other.cli_args;
		}
		if other.cli_timeout_secs.is_some() {
			self.cli_timeout_secs = other.cli_timeout_secs;
		}
	}

	pub fn finalize(self) -> LlmConfig {
		LlmConfig {
			provider: self.provider.unwrap_or_default(),
			base_url: self
				.base_url
				.unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
			api_key: self.api_key.filter(|key| !key.is_blank()),
			model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
			max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
			cli_command: self
				.cli_command
				.unwrap_or_else(|| DEFAULT_CLI_COMMAND.to_string()),
			cli_args: self.cli_args.unwrap_or_else(|| vec!["-p".to_string()]),
			cli_timeout_secs: self.cli_timeout_secs.unwrap_or(DEFAULT_CLI_TIMEOUT_SECS),
		}
	}
}

/// Resolved LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
	pub provider: LlmProvider,
	pub base_url: String,
	pub api_key: Option<SecretString>,
	pub model: String,
	pub max_tokens: u32,
	pub cli_command: String,
	pub cli_args: Vec<String>,
	pub cli_timeout_secs: u64,
}

impl Default for LlmConfig {
	fn default() -> Self {
		LlmConfigLayer::default().finalize()
	}
}
