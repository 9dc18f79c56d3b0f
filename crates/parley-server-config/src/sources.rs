// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use parley_common_secret::load_secret_env;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	ChatConfigLayer, HttpConfigLayer, LlmConfigLayer, LlmProvider, LogFormat, LoggingConfigLayer,
	PathsConfigLayer,
};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/parley/server.toml";
pub const API_KEY_ENV: &str = "PARLEY_SERVER_ANTHROPIC_API_KEY";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: PARLEY_SERVER_<FIELD>. The API key also honours `<VAR>_FILE`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		let mut layer = layer_from_vars(&|name: &str| std::env::var(name).ok())?;
		let api_key =
			load_secret_env(API_KEY_ENV).map_err(|e| ConfigError::Secret(e.to_string()))?;
		if let Some(llm) = layer.llm.as_mut() {
			llm.api_key = api_key;
		}
		Ok(layer)
	}
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Builds the environment layer from any variable lookup, minus the API key.
fn layer_from_vars(get: Lookup<'_>) -> Result<ServerConfigLayer, ConfigError> {
	Ok(ServerConfigLayer {
		http: Some(HttpConfigLayer {
			host: var(get, "PARLEY_SERVER_HOST"),
			port: parsed(get, "PARLEY_SERVER_PORT")?,
		}),
		llm: Some(LlmConfigLayer {
			provider: parsed::<LlmProvider>(get, "PARLEY_SERVER_LLM_PROVIDER")?,
			base_url: var(get, "PARLEY_SERVER_ANTHROPIC_BASE_URL"),
			api_key: None,
			model: var(get, "PARLEY_SERVER_ANTHROPIC_MODEL"),
			max_tokens: parsed(get, "PARLEY_SERVER_MAX_TOKENS")?,
			cli_command: var(get, "PARLEY_SERVER_CLI_COMMAND"),
			cli_args: None,
			cli_timeout_secs: parsed(get, "PARLEY_SERVER_CLI_TIMEOUT_SECS")?,
		}),
		chat: Some(ChatConfigLayer {
			request_timeout: var(get, "PARLEY_SERVER_REQUEST_TIMEOUT"),
			tools_enabled: var(get, "PARLEY_SERVER_TOOLS_ENABLED").map(|v| is_truthy(&v)),
		}),
		paths: Some(PathsConfigLayer {
			data_dir: var(get, "PARLEY_SERVER_DATA_DIR").map(PathBuf::from),
			personas_dir: var(get, "PARLEY_SERVER_PERSONAS_DIR").map(PathBuf::from),
		}),
		logging: Some(LoggingConfigLayer {
			level: var(get, "PARLEY_SERVER_LOG_LEVEL"),
			format: parsed::<LogFormat>(get, "PARLEY_SERVER_LOG_FORMAT")?,
		}),
	})
}

fn var(get: Lookup<'_>, name: &str) -> Option<String> {
	get(name).filter(|s| !s.is_empty())
}

fn is_truthy(value: &str) -> bool {
	value.eq_ignore_ascii_case("true") || value == "1"
}

fn parsed<T>(get: Lookup<'_>, name: &str) -> Result<Option<T>, ConfigError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	match var(get, name) {
		Some(v) => v.trim().parse().map(Some).map_err(|e| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid value '{v}': {e}"),
		}),
		None => Ok(None),
	}
}
