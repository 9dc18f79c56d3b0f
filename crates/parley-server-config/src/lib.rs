// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Parley server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`PARLEY_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use parley_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, API_KEY_ENV,
	SYSTEM_CONFIG_PATH,
};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub llm: LlmConfig,
	pub chat: ChatConfig,
	pub paths: PathsConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`PARLEY_SERVER_*`)
/// 2. Config file (`/etc/parley/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let llm = layer.llm.unwrap_or_default().finalize();
	let chat = layer.chat.unwrap_or_default().finalize()?;
	let paths = layer.paths.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&http, &llm)?;

	info!(
		host = %http.host,
		port = http.port,
		llm_provider = %llm.provider,
		model = %llm.model,
		api_key_configured = llm.api_key.is_some(),
		request_timeout = ?chat.request_timeout,
		tools_enabled = chat.tools_enabled,
		data_dir = %paths.data_dir.display(),
		personas_dir = %paths.personas_dir.display(),
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		llm,
		chat,
		paths,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(http: &HttpConfig, llm: &LlmConfig) -> Result<(), ConfigError> {
	if http.port == 0 {
		return Err(ConfigError::Validation(
			"http.port must be non-zero".to_string(),
		));
	}

	if llm.max_tokens == 0 {
		return Err(ConfigError::Validation(
			"llm.max_tokens must be positive".to_string(),
		));
	}

	if llm.provider == LlmProvider::Anthropic && llm.api_key.is_none() {
		return Err(ConfigError::Validation(format!(
			"llm.provider is 'anthropic' but no API key is configured. Set {API_KEY_ENV} \
			 (or {API_KEY_ENV}_FILE), or switch to the 'cli' provider."
		)));
	}

	Ok(())
}
