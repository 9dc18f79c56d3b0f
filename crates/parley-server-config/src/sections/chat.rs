// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Chat request handling configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
	/// Upper bound on one chat turn, all model round-trips and tool calls included.
	pub request_timeout: Duration,
	/// Default for requests that do not say whether tools are on.
	pub tools_enabled: bool,
}

impl Default for ChatConfig {
	fn default() -> Self {
		Self {
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			tools_enabled: true,
		}
	}
}

/// Chat configuration layer. `request_timeout` uses humantime syntax (`90s`, `2m`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatConfigLayer {
	#[serde(default)]
	pub request_timeout: Option<String>,
	#[serde(default)]
	pub tools_enabled: Option<bool>,
}

impl ChatConfigLayer {
	pub fn merge(&mut self, other: ChatConfigLayer) {
		if other.request_timeout.is_some() {
			self.request_timeout = other.request_timeout;
		}
		if other.tools_enabled.is_some() {
			self.tools_enabled = other.tools_enabled;
		}
	}

	pub fn finalize(self) -> Result<ChatConfig, ConfigError> {
		let request_timeout = match self.request_timeout {
			Some(raw) => {
				humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::InvalidValue {
					key: "chat.request_timeout".to_string(),
					message: format!("'{raw}': {e}"),
				})?
			}
			None => DEFAULT_REQUEST_TIMEOUT,
		};

		Ok(ChatConfig {
			request_timeout,
			tools_enabled: self.tools_enabled.unwrap_or(true),
		})
	}
}
