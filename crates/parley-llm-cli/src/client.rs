// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use parley_common_core::{
	ContentBlock, LlmClient, LlmError, LlmEvent, LlmRequest, LlmResponse, LlmStream, Usage,
};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::prompt::render_prompt;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone, Debug)]
pub struct CliConfig {
	pub command: String,
	pub args: Vec<String>,
	pub timeout: Duration,
}

impl CliConfig {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			args: Vec::new(),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.args = args.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}
}

/// Runs the configured command once per request.
///
/// The child runs in the request's working directory when one is set and is
/// killed if it outlives the timeout.
#[derive(Clone, Debug)]
pub struct CliClient {
	config: CliConfig,
}

impl CliClient {
	pub fn new(config: CliConfig) -> Self {
		Self { config }
	}

	async fn run(&self, request: &LlmRequest) -> Result<String, LlmError> {
		let prompt = render_prompt(request);

		let mut cmd = Command::new(&self.config.command);
		cmd.args(&self.config.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);
		if let Some(dir) = &request.working_directory {
			cmd.current_dir(dir);
		}

		debug!(
			command = %self.config.command,
			cwd = ?request.working_directory,
			prompt_len = prompt.len(),
			timeout_secs = self.config.timeout.as_secs(),
			"spawning model CLI"
		);

		let mut child = cmd.spawn().map_err(|e| {
			warn!(command = %self.config.command, error = %e, "failed to spawn model CLI");
			LlmError::Http(format!("failed to start {}: {e}", self.config.command))
		})?;

		let stdin = child.stdin.take();
		let exchange = async move {
			if let Some(mut stdin) = stdin {
				match stdin.write_all(prompt.as_bytes()).await {
					Ok(()) => {}
					// The child may exit without reading its input.
					Err(e) if e.kind() == ErrorKind::BrokenPipe => {
						debug!("model CLI closed stdin early");
					}
					Err(e) => return Err(e),
				}
			}
			child.wait_with_output().await
		};

		let output = match timeout(self.config.timeout, exchange).await {
			Ok(Ok(output)) => output,
			Ok(Err(e)) => {
				warn!(error = %e, "model CLI I/O failed");
				return Err(LlmError::Http(e.to_string()));
			}
			Err(_) => {
				warn!(
					command = %self.config.command,
					timeout_secs = self.config.timeout.as_secs(),
					"model CLI timed out"
				);
				return Err(LlmError::Timeout);
			}
		};

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
			warn!(exit_code = ?output.status.code(), stderr = %stderr, "model CLI failed");
			return Err(LlmError::Api(if stderr.is_empty() {
				format!("{} exited with {}", self.config.command, output.status)
			} else {
				stderr
			}));
		}

		let reply = String::from_utf8_lossy(&output.stdout).trim().to_string();
		info!(reply_len = reply.len(), "model CLI finished");
		Ok(reply)
	}
}

fn text_response(reply: String) -> LlmResponse {
	LlmResponse {
		content: vec![ContentBlock::Text { text: reply }],
		usage: Usage::default(),
		stop_reason: Some("end_turn".to_string()),
	}
}

#[async_trait]
impl LlmClient for CliClient {
	#[instrument(skip(self, request), fields(model = %request.model))]
	async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
		Ok(text_response(self.run(&request).await?))
	}

	#[instrument(skip(self, request), fields(model = %request.model))]
	async fn complete_streaming(&self, request: LlmRequest) -> Result<LlmStream, LlmError> {
		let reply = self.run(&request).await?;
		Ok(LlmStream::from_events(vec![
			LlmEvent::TextDelta {
				content: reply.clone(),
			},
			LlmEvent::Completed(text_response(reply)),
		]))
	}

	fn supports_tools(&self) -> bool {
		false
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use parley_common_core::Message;
	use tempfile::TempDir;

	fn request(text: &str) -> LlmRequest {
		LlmRequest::new("cli", 0).with_messages(vec![Message::user(text)])
	}

	fn sh(script: &str) -> CliClient {
		CliClient::new(CliConfig::new("sh").with_args(["-c", script]))
	}

	#[tokio::test]
	async fn stdout_becomes_reply_without_tools() {
		let client = CliClient::new(CliConfig::new("cat"));
		let response = client.complete(request("ping")).await.unwrap();
		assert_eq!(response.text(), "User: ping");
		assert!(!response.has_tool_calls());
		assert_eq!(response.usage, Usage::default());
	}

	#[test]
	fn never_offered_tools() {
		assert!(!CliClient::new(CliConfig::new("cat")).supports_tools());
	}

	#[tokio::test]
	async fn runs_in_working_directory() {
		let dir = TempDir::new().unwrap();
		let client = sh("pwd");
		let req = request("where?").with_working_directory(Some(dir.path().to_path_buf()));

		let response = client.complete(req).await.unwrap();
		let reported = std::fs::canonicalize(response.text()).unwrap();
		assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
	}

	#[tokio::test]
	async fn non_zero_exit_is_api_error_with_stderr() {
		let err = sh("echo 'quota exhausted' >&2; exit 3")
			.complete(request("hi"))
			.await
			.unwrap_err();
		assert_eq!(err, LlmError::Api("quota exhausted".into()));
	}

	#[tokio::test]
	async fn slow_process_times_out() {
		let client = CliClient::new(
			CliConfig::new("sh")
				.with_args(["-c", "sleep 5"])
				.with_timeout(Duration::from_millis(100)),
		);
		assert_eq!(client.complete(request("hi")).await.unwrap_err(), LlmError::Timeout);
	}

	#[tokio::test]
	async fn missing_binary_is_transport_error() {
		let client = CliClient::new(CliConfig::new("/nonexistent/parley-model-cli"));
		assert!(matches!(
			client.complete(request("hi")).await.unwrap_err(),
			LlmError::Http(_)
		));
	}

	#[tokio::test]
	async fn streaming_yields_one_delta_then_completion() {
		let client = CliClient::new(CliConfig::new("cat"));
		let mut stream = client.complete_streaming(request("hello")).await.unwrap();

		assert!(matches!(
			stream.next().await,
			Some(LlmEvent::TextDelta { content }) if content == "User: hello"
		));
		assert!(matches!(stream.next().await, Some(LlmEvent::Completed(_))));
		assert!(stream.next().await.is_none());
	}
}
