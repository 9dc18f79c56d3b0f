// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use parley_common_core::{LlmClient, LlmError, LlmRequest, LlmResponse, LlmStream};
use parley_common_http::{is_retryable_status, retry, RetryConfig, RetryableError};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, instrument, trace};

use crate::stream::parse_sse_stream;
use crate::types::{AnthropicConfig, AnthropicError, AnthropicRequest, AnthropicResponse};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientErrorKind {
	Transport,
	Timeout,
	RateLimited { retry_after_secs: Option<u64> },
	Api,
}

#[derive(Debug)]
struct ClientError {
	message: String,
	retryable: bool,
	kind: ClientErrorKind,
}

impl std::fmt::Display for ClientError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.message)
	}
}

impl std::error::Error for ClientError {}

impl RetryableError for ClientError {
	fn is_retryable(&self) -> bool {
		self.retryable
	}
}

impl From<ClientError> for LlmError {
	fn from(err: ClientError) -> Self {
		match err.kind {
			ClientErrorKind::Transport => LlmError::Http(err.message),
			ClientErrorKind::Timeout => LlmError::Timeout,
			ClientErrorKind::RateLimited { retry_after_secs } => {
				LlmError::RateLimited { retry_after_secs }
			}
			ClientErrorKind::Api => LlmError::Api(err.message),
		}
	}
}

fn status_error(status: StatusCode, retry_after_secs: Option<u64>, message: String) -> ClientError {
	let kind = if status == StatusCode::TOO_MANY_REQUESTS {
		ClientErrorKind::RateLimited { retry_after_secs }
	} else {
		ClientErrorKind::Api
	};
	ClientError {
		message: format!("{status}: {message}"),
		retryable: is_retryable_status(status),
		kind,
	}
}

/// Client for the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
	config: AnthropicConfig,
	http_client: Client,
	retry_config: RetryConfig,
}

impl AnthropicClient {
	pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
		let http_client = parley_common_http::builder()
			.timeout(config.timeout)
			.build()
			.map_err(|e| LlmError::Http(format!("failed to create HTTP client: {e}")))?;

		Ok(Self {
			config,
			http_client,
			retry_config: RetryConfig::default(),
		})
	}

	pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
		self.retry_config = retry_config;
		self
	}

	fn messages_url(&self) -> String {
		format!("{}/v1/messages", self.config.base_url)
	}

	async fn send_request(&self, request: &AnthropicRequest) -> Result<reqwest::Response, ClientError> {
		let url = self.messages_url();
		debug!(url = %url, stream = ?request.stream, "sending request to Anthropic API");
		trace!(request = ?request, "request payload");

		let response = self
			.http_client
			.post(&url)
			.header("x-api-key", self.config.api_key.expose().as_str())
			.header("anthropic-version", ANTHROPIC_VERSION)
			.header("content-type", "application/json")
			.json(request)
			.send()
			.await
			.map_err(|e| {
				let retryable = e.is_timeout() || e.is_connect();
				error!(error = %e, retryable, "HTTP request failed");
				ClientError {
					message: e.to_string(),
					retryable,
					kind: if e.is_timeout() {
						ClientErrorKind::Timeout
					} else {
						ClientErrorKind::Transport
					},
				}
			})?;

		let status = response.status();
		debug!(status = %status, "received response");

		if !status.is_success() {
			let retry_after_secs = response
				.headers()
				.get(reqwest::header::RETRY_AFTER)
				.and_then(|v| v.to_str().ok())
				.and_then(|v| v.trim().parse::<u64>().ok());
			let body = response.text().await.unwrap_or_default();
			let message = match serde_json::from_str::<AnthropicError>(&body) {
				Ok(api_error) => api_error.error.message,
				Err(_) => body,
			};

			let err = status_error(status, retry_after_secs, message);
			error!(status = %status, body = %err.message, retryable = err.retryable, "API error response");
			return Err(err);
		}

		Ok(response)
	}

	async fn send_with_retry(&self, request: AnthropicRequest) -> Result<reqwest::Response, LlmError> {
		retry(&self.retry_config, || {
			let req = request.clone();
			async move { self.send_request(&req).await }
		})
		.await
		.map_err(LlmError::from)
	}
}

#[async_trait]
impl LlmClient for AnthropicClient {
	#[instrument(skip(self, request), fields(model = %request.model))]
	async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
		info!(messages = request.messages.len(), tools = request.tools.len(), "starting completion request");

		let mut anthropic_request = AnthropicRequest::from(&request);
		anthropic_request.stream = Some(false);

		let response = self.send_with_retry(anthropic_request).await?;
		let body = response.text().await.map_err(|e| {
			error!(error = %e, "failed to read response body");
			LlmError::Http(e.to_string())
		})?;
		trace!(body = %body, "response body");

		let anthropic_response: AnthropicResponse = serde_json::from_str(&body).map_err(|e| {
			error!(error = %e, "failed to parse response");
			LlmError::InvalidResponse(format!("failed to parse response: {e}"))
		})?;

		let llm_response = LlmResponse::from(anthropic_response);
		info!(
			stop_reason = ?llm_response.stop_reason,
			input_tokens = llm_response.usage.input_tokens,
			output_tokens = llm_response.usage.output_tokens,
			"completion request finished"
		);
		Ok(llm_response)
	}

	#[instrument(skip(self, request), fields(model = %request.model))]
	async fn complete_streaming(&self, request: LlmRequest) -> Result<LlmStream, LlmError> {
		info!(messages = request.messages.len(), tools = request.tools.len(), "starting streaming request");

		let mut anthropic_request = AnthropicRequest::from(&request);
		anthropic_request.stream = Some(true);

		let response = self.send_with_retry(anthropic_request).await?;
		debug!("stream connection established");

		Ok(LlmStream::new(Box::pin(parse_sse_stream(response.bytes_stream()))))
	}
}
