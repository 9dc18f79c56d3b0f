// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use std::sync::Arc;

use parley_common_core::{
	ChatError, ChatResult, ConversationEntry, ConversationStore, LlmClient, LlmError, LlmEvent,
	LlmRequest, LlmResponse, Message, ToolContext, ToolDefinition, Usage,
};
use parley_persona::{build_messages, build_system_instruction, Persona};
use parley_tools::ToolRegistry;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::config::{LoopConfig, INCOMPLETE_REPLY_MARKER};
use crate::state::LoopState;

/// One chat request, ready for the loop.
#[derive(Clone, Debug)]
pub struct ChatTurn {
	pub project_id: String,
	pub persona: Persona,
	pub history: Vec<ConversationEntry>,
	pub message: String,
	pub tools_enabled: bool,
	pub working_directory: Option<PathBuf>,
}

/// Result of a completed loop.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatOutcome {
	pub reply: String,
	pub usage: Usage,
	pub iterations: u32,
	/// The iteration cap ended the loop before a tool-free answer.
	pub incomplete: bool,
}

/// Progress reported while a streaming loop runs.
#[derive(Clone, Debug, PartialEq)]
pub enum LoopEvent {
	Text(String),
	ToolStarted { name: String, id: String },
}

/// Drives the model and the tool registry for one chat request at a time.
///
/// A loop holds no per-conversation state, so one instance serves
/// concurrent requests.
pub struct ConversationLoop {
	llm: Arc<dyn LlmClient>,
	tools: ToolRegistry,
	store: Arc<dyn ConversationStore>,
	config: LoopConfig,
}

impl ConversationLoop {
	pub fn new(
		llm: Arc<dyn LlmClient>,
		tools: ToolRegistry,
		store: Arc<dyn ConversationStore>,
		config: LoopConfig,
	) -> Self {
		Self {
			llm,
			tools,
			store,
			config,
		}
	}

	/// Runs the loop to completion and persists the exchange.
	#[instrument(skip(self, turn), fields(project_id = %turn.project_id, persona = %turn.persona.id))]
	pub async fn run(&self, turn: ChatTurn) -> ChatResult<ChatOutcome> {
		self.run_inner(turn, None).await
	}

	/// Like [`run`](Self::run), forwarding text fragments and tool starts to
	/// `events` as they happen. A closed receiver does not stop the loop.
	#[instrument(skip(self, turn, events), fields(project_id = %turn.project_id, persona = %turn.persona.id))]
	pub async fn run_streaming(
		&self,
		turn: ChatTurn,
		events: mpsc::Sender<LoopEvent>,
	) -> ChatResult<ChatOutcome> {
		self.run_inner(turn, Some(&events)).await
	}

	async fn run_inner(
		&self,
		turn: ChatTurn,
		events: Option<&mpsc::Sender<LoopEvent>>,
	) -> ChatResult<ChatOutcome> {
		let outcome = match self.config.request_timeout {
			Some(limit) => tokio::time::timeout(limit, self.drive(&turn, events))
				.await
				.map_err(|_| {
					warn!(timeout = ?limit, "chat request deadline exceeded");
					ChatError::Timeout(format!("chat request exceeded {limit:?}"))
				})??,
			None => self.drive(&turn, events).await?,
		};

		self.store
			.append_conversation(
				&turn.project_id,
				vec![
					ConversationEntry::user(turn.message.clone()),
					ConversationEntry::assistant(outcome.reply.clone()),
				],
			)
			.await?;

		info!(
			iterations = outcome.iterations,
			incomplete = outcome.incomplete,
			input_tokens = outcome.usage.input_tokens,
			output_tokens = outcome.usage.output_tokens,
			"chat completed"
		);
		Ok(outcome)
	}

	async fn drive(
		&self,
		turn: &ChatTurn,
		events: Option<&mpsc::Sender<LoopEvent>>,
	) -> ChatResult<ChatOutcome> {
		let registry = if turn.tools_enabled && self.llm.supports_tools() {
			self.tools.clone()
		} else {
			ToolRegistry::empty()
		};
		let definitions: Vec<ToolDefinition> = registry.definitions();
		let ctx = match &turn.working_directory {
			Some(dir) => ToolContext::new(dir),
			None => ToolContext::detached(),
		};

		let system = build_system_instruction(
			&turn.persona,
			&definitions,
			turn.working_directory.as_deref(),
		);
		let mut transcript = build_messages(&turn.history, &turn.message);
		let mut usage = Usage::default();
		let mut last_text: Option<String> = None;
		let mut state = LoopState::AwaitingModel { iteration: 1 };

		loop {
			let from = state.name();
			let next = match state {
				LoopState::AwaitingModel { iteration } => {
					let request = LlmRequest::new(self.config.model.clone(), self.config.max_tokens)
						.with_system(system.clone())
						.with_messages(transcript.clone())
						.with_tools(definitions.clone())
						.with_working_directory(turn.working_directory.clone());

					debug!(iteration, messages = request.messages.len(), "sending model request");
					let response = self.ask(request, events).await?;
					usage += response.usage;

					let text = response.text();
					if !text.is_empty() {
						last_text = Some(text.clone());
					}

					let calls = response.tool_calls();
					if calls.is_empty() {
						LoopState::Done {
							reply: text,
							iterations: iteration,
							incomplete: false,
						}
					} else {
						LoopState::ExecutingTools { iteration, calls }
					}
				}

				LoopState::ExecutingTools { iteration, calls } => {
					for call in &calls {
						transcript.push(Message::tool_use(call));
						if let Some(tx) = events {
							let _ = tx
								.send(LoopEvent::ToolStarted {
									name: call.name.clone(),
									id: call.id.clone(),
								})
								.await;
						}

						debug!(tool = %call.name, call_id = %call.id, "executing tool");
						let result = registry.execute(call, &ctx).await;
						transcript.push(result.to_message());
					}

					if iteration >= self.config.max_iterations {
						LoopState::IterationLimitReached { iteration }
					} else {
						LoopState::AwaitingModel {
							iteration: iteration + 1,
						}
					}
				}

				LoopState::IterationLimitReached { iteration } => {
					warn!(iteration, "tool iteration limit reached");
					LoopState::Done {
						reply: last_text
							.take()
							.unwrap_or_else(|| INCOMPLETE_REPLY_MARKER.to_string()),
						iterations: iteration,
						incomplete: true,
					}
				}

				LoopState::Done {
					reply,
					iterations,
					incomplete,
				} => {
					return Ok(ChatOutcome {
						reply,
						usage,
						iterations,
						incomplete,
					});
				}
			};

			info!(from, to = next.name(), "state transition");
			state = next;
		}
	}

	async fn ask(
		&self,
		request: LlmRequest,
		events: Option<&mpsc::Sender<LoopEvent>>,
	) -> ChatResult<LlmResponse> {
		let Some(tx) = events else {
			return Ok(self.llm.complete(request).await?);
		};

		let mut stream = self.llm.complete_streaming(request).await?;
		while let Some(event) = stream.next().await {
			match event {
				LlmEvent::TextDelta { content } => {
					let _ = tx.send(LoopEvent::Text(content)).await;
				}
				LlmEvent::ToolCallDelta { .. } => {}
				LlmEvent::Completed(response) => return Ok(response),
				LlmEvent::Error(err) => return Err(err.into()),
			}
		}

		Err(ChatError::from(LlmError::InvalidResponse(
			"stream ended without a completed response".to_string(),
		)))
	}
}
