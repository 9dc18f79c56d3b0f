// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Chat handlers: one blocking endpoint and one SSE endpoint over the same
//! conversation loop.

use std::convert::Infallible;

use axum::{
	extract::State,
	response::sse::{Event, Sse},
	Json,
};
use parley_agent::{ChatOutcome, ChatTurn, LoopEvent};
use parley_common_core::{ConversationEntry, Role, Usage};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::{api::AppState, error::ServerError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
	#[serde(default)]
	pub project_id: String,
	#[serde(default)]
	pub agent_id: String,
	#[serde(default)]
	pub message: String,
	#[serde(default)]
	pub history: Vec<HistoryEntry>,
	/// Overrides the server default for tool use.
	#[serde(default)]
	pub tools: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryEntry {
	pub role: String,
	#[serde(default)]
	pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
	pub reply: String,
	pub usage: Usage,
	pub iterations: u32,
	pub incomplete: bool,
}

impl From<ChatOutcome> for ChatResponse {
	fn from(outcome: ChatOutcome) -> Self {
		Self {
			reply: outcome.reply,
			usage: outcome.usage,
			iterations: outcome.iterations,
			incomplete: outcome.incomplete,
		}
	}
}

/// Validates the request and resolves persona and project into a turn.
async fn prepare_turn(state: &AppState, request: ChatRequest) -> Result<ChatTurn, ServerError> {
	debug!(
		project_id = %request.project_id,
		agent_id = %request.agent_id,
		history = request.history.len(),
		tools = ?request.tools,
		"chat request"
	);
	for (field, value) in [
		("projectId", &request.project_id),
		("agentId", &request.agent_id),
		("message", &request.message),
	] {
		if value.trim().is_empty() {
			return Err(ServerError::BadRequest(format!("{field} is required")));
		}
	}

	let history = request
		.history
		.into_iter()
		.enumerate()
		.map(|(i, entry)| {
			Role::parse(&entry.role)
				.map(|role| ConversationEntry {
					role,
					content: entry.content,
				})
				.ok_or_else(|| {
					ServerError::BadRequest(format!(
						"history[{i}].role must be 'user' or 'assistant', got '{}'",
						entry.role
					))
				})
		})
		.collect::<Result<Vec<_>, _>>()?;

	let persona = state.personas.get_by_id(&request.agent_id).await?;
	let project = state
		.projects
		.get(&request.project_id)
		.await
		.ok_or_else(|| ServerError::NotFound(format!("Project not found: {}", request.project_id)))?;

	Ok(ChatTurn {
		project_id: project.id,
		persona,
		history,
		message: request.message,
		tools_enabled: request.tools.unwrap_or(state.tools_enabled),
		working_directory: Some(project.path),
	})
}

/// POST /api/chat
pub async fn chat(
	State(state): State<AppState>,
	Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
	let turn = prepare_turn(&state, request).await?;
	let outcome = state.chat.run(turn).await?;
	Ok(Json(ChatResponse::from(outcome)))
}

/// POST /api/chat/stream - Server-sent events.
///
/// Each event is a bare `data:` line holding one JSON object: `text`
/// fragments, `tool` starts, then exactly one terminal `done` or `error`.
/// The loop keeps running if the client goes away.
pub async fn chat_stream(
	State(state): State<AppState>,
	Json(request): Json<ChatRequest>,
) -> Result<Sse<ReceiverStream<Result<Event, Infallible>>>, ServerError> {
	let turn = prepare_turn(&state, request).await?;

	let (sse_tx, sse_rx) = mpsc::channel::<Result<Event, Infallible>>(64);
	let (event_tx, mut event_rx) = mpsc::channel::<LoopEvent>(64);

	let chat = state.chat.clone();
	let run = tokio::spawn(async move { chat.run_streaming(turn, event_tx).await });

	tokio::spawn(async move {
		// Ends once the loop drops its sender.
		while let Some(event) = event_rx.recv().await {
			let payload = match event {
				LoopEvent::Text(text) => json!({ "text": text }),
				LoopEvent::ToolStarted { name, id } => json!({ "tool": name, "id": id }),
			};
			send(&sse_tx, &payload).await;
		}

		let terminal = match run.await {
			Ok(Ok(outcome)) => done_payload(outcome),
			Ok(Err(err)) => {
				let (_, _, message) = ServerError::from(err).parts();
				warn!(error = %message, "streaming chat failed");
				json!({ "error": message })
			}
			Err(e) => {
				warn!(error = %e, "streaming chat task failed");
				json!({ "error": "An internal error occurred" })
			}
		};
		send(&sse_tx, &terminal).await;
	});

	Ok(Sse::new(ReceiverStream::new(sse_rx)))
}

fn done_payload(outcome: ChatOutcome) -> Value {
	json!({
		"done": true,
		"reply": outcome.reply,
		"usage": outcome.usage,
		"incomplete": outcome.incomplete,
	})
}

async fn send(tx: &mpsc::Sender<Result<Event, Infallible>>, payload: &Value) {
	if tx
		.send(Ok(Event::default().data(payload.to_string())))
		.await
		.is_err()
	{
		debug!("client disconnected, continuing without it");
	}
}
