// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server-Sent Events parser for the streaming Messages API.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::Stream;
use parley_common_core::{ContentBlock, LlmError, LlmEvent, LlmResponse, Usage};
use pin_project_lite::pin_project;
use serde::Deserialize;
use tracing::{debug, error, trace, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
	MessageStart {
		message: MessageStartData,
	},
	ContentBlockStart {
		index: usize,
		content_block: StartBlock,
	},
	ContentBlockDelta {
		index: usize,
		delta: ContentDelta,
	},
	ContentBlockStop {
		index: usize,
	},
	MessageDelta {
		delta: MessageDeltaData,
		usage: Option<MessageDeltaUsage>,
	},
	MessageStop,
	Ping,
	Error {
		error: StreamErrorData,
	},
}

#[derive(Debug, Clone, Deserialize)]
struct MessageStartData {
	id: String,
	model: String,
	usage: Option<MessageStartUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct MessageStartUsage {
	input_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct MessageDeltaUsage {
	output_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StartBlock {
	Text { text: String },
	ToolUse { id: String, name: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentDelta {
	TextDelta { text: String },
	InputJsonDelta { partial_json: String },
}

#[derive(Debug, Clone, Deserialize)]
struct MessageDeltaData {
	stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct StreamErrorData {
	#[serde(rename = "type")]
	error_type: String,
	message: String,
}

#[derive(Debug)]
enum PartialBlock {
	Text(String),
	ToolUse {
		id: String,
		name: String,
		arguments_json: String,
	},
}

impl PartialBlock {
	fn finish(self) -> ContentBlock {
		match self {
			PartialBlock::Text(text) => ContentBlock::Text { text },
			PartialBlock::ToolUse {
				id,
				name,
				arguments_json,
			} => {
				let input = match serde_json::from_str::<serde_json::Value>(&arguments_json) {
					Ok(serde_json::Value::Null) => serde_json::json!({}),
					Ok(value) => value,
					Err(e) => {
						if !arguments_json.is_empty() {
							warn!(
								id = %id,
								name = %name,
								error = %e,
								raw = %arguments_json,
								"unparseable tool arguments, using empty object"
							);
						}
						serde_json::json!({})
					}
				};
				ContentBlock::ToolUse { id, name, input }
			}
		}
	}
}

/// Blocks accumulate by index so the completed response keeps API order.
#[derive(Debug, Default)]
struct StreamState {
	blocks: BTreeMap<usize, PartialBlock>,
	stop_reason: Option<String>,
	input_tokens: u32,
	output_tokens: u32,
}

pin_project! {
	pub struct SseStream<S> {
		#[pin]
		inner: S,
		buffer: Vec<u8>,
		state: StreamState,
		finished: bool,
	}
}

impl<S> SseStream<S> {
	fn new(inner: S) -> Self {
		Self {
			inner,
			buffer: Vec::new(),
			state: StreamState::default(),
			finished: false,
		}
	}
}

impl<S, E> Stream for SseStream<S>
where
	S: Stream<Item = Result<Bytes, E>>,
	E: std::error::Error,
{
	type Item = LlmEvent;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		let mut this = self.project();

		if *this.finished {
			return Poll::Ready(None);
		}

		loop {
			if let Some(event) = try_parse_event(this.buffer, this.state) {
				match event {
					Ok(Some(llm_event)) => {
						if matches!(llm_event, LlmEvent::Completed(_) | LlmEvent::Error(_)) {
							*this.finished = true;
						}
						return Poll::Ready(Some(llm_event));
					}
					Ok(None) => continue,
					Err(e) => {
						*this.finished = true;
						return Poll::Ready(Some(LlmEvent::Error(e)));
					}
				}
			}

			match this.inner.as_mut().poll_next(cx) {
				Poll::Ready(Some(Ok(bytes))) => {
					trace!(chunk_len = bytes.len(), "received SSE chunk");
					// Raw CR only appears in framing; JSON payloads escape it.
					this.buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
				}
				Poll::Ready(Some(Err(e))) => {
					error!(error = %e, "stream error");
					*this.finished = true;
					return Poll::Ready(Some(LlmEvent::Error(LlmError::Http(e.to_string()))));
				}
				Poll::Ready(None) => {
					debug!("stream ended");
					*this.finished = true;
					return Poll::Ready(None);
				}
				Poll::Pending => return Poll::Pending,
			}
		}
	}
}

/// Events are split on raw bytes and decoded whole, so a multi-byte character
/// straddling two chunks is never cut.
fn try_parse_event(
	buffer: &mut Vec<u8>,
	state: &mut StreamState,
) -> Option<Result<Option<LlmEvent>, LlmError>> {
	let event_end = buffer.windows(2).position(|w| w == b"\n\n")?;
	let event_bytes: Vec<u8> = buffer.drain(..event_end + 2).collect();
	let event_text = String::from_utf8_lossy(&event_bytes[..event_end]);

	let data: Vec<&str> = event_text
		.lines()
		.filter_map(|line| line.strip_prefix("data:"))
		.map(str::trim_start)
		.collect();
	if data.is_empty() {
		return Some(Ok(None));
	}
	let data = data.join("\n");

	trace!(data = %data, "parsing SSE event");

	let stream_event: StreamEvent = match serde_json::from_str(&data) {
		Ok(e) => e,
		Err(e) => {
			warn!(error = %e, data = %data, "skipping unrecognised SSE event");
			return Some(Ok(None));
		}
	};

	Some(process_stream_event(stream_event, state))
}

fn process_stream_event(
	event: StreamEvent,
	state: &mut StreamState,
) -> Result<Option<LlmEvent>, LlmError> {
	match event {
		StreamEvent::MessageStart { message } => {
			debug!(id = %message.id, model = %message.model, "message started");
			if let Some(usage) = message.usage {
				state.input_tokens = usage.input_tokens;
			}
			Ok(None)
		}
		StreamEvent::ContentBlockStart {
			index,
			content_block,
		} => match content_block {
			StartBlock::Text { text } => {
				state.blocks.insert(index, PartialBlock::Text(text.clone()));
				if text.is_empty() {
					Ok(None)
				} else {
					Ok(Some(LlmEvent::TextDelta { content: text }))
				}
			}
			StartBlock::ToolUse { id, name } => {
				debug!(index, id = %id, name = %name, "tool use started");
				state.blocks.insert(
					index,
					PartialBlock::ToolUse {
						id,
						name,
						arguments_json: String::new(),
					},
				);
				Ok(None)
			}
		},
		StreamEvent::ContentBlockDelta { index, delta } => match delta {
			ContentDelta::TextDelta { text } => match state
				.blocks
				.entry(index)
				.or_insert_with(|| PartialBlock::Text(String::new()))
			{
				PartialBlock::Text(buf) => {
					buf.push_str(&text);
					Ok(Some(LlmEvent::TextDelta { content: text }))
				}
				PartialBlock::ToolUse { .. } => {
					warn!(index, "text delta for a tool_use block");
					Ok(None)
				}
			},
			ContentDelta::InputJsonDelta { partial_json } => match state.blocks.get_mut(&index) {
				Some(PartialBlock::ToolUse {
					id,
					name,
					arguments_json,
				}) => {
					arguments_json.push_str(&partial_json);
					Ok(Some(LlmEvent::ToolCallDelta {
						call_id: id.clone(),
						tool_name: name.clone(),
						arguments_fragment: partial_json,
					}))
				}
				_ => {
					warn!(index, "input delta for unknown tool block");
					Ok(None)
				}
			},
		},
		StreamEvent::ContentBlockStop { index } => {
			trace!(index, "content block stopped");
			Ok(None)
		}
		StreamEvent::MessageDelta { delta, usage } => {
			if let Some(reason) = delta.stop_reason {
				debug!(stop_reason = %reason, "message delta with stop reason");
				state.stop_reason = Some(reason);
			}
			if let Some(u) = usage {
				state.output_tokens = u.output_tokens;
			}
			Ok(None)
		}
		StreamEvent::MessageStop => {
			debug!(blocks = state.blocks.len(), "message completed");
			let content = std::mem::take(&mut state.blocks)
				.into_values()
				.map(PartialBlock::finish)
				.collect();
			Ok(Some(LlmEvent::Completed(LlmResponse {
				content,
				usage: Usage {
					input_tokens: state.input_tokens,
					output_tokens: state.output_tokens,
				},
				stop_reason: state.stop_reason.take(),
			})))
		}
		StreamEvent::Ping => {
			trace!("ping");
			Ok(None)
		}
		StreamEvent::Error { error } => {
			error!(error_type = %error.error_type, message = %error.message, "stream error from API");
			Err(LlmError::Api(error.message))
		}
	}
}

pub fn parse_sse_stream<S, E>(stream: S) -> impl Stream<Item = LlmEvent>
where
	S: Stream<Item = Result<Bytes, E>>,
	E: std::error::Error,
{
	SseStream::new(stream)
}
