// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The conversation loop: alternates model round-trips with local tool
//! execution until the model answers without tools or the iteration cap
//! is hit.

mod config;
mod runner;
mod state;

pub use config::{LoopConfig, INCOMPLETE_REPLY_MARKER, MAX_TOOL_ITERATIONS};
pub use runner::{ChatOutcome, ChatTurn, ConversationLoop, LoopEvent};
pub use state::LoopState;
