// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use parley_common_core::ToolCall;

/// Where the loop is. Iterations count model round-trips, starting at 1.
#[derive(Clone, Debug, PartialEq)]
pub enum LoopState {
	AwaitingModel {
		iteration: u32,
	},
	ExecutingTools {
		iteration: u32,
		calls: Vec<ToolCall>,
	},
	IterationLimitReached {
		iteration: u32,
	},
	Done {
		reply: String,
		iterations: u32,
		incomplete: bool,
	},
}

impl LoopState {
	pub fn name(&self) -> &'static str {
		match self {
			LoopState::AwaitingModel { .. } => "AwaitingModel",
			LoopState::ExecutingTools { .. } => "ExecutingTools",
			LoopState::IterationLimitReached { .. } => "IterationLimitReached",
			LoopState::Done { .. } => "Done",
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, LoopState::Done { .. })
	}
}
