// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! [`LlmClient`](parley_common_core::LlmClient) backed by a local CLI such as
//! `claude -p`: the rendered conversation goes to stdin, the reply comes back
//! on stdout.

mod client;
mod prompt;

pub use client::{CliClient, CliConfig, DEFAULT_TIMEOUT};
pub use prompt::render_prompt;
