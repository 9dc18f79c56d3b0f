// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration sections for parley-server.

pub mod chat;
pub mod http;
pub mod llm;
pub mod logging;
pub mod paths;

pub use chat::{ChatConfig, ChatConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use llm::{LlmConfig, LlmConfigLayer, LlmProvider};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use paths::{PathsConfig, PathsConfigLayer};
