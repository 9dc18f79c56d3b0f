// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP server for chatting with personas about local projects.
//!
//! Routes live in [`routes`]; [`api::create_router`] assembles them over an
//! [`AppState`] that owns the persona store, the project store and the
//! conversation loop.

pub mod api;
pub mod error;
pub mod file_tree;
pub mod project_store;
pub mod routes;

pub use api::{create_app_state, create_router, AppState};
pub use error::{ErrorResponse, ServerError};
pub use file_tree::{build_tree, FileNode, MAX_DEPTH};
pub use project_store::{Project, ProjectStore};
