// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Tools a persona can call while chatting about a project.
//!
//! The catalog is closed: [`ToolKind`] lists every tool, and a model's call is
//! parsed into a typed [`ToolInvocation`] before anything runs. Unknown names
//! and malformed arguments are rejected at that boundary and reported back
//! to the model as an `{"error": ...}` payload.

mod kind;
mod list_directory;
mod path;
mod read_file;
mod registry;
mod working_directory;
mod write_file;

pub use kind::{ToolInvocation, ToolKind};
pub use list_directory::{DirectoryEntry, EntryKind, ListDirectoryArgs};
pub use read_file::{ReadFileArgs, MAX_READ_BYTES};
pub use registry::{ToolOutcome, ToolRegistry, ToolResult};
pub use write_file::WriteFileArgs;
