// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Persona definitions loaded from markdown files, and the transcript
//! builder that turns a persona into a model-ready system instruction.

mod error;
mod persona;
mod store;
mod transcript;

pub use error::PersonaError;
pub use persona::{parse_persona, Persona, PersonaCommand};
pub use store::PersonaStore;
pub use transcript::{build_messages, build_system_instruction};
