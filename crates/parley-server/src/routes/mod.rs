// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

pub mod agents;
pub mod chat;
pub mod files;
pub mod health;
pub mod projects;
