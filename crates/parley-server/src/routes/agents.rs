// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Persona listing handlers.

use axum::{
	extract::{Path, State},
	Json,
};
use parley_persona::Persona;

use crate::{api::AppState, error::ServerError};

/// GET /api/agents - Every persona that parsed, in file order.
pub async fn list_agents(State(state): State<AppState>) -> Result<Json<Vec<Persona>>, ServerError> {
	let personas = state.personas.load_all().await?;
	tracing::debug!(count = personas.len(), "listing agents");
	Ok(Json(personas))
}

/// GET /api/agents/{id}
pub async fn get_agent(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Persona>, ServerError> {
	Ok(Json(state.personas.get_by_id(&id).await?))
}
