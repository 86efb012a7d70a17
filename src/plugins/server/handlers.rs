use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::{prelude::*, state::AppState};

#[derive(Debug, Serialize)]
pub struct Health {
  pub status: &'static str,
  pub profiles: u64,
  pub registrations: usize,
}

pub async fn health(
  State(app): State<Arc<AppState>>,
) -> Result<Json<Health>, (StatusCode, String)> {
  let profiles = app.sv().profile.count().await.map_err(|err| {
    error!("Health check failed: {err}");
    (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
  })?;

  Ok(Json(Health {
    status: "ok",
    profiles,
    registrations: app.registrations.len(),
  }))
}
