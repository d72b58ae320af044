//! Liveness probe. Does not check either database.

use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Health {
    pub ok: bool,
}

pub async fn health() -> Json<Health> {
    Json(Health { ok: true })
}
