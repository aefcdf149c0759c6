use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use proposal_core::config::AppConfig;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    config: Arc<AppConfig>,
}

impl HealthState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub content_backend: HealthCheck,
    pub template: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// A missing template only degrades styling, so the service stays ready.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let config = &state.config;
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "proposal-server runtime initialized".to_string(),
        },
        content_backend: HealthCheck {
            status: "ready",
            detail: format!("{} backend selected", config.content.backend.as_str()),
        },
        template: template_check(config.render.template_path.clone()),
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

fn template_check(path: Option<PathBuf>) -> HealthCheck {
    match path {
        Some(path) if path.exists() => {
            HealthCheck { status: "ready", detail: format!("template `{}` found", path.display()) }
        }
        Some(path) => HealthCheck {
            status: "defaults",
            detail: format!("template `{}` not found; built-in styles in use", path.display()),
        },
        None => HealthCheck {
            status: "defaults",
            detail: "no template configured; built-in styles in use".to_string(),
        },
    }
}
