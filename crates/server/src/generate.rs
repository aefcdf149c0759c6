use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use chrono::Local;
use proposal_agent::orchestrator::ProposalOrchestrator;
use proposal_agent::source::ProposalBrief;
use proposal_core::config::AppConfig;
use proposal_core::errors::{ApplicationError, ContentError, InterfaceError};
use proposal_core::ooxml::DOCX_CONTENT_TYPE;
use proposal_core::render::{ProposalRenderer, DEFAULT_OUTPUT_PATH};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

pub const MISSING_REQUIREMENTS: &str = "Requirements are required";
const DATE_FORMAT: &str = "%B %d, %Y";

#[derive(Clone)]
pub struct GenerateState {
    config: Arc<AppConfig>,
}

impl GenerateState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }
}

/// Body of `POST /generate`. `requirements` is accepted as an alias of `brief`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    #[serde(alias = "requirements")]
    pub brief: String,
    pub project: String,
    pub customer: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

type GenerateFailure = (StatusCode, Json<GenerateError>);

pub fn router(state: GenerateState) -> Router {
    Router::new().route("/generate", post(generate)).with_state(state)
}

pub async fn generate(
    State(state): State<GenerateState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, GenerateFailure> {
    if request.brief.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(GenerateError { error: MISSING_REQUIREMENTS.to_string(), correlation_id: None }),
        ));
    }

    let correlation_id = Uuid::new_v4().to_string();
    info!(
        event_name = "server.generate.requested",
        correlation_id = %correlation_id,
        project = %request.project,
        customer = %request.customer,
        backend = state.config.content.backend.as_str(),
        "proposal generation requested"
    );

    let bytes = build_proposal(&state.config, request)
        .await
        .map_err(|failure| reject(failure, &correlation_id))?;

    info!(
        event_name = "server.generate.completed",
        correlation_id = %correlation_id,
        bytes = bytes.len(),
        "proposal generated"
    );
    docx_attachment(bytes, &correlation_id)
}

async fn build_proposal(
    config: &AppConfig,
    request: GenerateRequest,
) -> Result<Vec<u8>, ApplicationError> {
    let orchestrator = ProposalOrchestrator::from_config(config)
        .map_err(|error| ApplicationError::Configuration(format!("{error:#}")))?
        .with_date(Local::now().format(DATE_FORMAT).to_string());
    let brief = ProposalBrief::new(request.project, request.customer, request.brief);

    let content = orchestrator.assemble(&brief).await.map_err(|error| {
        match error.downcast_ref::<ContentError>() {
            Some(content_error) => ApplicationError::Content(content_error.clone()),
            None => ApplicationError::Integration(format!("{error:#}")),
        }
    })?;

    let renderer = ProposalRenderer::new(config.render.template_path.as_deref())?;
    Ok(renderer.render_to_bytes(content)?)
}

/// Every failure after the brief check is reported as a 500 with the cause.
fn reject(failure: ApplicationError, correlation_id: &str) -> GenerateFailure {
    let interface = failure.into_interface(correlation_id);
    let detail = match &interface {
        InterfaceError::BadRequest { message, .. }
        | InterfaceError::ServiceUnavailable { message, .. }
        | InterfaceError::Internal { message, .. } => message.clone(),
    };
    error!(
        event_name = "server.generate.failed",
        correlation_id = %correlation_id,
        error = %interface,
        "proposal generation failed"
    );
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(GenerateError { error: detail, correlation_id: Some(correlation_id.to_string()) }),
    )
}

fn docx_attachment(bytes: Vec<u8>, correlation_id: &str) -> Result<Response, GenerateFailure> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, DOCX_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{DEFAULT_OUTPUT_PATH}\""),
        )
        .header("x-correlation-id", correlation_id)
        .body(Body::from(bytes))
        .map_err(|error| {
            reject(ApplicationError::Render(error.to_string()), correlation_id)
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        extract::State,
        http::{header, Request, StatusCode},
        Json,
    };
    use proposal_core::config::{AppConfig, ContentBackend};
    use proposal_core::ooxml::DOCX_CONTENT_TYPE;
    use tower::ServiceExt;

    use super::{generate, router, GenerateRequest, GenerateState, MISSING_REQUIREMENTS};

    fn mock_state() -> GenerateState {
        let mut config = AppConfig::default();
        config.content.backend = ContentBackend::Mock;
        config.content.step_delay_ms = 0;
        config.render.template_path = None;
        GenerateState::new(Arc::new(config))
    }

    #[tokio::test]
    async fn blank_brief_is_rejected_with_bad_request() {
        let request = GenerateRequest { brief: "   ".to_string(), ..GenerateRequest::default() };

        let (status, Json(body)) = generate(State(mock_state()), Json(request))
            .await
            .expect_err("blank brief should be rejected");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, MISSING_REQUIREMENTS);
        assert_eq!(body.correlation_id, None);
    }

    #[tokio::test]
    async fn mock_backend_returns_docx_attachment() {
        let request = GenerateRequest {
            brief: "Migrate mailboxes\nEnable MFA".to_string(),
            project: "Tenant Migration".to_string(),
            customer: "Northwind".to_string(),
        };

        let response =
            generate(State(mock_state()), Json(request)).await.expect("generation succeeds");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).and_then(|value| value.to_str().ok()),
            Some(DOCX_CONTENT_TYPE)
        );
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(disposition.starts_with("attachment;"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn openai_backend_without_key_fails_with_server_error() {
        let mut config = AppConfig::default();
        config.content.backend = ContentBackend::OpenAi;
        config.content.api_key = None;
        config.content.step_delay_ms = 0;
        let state = GenerateState::new(Arc::new(config));
        let request = GenerateRequest { brief: "Enable MFA".to_string(), ..GenerateRequest::default() };

        let (status, Json(body)) =
            generate(State(state), Json(request)).await.expect_err("missing key should fail");

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.error.contains("api_key"));
        assert!(body.correlation_id.is_some());
    }

    #[tokio::test]
    async fn requirements_field_is_accepted_through_the_router() {
        let request = Request::builder()
            .method("POST")
            .uri("/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"requirements": "Single sign-on"}"#))
            .expect("request builds");

        let response = router(mock_state()).oneshot(request).await.expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_requirements_through_the_router_return_error_json() {
        let request = Request::builder()
            .method("POST")
            .uri("/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"requirements": ""}"#))
            .expect("request builds");

        let response = router(mock_state()).oneshot(request).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("error json");
        assert_eq!(body, serde_json::json!({ "error": "Requirements are required" }));
    }
}
