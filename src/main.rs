use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fhir::Bundle;
use invrec_core::{
    AssembledBundle, Attachment, AttachmentSource, BuildInput, EngineConfig, EngineError,
    FeatureFlags, HttpSubmissionSink, InvoiceBundleEngine, SubmissionConfig, SubmissionOutcome,
    SubmissionSink, Totals, flag_from_env_value, practitioner_from_env_values,
};

/// Application state shared across REST API handlers
#[derive(Clone)]
struct AppState {
    engine: InvoiceBundleEngine,
    /// Absent when no submission endpoint is configured.
    sink: Option<Arc<dyn SubmissionSink>>,
}

type ApiError = (StatusCode, Json<Value>);

/// A build request: the form fields plus inline attachments.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildRequest {
    #[serde(flatten)]
    form: BuildInput,
    #[serde(default)]
    attachments: Vec<InlineAttachment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineAttachment {
    filename: String,
    #[serde(default)]
    mime_type: Option<String>,
    /// Standard base64, no `data:` prefix.
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildResponse {
    bundle: Bundle,
    totals: Totals,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    bundle_id: String,
    totals: Totals,
    outcome: SubmissionOutcome,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    time: String,
}

/// Main entry point for the invoice record service
///
/// # Environment Variables
/// - `INVREC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `INVREC_PRACTITIONER_ID`, `INVREC_PRACTITIONER_NAME`, `INVREC_PRACTITIONER_LICENSE`:
///   identity of the authoring practitioner (name and license required)
/// - `INVREC_LANGUAGE`, `INVREC_CURRENCY`: record language tag and currency
/// - `INVREC_INCLUDE_ORGANIZATION`, `INVREC_INCLUDE_ENCOUNTER`, `INVREC_INCLUDE_ATTESTER`,
///   `INVREC_ATTACH_PROFILES`: feature toggles (default on)
/// - `INVREC_SUBMIT_URL`, `INVREC_AUTH_TOKEN`: submission endpoint and bearer token
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("invrec=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("INVREC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let engine = InvoiceBundleEngine::new(engine_config_from_env()?);
    let sink = match std::env::var("INVREC_SUBMIT_URL") {
        Ok(endpoint) if !endpoint.trim().is_empty() => {
            let config = SubmissionConfig::new(endpoint)
                .with_auth_token(std::env::var("INVREC_AUTH_TOKEN").ok());
            let sink: Arc<dyn SubmissionSink> = Arc::new(HttpSubmissionSink::new(config)?);
            Some(sink)
        }
        _ => {
            tracing::warn!("INVREC_SUBMIT_URL not set, submission disabled");
            None
        }
    };

    tracing::info!("++ Starting invoice record REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app(AppState { engine, sink })).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/invoice-bundles", post(build_bundle))
        .route("/invoice-bundles/submit", post(submit_bundle))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn engine_config_from_env() -> anyhow::Result<EngineConfig> {
    let env = |key: &str| std::env::var(key).ok();

    let practitioner = practitioner_from_env_values(
        env("INVREC_PRACTITIONER_ID"),
        env("INVREC_PRACTITIONER_NAME"),
        env("INVREC_PRACTITIONER_LICENSE"),
    )?;
    let features = FeatureFlags {
        include_organization_panel: flag_from_env_value(
            env("INVREC_INCLUDE_ORGANIZATION"),
            true,
        )?,
        include_encounter: flag_from_env_value(env("INVREC_INCLUDE_ENCOUNTER"), true)?,
        include_attester: flag_from_env_value(env("INVREC_INCLUDE_ATTESTER"), true)?,
    };

    let mut config = EngineConfig::new(practitioner)?
        .with_features(features)
        .with_profiles(flag_from_env_value(env("INVREC_ATTACH_PROFILES"), true)?);
    if let Some(language) = env("INVREC_LANGUAGE") {
        config = config.with_language(&language)?;
    }
    if let Some(currency) = env("INVREC_CURRENCY") {
        config = config.with_currency(&currency)?;
    }
    Ok(config)
}

/// Health check endpoint for the REST API
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        time: chrono::Utc::now().to_rfc3339(),
    })
}

/// Build an invoice document bundle
///
/// # Returns
/// * `Ok(Json<BuildResponse>)` - The bundle and its reconciled totals
/// * `Err(422)` - The input was refused; the body lists every issue
/// * `Err(400)` - An attachment could not be decoded
async fn build_bundle(
    State(state): State<AppState>,
    Json(req): Json<BuildRequest>,
) -> Result<Json<BuildResponse>, ApiError> {
    let assembled = build(&state, req).await?;
    Ok(Json(BuildResponse {
        bundle: assembled.bundle,
        totals: assembled.totals,
    }))
}

/// Build an invoice document bundle and submit it
///
/// The submission outcome is returned as-is; nothing is retried. A failed submission answers
/// `502` with the outcome in the body.
async fn submit_bundle(
    State(state): State<AppState>,
    Json(req): Json<BuildRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let Some(sink) = state.sink.clone() else {
        return Err(error_body(
            StatusCode::SERVICE_UNAVAILABLE,
            "submission endpoint not configured",
        ));
    };

    let assembled = build(&state, req).await?;
    let bundle_id = assembled.bundle.id.clone();
    let totals = assembled.totals;
    let outcome = sink.submit(&assembled.into_submission()).await;

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((
        status,
        Json(SubmitResponse {
            bundle_id,
            totals,
            outcome,
        }),
    ))
}

async fn build(state: &AppState, req: BuildRequest) -> Result<AssembledBundle, ApiError> {
    let sources = req
        .attachments
        .into_iter()
        .map(decode_attachment)
        .collect::<Result<Vec<_>, _>>()?;

    state
        .engine
        .build(&req.form, sources)
        .await
        .map_err(|e| match e {
            EngineError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "validation failed", "issues": errors })),
            ),
            EngineError::AttachmentRead(e) => error_body(StatusCode::BAD_REQUEST, &e.to_string()),
            other => {
                tracing::error!("Build bundle error: {:?}", other);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        })
}

fn decode_attachment(inline: InlineAttachment) -> Result<AttachmentSource, ApiError> {
    let bytes = general_purpose::STANDARD
        .decode(inline.data.trim())
        .map_err(|e| {
            error_body(
                StatusCode::BAD_REQUEST,
                &format!("attachment '{}' is not valid base64: {e}", inline.filename),
            )
        })?;

    let attachment = match inline.mime_type.as_deref() {
        Some(mime) => Attachment::new(&inline.filename, mime, bytes),
        None => Attachment::detected(&inline.filename, bytes),
    }
    .map_err(|e| error_body(StatusCode::BAD_REQUEST, &e.to_string()))?;

    Ok(AttachmentSource::Memory(attachment))
}

fn error_body(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}
