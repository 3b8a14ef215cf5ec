use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use emh_core::{
    Assessment, CompatibilityInfo, CoreConfig, DecodeError, EmergencyProfile, EncodeError,
    ProfileError, ScanRecord, ScanService, blood,
    config::{max_payload_bytes_from_env_value, supported_versions_from_env_value},
    constants::{
        DEFAULT_LOG_FILTER, DEFAULT_REST_ADDR, MAX_PAYLOAD_BYTES_ENV, REST_ADDR_ENV,
        SUPPORTED_VERSIONS_ENV,
    },
    normalise::normalise_profile,
};

/// Application state shared across REST API handlers.
#[derive(Clone)]
struct AppState {
    scan_service: Arc<ScanService>,
}

#[derive(Serialize, ToSchema)]
struct HealthRes {
    ok: bool,
    message: String,
}

#[derive(Debug, Serialize, ToSchema)]
struct ErrorRes {
    /// Failure category, e.g. `format`, `integrity`, `profile`.
    kind: String,
    message: String,
}

#[derive(Deserialize, ToSchema)]
struct ClassifyReq {
    /// Patient document in any shape the record store keeps it.
    #[schema(value_type = Object)]
    profile: serde_json::Value,
}

#[derive(Serialize, ToSchema)]
struct AssessmentRes {
    #[schema(value_type = Object)]
    assessment: Assessment,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct EncodeReq {
    /// Patient document in any shape the record store keeps it.
    #[schema(value_type = Object)]
    profile: serde_json::Value,
    /// Issue timestamp (RFC 3339). Defaults to now.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    issued_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct EncodeRes {
    qr_text: String,
    bytes: usize,
    version: u32,
    /// Optional fields dropped to meet the size budget.
    omitted: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
struct ScanReq {
    /// Text read from the QR code.
    raw: String,
}

#[derive(Serialize, ToSchema)]
struct ScanRes {
    #[schema(value_type = Object)]
    record: ScanRecord,
    #[schema(value_type = Object)]
    profile: EmergencyProfile,
    #[schema(value_type = Object)]
    assessment: Assessment,
}

#[derive(Serialize, ToSchema)]
struct BloodRes {
    #[schema(value_type = Object)]
    compatibility: CompatibilityInfo,
}

type ApiError = (StatusCode, Json<ErrorRes>);

#[derive(OpenApi)]
#[openapi(
    paths(health, classify, encode, scan, blood_compatibility),
    components(schemas(
        HealthRes,
        ErrorRes,
        ClassifyReq,
        AssessmentRes,
        EncodeReq,
        EncodeRes,
        ScanReq,
        ScanRes,
        BloodRes
    ))
)]
struct ApiDoc;

/// Main entry point for the EMH REST service.
///
/// # Environment Variables
/// - `EMH_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `EMH_MAX_PAYLOAD_BYTES`: QR text budget in bytes (default: 1200)
/// - `EMH_SUPPORTED_VERSIONS`: accepted payload versions, comma separated (default: "1")
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(DEFAULT_LOG_FILTER.parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CoreConfig::new(
        max_payload_bytes_from_env_value(std::env::var(MAX_PAYLOAD_BYTES_ENV).ok())?,
        supported_versions_from_env_value(std::env::var(SUPPORTED_VERSIONS_ENV).ok())?,
    )?;
    let rest_addr = std::env::var(REST_ADDR_ENV).unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    tracing::info!(
        max_payload_bytes = config.max_payload_bytes(),
        "++ Starting EMH REST on {}",
        rest_addr
    );

    let app = router(AppState {
        scan_service: Arc::new(ScanService::from_config(&config)),
    });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/classify", post(classify))
        .route("/encode", post(encode))
        .route("/scan", post(scan))
        .route("/blood/:group", get(blood_compatibility))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_error(status: StatusCode, kind: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorRes {
            kind: kind.to_string(),
            message: message.into(),
        }),
    )
}

fn profile_error(err: ProfileError) -> ApiError {
    tracing::warn!(error = %err, "rejected patient document");
    api_error(StatusCode::UNPROCESSABLE_ENTITY, "profile", err.to_string())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API.
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "EMH is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/classify",
    request_body = ClassifyReq,
    responses(
        (status = 200, description = "Triage priority, alerts, protocols and blood info", body = AssessmentRes),
        (status = 422, description = "Malformed patient document", body = ErrorRes)
    )
)]
/// Classify a patient document.
///
/// The document is normalised first; a wrong-typed field is rejected rather than read as
/// absent.
async fn classify(
    State(state): State<AppState>,
    Json(req): Json<ClassifyReq>,
) -> Result<Json<AssessmentRes>, ApiError> {
    let profile = normalise_profile(req.profile).map_err(profile_error)?;
    Ok(Json(AssessmentRes {
        assessment: state.scan_service.assess(&profile),
    }))
}

#[utoipa::path(
    post,
    path = "/encode",
    request_body = EncodeReq,
    responses(
        (status = 200, description = "QR payload text", body = EncodeRes),
        (status = 413, description = "Mandatory fields exceed the QR budget", body = ErrorRes),
        (status = 422, description = "Malformed document or missing health id", body = ErrorRes)
    )
)]
/// Build the QR payload text for a patient document.
async fn encode(
    State(state): State<AppState>,
    Json(req): Json<EncodeReq>,
) -> Result<Json<EncodeRes>, ApiError> {
    let profile = normalise_profile(req.profile).map_err(profile_error)?;
    let issued_at = req.issued_at.unwrap_or_else(Utc::now);

    match state.scan_service.encode(&profile, issued_at) {
        Ok(encoded) => Ok(Json(EncodeRes {
            bytes: encoded.qr_text.len(),
            version: encoded.envelope.version(),
            omitted: encoded
                .omitted
                .iter()
                .map(|field| field.as_str().to_string())
                .collect(),
            qr_text: encoded.qr_text,
        })),
        Err(e @ EncodeError::MissingHealthId) => Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "profile",
            e.to_string(),
        )),
        Err(e @ EncodeError::PayloadTooLarge { .. }) => Err(api_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            "size",
            e.to_string(),
        )),
        Err(e) => {
            tracing::error!("Encode error: {:?}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Internal error",
            ))
        }
    }
}

#[utoipa::path(
    post,
    path = "/scan",
    request_body = ScanReq,
    responses(
        (status = 200, description = "Decoded profile with assessment", body = ScanRes),
        (status = 422, description = "Not a medical QR code, or a damaged one", body = ErrorRes)
    )
)]
/// Decode scanned QR text and assess the patient.
///
/// Failures carry the medic-facing retry prompt as `message` and `format` or `integrity` as
/// `kind`.
async fn scan(
    State(state): State<AppState>,
    Json(req): Json<ScanReq>,
) -> Result<Json<ScanRes>, ApiError> {
    state
        .scan_service
        .scan(&req.raw, Utc::now())
        .map(|outcome| {
            Json(ScanRes {
                record: outcome.record,
                profile: outcome.decoded.profile,
                assessment: outcome.assessment,
            })
        })
        .map_err(|e: DecodeError| {
            api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                e.kind().as_str(),
                e.user_message(),
            )
        })
}

#[utoipa::path(
    get,
    path = "/blood/{group}",
    params(("group" = String, Path, description = "Blood group, e.g. O- or AB+")),
    responses(
        (status = 200, description = "Donor and recipient compatibility", body = BloodRes),
        (status = 404, description = "Unrecognised blood group", body = ErrorRes)
    )
)]
/// Blood compatibility for one group.
async fn blood_compatibility(Path(group): Path<String>) -> Result<Json<BloodRes>, ApiError> {
    blood::resolve_text(&group)
        .map(|compatibility| Json(BloodRes { compatibility }))
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                "blood_group",
                format!("unrecognised blood group '{group}'"),
            )
        })
}
