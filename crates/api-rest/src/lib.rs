//! # API REST
//!
//! REST API implementation for PMS.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! Uses `api-shared` for wire types and `pms-core` for every record operation.

#![warn(rust_2018_idioms)]

use api_shared::{
    CreatePatientReq, ErrorRes, HealthRes, HealthService, MessageRes, PatientMapRes, PatientRes,
    SortQuery, UpdatePatientReq,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path as AxumPath, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use pms_core::{CoreConfig, NewPatient, PatientError, PatientUpdate, PatientView, RecordService};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub record_service: RecordService,
}

impl AppState {
    pub fn new(record_service: RecordService) -> Self {
        Self { record_service }
    }

    /// State over the JSON store named in `cfg`.
    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(RecordService::from_config(cfg))
    }
}

/// Error half of every fallible handler.
type ApiError = (StatusCode, Json<ErrorRes>);

#[derive(OpenApi)]
#[openapi(
    paths(
        root,
        about,
        health,
        view_all,
        view_patient,
        sort_patients,
        create_patient,
        update_patient,
        delete_patient,
    ),
    components(schemas(
        HealthRes,
        MessageRes,
        ErrorRes,
        CreatePatientReq,
        UpdatePatientReq,
        PatientRes,
        PatientMapRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full REST router, including Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/about", get(about))
        .route("/health", get(health))
        .route("/view", get(view_all))
        .route("/patient/:id", get(view_patient))
        .route("/sort", get(sort_patients))
        .route("/create", post(create_patient))
        .route("/edit/:id", put(update_patient))
        .route("/delete/:id", delete(delete_patient))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves the REST API until the server stops.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(addr: &str, cfg: &CoreConfig) -> anyhow::Result<()> {
    let app = router(AppState::from_config(cfg));

    tracing::info!(
        "-- Serving patients from {} on {}",
        cfg.data_file().display(),
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Welcome message", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn root() -> Json<MessageRes> {
    Json(HealthService::welcome())
}

#[utoipa::path(
    get,
    path = "/about",
    responses(
        (status = 200, description = "Service description", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn about() -> Json<MessageRes> {
    Json(HealthService::about())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/view",
    responses(
        (status = 200, description = "All patients keyed by id", body = PatientMapRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List all patients
///
/// Returns every stored patient, keyed by id, with derived BMI and verdict.
///
/// # Errors
/// Returns `500 Internal Server Error` if the store cannot be read.
#[axum::debug_handler]
async fn view_all(State(state): State<AppState>) -> Result<Json<PatientMapRes>, ApiError> {
    let patients = state.record_service.list_all().map_err(error_response)?;
    Ok(Json(PatientMapRes(
        patients.into_iter().map(patient_res).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/patient/{id}",
    params(("id" = String, Path, description = "ID of the patient in DB", example = "P001")),
    responses(
        (status = 200, description = "The patient", body = PatientRes),
        (status = 404, description = "Patient not found", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// View one patient
///
/// # Errors
/// Returns `404 Not Found` if no patient has this id.
#[axum::debug_handler]
async fn view_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<PatientRes>, ApiError> {
    let patient = state.record_service.get(&id).map_err(error_response)?;
    Ok(Json(patient_res(patient)))
}

#[utoipa::path(
    get,
    path = "/sort",
    params(SortQuery),
    responses(
        (status = 200, description = "Sorted patients", body = [PatientRes]),
        (status = 400, description = "Invalid sort field or order", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Sort patients by height, weight or bmi
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - `sort_by` is missing or not one of `height`, `weight`, `bmi`,
/// - `order` is present and not `asc` or `desc`.
#[axum::debug_handler]
async fn sort_patients(
    State(state): State<AppState>,
    query: Result<Query<SortQuery>, QueryRejection>,
) -> Result<Json<Vec<PatientRes>>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        tracing::warn!("Rejected sort query: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorRes {
                detail: rejection.body_text(),
            }),
        )
    })?;

    let patients = state
        .record_service
        .sort_by(&query.sort_by, query.order.as_deref())
        .map_err(error_response)?;
    Ok(Json(patients.into_iter().map(patient_res).collect()))
}

#[utoipa::path(
    post,
    path = "/create",
    request_body = CreatePatientReq,
    responses(
        (status = 201, description = "Patient created", body = MessageRes),
        (status = 400, description = "Patient already exists or malformed JSON", body = ErrorRes),
        (status = 422, description = "Invalid patient fields", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Create a new patient record
///
/// # Errors
/// Returns:
/// - `422 Unprocessable Entity` if a field is missing, mistyped or out of range,
/// - `400 Bad Request` if the id already exists or the body is not JSON.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<CreatePatientReq>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageRes>), ApiError> {
    let Json(req) = payload.map_err(json_rejection)?;

    state
        .record_service
        .create(NewPatient {
            id: req.id,
            name: req.name,
            city: req.city,
            age: req.age,
            gender: req.gender,
            height: req.height,
            weight: req.weight,
        })
        .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageRes::new("Patient created successfully")),
    ))
}

#[utoipa::path(
    put,
    path = "/edit/{id}",
    params(("id" = String, Path, description = "ID of the patient in DB", example = "P001")),
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Patient updated", body = MessageRes),
        (status = 404, description = "Patient not found", body = ErrorRes),
        (status = 422, description = "Merged record is invalid", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Update some fields of an existing patient
///
/// # Errors
/// Returns:
/// - `404 Not Found` if no patient has this id,
/// - `422 Unprocessable Entity` if a supplied field is invalid.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    payload: Result<Json<UpdatePatientReq>, JsonRejection>,
) -> Result<Json<MessageRes>, ApiError> {
    let Json(req) = payload.map_err(json_rejection)?;

    state
        .record_service
        .update(
            &id,
            PatientUpdate {
                name: req.name,
                city: req.city,
                age: req.age,
                gender: req.gender,
                height: req.height,
                weight: req.weight,
            },
        )
        .map_err(error_response)?;

    Ok(Json(MessageRes::new("Patient updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/delete/{id}",
    params(("id" = String, Path, description = "ID of the patient in DB", example = "P001")),
    responses(
        (status = 200, description = "Patient deleted", body = MessageRes),
        (status = 404, description = "Patient not found", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn delete_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<MessageRes>, ApiError> {
    state.record_service.delete(&id).map_err(error_response)?;
    Ok(Json(MessageRes::new("Patient deleted successfully")))
}

// Helper functions

fn patient_res(view: PatientView) -> PatientRes {
    PatientRes {
        id: view.id,
        name: view.name,
        city: view.city,
        age: view.age,
        gender: view.gender.map(|gender| gender.to_string()),
        height: view.height,
        weight: view.weight,
        bmi: view.bmi,
        verdict: view.verdict.map(|verdict| verdict.to_string()),
    }
}

/// Maps a core error to its status code and a body the caller can act on.
///
/// Store failures are logged in full but reported with a generic message.
fn error_response(err: PatientError) -> ApiError {
    let (status, detail) = match &err {
        PatientError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        PatientError::NotFound(_) => (StatusCode::NOT_FOUND, "Patient not found".to_string()),
        PatientError::Conflict(_) => (
            StatusCode::BAD_REQUEST,
            "Patient already exists".to_string(),
        ),
        PatientError::InvalidArgument(msg) | PatientError::InvalidInput(msg) => {
            (StatusCode::BAD_REQUEST, msg.clone())
        }
        PatientError::FileRead(_)
        | PatientError::FileWrite(_)
        | PatientError::Serialization(_)
        | PatientError::Deserialization(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal error".to_string(),
        ),
    };

    if err.is_store_failure() {
        tracing::error!("Patient store error: {:?}", err);
    } else {
        tracing::warn!("Rejected request: {}", err);
    }

    (status, Json(ErrorRes { detail }))
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::warn!("Rejected request body: {}", rejection.body_text());
    (
        rejection.status(),
        Json(ErrorRes {
            detail: rejection.body_text(),
        }),
    )
}
