// src/routes/patient_routes.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, OkData, OkResponse, PatientView},
    services::PatientInput,
};

// Self-registration, lookup by id and lookup by phone are open to patients.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/{patient_id}",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/patients/phone/{phone}", get(get_patient_by_phone))
}

pub async fn list_patients(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<ApiOk<Vec<PatientView>>>, ApiError> {
    let data = state.patients.list().await?;
    Ok(Json(ApiOk { data }))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<ApiOk<PatientView>>, ApiError> {
    let data = state.patients.get(patient_id).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn get_patient_by_phone(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> Result<Json<ApiOk<PatientView>>, ApiError> {
    let data = state.patients.get_by_phone(&phone).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<PatientInput>,
) -> Result<(StatusCode, Json<ApiOk<PatientView>>), ApiError> {
    let data = state.patients.create(req).await?;
    Ok((StatusCode::CREATED, Json(ApiOk { data })))
}

pub async fn update_patient(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(patient_id): Path<Uuid>,
    Json(req): Json<PatientInput>,
) -> Result<Json<ApiOk<PatientView>>, ApiError> {
    let data = state.patients.update(patient_id, req).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<OkResponse>, ApiError> {
    state.patients.delete(patient_id).await?;
    Ok(Json(OkResponse {
        data: OkData { ok: true },
    }))
}
