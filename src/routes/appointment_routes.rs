// src/routes/appointment_routes.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{
        ApiOk, AppState, AppointmentView, OkData, OkResponse, STATUS_CANCELLED, STATUS_COMPLETED,
        STATUS_CONFIRMED, STATUS_NO_SHOW,
    },
    services::{CreateAppointment, UpdateAppointment},
};

/*
Access:
- booking (POST /appointments) and a patient's own list are public
- everything else needs a staff session
*/

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route(
            "/appointments/{appointment_id}",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .route("/appointments/{appointment_id}/confirm", post(confirm_appointment))
        .route("/appointments/{appointment_id}/complete", post(complete_appointment))
        .route("/appointments/{appointment_id}/cancel", post(cancel_appointment))
        .route("/appointments/{appointment_id}/no-show", post(mark_no_show))
        .route("/patients/{patient_id}/appointments", get(list_patient_appointments))
}

/* ============================================================
   Reads
   ============================================================ */

pub async fn list_appointments(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<ApiOk<Vec<AppointmentView>>>, ApiError> {
    let data = state.appointments.list().await?;
    Ok(Json(ApiOk { data }))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentView>>, ApiError> {
    let data = state.appointments.get(appointment_id).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn list_patient_appointments(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<ApiOk<Vec<AppointmentView>>>, ApiError> {
    let data = state.appointments.list_for_patient(patient_id).await?;
    Ok(Json(ApiOk { data }))
}

/* ============================================================
   POST /appointments (public booking)
   ============================================================ */

pub async fn create_appointment(
    State(state): State<AppState>,
    Json(req): Json<CreateAppointment>,
) -> Result<(StatusCode, Json<ApiOk<AppointmentView>>), ApiError> {
    let data = state.appointments.create(req).await?;
    Ok((StatusCode::CREATED, Json(ApiOk { data })))
}

/* ============================================================
   PUT /appointments/{id} (full replace)
   ============================================================ */

pub async fn update_appointment(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<UpdateAppointment>,
) -> Result<Json<ApiOk<AppointmentView>>, ApiError> {
    let data = state.appointments.update(appointment_id, req).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<OkResponse>, ApiError> {
    state.appointments.delete(appointment_id).await?;
    Ok(Json(OkResponse {
        data: OkData { ok: true },
    }))
}

/* ============================================================
   Status workflow
   ============================================================ */

async fn transition(
    state: &AppState,
    appointment_id: Uuid,
    status_name: &str,
) -> Result<Json<ApiOk<AppointmentView>>, ApiError> {
    let data = state.appointments.transition(appointment_id, status_name).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn confirm_appointment(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentView>>, ApiError> {
    transition(&state, appointment_id, STATUS_CONFIRMED).await
}

pub async fn complete_appointment(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentView>>, ApiError> {
    transition(&state, appointment_id, STATUS_COMPLETED).await
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentView>>, ApiError> {
    transition(&state, appointment_id, STATUS_CANCELLED).await
}

pub async fn mark_no_show(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentView>>, ApiError> {
    transition(&state, appointment_id, STATUS_NO_SHOW).await
}
