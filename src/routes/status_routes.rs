use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{
    error::{ApiError, ServiceError},
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, AppointmentStatus},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/statuses", get(list_statuses))
        .route("/statuses/{status_id}", get(get_status))
}

pub async fn list_statuses(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<ApiOk<Vec<AppointmentStatus>>>, ApiError> {
    let data = state
        .store
        .list_statuses()
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiOk { data }))
}

pub async fn get_status(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(status_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentStatus>>, ApiError> {
    let data = state
        .store
        .find_status(status_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ApiError::NotFound("NOT_FOUND", format!("status {status_id} not found")))?;
    Ok(Json(ApiOk { data }))
}
