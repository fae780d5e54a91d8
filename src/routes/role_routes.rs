use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, RoleRow},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/roles/{role_id}", get(get_role))
}

pub async fn list_roles(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<ApiOk<Vec<RoleRow>>>, ApiError> {
    let roles: Vec<RoleRow> =
        sqlx::query_as::<_, RoleRow>("SELECT role_id, name FROM role ORDER BY name ASC")
            .fetch_all(&state.db)
            .await
            .map_err(ApiError::db)?;

    Ok(Json(ApiOk { data: roles }))
}

pub async fn get_role(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(role_id): Path<Uuid>,
) -> Result<Json<ApiOk<RoleRow>>, ApiError> {
    let role: RoleRow =
        sqlx::query_as::<_, RoleRow>("SELECT role_id, name FROM role WHERE role_id = $1")
            .bind(role_id)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::db)?
            .ok_or_else(|| ApiError::NotFound("NOT_FOUND", "role not found".into()))?;

    Ok(Json(ApiOk { data: role }))
}
