// src/routes/user_routes.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::hash_password,
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, OkData, OkResponse},
};

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserPublicRow {
    pub user_id: Uuid,
    pub username: String,
    pub role_id: Uuid,
    pub role_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role_id: Uuid,
}

/// Full replace; the password is only rehashed when a non-empty one is sent.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub password: Option<String>,
    pub role_id: Uuid,
}

pub fn router() -> Router<AppState> {
    Router::new()
        // /api/v1/users
        .route("/", get(list_users).post(create_user))
        // /api/v1/users/{user_id}
        .route(
            "/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

const USER_SELECT: &str = r#"
    SELECT u.user_id, u.username, u.role_id, r.name AS role_name, u.created_at
    FROM app_user u
    JOIN role r ON r.role_id = u.role_id
"#;

fn user_not_found() -> ApiError {
    ApiError::NotFound("NOT_FOUND", "user not found".into())
}

async fn load_user(state: &AppState, user_id: Uuid) -> Result<Option<UserPublicRow>, ApiError> {
    sqlx::query_as::<_, UserPublicRow>(&format!("{USER_SELECT} WHERE u.user_id = $1"))
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::db)
}

async fn ensure_role_exists(state: &AppState, role_id: Uuid) -> Result<(), ApiError> {
    let found: Option<Uuid> = sqlx::query_scalar("SELECT role_id FROM role WHERE role_id = $1")
        .bind(role_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::db)?;

    match found {
        Some(_) => Ok(()),
        None => Err(ApiError::BadRequest(
            "INVALID_REFERENCE",
            format!("role {role_id} does not exist"),
        )),
    }
}

/// Unique violations on `app_user.username` become a 409; anything else is internal.
fn map_user_write_error(e: sqlx::Error) -> ApiError {
    let taken = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
    if taken {
        ApiError::Conflict("USERNAME_TAKEN", "username is already in use".into(), None)
    } else {
        ApiError::db(e)
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<ApiOk<Vec<UserPublicRow>>>, ApiError> {
    let users: Vec<UserPublicRow> =
        sqlx::query_as::<_, UserPublicRow>(&format!("{USER_SELECT} ORDER BY u.username ASC"))
            .fetch_all(&state.db)
            .await
            .map_err(ApiError::db)?;

    Ok(Json(ApiOk { data: users }))
}

pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiOk<UserPublicRow>>, ApiError> {
    let user = load_user(&state, user_id).await?.ok_or_else(user_not_found)?;
    Ok(Json(ApiOk { data: user }))
}

fn validate_username(username: &str) -> Result<(), ApiError> {
    let u = username.trim();
    if u.is_empty() {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "username is required".into(),
        ));
    }
    if u.chars().count() < 3 {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "username must be at least 3 characters".into(),
        ));
    }
    Ok(())
}

fn validate_password(pw: &str) -> Result<(), ApiError> {
    if pw.trim().chars().count() < 8 {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

/// `None` when the caller wants to keep the stored password. A supplied
/// password is returned exactly as sent.
fn replacement_password(pw: Option<&str>) -> Result<Option<&str>, ApiError> {
    match pw {
        Some(p) if !p.trim().is_empty() => {
            validate_password(p)?;
            Ok(Some(p))
        }
        _ => Ok(None),
    }
}

/// Hashes the password byte-for-byte as login will later verify it.
fn stored_password_hash(pw: &str) -> Result<String, ApiError> {
    hash_password(pw).map_err(ApiError::Internal)
}

pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiOk<UserPublicRow>>), ApiError> {
    auth.ensure_admin()?;

    validate_username(&req.username)?;
    validate_password(&req.password)?;
    ensure_role_exists(&state, req.role_id).await?;

    let username = req.username.trim().to_string();
    let pw_hash = stored_password_hash(&req.password)?;

    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO app_user (user_id, username, password_hash, role_id)
        VALUES ($1, $2, $3, $4)
        RETURNING user_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&username)
    .bind(&pw_hash)
    .bind(req.role_id)
    .fetch_one(&state.db)
    .await
    .map_err(map_user_write_error)?;

    let user = load_user(&state, user_id).await?.ok_or_else(user_not_found)?;
    tracing::info!(user_id = %user_id, created_by = %auth.user_id, "user created");

    Ok((StatusCode::CREATED, Json(ApiOk { data: user })))
}

pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ApiOk<UserPublicRow>>, ApiError> {
    auth.ensure_admin()?;

    load_user(&state, user_id).await?.ok_or_else(user_not_found)?;

    validate_username(&req.username)?;
    let new_password = replacement_password(req.password.as_deref())?;
    ensure_role_exists(&state, req.role_id).await?;

    let username = req.username.trim().to_string();

    match new_password {
        Some(pw) => {
            let pw_hash = stored_password_hash(pw)?;
            sqlx::query(
                r#"
                UPDATE app_user
                SET username = $1, role_id = $2, password_hash = $3
                WHERE user_id = $4
                "#,
            )
            .bind(&username)
            .bind(req.role_id)
            .bind(&pw_hash)
            .bind(user_id)
            .execute(&state.db)
            .await
            .map_err(map_user_write_error)?;
        }
        None => {
            sqlx::query(
                r#"
                UPDATE app_user
                SET username = $1, role_id = $2
                WHERE user_id = $3
                "#,
            )
            .bind(&username)
            .bind(req.role_id)
            .bind(user_id)
            .execute(&state.db)
            .await
            .map_err(map_user_write_error)?;
        }
    }

    let updated = load_user(&state, user_id).await?.ok_or_else(user_not_found)?;
    tracing::info!(
        user_id = %user_id,
        password_changed = new_password.is_some(),
        "user updated"
    );

    Ok(Json(ApiOk { data: updated }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
) -> Result<Json<OkResponse>, ApiError> {
    auth.ensure_admin()?;

    if user_id == auth.user_id {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "cannot delete the account of the current session".into(),
        ));
    }

    // session_token rows go with the user (ON DELETE CASCADE)
    let res = sqlx::query("DELETE FROM app_user WHERE user_id = $1")
        .bind(user_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::db)?;

    if res.rows_affected() == 0 {
        return Err(user_not_found());
    }

    tracing::info!(user_id = %user_id, deleted_by = %auth.user_id, "user deleted");

    Ok(Json(OkResponse {
        data: OkData { ok: true },
    }))
}
