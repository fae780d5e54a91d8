use crate::models::AppState;
use axum::Router;

pub mod appointment_routes;
pub mod auth_routes;
pub mod availability_routes;
pub mod health_routes;
pub mod patient_routes;
pub mod role_routes;
pub mod status_routes;
pub mod user_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1/auth", auth_routes::router())
        .nest("/api/v1/users", user_routes::router())
        .nest("/api/v1", appointment_routes::router())
        .nest("/api/v1", availability_routes::router())
        .nest("/api/v1", patient_routes::router())
        .nest("/api/v1", status_routes::router())
        .nest("/api/v1", role_routes::router())
        .nest("/api/v1", health_routes::router())
        .with_state(state)
}
