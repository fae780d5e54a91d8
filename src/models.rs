use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::availability::AvailabilityCalculator;
use crate::services::{AppointmentService, PatientService};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub store: std::sync::Arc<dyn Store>,
    pub appointments: AppointmentService,
    pub patients: PatientService,
    pub availability: AvailabilityCalculator,
    pub session_ttl_hours: i64,
}

/* -------------------------
   Store records (normalized)
--------------------------*/

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Patient {
    pub patient_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct AppointmentStatus {
    pub status_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Appointment {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_at: NaiveDateTime,
    pub status_id: Uuid,
    pub note: Option<String>,
}

/* -------------------------
   Read projections
--------------------------*/

/// Appointment joined with the names of its patient and status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentView {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub scheduled_at: NaiveDateTime,
    pub status_id: Uuid,
    pub status_name: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientView {
    pub patient_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub total_appointments: i64,
}

/* -------------------------
   API envelopes
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub data: OkData,
}

#[derive(Debug, Serialize)]
pub struct OkData {
    pub ok: bool,
}

/* -------------------------
   Auth DTOs
--------------------------*/

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub device_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub data: LoginResponseData,
}

#[derive(Debug, Serialize)]
pub struct LoginResponseData {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub data: MeResponseData,
}

#[derive(Debug, Serialize)]
pub struct MeResponseData {
    pub user: UserProfile,
    pub session: SessionInfo,
}

#[derive(Debug, Serialize, FromRow)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub username: String,
    pub role_id: Uuid,
    pub role_name: String,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub session_token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/* -------------------------
   DB Row Models (auth side)
--------------------------*/

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role_id: Uuid,
    pub role_name: String,
}

#[derive(Debug, FromRow)]
pub struct SessionTokenRow {
    pub session_token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoleRow {
    pub role_id: Uuid,
    pub name: String,
}

/* -------------------------
   Well-known names
--------------------------*/

pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_CONFIRMED: &str = "Confirmed";
pub const STATUS_COMPLETED: &str = "Completed";
pub const STATUS_CANCELLED: &str = "Cancelled";
pub const STATUS_NO_SHOW: &str = "No-show";

pub const ROLE_ADMINISTRATOR: &str = "Administrator";
pub const ROLE_RECEPTIONIST: &str = "Receptionist";
pub const ROLE_DOCTOR: &str = "Doctor";
