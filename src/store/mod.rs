//! Persistence contract for patients, appointment statuses and appointments.
//!
//! The scheduling services only ever talk to a `dyn Store`; `PgStore` is the
//! production implementation and `MemoryStore` backs the unit tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, Patient};

pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A delete was refused because other rows still point at the target.
    #[error("still referenced: {0}")]
    StillReferenced(String),

    #[cfg(test)]
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Appointment selections supported by `Store::query_appointments`.
///
/// Every variant returns records ordered by `scheduled_at` descending.
#[derive(Debug, Clone)]
pub enum AppointmentFilter {
    All,
    Id(Uuid),
    Patient(Uuid),
    /// Calendar-date match on the stored wall-clock timestamp.
    Date(NaiveDate),
    /// Half-open `[from, to)`.
    Range {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },
    PatientWithStatusName {
        patient_id: Uuid,
        status_name: String,
    },
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    // patients
    async fn find_patient(&self, id: Uuid) -> StoreResult<Option<Patient>>;
    async fn find_patient_by_phone(&self, phone: &str) -> StoreResult<Option<Patient>>;
    /// Ordered by name.
    async fn list_patients(&self) -> StoreResult<Vec<Patient>>;
    /// Number of appointments per patient; patients without any are absent.
    async fn appointment_counts(&self) -> StoreResult<HashMap<Uuid, i64>>;
    async fn insert_patient(&self, patient: &Patient) -> StoreResult<()>;
    async fn update_patient(&self, patient: &Patient) -> StoreResult<()>;
    async fn delete_patient(&self, id: Uuid) -> StoreResult<()>;

    // statuses
    async fn find_status(&self, id: Uuid) -> StoreResult<Option<AppointmentStatus>>;
    async fn find_status_by_name(&self, name: &str) -> StoreResult<Option<AppointmentStatus>>;
    /// Ordered by name.
    async fn list_statuses(&self) -> StoreResult<Vec<AppointmentStatus>>;
    async fn insert_status(&self, status: &AppointmentStatus) -> StoreResult<()>;

    // appointments
    async fn query_appointments(&self, filter: AppointmentFilter) -> StoreResult<Vec<Appointment>>;
    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<()>;
    async fn update_appointment(&self, appointment: &Appointment) -> StoreResult<()>;
    async fn delete_appointment(&self, id: Uuid) -> StoreResult<()>;
}
