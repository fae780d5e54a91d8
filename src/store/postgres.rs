// src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::{AppointmentFilter, Store, StoreError, StoreResult};
use crate::models::{Appointment, AppointmentStatus, Patient};

/// `Store` backed by the PostgreSQL pool. Each write is a single
/// auto-committed statement, so it is durable once the call returns.
#[derive(Clone)]
pub struct PgStore {
    db: sqlx::PgPool,
}

impl PgStore {
    pub fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }
}

const APPOINTMENT_COLUMNS: &str = "appointment_id, patient_id, scheduled_at, status_id, note";

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn find_patient(&self, id: Uuid) -> StoreResult<Option<Patient>> {
        let row = sqlx::query_as::<_, Patient>(
            r#"
            SELECT patient_id, name, phone, address, birth_date
            FROM patient
            WHERE patient_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_patient_by_phone(&self, phone: &str) -> StoreResult<Option<Patient>> {
        let row = sqlx::query_as::<_, Patient>(
            r#"
            SELECT patient_id, name, phone, address, birth_date
            FROM patient
            WHERE phone = $1
            ORDER BY name ASC
            LIMIT 1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_patients(&self) -> StoreResult<Vec<Patient>> {
        let rows = sqlx::query_as::<_, Patient>(
            r#"
            SELECT patient_id, name, phone, address, birth_date
            FROM patient
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn appointment_counts(&self) -> StoreResult<HashMap<Uuid, i64>> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT patient_id, COUNT(*)
            FROM appointment
            GROUP BY patient_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn insert_patient(&self, patient: &Patient) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO patient (patient_id, name, phone, address, birth_date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(patient.patient_id)
        .bind(&patient.name)
        .bind(patient.phone.as_deref())
        .bind(patient.address.as_deref())
        .bind(patient.birth_date)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update_patient(&self, patient: &Patient) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE patient
            SET name = $2,
                phone = $3,
                address = $4,
                birth_date = $5
            WHERE patient_id = $1
            "#,
        )
        .bind(patient.patient_id)
        .bind(&patient.name)
        .bind(patient.phone.as_deref())
        .bind(patient.address.as_deref())
        .bind(patient.birth_date)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete_patient(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query(r#"DELETE FROM patient WHERE patient_id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| restrict_violation(e, || format!("patient {id} has appointments")))?;
        Ok(())
    }

    async fn find_status(&self, id: Uuid) -> StoreResult<Option<AppointmentStatus>> {
        let row = sqlx::query_as::<_, AppointmentStatus>(
            r#"SELECT status_id, name FROM appointment_status WHERE status_id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_status_by_name(&self, name: &str) -> StoreResult<Option<AppointmentStatus>> {
        let row = sqlx::query_as::<_, AppointmentStatus>(
            r#"
            SELECT status_id, name
            FROM appointment_status
            WHERE name = $1
            ORDER BY status_id
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_statuses(&self) -> StoreResult<Vec<AppointmentStatus>> {
        let rows = sqlx::query_as::<_, AppointmentStatus>(
            r#"SELECT status_id, name FROM appointment_status ORDER BY name ASC"#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn insert_status(&self, status: &AppointmentStatus) -> StoreResult<()> {
        sqlx::query(r#"INSERT INTO appointment_status (status_id, name) VALUES ($1, $2)"#)
            .bind(status.status_id)
            .bind(&status.name)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn query_appointments(&self, filter: AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let order = "ORDER BY scheduled_at DESC, appointment_id ASC";

        let rows = match filter {
            AppointmentFilter::All => {
                let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointment {order}");
                sqlx::query_as::<_, Appointment>(&sql)
                    .fetch_all(&self.db)
                    .await?
            }
            AppointmentFilter::Id(id) => {
                let sql = format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointment WHERE appointment_id = $1 {order}"
                );
                sqlx::query_as::<_, Appointment>(&sql)
                    .bind(id)
                    .fetch_all(&self.db)
                    .await?
            }
            AppointmentFilter::Patient(patient_id) => {
                let sql = format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointment WHERE patient_id = $1 {order}"
                );
                sqlx::query_as::<_, Appointment>(&sql)
                    .bind(patient_id)
                    .fetch_all(&self.db)
                    .await?
            }
            AppointmentFilter::Date(date) => {
                // Casting the wall-clock timestamp compares year/month/day only.
                let sql = format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointment WHERE scheduled_at::date = $1 {order}"
                );
                sqlx::query_as::<_, Appointment>(&sql)
                    .bind(date)
                    .fetch_all(&self.db)
                    .await?
            }
            AppointmentFilter::Range { from, to } => {
                let sql = format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointment \
                     WHERE scheduled_at >= $1 AND scheduled_at < $2 {order}"
                );
                sqlx::query_as::<_, Appointment>(&sql)
                    .bind(from)
                    .bind(to)
                    .fetch_all(&self.db)
                    .await?
            }
            AppointmentFilter::PatientWithStatusName {
                patient_id,
                status_name,
            } => {
                sqlx::query_as::<_, Appointment>(
                    r#"
                    SELECT a.appointment_id, a.patient_id, a.scheduled_at, a.status_id, a.note
                    FROM appointment a
                    JOIN appointment_status s ON s.status_id = a.status_id
                    WHERE a.patient_id = $1
                      AND s.name = $2
                    ORDER BY a.scheduled_at DESC, a.appointment_id ASC
                    "#,
                )
                .bind(patient_id)
                .bind(status_name)
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(rows)
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO appointment (appointment_id, patient_id, scheduled_at, status_id, note)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(appointment.appointment_id)
        .bind(appointment.patient_id)
        .bind(appointment.scheduled_at)
        .bind(appointment.status_id)
        .bind(appointment.note.as_deref())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE appointment
            SET patient_id = $2,
                scheduled_at = $3,
                status_id = $4,
                note = $5
            WHERE appointment_id = $1
            "#,
        )
        .bind(appointment.appointment_id)
        .bind(appointment.patient_id)
        .bind(appointment.scheduled_at)
        .bind(appointment.status_id)
        .bind(appointment.note.as_deref())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete_appointment(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query(r#"DELETE FROM appointment WHERE appointment_id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Foreign-key violations (ON DELETE RESTRICT) become `StillReferenced`.
fn restrict_violation(e: sqlx::Error, what: impl FnOnce() -> String) -> StoreError {
    let is_fk = matches!(&e, sqlx::Error::Database(db) if db.is_foreign_key_violation());
    if is_fk {
        StoreError::StillReferenced(what())
    } else {
        StoreError::Database(e)
    }
}
