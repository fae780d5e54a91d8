// src/services/appointments.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{BusinessRule, ServiceError, ServiceResult},
    models::{Appointment, AppointmentStatus, AppointmentView, Patient, STATUS_PENDING},
    store::{AppointmentFilter, Store},
};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointment {
    pub patient_id: Uuid,
    pub scheduled_at: NaiveDateTime,
    /// Defaults to the status named "Pending".
    pub status_id: Option<Uuid>,
    pub note: Option<String>,
}

/// Full replacement of an appointment's mutable fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAppointment {
    pub patient_id: Uuid,
    pub scheduled_at: NaiveDateTime,
    pub status_id: Uuid,
    pub note: Option<String>,
}

/// Creation, update and deletion of appointments, plus their denormalized reads.
#[derive(Clone)]
pub struct AppointmentService {
    store: Arc<dyn Store>,
}

impl AppointmentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resolve the status for a write: the explicit id when given, otherwise
    /// the status named "Pending". Either way it must exist.
    pub async fn resolve_status(&self, explicit_id: Option<Uuid>) -> ServiceResult<AppointmentStatus> {
        match explicit_id {
            Some(id) => self.store.find_status(id).await?.ok_or_else(|| {
                ServiceError::InvalidReference(format!("appointment status {id} does not exist"))
            }),
            None => self
                .store
                .find_status_by_name(STATUS_PENDING)
                .await?
                .ok_or_else(|| {
                    ServiceError::InvalidReference(format!(
                        "default status '{STATUS_PENDING}' is not configured"
                    ))
                }),
        }
    }

    async fn ensure_patient(&self, patient_id: Uuid) -> ServiceResult<Patient> {
        self.store
            .find_patient(patient_id)
            .await?
            .ok_or_else(|| ServiceError::InvalidReference(format!("patient {patient_id} does not exist")))
    }

    /// A patient may hold at most one Pending appointment.
    ///
    /// This is check-then-act: two concurrent writes for the same patient can
    /// both pass before either is persisted. No store-level constraint guards it.
    async fn ensure_single_pending(
        &self,
        patient_id: Uuid,
        status: &AppointmentStatus,
        exclude: Option<Uuid>,
    ) -> ServiceResult<()> {
        if status.name != STATUS_PENDING {
            return Ok(());
        }

        let pending = self
            .store
            .query_appointments(AppointmentFilter::PatientWithStatusName {
                patient_id,
                status_name: STATUS_PENDING.to_string(),
            })
            .await?;

        match pending.into_iter().find(|a| Some(a.appointment_id) != exclude) {
            Some(existing) => {
                tracing::warn!(
                    %patient_id,
                    existing_appointment_id = %existing.appointment_id,
                    "rejected second pending appointment"
                );
                Err(BusinessRule::PendingAppointmentExists {
                    patient_id,
                    existing_appointment_id: existing.appointment_id,
                }
                .into())
            }
            None => Ok(()),
        }
    }

    #[tracing::instrument(skip(self, req), fields(patient_id = %req.patient_id))]
    pub async fn create(&self, req: CreateAppointment) -> ServiceResult<AppointmentView> {
        let patient = self.ensure_patient(req.patient_id).await?;
        let status = self.resolve_status(req.status_id).await?;
        self.ensure_single_pending(patient.patient_id, &status, None)
            .await?;

        let appointment = Appointment {
            appointment_id: Uuid::new_v4(),
            patient_id: patient.patient_id,
            scheduled_at: req.scheduled_at,
            status_id: status.status_id,
            note: normalize_note(req.note),
        };
        self.store.insert_appointment(&appointment).await?;

        tracing::info!(appointment_id = %appointment.appointment_id, "appointment created");
        Ok(view_of(appointment, &patient.name, &status.name))
    }

    #[tracing::instrument(skip(self, req), fields(patient_id = %req.patient_id))]
    pub async fn update(&self, appointment_id: Uuid, req: UpdateAppointment) -> ServiceResult<AppointmentView> {
        let mut appointment = self.find(appointment_id).await?;
        let patient = self.ensure_patient(req.patient_id).await?;
        let status = self.resolve_status(Some(req.status_id)).await?;
        self.ensure_single_pending(patient.patient_id, &status, Some(appointment_id))
            .await?;

        appointment.patient_id = patient.patient_id;
        appointment.scheduled_at = req.scheduled_at;
        appointment.status_id = status.status_id;
        appointment.note = normalize_note(req.note);
        self.store.update_appointment(&appointment).await?;

        tracing::info!(%appointment_id, status = %status.name, "appointment updated");
        Ok(view_of(appointment, &patient.name, &status.name))
    }

    /// Workflow shortcut: move an appointment to the status with the given
    /// name, keeping every other field. Goes through `update`.
    pub async fn transition(&self, appointment_id: Uuid, status_name: &str) -> ServiceResult<AppointmentView> {
        let current = self.find(appointment_id).await?;
        let status = self
            .store
            .find_status_by_name(status_name)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("status '{status_name}' is not configured"))
            })?;

        self.update(
            appointment_id,
            UpdateAppointment {
                patient_id: current.patient_id,
                scheduled_at: current.scheduled_at,
                status_id: status.status_id,
                note: current.note,
            },
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, appointment_id: Uuid) -> ServiceResult<()> {
        self.find(appointment_id).await?;
        self.store.delete_appointment(appointment_id).await?;
        tracing::info!(%appointment_id, "appointment deleted");
        Ok(())
    }

    pub async fn get(&self, appointment_id: Uuid) -> ServiceResult<AppointmentView> {
        let appointment = self.find(appointment_id).await?;
        let mut views = self.project(vec![appointment]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::NotFound(format!("appointment {appointment_id} not found")))
    }

    /// Every appointment, latest first.
    pub async fn list(&self) -> ServiceResult<Vec<AppointmentView>> {
        let records = self.store.query_appointments(AppointmentFilter::All).await?;
        self.project(records).await
    }

    /// A patient's appointments, latest first. Unknown patients yield an empty list.
    pub async fn list_for_patient(&self, patient_id: Uuid) -> ServiceResult<Vec<AppointmentView>> {
        let records = self
            .store
            .query_appointments(AppointmentFilter::Patient(patient_id))
            .await?;
        self.project(records).await
    }

    async fn find(&self, appointment_id: Uuid) -> ServiceResult<Appointment> {
        self.store
            .query_appointments(AppointmentFilter::Id(appointment_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(format!("appointment {appointment_id} not found")))
    }

    /// Read-side join: attach patient and status names to raw records.
    async fn project(&self, records: Vec<Appointment>) -> ServiceResult<Vec<AppointmentView>> {
        let statuses: HashMap<Uuid, String> = self
            .store
            .list_statuses()
            .await?
            .into_iter()
            .map(|s| (s.status_id, s.name))
            .collect();

        let mut patient_names: HashMap<Uuid, String> = HashMap::new();
        let mut views = Vec::with_capacity(records.len());

        for a in records {
            if !patient_names.contains_key(&a.patient_id) {
                let name = self
                    .store
                    .find_patient(a.patient_id)
                    .await?
                    .map(|p| p.name)
                    .unwrap_or_default();
                patient_names.insert(a.patient_id, name);
            }

            let patient_name = patient_names.get(&a.patient_id).cloned().unwrap_or_default();
            let status_name = statuses.get(&a.status_id).cloned().unwrap_or_default();
            views.push(view_of(a, &patient_name, &status_name));
        }

        Ok(views)
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

fn view_of(a: Appointment, patient_name: &str, status_name: &str) -> AppointmentView {
    AppointmentView {
        appointment_id: a.appointment_id,
        patient_id: a.patient_id,
        patient_name: patient_name.to_string(),
        scheduled_at: a.scheduled_at,
        status_id: a.status_id,
        status_name: status_name.to_string(),
        note: a.note,
    }
}
