// src/store/memory.rs
//
// In-process `Store` for unit tests. Mirrors the ordering and filter
// semantics of `PgStore`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use super::{AppointmentFilter, Store, StoreError, StoreResult};
use crate::models::{
    Appointment, AppointmentStatus, Patient, STATUS_CANCELLED, STATUS_COMPLETED,
    STATUS_CONFIRMED, STATUS_NO_SHOW, STATUS_PENDING,
};

#[derive(Default)]
struct Tables {
    patients: HashMap<Uuid, Patient>,
    statuses: HashMap<Uuid, AppointmentStatus>,
    appointments: HashMap<Uuid, Appointment>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
    /// Inserted at the start of the next `delete_patient`, as a concurrent
    /// booking landing between a caller's check and its delete would be.
    before_delete: Mutex<Option<Appointment>>,
}

impl MemoryStore {
    pub fn with_default_statuses() -> Self {
        let store = Self::default();
        {
            let mut t = store.tables.lock().unwrap();
            for name in [
                STATUS_PENDING,
                STATUS_CONFIRMED,
                STATUS_COMPLETED,
                STATUS_CANCELLED,
                STATUS_NO_SHOW,
            ] {
                let status = AppointmentStatus {
                    status_id: Uuid::new_v4(),
                    name: name.to_string(),
                };
                t.statuses.insert(status.status_id, status);
            }
        }
        store
    }

    /// Every subsequent call fails with `StoreError::Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn add_patient(&self, name: &str) -> Uuid {
        let patient = Patient {
            patient_id: Uuid::new_v4(),
            name: name.to_string(),
            phone: None,
            address: None,
            birth_date: None,
        };
        let id = patient.patient_id;
        self.tables.lock().unwrap().patients.insert(id, patient);
        id
    }

    pub fn status_id(&self, name: &str) -> Uuid {
        self.tables
            .lock()
            .unwrap()
            .statuses
            .values()
            .find(|s| s.name == name)
            .map(|s| s.status_id)
            .unwrap_or_else(|| panic!("status {name} not seeded"))
    }

    /// Insert directly, bypassing the lifecycle rules.
    pub fn add_appointment(&self, patient_id: Uuid, scheduled_at: NaiveDateTime, status_name: &str) -> Uuid {
        let appointment = Appointment {
            appointment_id: Uuid::new_v4(),
            patient_id,
            scheduled_at,
            status_id: self.status_id(status_name),
            note: None,
        };
        let id = appointment.appointment_id;
        self.tables.lock().unwrap().appointments.insert(id, appointment);
        id
    }

    pub fn book_before_next_delete(&self, patient_id: Uuid, scheduled_at: NaiveDateTime, status_name: &str) {
        let appointment = Appointment {
            appointment_id: Uuid::new_v4(),
            patient_id,
            scheduled_at,
            status_id: self.status_id(status_name),
            note: None,
        };
        *self.before_delete.lock().unwrap() = Some(appointment);
    }

    pub fn appointment_count(&self) -> usize {
        self.tables.lock().unwrap().appointments.len()
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }

    async fn find_patient(&self, id: Uuid) -> StoreResult<Option<Patient>> {
        self.check()?;
        Ok(self.tables.lock().unwrap().patients.get(&id).cloned())
    }

    async fn find_patient_by_phone(&self, phone: &str) -> StoreResult<Option<Patient>> {
        self.check()?;
        let t = self.tables.lock().unwrap();
        let mut matches: Vec<&Patient> = t
            .patients
            .values()
            .filter(|p| p.phone.as_deref() == Some(phone))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches.first().map(|p| (*p).clone()))
    }

    async fn list_patients(&self) -> StoreResult<Vec<Patient>> {
        self.check()?;
        let mut out: Vec<Patient> = self.tables.lock().unwrap().patients.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn appointment_counts(&self) -> StoreResult<HashMap<Uuid, i64>> {
        self.check()?;
        let mut counts = HashMap::new();
        for a in self.tables.lock().unwrap().appointments.values() {
            *counts.entry(a.patient_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn insert_patient(&self, patient: &Patient) -> StoreResult<()> {
        self.check()?;
        self.tables
            .lock()
            .unwrap()
            .patients
            .insert(patient.patient_id, patient.clone());
        Ok(())
    }

    async fn update_patient(&self, patient: &Patient) -> StoreResult<()> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        if let Some(existing) = t.patients.get_mut(&patient.patient_id) {
            *existing = patient.clone();
        }
        Ok(())
    }

    async fn delete_patient(&self, id: Uuid) -> StoreResult<()> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        if let Some(a) = self.before_delete.lock().unwrap().take() {
            t.appointments.insert(a.appointment_id, a);
        }
        if t.appointments.values().any(|a| a.patient_id == id) {
            return Err(StoreError::StillReferenced(format!("patient {id} has appointments")));
        }
        t.patients.remove(&id);
        Ok(())
    }

    async fn find_status(&self, id: Uuid) -> StoreResult<Option<AppointmentStatus>> {
        self.check()?;
        Ok(self.tables.lock().unwrap().statuses.get(&id).cloned())
    }

    async fn find_status_by_name(&self, name: &str) -> StoreResult<Option<AppointmentStatus>> {
        self.check()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .statuses
            .values()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn list_statuses(&self) -> StoreResult<Vec<AppointmentStatus>> {
        self.check()?;
        let mut out: Vec<AppointmentStatus> =
            self.tables.lock().unwrap().statuses.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn insert_status(&self, status: &AppointmentStatus) -> StoreResult<()> {
        self.check()?;
        self.tables
            .lock()
            .unwrap()
            .statuses
            .insert(status.status_id, status.clone());
        Ok(())
    }

    async fn query_appointments(&self, filter: AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        self.check()?;
        let t = self.tables.lock().unwrap();

        let mut out: Vec<Appointment> = t
            .appointments
            .values()
            .filter(|a| match &filter {
                AppointmentFilter::All => true,
                AppointmentFilter::Id(id) => a.appointment_id == *id,
                AppointmentFilter::Patient(pid) => a.patient_id == *pid,
                AppointmentFilter::Date(date) => a.scheduled_at.date() == *date,
                AppointmentFilter::Range { from, to } => a.scheduled_at >= *from && a.scheduled_at < *to,
                AppointmentFilter::PatientWithStatusName {
                    patient_id,
                    status_name,
                } => {
                    a.patient_id == *patient_id
                        && t.statuses
                            .get(&a.status_id)
                            .is_some_and(|s| &s.name == status_name)
                }
            })
            .cloned()
            .collect();

        out.sort_by(|a, b| {
            b.scheduled_at
                .cmp(&a.scheduled_at)
                .then(a.appointment_id.cmp(&b.appointment_id))
        });
        Ok(out)
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        self.check()?;
        self.tables
            .lock()
            .unwrap()
            .appointments
            .insert(appointment.appointment_id, appointment.clone());
        Ok(())
    }

    async fn update_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        if let Some(existing) = t.appointments.get_mut(&appointment.appointment_id) {
            *existing = appointment.clone();
        }
        Ok(())
    }

    async fn delete_appointment(&self, id: Uuid) -> StoreResult<()> {
        self.check()?;
        self.tables.lock().unwrap().appointments.remove(&id);
        Ok(())
    }
}
