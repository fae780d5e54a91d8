// src/services/patients.rs

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{BusinessRule, ServiceError, ServiceResult},
    models::{Patient, PatientView},
    store::{AppointmentFilter, Store, StoreError},
};

const MAX_PHONE_DIGITS: usize = 15;

/// Body of both create and (full-replace) update.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientInput {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn Store>,
}

impl PatientService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// All patients ordered by name, each with its appointment count.
    pub async fn list(&self) -> ServiceResult<Vec<PatientView>> {
        let patients = self.store.list_patients().await?;
        let counts = self.store.appointment_counts().await?;

        Ok(patients
            .into_iter()
            .map(|p| {
                let total = counts.get(&p.patient_id).copied().unwrap_or(0);
                view_of(p, total)
            })
            .collect())
    }

    pub async fn get(&self, patient_id: Uuid) -> ServiceResult<PatientView> {
        let patient = self
            .store
            .find_patient(patient_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("patient {patient_id} not found")))?;
        let total = self.count_for(patient_id).await?;
        Ok(view_of(patient, total))
    }

    pub async fn get_by_phone(&self, phone: &str) -> ServiceResult<PatientView> {
        let phone = validate_phone(Some(phone))?
            .ok_or_else(|| ServiceError::Validation("phone is required".into()))?;

        let patient = self
            .store
            .find_patient_by_phone(&phone)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("no patient with phone {phone}")))?;
        let total = self.count_for(patient.patient_id).await?;
        Ok(view_of(patient, total))
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: PatientInput) -> ServiceResult<PatientView> {
        let patient = build_patient(Uuid::new_v4(), input)?;
        self.store.insert_patient(&patient).await?;

        tracing::info!(patient_id = %patient.patient_id, "patient created");
        Ok(view_of(patient, 0))
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, patient_id: Uuid, input: PatientInput) -> ServiceResult<PatientView> {
        if self.store.find_patient(patient_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("patient {patient_id} not found")));
        }

        let patient = build_patient(patient_id, input)?;
        self.store.update_patient(&patient).await?;
        let total = self.count_for(patient_id).await?;

        tracing::info!(%patient_id, "patient updated");
        Ok(view_of(patient, total))
    }

    /// Deletion is refused while any appointment references the patient.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, patient_id: Uuid) -> ServiceResult<()> {
        if self.store.find_patient(patient_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("patient {patient_id} not found")));
        }

        let count = self.count_for(patient_id).await?;
        if count > 0 {
            tracing::warn!(%patient_id, count, "refused to delete patient with appointments");
            return Err(BusinessRule::PatientHasAppointments { patient_id, count }.into());
        }

        match self.store.delete_patient(patient_id).await {
            Ok(()) => {}
            Err(StoreError::StillReferenced(_)) => {
                // booked between the count and the delete
                let count = self.count_for(patient_id).await?.max(1);
                tracing::warn!(%patient_id, count, "patient gained appointments before delete");
                return Err(BusinessRule::PatientHasAppointments { patient_id, count }.into());
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(%patient_id, "patient deleted");
        Ok(())
    }

    async fn count_for(&self, patient_id: Uuid) -> ServiceResult<i64> {
        let appointments = self
            .store
            .query_appointments(AppointmentFilter::Patient(patient_id))
            .await?;
        Ok(appointments.len() as i64)
    }
}

fn build_patient(patient_id: Uuid, input: PatientInput) -> ServiceResult<Patient> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("name is required".into()));
    }

    Ok(Patient {
        patient_id,
        name: name.to_string(),
        phone: validate_phone(input.phone.as_deref())?,
        address: input
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty()),
        birth_date: input.birth_date,
    })
}

/// Blank means "no phone"; anything else must be digits only.
fn validate_phone(phone: Option<&str>) -> ServiceResult<Option<String>> {
    let Some(p) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    if !p.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServiceError::Validation("phone must contain digits only".into()));
    }
    if p.len() > MAX_PHONE_DIGITS {
        return Err(ServiceError::Validation(format!(
            "phone must have at most {MAX_PHONE_DIGITS} digits"
        )));
    }
    Ok(Some(p.to_string()))
}

fn view_of(p: Patient, total_appointments: i64) -> PatientView {
    PatientView {
        patient_id: p.patient_id,
        name: p.name,
        phone: p.phone,
        address: p.address,
        birth_date: p.birth_date,
        total_appointments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::STATUS_PENDING;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;

    fn input(name: &str, phone: Option<&str>) -> PatientInput {
        PatientInput {
            name: name.into(),
            phone: phone.map(Into::into),
            address: Some("  Calle 123 #45-67 ".into()),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 15),
        }
    }

    fn setup() -> (Arc<MemoryStore>, PatientService) {
        let store = Arc::new(MemoryStore::with_default_statuses());
        let service = PatientService::new(store.clone());
        (store, service)
    }

    #[test]
    fn test_validate_phone() {
        assert_eq!(validate_phone(None).unwrap(), None);
        assert_eq!(validate_phone(Some("   ")).unwrap(), None);
        assert_eq!(validate_phone(Some(" 3001234567 ")).unwrap().as_deref(), Some("3001234567"));
        assert!(validate_phone(Some("300-123")).is_err());
        assert!(validate_phone(Some("1234567890123456")).is_err());
    }

    #[tokio::test]
    async fn test_create_trims_and_counts_zero() {
        let (_store, service) = setup();

        let view = service
            .create(input("  Maria Garcia ", Some("3002345678")))
            .await
            .unwrap();

        assert_eq!(view.name, "Maria Garcia");
        assert_eq!(view.address.as_deref(), Some("Calle 123 #45-67"));
        assert_eq!(view.total_appointments, 0);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (_store, service) = setup();
        let result = service.create(input("   ", None)).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_lookup_by_phone() {
        let (_store, service) = setup();
        let created = service
            .create(input("Carlos Rodriguez", Some("3003456789")))
            .await
            .unwrap();

        let found = service.get_by_phone("3003456789").await.unwrap();
        assert_eq!(found.patient_id, created.patient_id);

        let missing = service.get_by_phone("3000000000").await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_is_full_replace() {
        let (_store, service) = setup();
        let created = service
            .create(input("Juan Perez", Some("3001234567")))
            .await
            .unwrap();

        let updated = service
            .update(
                created.patient_id,
                PatientInput {
                    name: "Juan P. Perez".into(),
                    phone: None,
                    address: None,
                    birth_date: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Juan P. Perez");
        assert_eq!(updated.phone, None);
        assert_eq!(updated.address, None);
        assert_eq!(updated.birth_date, None);

        let missing = service.update(Uuid::new_v4(), input("X", None)).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_without_appointments() {
        let (_store, service) = setup();
        let created = service.create(input("Juan Perez", None)).await.unwrap();

        service.delete(created.patient_id).await.unwrap();

        let result = service.get(created.patient_id).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_blocked_reports_count() {
        let (store, service) = setup();
        let created = service.create(input("Juan Perez", None)).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        store.add_appointment(created.patient_id, day.and_hms_opt(9, 0, 0).unwrap(), STATUS_PENDING);
        store.add_appointment(created.patient_id, day.and_hms_opt(10, 0, 0).unwrap(), "Completed");

        let result = service.delete(created.patient_id).await;

        match result {
            Err(ServiceError::BusinessRuleViolation(BusinessRule::PatientHasAppointments {
                count,
                ..
            })) => assert_eq!(count, 2),
            other => panic!("expected blocked delete, got {other:?}"),
        }
        assert!(service.get(created.patient_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_racing_a_booking_is_rule_violation() {
        let (store, service) = setup();
        let created = service.create(input("Maria Garcia", None)).await.unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap();
        store.book_before_next_delete(created.patient_id, at, STATUS_PENDING);

        let result = service.delete(created.patient_id).await;

        match result {
            Err(ServiceError::BusinessRuleViolation(BusinessRule::PatientHasAppointments {
                count,
                ..
            })) => assert_eq!(count, 1),
            other => panic!("expected blocked delete, got {other:?}"),
        }
        assert!(service.get(created.patient_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_sorted_with_counts() {
        let (store, service) = setup();
        let zoe = service.create(input("Zoe", None)).await.unwrap();
        service.create(input("Ana", None)).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        store.add_appointment(zoe.patient_id, day.and_hms_opt(9, 0, 0).unwrap(), STATUS_PENDING);

        let list = service.list().await.unwrap();
        let names: Vec<&str> = list.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Zoe"]);
        assert_eq!(list[0].total_appointments, 0);
        assert_eq!(list[1].total_appointments, 1);
    }
}
