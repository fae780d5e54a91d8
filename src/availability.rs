//! Day and month occupancy over the fixed schedule grid.
//!
//! Appointments are matched to days by calendar components of their stored
//! wall-clock timestamp, and to slots by hour and minute.

use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{ServiceError, ServiceResult},
    models::Appointment,
    schedule::{occupies, slot_label, ScheduleGrid},
    store::{AppointmentFilter, Store},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotAvailability {
    pub time: NaiveTime,
    pub label: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<SlotAvailability>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total_slots: usize,
    pub occupied: usize,
    pub free: usize,
    pub has_availability: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthAvailability {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DaySummary>,
}

#[derive(Clone)]
pub struct AvailabilityCalculator {
    store: Arc<dyn Store>,
    grid: ScheduleGrid,
}

impl AvailabilityCalculator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            grid: ScheduleGrid::default(),
        }
    }

    pub async fn day(&self, date: NaiveDate) -> ServiceResult<DayAvailability> {
        let appointments = self
            .store
            .query_appointments(AppointmentFilter::Date(date))
            .await?;

        Ok(DayAvailability {
            date,
            slots: day_slots(&self.grid, &appointments),
        })
    }

    pub async fn month_containing(&self, date: NaiveDate) -> ServiceResult<MonthAvailability> {
        self.month(date.year(), date.month()).await
    }

    pub async fn month(&self, year: i32, month: u32) -> ServiceResult<MonthAvailability> {
        let (first, last) = month_bounds(year, month).ok_or_else(|| {
            ServiceError::Validation(format!("invalid month {year}-{month:02}"))
        })?;
        let end = last
            .succ_opt()
            .ok_or_else(|| ServiceError::Validation(format!("month {year}-{month:02} out of range")))?;

        let appointments = self
            .store
            .query_appointments(AppointmentFilter::Range {
                from: first.and_time(NaiveTime::MIN),
                to: end.and_time(NaiveTime::MIN),
            })
            .await?;

        let slots = self.grid.slots();
        let total_slots = self.grid.slot_count();

        let days = first
            .iter_days()
            .take_while(|d| *d <= last)
            .map(|date| {
                let on_day: Vec<&Appointment> = appointments
                    .iter()
                    .filter(|a| a.scheduled_at.date() == date)
                    .collect();
                let occupied = slots
                    .iter()
                    .filter(|slot| on_day.iter().any(|a| occupies(**slot, a.scheduled_at)))
                    .count();
                let free = total_slots - occupied;

                DaySummary {
                    date,
                    total_slots,
                    occupied,
                    free,
                    has_availability: free > 0,
                }
            })
            .collect();

        Ok(MonthAvailability { year, month, days })
    }
}

/// Slot-by-slot occupancy for one day's appointments. When two appointments
/// share a slot the first one in `appointments` wins.
fn day_slots(grid: &ScheduleGrid, appointments: &[Appointment]) -> Vec<SlotAvailability> {
    grid.slots()
        .into_iter()
        .map(|slot| {
            let taken = appointments.iter().find(|a| occupies(slot, a.scheduled_at));
            SlotAvailability {
                time: slot,
                label: slot_label(slot),
                available: taken.is_none(),
                appointment_id: taken.map(|a| a.appointment_id),
            }
        })
        .collect()
}

/// First and last calendar day of a month.
fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{STATUS_CONFIRMED, STATUS_PENDING};
    use crate::services::{AppointmentService, CreateAppointment};
    use crate::store::memory::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, AvailabilityCalculator, Uuid) {
        let store = Arc::new(MemoryStore::with_default_statuses());
        let patient_id = store.add_patient("Juan Perez");
        let calc = AvailabilityCalculator::new(store.clone());
        (store, calc, patient_id)
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(2024, 1), Some((date(2024, 1, 1), date(2024, 1, 31))));
        assert_eq!(month_bounds(2024, 2), Some((date(2024, 2, 1), date(2024, 2, 29))));
        assert_eq!(month_bounds(2023, 2), Some((date(2023, 2, 1), date(2023, 2, 28))));
        assert_eq!(month_bounds(2024, 12), Some((date(2024, 12, 1), date(2024, 12, 31))));
        assert_eq!(month_bounds(2024, 13), None);
        assert_eq!(month_bounds(2024, 0), None);
    }

    #[tokio::test]
    async fn test_empty_day_is_fully_available() {
        let (_store, calc, _) = setup();

        let day = calc.day(date(2024, 1, 15)).await.unwrap();

        assert_eq!(day.date, date(2024, 1, 15));
        assert_eq!(day.slots.len(), 10);
        assert!(day.slots.iter().all(|s| s.available && s.appointment_id.is_none()));
        assert_eq!(day.slots[0].label, "08:00");
        assert_eq!(day.slots[9].label, "12:30");
    }

    #[tokio::test]
    async fn test_booking_marks_slot_occupied() {
        let (store, calc, patient_id) = setup();
        let service = AppointmentService::new(store.clone());

        let booked = service
            .create(CreateAppointment {
                patient_id,
                scheduled_at: date(2024, 1, 15).and_hms_opt(9, 0, 0).unwrap(),
                status_id: None,
                note: None,
            })
            .await
            .unwrap();
        assert_eq!(booked.status_name, STATUS_PENDING);

        let day = calc.day(date(2024, 1, 15)).await.unwrap();
        let nine = day.slots.iter().find(|s| s.label == "09:00").unwrap();
        assert!(!nine.available);
        assert_eq!(nine.appointment_id, Some(booked.appointment_id));
        assert_eq!(day.slots.iter().filter(|s| !s.available).count(), 1);

        let next_day = calc.day(date(2024, 1, 16)).await.unwrap();
        assert!(next_day.slots.iter().all(|s| s.available));
    }

    #[tokio::test]
    async fn test_off_grid_times_occupy_nothing() {
        let (store, calc, patient_id) = setup();
        let d = date(2024, 1, 15);
        store.add_appointment(patient_id, d.and_hms_opt(8, 15, 0).unwrap(), STATUS_CONFIRMED);
        store.add_appointment(patient_id, d.and_hms_opt(13, 0, 0).unwrap(), STATUS_CONFIRMED);

        let day = calc.day(d).await.unwrap();
        assert!(day.slots.iter().all(|s| s.available));
    }

    #[tokio::test]
    async fn test_collision_reports_one_appointment() {
        let (store, calc, patient_id) = setup();
        let other = store.add_patient("Maria Garcia");
        let d = date(2024, 1, 15);
        let a = store.add_appointment(patient_id, d.and_hms_opt(10, 30, 0).unwrap(), STATUS_CONFIRMED);
        let b = store.add_appointment(other, d.and_hms_opt(10, 30, 0).unwrap(), STATUS_CONFIRMED);

        let day = calc.day(d).await.unwrap();
        let slot = day.slots.iter().find(|s| s.label == "10:30").unwrap();
        assert!(!slot.available);
        assert!(slot.appointment_id == Some(a) || slot.appointment_id == Some(b));

        let month = calc.month(2024, 1).await.unwrap();
        assert_eq!(month.days[14].occupied, 1);
    }

    #[tokio::test]
    async fn test_empty_month() {
        let (_store, calc, _) = setup();

        let month = calc.month(2024, 1).await.unwrap();

        assert_eq!((month.year, month.month), (2024, 1));
        assert_eq!(month.days.len(), 31);
        assert_eq!(month.days[0].date, date(2024, 1, 1));
        assert_eq!(month.days[30].date, date(2024, 1, 31));
        for d in &month.days {
            assert_eq!(d.total_slots, 10);
            assert_eq!(d.occupied, 0);
            assert_eq!(d.free, 10);
            assert!(d.has_availability);
        }
    }

    #[tokio::test]
    async fn test_one_booking_changes_only_its_day() {
        let (store, calc, patient_id) = setup();
        store.add_appointment(
            patient_id,
            date(2024, 1, 15).and_hms_opt(11, 0, 0).unwrap(),
            STATUS_PENDING,
        );

        let month = calc.month(2024, 1).await.unwrap();

        for d in &month.days {
            if d.date == date(2024, 1, 15) {
                assert_eq!((d.occupied, d.free), (1, 9));
            } else {
                assert_eq!((d.occupied, d.free), (0, 10));
            }
        }
    }

    #[tokio::test]
    async fn test_full_day_has_no_availability() {
        let (store, calc, patient_id) = setup();
        let d = date(2024, 1, 15);
        for slot in ScheduleGrid::default().slots() {
            store.add_appointment(patient_id, d.and_time(slot), STATUS_CONFIRMED);
        }

        let month = calc.month_containing(d).await.unwrap();
        let row = &month.days[14];
        assert_eq!((row.occupied, row.free), (10, 0));
        assert!(!row.has_availability);

        let day = calc.day(d).await.unwrap();
        assert!(day.slots.iter().all(|s| !s.available));
    }

    #[tokio::test]
    async fn test_month_edges_stay_in_their_month() {
        let (store, calc, patient_id) = setup();
        store.add_appointment(
            patient_id,
            date(2024, 1, 31).and_hms_opt(12, 30, 0).unwrap(),
            STATUS_CONFIRMED,
        );
        store.add_appointment(
            patient_id,
            date(2024, 2, 1).and_hms_opt(8, 0, 0).unwrap(),
            STATUS_CONFIRMED,
        );

        let jan = calc.month(2024, 1).await.unwrap();
        assert_eq!(jan.days[30].occupied, 1);
        assert_eq!(jan.days.iter().map(|d| d.occupied).sum::<usize>(), 1);

        let feb = calc.month(2024, 2).await.unwrap();
        assert_eq!(feb.days.len(), 29);
        assert_eq!(feb.days[0].occupied, 1);
        assert_eq!(feb.days.iter().map(|d| d.occupied).sum::<usize>(), 1);
    }

    #[tokio::test]
    async fn test_invalid_month_rejected() {
        let (_store, calc, _) = setup();
        let result = calc.month(2024, 13).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_store_failure_yields_no_partial_result() {
        let (store, calc, _) = setup();
        store.set_unavailable(true);

        assert!(matches!(calc.day(date(2024, 1, 15)).await, Err(ServiceError::StoreFailure(_))));
        assert!(matches!(calc.month(2024, 1).await, Err(ServiceError::StoreFailure(_))));
    }
}
