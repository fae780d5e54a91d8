// src/schedule.rs

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

/// Clinic hours: first bookable slot 08:00, last 12:30, every 30 minutes.
const FIRST_SLOT: NaiveTime = hm(8, 0);
const LAST_SLOT: NaiveTime = hm(12, 30);
const SLOT_MINUTES: i64 = 30;

/// The fixed set of bookable times of day. Identical for every date:
/// no weekday or holiday rules apply.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleGrid {
    first: NaiveTime,
    last: NaiveTime,
    step: Duration,
}

impl Default for ScheduleGrid {
    fn default() -> Self {
        Self {
            first: FIRST_SLOT,
            last: LAST_SLOT,
            step: Duration::minutes(SLOT_MINUTES),
        }
    }
}

/// Evaluated at compile time; an out-of-range time fails the build.
const fn hm(h: u32, m: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(h, m, 0) {
        Some(t) => t,
        None => panic!("slot time out of range"),
    }
}

impl ScheduleGrid {
    /// Ordered slots from first to last, inclusive.
    pub fn slots(&self) -> Vec<NaiveTime> {
        let mut out = Vec::new();
        let mut t = self.first;
        while t <= self.last {
            out.push(t);
            let (next, wrapped) = t.overflowing_add_signed(self.step);
            if wrapped != 0 {
                break;
            }
            t = next;
        }
        out
    }

    pub fn slot_count(&self) -> usize {
        self.slots().len()
    }
}

/// An appointment occupies a slot when hour and minute agree; seconds are ignored.
pub fn occupies(slot: NaiveTime, at: NaiveDateTime) -> bool {
    at.hour() == slot.hour() && at.minute() == slot.minute()
}

pub fn slot_label(slot: NaiveTime) -> String {
    slot.format("%H:%M").to_string()
}
