use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::backend::SchedulingBackend;
use crate::error::BackendError;
use crate::types::{AvailabilityRule, Booking, BookingStatus, NewBooking, NewRule};

/// In-memory store, used when no database URL is configured and as the
/// backend for most tests. Same contract as the database interface,
/// including the write-time booking conflict check.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    inner: Arc<Mutex<Stores>>,
}

#[derive(Debug, Default)]
struct Stores {
    rules: HashMap<Uuid, AvailabilityRule>,
    bookings: HashMap<Uuid, Booking>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_for_display(rules: &mut [AvailabilityRule]) {
    rules.sort_by(|a, b| {
        a.day_of_week
            .cmp(&b.day_of_week)
            .then(a.start_time.cmp(&b.start_time))
    });
}

impl SchedulingBackend for LocalStore {
    fn rules(&self, owner: Option<Uuid>) -> Result<Vec<AvailabilityRule>, BackendError> {
        let inner = self.inner.lock().unwrap();
        let mut rules: Vec<AvailabilityRule> = inner
            .rules
            .values()
            .filter(|r| owner.map_or(true, |o| r.owner_id == o))
            .cloned()
            .collect();
        sort_for_display(&mut rules);
        Ok(rules)
    }

    fn active_rules(&self, owner: Option<Uuid>) -> Result<Vec<AvailabilityRule>, BackendError> {
        let mut rules = self.rules(owner)?;
        rules.retain(|r| r.is_active);
        Ok(rules)
    }

    fn rule(&self, id: Uuid) -> Result<AvailabilityRule, BackendError> {
        let inner = self.inner.lock().unwrap();
        inner
            .rules
            .get(&id)
            .cloned()
            .ok_or(BackendError::RuleNotFound(id))
    }

    fn add_rule(&self, rule: NewRule) -> Result<AvailabilityRule, BackendError> {
        let stored = AvailabilityRule {
            id: Uuid::new_v4(),
            owner_id: rule.owner_id,
            day_of_week: rule.day_of_week,
            start_time: rule.start_time,
            end_time: rule.end_time,
            duration_minutes: rule.duration_minutes,
            buffer_minutes: rule.buffer_minutes,
            price: rule.price,
            currency: rule.currency,
            is_active: rule.is_active,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.rules.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn remove_rule(&self, id: Uuid) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.rules.remove(&id).is_none() {
            return Err(BackendError::RuleNotFound(id));
        }
        Ok(())
    }

    fn remove_all_rules(&self) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().unwrap();
        inner.rules.clear();
        Ok(())
    }

    fn bookings_on(&self, day: NaiveDate) -> Result<Vec<Booking>, BackendError> {
        let day_start = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let day_end = day_start + Duration::days(1);
        let inner = self.inner.lock().unwrap();
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.status.occupies() && b.starts_at >= day_start && b.starts_at < day_end)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.starts_at);
        Ok(bookings)
    }

    fn create_booking(&self, booking: NewBooking) -> Result<Booking, BackendError> {
        let mut inner = self.inner.lock().unwrap();

        // Conflict check and insert happen under one lock so concurrent
        // requests for the same window serialize.
        let end = booking.starts_at + Duration::minutes(booking.duration_minutes as i64);
        if let Some(existing) = inner.bookings.values().find(|b| {
            b.owner_id == booking.owner_id
                && b.status.occupies()
                && booking.starts_at < b.ends_at()
                && end > b.starts_at
        }) {
            return Err(BackendError::BookingConflict {
                existing: existing.id,
            });
        }

        let stored = Booking {
            id: Uuid::new_v4(),
            rule_id: booking.rule_id,
            owner_id: booking.owner_id,
            client_name: booking.client_name,
            starts_at: booking.starts_at,
            duration_minutes: booking.duration_minutes,
            price_at_booking: booking.price_at_booking,
            currency_at_booking: booking.currency_at_booking,
            status: BookingStatus::Pending,
        };
        inner.bookings.insert(stored.id, stored.clone());
        Ok(stored)
    }
}
