use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::backend::SchedulingBackend;
use crate::clock::Clock;
use crate::configuration::Configuration;
use crate::error::BackendError;
use crate::types::{AvailabilityRule, Booking, BookingStatus, NewBooking, NewRule};

pub struct MockBackendInner {
    pub success: AtomicBool,
    pub conflict: AtomicBool,
    pub calls_to_rules: AtomicU64,
    pub calls_to_active_rules: AtomicU64,
    pub calls_to_rule: AtomicU64,
    pub calls_to_add_rule: AtomicU64,
    pub calls_to_remove_rule: AtomicU64,
    pub calls_to_remove_all_rules: AtomicU64,
    pub calls_to_bookings_on: AtomicU64,
    pub calls_to_create_booking: AtomicU64,
    pub rules: Mutex<Vec<AvailabilityRule>>,
    pub bookings: Mutex<Vec<Booking>>,
}

/// Hand-rolled backend double: counts calls, serves canned rules and
/// bookings, and fails or conflicts on demand.
#[derive(Clone)]
pub struct MockBackend(pub Arc<MockBackendInner>);

impl MockBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockBackendInner {
            success: AtomicBool::new(true),
            conflict: AtomicBool::new(false),
            calls_to_rules: AtomicU64::default(),
            calls_to_active_rules: AtomicU64::default(),
            calls_to_rule: AtomicU64::default(),
            calls_to_add_rule: AtomicU64::default(),
            calls_to_remove_rule: AtomicU64::default(),
            calls_to_remove_all_rules: AtomicU64::default(),
            calls_to_bookings_on: AtomicU64::default(),
            calls_to_create_booking: AtomicU64::default(),
            rules: Mutex::default(),
            bookings: Mutex::default(),
        }))
    }

    fn check_success(&self) -> Result<(), BackendError> {
        if self.0.success.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Database("supposed to fail".into()))
        }
    }
}

impl SchedulingBackend for MockBackend {
    fn rules(&self, owner: Option<Uuid>) -> Result<Vec<AvailabilityRule>, BackendError> {
        self.0.calls_to_rules.fetch_add(1, Ordering::SeqCst);
        self.check_success()?;
        let rules = self.0.rules.lock().unwrap();
        Ok(rules
            .iter()
            .filter(|r| owner.map_or(true, |o| r.owner_id == o))
            .cloned()
            .collect())
    }

    fn active_rules(&self, owner: Option<Uuid>) -> Result<Vec<AvailabilityRule>, BackendError> {
        self.0.calls_to_active_rules.fetch_add(1, Ordering::SeqCst);
        self.check_success()?;
        let rules = self.0.rules.lock().unwrap();
        Ok(rules
            .iter()
            .filter(|r| r.is_active && owner.map_or(true, |o| r.owner_id == o))
            .cloned()
            .collect())
    }

    fn rule(&self, id: Uuid) -> Result<AvailabilityRule, BackendError> {
        self.0.calls_to_rule.fetch_add(1, Ordering::SeqCst);
        self.check_success()?;
        let rules = self.0.rules.lock().unwrap();
        rules
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(BackendError::RuleNotFound(id))
    }

    fn add_rule(&self, rule: NewRule) -> Result<AvailabilityRule, BackendError> {
        self.0.calls_to_add_rule.fetch_add(1, Ordering::SeqCst);
        self.check_success()?;
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
        self.0.rules.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    fn remove_rule(&self, id: Uuid) -> Result<(), BackendError> {
        self.0.calls_to_remove_rule.fetch_add(1, Ordering::SeqCst);
        self.check_success()?;
        let mut rules = self.0.rules.lock().unwrap();
        let before = rules.len();
        rules.retain(|r| r.id != id);
        if rules.len() == before {
            return Err(BackendError::RuleNotFound(id));
        }
        Ok(())
    }

    fn remove_all_rules(&self) -> Result<(), BackendError> {
        self.0
            .calls_to_remove_all_rules
            .fetch_add(1, Ordering::SeqCst);
        self.check_success()?;
        self.0.rules.lock().unwrap().clear();
        Ok(())
    }

    fn bookings_on(&self, day: NaiveDate) -> Result<Vec<Booking>, BackendError> {
        self.0.calls_to_bookings_on.fetch_add(1, Ordering::SeqCst);
        self.check_success()?;
        let day_start = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let day_end = day_start + Duration::days(1);
        let bookings = self.0.bookings.lock().unwrap();
        Ok(bookings
            .iter()
            .filter(|b| b.status.occupies() && b.starts_at >= day_start && b.starts_at < day_end)
            .cloned()
            .collect())
    }

    fn create_booking(&self, booking: NewBooking) -> Result<Booking, BackendError> {
        self.0
            .calls_to_create_booking
            .fetch_add(1, Ordering::SeqCst);
        self.check_success()?;
        if self.0.conflict.load(Ordering::SeqCst) {
            return Err(BackendError::BookingConflict {
                existing: Uuid::new_v4(),
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
        self.0.bookings.lock().unwrap().push(stored.clone());
        Ok(stored)
    }
}

#[derive(Debug, Clone)]
pub struct TestConfiguration;

impl Configuration for TestConfiguration {
    fn website_title(&self) -> String {
        "Test Site".into()
    }

    fn admin_password(&self) -> String {
        "123".into()
    }

    fn port(&self) -> String {
        "0".into()
    }

    fn database_url(&self) -> Option<String> {
        None
    }

    fn booking_window_days(&self) -> u32 {
        14
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    pub now: DateTime<Utc>,
}

impl FixedClock {
    pub fn at(now: &str) -> Self {
        Self {
            now: now.parse().unwrap(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
