//! Expansion of recurring weekly availability rules into concrete bookable
//! slots for one calendar date.
//!
//! Pure and synchronous: the caller fetches a consistent snapshot of rules
//! and bookings first, then resolution runs without I/O. Re-running with
//! identical inputs yields identical output.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::types::{weekday_index, AvailabilityRule, BookableSlot, Booking};

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Bookable windows, sorted ascending by start. Ties between rules keep
    /// the rules' input order.
    pub slots: Vec<BookableSlot>,
    /// Malformed rules encountered along the way. Never fatal; the caller
    /// decides whether to log or surface them.
    pub skipped: Vec<SkippedRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    pub rule_id: Uuid,
    pub reason: InvalidRuleReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRuleReason {
    /// `start_time >= end_time` leaves nothing to generate from.
    EmptyTimeRange,
    ZeroDuration,
    /// Weekday index outside 0..=6 can never match a date.
    BadWeekday(u8),
}

impl std::fmt::Display for InvalidRuleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidRuleReason::EmptyTimeRange => write!(f, "start time is not before end time"),
            InvalidRuleReason::ZeroDuration => write!(f, "slot duration is zero"),
            InvalidRuleReason::BadWeekday(d) => write!(f, "weekday index {d} out of range"),
        }
    }
}

fn validate(rule: &AvailabilityRule) -> Option<InvalidRuleReason> {
    if rule.day_of_week > 6 {
        return Some(InvalidRuleReason::BadWeekday(rule.day_of_week));
    }
    if rule.start_time >= rule.end_time {
        return Some(InvalidRuleReason::EmptyTimeRange);
    }
    if rule.duration_minutes == 0 {
        return Some(InvalidRuleReason::ZeroDuration);
    }
    None
}

/// Resolve the bookable slots for `date`.
///
/// Inactive rules and rules for other weekdays are ignored. Candidate
/// windows step from `start_time` in increments of `duration + buffer`;
/// a window is dropped when it overlaps an occupying booking of the same
/// owner, and generation stops once a window would cross `end_time`
/// (windows are discarded, never truncated). Overlap uses half-open
/// interval semantics, so a booking ending exactly at a candidate's start
/// does not block it. All instants are UTC.
pub fn resolve_bookable_slots(
    date: NaiveDate,
    rules: &[AvailabilityRule],
    bookings: &[Booking],
) -> Resolution {
    let target_weekday = weekday_index(date);
    let mut slots: Vec<BookableSlot> = Vec::new();
    let mut skipped = Vec::new();

    for rule in rules {
        if !rule.is_active {
            continue;
        }
        if let Some(reason) = validate(rule) {
            skipped.push(SkippedRule {
                rule_id: rule.id,
                reason,
            });
            continue;
        }
        if rule.day_of_week != target_weekday {
            continue;
        }

        let occupied: Vec<(DateTime<Utc>, DateTime<Utc>)> = bookings
            .iter()
            .filter(|b| b.owner_id == rule.owner_id && b.status.occupies())
            .map(|b| (b.starts_at, b.ends_at()))
            .collect();

        let duration = Duration::minutes(rule.duration_minutes as i64);
        let buffer = Duration::minutes(rule.buffer_minutes as i64);
        let window_end = date.and_time(rule.end_time).and_utc();
        let mut cursor = date.and_time(rule.start_time).and_utc();

        while cursor + duration <= window_end {
            let end = cursor + duration;
            let blocked = occupied
                .iter()
                .any(|&(b_start, b_end)| cursor < b_end && end > b_start);
            if !blocked {
                slots.push(BookableSlot {
                    start: cursor,
                    end,
                    rule_id: rule.id,
                    owner_id: rule.owner_id,
                    duration_minutes: rule.duration_minutes,
                    price: rule.price,
                    currency: rule.currency.clone(),
                });
            }
            cursor = end + buffer;
        }
    }

    // Stable sort keeps rule input order for identical start times.
    slots.sort_by_key(|s| s.start);
    Resolution { slots, skipped }
}
