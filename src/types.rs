use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Weekday index used throughout: 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// A recurring weekly availability template defined by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: u32,
    pub buffer_minutes: u32,
    pub price: f64,
    pub currency: String,
    pub is_active: bool,
}

/// Payload for creating a rule. Range validation happens at the HTTP
/// boundary; the resolver additionally skips rules that are malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRule {
    pub owner_id: Uuid,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: u32,
    pub buffer_minutes: u32,
    pub price: f64,
    pub currency: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Persisted but awaiting external payment confirmation.
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }

    /// Whether a booking in this status blocks its time range.
    pub fn occupies(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

/// A persisted reservation. Once stored, `[starts_at, starts_at + duration)`
/// counts as occupied for overlap checks while the status occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub owner_id: Uuid,
    pub client_name: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub price_at_booking: f64,
    pub currency_at_booking: String,
    pub status: BookingStatus,
}

impl Booking {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + Duration::minutes(self.duration_minutes as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub rule_id: Uuid,
    pub owner_id: Uuid,
    pub client_name: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub price_at_booking: f64,
    pub currency_at_booking: String,
}

/// A concrete, offerable window on a specific date. Derived from a rule on
/// demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookableSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub rule_id: Uuid,
    pub owner_id: Uuid,
    pub duration_minutes: u32,
    pub price: f64,
    pub currency: String,
}

/// Account data carried by the session state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub is_admin: bool,
}
