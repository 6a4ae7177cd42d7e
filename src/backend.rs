use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::BackendError;
use crate::types::{AvailabilityRule, Booking, NewBooking, NewRule};

/// Storage behind the service: availability rules (admin-managed) and
/// bookings. Implemented by the PostgreSQL interface and the in-memory
/// store; handlers only ever see this trait.
pub trait SchedulingBackend: Clone + Send + Sync + 'static {
    /// All rules, active or not, sorted by weekday then start time.
    fn rules(&self, owner: Option<Uuid>) -> Result<Vec<AvailabilityRule>, BackendError>;

    /// Active rules only — the resolver's input snapshot.
    fn active_rules(&self, owner: Option<Uuid>) -> Result<Vec<AvailabilityRule>, BackendError>;

    fn rule(&self, id: Uuid) -> Result<AvailabilityRule, BackendError>;

    fn add_rule(&self, rule: NewRule) -> Result<AvailabilityRule, BackendError>;

    fn remove_rule(&self, id: Uuid) -> Result<(), BackendError>;

    fn remove_all_rules(&self) -> Result<(), BackendError>;

    /// Occupying bookings starting within `[day 00:00, day+1 00:00)` UTC.
    /// Cancelled bookings are excluded.
    fn bookings_on(&self, day: NaiveDate) -> Result<Vec<Booking>, BackendError>;

    /// Persist a booking request with pending status. Must reject the
    /// insert with [`BackendError::BookingConflict`] when the requested
    /// window overlaps an occupying booking of the same owner — the
    /// write-time guarantee slot resolution relies on.
    fn create_booking(&self, booking: NewBooking) -> Result<Booking, BackendError>;
}
