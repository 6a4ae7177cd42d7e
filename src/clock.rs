use chrono::{DateTime, Utc};

/// Source of "now", injectable so date-range handling stays testable.
/// The resolver itself takes an explicit date and never consults a clock.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> chrono::NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
