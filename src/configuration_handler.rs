use clap::Parser;

use crate::configuration::Configuration;

/// Command-line configuration. Environment fallbacks (loaded from `.env`
/// in `main` via dotenvy) cover deployments that cannot pass flags.
#[derive(Debug, Clone, Parser)]
#[command(name = "appointment_manager")]
pub struct ConfigurationHandler {
    #[arg(long, default_value = "Appointment Manager")]
    website_title: String,

    /// Admin password checked on every admin request. Falls back to the
    /// ADMIN_PASSWORD environment variable, then to the dev default "123".
    #[arg(long)]
    admin_password: Option<String>,

    #[arg(long, default_value = "3000")]
    port: String,

    /// PostgreSQL URL. Without one the service keeps rules and bookings in
    /// memory (impersistent). Falls back to DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,

    #[arg(long, default_value_t = 14)]
    booking_window_days: u32,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn website_title(&self) -> String {
        self.website_title.clone()
    }

    fn admin_password(&self) -> String {
        self.admin_password
            .clone()
            .or_else(|| std::env::var("ADMIN_PASSWORD").ok())
            .unwrap_or_else(|| "123".into())
    }

    fn port(&self) -> String {
        self.port.clone()
    }

    fn database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }

    fn booking_window_days(&self) -> u32 {
        self.booking_window_days
    }
}
