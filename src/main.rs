use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod backend;
mod clock;
mod configuration;
mod configuration_handler;
mod database_interface;
mod error;
mod http;
mod local_store;
mod resolver;
mod schema;
mod session;
#[cfg(test)]
mod testutils;
mod types;

use backend::SchedulingBackend;
use clock::SystemClock;
use configuration::Configuration;
use configuration_handler::ConfigurationHandler;
use database_interface::DatabaseInterface;
use local_store::LocalStore;
use session::{SessionEvent, SessionTracker};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let configuration = ConfigurationHandler::parse_arguments();
    info!("Starting {}", configuration.website_title());

    match configuration.database_url() {
        Some(url) => {
            let backend = connect_with_retry(&url);
            serve(backend, configuration).await;
        }
        None => {
            info!("No database configured. Rules and bookings are kept in memory");
            serve(LocalStore::new(), configuration).await;
        }
    }
}

fn connect_with_retry(url: &str) -> DatabaseInterface {
    loop {
        match DatabaseInterface::new(url) {
            Ok(interface) => {
                info!("Connected to database");
                return interface;
            }
            Err(err) => {
                error!("Failed to connect to database: {err}. Retrying in 1 s");
                std::thread::sleep(std::time::Duration::from_secs(1));
            }
        }
    }
}

async fn serve<B: SchedulingBackend>(backend: B, configuration: ConfigurationHandler) {
    let sessions = SessionTracker::spawn();
    // No session persistence yet, so bootstrap always lands on anonymous.
    sessions.submit(SessionEvent::SessionRestored(None));

    let address = format!("0.0.0.0:{}", configuration.port());
    let app = http::create_app(backend, configuration, SystemClock, sessions);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|err| panic!("Failed to bind {address}: {err}"));
    info!("Listening on {address}");
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|err| panic!("Server error: {err}"));
}
