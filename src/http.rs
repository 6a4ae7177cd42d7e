use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    routing::{get, post},
    Json, Router,
};
use axum_valid::Valid;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::backend::SchedulingBackend;
use crate::clock::Clock;
use crate::configuration::Configuration;
use crate::error::BackendError;
use crate::resolver::resolve_bookable_slots;
use crate::session::{SessionEvent, SessionState, SessionTracker};
use crate::types::{BookableSlot, Booking, NewBooking, NewRule, Profile};

lazy_static! {
    static ref CURRENCY_RE: Regex = Regex::new("^[A-Z]{3}$").unwrap();
}

#[derive(Clone)]
pub struct AppState<B: SchedulingBackend, C: Configuration, K: Clock> {
    backend: B,
    configuration: C,
    clock: K,
    sessions: SessionTracker,
}

pub fn create_app<B: SchedulingBackend, C: Configuration, K: Clock>(
    backend: B,
    configuration: C,
    clock: K,
    sessions: SessionTracker,
) -> Router {
    let state = AppState {
        backend,
        configuration,
        clock,
        sessions,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/", get(get_root))
        .route("/dates", get(get_dates))
        .route("/slots", get(get_slots))
        .route("/book", post(book_slot));

    let session = Router::new()
        .route("/session", get(get_session))
        .route("/session/sign_in", post(sign_in))
        .route("/session/sign_out", post(sign_out))
        .route("/session/sign_up", post(sign_up));

    let admin = Router::new()
        .route("/rules", get(get_rules))
        .route("/rules/add", post(add_rule))
        .route("/rules/remove", post(remove_rule))
        .route("/rules/remove_all", post(remove_all_rules))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth));

    Router::new()
        .merge(public)
        .merge(session)
        .merge(admin)
        .with_state(state)
        .layer(cors)
}

/// The server-side capability check for the admin write path. UI-side
/// gating (the session state machine) is a convenience, never the boundary.
async fn admin_auth<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    match request.headers().get("x-admin-password") {
        Some(header) if header.to_str().unwrap_or("") == state.configuration.admin_password() => {
            Ok(next.run(request).await)
        }
        Some(_) => Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string())),
        None => Err((StatusCode::UNAUTHORIZED, "Missing credentials".to_string())),
    }
}

fn error_response(err: BackendError) -> (StatusCode, String) {
    let status = match &err {
        BackendError::RuleNotFound(_) => StatusCode::NOT_FOUND,
        BackendError::BookingConflict { .. } => StatusCode::CONFLICT,
        // Fetch failures are hard errors: never resolve over partial data.
        BackendError::Database(_) | BackendError::Connection(_) => StatusCode::BAD_GATEWAY,
    };
    (status, err.to_string())
}

async fn get_root<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
) -> String {
    state.configuration.website_title()
}

async fn get_dates<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
) -> Json<Vec<NaiveDate>> {
    let today = state.clock.today();
    let window = state.configuration.booking_window_days() as i64;
    Json((0..window).map(|i| today + Duration::days(i)).collect())
}

#[derive(Debug, Deserialize)]
struct SlotsQuery {
    /// Defaults to today (UTC).
    date: Option<NaiveDate>,
    owner: Option<Uuid>,
}

async fn get_slots<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<BookableSlot>>, (StatusCode, String)> {
    let date = query.date.unwrap_or_else(|| state.clock.today());
    let rules = state
        .backend
        .active_rules(query.owner)
        .map_err(error_response)?;
    let bookings = state.backend.bookings_on(date).map_err(error_response)?;

    let resolution = resolve_bookable_slots(date, &rules, &bookings);
    for skipped in &resolution.skipped {
        warn!(rule_id = %skipped.rule_id, reason = %skipped.reason,
            "skipping malformed availability rule");
    }
    Ok(Json(resolution.slots))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
struct BookingRequest {
    rule_id: Uuid,
    starts_at: DateTime<Utc>,
    #[validate(length(min = 1, max = 120))]
    client_name: String,
}

async fn book_slot<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
    Valid(Json(request)): Valid<Json<BookingRequest>>,
) -> Result<(StatusCode, Json<Booking>), (StatusCode, String)> {
    let rule = state.backend.rule(request.rule_id).map_err(error_response)?;
    if !rule.is_active {
        return Err((
            StatusCode::NOT_FOUND,
            format!("availability rule not found: {}", rule.id),
        ));
    }

    // Duration, price and owner come from the stored rule, not the client.
    let booking = state
        .backend
        .create_booking(NewBooking {
            rule_id: rule.id,
            owner_id: rule.owner_id,
            client_name: request.client_name,
            starts_at: request.starts_at,
            duration_minutes: rule.duration_minutes,
            price_at_booking: rule.price,
            currency_at_booking: rule.currency,
        })
        .map_err(|err| match err {
            BackendError::BookingConflict { .. } => (
                StatusCode::CONFLICT,
                "Slot was just taken. Refresh availability and pick another time".to_string(),
            ),
            other => error_response(other),
        })?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[derive(Debug, Deserialize)]
struct RulesQuery {
    owner: Option<Uuid>,
}

async fn get_rules<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
    Query(query): Query<RulesQuery>,
) -> Result<Json<Vec<crate::types::AvailabilityRule>>, (StatusCode, String)> {
    let rules = state.backend.rules(query.owner).map_err(error_response)?;
    Ok(Json(rules))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_time_order))]
struct AddRuleRequest {
    owner_id: Uuid,
    #[validate(range(max = 6))]
    day_of_week: u8,
    start_time: NaiveTime,
    end_time: NaiveTime,
    #[validate(range(min = 1))]
    duration_minutes: u32,
    buffer_minutes: u32,
    #[validate(range(min = 0.0))]
    price: f64,
    #[validate(regex(path = *CURRENCY_RE))]
    currency: String,
    is_active: bool,
}

fn validate_time_order(request: &AddRuleRequest) -> Result<(), ValidationError> {
    if request.start_time < request.end_time {
        Ok(())
    } else {
        Err(ValidationError::new("start_time_not_before_end_time"))
    }
}

async fn add_rule<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
    Valid(Json(request)): Valid<Json<AddRuleRequest>>,
) -> Result<Json<crate::types::AvailabilityRule>, (StatusCode, String)> {
    let rule = state
        .backend
        .add_rule(NewRule {
            owner_id: request.owner_id,
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            duration_minutes: request.duration_minutes,
            buffer_minutes: request.buffer_minutes,
            price: request.price,
            currency: request.currency,
            is_active: request.is_active,
        })
        .map_err(error_response)?;
    Ok(Json(rule))
}

#[derive(Debug, Serialize, Deserialize)]
struct RemoveRuleRequest {
    id: Uuid,
}

async fn remove_rule<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
    Json(request): Json<RemoveRuleRequest>,
) -> Result<(StatusCode, String), (StatusCode, String)> {
    state
        .backend
        .remove_rule(request.id)
        .map_err(error_response)?;
    Ok((StatusCode::OK, "Rule removed successfully".to_string()))
}

async fn remove_all_rules<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
) -> Result<(StatusCode, String), (StatusCode, String)> {
    state.backend.remove_all_rules().map_err(error_response)?;
    Ok((StatusCode::OK, "All rules removed successfully".to_string()))
}

async fn get_session<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
) -> Json<SessionState> {
    Json(state.sessions.current())
}

async fn await_session(
    sessions: &SessionTracker,
    predicate: impl FnMut(&SessionState) -> bool,
) -> Result<SessionState, (StatusCode, String)> {
    let mut watch = sessions.watch();
    let result = match tokio::time::timeout(std::time::Duration::from_secs(1), watch.wait_for(predicate)).await
    {
        Ok(Ok(state)) => Ok(state.clone()),
        _ => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session tracker unavailable".to_string(),
        )),
    };
    result
}

#[derive(Debug, Serialize, Deserialize)]
struct SignInRequest {
    email: String,
    full_name: Option<String>,
    password: String,
}

async fn sign_in<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SessionState>, (StatusCode, String)> {
    if request.password != state.configuration.admin_password() {
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()));
    }
    let profile = Profile {
        id: Uuid::new_v4(),
        full_name: request.full_name.unwrap_or_else(|| "Administrator".into()),
        email: request.email,
        is_admin: true,
    };
    state.sessions.submit(SessionEvent::SignedIn(profile));
    let session = await_session(&state.sessions, |s| {
        matches!(s, SessionState::Authenticated { .. })
    })
    .await?;
    Ok(Json(session))
}

async fn sign_out<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
) -> Result<Json<SessionState>, (StatusCode, String)> {
    state.sessions.submit(SessionEvent::SignedOut);
    let session = await_session(&state.sessions, |s| *s == SessionState::Anonymous).await?;
    Ok(Json(session))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
struct SignUpRequest {
    #[validate(email)]
    email: String,
}

async fn sign_up<B: SchedulingBackend, C: Configuration, K: Clock>(
    State(state): State<AppState<B, C, K>>,
    Valid(Json(request)): Valid<Json<SignUpRequest>>,
) -> (StatusCode, String) {
    state.sessions.submit(SessionEvent::SignUpRequested {
        email: request.email,
    });
    (
        StatusCode::ACCEPTED,
        "Check your email to confirm your account".to_string(),
    )
}
