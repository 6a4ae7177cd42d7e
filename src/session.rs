//! Session state machine.
//!
//! Replaces ad-hoc user/profile/loading flags with one explicit state,
//! advanced only by discrete events delivered through a single ordered
//! channel. Observers read the current state from a watch channel; nothing
//! derives loading flags from independent booleans.
//!
//! This tracks UI-facing auth state only. The admin capability check on the
//! write path lives in the HTTP middleware and never consults this machine.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::types::Profile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Initializing,
    Anonymous,
    Authenticated { profile: Profile },
    Error { reason: String },
}

impl SessionState {
    /// Convenience for display gating only — never a security boundary.
    pub fn is_admin(&self) -> bool {
        matches!(self, SessionState::Authenticated { profile } if profile.is_admin)
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Bootstrap finished; an existing session may have been restored.
    SessionRestored(Option<Profile>),
    RestoreFailed(String),
    SignedIn(Profile),
    SignedOut,
    /// Sign-up was requested; confirmation happens with the external auth
    /// collaborator, so the session stays anonymous.
    SignUpRequested { email: String },
}

/// Pure transition function. `None` means the event is not valid in the
/// current state and is dropped (with a warning at the call site).
fn transition(state: &SessionState, event: &SessionEvent) -> Option<SessionState> {
    use SessionEvent::*;
    use SessionState::*;

    match (state, event) {
        (Initializing | Error { .. }, SessionRestored(Some(profile))) => Some(Authenticated {
            profile: profile.clone(),
        }),
        (Initializing | Error { .. }, SessionRestored(None)) => Some(Anonymous),
        (Initializing, RestoreFailed(reason)) => Some(Error {
            reason: reason.clone(),
        }),
        // Re-signing in refreshes the profile; recovery out of Error is allowed.
        (Anonymous | Authenticated { .. } | Error { .. }, SignedIn(profile)) => {
            Some(Authenticated {
                profile: profile.clone(),
            })
        }
        (Authenticated { .. } | Error { .. }, SignedOut) => Some(Anonymous),
        (Anonymous, SignUpRequested { .. }) => Some(Anonymous),
        _ => None,
    }
}

/// Owner of the event channel: one consumer task applies events in order
/// and publishes each resulting state.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    events: mpsc::UnboundedSender<SessionEvent>,
    state: watch::Receiver<SessionState>,
}

impl SessionTracker {
    pub fn spawn() -> Self {
        let (events, mut receiver) = mpsc::unbounded_channel::<SessionEvent>();
        let (publisher, state) = watch::channel(SessionState::Initializing);

        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                let current = publisher.borrow().clone();
                match transition(&current, &event) {
                    Some(next) => {
                        debug!(?event, ?next, "session transition");
                        if publisher.send(next).is_err() {
                            break;
                        }
                    }
                    None => warn!(?event, state = ?current, "ignoring session event"),
                }
            }
        });

        Self { events, state }
    }

    pub fn submit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            warn!("session tracker task is gone; event dropped");
        }
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch handle for callers that need to await a transition.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }
}
