//! Admin login gate and the per-session application state.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::store::{DeviceStore, StoreError};

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("no credential record at {0}")]
    MissingCredentials(String),
    #[error("credentials at {0} need a store")]
    StoreRequired(String),
    #[error("credential lookup failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("admin", "admin123")
    }
}

/// Where the admin pair is checked against.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Fixed(Credentials),
    /// A `{username, password}` record in the store.
    Store { path: String },
}

impl Default for CredentialSource {
    fn default() -> Self {
        CredentialSource::Fixed(Credentials::default())
    }
}

impl CredentialSource {
    pub fn requires_store(&self) -> bool {
        matches!(self, CredentialSource::Store { .. })
    }

    /// Checks a fixed pair without any store round trip.
    pub fn verify_fixed(&self, attempt: &Credentials) -> Result<bool, SessionError> {
        match self {
            CredentialSource::Fixed(expected) => Ok(expected == attempt),
            CredentialSource::Store { path } => Err(SessionError::StoreRequired(path.clone())),
        }
    }

    pub async fn verify<S: DeviceStore + ?Sized>(
        &self,
        store: &S,
        attempt: &Credentials,
    ) -> Result<bool, SessionError> {
        match self {
            CredentialSource::Fixed(expected) => Ok(expected == attempt),
            CredentialSource::Store { path } => {
                let record = store
                    .read(path)
                    .await?
                    .ok_or_else(|| SessionError::MissingCredentials(path.clone()))?;
                let expected: Credentials = serde_json::from_value(record)
                    .map_err(|_| SessionError::MissingCredentials(path.clone()))?;
                Ok(&expected == attempt)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogoutReason {
    Explicit,
    Inactivity,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn {
        username: String,
        since: Instant,
        last_activity: Instant,
    },
}

#[derive(Debug)]
pub struct LoginGate {
    source: CredentialSource,
    inactivity_timeout: Duration,
    state: SessionState,
    error: Option<String>,
    last_logout: Option<LogoutReason>,
}

impl LoginGate {
    pub fn new(source: CredentialSource, inactivity_timeout: Duration) -> Self {
        Self {
            source,
            inactivity_timeout,
            state: SessionState::LoggedOut,
            error: None,
            last_logout: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::LoggedIn { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::LoggedIn { username, .. } => Some(username),
            SessionState::LoggedOut => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_logout(&self) -> Option<LogoutReason> {
        self.last_logout
    }

    pub fn inactivity_timeout(&self) -> Duration {
        self.inactivity_timeout
    }

    /// Returns whether the gate is now logged in. Mismatches and lookup
    /// failures leave it logged out with an error message set.
    pub async fn submit<S: DeviceStore + ?Sized>(
        &mut self,
        store: &S,
        username: &str,
        password: &str,
        now: Instant,
    ) -> bool {
        if self.is_logged_in() {
            return true;
        }

        let attempt = Credentials::new(username, password);
        let outcome = self.source.verify(store, &attempt).await;
        self.settle(username, outcome, now)
    }

    /// Like [`LoginGate::submit`] for fixed credential sources. A store-backed
    /// source fails with an error message instead of being consulted.
    pub fn submit_offline(&mut self, username: &str, password: &str, now: Instant) -> bool {
        if self.is_logged_in() {
            return true;
        }

        let attempt = Credentials::new(username, password);
        let outcome = self.source.verify_fixed(&attempt);
        self.settle(username, outcome, now)
    }

    pub fn requires_store(&self) -> bool {
        self.source.requires_store()
    }

    fn settle(&mut self, username: &str, outcome: Result<bool, SessionError>, now: Instant) -> bool {
        match outcome {
            Ok(true) => {
                info!(username, "admin logged in");
                self.state = SessionState::LoggedIn {
                    username: username.to_string(),
                    since: now,
                    last_activity: now,
                };
                self.error = None;
                true
            }
            Ok(false) => {
                warn!(username, "rejected login");
                self.error = Some(INVALID_CREDENTIALS.to_string());
                false
            }
            Err(err) => {
                warn!(error = %err, "login check failed");
                self.error = Some(err.to_string());
                false
            }
        }
    }

    pub fn touch(&mut self, now: Instant) {
        if let SessionState::LoggedIn { last_activity, .. } = &mut self.state {
            *last_activity = now;
        }
    }

    pub fn idle_for(&self, now: Instant) -> Option<Duration> {
        match &self.state {
            SessionState::LoggedIn { last_activity, .. } => {
                Some(now.saturating_duration_since(*last_activity))
            }
            SessionState::LoggedOut => None,
        }
    }

    /// Logs out when the session has been idle for the full timeout.
    pub fn expire_if_idle(&mut self, now: Instant) -> bool {
        match self.idle_for(now) {
            Some(idle) if idle >= self.inactivity_timeout => {
                self.logout(LogoutReason::Inactivity);
                true
            }
            _ => false,
        }
    }

    pub fn logout(&mut self, reason: LogoutReason) {
        if let Some(username) = self.username() {
            info!(username, ?reason, "admin logged out");
        }
        self.state = SessionState::LoggedOut;
        self.last_logout = Some(reason);
        self.error = None;
    }

    pub fn close(&mut self) {
        if self.is_logged_in() {
            self.logout(LogoutReason::Closed);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Route {
    Dashboard,
    DeviceLocation,
    DeviceConfig,
    Historical,
}

impl Route {
    pub const ALL: [Route; 4] = [
        Route::Dashboard,
        Route::DeviceLocation,
        Route::DeviceConfig,
        Route::Historical,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::DeviceLocation => "Device Location",
            Route::DeviceConfig => "Device Configuration",
            Route::Historical => "Historical Data",
        }
    }

    pub fn index(self) -> usize {
        Route::ALL.iter().position(|r| *r == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Route::ALL[(self.index() + 1) % Route::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Route::ALL[(self.index() + Route::ALL.len() - 1) % Route::ALL.len()]
    }
}

/// Everything a dashboard session carries: the gate, the open view and the
/// view to resume after logging back in.
#[derive(Debug)]
pub struct AppState {
    gate: LoginGate,
    route: Option<Route>,
    last_route: Option<Route>,
}

impl AppState {
    pub fn new(gate: LoginGate) -> Self {
        Self {
            gate,
            route: None,
            last_route: None,
        }
    }

    pub fn gate(&self) -> &LoginGate {
        &self.gate
    }

    /// `None` while the login form is showing.
    pub fn route(&self) -> Option<Route> {
        self.route
    }

    pub async fn login<S: DeviceStore + ?Sized>(
        &mut self,
        store: &S,
        username: &str,
        password: &str,
        now: Instant,
    ) -> bool {
        if !self.gate.submit(store, username, password, now).await {
            return false;
        }
        self.route = Some(self.last_route.unwrap_or(Route::Dashboard));
        true
    }

    pub fn navigate(&mut self, route: Route, now: Instant) -> Result<(), SessionError> {
        if !self.gate.is_logged_in() {
            return Err(SessionError::NotLoggedIn);
        }
        self.gate.touch(now);
        self.route = Some(route);
        self.last_route = Some(route);
        Ok(())
    }

    pub fn touch(&mut self, now: Instant) {
        self.gate.touch(now);
    }

    /// Explicit logout forgets the resume view.
    pub fn logout(&mut self) {
        self.gate.logout(LogoutReason::Explicit);
        self.route = None;
        self.last_route = None;
    }

    /// Idle expiry keeps the resume view so the next login lands back on it.
    pub fn tick(&mut self, now: Instant) -> Option<LogoutReason> {
        if self.gate.expire_if_idle(now) {
            self.route = None;
            return Some(LogoutReason::Inactivity);
        }
        None
    }

    pub fn close(&mut self) {
        self.gate.close();
        self.route = None;
        self.last_route = None;
    }
}
