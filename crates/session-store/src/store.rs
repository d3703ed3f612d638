//! The session store: sole owner of the token and the signed-in user.
//!
//! Session state lives behind a `std::sync::Mutex` that is never held across
//! an await. Mutating operations are serialized by an async gate, and all but
//! bootstrap wait for bootstrap to settle first, starting it if needed. `logout` does not take the
//! gate; it bumps the session epoch so that any operation whose request was
//! issued before the logout discards its result.

use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionPhase};
use crate::{AuthError, AuthResult};
use api_boundary::{
    ApiClient, ApiError, AuthResponse, IdentityGateway, ProfileGateway, UpdateProfile, User,
};
use client_storage::{CredentialRead, CredentialVault, PersistedCredentials};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Point-in-time copy of the session state.
#[derive(Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub is_loading: bool,
    pub phase: SessionPhase,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }
}

impl fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("is_loading", &self.is_loading)
            .field("phase", &self.phase)
            .finish()
    }
}

/// How bootstrap resolved.
#[derive(Debug)]
pub enum BootstrapOutcome {
    /// The stored token was accepted; the session is live.
    Restored(User),
    /// Nothing was stored.
    NoSession,
    /// The stored record could not be decoded. It is left in place and
    /// replaced by the next sign-in.
    Corrupt(String),
    /// The provider refused the stored token (or could not be reached); the
    /// record was erased.
    Rejected(ApiError),
    /// The record could not be read; the session starts anonymous.
    StorageUnavailable(String),
    /// A logout arrived while the profile fetch was in flight.
    Superseded,
    /// Bootstrap had already been started on this store.
    AlreadyStarted,
}

/// Result of [`SessionStore::refresh_user`]. Never an error.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The profile was fetched and replaced.
    Updated(User),
    /// No token, so nothing was fetched.
    Skipped,
    /// The fetch failed or was superseded; the previous user is kept.
    Stale(AuthError),
}

/// Callback type for session change notifications.
pub type SessionStateCallback = Box<dyn Fn(SessionSnapshot) + Send + Sync>;

struct SessionState {
    user: Option<User>,
    token: Option<String>,
    is_loading: bool,
    epoch: u64,
    machine: SessionMachine,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            token: self.token.clone(),
            is_loading: self.is_loading,
            phase: SessionPhase::from(self.machine.state()),
        }
    }

    fn transition(&mut self, input: &SessionMachineInput) -> AuthResult<SessionPhase> {
        let old_phase = SessionPhase::from(self.machine.state());

        self.machine.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                self.machine.state()
            ))
        })?;

        let new_phase = SessionPhase::from(self.machine.state());
        if old_phase != new_phase {
            info!(old_phase = ?old_phase, new_phase = ?new_phase, "Session phase changed");
        }
        Ok(new_phase)
    }
}

/// Session store shared by the whole application as `Arc<SessionStore>`.
pub struct SessionStore {
    vault: CredentialVault,
    identity: IdentityGateway,
    profile: ProfileGateway,
    state: Mutex<SessionState>,
    /// Serializes bootstrap, login, register, refresh_user and update_profile.
    op_gate: tokio::sync::Mutex<()>,
    bootstrap_started: AtomicBool,
    bootstrapped: watch::Sender<bool>,
    state_callback: Mutex<Option<SessionStateCallback>>,
}

impl SessionStore {
    /// Create a store. The session stays in the bootstrapping phase until
    /// [`SessionStore::bootstrap`] runs, either directly or through the first
    /// operation that waits on [`SessionStore::ready`].
    pub fn new(vault: CredentialVault, identity: IdentityGateway, profile: ProfileGateway) -> Self {
        let (bootstrapped, _) = watch::channel(false);
        Self {
            vault,
            identity,
            profile,
            state: Mutex::new(SessionState {
                user: None,
                token: None,
                is_loading: true,
                epoch: 0,
                machine: SessionMachine::new(),
            }),
            op_gate: tokio::sync::Mutex::new(()),
            bootstrap_started: AtomicBool::new(false),
            bootstrapped,
            state_callback: Mutex::new(None),
        }
    }

    /// Create a store whose gateways share one client.
    pub fn with_client(vault: CredentialVault, client: ApiClient) -> Self {
        Self::new(
            vault,
            IdentityGateway::new(client.clone()),
            ProfileGateway::new(client),
        )
    }

    /// Set a callback to be notified of every phase, user, or token change.
    ///
    /// The callback runs on the calling task and must not call back into
    /// `set_state_callback`.
    pub fn set_state_callback(&self, callback: SessionStateCallback) {
        let mut cb = self
            .state_callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *cb = Some(callback);
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, snapshot: SessionSnapshot) {
        let cb = self
            .state_callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(callback) = cb.as_ref() {
            callback(snapshot);
        }
    }

    fn current_epoch(&self) -> u64 {
        self.lock_state().epoch
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock_state().snapshot()
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from(self.lock_state().machine.state())
    }

    pub fn is_loading(&self) -> bool {
        self.lock_state().is_loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    pub fn token(&self) -> Option<String> {
        self.lock_state().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.lock_state().user.clone()
    }

    /// Wait until bootstrap has settled, running it first if nobody has started it.
    pub async fn ready(&self) {
        if !self.bootstrap_started.load(Ordering::SeqCst) {
            self.bootstrap().await;
        }
        let mut rx = self.bootstrapped.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Restore the persisted session. Runs once per store; later calls return
    /// [`BootstrapOutcome::AlreadyStarted`] immediately.
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        if self.bootstrap_started.swap(true, Ordering::SeqCst) {
            return BootstrapOutcome::AlreadyStarted;
        }

        let _gate = self.op_gate.lock().await;
        let (input, outcome) = self.restore().await;

        let snapshot = {
            let mut state = self.lock_state();
            state.is_loading = false;
            if let Err(e) = state.transition(&input) {
                warn!(error = %e, "Bootstrap ended in an unexpected phase");
            }
            state.snapshot()
        };
        self.notify(snapshot);
        self.bootstrapped.send_replace(true);

        outcome
    }

    async fn restore(&self) -> (SessionMachineInput, BootstrapOutcome) {
        let epoch = self.current_epoch();

        let credentials = match self.vault.read() {
            Ok(CredentialRead::Present(credentials)) => credentials,
            Ok(CredentialRead::Absent) => {
                info!("No stored session found on startup");
                return (SessionMachineInput::NoStoredSession, BootstrapOutcome::NoSession);
            }
            Ok(CredentialRead::Corrupt(reason)) => {
                warn!(reason = %reason, "Stored session is corrupt, ignoring it");
                return (
                    SessionMachineInput::NoStoredSession,
                    BootstrapOutcome::Corrupt(reason),
                );
            }
            Err(e) => {
                warn!(error = %e, "Could not read stored session");
                return (
                    SessionMachineInput::NoStoredSession,
                    BootstrapOutcome::StorageUnavailable(e.to_string()),
                );
            }
        };

        let token = credentials.access_token;
        let snapshot = {
            let mut state = self.lock_state();
            if state.epoch != epoch {
                return (SessionMachineInput::NoStoredSession, BootstrapOutcome::Superseded);
            }
            state.token = Some(token.clone());
            state.snapshot()
        };
        self.notify(snapshot);

        debug!("Verifying stored session with the provider");
        let result = self.profile.get_current(&token).await;

        let mut state = self.lock_state();
        if state.epoch != epoch {
            debug!("Stored session was signed out during bootstrap");
            return (SessionMachineInput::NoStoredSession, BootstrapOutcome::Superseded);
        }

        match result {
            Ok(user) => {
                info!(user_id = %user.id, "Restored stored session");
                state.user = Some(user.clone());
                (
                    SessionMachineInput::StoredSessionRestored,
                    BootstrapOutcome::Restored(user),
                )
            }
            Err(e) => {
                warn!(error = %e, "Stored session was rejected, clearing it");
                state.token = None;
                drop(state);
                self.erase_record();
                (
                    SessionMachineInput::StoredSessionRejected,
                    BootstrapOutcome::Rejected(e),
                )
            }
        }
    }

    fn erase_record(&self) {
        if let Err(e) = self.vault.clear() {
            warn!(error = %e, "Failed to erase stored session");
        }
    }

    /// Sign in with email and password. On failure nothing changes.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<User> {
        self.ready().await;
        let _gate = self.op_gate.lock().await;
        let epoch = self.current_epoch();

        debug!("Attempting email/password login");
        let response = self.identity.login(email, password).await?;
        self.establish(epoch, response)
    }

    /// Create an account and sign in to it.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AuthResult<User> {
        self.ready().await;
        let _gate = self.op_gate.lock().await;
        let epoch = self.current_epoch();

        debug!("Attempting registration");
        let response = self.identity.register(name, email, password).await?;
        self.establish(epoch, response)
    }

    /// Persist a fresh token pair, then publish it. The record is written
    /// before any in-memory state so a storage failure leaves both untouched.
    fn establish(&self, epoch: u64, response: AuthResponse) -> AuthResult<User> {
        let AuthResponse {
            access_token,
            refresh_token,
            user,
        } = response;

        let snapshot = {
            let mut state = self.lock_state();
            if state.epoch != epoch {
                return Err(AuthError::Superseded);
            }

            self.vault
                .persist(&PersistedCredentials::new(access_token.clone(), refresh_token))?;
            state.transition(&SessionMachineInput::SignedIn)?;
            state.token = Some(access_token);
            state.user = Some(user.clone());
            state.snapshot()
        };
        self.notify(snapshot);

        info!(user_id = %user.id, "Login successful");
        Ok(user)
    }

    /// Sign out. Takes effect immediately, and results of requests already in
    /// flight are discarded. Storage failures are logged, not raised.
    pub fn logout(&self) {
        let snapshot = {
            let mut state = self.lock_state();
            state.epoch += 1;
            self.erase_record();
            state.token = None;
            state.user = None;
            if let Err(e) = state.transition(&SessionMachineInput::SignedOut) {
                warn!(error = %e, "Unexpected phase during logout");
            }
            state.snapshot()
        };
        self.notify(snapshot);

        info!("Logged out");
    }

    /// Re-fetch the signed-in user's profile. Failures keep the previous user.
    pub async fn refresh_user(&self) -> RefreshOutcome {
        self.ready().await;
        let _gate = self.op_gate.lock().await;

        let (epoch, token) = {
            let state = self.lock_state();
            (state.epoch, state.token.clone())
        };
        let Some(token) = token else {
            return RefreshOutcome::Skipped;
        };

        match self.profile.get_current(&token).await {
            Ok(user) => match self.replace_user(epoch, user) {
                Ok(user) => RefreshOutcome::Updated(user),
                Err(e) => RefreshOutcome::Stale(e),
            },
            Err(e) => {
                warn!(error = %e, "Failed to refresh user profile");
                RefreshOutcome::Stale(e.into())
            }
        }
    }

    /// Update the signed-in user's profile and adopt the provider's copy.
    pub async fn update_profile(&self, update: &UpdateProfile) -> AuthResult<User> {
        self.ready().await;
        let _gate = self.op_gate.lock().await;

        let (epoch, token) = {
            let state = self.lock_state();
            (state.epoch, state.token.clone())
        };
        let token = token.ok_or(AuthError::NotLoggedIn)?;

        let user = self.profile.update_profile(&token, update).await?;
        let user = self.replace_user(epoch, user)?;

        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    fn replace_user(&self, epoch: u64, user: User) -> AuthResult<User> {
        let snapshot = {
            let mut state = self.lock_state();
            if state.epoch != epoch || state.token.is_none() {
                return Err(AuthError::Superseded);
            }
            state.transition(&SessionMachineInput::ProfileRefreshed)?;
            state.user = Some(user.clone());
            state.snapshot()
        };
        self.notify(snapshot);
        Ok(user)
    }
}
