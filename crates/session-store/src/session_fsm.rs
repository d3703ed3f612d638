//! Session phase state machine using rust-fsm.
//!
//! ```text
//!                 ┌─────────────────┐
//!                 │  Bootstrapping  │ (initial, entered once)
//!                 └────────┬────────┘
//!      NoStoredSession     │     StoredSessionRestored
//!      StoredSessionRejected
//!          ┌───────────────┴───────────────┐
//!          ▼                               ▼
//! ┌─────────────────┐    SignedIn   ┌─────────────────┐
//! │    Anonymous    │ ────────────► │  Authenticated  │
//! └─────────────────┘ ◄──────────── └─────────────────┘
//!                        SignedOut
//! ```
//!
//! `SignedOut` during bootstrap leaves the machine in `Bootstrapping`; the
//! bootstrap routine itself performs the single exit.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Bootstrapping)

    Bootstrapping => {
        NoStoredSession => Anonymous,
        StoredSessionRestored => Authenticated,
        StoredSessionRejected => Anonymous,
        SignedOut => Bootstrapping
    },
    Anonymous => {
        SignedIn => Authenticated,
        SignedOut => Anonymous
    },
    Authenticated => {
        SignedIn => Authenticated,
        ProfileRefreshed => Authenticated,
        SignedOut => Anonymous
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session phase for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Restoring the persisted session; `is_loading` is true.
    Bootstrapping,
    Anonymous,
    Authenticated,
}

impl SessionPhase {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionPhase::Authenticated)
    }
}

impl From<&SessionMachineState> for SessionPhase {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Bootstrapping => SessionPhase::Bootstrapping,
            SessionMachineState::Anonymous => SessionPhase::Anonymous,
            SessionMachineState::Authenticated => SessionPhase::Authenticated,
        }
    }
}
