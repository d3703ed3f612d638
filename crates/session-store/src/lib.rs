//! Client-side session management for Feedline.
//!
//! This crate provides:
//! - `SessionStore`, the single owner of the bearer token and signed-in user
//! - bootstrap of a persisted session at process start
//! - an explicit FSM for the session phase
//! - the access decision used to gate signed-in-only features

mod error;
mod guard;
mod session_fsm;
mod store;

pub use error::{AuthError, AuthResult};
pub use guard::{decide_access, AccessDecision};
pub use session_fsm::session_machine;
pub use session_fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionPhase};
pub use store::{
    BootstrapOutcome, RefreshOutcome, SessionSnapshot, SessionStateCallback, SessionStore,
};
