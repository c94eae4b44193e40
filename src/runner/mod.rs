//! Session drivers.
//!
//! - `SessionRunner` drives a session against the wall clock, controlled via `SessionHandle`
//! - `SimulatedParticipant` answers from snapshots, for demos and unattended runs

mod participant;
mod session_runner;

pub use participant::{DEFAULT_ACCURACY, DEFAULT_REACTION_MS, SimulatedParticipant};
pub use session_runner::{RunnerCommand, SessionHandle, SessionRunner};
