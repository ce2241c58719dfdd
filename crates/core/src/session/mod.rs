//! Session state machine and matching rules.

pub mod controller;
pub mod engine;

pub use controller::{
    CardView, SessionController, SessionError, SessionPhase, SessionSnapshot,
};
pub use engine::{MatchEngine, RevealOutcome};
