//! Session outcome classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Seconds of clip remaining within which a finish counts as a draw.
pub const DRAW_WINDOW_SECS: f64 = 2.0;

/// Classified result of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The player finished with comfortable margin on the clip.
    Win,
    /// The player finished inside the draw window.
    Draw,
    /// The clip finished first, or timing was unavailable.
    Lose,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "WIN"),
            Outcome::Draw => write!(f, "DRAW"),
            Outcome::Lose => write!(f, "LOSE"),
        }
    }
}

/// Classify a finished session against the opponent clip's playhead.
///
/// A clip that finished first is an outright loss. Otherwise the player
/// wins with more than [`DRAW_WINDOW_SECS`] of clip remaining and draws
/// inside the window. A negative remainder guards against clock skew and
/// classifies as a loss, as does missing timing.
pub fn resolve(ai_finished_first: bool, position: Option<f64>, duration: Option<f64>) -> Outcome {
    if ai_finished_first {
        return Outcome::Lose;
    }

    match (position, duration) {
        (Some(position), Some(duration)) => {
            let remaining = duration - position;
            if remaining > DRAW_WINDOW_SECS {
                Outcome::Win
            } else if remaining >= 0.0 {
                Outcome::Draw
            } else {
                Outcome::Lose
            }
        }
        _ => Outcome::Lose,
    }
}
