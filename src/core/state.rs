use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the active session is in its playback cycle.
///
/// `Idle -> ShowingLine -> {ShowingLine | AwaitingChoice | Ended}` and
/// `AwaitingChoice -> ChoiceTransition -> ShowingLine`. `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    Idle,
    ShowingLine,
    AwaitingChoice,
    ChoiceTransition,
    Ended,
}

impl PlaybackState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::Ended)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::ShowingLine => "showing line",
            PlaybackState::AwaitingChoice => "awaiting choice",
            PlaybackState::ChoiceTransition => "choice transition",
            PlaybackState::Ended => "ended",
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Idle
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
