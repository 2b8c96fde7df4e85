use std::collections::{HashMap, VecDeque};

use crate::story::{ChoiceSet, Line};
use crate::utils::PlayerResult;

/// Everything a story engine can report back while it executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryEvent {
    Line(Line),
    Command {
        name: String,
        params: HashMap<String, String>,
    },
    Choices(ChoiceSet),
    End,
}

impl StoryEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StoryEvent::Line(_) => "line",
            StoryEvent::Command { .. } => "command",
            StoryEvent::Choices(_) => "choices",
            StoryEvent::End => "end",
        }
    }
}

/// Receiver of story events. Engines push into whatever listener they are
/// handed for the duration of a call.
pub trait StoryListener {
    fn on_event(&mut self, event: StoryEvent);
}

/// Listener that buffers events so the caller can dispatch them once the
/// engine call has returned.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<StoryEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn pop(&mut self) -> Option<StoryEvent> {
        self.events.pop_front()
    }
}

impl StoryListener for EventQueue {
    fn on_event(&mut self, event: StoryEvent) {
        self.events.push_back(event);
    }
}

impl Iterator for EventQueue {
    type Item = StoryEvent;

    fn next(&mut self) -> Option<StoryEvent> {
        self.pop()
    }
}

/// The narrative interpreter driven by the playback controller.
pub trait StoryEngine {
    /// Resume execution until the next line, choice point or end.
    fn next(&mut self, listener: &mut dyn StoryListener) -> PlayerResult<()>;

    fn select_choice(&mut self, index: usize) -> PlayerResult<()>;

    fn has_choices(&self) -> bool;
}
