use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use crate::core::{PlaybackState, SessionId};
use crate::story::{ChoiceSet, Line};

/// Record of something the playback controller did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackEvent {
    pub id: Uuid,
    pub event_type: PlaybackEventType,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackEventType {
    SessionStarted,
    LineShown,
    CommandReceived,
    ChoicesPresented,
    ChoiceSelected,
    StoryEnded,
    SessionCompleted,
    MenuRequested,
    StaleTaskDiscarded,
    SessionDisposed,
}

impl PlaybackEvent {
    pub fn new(event_type: PlaybackEventType, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            timestamp: Utc::now(),
            data,
        }
    }

    pub fn session_started(session: SessionId, title: &str) -> Self {
        let data = serde_json::json!({
            "session_id": session.to_string(),
            "title": title
        });
        Self::new(PlaybackEventType::SessionStarted, data)
    }

    pub fn line_shown(line: &Line, wait_secs: f64) -> Self {
        let data = serde_json::json!({
            "text": line.text(),
            "params": line.params(),
            "wait_secs": wait_secs
        });
        Self::new(PlaybackEventType::LineShown, data)
    }

    pub fn command_received(name: &str, params: &HashMap<String, String>) -> Self {
        let data = serde_json::json!({
            "name": name,
            "params": params
        });
        Self::new(PlaybackEventType::CommandReceived, data)
    }

    pub fn choices_presented(choices: &ChoiceSet, text_panel_offset: f32) -> Self {
        let data = serde_json::json!({
            "choices": choices.labels(),
            "text_panel_offset": text_panel_offset
        });
        Self::new(PlaybackEventType::ChoicesPresented, data)
    }

    pub fn choice_selected(index: usize, label: &str) -> Self {
        let data = serde_json::json!({
            "index": index,
            "label": label
        });
        Self::new(PlaybackEventType::ChoiceSelected, data)
    }

    pub fn story_ended(from_state: PlaybackState) -> Self {
        let data = serde_json::json!({
            "from_state": from_state.name()
        });
        Self::new(PlaybackEventType::StoryEnded, data)
    }

    pub fn session_completed(session: SessionId) -> Self {
        let data = serde_json::json!({
            "session_id": session.to_string()
        });
        Self::new(PlaybackEventType::SessionCompleted, data)
    }

    pub fn menu_requested(state: PlaybackState) -> Self {
        let data = serde_json::json!({
            "state": state.name()
        });
        Self::new(PlaybackEventType::MenuRequested, data)
    }

    pub fn stale_task_discarded(session: SessionId, action: &str) -> Self {
        let data = serde_json::json!({
            "session_id": session.to_string(),
            "action": action
        });
        Self::new(PlaybackEventType::StaleTaskDiscarded, data)
    }

    pub fn session_disposed(session: SessionId, revoked_tasks: usize) -> Self {
        let data = serde_json::json!({
            "session_id": session.to_string(),
            "revoked_tasks": revoked_tasks
        });
        Self::new(PlaybackEventType::SessionDisposed, data)
    }
}

pub trait PlaybackEventHandler {
    fn handle_event(&mut self, event: &PlaybackEvent);
}

pub struct EventLogger {
    events: Vec<PlaybackEvent>,
    max_events: usize,
}

impl EventLogger {
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    pub fn get_events(&self) -> &[PlaybackEvent] {
        &self.events
    }

    pub fn get_events_by_type(&self, event_type: &PlaybackEventType) -> Vec<&PlaybackEvent> {
        self.events
            .iter()
            .filter(|event| &event.event_type == event_type)
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn export_events(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.events)
    }

    pub fn get_event_count(&self) -> usize {
        self.events.len()
    }

    pub fn get_event_count_by_type(&self, event_type: &PlaybackEventType) -> usize {
        self.events
            .iter()
            .filter(|event| &event.event_type == event_type)
            .count()
    }
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl PlaybackEventHandler for EventLogger {
    fn handle_event(&mut self, event: &PlaybackEvent) {
        self.events.push(event.clone());

        if self.events.len() > self.max_events {
            self.events.remove(0);
        }
    }
}
