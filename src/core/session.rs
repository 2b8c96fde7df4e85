use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::story::StoryEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One playthrough of a story: the engine executing it plus the id that
/// deferred tasks are keyed by.
pub struct StorySession<E: StoryEngine> {
    id: SessionId,
    title: String,
    engine: E,
    started_at: DateTime<Utc>,
}

impl<E: StoryEngine> StorySession<E> {
    pub fn new<S: Into<String>>(title: S, engine: E) -> Self {
        Self {
            id: SessionId::new(),
            title: title.into(),
            engine,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
