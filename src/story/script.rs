use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::story::Line;

/// A narrative script: passages of beats connected by choices and diverts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub start: String,
    pub passages: Vec<Passage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    #[serde(default)]
    pub beats: Vec<Beat>,
    #[serde(default)]
    pub choices: Vec<ScriptChoice>,
    /// Passage to continue with once the beats run out and there are no
    /// choices. A passage with neither ends the story.
    #[serde(default)]
    pub divert: Option<String>,
}

/// One step of a passage. Commands are tried first since a line has no
/// `command` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Beat {
    Command {
        command: String,
        #[serde(default)]
        params: HashMap<String, String>,
    },
    Line {
        text: String,
        #[serde(default)]
        params: HashMap<String, String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptChoice {
    pub text: String,
    pub target: String,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl Script {
    pub fn new<S: Into<String>>(id: S, title: S, start: S) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            author: String::new(),
            version: default_version(),
            start: start.into(),
            passages: Vec::new(),
        }
    }

    pub fn add_passage(&mut self, passage: Passage) {
        self.passages.push(passage);
    }

    pub fn get_passage(&self, passage_id: &str) -> Option<&Passage> {
        self.passages.iter().find(|p| p.id == passage_id)
    }

    pub fn get_start_passage(&self) -> Option<&Passage> {
        self.get_passage(&self.start)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.get_start_passage().is_none() {
            errors.push(format!("Start passage '{}' not found", self.start));
        }

        for passage in &self.passages {
            if let Err(mut passage_errors) = passage.validate(&self.passages) {
                errors.append(&mut passage_errors);
            }
        }

        let mut passage_ids = std::collections::HashSet::new();
        for passage in &self.passages {
            if !passage_ids.insert(&passage.id) {
                errors.push(format!("Duplicate passage ID: '{}'", passage.id));
            }
        }

        // The story is entered at the start and after every choice; each
        // entry has to show a line before it can offer choices again.
        let mut entries = vec![self.start.as_str()];
        for passage in &self.passages {
            entries.extend(passage.choices.iter().map(|c| c.target.as_str()));
        }
        let mut checked = std::collections::HashSet::new();
        for entry in entries {
            if checked.insert(entry) {
                errors.extend(self.chain_problem(entry, true));
            }
        }

        // Diverts reached after a line may land on choices, but never loop.
        for passage in &self.passages {
            if let Some(divert) = &passage.divert {
                if checked.insert(divert.as_str()) {
                    errors.extend(self.chain_problem(divert, false));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Follows diverts from `entry` until a line, choices or an ending.
    fn chain_problem(&self, entry: &str, needs_line: bool) -> Option<String> {
        let mut visited = std::collections::HashSet::new();
        let mut current = entry;

        loop {
            // Dangling ids are reported by the passage checks.
            let passage = self.get_passage(current)?;
            if !visited.insert(current) {
                return Some(format!(
                    "Passage '{}' diverts in a loop without showing a line",
                    entry
                ));
            }
            if passage.beats.iter().any(|b| matches!(b, Beat::Line { .. })) {
                return None;
            }
            if !passage.choices.is_empty() && needs_line {
                return Some(format!(
                    "Passage '{}' offers choices without showing a line first",
                    entry
                ));
            }
            match &passage.divert {
                Some(divert) if passage.choices.is_empty() => current = divert,
                _ => return None,
            }
        }
    }
}

impl Passage {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            beats: Vec::new(),
            choices: Vec::new(),
            divert: None,
        }
    }

    pub fn with_line<S: Into<String>>(mut self, text: S) -> Self {
        self.beats.push(Beat::Line {
            text: text.into(),
            params: HashMap::new(),
        });
        self
    }

    pub fn with_beat(mut self, beat: Beat) -> Self {
        self.beats.push(beat);
        self
    }

    pub fn with_choice<S: Into<String>>(mut self, text: S, target: S) -> Self {
        self.choices.push(ScriptChoice {
            text: text.into(),
            target: target.into(),
        });
        self
    }

    pub fn with_divert<S: Into<String>>(mut self, target: S) -> Self {
        self.divert = Some(target.into());
        self
    }

    pub fn validate(&self, all_passages: &[Passage]) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let exists = |target: &str| all_passages.iter().any(|p| p.id == target);

        for choice in &self.choices {
            if !exists(&choice.target) {
                errors.push(format!(
                    "Passage '{}': choice '{}' targets unknown passage '{}'",
                    self.id, choice.text, choice.target
                ));
            }
        }

        if let Some(divert) = &self.divert {
            if !exists(divert) {
                errors.push(format!(
                    "Passage '{}': divert to unknown passage '{}'",
                    self.id, divert
                ));
            }
            if !self.choices.is_empty() {
                errors.push(format!(
                    "Passage '{}' cannot have both choices and a divert",
                    self.id
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Beat {
    pub fn line<S: Into<String>>(text: S, params: HashMap<String, String>) -> Self {
        Beat::Line {
            text: text.into(),
            params,
        }
    }

    pub fn command<S: Into<String>>(name: S, params: HashMap<String, String>) -> Self {
        Beat::Command {
            command: name.into(),
            params,
        }
    }

    pub fn to_line(&self) -> Option<Line> {
        match self {
            Beat::Line { text, params } => Some(Line::new(text.clone(), params.clone())),
            Beat::Command { .. } => None,
        }
    }
}
