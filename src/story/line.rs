use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One unit of narrative text plus the named parameters the script attached
/// to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    text: String,
    #[serde(default)]
    params: HashMap<String, String>,
}

impl Line {
    pub fn new<S: Into<String>>(text: S, params: HashMap<String, String>) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }

    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self::new(text, HashMap::new())
    }

    pub fn with_param<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn speaker(&self) -> Option<&str> {
        self.param("speaker")
    }

    pub fn style(&self) -> Option<&str> {
        self.param("style")
    }

    /// Length used for pacing, counted in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Branching options offered at a decision point, addressed by index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChoiceSet {
    labels: Vec<String>,
}

impl ChoiceSet {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains_index(&self, index: usize) -> bool {
        index < self.labels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl From<Vec<String>> for ChoiceSet {
    fn from(labels: Vec<String>) -> Self {
        Self { labels }
    }
}
