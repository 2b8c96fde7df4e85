use std::path::{Path, PathBuf};
use tokio::fs;
use crate::story::Script;
use crate::utils::{PlayerError, PlayerResult};
use tracing::{info, warn};

pub struct StoryLoader {
    stories_directory: PathBuf,
}

impl StoryLoader {
    pub fn new<P: AsRef<Path>>(stories_directory: P) -> Self {
        Self {
            stories_directory: stories_directory.as_ref().to_path_buf(),
        }
    }

    pub async fn load_script(&self, story_id: &str) -> PlayerResult<Script> {
        let script_path = self.script_path(story_id);

        info!("Loading story from: {:?}", script_path);

        if !script_path.exists() {
            return Err(PlayerError::story(format!("Story file not found: {}", story_id)));
        }

        let content = fs::read_to_string(&script_path)
            .await
            .map_err(|e| PlayerError::story(format!("Failed to read story file: {}", e)))?;

        let script = Self::parse_script(&content)?;

        info!("Successfully loaded story: {} ({})", script.title, script.id);
        Ok(script)
    }

    pub fn parse_script(content: &str) -> PlayerResult<Script> {
        let script: Script = serde_json::from_str(content)
            .map_err(|e| PlayerError::story(format!("Failed to parse story JSON: {}", e)))?;

        if let Err(errors) = script.validate() {
            let error_msg = errors.join("; ");
            return Err(PlayerError::story(format!("Story validation failed: {}", error_msg)));
        }

        Ok(script)
    }

    pub async fn list_available_stories(&self) -> PlayerResult<Vec<StoryMetadata>> {
        info!("Scanning for stories in: {:?}", self.stories_directory);

        if !self.stories_directory.exists() {
            warn!("Stories directory does not exist: {:?}", self.stories_directory);
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.stories_directory)
            .await
            .map_err(|e| PlayerError::story(format!("Failed to read stories directory: {}", e)))?;

        let mut stories = Vec::new();

        while let Some(entry) = entries.next_entry().await
            .map_err(|e| PlayerError::story(format!("Failed to read directory entry: {}", e)))? {

            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                match self.load_story_metadata(&path).await {
                    Ok(metadata) => stories.push(metadata),
                    Err(e) => {
                        warn!("Failed to load metadata for story at {:?}: {}", path, e);
                        continue;
                    }
                }
            }
        }

        stories.sort_by(|a, b| a.title.cmp(&b.title));

        info!("Found {} stories", stories.len());
        Ok(stories)
    }

    pub fn story_exists(&self, story_id: &str) -> bool {
        self.script_path(story_id).exists()
    }

    async fn load_story_metadata(&self, path: &Path) -> PlayerResult<StoryMetadata> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PlayerError::story(format!("Failed to read story file: {}", e)))?;

        // Only the header fields are needed here.
        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| PlayerError::story(format!("Failed to parse story JSON: {}", e)))?;

        let text = |key: &str, fallback: &str| {
            value.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or(fallback)
                .to_string()
        };

        Ok(StoryMetadata {
            id: text("id", "unknown"),
            title: text("title", "Untitled"),
            description: text("description", "No description available"),
            author: text("author", "Unknown"),
            version: text("version", "1.0.0"),
            passage_count: value.get("passages")
                .and_then(|v| v.as_array())
                .map(|arr| arr.len())
                .unwrap_or(0),
        })
    }

    fn script_path(&self, story_id: &str) -> PathBuf {
        self.stories_directory.join(format!("{}.json", story_id))
    }
}

#[derive(Debug, Clone)]
pub struct StoryMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub version: String,
    pub passage_count: usize,
}

impl StoryMetadata {
    pub fn display_name(&self) -> String {
        format!("{} by {} (v{})", self.title, self.author, self.version)
    }
}
