pub mod core;
pub mod story;
pub mod ui;
pub mod config;
pub mod utils;

pub use crate::core::{PlaybackController, PlaybackState, StorySession, TaskScheduler};
pub use crate::story::{ChoiceSet, Line, ScriptedStory, StoryEngine, StoryEvent, StoryListener};
pub use crate::ui::{PlayerInterface, PresentationSurface, Screen};
pub use crate::config::PlayerConfig;
pub use crate::utils::{PlayerError, PlayerResult};

// Re-export commonly used types
pub type Result<T> = anyhow::Result<T>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
