pub mod line;
pub mod engine;
pub mod script;
pub mod scripted;
pub mod loader;

pub use line::{Line, ChoiceSet};
pub use engine::{StoryEngine, StoryEvent, StoryListener, EventQueue};
pub use script::{Script, Passage, Beat, ScriptChoice};
pub use scripted::ScriptedStory;
pub use loader::{StoryLoader, StoryMetadata};
