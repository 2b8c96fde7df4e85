pub mod controller;
pub mod events;
pub mod pacing;
pub mod scheduler;
pub mod session;
pub mod state;

pub use controller::PlaybackController;
pub use events::{EventLogger, PlaybackEvent, PlaybackEventHandler, PlaybackEventType};
pub use scheduler::{DeferredAction, DueTask, ScheduledTask, TaskId, TaskScheduler};
pub use session::{SessionId, StorySession};
pub use state::PlaybackState;
