pub mod surface;
pub mod interface;
pub mod theme;
pub mod components;

pub use surface::{PresentationSurface, Screen};
pub use interface::PlayerInterface;
pub use theme::{Theme, ThemeManager};
pub use components::TerminalSurface;
