use std::time::Duration;

use crate::story::{ChoiceSet, Line};

/// Screens the playback controller can ask the surface to switch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Credits,
}

/// Whatever renders the story: text panel, choice buttons, background.
///
/// Surfaces only display; user input flows back through the controller's
/// `select_choice` and `request_menu`.
pub trait PresentationSurface {
    fn show_line(&mut self, line: &Line);

    /// Presents `choices`, sliding them in over `transition`. Returns how far
    /// the text panel was moved to make room, so it can be moved back.
    fn show_choices(&mut self, choices: &ChoiceSet, transition: Duration) -> f32;

    /// Removes the choices and moves the text panel back by
    /// `text_panel_offset`.
    fn hide_choices(&mut self, text_panel_offset: f32, transition: Duration);

    fn navigate(&mut self, screen: Screen);

    fn layout(&mut self, _width: u32, _height: u32) {}
}
