use console::Term;
use std::cell::Cell;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::story::{ChoiceSet, Line};
use crate::ui::{PresentationSurface, Screen, ThemeManager};

/// Terminal rendition of the story screen: the scrolling output is the text
/// panel. The choice buttons are the interactive prompt the front end shows
/// below the separator this surface draws at a choice point.
pub struct TerminalSurface {
    term: Term,
    theme_manager: ThemeManager,
    text_width: usize,
    background: Option<PathBuf>,
    screen_request: Option<Screen>,
    rows_written: Cell<usize>,
}

impl TerminalSurface {
    pub fn new(theme_manager: ThemeManager, text_width: usize) -> Self {
        Self {
            term: Term::stdout(),
            theme_manager,
            text_width,
            background: None,
            screen_request: None,
            rows_written: Cell::new(0),
        }
    }

    pub fn with_background(mut self, background: Option<PathBuf>) -> Self {
        self.background = background;
        self
    }

    pub fn text_width(&self) -> usize {
        self.text_width
    }

    /// Rows sent to the terminal so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written.get()
    }

    pub fn theme_manager(&self) -> &ThemeManager {
        &self.theme_manager
    }

    /// Last navigation the controller asked for, if not yet handled.
    pub fn take_screen_request(&mut self) -> Option<Screen> {
        self.screen_request.take()
    }

    pub fn clear(&self) {
        if let Err(e) = self.term.clear_screen() {
            debug!("Could not clear terminal: {}", e);
        }
        if let Some(background) = &self.background {
            self.write(&self.theme_manager.apply_style(&format!("[{}]", background.display()), "separator"));
        }
    }

    pub fn show_message(&self, message: &str, style: &str) {
        self.write(&self.theme_manager.apply_style(message, style));
    }

    /// Lines to print for `line`: speaker prefix on the first row, wrapped
    /// to the panel width.
    pub fn render_line(&self, line: &Line) -> Vec<String> {
        let style = match line.style() {
            Some("emphasis") => "emphasis",
            _ => "line",
        };

        let (prefix, width) = match line.speaker() {
            Some(speaker) => {
                let prefix = format!("{}: ", speaker);
                let width = self.text_width.saturating_sub(prefix.chars().count()).max(1);
                (Some(prefix), width)
            }
            None => (None, self.text_width),
        };

        let mut rows: Vec<String> = wrap_text(line.text(), width)
            .into_iter()
            .map(|row| self.theme_manager.apply_style(&row, style))
            .collect();

        if let Some(prefix) = prefix {
            let indent = " ".repeat(prefix.chars().count());
            let styled_prefix = self.theme_manager.apply_style(&prefix, "speaker");
            for (i, row) in rows.iter_mut().enumerate() {
                let lead = if i == 0 { styled_prefix.as_str() } else { indent.as_str() };
                *row = format!("{}{}", lead, row);
            }
        }

        rows
    }

    fn write(&self, text: &str) {
        self.rows_written.set(self.rows_written.get() + 1);
        if let Err(e) = self.term.write_line(text) {
            warn!("Failed to write to terminal: {}", e);
        }
    }

    fn separator(&self) -> String {
        self.theme_manager.apply_style(&"─".repeat(self.text_width), "separator")
    }
}

impl PresentationSurface for TerminalSurface {
    fn show_line(&mut self, line: &Line) {
        for row in self.render_line(line) {
            self.write(&row);
        }
        self.write("");
    }

    fn show_choices(&mut self, choices: &ChoiceSet, _transition: Duration) -> f32 {
        self.write(&self.separator());

        // The prompt below the separator takes one row per choice.
        (choices.len() + 1) as f32
    }

    fn hide_choices(&mut self, text_panel_offset: f32, _transition: Duration) {
        debug!("Choices dismissed, text panel back by {} rows", text_panel_offset);
        self.write(&self.separator());
    }

    fn navigate(&mut self, screen: Screen) {
        if screen == Screen::Credits {
            self.write(&self.separator());
            self.show_message("Thank you for playing!", "success");
        }
        self.screen_request = Some(screen);
    }

    fn layout(&mut self, width: u32, _height: u32) {
        self.text_width = (width as usize).max(20);
    }
}

/// Greedy word wrap; words longer than `width` get a row of their own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        let needed = current_line.chars().count() + word.chars().count() + 1;
        if needed > width && !current_line.is_empty() {
            rows.push(std::mem::take(&mut current_line));
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        rows.push(current_line);
    }

    rows
}
