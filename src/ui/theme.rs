use colored::{Color, Colorize};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: HashMap<String, ColorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorConfig {
    pub foreground: Option<String>,
    pub style: Vec<String>,
}

/// (style name, foreground, styles) rows a built-in theme is made of.
type Palette = &'static [(&'static str, &'static str, &'static [&'static str])];

const DEFAULT_PALETTE: Palette = &[
    ("title", "cyan", &["bold"]),
    ("line", "white", &[]),
    ("speaker", "yellow", &["bold"]),
    ("emphasis", "white", &["italic"]),
    ("choice", "green", &[]),
    ("end", "magenta", &["bold"]),
    ("info", "blue", &[]),
    ("error", "red", &["bold"]),
    ("success", "green", &["bold"]),
    ("warning", "yellow", &["bold"]),
    ("separator", "bright_black", &["dimmed"]),
];

const DARK_PALETTE: Palette = &[
    ("title", "bright_cyan", &["bold"]),
    ("line", "bright_white", &[]),
    ("speaker", "bright_yellow", &["bold"]),
    ("emphasis", "bright_white", &["italic"]),
    ("choice", "bright_green", &[]),
    ("end", "bright_magenta", &["bold"]),
    ("info", "bright_blue", &[]),
    ("separator", "bright_black", &["dimmed"]),
];

const LIGHT_PALETTE: Palette = &[
    ("title", "blue", &["bold"]),
    ("line", "black", &[]),
    ("speaker", "magenta", &["bold"]),
    ("choice", "blue", &[]),
    ("end", "red", &["bold"]),
];

#[derive(Debug, Clone)]
pub struct ThemeManager {
    themes: HashMap<String, Theme>,
    current_theme: String,
}

impl ThemeManager {
    pub fn new() -> Self {
        let mut manager = Self {
            themes: HashMap::new(),
            current_theme: "default".to_string(),
        };

        manager.load_default_themes();
        manager
    }

    pub fn set_theme(&mut self, theme_name: &str) -> bool {
        if self.themes.contains_key(theme_name) {
            self.current_theme = theme_name.to_string();
            true
        } else {
            false
        }
    }

    pub fn current_theme_name(&self) -> &str {
        &self.current_theme
    }

    fn color_config(&self, style_name: &str) -> Option<&ColorConfig> {
        // Styles missing from the active theme fall back to the default one.
        self.themes
            .get(&self.current_theme)
            .and_then(|theme| theme.colors.get(style_name))
            .or_else(|| {
                self.themes
                    .get("default")
                    .and_then(|theme| theme.colors.get(style_name))
            })
    }

    pub fn apply_style(&self, text: &str, style_name: &str) -> String {
        let Some(color_config) = self.color_config(style_name) else {
            return text.to_string();
        };

        let mut styled = text.normal();
        if let Some(color) = color_config.foreground.as_deref().and_then(parse_color) {
            styled = styled.color(color);
        }

        for style in &color_config.style {
            styled = match style.as_str() {
                "bold" => styled.bold(),
                "italic" => styled.italic(),
                "underline" => styled.underline(),
                "dimmed" => styled.dimmed(),
                _ => styled,
            };
        }

        styled.to_string()
    }

    pub fn list_themes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.themes.keys().cloned().collect();
        names.sort();
        names
    }

    fn load_default_themes(&mut self) {
        for (name, palette) in [
            ("default", DEFAULT_PALETTE),
            ("dark", DARK_PALETTE),
            ("light", LIGHT_PALETTE),
        ] {
            let colors = palette
                .iter()
                .map(|(style_name, foreground, styles)| {
                    let config = ColorConfig {
                        foreground: Some(foreground.to_string()),
                        style: styles.iter().map(|s| s.to_string()).collect(),
                    };
                    (style_name.to_string(), config)
                })
                .collect();

            self.themes.insert(name.to_string(), Theme {
                name: name.to_string(),
                colors,
            });
        }
    }
}

impl Default for ThemeManager {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_color(color_name: &str) -> Option<Color> {
    match color_name.to_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "bright_black" => Some(Color::BrightBlack),
        "bright_red" => Some(Color::BrightRed),
        "bright_green" => Some(Color::BrightGreen),
        "bright_yellow" => Some(Color::BrightYellow),
        "bright_blue" => Some(Color::BrightBlue),
        "bright_magenta" => Some(Color::BrightMagenta),
        "bright_cyan" => Some(Color::BrightCyan),
        "bright_white" => Some(Color::BrightWhite),
        _ => None,
    }
}
