use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::core::pacing;
use crate::utils::{PlayerError, PlayerResult};

pub const ENV_PREFIX: &str = "INK_PLAYER";

/// Longest single wait any pacing value may ask for: one day.
pub const MAX_WAIT_SECS: f64 = 86_400.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub pacing: PacingConfig,
    pub ui: UiConfig,
    pub paths: PathConfig,
    pub logging: LoggingConfig,
}

/// Timing constants for playback, in seconds of logical time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    pub base_wait_secs: f64,
    pub chars_per_base_wait: u32,
    pub choice_transition_secs: f64,
    pub end_delay_secs: f64,
    /// Upper bound on a single line's display time. Unbounded when unset.
    pub max_line_wait_secs: Option<f64>,
    pub end_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub theme: String,
    pub text_width: usize,
    pub frame_rate: u32,
    pub background: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub stories_dir: PathBuf,
    pub config_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base_wait_secs: 1.0,
            chars_per_base_wait: 20,
            choice_transition_secs: 1.5,
            end_delay_secs: 5.0,
            max_line_wait_secs: None,
            end_text: "THE END".to_string(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            pacing: PacingConfig::default(),
            ui: UiConfig {
                theme: "default".to_string(),
                text_width: 80,
                frame_rate: 30,
                background: None,
            },
            paths: PathConfig {
                stories_dir: PathBuf::from("./assets/stories"),
                config_dir: PathBuf::from("./assets/config"),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl PacingConfig {
    pub fn choice_transition(&self) -> PlayerResult<Duration> {
        pacing::seconds(self.choice_transition_secs)
    }

    pub fn end_delay(&self) -> PlayerResult<Duration> {
        pacing::seconds(self.end_delay_secs)
    }

    pub fn validate(&self) -> PlayerResult<()> {
        let in_range = |v: f64| v.is_finite() && (0.0..=MAX_WAIT_SECS).contains(&v);

        if !in_range(self.base_wait_secs) {
            return Err(PlayerError::configuration("Base wait must be between 0 and one day"));
        }
        if self.chars_per_base_wait == 0 {
            return Err(PlayerError::configuration("Characters per base wait must be greater than 0"));
        }
        if !in_range(self.choice_transition_secs) {
            return Err(PlayerError::configuration("Choice transition must be between 0 and one day"));
        }
        if !in_range(self.end_delay_secs) {
            return Err(PlayerError::configuration("End delay must be between 0 and one day"));
        }
        if let Some(max) = self.max_line_wait_secs {
            if !in_range(max) || max < self.base_wait_secs {
                return Err(PlayerError::configuration(
                    "Max line wait must be at most one day and no smaller than the base wait",
                ));
            }
        }
        Ok(())
    }
}

impl PlayerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> PlayerResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| PlayerError::configuration(format!("Failed to read config file: {}", e)))?;

        let config: PlayerConfig = toml::from_str(&content)
            .map_err(|e| PlayerError::configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Defaults, overlaid with an optional TOML file, overlaid with
    /// `INK_PLAYER__SECTION__KEY` environment variables.
    pub fn load_layered(path: Option<&Path>) -> PlayerResult<Self> {
        let defaults = ::config::Config::try_from(&Self::default())?;
        let mut builder = ::config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(false),
            );
        }

        let config = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<PlayerConfig>()?;

        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> PlayerResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PlayerError::configuration(format!("Failed to create config directory: {}", e)))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .map_err(|e| PlayerError::configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_content)
            .map_err(|e| PlayerError::configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// `config.toml` inside the configured config directory.
    pub fn default_file(&self) -> PathBuf {
        self.paths.config_dir.join("config.toml")
    }

    pub fn get_stories_dir(&self) -> &Path {
        &self.paths.stories_dir
    }

    pub fn validate(&self) -> PlayerResult<()> {
        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => return Err(PlayerError::configuration("Invalid logging level")),
        }

        if self.paths.stories_dir.as_os_str().is_empty() {
            return Err(PlayerError::configuration("Stories directory path cannot be empty"));
        }
        if self.ui.text_width < 40 {
            return Err(PlayerError::configuration("Text width must be at least 40"));
        }
        if self.ui.frame_rate == 0 {
            return Err(PlayerError::configuration("Frame rate must be greater than 0"));
        }

        self.pacing.validate()
    }

    pub fn merge_with_cli(&mut self, cli_config: CliConfig) {
        if let Some(stories_dir) = cli_config.stories_dir {
            self.paths.stories_dir = stories_dir;
        }
        if let Some(log_level) = cli_config.log_level {
            self.logging.level = log_level;
        }
        if cli_config.debug {
            self.logging.level = "debug".to_string();
        }
        if let Some(theme) = cli_config.theme {
            self.ui.theme = theme;
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.ui.frame_rate.max(1)))
    }
}

// Configuration that can be overridden by CLI arguments
#[derive(Debug, Default)]
pub struct CliConfig {
    pub stories_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub debug: bool,
    pub theme: Option<String>,
}
