use anyhow::Result;
use clap::Parser;
use ink_player::config::CliConfig;
use ink_player::{PlayerConfig, PlayerInterface, VERSION};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ink-player")]
#[command(about = "Plays ink-style interactive fiction in the terminal")]
#[command(version = VERSION)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Story to play directly
    #[arg(short, long)]
    story: Option<String>,

    /// Directory containing story scripts
    #[arg(long)]
    stories_dir: Option<PathBuf>,

    /// Color theme
    #[arg(long)]
    theme: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(|| PlayerConfig::default().default_file());
    let mut config = PlayerConfig::load_layered(Some(&config_path))?;
    config.merge_with_cli(CliConfig {
        stories_dir: cli.stories_dir,
        log_level: None,
        debug: cli.debug,
        theme: cli.theme,
    });

    tracing_subscriber::fmt()
        .with_env_filter(format!("ink_player={},warn", config.logging.level))
        .init();

    info!("Starting ink-player v{}", VERSION);

    let mut interface = PlayerInterface::new(config)?;

    let outcome = match cli.story {
        Some(story_id) => {
            info!("Playing story: {}", story_id);
            interface.play_story(&story_id).await
        }
        None => interface.run().await,
    };

    if let Err(e) = outcome {
        error!("Player error: {}", e);
        eprintln!("An error occurred: {}", e);
        std::process::exit(1);
    }

    info!("Player session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["ink-player", "--debug", "--story", "lantern"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.story.as_deref(), Some("lantern"));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["ink-player"]).unwrap();
        assert!(!cli.debug);
        assert!(cli.config.is_none());
        assert!(cli.stories_dir.is_none());
    }
}
