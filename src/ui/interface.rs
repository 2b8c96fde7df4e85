use dialoguer::{Confirm, Select};
use std::time::Instant;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::PlayerConfig;
use crate::core::{PlaybackController, PlaybackState, StorySession};
use crate::story::{ChoiceSet, ScriptedStory, StoryLoader};
use crate::ui::{Screen, TerminalSurface, ThemeManager};
use crate::utils::{PlayerError, PlayerResult};
use tracing::{debug, error, info, warn};

type TerminalController = PlaybackController<ScriptedStory, TerminalSurface>;

const MENU_ENTRY: &str = "☰ Menu";

/// Interactive terminal front end: picks a story and runs the frame loop
/// that drives the playback controller.
pub struct PlayerInterface {
    story_loader: StoryLoader,
    theme_manager: ThemeManager,
    config: PlayerConfig,
}

enum MenuOutcome {
    Resume,
    Quit,
}

impl PlayerInterface {
    pub fn new(config: PlayerConfig) -> PlayerResult<Self> {
        info!("Initializing player interface");
        config.validate()?;

        let mut theme_manager = ThemeManager::new();
        if !theme_manager.set_theme(&config.ui.theme) {
            warn!("Unknown theme '{}', using default", config.ui.theme);
        }

        Ok(Self {
            story_loader: StoryLoader::new(config.get_stories_dir()),
            theme_manager,
            config,
        })
    }

    pub async fn run(&mut self) -> PlayerResult<()> {
        info!("Starting player interface");

        loop {
            match self.show_main_menu().await {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    error!("Main menu error: {}", e);
                    println!("{}", self.theme_manager.apply_style(&format!("❌ {}", e), "error"));
                }
            }
        }

        println!("{}", self.theme_manager.apply_style("Goodbye.", "info"));
        Ok(())
    }

    /// Returns `false` once the user chooses to exit.
    pub async fn show_main_menu(&mut self) -> PlayerResult<bool> {
        let title = format!("ink-player v{}", crate::VERSION);
        println!("{}", self.theme_manager.apply_style(&title, "title"));

        let choices = vec!["📚 Play a Story", "🎨 Change Theme", "🚪 Exit"];
        let selection = Select::new()
            .with_prompt("What would you like to do?")
            .items(&choices)
            .default(0)
            .interact()
            .map_err(|e| PlayerError::configuration(format!("Menu selection error: {}", e)))?;

        match selection {
            0 => self.story_menu().await?,
            1 => self.change_theme()?,
            _ => return Ok(false),
        }

        Ok(true)
    }

    async fn story_menu(&mut self) -> PlayerResult<()> {
        let stories = self.story_loader.list_available_stories().await?;

        if stories.is_empty() {
            let message = format!("⚠️ No stories found in {:?}", self.config.get_stories_dir());
            println!("{}", self.theme_manager.apply_style(&message, "warning"));
            return Ok(());
        }

        let labels: Vec<String> = stories
            .iter()
            .map(|story| format!("{} - {}", story.display_name(), story.description))
            .collect();

        let selection = Select::new()
            .with_prompt("Choose a story")
            .items(&labels)
            .interact()
            .map_err(|e| PlayerError::story(format!("Story selection error: {}", e)))?;

        let story_id = stories[selection].id.clone();
        self.play_story(&story_id).await
    }

    fn change_theme(&mut self) -> PlayerResult<()> {
        let themes = self.theme_manager.list_themes();

        let selection = Select::new()
            .with_prompt("Choose theme")
            .items(&themes)
            .interact()
            .map_err(|e| PlayerError::configuration(format!("Theme selection error: {}", e)))?;

        let selected = &themes[selection];
        if self.theme_manager.set_theme(selected) {
            self.config.ui.theme = selected.clone();
            info!("Theme changed to '{}'", selected);
        }
        Ok(())
    }

    /// Loads `story_id` and plays it until the credits or until the user quits.
    pub async fn play_story(&mut self, story_id: &str) -> PlayerResult<()> {
        if !self.story_loader.story_exists(story_id) {
            return Err(PlayerError::story(format!(
                "No story '{}' in {:?}",
                story_id,
                self.config.get_stories_dir()
            )));
        }
        let script = self.story_loader.load_script(story_id).await?;
        let title = script.title.clone();
        let story = ScriptedStory::new(script)?;

        let surface = TerminalSurface::new(self.theme_manager.clone(), self.config.ui.text_width)
            .with_background(self.config.ui.background.clone());
        surface.clear();
        surface.show_message(&title, "title");

        let mut controller = PlaybackController::new(
            StorySession::new(title, story),
            surface,
            self.config.pacing.clone(),
        );

        let outcome = self.frame_loop(&mut controller).await;
        controller.dispose();

        match controller.events().export_events() {
            Ok(trail) => debug!("Playback events for '{}': {}", story_id, trail),
            Err(e) => warn!("Could not export playback events: {}", e),
        }
        outcome
    }

    async fn frame_loop(&self, controller: &mut TerminalController) -> PlayerResult<()> {
        let mut ticker = interval(self.config.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        controller.show()?;
        let mut last_frame = Instant::now();

        while !controller.is_complete() {
            ticker.tick().await;
            let now = Instant::now();
            controller.update(now.duration_since(last_frame))?;
            last_frame = now;

            if controller.surface_mut().take_screen_request() == Some(Screen::Menu) {
                match self.in_game_menu()? {
                    MenuOutcome::Resume => controller.show()?,
                    MenuOutcome::Quit => return Ok(()),
                }
                last_frame = Instant::now();
                continue;
            }

            if controller.state() == PlaybackState::AwaitingChoice {
                if let Some(choices) = controller.current_choices().cloned() {
                    match self.prompt_choice(&choices)? {
                        Some(index) => controller.select_choice(index)?,
                        None => controller.request_menu()?,
                    }
                }
                // Time spent at the prompt is not playback time.
                last_frame = Instant::now();
            }
        }

        info!(
            "Story finished after {:?} of playback, {} rows written",
            controller.now(),
            controller.surface().rows_written()
        );
        Ok(())
    }

    /// `None` means the menu entry was picked.
    fn prompt_choice(&self, choices: &ChoiceSet) -> PlayerResult<Option<usize>> {
        let mut items: Vec<&str> = choices.iter().collect();
        items.push(MENU_ENTRY);

        let selection = Select::new()
            .with_prompt(self.theme_manager.apply_style("What do you choose?", "choice"))
            .items(&items)
            .default(0)
            .interact()
            .map_err(|e| PlayerError::configuration(format!("Choice selection error: {}", e)))?;

        Ok(choice_from_selection(selection, choices))
    }

    fn in_game_menu(&self) -> PlayerResult<MenuOutcome> {
        let items = ["▶ Resume", "🚪 Quit to main menu"];

        let selection = Select::new()
            .with_prompt("Paused")
            .items(&items)
            .default(0)
            .interact()
            .map_err(|e| PlayerError::configuration(format!("Menu selection error: {}", e)))?;

        if selection == 0 {
            return Ok(MenuOutcome::Resume);
        }

        let confirmed = Confirm::new()
            .with_prompt("Quit this story? Progress will be lost")
            .default(false)
            .interact()
            .map_err(|e| PlayerError::configuration(format!("Quit confirmation error: {}", e)))?;

        Ok(if confirmed { MenuOutcome::Quit } else { MenuOutcome::Resume })
    }
}

fn choice_from_selection(selection: usize, choices: &ChoiceSet) -> Option<usize> {
    choices.contains_index(selection).then_some(selection)
}
