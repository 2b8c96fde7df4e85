use tracing::debug;

use crate::story::{Beat, ChoiceSet, Script, ScriptChoice, StoryEngine, StoryEvent, StoryListener};
use crate::utils::{PlayerError, PlayerResult};

/// Story engine that walks a validated [`Script`].
///
/// Each call to `next()` emits any commands up to and including exactly one
/// line, or the current passage's choices, or the end of the story.
pub struct ScriptedStory {
    script: Script,
    passage_id: String,
    beat: usize,
    pending_choices: Option<Vec<ScriptChoice>>,
    ended: bool,
}

impl ScriptedStory {
    pub fn new(script: Script) -> PlayerResult<Self> {
        if let Err(errors) = script.validate() {
            return Err(PlayerError::story(format!(
                "Script validation failed: {}",
                errors.join("; ")
            )));
        }

        let passage_id = script.start.clone();
        Ok(Self {
            script,
            passage_id,
            beat: 0,
            pending_choices: None,
            ended: false,
        })
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn current_passage(&self) -> &str {
        &self.passage_id
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl StoryEngine for ScriptedStory {
    fn next(&mut self, listener: &mut dyn StoryListener) -> PlayerResult<()> {
        if self.ended {
            return Err(PlayerError::story("Story has already ended"));
        }
        if self.pending_choices.is_some() {
            return Err(PlayerError::protocol_violation(
                "Cannot continue while a choice is pending",
            ));
        }

        // Validation guarantees divert chains end in a beat, choices or an ending.
        loop {
            let passage = self
                .script
                .get_passage(&self.passage_id)
                .ok_or_else(|| PlayerError::passage_not_found(self.passage_id.clone()))?;

            if let Some(beat) = passage.beats.get(self.beat) {
                self.beat += 1;
                match beat {
                    Beat::Command { command, params } => {
                        debug!("Command '{}' in passage '{}'", command, passage.id);
                        listener.on_event(StoryEvent::Command {
                            name: command.clone(),
                            params: params.clone(),
                        });
                        continue;
                    }
                    Beat::Line { .. } => {
                        if let Some(line) = beat.to_line() {
                            listener.on_event(StoryEvent::Line(line));
                        }
                        return Ok(());
                    }
                }
            }

            if !passage.choices.is_empty() {
                let labels = passage.choices.iter().map(|c| c.text.clone());
                let choices = ChoiceSet::new(labels);
                self.pending_choices = Some(passage.choices.clone());
                listener.on_event(StoryEvent::Choices(choices));
                return Ok(());
            }

            if let Some(divert) = &passage.divert {
                debug!("Diverting from '{}' to '{}'", passage.id, divert);
                self.passage_id = divert.clone();
                self.beat = 0;
                continue;
            }

            self.ended = true;
            listener.on_event(StoryEvent::End);
            return Ok(());
        }
    }

    fn select_choice(&mut self, index: usize) -> PlayerResult<()> {
        let choices = self
            .pending_choices
            .as_ref()
            .ok_or_else(|| PlayerError::protocol_violation("No choices are pending"))?;

        let choice = choices.get(index).ok_or_else(|| {
            PlayerError::invalid_argument(format!(
                "Choice index {} out of range (0..{})",
                index,
                choices.len()
            ))
        })?;

        debug!("Choice {} ('{}') leads to '{}'", index, choice.text, choice.target);
        self.passage_id = choice.target.clone();
        self.beat = 0;
        self.pending_choices = None;
        Ok(())
    }

    fn has_choices(&self) -> bool {
        self.pending_choices.is_some()
    }
}
