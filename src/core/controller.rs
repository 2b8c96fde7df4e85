use std::collections::HashMap;
use std::mem;
use std::time::Duration;

use crate::config::PacingConfig;
use crate::core::pacing;
use crate::core::{
    DeferredAction, DueTask, EventLogger, PlaybackEvent, PlaybackEventHandler, PlaybackState,
    SessionId, StorySession, TaskId, TaskScheduler,
};
use crate::story::{ChoiceSet, EventQueue, Line, StoryEngine, StoryEvent};
use crate::ui::{PresentationSurface, Screen};
use crate::utils::{PlayerError, PlayerResult};
use tracing::{debug, info, warn};

/// Binds a story session to a presentation surface and owns playback pacing.
///
/// Story events come in through [`handle_event`](Self::handle_event) (or the
/// `on_*` operations), the single user action is
/// [`select_choice`](Self::select_choice), and time only passes through
/// [`update`](Self::update).
pub struct PlaybackController<E: StoryEngine, S: PresentationSurface> {
    session: StorySession<E>,
    surface: S,
    pacing: PacingConfig,
    scheduler: TaskScheduler,
    state: PlaybackState,
    current_line: Option<Line>,
    choices: Option<ChoiceSet>,
    pending_advance: Option<TaskId>,
    pending_commit: Option<TaskId>,
    text_panel_offset: f32,
    paused: bool,
    disposed: bool,
    completed: bool,
    events: EventLogger,
}

impl<E: StoryEngine, S: PresentationSurface> PlaybackController<E, S> {
    pub fn new(session: StorySession<E>, surface: S, pacing: PacingConfig) -> Self {
        info!("Starting playback of '{}' (session {})", session.title(), session.id());

        let mut events = EventLogger::default();
        events.handle_event(&PlaybackEvent::session_started(session.id(), session.title()));

        Self {
            session,
            surface,
            pacing,
            scheduler: TaskScheduler::new(),
            state: PlaybackState::Idle,
            current_line: None,
            choices: None,
            pending_advance: None,
            pending_commit: None,
            text_panel_offset: 0.0,
            paused: false,
            disposed: false,
            completed: false,
            events,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn session(&self) -> &StorySession<E> {
        &self.session
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn current_line(&self) -> Option<&Line> {
        self.current_line.as_ref()
    }

    pub fn current_choices(&self) -> Option<&ChoiceSet> {
        self.choices.as_ref()
    }

    pub fn events(&self) -> &EventLogger {
        &self.events
    }

    /// Logical time elapsed since the controller was created.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// True once the end-of-story delay has elapsed.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    // ---- story events ----

    /// Dispatches one story event to the matching operation.
    pub fn handle_event(&mut self, event: StoryEvent) -> PlayerResult<()> {
        match event {
            StoryEvent::Line(line) => self.on_line(line),
            StoryEvent::Command { name, params } => self.on_command(&name, &params),
            StoryEvent::Choices(choices) => self.on_choices(choices),
            StoryEvent::End => self.on_end(),
        }
    }

    pub fn on_line(&mut self, line: Line) -> PlayerResult<()> {
        self.ensure_live("line")?;

        let accepted = match self.state {
            PlaybackState::Idle | PlaybackState::ChoiceTransition => true,
            PlaybackState::ShowingLine => self.pending_advance.is_none(),
            PlaybackState::AwaitingChoice | PlaybackState::Ended => false,
        };
        if !accepted {
            return Err(PlayerError::protocol_violation(format!(
                "Line '{}' received while {}",
                line.text(),
                self.describe_state()
            )));
        }

        let wait_secs = pacing::line_wait_secs(line.len(), &self.pacing);
        let wait = pacing::line_wait(line.text(), &self.pacing)?;
        debug!("Showing line for {:.2}s: {}", wait_secs, line.text());

        self.surface.show_line(&line);
        self.state = PlaybackState::ShowingLine;
        self.pending_advance = Some(self.scheduler.schedule(
            self.session.id(),
            wait,
            DeferredAction::AdvanceStory,
        ));
        self.events.handle_event(&PlaybackEvent::line_shown(&line, wait_secs));
        self.current_line = Some(line);

        Ok(())
    }

    pub fn on_choices(&mut self, choices: ChoiceSet) -> PlayerResult<()> {
        self.ensure_live("choices")?;

        if self.state != PlaybackState::ShowingLine {
            return Err(PlayerError::protocol_violation(format!(
                "Choices received while {}",
                self.describe_state()
            )));
        }
        if choices.is_empty() {
            return Err(PlayerError::invalid_argument("Choice set is empty"));
        }
        let transition = self.pacing.choice_transition()?;

        if let Some(task) = self.pending_advance.take() {
            if self.scheduler.cancel(task) {
                debug!("Choices arrived before the line finished; advance cancelled");
            }
        }

        self.text_panel_offset = self.surface.show_choices(&choices, transition);
        self.state = PlaybackState::AwaitingChoice;
        self.events.handle_event(&PlaybackEvent::choices_presented(&choices, self.text_panel_offset));
        debug!("Presenting {} choices", choices.len());
        self.choices = Some(choices);

        Ok(())
    }

    pub fn on_end(&mut self) -> PlayerResult<()> {
        self.ensure_live("end")?;

        if self.state.is_terminal() {
            return Err(PlayerError::protocol_violation("Story has already ended"));
        }
        let end_delay = self.pacing.end_delay()?;
        let transition = self.pacing.choice_transition()?;

        for task in [self.pending_advance.take(), self.pending_commit.take()].into_iter().flatten() {
            self.scheduler.cancel(task);
        }

        let previous = self.state;
        if previous == PlaybackState::AwaitingChoice {
            self.surface.hide_choices(self.text_panel_offset, transition);
            self.text_panel_offset = 0.0;
        }
        let line = Line::plain(self.pacing.end_text.clone());
        self.surface.show_line(&line);
        self.current_line = Some(line);
        self.choices = None;
        self.state = PlaybackState::Ended;
        self.scheduler.schedule(self.session.id(), end_delay, DeferredAction::CompleteSession);
        self.events.handle_event(&PlaybackEvent::story_ended(previous));
        info!("Story '{}' reached its end", self.session.title());

        Ok(())
    }

    /// Commands are an extension point; they are logged and never touch state.
    pub fn on_command(&mut self, name: &str, params: &HashMap<String, String>) -> PlayerResult<()> {
        self.ensure_live("command")?;

        debug!("Ignoring command '{}' with {} params", name, params.len());
        self.events.handle_event(&PlaybackEvent::command_received(name, params));
        Ok(())
    }

    // ---- user actions ----

    pub fn select_choice(&mut self, index: usize) -> PlayerResult<()> {
        self.ensure_live("choice selection")?;

        if self.state != PlaybackState::AwaitingChoice {
            return Err(PlayerError::protocol_violation(format!(
                "Choice {} selected while {}",
                index,
                self.describe_state()
            )));
        }

        let choices = self.choices.as_ref().ok_or_else(|| {
            PlayerError::protocol_violation("Awaiting a choice but no choices are recorded")
        })?;
        let label = choices.get(index).map(str::to_string).ok_or_else(|| {
            PlayerError::invalid_argument(format!(
                "Choice index {} out of range (0..{})",
                index,
                choices.len()
            ))
        })?;

        let transition = self.pacing.choice_transition()?;
        self.surface.hide_choices(self.text_panel_offset, transition);
        self.text_panel_offset = 0.0;
        self.choices = None;
        self.state = PlaybackState::ChoiceTransition;
        self.pending_commit = Some(self.scheduler.schedule(
            self.session.id(),
            transition,
            DeferredAction::CommitChoice(index),
        ));
        self.events.handle_event(&PlaybackEvent::choice_selected(index, &label));
        info!("Selected choice {}: {}", index, label);

        Ok(())
    }

    pub fn request_menu(&mut self) -> PlayerResult<()> {
        self.ensure_live("menu request")?;

        self.pause();
        self.surface.navigate(Screen::Menu);
        self.events.handle_event(&PlaybackEvent::menu_requested(self.state));
        Ok(())
    }

    // ---- frame loop and lifecycle ----

    /// Advances logical time by `delta` and runs every task that comes due.
    /// A failing task does not stop the ones after it; the first error is
    /// returned once all have run.
    pub fn update(&mut self, delta: Duration) -> PlayerResult<()> {
        if self.paused {
            return Ok(());
        }

        let mut first_error = None;
        for due in self.scheduler.advance(delta) {
            if let Err(e) = self.run_task(due) {
                warn!("Deferred task failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Starts playback the first time the surface is shown, and resumes the
    /// clock on later shows.
    pub fn show(&mut self) -> PlayerResult<()> {
        self.ensure_live("show")?;

        self.paused = false;
        if self.state != PlaybackState::Idle {
            return Ok(());
        }

        if self.session.engine().has_choices() {
            warn!("Session '{}' resumed at a pending choice; waiting for the engine", self.session.title());
            return Ok(());
        }

        self.drive(|engine, queue| engine.next(queue))
    }

    pub fn hide(&mut self) {
        debug!("Surface hidden while {}", self.state);
    }

    pub fn pause(&mut self) {
        if !self.paused {
            debug!("Playback paused at {:?}", self.scheduler.now());
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            debug!("Playback resumed at {:?}", self.scheduler.now());
        }
        self.paused = false;
    }

    /// Layout is purely a presentation concern.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface.layout(width, height);
    }

    /// Revokes every pending task of the session. Later updates discard
    /// whatever comes due; every other operation is rejected.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        let revoked = self.scheduler.cancel_session(self.session.id());
        self.pending_advance = None;
        self.pending_commit = None;
        self.disposed = true;
        self.events.handle_event(&PlaybackEvent::session_disposed(self.session.id(), revoked));
        info!("Disposed session {} ({} pending tasks revoked)", self.session.id(), revoked);
    }

    /// Swaps in a new session, revoking the old one's tasks, and returns the
    /// old session.
    pub fn replace_session(&mut self, session: StorySession<E>) -> StorySession<E> {
        let revoked = self.scheduler.cancel_session(self.session.id());
        debug!("Replacing session {} ({} pending tasks revoked)", self.session.id(), revoked);

        let previous = mem::replace(&mut self.session, session);
        self.state = PlaybackState::Idle;
        self.current_line = None;
        self.choices = None;
        self.pending_advance = None;
        self.pending_commit = None;
        self.text_panel_offset = 0.0;
        self.paused = false;
        self.disposed = false;
        self.completed = false;
        self.events.handle_event(&PlaybackEvent::session_started(self.session.id(), self.session.title()));
        info!("Now playing '{}' (session {})", self.session.title(), self.session.id());

        previous
    }

    // ---- internals ----

    fn run_task(&mut self, due: DueTask) -> PlayerResult<()> {
        let DueTask { task, revoked } = due;

        if revoked || self.disposed || task.session != self.session.id() {
            self.discard_stale(task.session, task.action);
            return Ok(());
        }

        match task.action {
            DeferredAction::AdvanceStory => {
                if self.pending_advance != Some(task.id) || self.state != PlaybackState::ShowingLine {
                    self.discard_stale(task.session, task.action);
                    return Ok(());
                }
                self.pending_advance = None;
                self.drive(|engine, queue| engine.next(queue))
            }
            DeferredAction::CommitChoice(index) => {
                if self.pending_commit != Some(task.id) || self.state != PlaybackState::ChoiceTransition {
                    self.discard_stale(task.session, task.action);
                    return Ok(());
                }
                self.pending_commit = None;
                self.drive(|engine, queue| {
                    engine.select_choice(index)?;
                    engine.next(queue)
                })
            }
            DeferredAction::CompleteSession => {
                self.completed = true;
                self.surface.navigate(Screen::Credits);
                self.events.handle_event(&PlaybackEvent::session_completed(self.session.id()));
                info!("Session {} complete", self.session.id());
                Ok(())
            }
        }
    }

    /// Runs one engine call, then dispatches what it emitted in order. Events
    /// after a rejected one are still offered; the first error is returned.
    fn drive<F>(&mut self, call: F) -> PlayerResult<()>
    where
        F: FnOnce(&mut E, &mut EventQueue) -> PlayerResult<()>,
    {
        let mut queue = EventQueue::new();
        call(self.session.engine_mut(), &mut queue)?;

        let mut first_error = None;
        for event in queue {
            let kind = event.kind();
            if let Err(e) = self.handle_event(event) {
                warn!("Rejected {} event from the story: {}", kind, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn discard_stale(&mut self, session: SessionId, action: DeferredAction) {
        debug!("Discarding stale {:?} for session {}", action, session);
        self.events.handle_event(&PlaybackEvent::stale_task_discarded(session, &format!("{:?}", action)));
    }

    fn ensure_live(&self, what: &str) -> PlayerResult<()> {
        if self.disposed {
            return Err(PlayerError::protocol_violation(format!(
                "{} received after the session was disposed",
                what
            )));
        }
        Ok(())
    }

    fn describe_state(&self) -> String {
        self.state.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlaybackEventType;
    use crate::story::engine::mock::{EngineCall, RecordingEngine};
    use crate::story::{Passage, Script, ScriptedStory};
    use crate::ui::surface::mock::{RecordingSurface, SurfaceCall, CHOICES_OFFSET};
    use pretty_assertions::assert_eq;

    type TestController = PlaybackController<RecordingEngine, RecordingSurface>;

    fn controller(engine: RecordingEngine) -> TestController {
        PlaybackController::new(
            StorySession::new("test story", engine),
            RecordingSurface::default(),
            PacingConfig::default(),
        )
    }

    fn line(text: &str) -> StoryEvent {
        StoryEvent::Line(Line::plain(text))
    }

    fn choices(labels: &[&str]) -> StoryEvent {
        StoryEvent::Choices(ChoiceSet::new(labels.iter().copied()))
    }

    fn calls(controller: &TestController) -> &[EngineCall] {
        &controller.session().engine().calls
    }

    fn wait_for(text: &str) -> Duration {
        pacing::line_wait(text, &PacingConfig::default()).unwrap()
    }

    /// Drives the controller into `AwaitingChoice` with choices "a" and "b".
    fn awaiting_choice() -> TestController {
        let mut controller = controller(RecordingEngine::new().then(vec![choices(&["a", "b"])]));
        controller.on_line(Line::plain("hi")).unwrap();
        controller.update(wait_for("hi")).unwrap();
        assert_eq!(controller.state(), PlaybackState::AwaitingChoice);
        controller
    }

    #[test]
    fn test_new_controller_is_idle() {
        let controller = controller(RecordingEngine::new());

        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(controller.pending_tasks(), 0);
        assert!(!controller.is_complete());
        assert_eq!(controller.events().get_event_count_by_type(&PlaybackEventType::SessionStarted), 1);
    }

    #[test]
    fn test_line_then_choice_sequence() {
        let mut controller = controller(RecordingEngine::new().then(vec![choices(&["a", "b"])]));

        controller.on_line(Line::plain("hi")).unwrap();
        assert_eq!(controller.state(), PlaybackState::ShowingLine);
        assert!(calls(&controller).is_empty());

        let wait = wait_for("hi");
        controller.update(wait - Duration::from_millis(1)).unwrap();
        assert!(calls(&controller).is_empty());

        controller.update(Duration::from_millis(1)).unwrap();
        assert_eq!(calls(&controller), &[EngineCall::Next]);
        assert_eq!(controller.state(), PlaybackState::AwaitingChoice);
        assert_eq!(controller.current_choices(), Some(&ChoiceSet::new(["a", "b"])));

        controller.select_choice(1).unwrap();
        assert_eq!(controller.state(), PlaybackState::ChoiceTransition);
        assert_eq!(controller.current_choices(), None);

        controller.update(Duration::from_millis(1499)).unwrap();
        assert_eq!(calls(&controller), &[EngineCall::Next]);

        controller.update(Duration::from_millis(1)).unwrap();
        assert_eq!(
            calls(&controller),
            &[EngineCall::Next, EngineCall::SelectChoice(1), EngineCall::Next]
        );
        assert_eq!(controller.session().engine().next_count(), 2);
    }

    #[test]
    fn test_choice_transition_returns_to_showing_line() {
        let mut controller = awaiting_choice();
        controller.session.engine_mut().batches.push_back(vec![line("You chose b.")]);

        controller.select_choice(1).unwrap();
        controller.update(Duration::from_millis(1500)).unwrap();

        assert_eq!(controller.state(), PlaybackState::ShowingLine);
        assert_eq!(controller.current_line().map(Line::text), Some("You chose b."));
    }

    #[test]
    fn test_select_choice_outside_awaiting_choice_is_protocol_violation() {
        let mut idle = controller(RecordingEngine::new());
        let mut showing = controller(RecordingEngine::new());
        showing.on_line(Line::plain("hello")).unwrap();
        let mut transitioning = awaiting_choice();
        transitioning.select_choice(0).unwrap();
        let mut ended = controller(RecordingEngine::new());
        ended.on_end().unwrap();

        for controller in [&mut idle, &mut showing, &mut transitioning, &mut ended] {
            let before = controller.state();
            for index in 0..4 {
                let err = controller.select_choice(index).unwrap_err();
                assert!(err.is_protocol_violation(), "{} in {}", index, before);
            }
            assert_eq!(controller.state(), before);
        }
    }

    #[test]
    fn test_select_choice_out_of_range_is_invalid_argument() {
        let mut controller = awaiting_choice();

        for index in [2, 3, usize::MAX] {
            assert!(controller.select_choice(index).unwrap_err().is_invalid_argument());
        }
        assert_eq!(controller.state(), PlaybackState::AwaitingChoice);
        assert_eq!(controller.pending_tasks(), 0);

        assert!(controller.select_choice(0).is_ok());
    }

    #[test]
    fn test_choice_panel_offset_is_reversed() {
        let mut controller = awaiting_choice();
        controller.select_choice(0).unwrap();

        let surface_calls = &controller.surface().calls;
        assert_eq!(
            &surface_calls[1..],
            &[
                SurfaceCall::ShowChoices(vec!["a".to_string(), "b".to_string()]),
                SurfaceCall::HideChoices(CHOICES_OFFSET),
            ]
        );
    }

    #[test]
    fn test_nothing_accepted_after_end() {
        let mut controller = controller(RecordingEngine::new());
        controller.on_line(Line::plain("last words")).unwrap();
        controller.on_end().unwrap();
        assert_eq!(controller.state(), PlaybackState::Ended);
        assert_eq!(controller.surface().lines(), vec!["last words", "THE END"]);

        assert!(controller.on_line(Line::plain("more")).unwrap_err().is_protocol_violation());
        assert!(controller.on_choices(ChoiceSet::new(["x"])).unwrap_err().is_protocol_violation());
        assert!(controller.select_choice(0).unwrap_err().is_protocol_violation());
        assert!(controller.on_end().unwrap_err().is_protocol_violation());
        assert_eq!(controller.state(), PlaybackState::Ended);

        controller.update(Duration::from_secs(10)).unwrap();
        assert_eq!(controller.state(), PlaybackState::Ended);
        assert!(calls(&controller).is_empty());
    }

    #[test]
    fn test_end_while_awaiting_choice_dismisses_choices() {
        let mut controller = awaiting_choice();
        controller.on_end().unwrap();

        assert_eq!(controller.state(), PlaybackState::Ended);
        assert_eq!(controller.current_choices(), None);
        assert_eq!(
            &controller.surface().calls[2..],
            &[
                SurfaceCall::HideChoices(CHOICES_OFFSET),
                SurfaceCall::ShowLine("THE END".to_string()),
            ]
        );
        assert!(controller.select_choice(0).unwrap_err().is_protocol_violation());

        controller.update(Duration::from_secs(5)).unwrap();
        assert_eq!(calls(&controller), &[EngineCall::Next]);
        assert!(controller.is_complete());
    }

    #[test]
    fn test_end_during_choice_transition_revokes_commit() {
        let mut controller = awaiting_choice();
        controller.select_choice(1).unwrap();
        controller.on_end().unwrap();
        assert_eq!(controller.pending_tasks(), 1);

        controller.update(Duration::from_millis(1500)).unwrap();
        assert_eq!(calls(&controller), &[EngineCall::Next]);
        assert_eq!(controller.state(), PlaybackState::Ended);
        assert_eq!(
            controller.events().get_event_count_by_type(&PlaybackEventType::StaleTaskDiscarded),
            1
        );

        controller.update(Duration::from_millis(3500)).unwrap();
        assert_eq!(calls(&controller), &[EngineCall::Next]);
        assert!(controller.is_complete());
    }

    #[test]
    fn test_failing_task_does_not_drop_later_tasks() {
        let mut controller = controller(RecordingEngine::new().then(vec![line("one"), line("two")]));
        controller.on_line(Line::plain("hi")).unwrap();
        let session = controller.session().id();
        controller
            .scheduler
            .schedule(session, wait_for("hi"), DeferredAction::CompleteSession);

        let error = controller.update(wait_for("hi")).unwrap_err();
        assert!(error.is_protocol_violation());

        assert!(controller.is_complete());
        assert_eq!(controller.surface().calls.last(), Some(&SurfaceCall::Navigate(Screen::Credits)));
        assert_eq!(controller.current_line().map(Line::text), Some("one"));
        assert_eq!(controller.state(), PlaybackState::ShowingLine);
        assert_eq!(controller.pending_tasks(), 1);
    }

    #[test]
    fn test_out_of_range_pacing_is_rejected_without_panicking() {
        let huge_base = PacingConfig {
            base_wait_secs: 1e20,
            ..PacingConfig::default()
        };
        let mut controller = PlaybackController::new(
            StorySession::new("slow", RecordingEngine::new()),
            RecordingSurface::default(),
            huge_base,
        );
        assert!(controller.on_line(Line::plain("hi")).is_err());
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(controller.surface().calls.is_empty());

        let huge_end = PacingConfig {
            end_delay_secs: 1e20,
            ..PacingConfig::default()
        };
        let mut controller = PlaybackController::new(
            StorySession::new("slow", RecordingEngine::new()),
            RecordingSurface::default(),
            huge_end,
        );
        controller.on_line(Line::plain("hi")).unwrap();
        assert!(controller.on_end().is_err());
        assert_eq!(controller.state(), PlaybackState::ShowingLine);
        assert_eq!(controller.pending_tasks(), 1);
    }

    #[test]
    fn test_session_completes_after_end_delay() {
        let mut controller = controller(RecordingEngine::new());
        controller.on_end().unwrap();

        controller.update(Duration::from_millis(4999)).unwrap();
        assert!(!controller.is_complete());

        controller.update(Duration::from_millis(1)).unwrap();
        assert!(controller.is_complete());
        assert_eq!(
            controller.surface().calls.last(),
            Some(&SurfaceCall::Navigate(Screen::Credits))
        );
    }

    #[test]
    fn test_dispose_cancels_pending_tasks() {
        let mut controller = controller(RecordingEngine::new().then(vec![line("never")]));
        controller.on_line(Line::plain("hi")).unwrap();
        assert_eq!(controller.pending_tasks(), 1);

        controller.dispose();
        assert!(controller.is_disposed());
        assert_eq!(controller.pending_tasks(), 0);

        controller.update(Duration::from_secs(60)).unwrap();
        assert!(calls(&controller).is_empty());
        assert_eq!(
            controller.events().get_event_count_by_type(&PlaybackEventType::StaleTaskDiscarded),
            1
        );

        assert!(controller.on_line(Line::plain("late")).unwrap_err().is_protocol_violation());
        assert!(controller.show().unwrap_err().is_protocol_violation());
    }

    #[test]
    fn test_choices_cancel_pending_line_advance() {
        let mut controller = controller(RecordingEngine::new());
        controller.on_line(Line::plain("a long line that is still on screen")).unwrap();

        controller.on_choices(ChoiceSet::new(["stay", "go"])).unwrap();
        assert_eq!(controller.state(), PlaybackState::AwaitingChoice);

        controller.update(Duration::from_secs(60)).unwrap();
        assert!(calls(&controller).is_empty());
        assert_eq!(controller.state(), PlaybackState::AwaitingChoice);
    }

    #[test]
    fn test_choices_must_follow_a_line() {
        let mut controller = controller(RecordingEngine::new());
        assert!(controller.on_choices(ChoiceSet::new(["a"])).unwrap_err().is_protocol_violation());

        controller.on_line(Line::plain("hi")).unwrap();
        let empty = ChoiceSet::new(Vec::<String>::new());
        assert!(controller.on_choices(empty).unwrap_err().is_invalid_argument());
        assert_eq!(controller.state(), PlaybackState::ShowingLine);
    }

    #[test]
    fn test_line_while_previous_line_pending_is_rejected() {
        let mut controller = controller(RecordingEngine::new());
        controller.on_line(Line::plain("first")).unwrap();

        let err = controller.on_line(Line::plain("second")).unwrap_err();
        assert!(err.is_protocol_violation());
        assert_eq!(controller.current_line().map(Line::text), Some("first"));
    }

    #[test]
    fn test_consecutive_lines_follow_the_timer() {
        let engine = RecordingEngine::new()
            .then(vec![line("second")])
            .then(vec![StoryEvent::End]);
        let mut controller = controller(engine);

        controller.on_line(Line::plain("first")).unwrap();
        controller.update(wait_for("first")).unwrap();
        assert_eq!(controller.state(), PlaybackState::ShowingLine);
        assert_eq!(controller.current_line().map(Line::text), Some("second"));

        controller.update(wait_for("second")).unwrap();
        assert_eq!(controller.state(), PlaybackState::Ended);
        assert_eq!(controller.session().engine().next_count(), 2);
    }

    #[test]
    fn test_commands_do_not_change_state() {
        let mut controller = awaiting_choice();
        let params = HashMap::from([("image".to_string(), "forest.png".to_string())]);

        controller
            .handle_event(StoryEvent::Command { name: "background".to_string(), params })
            .unwrap();

        assert_eq!(controller.state(), PlaybackState::AwaitingChoice);
        let recorded = controller.events().get_events_by_type(&PlaybackEventType::CommandReceived);
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].data["params"]["image"], "forest.png");
    }

    #[test]
    fn test_show_starts_story_only_when_idle_without_choices() {
        let mut controller = controller(RecordingEngine::new().then(vec![line("opening")]));
        controller.show().unwrap();
        assert_eq!(controller.state(), PlaybackState::ShowingLine);

        controller.show().unwrap();
        assert_eq!(controller.session().engine().next_count(), 1);

        let mut engine = RecordingEngine::new();
        engine.pending_choices = true;
        let mut restored = self::controller(engine);
        restored.show().unwrap();
        assert!(calls(&restored).is_empty());
        assert_eq!(restored.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_pause_freezes_the_clock() {
        let mut controller = controller(RecordingEngine::new());
        controller.on_line(Line::plain("hi")).unwrap();

        controller.pause();
        controller.update(Duration::from_secs(60)).unwrap();
        assert!(calls(&controller).is_empty());
        assert_eq!(controller.now(), Duration::ZERO);

        controller.resume();
        controller.update(wait_for("hi")).unwrap();
        assert_eq!(calls(&controller), &[EngineCall::Next]);
    }

    #[test]
    fn test_menu_request_pauses_and_navigates() {
        let mut controller = controller(RecordingEngine::new());
        controller.on_line(Line::plain("hi")).unwrap();

        controller.request_menu().unwrap();
        assert!(controller.is_paused());
        assert_eq!(controller.surface().calls.last(), Some(&SurfaceCall::Navigate(Screen::Menu)));

        controller.show().unwrap();
        assert!(!controller.is_paused());
        assert_eq!(controller.state(), PlaybackState::ShowingLine);
    }

    #[test]
    fn test_resize_and_hide_leave_state_alone() {
        let mut controller = awaiting_choice();
        controller.resize(800, 600);
        controller.hide();

        assert_eq!(controller.state(), PlaybackState::AwaitingChoice);
        assert_eq!(controller.surface().calls.last(), Some(&SurfaceCall::Layout(800, 600)));
    }

    #[test]
    fn test_replaced_session_tasks_are_discarded() {
        let mut controller = controller(RecordingEngine::new().then(vec![line("stale")]));
        controller.on_line(Line::plain("hi")).unwrap();

        let old = controller.replace_session(StorySession::new("next story", RecordingEngine::new()));
        assert_eq!(controller.state(), PlaybackState::Idle);

        controller.update(Duration::from_secs(60)).unwrap();
        assert!(calls(&controller).is_empty());
        assert_eq!(old.engine().next_count(), 0);
        assert_eq!(
            controller.events().get_event_count_by_type(&PlaybackEventType::StaleTaskDiscarded),
            1
        );
    }

    #[test]
    fn test_engine_errors_surface_from_update() {
        let mut script = Script::new("tiny", "Tiny", "only");
        script.add_passage(Passage::new("only").with_line("One line."));
        let story = ScriptedStory::new(script).unwrap();
        let mut controller = PlaybackController::new(
            StorySession::new("tiny", story),
            RecordingSurface::default(),
            PacingConfig::default(),
        );

        controller.show().unwrap();
        controller.update(wait_for("One line.")).unwrap();
        assert_eq!(controller.state(), PlaybackState::Ended);

        // An engine that produces a second line in one step breaks the protocol.
        let mut greedy = self::controller(RecordingEngine::new().then(vec![line("one"), line("two")]));
        assert!(greedy.show().unwrap_err().is_protocol_violation());
    }

    #[test]
    fn test_scripted_story_plays_to_credits() {
        let mut script = Script::new("fork", "The Fork", "road");
        script.add_passage(
            Passage::new("road")
                .with_line("The road forks.")
                .with_choice("Left", "left")
                .with_choice("Right", "right"),
        );
        script.add_passage(Passage::new("left").with_line("Wolves."));
        script.add_passage(Passage::new("right").with_line("Home."));

        let story = ScriptedStory::new(script).unwrap();
        let mut controller = PlaybackController::new(
            StorySession::new("The Fork", story),
            RecordingSurface::default(),
            PacingConfig::default(),
        );

        controller.show().unwrap();
        let frame = Duration::from_millis(100);
        while controller.state() != PlaybackState::AwaitingChoice {
            controller.update(frame).unwrap();
        }
        controller.select_choice(1).unwrap();
        while !controller.is_complete() {
            controller.update(frame).unwrap();
        }

        assert_eq!(controller.surface().lines(), vec!["The road forks.", "Home.", "THE END"]);
        assert_eq!(controller.session().engine().current_passage(), "right");
        assert_eq!(controller.pending_tasks(), 0);
    }
}
