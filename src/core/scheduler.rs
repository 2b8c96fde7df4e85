use std::collections::HashSet;
use std::time::Duration;

use tracing::trace;

use crate::core::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// What to do when a deferred task comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Ask the story engine for the next event once a line has been read.
    AdvanceStory,
    /// Forward the selected choice to the engine and resume it.
    CommitChoice(usize),
    /// Tell the surface the story is over.
    CompleteSession,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub session: SessionId,
    pub due: Duration,
    pub action: DeferredAction,
}

/// A task whose due time has been reached. Revoked tasks are still handed
/// back so callers can account for them, but must not be run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTask {
    pub task: ScheduledTask,
    pub revoked: bool,
}

/// One-shot deferred tasks on a logical clock that only moves when
/// [`TaskScheduler::advance`] is called.
#[derive(Debug, Default)]
pub struct TaskScheduler {
    now: Duration,
    next_id: u64,
    queue: Vec<ScheduledTask>,
    revoked: HashSet<TaskId>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, session: SessionId, delay: Duration, action: DeferredAction) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        let due = self.now.saturating_add(delay);
        trace!("Scheduled {:?} as task {:?} due at {:?}", action, id, due);
        self.queue.push(ScheduledTask {
            id,
            session,
            due,
            action,
        });
        id
    }

    /// Returns `true` if the task was pending and is now revoked.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        if self.queue.iter().any(|task| task.id == id) {
            self.revoked.insert(id)
        } else {
            false
        }
    }

    /// Revokes every pending task of `session`, returning how many were
    /// newly revoked.
    pub fn cancel_session(&mut self, session: SessionId) -> usize {
        let ids: Vec<TaskId> = self
            .queue
            .iter()
            .filter(|task| task.session == session)
            .map(|task| task.id)
            .collect();

        ids.into_iter().filter(|id| self.revoked.insert(*id)).count()
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.queue.iter().any(|task| task.id == id) && !self.revoked.contains(&id)
    }

    pub fn pending(&self) -> usize {
        self.queue
            .iter()
            .filter(|task| !self.revoked.contains(&task.id))
            .count()
    }

    pub fn pending_for(&self, session: SessionId) -> usize {
        self.queue
            .iter()
            .filter(|task| task.session == session && !self.revoked.contains(&task.id))
            .count()
    }

    /// Moves the clock forward and removes every task due by the new time,
    /// ordered by due time and then by scheduling order.
    pub fn advance(&mut self, delta: Duration) -> Vec<DueTask> {
        self.now = self.now.saturating_add(delta);
        let now = self.now;

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.queue.drain(..).partition(|task| task.due <= now);
        self.queue = pending;
        due.sort_by_key(|task| (task.due, task.id));

        due.into_iter()
            .map(|task| {
                let revoked = self.revoked.remove(&task.id);
                DueTask { task, revoked }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn actions(due: &[DueTask]) -> Vec<DeferredAction> {
        due.iter().map(|d| d.task.action).collect()
    }

    #[test]
    fn test_tasks_fire_once_due() {
        let mut scheduler = TaskScheduler::new();
        let session = SessionId::new();
        scheduler.schedule(session, Duration::from_secs(2), DeferredAction::AdvanceStory);

        assert!(scheduler.advance(Duration::from_millis(1999)).is_empty());
        let due = scheduler.advance(Duration::from_millis(1));
        assert_eq!(actions(&due), vec![DeferredAction::AdvanceStory]);
        assert!(!due[0].revoked);
        assert_eq!(scheduler.pending(), 0);
        assert!(scheduler.advance(Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn test_due_tasks_are_ordered() {
        let mut scheduler = TaskScheduler::new();
        let session = SessionId::new();
        scheduler.schedule(session, Duration::from_secs(3), DeferredAction::CompleteSession);
        scheduler.schedule(session, Duration::from_secs(1), DeferredAction::CommitChoice(0));
        scheduler.schedule(session, Duration::from_secs(1), DeferredAction::CommitChoice(1));

        let due = scheduler.advance(Duration::from_secs(5));
        assert_eq!(
            actions(&due),
            vec![
                DeferredAction::CommitChoice(0),
                DeferredAction::CommitChoice(1),
                DeferredAction::CompleteSession,
            ]
        );
    }

    #[test]
    fn test_cancelled_task_is_reported_revoked() {
        let mut scheduler = TaskScheduler::new();
        let session = SessionId::new();
        let id = scheduler.schedule(session, Duration::from_secs(1), DeferredAction::AdvanceStory);

        assert!(scheduler.is_pending(id));
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(!scheduler.is_pending(id));
        assert_eq!(scheduler.pending(), 0);

        let due = scheduler.advance(Duration::from_secs(1));
        assert_eq!(due.len(), 1);
        assert!(due[0].revoked);
        assert!(!scheduler.cancel(id));
    }

    #[test]
    fn test_cancel_session_only_touches_that_session() {
        let mut scheduler = TaskScheduler::new();
        let old = SessionId::new();
        let current = SessionId::new();
        scheduler.schedule(old, Duration::from_secs(1), DeferredAction::AdvanceStory);
        scheduler.schedule(old, Duration::from_secs(2), DeferredAction::CompleteSession);
        scheduler.schedule(current, Duration::from_secs(1), DeferredAction::AdvanceStory);

        assert_eq!(scheduler.cancel_session(old), 2);
        assert_eq!(scheduler.cancel_session(old), 0);
        assert_eq!(scheduler.pending_for(old), 0);
        assert_eq!(scheduler.pending_for(current), 1);

        let due = scheduler.advance(Duration::from_secs(2));
        let live: Vec<_> = due.iter().filter(|d| !d.revoked).map(|d| d.task.session).collect();
        assert_eq!(live, vec![current]);
    }

    #[test]
    fn test_delays_are_relative_to_current_time() {
        let mut scheduler = TaskScheduler::new();
        let session = SessionId::new();
        scheduler.advance(Duration::from_secs(10));
        scheduler.schedule(session, Duration::from_millis(1500), DeferredAction::CommitChoice(1));

        assert_eq!(scheduler.now(), Duration::from_secs(10));
        assert!(scheduler.advance(Duration::from_millis(1499)).is_empty());
        assert_eq!(scheduler.advance(Duration::from_millis(1)).len(), 1);
    }
}
