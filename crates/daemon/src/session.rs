//! Ties the state machine, the per-job context, and the process-wide
//! resources together for one Director connection (§4.6, §5).

use std::sync::Arc;
use std::time::Duration;

use fd_core::job::JobType;
use fd_core::session::SessionContext;
use platform::process_locks::ProcessLocks;

use crate::state::{SessionEvent, SessionState};

/// The fixed sleep duration after an authentication failure (§4.6), run
/// under the process-wide throttle mutex so a flood of bad credentials
/// cannot fan out into unbounded parallel sleeps.
pub const AUTH_FAILURE_SLEEP: Duration = Duration::from_secs(6);

/// Constructs [`JobSession`]s that all share one process-wide
/// [`ProcessLocks`] instance, matching the §5 supplement: the locks are
/// owned by a single struct built once at daemon startup, and every
/// session holds a reference rather than re-creating or owning them.
#[derive(Clone)]
pub struct JobSessionFactory {
    process_locks: Arc<ProcessLocks>,
}

impl JobSessionFactory {
    /// Creates a factory over an existing process-wide locks instance,
    /// normally constructed once in the daemon binary's `main`.
    #[must_use]
    pub fn new(process_locks: Arc<ProcessLocks>) -> Self {
        Self { process_locks }
    }

    /// Starts a new session in [`SessionState::AwaitingHello`], with no
    /// job context yet (one is created once `JobId=` arrives).
    #[must_use]
    pub fn start_session(&self) -> JobSession {
        JobSession {
            state: SessionState::AwaitingHello,
            context: None,
            process_locks: Arc::clone(&self.process_locks),
        }
    }
}

/// One Director connection's live state: its position in the state
/// machine, and the job context once one has been allocated.
pub struct JobSession {
    state: SessionState,
    context: Option<SessionContext>,
    process_locks: Arc<ProcessLocks>,
}

impl JobSession {
    /// The current state machine position.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The active job context, if a job has been allocated.
    #[must_use]
    pub fn context(&self) -> Option<&SessionContext> {
        self.context.as_ref()
    }

    /// A mutable handle to the active job context, for accumulating
    /// `level=`/fileset/accurate parameters as the Director sends them.
    pub fn context_mut(&mut self) -> Option<&mut SessionContext> {
        self.context.as_mut()
    }

    /// Applies a greeting, auth result, or any event that does not
    /// allocate a job context.
    pub fn apply(&mut self, event: SessionEvent) {
        if matches!(event, SessionEvent::AuthResult(false)) {
            self.process_locks.throttle_auth_failure(AUTH_FAILURE_SLEEP);
        }
        self.state = self.state.apply(event);
    }

    /// Applies `JobId=`, allocating the job context the rest of the
    /// session will accumulate parameters into.
    pub fn open_job(&mut self, job_id: u32, job_name: String, job_type: JobType) {
        self.context = Some(SessionContext::new(job_id, job_name, job_type));
        self.state = self.state.apply(SessionEvent::JobId);
    }

    /// Applies a completion or cancel event and clears the job context,
    /// returning to [`SessionState::Ready`].
    pub fn close_job(&mut self, event: SessionEvent) {
        debug_assert!(matches!(event, SessionEvent::Completion | SessionEvent::Cancel));
        self.state = self.state.apply(event);
        self.context = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> JobSessionFactory {
        JobSessionFactory::new(Arc::new(ProcessLocks::new()))
    }

    #[test]
    fn opening_a_job_allocates_context_and_advances_state() {
        let mut session = factory().start_session();
        session.apply(SessionEvent::Greeting(true));
        session.apply(SessionEvent::AuthResult(true));
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.context().is_none());

        session.open_job(7, "nightly".to_string(), JobType::Backup);
        assert_eq!(session.state(), SessionState::HaveJob);
        assert_eq!(session.context().unwrap().job_id, 7);
    }

    #[test]
    fn closing_a_job_clears_context_and_returns_to_ready() {
        let mut session = factory().start_session();
        session.apply(SessionEvent::Greeting(true));
        session.apply(SessionEvent::AuthResult(true));
        session.open_job(1, "job".to_string(), JobType::Restore);
        session.close_job(SessionEvent::Completion);
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.context().is_none());
    }

    #[test]
    fn auth_failure_sleeps_under_the_process_wide_throttle() {
        let mut session = factory().start_session();
        session.apply(SessionEvent::Greeting(true));
        let start = std::time::Instant::now();
        let locks = Arc::new(ProcessLocks::new());
        locks.throttle_auth_failure(Duration::from_millis(5));
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
