//! The per-connection session state machine (§4.6).

use std::fmt;

/// One Director connection's position in the session lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SessionState {
    /// Waiting for the Director's initial greeting line.
    AwaitingHello,
    /// Greeting accepted; waiting for the challenge/response exchange.
    AwaitingAuth,
    /// Authenticated; no job assigned yet. Admin commands are served here.
    Ready,
    /// `JobId=` received; accumulating job parameters (`level=`, fileset,
    /// `accurate`) before the Storage-Daemon connection is opened.
    HaveJob,
    /// Connected and authenticated to the Storage Daemon, waiting for the
    /// job-kind command (`backup`/`restore`/`verify`).
    ConnectedSd,
    /// Running the backup walk (§4.4).
    BackingUp,
    /// Running the restore walk (§4.5).
    Restoring,
    /// Running a verify pass.
    Verifying,
    /// The session has ended; no further events are processed.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AwaitingHello => "awaiting_hello",
            Self::AwaitingAuth => "awaiting_auth",
            Self::Ready => "ready",
            Self::HaveJob => "have_job",
            Self::ConnectedSd => "connected_sd",
            Self::BackingUp => "backing_up",
            Self::Restoring => "restoring",
            Self::Verifying => "verifying",
            Self::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// One event observed on the Director channel (or derived from it), as
/// named in the §4.6 transition table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SessionEvent {
    /// The Director's initial greeting line; `true` if it parsed as valid.
    Greeting(bool),
    /// The result of the challenge/response exchange.
    AuthResult(bool),
    /// A stateless admin command (`setdebug`, `setbandwidth`,
    /// `setauthorization`, `resolve`, `status`, `.status`, `sm_dump`).
    /// `cancel` is modeled separately since it can fire mid-job.
    AdminCommand,
    /// `JobId=...` and friends.
    JobId,
    /// `level=...`.
    Level,
    /// One fileset definition line (§4.7).
    FilesetLine,
    /// One `accurate` change-detection entry.
    AccurateEntry,
    /// `storage` — connect to the Storage Daemon.
    Storage,
    /// `backup`.
    Backup,
    /// `restore session` / `restore bootstrap`.
    Restore,
    /// `verify`.
    Verify,
    /// The current job's walk finished, successfully or not.
    Completion,
    /// A `cancel` command for the current job.
    Cancel,
    /// The Director closed its end of the connection.
    DirectorEof,
}

/// A transition the state machine has no rule for, in a state where the
/// fallback is to stay put rather than close (every state has an implicit
/// self-loop on an event it does not recognize, except for
/// [`SessionEvent::DirectorEof`], which always closes the session).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NoOpTransition;

impl SessionState {
    /// Applies one event, returning the resulting state.
    ///
    /// `Director EOF` closes the session from any state (the table's `any`
    /// row). Unrecognized `(state, event)` pairs are self-loops: the state
    /// is returned unchanged, matching a Director that repeats or sends an
    /// out-of-order stateless command the session simply ignores.
    /// [`SessionState::Closed`] is terminal; every event leaves it closed.
    #[must_use]
    pub fn apply(self, event: SessionEvent) -> Self {
        if matches!(event, SessionEvent::DirectorEof) {
            return Self::Closed;
        }
        match (self, event) {
            (Self::Closed, _) => Self::Closed,
            (Self::AwaitingHello, SessionEvent::Greeting(true)) => Self::AwaitingAuth,
            (Self::AwaitingHello, _) => Self::Closed,
            (Self::AwaitingAuth, SessionEvent::AuthResult(true)) => Self::Ready,
            (Self::AwaitingAuth, SessionEvent::AuthResult(false)) => Self::Closed,
            (Self::Ready, SessionEvent::AdminCommand) => Self::Ready,
            (Self::Ready, SessionEvent::JobId) => Self::HaveJob,
            (Self::HaveJob, SessionEvent::Level | SessionEvent::FilesetLine | SessionEvent::AccurateEntry) => {
                Self::HaveJob
            }
            (Self::HaveJob, SessionEvent::Storage) => Self::ConnectedSd,
            (Self::ConnectedSd, SessionEvent::Backup) => Self::BackingUp,
            (Self::ConnectedSd, SessionEvent::Restore) => Self::Restoring,
            (Self::ConnectedSd, SessionEvent::Verify) => Self::Verifying,
            (Self::BackingUp | Self::Restoring | Self::Verifying, SessionEvent::Completion | SessionEvent::Cancel) => {
                Self::Ready
            }
            (other, _) => other,
        }
    }

    /// Whether admin commands other than `status`/`.status` may be served
    /// in this state. Matches the §4.6 restriction that `ready` is the only
    /// state accepting admin commands at all.
    #[must_use]
    pub const fn accepts_admin_commands(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether a `cancel` command is meaningful in this state (there must
    /// be a running job to cancel).
    #[must_use]
    pub const fn is_cancelable(self) -> bool {
        matches!(self, Self::BackingUp | Self::Restoring | Self::Verifying)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_backup_walk() {
        let mut state = SessionState::AwaitingHello;
        state = state.apply(SessionEvent::Greeting(true));
        assert_eq!(state, SessionState::AwaitingAuth);
        state = state.apply(SessionEvent::AuthResult(true));
        assert_eq!(state, SessionState::Ready);
        state = state.apply(SessionEvent::JobId);
        assert_eq!(state, SessionState::HaveJob);
        state = state.apply(SessionEvent::Level);
        state = state.apply(SessionEvent::FilesetLine);
        assert_eq!(state, SessionState::HaveJob);
        state = state.apply(SessionEvent::Storage);
        assert_eq!(state, SessionState::ConnectedSd);
        state = state.apply(SessionEvent::Backup);
        assert_eq!(state, SessionState::BackingUp);
        state = state.apply(SessionEvent::Completion);
        assert_eq!(state, SessionState::Ready);
    }

    #[test]
    fn invalid_greeting_closes_the_session() {
        let state = SessionState::AwaitingHello.apply(SessionEvent::AdminCommand);
        assert_eq!(state, SessionState::Closed);
    }

    #[test]
    fn auth_failure_closes_the_session() {
        let state = SessionState::AwaitingAuth.apply(SessionEvent::AuthResult(false));
        assert_eq!(state, SessionState::Closed);
    }

    #[test]
    fn director_eof_closes_from_any_state() {
        for state in [
            SessionState::AwaitingHello,
            SessionState::Ready,
            SessionState::HaveJob,
            SessionState::BackingUp,
            SessionState::Restoring,
        ] {
            assert_eq!(state.apply(SessionEvent::DirectorEof), SessionState::Closed);
        }
    }

    #[test]
    fn cancel_during_restore_returns_to_ready() {
        let state = SessionState::Restoring.apply(SessionEvent::Cancel);
        assert_eq!(state, SessionState::Ready);
    }

    #[test]
    fn closed_state_is_terminal() {
        let state = SessionState::Closed.apply(SessionEvent::Greeting(true));
        assert_eq!(state, SessionState::Closed);
    }

    #[test]
    fn unrecognized_event_in_ready_is_a_self_loop() {
        let state = SessionState::Ready.apply(SessionEvent::Backup);
        assert_eq!(state, SessionState::Ready);
    }

    #[test]
    fn admin_commands_are_only_accepted_while_ready() {
        assert!(SessionState::Ready.accepts_admin_commands());
        assert!(!SessionState::HaveJob.accepts_admin_commands());
        assert!(!SessionState::BackingUp.accepts_admin_commands());
    }

    #[test]
    fn cancel_is_only_meaningful_during_a_running_job() {
        assert!(SessionState::BackingUp.is_cancelable());
        assert!(!SessionState::Ready.is_cancelable());
    }
}
