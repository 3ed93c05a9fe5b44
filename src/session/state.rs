use crate::{sync::Publisher, Error, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Front,
    #[default]
    Back,
}

/// Camera lifecycle. Every variant carries the facing so observers keep it
/// when the session fails.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Setup(Facing),
    PreviewReady(Facing),
    Error(String, Facing),
}

impl SessionState {
    pub fn facing(&self) -> Facing {
        match self {
            SessionState::Setup(facing)
            | SessionState::PreviewReady(facing)
            | SessionState::Error(_, facing) => *facing,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Setup(_) => "setup",
            SessionState::PreviewReady(_) => "preview_ready",
            SessionState::Error(..) => "error",
        }
    }

    pub fn is_preview_ready(&self) -> bool {
        matches!(self, SessionState::PreviewReady(_))
    }
}

/// Transitions only leave `Setup`. Getting out of `Error` or changing the
/// facing means building a new machine.
pub struct SessionMachine {
    state: SessionState,
    publisher: Publisher<SessionState>,
}

impl SessionMachine {
    pub fn new(facing: Facing, publisher: Publisher<SessionState>) -> Result<Self> {
        let state = SessionState::Setup(facing);
        publisher.publish(state.clone())?;
        tracing::debug!(?facing, "session machine in setup");
        Ok(Self { state, publisher })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn facing(&self) -> Facing {
        self.state.facing()
    }

    pub fn publisher(&self) -> &Publisher<SessionState> {
        &self.publisher
    }

    pub fn bind_succeeded(&mut self) -> Result<&SessionState> {
        let facing = self.expect_setup("bind_succeeded")?;
        self.transition(SessionState::PreviewReady(facing))
    }

    pub fn bind_failed(&mut self, message: impl Into<String>) -> Result<&SessionState> {
        let facing = self.expect_setup("bind_failed")?;
        self.transition(SessionState::Error(message.into(), facing))
    }

    pub fn permission_denied(&mut self, message: impl Into<String>) -> Result<&SessionState> {
        let facing = self.expect_setup("permission_denied")?;
        self.transition(SessionState::Error(message.into(), facing))
    }

    fn expect_setup(&self, event: &'static str) -> Result<Facing> {
        match &self.state {
            SessionState::Setup(facing) => Ok(*facing),
            other => Err(Error::TransitionError {
                state: other.name(),
                event,
            }),
        }
    }

    fn transition(&mut self, next: SessionState) -> Result<&SessionState> {
        match &next {
            SessionState::Error(message, facing) => {
                tracing::error!(?facing, "session failed: {}", message)
            }
            other => tracing::info!(facing = ?other.facing(), "session is {}", other.name()),
        }
        self.publisher.publish(next.clone())?;
        self.state = next;
        Ok(&self.state)
    }
}
