/// Lifecycle events delivered to the consumer of one streaming session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text fragment, in arrival order. The fragment itself, never the
    /// cumulative buffer, so consumers can append incrementally.
    Chunk(String),
    /// Terminal success; fires at most once, after every chunk.
    Completed,
    /// Terminal failure; nothing follows it for the same session.
    Failed(String),
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
    Completed,
    Errored,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Errored | SessionState::Cancelled
        )
    }
}

/// Consumer-side view of one in-flight request: the accumulated answer text,
/// a terminal flag, and an error slot mutually exclusive with success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
    buffer: String,
    error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            buffer: String::new(),
            error: None,
        }
    }

    /// Reset for a fresh request. Clears the buffer and error slot so old
    /// and new session output can never mix.
    pub fn begin(&mut self) {
        self.state = SessionState::Active;
        self.buffer.clear();
        self.error = None;
    }

    /// Fold one event into local display state. Events arriving after a
    /// terminal transition are ignored.
    pub fn apply(&mut self, event: &StreamEvent) {
        if self.state != SessionState::Active {
            log::debug!("event after terminal state {:?} ignored", self.state);
            return;
        }
        match event {
            StreamEvent::Chunk(fragment) => self.buffer.push_str(fragment),
            StreamEvent::Completed => self.state = SessionState::Completed,
            StreamEvent::Failed(message) => {
                self.error = Some(message.clone());
                self.state = SessionState::Errored;
            }
        }
    }

    /// Cooperative cancellation; chunks already shown remain valid.
    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            self.state = SessionState::Cancelled;
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Answer text assembled so far.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chunks_accumulate_in_order() {
        let mut session = Session::new();
        session.begin();
        session.apply(&StreamEvent::Chunk("Hello ".into()));
        session.apply(&StreamEvent::Chunk("world".into()));
        session.apply(&StreamEvent::Completed);
        assert_eq!(session.text(), "Hello world");
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn error_is_terminal_and_keeps_prior_chunks() {
        let mut session = Session::new();
        session.begin();
        session.apply(&StreamEvent::Chunk("partial".into()));
        session.apply(&StreamEvent::Failed("boom".into()));
        session.apply(&StreamEvent::Chunk("late".into()));
        session.apply(&StreamEvent::Completed);
        assert_eq!(session.text(), "partial");
        assert_eq!(session.state(), SessionState::Errored);
        assert_eq!(session.error(), Some("boom"));
    }

    #[test]
    fn begin_resets_everything() {
        let mut session = Session::new();
        session.begin();
        session.apply(&StreamEvent::Chunk("old".into()));
        session.apply(&StreamEvent::Failed("boom".into()));

        session.begin();
        assert_eq!(session.text(), "");
        assert_eq!(session.error(), None);
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn cancel_does_not_override_completion() {
        let mut session = Session::new();
        session.begin();
        session.apply(&StreamEvent::Completed);
        session.cancel();
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn cancel_mid_flight() {
        let mut session = Session::new();
        session.begin();
        session.apply(&StreamEvent::Chunk("so far".into()));
        session.cancel();
        assert_eq!(session.state(), SessionState::Cancelled);
        assert_eq!(session.text(), "so far");
    }
}
