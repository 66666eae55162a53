use weave_query::AnswerRequest;

use crate::client::{StreamClient, StreamHandle};
use crate::session::{Session, StreamEvent};

/// One logical query slot with at most one active session.
///
/// Starting a new session aborts the previous one and resets the local
/// display state before the new session's first byte is processed, so a
/// consumer can never show a mixture of old and new output.
#[derive(Default)]
pub struct QuerySlot {
    handle: Option<StreamHandle>,
    session: Session,
}

impl QuerySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede whatever is in flight with a fresh session.
    pub fn start(&mut self, client: &StreamClient, request: &AnswerRequest) {
        if let Some(previous) = self.handle.take() {
            previous.abort();
        }
        self.session.begin();
        self.handle = Some(client.open(request));
    }

    /// Next event from the active session, folded into the session view.
    /// `None` when no session is active or the current one is over.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        let handle = self.handle.as_mut()?;
        let event = handle.next_event().await?;
        self.session.apply(&event);
        Some(event)
    }

    /// Abort the active session, keeping the text streamed so far.
    pub fn abort(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
        self.session.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some() && !self.session.state().is_terminal()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
