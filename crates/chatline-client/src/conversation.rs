use tracing::debug;

use crate::cancel::AbortHandle;
use crate::client::ChatClient;
use crate::errors::ChatError;
use crate::payload::{ChatRequest, ImageAttachment};
use crate::stream::StreamResult;
use crate::task::StreamTask;

/// Caller-owned state for one chat thread.
///
/// Tracks the latest response id and at most one in-flight stream. Starting
/// a new turn cancels the previous one explicitly; there is no shared slot
/// that another task could overwrite.
pub struct Conversation {
    client: ChatClient,
    previous_response_id: Option<String>,
    active: Option<(uuid::Uuid, AbortHandle)>,
}

impl Conversation {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            previous_response_id: None,
            active: None,
        }
    }

    /// Resumes a thread from a persisted response id.
    pub fn resume(client: ChatClient, previous_response_id: impl Into<String>) -> Self {
        Self {
            client,
            previous_response_id: Some(previous_response_id.into()),
            active: None,
        }
    }

    pub fn previous_response_id(&self) -> Option<&str> {
        self.previous_response_id.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    /// Starts a new streamed turn, cancelling the active one if any.
    pub fn start(
        &mut self,
        message: impl Into<String>,
        image: Option<ImageAttachment>,
    ) -> StreamTask {
        self.cancel();
        let mut request = ChatRequest::new(message);
        if let Some(image) = image {
            request = request.image(image);
        }
        request.previous_response_id = self.previous_response_id.clone();

        let task = self.client.spawn_stream(request);
        self.active = Some((task.id(), task.abort_handle()));
        task
    }

    /// Drains `task` and threads its response id into the next turn.
    ///
    /// A task that was superseded by a later `start` still returns its
    /// outcome, but does not move the thread forward.
    pub async fn complete(
        &mut self,
        task: StreamTask,
    ) -> Result<(String, StreamResult), ChatError> {
        let task_id = task.id();
        let outcome = task.collect().await;
        let is_active = self.active.as_ref().is_some_and(|(id, _)| *id == task_id);
        if !is_active {
            debug!(%task_id, "ignoring result of superseded stream");
            return outcome;
        }
        self.active = None;
        if let Ok((_, result)) = &outcome
            && let Some(id) = &result.response_id
        {
            self.previous_response_id = Some(id.clone());
        }
        outcome
    }

    /// Cancels the active turn, if any.
    pub fn cancel(&mut self) {
        if let Some((task_id, handle)) = self.active.take() {
            debug!(%task_id, "cancelling active stream");
            handle.abort();
        }
    }

    /// Cancels any active turn and forgets the thread.
    pub fn reset(&mut self) {
        self.cancel();
        self.previous_response_id = None;
    }
}
