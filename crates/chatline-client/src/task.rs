use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::cancel::AbortHandle;
use crate::client::ChatClient;
use crate::errors::ChatError;
use crate::payload::ChatRequest;
use crate::stream::StreamResult;

/// Owned handle to a streaming call running on its own task.
///
/// Read chunks with [`next_chunk`](Self::next_chunk), then call
/// [`finish`](Self::finish) for the terminal result. Dropping the handle
/// cancels the call, even one still waiting for its first byte.
pub struct StreamTask {
    id: uuid::Uuid,
    rx: mpsc::UnboundedReceiver<String>,
    final_rx: oneshot::Receiver<Result<StreamResult, ChatError>>,
    abort_handle: AbortHandle,
}

impl ChatClient {
    /// Starts `stream_text` on a new tokio task and returns its handle.
    pub fn spawn_stream(&self, request: ChatRequest) -> StreamTask {
        let id = uuid::Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        let (final_tx, final_rx) = oneshot::channel();
        let abort_handle = AbortHandle::new();
        let signal = abort_handle.signal();
        let on_closed = abort_handle.clone();
        let reader = tx.clone();
        let client = self.clone();

        tokio::spawn(async move {
            let call = client.stream_text(
                &request,
                |chunk| {
                    if tx.send(chunk).is_err() {
                        debug!(task_id = %id, "stream reader dropped; cancelling");
                        on_closed.abort();
                    }
                },
                Some(&signal),
            );
            // An idle request never hits a failed send; watch the reader too.
            let result = tokio::select! {
                result = call => result,
                () = reader.closed() => {
                    debug!(task_id = %id, "stream reader dropped while idle; cancelling");
                    on_closed.abort();
                    Err(ChatError::Cancelled)
                }
            };
            let _ = final_tx.send(result);
        });

        StreamTask {
            id,
            rx,
            final_rx,
            abort_handle,
        }
    }
}

impl StreamTask {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    /// Returns a handle that can cancel this call from elsewhere.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    pub fn abort(&self) {
        self.abort_handle.abort();
    }

    /// Waits for the next text chunk. Returns `None` once the call ended.
    pub async fn next_chunk(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Waits for the terminal result. Unread chunks are discarded.
    pub async fn finish(self) -> Result<StreamResult, ChatError> {
        let Self {
            id,
            rx: _reader,
            final_rx,
            ..
        } = self;
        match final_rx.await {
            Ok(result) => result,
            Err(_) => Err(ChatError::Protocol(format!(
                "stream task {id} ended without a result"
            ))),
        }
    }

    /// Drains every remaining chunk, then returns the joined text with the
    /// terminal result.
    pub async fn collect(mut self) -> Result<(String, StreamResult), ChatError> {
        let mut text = String::new();
        while let Some(chunk) = self.rx.recv().await {
            text.push_str(&chunk);
        }
        let result = self.finish().await?;
        Ok((text, result))
    }
}
