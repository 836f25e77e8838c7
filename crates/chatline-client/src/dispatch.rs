use futures::StreamExt as _;
use tracing::{debug, trace, warn};

use crate::cancel::{self, AbortSignal};
use crate::client::{ChatClient, read_body};
use crate::config::Endpoint;
use crate::decoder::decode_frame;
use crate::errors::{ChatError, error_message_from_body};
use crate::framer::LineFramer;
use crate::payload::ChatRequest;
use crate::stream::{StreamEvent, StreamResult};
use crate::transport::{ByteStream, ResponseBody, ResponseMode};

const STREAM_FAILED: &str = "failed to stream";

impl ChatClient {
    /// Streams a reply, calling `on_chunk` once per text fragment in arrival
    /// order, and returns the response id once the channel closes.
    ///
    /// When the transport answers without an incremental body, the same
    /// request is replayed against the batch endpoint and its text is
    /// delivered as a single chunk.
    pub async fn stream_text<F>(
        &self,
        request: &ChatRequest,
        mut on_chunk: F,
        signal: Option<&AbortSignal>,
    ) -> Result<StreamResult, ChatError>
    where
        F: FnMut(String) + Send,
    {
        let request_id = uuid::Uuid::new_v4();
        if cancel::is_aborted(signal) {
            debug!(%request_id, "stream cancelled before start");
            return Err(ChatError::Cancelled);
        }
        let body = request.to_json()?;
        debug!(%request_id, has_image = request.image_base64.is_some(), "opening stream");

        let response = cancel::guard(signal, async {
            self.transport()
                .post(Endpoint::ChatStream, body, ResponseMode::Streaming)
                .await
                .map_err(|e| ChatError::transport(e.message(), None))
        })
        .await?;

        let status = response.status;
        if !response.is_success() {
            let bytes = cancel::guard(signal, async {
                Ok(read_body(response.body).await.unwrap_or_default())
            })
            .await?;
            let message =
                error_message_from_body(&bytes).unwrap_or_else(|| STREAM_FAILED.to_string());
            debug!(%request_id, status, %message, "stream rejected");
            return Err(cancel::classify(
                signal,
                ChatError::transport(message, Some(status)),
            ));
        }

        let result = match response.body {
            ResponseBody::Stream(stream) => consume(stream, &mut on_chunk, signal).await,
            ResponseBody::Full(_) => {
                debug!(%request_id, "no incremental body; falling back to batch completion");
                self.replay_as_batch(request, &mut on_chunk, signal).await
            }
        };
        match &result {
            Ok(done) => debug!(%request_id, response_id = ?done.response_id, "stream finished"),
            Err(ChatError::Cancelled) => debug!(%request_id, "stream cancelled"),
            Err(err) => debug!(%request_id, error = %err, "stream failed"),
        }
        result
    }

    async fn replay_as_batch<F>(
        &self,
        request: &ChatRequest,
        on_chunk: &mut F,
        signal: Option<&AbortSignal>,
    ) -> Result<StreamResult, ChatError>
    where
        F: FnMut(String) + Send,
    {
        let reply = self
            .complete_text(request, signal)
            .await
            .map_err(|err| match err {
                ChatError::Server { message, status } => ChatError::Transport { message, status },
                other => other,
            })?;
        if cancel::is_aborted(signal) {
            return Err(ChatError::Cancelled);
        }
        if !reply.response_message.is_empty() {
            on_chunk(reply.response_message);
        }
        Ok(StreamResult {
            response_id: Some(reply.response_id).filter(|id| !id.is_empty()),
        })
    }
}

/// Routes decoded events to the sink and captures the completion marker.
#[derive(Debug, Default)]
struct Dispatcher {
    response_id: Option<String>,
    deltas: u64,
}

impl Dispatcher {
    fn dispatch<F>(
        &mut self,
        frame: &str,
        on_chunk: &mut F,
        signal: Option<&AbortSignal>,
    ) -> Result<(), ChatError>
    where
        F: FnMut(String),
    {
        let Some(event) = decode_frame(frame) else {
            return Ok(());
        };
        if let StreamEvent::Completed { response_id } = event {
            match &self.response_id {
                None => self.response_id = Some(response_id),
                Some(first) => {
                    warn!(%first, ignored = %response_id, "stream carried a second completion marker");
                }
            }
            return Ok(());
        }
        if let Some(text) = event.into_display_text() {
            if cancel::is_aborted(signal) {
                return Err(ChatError::Cancelled);
            }
            trace!(seq = self.deltas, len = text.len(), "text chunk");
            self.deltas = self.deltas.saturating_add(1);
            on_chunk(text);
        }
        Ok(())
    }

    fn finish(self) -> StreamResult {
        StreamResult {
            response_id: self.response_id,
        }
    }
}

async fn consume<F>(
    mut stream: ByteStream,
    on_chunk: &mut F,
    signal: Option<&AbortSignal>,
) -> Result<StreamResult, ChatError>
where
    F: FnMut(String) + Send,
{
    let mut framer = LineFramer::default();
    let mut dispatcher = Dispatcher::default();
    loop {
        let next = match signal {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.aborted() => return Err(ChatError::Cancelled),
                next = stream.next() => next,
            },
            None => stream.next().await,
        };
        match next {
            Some(Ok(chunk)) => {
                for frame in framer.push(&chunk) {
                    dispatcher.dispatch(&frame, on_chunk, signal)?;
                }
            }
            Some(Err(failure)) => {
                return Err(cancel::classify(
                    signal,
                    ChatError::transport(failure.message(), None),
                ));
            }
            None => break,
        }
    }
    if let Some(residual) = framer.finish() {
        trace!("decoding unterminated final frame");
        dispatcher.dispatch(&residual, on_chunk, signal)?;
    }
    Ok(dispatcher.finish())
}
