use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt as _;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cancel::{self, AbortSignal};
use crate::config::{ClientConfig, Endpoint};
use crate::errors::{ChatError, TransportFailure, error_message_from_body};
use crate::payload::{
    AudioClip, ChatRequest, GeneratedImage, SpeechReply, TextReply, TranscriptionReply,
};
use crate::transport::{HttpTransport, ResponseBody, ResponseMode, Transport};

/// Client for the generation service.
///
/// Cheap to clone; clones share the transport. Every operation accepts an
/// optional [`AbortSignal`] and makes exactly one attempt.
#[derive(Clone)]
pub struct ChatClient {
    transport: Arc<dyn Transport>,
}

impl ChatClient {
    /// Creates a client over HTTP.
    pub fn new(config: ClientConfig) -> Result<Self, ChatError> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(config)?)))
    }

    /// Creates a client using `CHATLINE_*` environment variables.
    pub fn from_env() -> Result<Self, ChatError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Creates a client over a caller-supplied transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Requests a complete, non-streamed text reply.
    pub async fn complete_text(
        &self,
        request: &ChatRequest,
        signal: Option<&AbortSignal>,
    ) -> Result<TextReply, ChatError> {
        let body = request.to_json()?;
        self.post_json(Endpoint::Chat, body, signal).await
    }

    /// Generates an image from a text prompt.
    pub async fn create_image(
        &self,
        prompt: &str,
        signal: Option<&AbortSignal>,
    ) -> Result<GeneratedImage, ChatError> {
        let body = serde_json::json!({ "prompt": prompt });
        self.post_json(Endpoint::CreateImage, body, signal).await
    }

    /// Transcribes recorded audio and returns the text.
    pub async fn transcribe(
        &self,
        audio: &AudioClip,
        signal: Option<&AbortSignal>,
    ) -> Result<String, ChatError> {
        let body = serde_json::json!({ "audioBase64": audio.as_base64() });
        let reply: TranscriptionReply = self.post_json(Endpoint::Transcribe, body, signal).await?;
        Ok(reply.transcribed_message)
    }

    /// Transcribes recorded audio and replies to it in one round trip.
    pub async fn speech_reply(
        &self,
        audio: &AudioClip,
        previous_response_id: Option<&str>,
        signal: Option<&AbortSignal>,
    ) -> Result<SpeechReply, ChatError> {
        let mut body = serde_json::json!({ "audioBase64": audio.as_base64() });
        if let Some(id) = previous_response_id {
            body["previousResponseId"] = serde_json::Value::from(id);
        }
        self.post_json(Endpoint::Speech, body, signal).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: serde_json::Value,
        signal: Option<&AbortSignal>,
    ) -> Result<T, ChatError> {
        cancel::guard(signal, async {
            let response = self
                .transport
                .post(endpoint, body, ResponseMode::Buffered)
                .await
                .map_err(|e| ChatError::transport(e.message(), None))?;
            let status = response.status;
            let success = response.is_success();
            let bytes = read_body(response.body)
                .await
                .map_err(|e| ChatError::transport(e.message(), Some(status)))?;

            if !success {
                let message = error_message_from_body(&bytes)
                    .unwrap_or_else(|| format!("request failed with status {status}"));
                debug!(%endpoint, status, %message, "request rejected");
                return Err(ChatError::server(message, Some(status)));
            }

            serde_json::from_slice(&bytes).map_err(|e| {
                ChatError::Protocol(format!("invalid response from {endpoint}: {e}"))
            })
        })
        .await
    }
}

/// Drains a body into memory, whichever form the transport delivered.
pub(crate) async fn read_body(body: ResponseBody) -> Result<Bytes, TransportFailure> {
    match body {
        ResponseBody::Full(bytes) => Ok(bytes),
        ResponseBody::Stream(mut stream) => {
            let mut buf = Vec::new();
            while let Some(chunk) = stream.next().await {
                buf.extend_from_slice(&chunk?);
            }
            Ok(Bytes::from(buf))
        }
    }
}
