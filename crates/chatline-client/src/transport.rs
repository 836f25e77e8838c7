use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, TryStreamExt as _};
use tracing::debug;

use crate::config::{ClientConfig, Endpoint};
use crate::errors::{ChatError, TransportFailure};

/// Incremental body channel yielded by a streaming response.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportFailure>> + Send + 'static>>;

/// How the caller wants the response body delivered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResponseMode {
    /// Read the whole body before returning.
    Buffered,
    /// Hand back an incremental channel for success responses.
    Streaming,
}

/// Response body as delivered by a transport.
pub enum ResponseBody {
    /// Incremental channel; only produced for successful streaming requests.
    Stream(ByteStream),
    /// Fully buffered body.
    Full(Bytes),
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("ResponseBody::Stream(..)"),
            Self::Full(bytes) => write!(f, "ResponseBody::Full({} bytes)", bytes.len()),
        }
    }
}

/// Status plus body of one response.
#[derive(Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request/response and incremental-read capability used by the client.
///
/// Implementations must not retry. Dropping the returned future or stream
/// must abort the underlying request.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn post(
        &self,
        endpoint: Endpoint,
        body: serde_json::Value,
        mode: ResponseMode,
    ) -> Result<TransportResponse, TransportFailure>;
}

/// [`Transport`] over HTTP using `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Creates a transport from explicit client configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ChatError> {
        config.validate()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        endpoint: Endpoint,
        body: serde_json::Value,
        mode: ResponseMode,
    ) -> Result<TransportResponse, TransportFailure> {
        let url = self.config.url_for(endpoint);
        debug!(%url, ?mode, "sending request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportFailure::Send(e.to_string()))?;
        let status = response.status();

        if status.is_success() && mode == ResponseMode::Streaming {
            let stream = response
                .bytes_stream()
                .map_err(|e| TransportFailure::Read(e.to_string()));
            return Ok(TransportResponse {
                status: status.as_u16(),
                body: ResponseBody::Stream(Box::pin(stream)),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportFailure::Read(e.to_string()))?;
        Ok(TransportResponse {
            status: status.as_u16(),
            body: ResponseBody::Full(bytes),
        })
    }
}
