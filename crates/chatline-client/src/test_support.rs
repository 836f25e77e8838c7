use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::stream;

use crate::config::Endpoint;
use crate::errors::TransportFailure;
use crate::transport::{ResponseBody, ResponseMode, Transport, TransportResponse};

/// Scripted behavior for one endpoint of [`FakeTransport`].
#[derive(Clone)]
pub(crate) enum Scripted {
    /// Buffered body regardless of the requested mode.
    Full { status: u16, body: Bytes },
    /// Streamed body delivered as the given chunks, then closed.
    Chunks { status: u16, chunks: Vec<Bytes> },
    /// Streamed chunks followed by a channel that never yields again.
    ChunksThenHang { chunks: Vec<Bytes> },
    /// Streamed chunks followed by a read failure.
    ChunksThenFail {
        chunks: Vec<Bytes>,
        failure: TransportFailure,
    },
    /// The request itself fails.
    Fail(TransportFailure),
    /// The request never completes.
    Pending,
}

impl Scripted {
    pub(crate) fn full(status: u16, body: &str) -> Self {
        Self::Full {
            status,
            body: Bytes::from(body.to_string()),
        }
    }

    pub(crate) fn chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self::Chunks {
            status: 200,
            chunks: to_bytes(chunks),
        }
    }

    pub(crate) fn hang_after<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self::ChunksThenHang {
            chunks: to_bytes(chunks),
        }
    }
}

fn to_bytes<I, S>(chunks: I) -> Vec<Bytes>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    chunks
        .into_iter()
        .map(|c| Bytes::copy_from_slice(c.as_ref()))
        .collect()
}

/// In-memory transport with per-endpoint scripts and a call log.
#[derive(Default)]
pub(crate) struct FakeTransport {
    scripts: Mutex<HashMap<Endpoint, Scripted>>,
    calls: Mutex<Vec<(Endpoint, serde_json::Value)>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn script(self: Arc<Self>, endpoint: Endpoint, scripted: Scripted) -> Arc<Self> {
        self.scripts
            .lock()
            .expect("scripts lock")
            .insert(endpoint, scripted);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(Endpoint, serde_json::Value)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn post(
        &self,
        endpoint: Endpoint,
        body: serde_json::Value,
        _mode: ResponseMode,
    ) -> Result<TransportResponse, TransportFailure> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((endpoint, body));
        let scripted = self
            .scripts
            .lock()
            .expect("scripts lock")
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| Scripted::full(404, r#"{"error":"not scripted"}"#));

        match scripted {
            Scripted::Full { status, body } => Ok(TransportResponse {
                status,
                body: ResponseBody::Full(body),
            }),
            Scripted::Chunks { status, chunks } => Ok(TransportResponse {
                status,
                body: ResponseBody::Stream(Box::pin(stream::iter(
                    chunks.into_iter().map(Ok::<Bytes, TransportFailure>),
                ))),
            }),
            Scripted::ChunksThenHang { chunks } => Ok(TransportResponse {
                status: 200,
                body: ResponseBody::Stream(Box::pin(futures::StreamExt::chain(
                    stream::iter(chunks.into_iter().map(Ok::<Bytes, TransportFailure>)),
                    stream::pending::<Result<Bytes, TransportFailure>>(),
                ))),
            }),
            Scripted::ChunksThenFail { chunks, failure } => Ok(TransportResponse {
                status: 200,
                body: ResponseBody::Stream(Box::pin(stream::iter(
                    chunks
                        .into_iter()
                        .map(Ok::<Bytes, TransportFailure>)
                        .chain(std::iter::once(Err(failure))),
                ))),
            }),
            Scripted::Fail(failure) => Err(failure),
            Scripted::Pending => {
                std::future::pending::<Result<TransportResponse, TransportFailure>>().await
            }
        }
    }
}
