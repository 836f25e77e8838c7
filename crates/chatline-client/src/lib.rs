//! Client for a chat generation service that streams replies as
//! newline-delimited JSON.
//!
//! The streaming path splits the body into frames ([`framer`]), decodes each
//! frame into a [`StreamEvent`] ([`decoder`]) and hands text to a caller sink
//! in arrival order. Every operation takes an optional [`AbortSignal`];
//! cancellation is reported as [`ChatError::Cancelled`], distinct from real
//! failures.
//!
//! ```no_run
//! use chatline_client::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ChatError> {
//! let client = ChatClient::new(ClientConfig::new("http://localhost:8081"))?;
//! let abort = AbortHandle::new();
//!
//! let result = client
//!     .stream_text(
//!         &ChatRequest::new("Say hello"),
//!         |chunk| print!("{chunk}"),
//!         Some(&abort.signal()),
//!     )
//!     .await?;
//! println!();
//! println!("continue with {:?}", result.response_id);
//! # Ok(())
//! # }
//! ```

/// Cancellation handle and signal plus the bridge into transport calls.
pub mod cancel;
/// Client entry point and the batch (non-streamed) operations.
pub mod client;
/// Endpoint and client configuration.
pub mod config;
/// Multi-turn thread state with explicit cancel-and-replace.
pub mod conversation;
/// Frame to event decoding.
pub mod decoder;
mod dispatch;
/// Public error types.
pub mod errors;
/// Newline framing of streamed bodies.
pub mod framer;
/// Logging initialization.
pub mod observability;
/// Request and reply envelopes.
pub mod payload;
/// Common imports for typical usage.
pub mod prelude;
/// Stream events and the streaming result.
pub mod stream;
/// Streaming calls running on their own task.
pub mod task;
/// Transport seam and the HTTP implementation.
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use cancel::{AbortHandle, AbortSignal};
pub use client::ChatClient;
pub use config::{ClientConfig, Endpoint};
pub use conversation::Conversation;
pub use decoder::decode_frame;
pub use errors::{ChatError, TransportFailure};
pub use framer::LineFramer;
pub use payload::{
    AudioClip, ChatRequest, GeneratedImage, ImageAttachment, SpeechReply, TextReply,
};
pub use stream::{StreamEvent, StreamResult};
pub use task::StreamTask;
pub use transport::{
    ByteStream, HttpTransport, ResponseBody, ResponseMode, Transport, TransportResponse,
};
