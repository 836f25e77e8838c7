use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::errors::ChatError;

/// Request envelope shared by the batch and streamed text endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Attached image as a data URI or raw base64 payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    /// Id returned by the previous turn, to continue the same thread.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn image(mut self, image: ImageAttachment) -> Self {
        self.image_base64 = Some(image.into_data_uri());
        self
    }

    pub fn previous_response_id(mut self, id: impl Into<String>) -> Self {
        self.previous_response_id = Some(id.into());
        self
    }

    pub(crate) fn to_json(&self) -> Result<serde_json::Value, ChatError> {
        serde_json::to_value(self)
            .map_err(|e| ChatError::Protocol(format!("failed to serialize request: {e}")))
    }
}

/// Image attached to a chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAttachment {
    data_uri: String,
}

impl ImageAttachment {
    /// Wraps an existing data URI (`data:image/...;base64,...`).
    pub fn from_data_uri(data_uri: impl Into<String>) -> Self {
        Self {
            data_uri: data_uri.into(),
        }
    }

    /// Encodes raw image bytes with the given MIME type.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self {
            data_uri: format!("data:{mime};base64,{}", STANDARD.encode(bytes)),
        }
    }

    pub fn into_data_uri(self) -> String {
        self.data_uri
    }
}

/// Recorded audio, carried as plain base64.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioClip {
    base64: String,
}

impl AudioClip {
    pub fn from_base64(base64: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            base64: STANDARD.encode(bytes),
        }
    }

    pub fn as_base64(&self) -> &str {
        &self.base64
    }
}

/// Batch text completion reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextReply {
    pub response_message: String,
    pub response_id: String,
}

/// Generated image reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// PNG encoded as a `data:image/png;base64,...` URI.
    pub image: String,
}

impl GeneratedImage {
    /// Decodes the data URI payload into raw PNG bytes.
    pub fn png_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let payload = match self.image.split_once(',') {
            Some((header, payload)) if header.starts_with("data:") => payload,
            _ => self.image.as_str(),
        };
        STANDARD.decode(payload.trim())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TranscriptionReply {
    pub transcribed_message: String,
}

/// Transcription followed by a text reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechReply {
    pub response_id: String,
    pub response_message: String,
    pub transcribed_message: String,
}
