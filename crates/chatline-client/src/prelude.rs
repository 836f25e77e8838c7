//! Common imports for typical client usage.
pub use crate::{
    AbortHandle, AbortSignal, AudioClip, ChatClient, ChatError, ChatRequest, ClientConfig,
    Conversation, GeneratedImage, ImageAttachment, SpeechReply, StreamResult, StreamTask,
    TextReply,
};
