use std::time::Duration;

use crate::errors::ChatError;

/// Default base URL for a locally served generation service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";

/// Logical endpoints exposed by the generation service.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Endpoint {
    /// Batch text completion.
    Chat,
    /// Streamed text completion.
    ChatStream,
    /// Image generation.
    CreateImage,
    /// Speech transcription.
    Transcribe,
    /// Transcription followed by a text reply.
    Speech,
}

impl Endpoint {
    /// Path used when no override is configured.
    pub fn default_path(self) -> &'static str {
        match self {
            Self::Chat => "/api/chat",
            Self::ChatStream => "/api/chat/stream",
            Self::CreateImage => "/api/chat/createImage",
            Self::Transcribe => "/api/chat/transcribe",
            Self::Speech => "/api/chat/speech",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_path())
    }
}

/// Configuration for [`ChatClient`](crate::ChatClient).
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the generation service.
    pub base_url: String,
    /// Optional whole-request timeout. `None` leaves it to the platform.
    pub timeout: Option<Duration>,
    /// Path override for the stream endpoint.
    pub stream_path: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            stream_path: None,
        }
    }
}

impl ClientConfig {
    /// Creates a config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Builds a config from `CHATLINE_BASE_URL` and `CHATLINE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ChatError> {
        let mut config = match std::env::var("CHATLINE_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        };
        if let Ok(raw) = std::env::var("CHATLINE_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ChatError::Config(format!("CHATLINE_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the stream endpoint path (for services mounted elsewhere).
    pub fn stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = Some(path.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ChatError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(ChatError::Config("base_url must not be empty".into()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ChatError::Config(format!(
                "base_url must be an http(s) URL: {base}"
            )));
        }
        Ok(())
    }

    /// Absolute URL for an endpoint.
    pub fn url_for(&self, endpoint: Endpoint) -> String {
        let path = match (endpoint, self.stream_path.as_deref()) {
            (Endpoint::ChatStream, Some(path)) => path,
            _ => endpoint.default_path(),
        };
        format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_joins_without_double_slashes() {
        let config = ClientConfig::new("https://chat.example.com/");
        assert_eq!(
            config.url_for(Endpoint::ChatStream),
            "https://chat.example.com/api/chat/stream"
        );
        assert_eq!(
            config.url_for(Endpoint::CreateImage),
            "https://chat.example.com/api/chat/createImage"
        );
    }

    #[test]
    fn stream_path_override_only_affects_stream_endpoint() {
        let config = ClientConfig::new("http://host").stream_path("v2/stream");
        assert_eq!(config.url_for(Endpoint::ChatStream), "http://host/v2/stream");
        assert_eq!(config.url_for(Endpoint::Chat), "http://host/api/chat");
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("ftp://host").validate().is_err());
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn default_has_no_timeout() {
        assert_eq!(ClientConfig::default().timeout, None);
    }
}
