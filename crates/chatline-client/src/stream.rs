/// Semantic events decoded from one stream frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental fragment of the generated message, in arrival order.
    TextDelta { text: String },
    /// Terminal marker carrying the id needed to continue the thread.
    Completed { response_id: String },
    /// Frame that was not JSON; shown to the user as literal text.
    Unrecognized { raw: String },
}

impl StreamEvent {
    /// Consumes the event, returning the text owed to the caller's sink.
    pub fn into_display_text(self) -> Option<String> {
        match self {
            Self::TextDelta { text } | Self::Unrecognized { raw: text } => Some(text),
            Self::Completed { .. } => None,
        }
    }
}

/// Durable output of a streaming call beyond the sink invocations.
///
/// `response_id` is `None` when the stream closed without a completion
/// marker. That is not an error by itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamResult {
    pub response_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_text_bearing_events_have_display_text() {
        let delta = StreamEvent::TextDelta { text: "hi".into() };
        let raw = StreamEvent::Unrecognized { raw: "oops".into() };
        let done = StreamEvent::Completed {
            response_id: "r1".into(),
        };
        assert_eq!(delta.into_display_text().as_deref(), Some("hi"));
        assert_eq!(raw.into_display_text().as_deref(), Some("oops"));
        assert_eq!(done.into_display_text(), None);
    }
}
