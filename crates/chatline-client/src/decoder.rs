use tracing::trace;

use crate::stream::StreamEvent;

const TEXT_DELTA_FIELD: &str = "messageChunk";
const RESPONSE_ID_FIELD: &str = "responseId";

/// Decodes one frame into a [`StreamEvent`].
///
/// Non-JSON frames come back as `Unrecognized` so the text still reaches the
/// user. Valid JSON with no recognized field yields `None` and is dropped;
/// the two paths are intentionally different.
pub fn decode_frame(frame: &str) -> Option<StreamEvent> {
    let value: serde_json::Value = match serde_json::from_str(frame) {
        Ok(value) => value,
        Err(_) => {
            trace!(len = frame.len(), "frame is not JSON; passing through as text");
            return Some(StreamEvent::Unrecognized {
                raw: frame.to_string(),
            });
        }
    };

    if let Some(text) = non_empty_str(value.get(TEXT_DELTA_FIELD)) {
        return Some(StreamEvent::TextDelta {
            text: text.to_string(),
        });
    }

    let response_id = non_empty_str(value.get(RESPONSE_ID_FIELD)).or_else(|| {
        non_empty_str(value.get("response").and_then(|response| response.get("id")))
    });
    if let Some(response_id) = response_id {
        return Some(StreamEvent::Completed {
            response_id: response_id.to_string(),
        });
    }

    trace!("ignoring JSON frame with no recognized field");
    None
}

fn non_empty_str(value: Option<&serde_json::Value>) -> Option<&str> {
    value.and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_text_delta() {
        assert_eq!(
            decode_frame(r#"{"messageChunk":"Hel"}"#),
            Some(StreamEvent::TextDelta { text: "Hel".into() })
        );
    }

    #[test]
    fn decodes_flat_and_nested_completion() {
        assert_eq!(
            decode_frame(r#"{"responseId":"abc123"}"#),
            Some(StreamEvent::Completed {
                response_id: "abc123".into()
            })
        );
        assert_eq!(
            decode_frame(r#"{"response":{"id":"resp_9","status":"completed"}}"#),
            Some(StreamEvent::Completed {
                response_id: "resp_9".into()
            })
        );
    }

    #[test]
    fn text_delta_wins_when_both_fields_present() {
        assert_eq!(
            decode_frame(r#"{"messageChunk":"x","responseId":"r"}"#),
            Some(StreamEvent::TextDelta { text: "x".into() })
        );
    }

    #[test]
    fn malformed_frame_becomes_literal_text() {
        assert_eq!(
            decode_frame("{broken-json"),
            Some(StreamEvent::Unrecognized {
                raw: "{broken-json".into()
            })
        );
        assert_eq!(
            decode_frame("plain words"),
            Some(StreamEvent::Unrecognized {
                raw: "plain words".into()
            })
        );
    }

    #[test]
    fn valid_but_unknown_json_is_ignored() {
        assert_eq!(decode_frame(r#"{"type":"ping"}"#), None);
        assert_eq!(decode_frame(r#"{"messageChunk":""}"#), None);
        assert_eq!(decode_frame(r#"{"messageChunk":42}"#), None);
        assert_eq!(decode_frame(r#"{"response":{"status":"done"}}"#), None);
        assert_eq!(decode_frame("42"), None);
        assert_eq!(decode_frame(r#""quoted""#), None);
        assert_eq!(decode_frame("[1,2]"), None);
    }
}
