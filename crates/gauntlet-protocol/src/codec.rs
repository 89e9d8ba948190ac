//! Codec trait and implementations for event traces.
//!
//! A codec turns events (or any serde type) into bytes and back. Traces
//! of forwarded events are written through a codec so a run can be
//! inspected or replayed into a fresh room later.

use serde::{de::DeserializeOwned, Serialize};

use crate::{Event, ProtocolError};

/// Encodes values to bytes and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Encodes a batch of events, one per line.
    fn encode_trace(&self, events: &[Event]) -> Result<Vec<u8>, ProtocolError> {
        let mut out = Vec::new();
        for event in events {
            out.extend(self.encode(event)?);
            out.push(b'\n');
        }
        Ok(out)
    }

    /// Decodes a trace written by [`Codec::encode_trace`]. Blank lines are
    /// skipped.
    fn decode_trace(&self, data: &[u8]) -> Result<Vec<Event>, ProtocolError> {
        data.split(|b| *b == b'\n')
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .map(|line| self.decode(line))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`). Behind the `json`
/// feature, enabled by default.
///
/// ```rust
/// use gauntlet_protocol::{Codec, Event, JsonCodec, ObjectId};
///
/// let codec = JsonCodec;
/// let event = Event::kill(&ObjectId::new("o1"));
///
/// let bytes = codec.encode(&event).unwrap();
/// let decoded: Event = codec.decode(&bytes).unwrap();
/// assert_eq!(event, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Attribute, ObjectId, Position};

    #[test]
    fn test_trace_is_one_event_per_line() {
        let codec = JsonCodec;
        let events = vec![
            Event::kill(&ObjectId::new("o1")),
            Event::warp(&ObjectId::new("h1"), Position::new(8, 16)),
            Event::increase(&ObjectId::new("h1"), Attribute::Score, 100),
        ];

        let bytes = codec.encode_trace(&events).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(text.lines().count(), 3);

        let decoded = codec.decode_trace(&bytes).unwrap();
        assert_eq!(decoded, events);
    }

    #[test]
    fn test_decode_trace_skips_blank_lines() {
        let codec = JsonCodec;
        let data = b"\n{\"type\":\"kill_object\",\"id\":\"o1\"}\n\n";
        let decoded = codec.decode_trace(data).unwrap();
        assert_eq!(decoded, vec![Event::kill(&ObjectId::new("o1"))]);
    }

    #[test]
    fn test_decode_unknown_event_type_passes_through() {
        let codec = JsonCodec;
        let event: Event = codec
            .decode(br#"{"type":"dance","id":"o1","payload":[2]}"#)
            .unwrap();
        assert_eq!(
            event,
            Event::Opaque {
                tag: "dance".into(),
                payload: vec![crate::AttributeValue::Int(2)],
            }
        );
    }

    #[test]
    fn test_trace_keeps_foreign_events() {
        let codec = JsonCodec;
        let data = b"{\"type\":\"play_sound\"}\n{\"type\":\"kill_object\",\"id\":\"o1\"}\n";
        let decoded = codec.decode_trace(data).unwrap();
        assert_eq!(decoded[0].tag(), "play_sound");
        assert_eq!(decoded[1], Event::kill(&ObjectId::new("o1")));

        let again = codec.decode_trace(&codec.encode_trace(&decoded).unwrap()).unwrap();
        assert_eq!(again, decoded);
    }

    #[test]
    fn test_decode_malformed_known_event_returns_error() {
        let codec = JsonCodec;
        let result: Result<Event, _> = codec.decode(br#"{"type":"warp_to","id":"o1"}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
