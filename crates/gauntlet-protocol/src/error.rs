//! Error types for the protocol layer.

/// Errors raised while encoding events or writing attributes.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed input, unknown event type,
    /// missing fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A value of the wrong kind was written into an attribute slot,
    /// e.g. text into `life`.
    #[error("attribute {attribute} cannot hold {value:?}")]
    AttributeType { attribute: String, value: String },

    /// An increase would take an attribute past the range of `i64`.
    #[error("attribute {attribute} overflows when increased by {delta}")]
    AttributeOverflow { attribute: String, delta: i64 },
}
