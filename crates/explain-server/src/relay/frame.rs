//! Stream frame encoding.
//!
//! One frame per blank-line-terminated block:
//!
//! ```text
//! data: {"type":"image","data":"abc"}\n\n     event
//! :\n\n                                        keep-alive (comment)
//! ```
//!
//! Events carry no `event:` line, so browsers deliver them to `onmessage`.

use bytes::{BufMut, Bytes, BytesMut};
use explain_core::RelayEvent;

/// Keep-alive comment frame.
pub const KEEPALIVE_FRAME: &[u8] = b":\n\n";

const DATA_PREFIX: &[u8] = b"data: ";
const TERMINATOR: &[u8] = b"\n\n";

/// A unit written to a subscriber stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// An encoded event frame, shared between all recipients of one publish.
    Event(Bytes),
    /// An ignorable keep-alive comment.
    KeepAlive,
}

impl Frame {
    /// Serialize an event into a `data:` frame.
    ///
    /// Compact JSON never contains a raw newline, so the payload always fits
    /// on one `data:` line.
    pub fn event(event: &RelayEvent) -> serde_json::Result<Self> {
        let json = serde_json::to_vec(event)?;
        let mut buf = BytesMut::with_capacity(DATA_PREFIX.len() + json.len() + TERMINATOR.len());
        buf.put_slice(DATA_PREFIX);
        buf.put_slice(&json);
        buf.put_slice(TERMINATOR);
        Ok(Self::Event(buf.freeze()))
    }

    /// Wire bytes for this frame.
    pub fn encode(&self) -> Bytes {
        match self {
            Self::Event(bytes) => bytes.clone(),
            Self::KeepAlive => Bytes::from_static(KEEPALIVE_FRAME),
        }
    }

    /// Whether this is a keep-alive frame.
    pub fn is_keepalive(&self) -> bool {
        matches!(self, Self::KeepAlive)
    }
}
