//! The scrawl message model.
//!
//! Every message on the wire is a flat JSON object tagged by its `type`
//! field. Messages are transient: the relay forwards the original raw bytes
//! and never stores a decoded message after the fan-out completes.

use serde::{Deserialize, Serialize};

/// A protocol message, tagged by the JSON `type` field.
///
/// Unknown `type` values fail deserialization; the relay treats that as a
/// protocol error (the fragment is discarded, the connection survives).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// A stroke segment on the shared canvas.
    Line {
        /// Segment start, x coordinate.
        x1: i32,
        /// Segment start, y coordinate.
        y1: i32,
        /// Segment end, x coordinate.
        x2: i32,
        /// Segment end, y coordinate.
        y2: i32,
        /// Stroke color (client-defined, e.g. "#ff0000" or "black").
        color: String,
        /// Stroke width in pixels.
        width: i32,
        /// Optional drawing mode (e.g. "eraser"). Absent for plain strokes.
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
    },

    /// Chat text, conventionally already prefixed as `"<nickname>: <text>"`.
    Chat {
        /// The display line.
        message: String,
    },

    /// Wipe the shared canvas.
    Clear,

    /// Server-generated arrival/departure announcement.
    JoinExit {
        /// Human-readable announcement text.
        message: String,
    },

    /// Client-initiated orderly disconnect.
    Exit {
        /// The departing client's nickname.
        nickname: String,
    },

    /// Server-to-client error notice.
    Err {
        /// Human-readable error text.
        message: String,
    },

    /// Best-effort notification that the relay is going down.
    ServerShutdown {
        /// Human-readable shutdown text.
        message: String,
    },
}

impl Message {
    /// Whether this message type is relayed to peers when received from a
    /// client. Server-originated types (`join_exit`, `err`,
    /// `server_shutdown`) and the `exit` control message are not.
    pub fn is_relayable(&self) -> bool {
        matches!(
            self,
            Message::Line { .. } | Message::Chat { .. } | Message::Clear
        )
    }

    /// Serialize to the wire representation (UTF-8 JSON bytes).
    pub fn to_bytes(&self) -> Vec<u8> {
        // Serialization of these variants cannot fail: no non-string keys,
        // no fallible Serialize impls.
        serde_json::to_vec(self).unwrap_or_default()
    }
}
