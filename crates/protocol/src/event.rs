use serde::{Deserialize, Serialize};

/// The prefix of every frame on the streaming endpoint.
pub const EVENT_PREFIX: &str = "data: ";

/// One event of a streamed completion.
///
/// A well-formed stream is a `Start`, any number of `Chunk`s and exactly
/// one terminal event (`End` or `Error`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// The stream has been opened.
    Start,
    /// A new fragment of the reply.
    Chunk {
        /// The fragment itself.
        content: String,
        /// Everything received so far, this fragment included.
        #[serde(rename = "fullResponse")]
        full_response: String,
    },
    /// The reply is complete.
    End {
        /// The whole reply.
        #[serde(rename = "fullResponse")]
        full_response: String,
    },
    /// The reply failed; nothing follows.
    Error {
        /// What went wrong.
        error: String,
    },
}

impl StreamEvent {
    /// Returns true if no event may follow this one.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::End { .. } | StreamEvent::Error { .. })
    }

    /// Returns the cumulative text carried by this event, if any.
    #[inline]
    pub fn full_response(&self) -> Option<&str> {
        match self {
            StreamEvent::Chunk { full_response, .. }
            | StreamEvent::End { full_response } => Some(full_response),
            _ => None,
        }
    }

    /// Serializes the event as a frame, i.e. `data: <json>\n\n`.
    pub fn to_frame(&self) -> String {
        // Serializing this enum can't fail: all fields are plain strings.
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{EVENT_PREFIX}{json}\n\n")
    }

    /// Parses one line of the stream.
    ///
    /// Returns `None` for lines that are not frames (blank separators or
    /// other fields), and `Some(Err(..))` for frames whose payload isn't a
    /// valid event.
    pub fn parse_line(line: &str) -> Option<Result<Self, serde_json::Error>> {
        let payload = line.strip_prefix(EVENT_PREFIX)?;
        Some(serde_json::from_str(payload))
    }
}
