use serde::{Deserialize, Serialize};

/// An error the fake provider reports instead of a real upstream failure.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetError {
    /// The error message.
    pub message: String,
    /// The HTTP status the fake upstream answered with, if any.
    pub status: Option<u16>,
}

impl PresetError {
    /// Creates an error without a status.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Sets the HTTP status of the error.
    #[inline]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    /// Fails the response at this point of the stream.
    #[serde(rename = "error")]
    Error(PresetError),
}

/// The preset response the fake provider answers every request with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request is refused before any event is produced.
    pub rejection: Option<PresetError>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            rejection: None,
        }
    }

    /// Creates a `PresetResponse` that streams the given fragments and
    /// then completes.
    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_events(
            fragments
                .into_iter()
                .map(|s| PresetEvent::MessageDelta(s.into()))
                .collect::<Vec<_>>(),
        )
    }

    /// Makes the request fail before the response is opened.
    #[inline]
    pub fn with_rejection(mut self, error: PresetError) -> Self {
        self.rejection = Some(error);
        self
    }

    /// Returns the concatenated text of the message deltas before the
    /// first error, or the error itself.
    pub fn full_text(&self) -> Result<String, &PresetError> {
        if let Some(rejection) = &self.rejection {
            return Err(rejection);
        }
        let mut text = String::new();
        for event in &self.events {
            match event {
                PresetEvent::MessageDelta(delta) => text.push_str(delta),
                PresetEvent::Error(err) => return Err(err),
            }
        }
        Ok(text)
    }
}
