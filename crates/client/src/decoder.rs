use chat_relay_protocol::StreamEvent;

use crate::lines::LineSplitter;

/// Decodes the streaming endpoint's body into events.
///
/// Lines that aren't frames are ignored. Frames with a malformed payload
/// are logged and skipped, so one bad line never aborts the stream.
#[derive(Clone, Debug, Default)]
pub struct EventDecoder {
    lines: LineSplitter,
}

impl EventDecoder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a body chunk and returns the events it completes.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.lines
            .push(bytes)
            .iter()
            .filter_map(|line| decode_line(line))
            .collect()
    }

    /// Decodes whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let line = self.lines.finish()?;
        decode_line(&line)
    }
}

fn decode_line(line: &str) -> Option<StreamEvent> {
    match StreamEvent::parse_line(line)? {
        Ok(event) => Some(event),
        Err(err) => {
            warn!("skipping malformed event {line:?}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_split_across_reads() {
        let frame = StreamEvent::Chunk {
            content: "Hi".to_owned(),
            full_response: "Hi".to_owned(),
        }
        .to_frame();
        let (head, tail) = frame.split_at(frame.len() / 2);

        let mut decoder = EventDecoder::new();
        assert!(decoder.push(head.as_bytes()).is_empty());
        let events = decoder.push(tail.as_bytes());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].full_response(), Some("Hi"));
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let body = format!(
            "{}data: {{not valid json\n\n{}",
            StreamEvent::Start.to_frame(),
            StreamEvent::End {
                full_response: "done".to_owned(),
            }
            .to_frame(),
        );
        let mut decoder = EventDecoder::new();
        let events = decoder.push(body.as_bytes());
        assert_eq!(
            events,
            vec![
                StreamEvent::Start,
                StreamEvent::End {
                    full_response: "done".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_unterminated_last_frame() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.push(br#"data: {"type":"start"}"#).is_empty());
        assert_eq!(decoder.finish(), Some(StreamEvent::Start));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_non_frame_lines_are_ignored() {
        let mut decoder = EventDecoder::new();
        let events =
            decoder.push(b": ping\nevent: message\nretry: 100\n\n");
        assert!(events.is_empty());
    }
}
