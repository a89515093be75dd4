/// A buffered splitter turning arbitrary byte chunks into complete lines.
///
/// Bytes after the last newline are kept until a later chunk completes
/// the line. Splitting happens on raw bytes, so a multi-byte character cut
/// in half by the network is reassembled before it is decoded.
#[derive(Clone, Debug, Default)]
pub struct LineSplitter {
    buf: Vec<u8>,
}

impl LineSplitter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line it completes, without the
    /// line terminator.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let searched = self.buf.len();
        self.buf.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        for idx in searched..self.buf.len() {
            if self.buf[idx] == b'\n' {
                lines.push(decode_line(&self.buf[start..idx]));
                start = idx + 1;
            }
        }
        self.buf.drain(..start);
        lines
    }

    /// Returns the carried-over partial line, if any, and resets the
    /// splitter. Call this once the input has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = decode_line(&self.buf);
        self.buf.clear();
        Some(line)
    }

    /// Returns the bytes waiting for the rest of their line.
    #[inline]
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_lines() {
        let mut splitter = LineSplitter::new();
        assert_eq!(splitter.push(b"one\ntwo\n"), ["one", "two"]);
        assert!(splitter.pending().is_empty());
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_carry_over() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"data: {\"type\":\"ch").is_empty());
        assert_eq!(splitter.pending(), b"data: {\"type\":\"ch");
        assert_eq!(
            splitter.push(b"unk\"}\n\ndata: {"),
            ["data: {\"type\":\"chunk\"}", ""]
        );
        assert_eq!(splitter.pending(), b"data: {");
        assert_eq!(splitter.finish().as_deref(), Some("data: {"));
        assert!(splitter.pending().is_empty());
    }

    #[test]
    fn test_split_multibyte_character() {
        let text = "안녕\n".as_bytes();
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(&text[..2]).is_empty());
        assert!(splitter.push(&text[2..4]).is_empty());
        assert_eq!(splitter.push(&text[4..]), ["안녕"]);
    }

    #[test]
    fn test_crlf() {
        let mut splitter = LineSplitter::new();
        assert_eq!(splitter.push(b"a\r\nb\r"), ["a"]);
        assert_eq!(splitter.push(b"\n"), ["b"]);
    }

    #[test]
    fn test_byte_at_a_time() {
        let input = b"data: x\n\ndata: y\n\n";
        let mut splitter = LineSplitter::new();
        let lines: Vec<String> = input
            .iter()
            .flat_map(|b| splitter.push(std::slice::from_ref(b)))
            .collect();
        assert_eq!(lines, ["data: x", "", "data: y", ""]);
    }
}
