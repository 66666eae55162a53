use serde::Deserialize;

/// Conventional end-of-stream marker sent as a frame payload.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Incremental splitter for the event-stream transport.
///
/// Feeds on raw response bytes and yields complete `data:` payloads. Frames
/// are delimited by a blank line; a read may end mid-frame or even mid-way
/// through a multi-byte UTF-8 character, so everything after the last
/// complete frame stays buffered as bytes until the next read.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    /// Buffer offset already scanned for a delimiter. A delimiter can
    /// straddle a read boundary, so the scan resumes a few bytes back from
    /// here rather than from the start of the buffer.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one read's worth of bytes, returning every complete frame
    /// payload it finishes. A single read can complete several frames, or
    /// none.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        loop {
            let from = self.scanned.saturating_sub(3);
            let Some((end, skip)) = find_delimiter(&self.buf[from..]) else {
                self.scanned = self.buf.len();
                break;
            };
            let (end, skip) = (from + end, skip);
            let frame: Vec<u8> = self.buf.drain(..end + skip).take(end).collect();
            self.scanned = 0;
            if let Some(payload) = extract_payload(&frame) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Graceful stream closure. A trailing partial frame is dropped here and
    /// only here; mid-stream it stays buffered.
    pub fn finish(&mut self) {
        if !self.buf.is_empty() {
            log::debug!(
                "discarding {} trailing bytes of partial frame at stream close",
                self.buf.len()
            );
            self.buf.clear();
            self.scanned = 0;
        }
    }
}

/// Position of the earliest frame delimiter: `(payload_end, delimiter_len)`.
fn find_delimiter(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|i| (i + 1, 1));
    let crlf = buf
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i + 2, 2));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(std::cmp::min(a, b)),
        (a, b) => a.or(b),
    }
}

fn extract_payload(frame: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(frame);
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            return Some(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        }
    }
    // Comment or event-type-only frames carry no payload for us.
    None
}

#[derive(Debug, Deserialize)]
struct FrameBody {
    chunk: Option<String>,
    error: Option<String>,
}

/// Classified frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// Text fragment to append to the answer.
    Chunk(String),
    /// Terminal in-stream error.
    Error(String),
    /// Terminal success sentinel.
    Done,
    /// Unparseable payload; never aborts an otherwise-healthy stream.
    Malformed,
}

/// Classify one frame payload.
pub fn classify(payload: &str) -> FrameEvent {
    let trimmed = payload.trim();
    if trimmed == DONE_SENTINEL {
        return FrameEvent::Done;
    }
    match serde_json::from_str::<FrameBody>(trimmed) {
        Ok(FrameBody {
            error: Some(message),
            ..
        }) => FrameEvent::Error(message),
        Ok(FrameBody {
            chunk: Some(text), ..
        }) => FrameEvent::Chunk(text),
        Ok(_) | Err(_) => FrameEvent::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_read_with_multiple_frames() {
        let mut decoder = FrameDecoder::new();
        let payloads = decoder.push(b"data: {\"chunk\":\"a\"}\n\ndata: [DONE]\n\n");
        assert_eq!(payloads, vec!["{\"chunk\":\"a\"}", "[DONE]"]);
    }

    #[test]
    fn frame_split_across_reads() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(b"data: {\"chu"), Vec::<String>::new());
        assert_eq!(decoder.push(b"nk\":\"a\"}\n\n"), vec!["{\"chunk\":\"a\"}"]);
    }

    #[test]
    fn multibyte_character_split_across_reads() {
        let text = "data: {\"chunk\":\"héllo\"}\n\n".as_bytes();
        // Cut inside the two-byte 'é'.
        let cut = text.iter().position(|&b| b == 0xc3).unwrap() + 1;
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(&text[..cut]), Vec::<String>::new());
        assert_eq!(decoder.push(&text[cut..]), vec!["{\"chunk\":\"héllo\"}"]);
    }

    #[test]
    fn byte_at_a_time_delivery_decodes_each_frame_once() {
        let text = b"data: {\"chunk\":\"a\"}\r\n\r\ndata: {\"chunk\":\"b\"}\n\n";
        let mut decoder = FrameDecoder::new();
        let mut payloads = Vec::new();
        for byte in text {
            payloads.extend(decoder.push(&[*byte]));
        }
        assert_eq!(payloads, vec!["{\"chunk\":\"a\"}", "{\"chunk\":\"b\"}"]);
    }

    #[test]
    fn crlf_delimiters_are_accepted() {
        let mut decoder = FrameDecoder::new();
        let payloads = decoder.push(b"data: one\r\n\r\ndata: two\r\n\r\n");
        assert_eq!(payloads, vec!["one", "two"]);
    }

    #[test]
    fn frames_without_data_prefix_are_ignored() {
        let mut decoder = FrameDecoder::new();
        let payloads = decoder.push(b": keep-alive\n\nevent: ping\n\ndata: real\n\n");
        assert_eq!(payloads, vec!["real"]);
    }

    #[test]
    fn trailing_partial_is_kept_until_finish() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(b"data: partial"), Vec::<String>::new());
        decoder.finish();
        assert_eq!(decoder.push(b"\n\n"), Vec::<String>::new());
    }

    #[test]
    fn classify_done_sentinel() {
        assert_eq!(classify("[DONE]"), FrameEvent::Done);
        assert_eq!(classify("  [DONE]  "), FrameEvent::Done);
    }

    #[test]
    fn classify_chunk_and_error() {
        assert_eq!(
            classify("{\"chunk\":\"Hello \"}"),
            FrameEvent::Chunk("Hello ".into())
        );
        assert_eq!(
            classify("{\"error\":\"boom\"}"),
            FrameEvent::Error("boom".into())
        );
    }

    #[test]
    fn error_wins_when_both_fields_present() {
        assert_eq!(
            classify("{\"chunk\":\"x\",\"error\":\"boom\"}"),
            FrameEvent::Error("boom".into())
        );
    }

    #[test]
    fn classify_malformed() {
        assert_eq!(classify("{not json}"), FrameEvent::Malformed);
        assert_eq!(classify("{\"other\":1}"), FrameEvent::Malformed);
    }
}
