//! Incremental decoding of stream frames into records
//!
//! The stream endpoint delivers `data: <json>` records separated by blank
//! lines, chunked at arbitrary byte boundaries: a chunk may end in the
//! middle of a record or in the middle of a multi-byte UTF-8 character.
//! [`FrameDecoder`] carries both kinds of remainder across `push` calls so
//! that re-chunking never changes the decoded record sequence.

use crate::types::StreamRecord;

/// Record separator on the wire (blank line)
const RECORD_DELIMITER: &str = "\n\n";

/// Required prefix of every payload-bearing record
const DATA_PREFIX: &str = "data: ";

/// Literal marker the backend interleaves before error records; stripped
/// before splitting, mirroring what the backend emits
const ERROR_EVENT_MARKER: &str = "event: error\n";

/// Decode a single delimited record. Records without the `data: ` prefix
/// and records whose payload is not valid JSON are discarded; neither
/// aborts the stream.
pub fn decode_record(record: &str) -> Option<StreamRecord> {
    let payload = record.trim().strip_prefix(DATA_PREFIX)?;
    match serde_json::from_str(payload) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::trace!("skipping invalid record: {}", e);
            None
        }
    }
}

/// Stateful chunk-to-record decoder.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes of an incomplete trailing UTF-8 sequence from the last chunk
    pending_bytes: Vec<u8>,
    /// Decoded text that has not yet formed a complete record
    pending_text: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk, returning every record it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamRecord> {
        if chunk.is_empty() {
            return vec![];
        }
        self.pending_bytes.extend_from_slice(chunk);
        let decoded = drain_valid_utf8(&mut self.pending_bytes);
        self.pending_text.push_str(&decoded);

        if self.pending_text.contains(ERROR_EVENT_MARKER) {
            self.pending_text = self.pending_text.replace(ERROR_EVENT_MARKER, "");
        }

        let mut records = vec![];
        while let Some(pos) = self.pending_text.find(RECORD_DELIMITER) {
            let rest = self.pending_text.split_off(pos + RECORD_DELIMITER.len());
            let raw = std::mem::replace(&mut self.pending_text, rest);
            if let Some(record) = decode_record(&raw) {
                records.push(record);
            }
        }
        records
    }

    /// Flush the trailing remainder at end of stream. The final record may
    /// arrive without a closing blank line.
    pub fn finish(&mut self) -> Vec<StreamRecord> {
        if !self.pending_bytes.is_empty() {
            // a sequence that never completed; decode what can be salvaged
            let tail = String::from_utf8_lossy(&self.pending_bytes).into_owned();
            self.pending_bytes.clear();
            self.pending_text.push_str(&tail);
        }
        let tail = std::mem::take(&mut self.pending_text);
        let tail = tail.replace(ERROR_EVENT_MARKER, "");
        tail.split(RECORD_DELIMITER).filter_map(decode_record).collect()
    }
}

/// Move the longest decodable UTF-8 prefix out of `buf`, leaving an
/// incomplete trailing sequence (if any) for the next chunk. Invalid
/// interior sequences become U+FFFD rather than stalling the stream.
fn drain_valid_utf8(buf: &mut Vec<u8>) -> String {
    let mut out = String::new();
    loop {
        match std::str::from_utf8(buf) {
            Ok(s) => {
                out.push_str(s);
                buf.clear();
                break;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                out.push_str(std::str::from_utf8(&buf[..valid]).unwrap());
                match e.error_len() {
                    Some(bad) => {
                        out.push('\u{FFFD}');
                        buf.drain(..valid + bad);
                    }
                    None => {
                        buf.drain(..valid);
                        break;
                    }
                }
            }
        }
    }
    out
}

/// Accumulated reply text for one outstanding turn.
///
/// Fragments are concatenated in arrival order; the buffer is dropped with
/// the turn, so there is never more than one per loop instance.
#[derive(Debug, Default)]
pub struct ReplyBuffer {
    text: String,
}

impl ReplyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the record's fragment, if it carries one. Returns whether
    /// anything was appended (i.e. whether an update should fire).
    pub fn absorb(&mut self, record: &StreamRecord) -> bool {
        match record.message.as_deref() {
            Some(fragment) => {
                self.text.push_str(fragment);
                true
            }
            None => false,
        }
    }

    /// Append a bare fragment (push-hub events carry the fragment directly).
    pub fn push_fragment(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_str(decoder: &mut FrameDecoder, s: &str) -> Vec<StreamRecord> {
        decoder.push(s.as_bytes())
    }

    fn accumulate(records: &[StreamRecord]) -> String {
        let mut buffer = ReplyBuffer::new();
        for r in records {
            buffer.absorb(r);
        }
        buffer.into_string()
    }

    #[test]
    fn test_single_record() {
        let mut d = FrameDecoder::new();
        let records = push_str(&mut d, "data: {\"message\":\"Hi\",\"success\":true}\n\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_multiple_records_in_one_chunk() {
        let mut d = FrameDecoder::new();
        let records = push_str(
            &mut d,
            "data: {\"message\":\"Hi\"}\n\ndata: {\"message\":\" there\"}\n\n",
        );
        assert_eq!(records.len(), 2);
        assert_eq!(accumulate(&records), "Hi there");
    }

    #[test]
    fn test_record_split_across_chunks() {
        let mut d = FrameDecoder::new();
        assert!(push_str(&mut d, "data: {\"mess").is_empty());
        let records = push_str(&mut d, "age\":\"Hi\"}\n\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_utf8_character_split_across_chunks() {
        let payload = "data: {\"message\":\"héllo → wörld\"}\n\n".as_bytes();
        // split inside the two-byte 'é'
        let split = payload.iter().position(|&b| b == 0xc3).unwrap() + 1;
        let mut d = FrameDecoder::new();
        assert!(d.push(&payload[..split]).is_empty());
        let records = d.push(&payload[split..]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message.as_deref(), Some("héllo → wörld"));
    }

    #[test]
    fn test_rechunking_never_changes_accumulated_text() {
        let wire = "data: {\"message\":\"Здравей\",\"chatId\":7}\n\n\
                    data: {\"message\":\" свят\"}\n\n\
                    data: {\"message\":\"…!\"}\n\n"
            .as_bytes();

        let mut reference = FrameDecoder::new();
        let mut all = reference.push(wire);
        all.extend(reference.finish());
        let expected = accumulate(&all);
        assert_eq!(expected, "Здравей свят…!");

        for split in 0..=wire.len() {
            let mut d = FrameDecoder::new();
            let mut records = d.push(&wire[..split]);
            records.extend(d.push(&wire[split..]));
            records.extend(d.finish());
            assert_eq!(
                accumulate(&records),
                expected,
                "split at byte {} changed the result",
                split
            );
        }
    }

    #[test]
    fn test_missing_data_prefix_is_ignored() {
        let mut d = FrameDecoder::new();
        let records = push_str(
            &mut d,
            "id: 42\n\ndata: {\"message\":\"kept\"}\n\n",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message.as_deref(), Some("kept"));
    }

    #[test]
    fn test_invalid_json_is_ignored_without_corrupting_the_rest() {
        let mut d = FrameDecoder::new();
        let records = push_str(
            &mut d,
            "data: {not json}\n\ndata: {\"message\":\"ok\"}\n\n",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message.as_deref(), Some("ok"));
    }

    #[test]
    fn test_error_event_marker_is_stripped() {
        let mut d = FrameDecoder::new();
        let records = push_str(
            &mut d,
            "event: error\ndata: {\"message\":\"oops\",\"success\":false}\n\n",
        );
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert_eq!(records[0].message.as_deref(), Some("oops"));
    }

    #[test]
    fn test_error_event_marker_split_across_chunks() {
        let mut d = FrameDecoder::new();
        assert!(push_str(&mut d, "event: er").is_empty());
        let records = push_str(&mut d, "ror\ndata: {\"message\":\"x\"}\n\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message.as_deref(), Some("x"));
    }

    #[test]
    fn test_empty_chunks_are_noops() {
        let mut d = FrameDecoder::new();
        assert!(d.push(b"").is_empty());
        let records = push_str(&mut d, "data: {\"message\":\"a\"}\n\n");
        assert_eq!(records.len(), 1);
        assert!(d.push(b"").is_empty());
    }

    #[test]
    fn test_finish_flushes_unterminated_record() {
        let mut d = FrameDecoder::new();
        assert!(push_str(&mut d, "data: {\"message\":\"tail\"}").is_empty());
        let records = d.finish();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message.as_deref(), Some("tail"));
    }

    #[test]
    fn test_finish_on_clean_end_is_empty() {
        let mut d = FrameDecoder::new();
        push_str(&mut d, "data: {\"message\":\"done\"}\n\n");
        assert!(d.finish().is_empty());
    }

    #[test]
    fn test_reply_buffer_ignores_recordless_messages() {
        let mut buffer = ReplyBuffer::new();
        let keepalive: StreamRecord = serde_json::from_str("{}").unwrap();
        assert!(!buffer.absorb(&keepalive));
        assert!(buffer.is_empty());
    }
}
