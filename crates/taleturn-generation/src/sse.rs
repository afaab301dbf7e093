//! Minimal Server-Sent Events framing for chat-completions streams.
//!
//! Only `data:` fields matter for chat completions; comments, `event:` and
//! `id:` lines are ignored. Chunks may split a line anywhere, including inside
//! a multi-byte character, so bytes are buffered until a newline arrives.

/// The sentinel a chat-completions stream ends with.
pub(crate) const DONE: &str = "[DONE]";

/// Accumulates raw bytes and yields complete `data:` payloads.
#[derive(Debug, Default)]
pub(crate) struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    /// Feeds a chunk and returns the data payloads of every line it completed.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim_start().to_owned());
            }
        }
        payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yields_data_payloads_and_skips_other_fields() {
        let mut buffer = SseLineBuffer::default();
        let payloads =
            buffer.push(b": keep-alive\nevent: message\ndata: {\"a\":1}\n\ndata: [DONE]\n\n");
        assert_eq!(payloads, ["{\"a\":1}", DONE]);
    }

    #[test]
    fn test_reassembles_lines_split_across_chunks() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(b"data: {\"text\":\"caf").is_empty());
        assert!(buffer.push(&[0xC3]).is_empty());
        let payloads = buffer.push(&[0xA9, b'"', b'}', b'\r', b'\n']);
        assert_eq!(payloads, ["{\"text\":\"café\"}"]);
    }
}
