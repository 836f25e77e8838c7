/// Incremental splitter for newline-delimited stream bodies.
///
/// Holds the unterminated suffix of the latest chunk and re-splits after each
/// append. Buffering is byte-based, so a UTF-8 sequence cut by a transport
/// boundary is only decoded once its line is complete.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    /// Appends a chunk and returns every newly completed, non-blank frame.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buf[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(frame) = non_blank_frame(&self.buf[start..end]) {
                frames.push(frame);
            }
            start = end + 1;
        }
        self.buf.drain(..start);
        frames
    }

    /// Consumes the framer and returns the unterminated residual, if any.
    ///
    /// A residual that is empty or whitespace only yields `None`.
    pub fn finish(self) -> Option<String> {
        non_blank_frame(&self.buf)
    }

    /// True when no partial frame is buffered.
    pub fn is_empty_buffer(&self) -> bool {
        self.buf.is_empty()
    }

    /// Splits a complete body in one pass, including the trailing residual.
    pub fn frames(body: &str) -> Vec<String> {
        let mut framer = Self::default();
        let mut frames = framer.push(body.as_bytes());
        frames.extend(framer.finish());
        frames
    }
}

fn non_blank_frame(bytes: &[u8]) -> Option<String> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    Some(String::from_utf8_lossy(bytes).into_owned())
}
