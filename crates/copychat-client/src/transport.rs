use serde_json::Value;

/// Incremental extractor of complete JSON objects from an arbitrarily chunked
/// byte stream.
///
/// The agent API streams concatenated JSON objects with no framing beyond the
/// objects themselves, so chunk boundaries can land anywhere. The decoder
/// buffers bytes and emits each object as soon as it is syntactically
/// complete, in arrival order.
///
/// Scanning runs over raw bytes: braces, quotes, and backslashes are ASCII
/// and cannot occur inside UTF-8 continuation bytes. Each extracted span is
/// decoded with `from_utf8_lossy`, so invalid bytes degrade to replacement
/// characters instead of aborting the stream.
#[derive(Default)]
pub(crate) struct JsonFrameDecoder {
    buf: Vec<u8>,
}

enum Scan {
    Complete(usize),
    Incomplete,
}

impl JsonFrameDecoder {
    /// Appends a chunk and returns every object completed by it.
    ///
    /// A buffer holding no `{` (or only a partial object) is left untouched
    /// until more data arrives. A balanced span that still fails to parse is
    /// skipped by resynchronizing on the next `{`.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        loop {
            let Some(start) = find_byte(&self.buf, 0, b'{') else {
                break;
            };
            match scan_object(&self.buf, start) {
                Scan::Complete(end) => {
                    let parsed = {
                        let text = String::from_utf8_lossy(&self.buf[start..=end]);
                        serde_json::from_str::<Value>(&text).ok()
                    };
                    match parsed {
                        Some(value) => {
                            frames.push(value);
                            self.buf.drain(..=end);
                            let lead = self
                                .buf
                                .iter()
                                .take_while(|b| b.is_ascii_whitespace())
                                .count();
                            self.buf.drain(..lead);
                        }
                        None => match find_byte(&self.buf, start + 1, b'{') {
                            Some(next) => {
                                self.buf.drain(..next);
                            }
                            None => {
                                self.buf.clear();
                            }
                        },
                    }
                }
                Scan::Incomplete => break,
            }
        }
        frames
    }

    /// Last-resort parse of whatever is left at end of stream.
    ///
    /// Returns the trailing buffer as a single value when it happens to be
    /// valid JSON; discards it silently otherwise.
    pub fn finish(&mut self) -> Option<Value> {
        let text = String::from_utf8_lossy(&self.buf);
        let parsed = match text.trim() {
            "" => None,
            trimmed => serde_json::from_str(trimmed).ok(),
        };
        self.buf.clear();
        parsed
    }
}

fn find_byte(buf: &[u8], from: usize, needle: u8) -> Option<usize> {
    if from >= buf.len() {
        return None;
    }
    buf[from..]
        .iter()
        .position(|&b| b == needle)
        .map(|pos| pos + from)
}

/// Brace-depth scan from `start` (which must index a `{`). Braces inside
/// double-quoted strings are not counted; a backslash escapes the following
/// character.
fn scan_object(buf: &[u8], start: usize) -> Scan {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &byte) in buf.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Scan::Complete(i);
                }
            }
            _ => {}
        }
    }
    Scan::Incomplete
}
