use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Chunks(ChunksError),
    InvalidPayload,
}

/// Reads the `data` payloads of server-sent events from a chunk stream.
pub struct Sse {
    buf: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
        }
    }

    /// Returns the next event's data, or `None` once the stream is over.
    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Parse first, a previous read may have buffered several
            // events.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::Chunks)?
            else {
                // Trailing bytes without a blank line are not an event.
                return Ok(None);
            };
            self.buf.extend_from_slice(&bytes);
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        // Only `\n` line endings are handled, with `\r` stripped from
        // lines. Events without any `data` field (comments, keep-alives)
        // are skipped.
        //
        // event = *( comment / field ) end-of-line
        // field = 1*name-char [ colon [ space ] *any-char ] end-of-line
        loop {
            let Some(end) = self.buf.windows(2).position(|w| w == b"\n\n")
            else {
                return Ok(None);
            };
            let raw: Vec<u8> = self.buf.drain(..end + 2).collect();
            let Ok(raw) = String::from_utf8(raw) else {
                return Err(Error::InvalidPayload);
            };

            let mut data: Option<String> = None;
            for line in raw.lines() {
                let line = line.trim_end_matches('\r');
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let (name, value) = match line.split_once(':') {
                    Some((name, value)) => {
                        (name, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                match name {
                    "data" => {
                        let data = data.get_or_insert_default();
                        if !data.is_empty() {
                            data.push('\n');
                        }
                        data.push_str(value);
                    }
                    "event" | "id" | "retry" => {}
                    _ => return Err(Error::InvalidPayload),
                }
            }

            if let Some(data) = data {
                return Ok(Some(data));
            }
        }
    }
}
