use super::Chunks;

#[derive(Debug)]
pub enum Error {
    Transport(reqwest::Error),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field is surfaced. Comments (used by the service as
/// keep-alives while a request is queued) and other fields are skipped.
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

    /// Returns the data of the next event, or `None` at the end of the
    /// stream. Trailing bytes without an event terminator are dropped.
    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::Transport)?
            else {
                return Ok(None);
            };
            // Only line feeds are treated as line endings, so carriage
            // returns are dropped before they reach the buffer.
            self.buf
                .extend(bytes.iter().copied().filter(|&b| b != b'\r'));
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        // Bytes are buffered instead of text, since a chunk boundary may
        // split a multi-byte character.
        while let Some(eol_idx) =
            self.buf.windows(2).position(|w| w == b"\n\n")
        {
            let block: Vec<u8> = self.buf.drain(0..eol_idx + 2).collect();
            let Ok(block) = str::from_utf8(&block[..eol_idx]) else {
                return Err(Error::InvalidPayload);
            };
            if let Some(data) = parse_block(block)? {
                return Ok(Some(data));
            }
        }
        Ok(None)
    }
}

// event = *( comment / field ) end-of-line
// field = 1*name-char [ colon [ space ] *any-char ] end-of-line
fn parse_block(block: &str) -> Result<Option<String>, Error> {
    let mut data: Option<String> = None;
    for line in block.split('\n') {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(Error::InvalidPayload);
        };
        if name != "data" {
            continue;
        }
        let value = value.strip_prefix(' ').unwrap_or(value);
        match &mut data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => data = Some(value.to_owned()),
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn sse_of(chunks: &[&'static [u8]]) -> Sse {
        let chunks = chunks
            .iter()
            .map(|&chunk| Bytes::from_static(chunk))
            .collect();
        Sse::new(Chunks::from_vec_deque(chunks))
    }

    #[tokio::test]
    async fn test_normal_events() {
        let mut sse = sse_of(&[b"data: hello\n\n", b"data: bye\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_across_chunks() {
        let mut sse = sse_of(&[b"data:", b" hello\n", b"\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap(), None);

        // "你" is three bytes long.
        let mut sse = sse_of(&[b"data: \xe4\xbd", b"\xa0\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "你");
    }

    #[tokio::test]
    async fn test_keep_alive_and_fields() {
        let mut sse = sse_of(&[
            b": keep-alive\n\n",
            b"event: message\nid: 7\ndata:{\"a\":1}\n\n",
            b"data: line one\ndata: line two\n\n",
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "{\"a\":1}");
        assert_eq!(
            sse.next_event().await.unwrap().unwrap(),
            "line one\nline two"
        );
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_crlf_line_endings() {
        let mut sse =
            sse_of(&[b"data: hello\r\n\r", b"\ndata: [DONE]\r\n\r\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "[DONE]");
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let mut sse = sse_of(&[b"xxxxxx\n\n"]);
        assert!(matches!(
            sse.next_event().await,
            Err(Error::InvalidPayload)
        ));

        let mut sse = sse_of(&[b"data: \xff\n\n"]);
        assert!(matches!(
            sse.next_event().await,
            Err(Error::InvalidPayload)
        ));

        let mut sse = sse_of(&[b"xxxxxx\n"]);
        assert_eq!(sse.next_event().await.unwrap(), None);

        let mut sse = sse_of(&[b"data: hello\n", b"data: bye\n"]);
        assert_eq!(sse.next_event().await.unwrap(), None);
    }
}
