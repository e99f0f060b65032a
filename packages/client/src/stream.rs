// ABOUTME: Incremental text decoding for streamed response bodies
// ABOUTME: Turns a byte stream into UTF-8 text chunks without splitting characters

use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};

use crate::error::{ClientError, ClientResult};

/// Finite, non-restartable sequence of decoded text chunks
pub type TextStream = BoxStream<'static, ClientResult<String>>;

/// Stateful UTF-8 decoder.
///
/// Bytes of a multi-byte character that straddle a chunk boundary are held
/// back until the rest arrives. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `pending + chunk` as forms complete characters
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // incomplete trailing sequence, wait for more bytes
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush whatever is left once the body ends
    pub fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}

/// Decode a byte stream into text chunks, stopping at the first error
pub fn decode_text_stream<S, E>(bytes: S) -> TextStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ClientError> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut decoder = Utf8ChunkDecoder::new();
        futures::pin_mut!(bytes);

        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    let text = decoder.decode(&chunk);
                    if !text.is_empty() {
                        yield Ok(text);
                    }
                }
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            yield Ok(tail);
        }
    };

    stream.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_split_multibyte_character_is_held_back() {
        let mut decoder = Utf8ChunkDecoder::new();
        let bytes = "café ✓".as_bytes();
        // split inside the 3-byte check mark
        let split = bytes.len() - 1;

        let first = decoder.decode(&bytes[..split]);
        assert_eq!(first, "café ");
        let second = decoder.decode(&bytes[split..]);
        assert_eq!(second, "✓");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_invalid_bytes_become_replacement_characters() {
        let mut decoder = Utf8ChunkDecoder::new();
        let text = decoder.decode(&[b'a', 0xFF, b'b']);
        assert_eq!(text, "a\u{FFFD}b");
    }

    #[test]
    fn test_truncated_tail_is_flushed_lossily() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xE2, 0x9C]), "x");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[tokio::test]
    async fn test_decode_text_stream_yields_in_order() {
        let bytes = "# Título\nbody".as_bytes().to_vec();
        let chunks: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::copy_from_slice(&bytes[..4])),
            Ok(Bytes::copy_from_slice(&bytes[4..])),
        ];

        let decoded: Vec<String> = decode_text_stream(stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;

        assert_eq!(decoded.concat(), "# Título\nbody");
        assert_eq!(decoded[0], "# T");
    }

    #[tokio::test]
    async fn test_decode_text_stream_stops_at_error() {
        let chunks: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(ClientError::Transport("connection reset".to_string())),
            Ok(Bytes::from_static(b"never seen")),
        ];

        let items: Vec<ClientResult<String>> = decode_text_stream(stream::iter(chunks)).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(items[1].as_ref().unwrap_err().is_transport());
    }
}
