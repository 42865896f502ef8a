//! Server-sent-event framing (Bytes -> SseEvent).
//!
//! Frames are separated by a blank line. Within a frame, `event:`, `data:` and
//! `id:` fields are collected; `:` comment lines and unknown fields are
//! skipped. Bytes are buffered undecoded until a full frame is available, so a
//! UTF-8 sequence split across network chunks is reassembled intact. A frame
//! that grows past the decoder's limit ends the stream with a protocol error.

use crate::pipeline::Decoder;
use crate::types::SseEvent;
use crate::{BoxStream, Error, ErrorContext, Result};
use bytes::Bytes;
use futures::{stream, StreamExt};

const DEFAULT_EVENT: &str = "message";

/// Largest frame held in memory while waiting for its blank line.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct SseDecoder {
    max_frame_bytes: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_frame_bytes(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// Parse one frame (without its trailing blank line).
    ///
    /// Returns `None` for frames that only contain comments or nothing at all.
    pub fn parse_frame(frame: &str) -> Option<SseEvent> {
        let mut event: Option<String> = None;
        let mut data: Option<String> = None;
        let mut id: Option<String> = None;
        let mut saw_field = false;

        for line in frame.split('\n') {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.find(':') {
                Some(idx) => {
                    let value = &line[idx + 1..];
                    (&line[..idx], value.strip_prefix(' ').unwrap_or(value))
                }
                None => (line, ""),
            };
            match field {
                "event" => {
                    event = Some(value.to_string());
                    saw_field = true;
                }
                "data" => {
                    match data.as_mut() {
                        Some(existing) => {
                            existing.push('\n');
                            existing.push_str(value);
                        }
                        None => data = Some(value.to_string()),
                    }
                    saw_field = true;
                }
                "id" => {
                    id = Some(value.to_string());
                    saw_field = true;
                }
                // `retry:` and unknown fields carry nothing we act on.
                _ => {}
            }
        }

        if !saw_field {
            return None;
        }
        Some(SseEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
            id,
        })
    }
}

fn find_frame_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

/// Append `chunk` with CRLF and lone CR line endings turned into LF.
///
/// `after_cr` carries a trailing CR across chunk boundaries so a CRLF split
/// between two chunks still yields a single LF.
fn push_normalized(buf: &mut Vec<u8>, chunk: &[u8], after_cr: &mut bool) {
    buf.reserve(chunk.len());
    for &b in chunk {
        match b {
            b'\r' => {
                buf.push(b'\n');
                *after_cr = true;
            }
            b'\n' if *after_cr => *after_cr = false,
            _ => {
                buf.push(b);
                *after_cr = false;
            }
        }
    }
}

fn frame_too_large(limit: usize, buffered: usize) -> Error {
    Error::protocol_with_context(
        "Stream frame exceeds the maximum frame size",
        ErrorContext::new()
            .with_field_path("max_frame_bytes")
            .with_details(format!("{} bytes buffered, limit {}", buffered, limit))
            .with_source("sse_decoder"),
    )
}

#[async_trait::async_trait]
impl Decoder for SseDecoder {
    async fn decode_stream(
        &self,
        input: BoxStream<'static, Bytes>,
    ) -> Result<BoxStream<'static, SseEvent>> {
        let limit = self.max_frame_bytes;
        // Incrementally buffer bytes and emit full frames split by blank lines.
        let stream = stream::unfold(
            (input, Vec::<u8>::new(), false, false),
            move |(mut input, mut buf, mut after_cr, finished)| async move {
                if finished {
                    return None;
                }
                loop {
                    if let Some(idx) = find_frame_end(&buf) {
                        let frame: Vec<u8> = buf.drain(..idx + 2).collect();
                        let text = String::from_utf8_lossy(&frame[..idx]);
                        if let Some(event) = SseDecoder::parse_frame(&text) {
                            return Some((Ok(event), (input, buf, after_cr, false)));
                        }
                        continue;
                    }

                    if buf.len() > limit {
                        let err = frame_too_large(limit, buf.len());
                        return Some((Err(err), (input, Vec::new(), after_cr, true)));
                    }

                    // Need more data.
                    match input.next().await {
                        Some(Ok(bytes)) => {
                            push_normalized(&mut buf, &bytes, &mut after_cr);
                            continue;
                        }
                        Some(Err(e)) => {
                            // A broken connection ends the stream after reporting the error.
                            return Some((Err(e), (input, buf, after_cr, true)));
                        }
                        None => {
                            // EOF: a final frame may lack its blank line.
                            let text = String::from_utf8_lossy(&buf).into_owned();
                            return SseDecoder::parse_frame(text.trim_end_matches('\n'))
                                .map(|event| (Ok(event), (input, Vec::new(), after_cr, true)));
                        }
                    }
                }
            },
        );

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use crate::Error;

    fn chunks(parts: Vec<&'static [u8]>) -> BoxStream<'static, Bytes> {
        Box::pin(stream::iter(
            parts.into_iter().map(|p| Ok(Bytes::from_static(p))),
        ))
    }

    async fn decode(parts: Vec<&'static [u8]>) -> Vec<Result<SseEvent>> {
        SseDecoder::new()
            .decode_stream(chunks(parts))
            .await
            .unwrap()
            .collect()
            .await
    }

    #[tokio::test]
    async fn frames_split_across_chunks() {
        let events = decode(vec![
            &b"event: out"[..],
            &b"put\nid: 1\ndata: hel"[..],
            &b"lo\n\nevent: done\ndata: {}\n"[..],
            &b"\n"[..],
        ])
        .await;

        let events: Vec<SseEvent> = events.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "output");
        assert_eq!(events[0].data.as_deref(), Some("hello"));
        assert_eq!(events[0].id.as_deref(), Some("1"));
        assert_eq!(events[1].event, "done");
    }

    #[tokio::test]
    async fn multi_line_data_comments_and_crlf() {
        let events = decode(vec![
            &b": keep-alive\r\n\r\n"[..],
            &b"event: output\r\ndata: line one\r\ndata: line two\r\n\r\n"[..],
            &b"data: no event name\n\n"[..],
        ])
        .await;

        let events: Vec<SseEvent> = events.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data.as_deref(), Some("line one\nline two"));
        assert_eq!(events[1].event, "message");
    }

    #[tokio::test]
    async fn utf8_split_inside_a_character() {
        // "é" is 0xC3 0xA9
        let events = decode(vec![&b"event: output\ndata: caf\xC3"[..], &b"\xA9\n\n"[..]]).await;
        assert_eq!(events[0].as_ref().unwrap().data.as_deref(), Some("café"));
    }

    #[tokio::test]
    async fn trailing_frame_without_blank_line() {
        let events = decode(vec![&b"event: done\ndata: {}"[..]]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().event, "done");
    }

    #[tokio::test]
    async fn lone_carriage_returns_end_lines() {
        let events = decode(vec![
            &b"event: output\rdata: one\r\r"[..],
            &b"event: output\r"[..],
            &b"\ndata: two\r\n\r\n"[..],
        ])
        .await;

        let events: Vec<SseEvent> = events.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "output");
        assert_eq!(events[0].data.as_deref(), Some("one"));
        assert_eq!(events[1].event, "output");
        assert_eq!(events[1].data.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected_without_buffering_the_rest() {
        let megabyte = Bytes::from(vec![b'x'; 1024 * 1024]);
        let mut parts: Vec<Result<Bytes>> = vec![Ok(Bytes::from_static(b"event: output\ndata: "))];
        parts.extend((0..64).map(|_| Ok(megabyte.clone())));
        let input: BoxStream<'static, Bytes> = Box::pin(stream::iter(parts));

        let events: Vec<_> = SseDecoder::with_max_frame_bytes(4 * 1024 * 1024)
            .decode_stream(input)
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        let err = events[0].as_ref().unwrap_err();
        assert!(err.is_protocol());
        assert!(err.to_string().contains("maximum frame size"));
    }

    #[tokio::test]
    async fn frames_under_the_limit_pass() {
        let input: BoxStream<'static, Bytes> = Box::pin(stream::iter(vec![Ok::<_, Error>(
            Bytes::from_static(b"event: output\ndata: 0123456789\n\nevent: done\n\n"),
        )]));
        let events: Vec<_> = SseDecoder::with_max_frame_bytes(32)
            .decode_stream(input)
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.is_ok()));
    }

    #[tokio::test]
    async fn transport_error_ends_the_stream() {
        let input: BoxStream<'static, Bytes> = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"event: output\ndata: a\n\n")),
            Err(Error::Transport(TransportError::Other("reset".into()))),
            Ok(Bytes::from_static(b"event: output\ndata: b\n\n")),
        ]));
        let events: Vec<_> = SseDecoder::new()
            .decode_stream(input)
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(events[1].as_ref().unwrap_err().is_transport());
    }
}
