//! Data-stream decoding for streamed chat replies.
//!
//! This module converts the raw byte stream of a chat response into structured
//! [`StreamEvent`] objects. The wire format is newline-delimited parts of the
//! form `<code>:<json>`, where `0:` carries a content delta (a JSON string),
//! `2:` carries a structured data part, `3:` carries an in-band error, and
//! `d:` is the terminal finish part. The endpoint may also simply close the
//! body after the last delta; end of stream is treated as terminal.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::{Error, Result, StreamEvent};

/// Process a stream of bytes into a stream of chat events.
///
/// This function takes a byte stream from an HTTP response and converts it
/// into a stream of parsed StreamEvent objects, handling part framing,
/// buffering, and error conditions.
pub fn process_data_stream<S>(byte_stream: S) -> impl Stream<Item = Result<StreamEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    // Use a state machine to process the framed stream
    let buffer = String::new();

    stream::unfold(
        (stream, buffer),
        move |(mut stream, mut buffer)| async move {
            loop {
                // First check if we have a complete part in the buffer
                if let Some((event, remaining)) = extract_part(&buffer) {
                    buffer = remaining;
                    return Some((event, (stream, buffer)));
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => buffer.push_str(&text),
                        Err(e) => {
                            return Some((
                                Err(Error::encoding(
                                    format!("Invalid UTF-8 in stream: {e}"),
                                    Some(Box::new(e)),
                                )),
                                (stream, buffer),
                            ));
                        }
                    },
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, buffer)));
                    }
                    None => {
                        // End of stream; a final part may lack its newline
                        let leftover = buffer.trim();
                        if !leftover.is_empty() {
                            let event = parse_part(leftover);
                            return Some((event, (stream, String::new())));
                        }
                        return None;
                    }
                }
            }
        },
    )
}

/// Extract a complete part from a buffer string.
///
/// Parts are newline-delimited; blank lines between parts are skipped.
/// Returns `None` until a full line is buffered.
fn extract_part(buffer: &str) -> Option<(Result<StreamEvent>, String)> {
    let mut remaining = buffer;
    loop {
        let (line, rest) = remaining.split_once('\n')?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            remaining = rest;
            continue;
        }
        return Some((parse_part(line), rest.to_string()));
    }
}

/// Parse a single `<code>:<json>` part.
fn parse_part(line: &str) -> Result<StreamEvent> {
    let Some((code, data)) = line.split_once(':') else {
        return Err(Error::serialization(
            format!("Malformed stream part: missing ':' separator in '{line}'"),
            None,
        ));
    };

    match code {
        "0" => match serde_json::from_str::<String>(data) {
            Ok(text) => Ok(StreamEvent::TextDelta(text)),
            Err(e) => Err(Error::serialization(
                format!("Failed to parse text delta: {e}"),
                Some(Box::new(e)),
            )),
        },

        "2" => match serde_json::from_str::<serde_json::Value>(data) {
            Ok(value) => Ok(StreamEvent::Data(value)),
            Err(e) => Err(Error::serialization(
                format!("Failed to parse data part: {e}"),
                Some(Box::new(e)),
            )),
        },

        "3" => match serde_json::from_str::<String>(data) {
            Ok(message) => Ok(StreamEvent::Error(message)),
            Err(e) => Err(Error::serialization(
                format!("Failed to parse error part: {e}"),
                Some(Box::new(e)),
            )),
        },

        "d" => {
            // The finish payload (stop reason, usage) is advisory; validate
            // that it is JSON but otherwise discard it.
            if data.trim().is_empty() {
                return Ok(StreamEvent::Finish);
            }
            match serde_json::from_str::<serde_json::Value>(data) {
                Ok(_) => Ok(StreamEvent::Finish),
                Err(e) => Err(Error::serialization(
                    format!("Failed to parse finish part: {e}"),
                    Some(Box::new(e)),
                )),
            }
        }

        _ => Err(Error::serialization(
            format!("Unknown stream part code: {code}"),
            None,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn parse_text_delta() {
        let data = b"0:\"Hello\"\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut event_stream = Box::pin(process_data_stream(stream));
        let event = event_stream.next().await.unwrap();

        assert_eq!(event.unwrap(), StreamEvent::TextDelta("Hello".to_string()));
        assert!(event_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn parse_multiple_parts_in_one_chunk() {
        let data = b"0:\"Hi \"\n0:\"there\"\nd:{\"finishReason\":\"stop\"}\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut event_stream = Box::pin(process_data_stream(stream));

        assert_eq!(
            event_stream.next().await.unwrap().unwrap(),
            StreamEvent::TextDelta("Hi ".to_string())
        );
        assert_eq!(
            event_stream.next().await.unwrap().unwrap(),
            StreamEvent::TextDelta("there".to_string())
        );
        assert_eq!(
            event_stream.next().await.unwrap().unwrap(),
            StreamEvent::Finish
        );
    }

    #[tokio::test]
    async fn handle_part_split_across_chunks() {
        let chunk1 = b"0:\"Hel";
        let chunk2 = b"lo\"\n";

        let stream = Box::pin(stream::iter(vec![
            Ok(Bytes::from(&chunk1[..])),
            Ok(Bytes::from(&chunk2[..])),
        ]));

        let mut event_stream = Box::pin(process_data_stream(stream));
        let event = event_stream.next().await.unwrap();

        assert_eq!(event.unwrap(), StreamEvent::TextDelta("Hello".to_string()));
    }

    #[tokio::test]
    async fn handle_final_part_without_newline() {
        let data = b"0:\"done\"";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut event_stream = Box::pin(process_data_stream(stream));
        let event = event_stream.next().await.unwrap();

        assert_eq!(event.unwrap(), StreamEvent::TextDelta("done".to_string()));
    }

    #[tokio::test]
    async fn handle_malformed_part() {
        let data = b"malformed data without a separator\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut event_stream = Box::pin(process_data_stream(stream));
        let event = event_stream.next().await.unwrap();

        assert!(event.is_err());
    }

    #[tokio::test]
    async fn handle_unknown_part_code() {
        let data = b"9:{\"toolCallId\":\"x\"}\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut event_stream = Box::pin(process_data_stream(stream));
        let event = event_stream.next().await.unwrap();

        assert!(event.is_err());
        if let Err(e) = event {
            assert!(e.to_string().contains("Unknown stream part code"));
        }
    }

    #[tokio::test]
    async fn parse_error_part() {
        let data = b"3:\"boom\"\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut event_stream = Box::pin(process_data_stream(stream));
        let event = event_stream.next().await.unwrap();

        assert_eq!(event.unwrap(), StreamEvent::Error("boom".to_string()));
    }

    #[tokio::test]
    async fn skip_blank_lines_between_parts() {
        let data = b"0:\"a\"\n\r\n\n0:\"b\"\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut event_stream = Box::pin(process_data_stream(stream));

        assert_eq!(
            event_stream.next().await.unwrap().unwrap(),
            StreamEvent::TextDelta("a".to_string())
        );
        assert_eq!(
            event_stream.next().await.unwrap().unwrap(),
            StreamEvent::TextDelta("b".to_string())
        );
        assert!(event_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn delta_with_embedded_newline() {
        let data = b"0:\"line one\\nline two\"\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut event_stream = Box::pin(process_data_stream(stream));
        let event = event_stream.next().await.unwrap();

        assert_eq!(
            event.unwrap(),
            StreamEvent::TextDelta("line one\nline two".to_string())
        );
    }
}
