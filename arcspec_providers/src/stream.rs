//! Accumulation of `chat/completions` server-sent events into one reply.

use std::fmt::Display;
use std::pin::pin;

use arcspec_core::ParserError;
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tracing::debug;

const DONE_MARKER: &str = "[DONE]";

/// Drain an SSE byte stream, feeding every content fragment to `on_chunk` and
/// returning the concatenated text.
///
/// `[DONE]` ends the stream early. Empty or unparsable events are skipped; an event
/// carrying an `error` object aborts with [`ParserError::Stream`].
pub async fn accumulate_sse<S, B, E>(
    stream: S,
    mut on_chunk: impl FnMut(&str),
) -> Result<String, ParserError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut events = pin!(stream.eventsource());
    let mut reply = String::new();

    while let Some(event) = events.next().await {
        let event = event.map_err(|e| ParserError::Stream(e.to_string()))?;
        let data = event.data.trim();
        if data.is_empty() {
            continue;
        }
        if data == DONE_MARKER {
            break;
        }

        let payload: Value = match serde_json::from_str(data) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Skipping unparsable stream event: {e}");
                continue;
            }
        };

        if let Some(error) = payload.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| error.to_string(), str::to_string);
            return Err(ParserError::Stream(message));
        }

        if let Some(fragment) = payload["choices"][0]["delta"]["content"].as_str() {
            if !fragment.is_empty() {
                on_chunk(fragment);
                reply.push_str(fragment);
            }
        }
    }

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    type Chunks = stream::Iter<std::vec::IntoIter<Result<&'static [u8], String>>>;

    fn chunks(parts: &[&'static str]) -> Chunks {
        let items: Vec<Result<&'static [u8], String>> =
            parts.iter().copied().map(|p| Ok(p.as_bytes())).collect();
        stream::iter(items)
    }

    #[tokio::test]
    async fn joins_fragments_until_done() {
        let body = chunks(&[
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"del",
            "ta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        ]);

        let mut seen = Vec::new();
        let reply = accumulate_sse(body, |c| seen.push(c.to_string()))
            .await
            .unwrap();

        assert_eq!(reply, "Hello");
        assert_eq!(seen, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn skips_garbage_events() {
        let body = chunks(&[
            ": keep-alive\n\n",
            "data: not json\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
        ]);
        let reply = accumulate_sse(body, |_| {}).await.unwrap();
        assert_eq!(reply, "ok");
    }

    #[tokio::test]
    async fn error_event_aborts() {
        let body = chunks(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"par\"}}]}\n\n",
            "data: {\"error\":{\"message\":\"rate limited\"}}\n\n",
        ]);
        let err = accumulate_sse(body, |_| {}).await.unwrap_err();
        assert!(matches!(err, ParserError::Stream(ref m) if m == "rate limited"));
    }

    #[tokio::test]
    async fn transport_error_is_a_stream_error() {
        let items: Vec<Result<&'static [u8], String>> = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n"),
            Err("connection reset".to_string()),
        ];
        let err = accumulate_sse(stream::iter(items), |_| {}).await.unwrap_err();
        assert!(matches!(err, ParserError::Stream(_)));
    }
}
