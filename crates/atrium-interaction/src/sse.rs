//! `text/event-stream` payload extraction.
//!
//! Event framing is left to `eventsource-stream`; this module keeps only
//! the `data` of each event and drops events that carry none (keep-alive
//! comments, bare `event:` lines).

use eventsource_stream::{EventStreamError, Eventsource};
use futures::stream::{BoxStream, Stream, StreamExt};

/// Adapts a byte stream into a stream of event payloads.
///
/// Transport and decoding errors are yielded once and end the stream.
pub fn data_stream<S, B, E>(bytes: S) -> BoxStream<'static, Result<String, EventStreamError<E>>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Send + 'static,
{
    bytes
        .eventsource()
        .scan(false, |failed, item| {
            if *failed {
                return futures::future::ready(None);
            }
            let item = match item {
                Ok(event) => Some(Ok(event.data)),
                Err(e) => {
                    *failed = true;
                    Some(Err(e))
                }
            };
            futures::future::ready(item)
        })
        .filter(|item| {
            let keep = !matches!(item, Ok(data) if data.trim().is_empty());
            futures::future::ready(keep)
        })
        .boxed()
}
