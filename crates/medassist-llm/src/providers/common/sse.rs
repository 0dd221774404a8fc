//! SSE body to [`LLMStream`] adapter.

use eventsource_stream::Eventsource;
use futures_util::{future, stream, StreamExt};
use reqwest::Response;

use crate::provider::{LLMError, LLMStream, Result};
use crate::types::LLMChunk;

/// Decodes each SSE event of `response` with `handler` and flattens the chunks.
///
/// The stream ends after the first error, whether it came from the transport
/// or from `handler`; a half-decoded turn is never continued.
pub fn llm_stream_from_sse<H>(response: Response, mut handler: H) -> LLMStream
where
    H: FnMut(&str, &str) -> Result<Vec<LLMChunk>> + Send + 'static,
{
    let stream = response
        .bytes_stream()
        .eventsource()
        .map(move |event| match event {
            Ok(event) => handler(event.event.as_str(), event.data.as_str()),
            Err(error) => Err(LLMError::Transport(error.to_string())),
        })
        .flat_map(|decoded| {
            let items: Vec<Result<LLMChunk>> = match decoded {
                Ok(chunks) => chunks.into_iter().map(Ok).collect(),
                Err(error) => vec![Err(error)],
            };
            stream::iter(items)
        })
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        });

    Box::pin(stream)
}
