use std::pin::Pin;
use std::task::{Context, Poll, ready};

use chat_relay_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::{Sse, SseError};
use crate::proto::ChatCompletionChunk;

struct PartialState {
    sse: Sse,
    id: Option<String>,
    content_len: usize,
    // Set once `[DONE]` is seen or the body ends.
    drained: bool,
    // This field will be cleared after the response returns the complete event.
    pending_finish_reason: Option<ModelFinishReason>,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct HfResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl HfResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            id: None,
            content_len: 0,
            drained: false,
            pending_finish_reason: None,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for HfResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, partial_state)) => {
                    debug!(
                        "response {:?} finished with {} bytes of content",
                        partial_state.id, partial_state.content_len
                    );
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    while !partial_state.drained {
        let sse_event = match partial_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                partial_state.drained = true;
                break;
            }
            Err(SseError::ChunksError(err)) => {
                return Err(Error::new(err.message, ErrorKind::Network));
            }
            Err(SseError::InvalidPayload) => {
                return Err(Error::new(
                    "invalid event stream payload",
                    ErrorKind::InvalidResponse,
                ));
            }
        };
        trace!("got sse event: {sse_event}");
        if sse_event == "[DONE]" {
            partial_state.drained = true;
            break;
        }

        let mut chunk = serde_json::from_str::<ChatCompletionChunk>(&sse_event)
            .map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::InvalidResponse)
            })?;
        if let Some(chunk_id) = chunk.id.take() {
            if partial_state.id.get_or_insert_with(|| chunk_id.clone())
                != &chunk_id
            {
                return Err(Error::new(
                    "chunk id mismatch",
                    ErrorKind::InvalidResponse,
                ));
            }
        }

        // Usage-only chunks come without choices.
        let Some(choice) = chunk.choices.pop() else {
            continue;
        };

        if let Some(finish_reason) = choice.finish_reason {
            partial_state.pending_finish_reason =
                Some(if finish_reason == "length" {
                    ModelFinishReason::Length
                } else {
                    ModelFinishReason::Stop
                });
        }

        if let Some(content) = choice.delta.content {
            if !content.is_empty() {
                partial_state.content_len += content.len();
                return Ok((
                    Some(ModelResponseEvent::MessageDelta(content)),
                    partial_state,
                ));
            }
        }
    }

    // The order of events is important. All message deltas are emitted
    // before the finish reason, which is reported once the body is drained.
    if let Some(finish_reason) = partial_state.pending_finish_reason.take() {
        return Ok((
            Some(ModelResponseEvent::Completed(finish_reason)),
            partial_state,
        ));
    }

    Ok((None, partial_state))
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;

    use super::*;
    use crate::io::{Chunks, ChunksError};

    async fn collect(
        chunks: Chunks,
    ) -> (Vec<String>, Option<ModelFinishReason>, Option<Error>) {
        let mut resp = pin!(HfResponse::from_sse(Sse::new(chunks)));
        let mut deltas = Vec::new();
        let mut finish_reason = None;
        loop {
            match poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await {
                Ok(Some(ModelResponseEvent::MessageDelta(delta))) => {
                    deltas.push(delta);
                }
                Ok(Some(ModelResponseEvent::Completed(reason))) => {
                    assert!(finish_reason.is_none());
                    finish_reason = Some(reason);
                }
                Ok(None) => return (deltas, finish_reason, None),
                Err(err) => return (deltas, finish_reason, Some(err)),
            }
        }
    }

    #[tokio::test]
    async fn test_simple_events() {
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(include_bytes!(
                "../fixtures/test_response.txt"
            ))]
            .into(),
        );
        let (deltas, finish_reason, err) = collect(chunks).await;
        assert!(err.is_none());
        assert_eq!(deltas.concat(), "안녕하세요! 무엇을 도와드릴까요?");
        assert_eq!(finish_reason, Some(ModelFinishReason::Stop));
    }

    #[tokio::test]
    async fn test_body_ends_without_done() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(
                    br#"data: {"id":"a","choices":[{"delta":{"content":"Hi"},"finish_reason":null}]}

"#,
                ),
                Bytes::from_static(
                    br#"data: {"id":"a","choices":[{"delta":{"content":""},"finish_reason":"length"}]}

"#,
                ),
            ]
            .into(),
        );
        let (deltas, finish_reason, err) = collect(chunks).await;
        assert!(err.is_none());
        assert_eq!(deltas, vec!["Hi".to_owned()]);
        assert_eq!(finish_reason, Some(ModelFinishReason::Length));
    }

    #[tokio::test]
    async fn test_broken_connection() {
        let chunks = Chunks::from_results(
            vec![
                Ok(Bytes::from_static(
                    br#"data: {"id":"a","choices":[{"delta":{"content":"Hi"},"finish_reason":null}]}

"#,
                )),
                Err(ChunksError {
                    message: "connection closed before message completed"
                        .to_owned(),
                }),
            ]
            .into(),
        );
        let (deltas, finish_reason, err) = collect(chunks).await;
        assert_eq!(deltas, vec!["Hi".to_owned()]);
        assert!(finish_reason.is_none());
        let err = err.unwrap();
        assert_eq!(err.kind, ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_malformed_chunk() {
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(b"data: {oops\n\n")].into(),
        );
        let (_, _, err) = collect(chunks).await;
        assert_eq!(err.unwrap().kind, ErrorKind::InvalidResponse);
    }
}
