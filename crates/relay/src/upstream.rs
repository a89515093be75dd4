use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;

use chat_relay_model::{
    ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
    ModelResponseEvent,
};
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream};
use tracing::Instrument;

/// A type-erased provider error.
pub type UpstreamError = Box<dyn ModelProviderError>;

/// The text fragments of one streamed completion, in arrival order.
///
/// The stream ends after the first error.
pub type FragmentStream = BoxStream<'static, Result<String, UpstreamError>>;

#[rustfmt::skip]
type CompleteFn = Arc<
    dyn Fn(ModelRequest) -> BoxFuture<'static, Result<String, UpstreamError>>
        + Send + Sync
>;
#[rustfmt::skip]
type StreamFn = Arc<
    dyn Fn(ModelRequest) -> BoxFuture<'static, Result<FragmentStream, UpstreamError>>
        + Send + Sync
>;

/// A wrapper around a model provider that provides a type-erased interface
/// for the relay.
#[derive(Clone)]
pub struct UpstreamClient {
    complete_fn: CompleteFn,
    stream_fn: StreamFn,
}

impl UpstreamClient {
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since the relay is shared as axum
        // state and we don't want a generic parameter there.
        let provider = Arc::new(provider);

        let complete_fn: CompleteFn = {
            let provider = Arc::clone(&provider);
            Arc::new(move |req| {
                let fut = provider.complete(&req);
                Box::pin(
                    async move {
                        trace!("got a request: {req:?}");
                        fut.await.map_err(|err| {
                            error!("got an error: {err:?}");
                            Box::new(err) as UpstreamError
                        })
                    }
                    .instrument(trace_span!("upstream complete")),
                )
            })
        };

        let stream_fn: StreamFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {req:?}");
                    match fut.await {
                        Ok(resp) => Ok(into_fragments::<P>(resp)),
                        Err(err) => {
                            error!("got an error: {err:?}");
                            Err(Box::new(err) as UpstreamError)
                        }
                    }
                }
                .instrument(trace_span!("upstream stream")),
            )
        });

        Self {
            complete_fn,
            stream_fn,
        }
    }

    /// Sends a request and waits for the whole completion text.
    #[inline]
    pub async fn complete(
        &self,
        req: ModelRequest,
    ) -> Result<String, UpstreamError> {
        (self.complete_fn)(req).await
    }

    /// Opens a streamed completion.
    ///
    /// # Cancel safety
    ///
    /// Dropping the returned stream stops pulling from the provider.
    #[inline]
    pub async fn stream(
        &self,
        req: ModelRequest,
    ) -> Result<FragmentStream, UpstreamError> {
        (self.stream_fn)(req).await
    }
}

fn into_fragments<P: ModelProvider + 'static>(
    resp: P::Response,
) -> FragmentStream {
    let resp: Pin<Box<P::Response>> = Box::pin(resp);
    stream::unfold(Some(resp), |resp| async move {
        let mut resp = resp?;
        loop {
            let event_or_err =
                poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await;
            match event_or_err {
                Ok(Some(ModelResponseEvent::MessageDelta(delta))) => {
                    return Some((Ok(delta), Some(resp)));
                }
                Ok(Some(ModelResponseEvent::Completed(reason))) => {
                    trace!("response completed: {reason:?}");
                }
                Ok(None) => {
                    trace!("finished a request");
                    return None;
                }
                Err(err) => {
                    error!("got an error: {err:?}");
                    return Some((Err(Box::new(err) as UpstreamError), None));
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use chat_relay_model::{ErrorKind, ModelMessage};
    use chat_relay_test_model::{
        PresetError, PresetEvent, PresetResponse, TestModelProvider,
    };

    use super::*;

    fn request() -> ModelRequest {
        ModelRequest::new(vec![ModelMessage::User("Hi".to_owned())], 500, 0.7)
    }

    #[tokio::test]
    async fn test_stream() {
        let provider = TestModelProvider::with_response(
            PresetResponse::with_fragments(["How ", "are ", "you?"]),
        );
        let client = UpstreamClient::new(provider.clone());

        for _ in 0..3 {
            let fragments: Vec<_> = client
                .stream(request())
                .await
                .unwrap()
                .map(|fragment| fragment.unwrap())
                .collect()
                .await;
            assert_eq!(fragments, ["How ", "are ", "you?"]);
        }
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_stream_error_ends_stream() {
        let provider =
            TestModelProvider::with_response(PresetResponse::with_events([
                PresetEvent::MessageDelta("How ".to_owned()),
                PresetEvent::Error(PresetError::new("reset by peer")),
            ]));
        let client = UpstreamClient::new(provider);

        let mut fragments = client.stream(request()).await.unwrap();
        assert_eq!(fragments.next().await.unwrap().unwrap(), "How ");
        let err = fragments.next().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "reset by peer");
        assert!(fragments.next().await.is_none());
    }

    #[tokio::test]
    async fn test_complete() {
        let provider = TestModelProvider::with_response(
            PresetResponse::with_fragments(["Hello", "!"]),
        );
        let client = UpstreamClient::new(provider);
        assert_eq!(client.complete(request()).await.unwrap(), "Hello!");
    }

    #[tokio::test]
    async fn test_error_handling() {
        let provider = TestModelProvider::with_response(
            PresetResponse::default().with_rejection(
                PresetError::new("invalid credentials").with_status(401),
            ),
        );
        let client = UpstreamClient::new(provider);

        let Err(err) = client.stream(request()).await else {
            panic!("stream should be rejected");
        };
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.status(), Some(401));

        let err = client.complete(request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
