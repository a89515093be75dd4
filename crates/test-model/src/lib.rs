//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use chat_relay_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
}

impl From<&PresetError> for Error {
    fn from(preset: &PresetError) -> Self {
        Self {
            message: preset.message.clone(),
            kind: preset
                .status
                .map(ErrorKind::from_status)
                .unwrap_or(ErrorKind::Other),
            status: preset.status,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn status(&self) -> Option<u16> {
        self.status
    }
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if this.event_idx < this.events.len() {
                let idx = this.event_idx;
                this.event_idx += 1;
                return match &this.events[idx] {
                    PresetEvent::MessageDelta(msg) => Poll::Ready(Ok(Some(
                        ModelResponseEvent::MessageDelta(msg.clone()),
                    ))),
                    PresetEvent::Error(err) => {
                        // Nothing is produced after a failure.
                        this.event_idx = usize::MAX;
                        Poll::Ready(Err(err.into()))
                    }
                };
            } else if this.event_idx == this.events.len() {
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    ModelFinishReason::Stop,
                ))));
            } else {
                // In case this method is called after completion.
                return Poll::Ready(Ok(None));
            }
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

/// A local fake model for testing purpose.
///
/// Every request is answered with the same [`PresetResponse`]. The provider
/// also counts the requests it receives and remembers the last one, so that
/// tests can assert whether (and how) the upstream was called.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    response: PresetResponse,
    delay: Option<Duration>,
    request_count: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<ModelRequest>>>,
}

impl TestModelProvider {
    #[inline]
    pub fn with_response(response: PresetResponse) -> Self {
        Self {
            response,
            ..Default::default()
        }
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns how many requests, streaming or not, reached the provider.
    #[inline]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Returns the last request received by the provider.
    pub fn last_request(&self) -> Option<ModelRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    fn record(&self, req: &ModelRequest) {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(req.clone());
        }
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn complete(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        self.record(req);
        ready(self.response.full_text().map_err(Error::from))
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        self.record(req);
        let result = match &self.response.rejection {
            Some(rejection) => Err(Error::from(rejection)),
            None => Ok(TestModelResponse {
                events: self.response.events.clone(),
                event_idx: 0,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            }),
        };
        ready(result)
    }
}
