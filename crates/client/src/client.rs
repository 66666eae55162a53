use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use weave_query::{to_ndjson, AnswerRequest, SearchRequest};

use crate::error::{Result, StreamError};
use crate::frame::{classify, FrameDecoder, FrameEvent};
use crate::session::StreamEvent;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Connection configuration for one remote search/answer service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Caller-supplied headers (auth and the like), merged into every
    /// request after the defaults so caller values win on collision.
    pub headers: Vec<(String, String)>,
    /// Path of the streaming answer resource under `base_url`.
    pub resource: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: Vec::new(),
            resource: "answer".to_string(),
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), resource)
    }

    /// Request headers: defaults first, then caller headers inserted on top
    /// so a colliding name carries exactly the caller's value, never both.
    fn request_headers(&self, content_type: &'static str, accept_stream: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        if accept_stream {
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        }
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => log::warn!("skipping invalid header '{name}'"),
            }
        }
        headers
    }
}

/// Client for the streaming answer endpoint and its non-streaming sibling.
#[derive(Debug, Clone)]
pub struct StreamClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl StreamClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Execute one request/response cycle against the streaming endpoint.
    ///
    /// The exchange runs in a spawned task; the returned handle yields
    /// [`StreamEvent`]s in frame-arrival order and exposes cooperative
    /// cancellation. Every failure path ends in a single terminal event,
    /// never a panic.
    pub fn open(&self, request: &AnswerRequest) -> StreamHandle {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_stream(
            self.http.clone(),
            self.config.clone(),
            request.clone(),
            tx,
            cancel.clone(),
        ));
        StreamHandle {
            events: rx,
            cancel,
            task,
        }
    }

    /// Single-attempt non-streaming search: newline-delimited JSON request
    /// lines in, JSON array out. No retry on any failure.
    pub async fn search(&self, requests: &[SearchRequest]) -> Result<Vec<serde_json::Value>> {
        let body = to_ndjson(requests)?;
        let builder = self
            .http
            .post(self.config.endpoint("query"))
            .headers(self.config.request_headers("application/x-ndjson", false));

        let response = builder.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = drain_body(response).await;
            return Err(StreamError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

/// Handle to one in-flight streaming session.
pub struct StreamHandle {
    events: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl StreamHandle {
    /// Next event, or `None` once the session is over or aborted. After
    /// [`StreamHandle::abort`] no event is ever returned, even if frames
    /// were already buffered.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.events.recv().await
    }

    /// Request cooperative cancellation. A read already in progress
    /// completes, but nothing is delivered afterward.
    pub fn abort(&self) {
        if !self.cancel.is_cancelled() {
            log::debug!("stream session aborted by consumer");
            self.cancel.cancel();
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the reader task has wound down.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_stream(
    http: reqwest::Client,
    config: ClientConfig,
    request: AnswerRequest,
    tx: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
) {
    if let Err(err) = read_stream(&http, &config, &request, &tx, &cancel).await {
        emit(&tx, &cancel, StreamEvent::Failed(err.to_string())).await;
    }
}

/// Drive one streaming exchange. Terminal events for in-stream conditions
/// are emitted here; transport-level failures are returned and turned into
/// the terminal event by the caller, so exactly one terminal event fires.
async fn read_stream(
    http: &reqwest::Client,
    config: &ClientConfig,
    request: &AnswerRequest,
    tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
) -> Result<()> {
    // Body is serialized by hand so caller headers stay the last word on
    // every header, content type included.
    let body = serde_json::to_vec(request)?;
    let builder = http
        .post(config.endpoint(&config.resource))
        .headers(config.request_headers("application/json", true))
        .body(body);

    let response = tokio::select! {
        _ = cancel.cancelled() => return Ok(()),
        response = builder.send() => response?,
    };

    let status = response.status();
    if !status.is_success() {
        // Drain the body for diagnostics instead of reporting a bare status.
        let body = drain_body(response).await;
        return Err(StreamError::Status {
            status: status.as_u16(),
            body,
        });
    }
    if response.content_length() == Some(0) {
        // A fixed zero-length body is no stream at all, as opposed to a
        // present-but-empty stream that closes gracefully.
        return Err(StreamError::MissingBody);
    }

    let mut body = response.bytes_stream();
    let mut decoder = FrameDecoder::new();
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            next = body.next() => next,
        };
        let Some(read) = next else {
            // Graceful close without a sentinel: drop any partial frame,
            // then complete.
            decoder.finish();
            emit(tx, cancel, StreamEvent::Completed).await;
            return Ok(());
        };
        let bytes = read?;
        for payload in decoder.push(&bytes) {
            match classify(&payload) {
                FrameEvent::Chunk(fragment) => {
                    if !emit(tx, cancel, StreamEvent::Chunk(fragment)).await {
                        return Ok(());
                    }
                }
                FrameEvent::Done => {
                    emit(tx, cancel, StreamEvent::Completed).await;
                    return Ok(());
                }
                FrameEvent::Error(message) => {
                    emit(tx, cancel, StreamEvent::Failed(message)).await;
                    return Ok(());
                }
                FrameEvent::Malformed => {
                    log::warn!("ignoring malformed frame payload: {payload}");
                }
            }
        }
    }
}

async fn drain_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|err| format!("(unreadable body: {err})"))
}

/// Deliver an event unless cancellation was requested or the consumer is
/// gone. Returns whether the session should keep going.
async fn emit(
    tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
    event: StreamEvent,
) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        sent = tx.send(event) => sent.is_ok(),
    }
}
