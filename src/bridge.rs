//! Relays runtime streams to HTTP clients.
//!
//! Generate streams go out as raw text. Chat and pull streams go out as
//! Server-Sent Events, always closed by a `data: [DONE]` event; a failure is
//! reported in-band as one `{"error": ...}` event right before it.
//!
//! Event payloads are compact JSON (`{"content":"hi"}`), not the spaced
//! `{"content": "hi"}` form; clients are expected to parse the JSON.

use std::convert::Infallible;

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, Sse},
    },
};
use bytes::Bytes;
use futures_util::{Stream, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{error, warn};

use crate::{
    error::ServiceError,
    upstream::{ChatChunk, GenerateChunk, PullProgress, RuntimeStream},
};

const DONE: &str = "[DONE]";

#[derive(Serialize)]
struct ContentFrame<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct ErrorFrame<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct ProgressFrame {
    status: String,
    completed: Option<u64>,
    total: Option<u64>,
    digest: String,
    message: String,
}

/// A `data:` event carrying `payload` as JSON. Serialization failure is
/// reported as an error event rather than an empty one.
fn json_event<T: Serialize>(payload: &T) -> Event {
    Event::default().json_data(payload).unwrap_or_else(|err| {
        warn!(%err, "failed to encode SSE payload");
        error_event(&ServiceError::Transport(err.to_string()))
    })
}

fn error_event(err: &ServiceError) -> Event {
    let message = err.to_string();
    Event::default()
        .json_data(ErrorFrame { error: &message })
        .unwrap_or_else(|_| Event::default().data(message))
}

fn done_event() -> Event {
    Event::default().data(DONE)
}

fn chat_event(chunk: ChatChunk) -> Option<Event> {
    chunk
        .message
        .filter(|message| !message.content.is_empty())
        .map(|message| {
            json_event(&ContentFrame {
                content: &message.content,
            })
        })
}

fn progress_event(progress: PullProgress) -> Option<Event> {
    Some(json_event(&ProgressFrame {
        status: progress.status,
        completed: progress.completed,
        total: progress.total,
        digest: progress.digest.unwrap_or_default(),
        message: progress.message.unwrap_or_default(),
    }))
}

/// Raw text of each generate chunk. A mid-stream failure is passed through
/// and aborts the response body.
pub fn text_bridge(
    upstream: RuntimeStream<GenerateChunk>,
) -> impl Stream<Item = Result<Bytes, ServiceError>> + Send + 'static {
    upstream
        .map_ok(|chunk| Bytes::from(chunk.response))
        .inspect_err(|err| error!(%err, "generate stream aborted"))
}

/// One event for each chat chunk that carries content.
pub fn chat_bridge(
    upstream: Result<RuntimeStream<ChatChunk>, ServiceError>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    sse_relay(upstream, chat_event, "chat")
}

/// One event for every pull progress update.
pub fn pull_bridge(
    upstream: Result<RuntimeStream<PullProgress>, ServiceError>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    sse_relay(upstream, progress_event, "pull")
}

enum Relay<T> {
    Open(RuntimeStream<T>),
    Failed(ServiceError),
    Closing,
    Closed,
}

fn sse_relay<T: Send + 'static>(
    upstream: Result<RuntimeStream<T>, ServiceError>,
    render: fn(T) -> Option<Event>,
    kind: &'static str,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    let initial = match upstream {
        Ok(stream) => Relay::Open(stream),
        Err(err) => Relay::Failed(err),
    };

    futures_util::stream::unfold(initial, move |state| async move {
        match state {
            Relay::Open(mut stream) => loop {
                match stream.next().await {
                    Some(Ok(item)) => {
                        if let Some(event) = render(item) {
                            return Some((Ok(event), Relay::Open(stream)));
                        }
                    }
                    Some(Err(err)) => {
                        warn!(%err, kind, "upstream stream failed");
                        return Some((Ok(error_event(&err)), Relay::Closing));
                    }
                    None => return Some((Ok(done_event()), Relay::Closed)),
                }
            },
            Relay::Failed(err) => {
                warn!(%err, kind, "upstream stream could not be opened");
                Some((Ok(error_event(&err)), Relay::Closing))
            }
            Relay::Closing => Some((Ok(done_event()), Relay::Closed)),
            Relay::Closed => None,
        }
    })
}

/// `text/plain` chunked response for the generate stream.
pub fn text_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Bytes, ServiceError>> + Send + 'static,
{
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Event stream for `/api/chat`, with the keep-alive header browsers
/// expect on long-lived chat streams.
pub fn chat_response(upstream: Result<RuntimeStream<ChatChunk>, ServiceError>) -> Response {
    (
        [(header::CONNECTION, HeaderValue::from_static("keep-alive"))],
        Sse::new(chat_bridge(upstream)),
    )
        .into_response()
}

/// Event stream for `/api/pull`.
pub fn pull_response(upstream: Result<RuntimeStream<PullProgress>, ServiceError>) -> Response {
    Sse::new(pull_bridge(upstream)).into_response()
}
