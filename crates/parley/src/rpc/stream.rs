// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Server-sent event streams.
//!
//! A stream moves `Idle -> Streaming -> Closed` and never goes back. The
//! first push (or close) commits the response headers; from then on every
//! frame (messages, pings, the final `done`) goes through one channel
//! sender guarded by an async mutex, so at most one write is ever in flight
//! and nothing is written once the sender has been taken. Closing cancels a
//! [`CancellationToken`], which stops the ping task and completes
//! [`StreamController::done`].
//!
//! Wire format:
//!
//! ```text
//! event: message
//! data: {"id":"1"}
//!
//! event: ping
//! data:
//!
//! event: done
//! data: done
//! ```

use super::error::RpcError;
use super::registry::Registry;
use crate::codec::{Codec, CodecError, CodecOptions};
use crate::model::TypeDef;
use crate::value::{Model, Value};
use axum::body::{Body, Bytes};
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Version};
use axum::response::Response;
use std::convert::Infallible;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, trace};

pub const PING_FRAME: &str = "event: ping\ndata:\n\n";
pub const DONE_FRAME: &str = "event: done\ndata: done\n\n";
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(10);

const CACHE_CONTROL_VALUE: &str =
    "private, no-cache, no-store, no-transform, must-revalidate, max-age=0";
const MIN_PING_INTERVAL: Duration = Duration::from_millis(1);

/// Errors returned to the code pushing events.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    #[error("failed to encode event: {0}")]
    Encode(#[from] CodecError),

    #[error("stream is closed")]
    Closed,
}

impl From<StreamError> for RpcError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Encode(_) => RpcError::internal(),
            StreamError::Closed => RpcError::new(500, "Stream closed"),
        }
    }
}

/// Lifecycle of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// Nothing written yet; the request can still fail with a JSON error.
    Idle,
    /// Headers committed.
    Streaming,
    /// Terminal.
    Closed,
}

/// Encodes events against the procedure's response definition.
pub(crate) struct EventEncoder {
    registry: Arc<Registry>,
    options: CodecOptions,
    def: Option<TypeDef>,
}

impl EventEncoder {
    pub(crate) fn new(registry: Arc<Registry>, options: CodecOptions, def: Option<TypeDef>) -> Self {
        Self {
            registry,
            options,
            def,
        }
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        match &self.def {
            Some(def) => Codec::new(self.registry.definitions(), &self.options).encode(value, def),
            None => Ok(b"{}".to_vec()),
        }
    }
}

struct Shared {
    procedure: String,
    writer: tokio::sync::Mutex<Option<mpsc::Sender<Bytes>>>,
    state: Mutex<StreamState>,
    started: Mutex<Option<oneshot::Sender<()>>>,
    ping_interval: Mutex<Duration>,
    peer_gone: AtomicBool,
    token: CancellationToken,
    encoder: EventEncoder,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Untyped stream handle shared by the controller, the ping task and the
/// response body.
#[derive(Clone)]
pub(crate) struct StreamCore {
    shared: Arc<Shared>,
}

/// Receiving ends handed to the dispatcher.
pub(crate) struct StreamParts {
    pub(crate) frames: mpsc::Receiver<Bytes>,
    /// Fires when the stream leaves `Idle`.
    pub(crate) started: oneshot::Receiver<()>,
}

impl StreamCore {
    pub(crate) fn new(
        procedure: &str,
        encoder: EventEncoder,
        ping_interval: Duration,
    ) -> (Self, StreamParts) {
        let (tx, frames) = mpsc::channel(1);
        let (started_tx, started) = oneshot::channel();
        let core = Self {
            shared: Arc::new(Shared {
                procedure: procedure.to_string(),
                writer: tokio::sync::Mutex::new(Some(tx)),
                state: Mutex::new(StreamState::Idle),
                started: Mutex::new(Some(started_tx)),
                ping_interval: Mutex::new(ping_interval.max(MIN_PING_INTERVAL)),
                peer_gone: AtomicBool::new(false),
                token: CancellationToken::new(),
                encoder,
            }),
        };
        (core, StreamParts { frames, started })
    }

    pub(crate) fn state(&self) -> StreamState {
        *lock(&self.shared.state)
    }

    /// True once a write failed because the client went away.
    pub(crate) fn peer_gone(&self) -> bool {
        self.shared.peer_gone.load(Ordering::SeqCst)
    }

    fn ping_interval(&self) -> Duration {
        *lock(&self.shared.ping_interval)
    }

    fn set_ping_interval(&self, interval: Duration) {
        *lock(&self.shared.ping_interval) = interval.max(MIN_PING_INTERVAL);
    }

    /// `Idle -> Streaming`: release the headers and start pinging.
    fn start(&self) -> Result<(), StreamError> {
        let mut state = lock(&self.shared.state);
        let current = *state;
        match current {
            StreamState::Streaming => Ok(()),
            StreamState::Closed => Err(StreamError::Closed),
            StreamState::Idle => {
                *state = StreamState::Streaming;
                drop(state);
                if let Some(started) = lock(&self.shared.started).take() {
                    let _ = started.send(());
                }
                self.spawn_ping();
                debug!("Stream '{}': started", self.shared.procedure);
                Ok(())
            }
        }
    }

    fn spawn_ping(&self) {
        let core = self.clone();
        tokio::spawn(async move {
            let token = core.shared.token.clone();
            loop {
                let period = core.ping_interval();
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(period) => {
                        if core.write(Bytes::from_static(PING_FRAME.as_bytes())).await.is_err() {
                            break;
                        }
                        trace!("Stream '{}': ping", core.shared.procedure);
                    }
                }
            }
        });
    }

    async fn write(&self, frame: Bytes) -> Result<(), StreamError> {
        let writer = self.shared.writer.lock().await;
        let Some(tx) = writer.as_ref() else {
            return Err(StreamError::Closed);
        };
        if tx.send(frame).await.is_err() {
            drop(writer);
            self.mark_disconnected();
            return Err(StreamError::Closed);
        }
        Ok(())
    }

    pub(crate) async fn push_value(&self, value: &Value) -> Result<(), StreamError> {
        self.start()?;
        let json = self.shared.encoder.encode(value)?;
        self.write(message_frame(&json)).await
    }

    /// Close the stream; idempotent.
    ///
    /// Closing an idle stream still commits the headers, so the client sees
    /// an empty (or `done`-only) event stream rather than a JSON body.
    pub(crate) async fn close(&self, notify_peer: bool) {
        if self.state() == StreamState::Closed {
            return;
        }
        let _ = self.start();
        let mut writer = self.shared.writer.lock().await;
        if let Some(tx) = writer.take() {
            if notify_peer && tx.send(Bytes::from_static(DONE_FRAME.as_bytes())).await.is_err() {
                self.shared.peer_gone.store(true, Ordering::SeqCst);
            }
            debug!("Stream '{}': closed", self.shared.procedure);
        }
        *lock(&self.shared.state) = StreamState::Closed;
        drop(writer);
        self.shared.token.cancel();
    }

    /// Tear down without starting; used when the handler fails before the
    /// first event.
    pub(crate) fn abandon(&self) {
        *lock(&self.shared.state) = StreamState::Closed;
        if let Ok(mut writer) = self.shared.writer.try_lock() {
            writer.take();
        }
        self.shared.token.cancel();
    }

    pub(crate) fn mark_disconnected(&self) {
        {
            let mut state = lock(&self.shared.state);
            if *state == StreamState::Closed {
                return;
            }
            *state = StreamState::Closed;
        }
        self.shared.peer_gone.store(true, Ordering::SeqCst);
        if let Ok(mut writer) = self.shared.writer.try_lock() {
            writer.take();
        }
        self.shared.token.cancel();
        debug!("Stream '{}': peer disconnected", self.shared.procedure);
    }
}

fn message_frame(json: &[u8]) -> Bytes {
    let mut frame = Vec::with_capacity(json.len() + 24);
    frame.extend_from_slice(b"event: message\ndata: ");
    frame.extend_from_slice(json);
    frame.extend_from_slice(b"\n\n");
    Bytes::from(frame)
}

/// Handle given to stream handlers for emitting events of type `T`.
///
/// Cheap to clone; every clone drives the same stream.
pub struct StreamController<T> {
    core: StreamCore,
    _event: PhantomData<fn(&T)>,
}

impl<T> Clone for StreamController<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            _event: PhantomData,
        }
    }
}

impl<T: Model> StreamController<T> {
    pub(crate) fn from_core(core: StreamCore) -> Self {
        Self {
            core,
            _event: PhantomData,
        }
    }

    /// Send one event. The first push commits the response headers.
    ///
    /// Returns once the frame is handed to the response body, which holds at
    /// most one frame ahead of the socket. Frames keep their push order, but
    /// a successful return does not mean the peer has received the event.
    pub async fn push(&self, event: &T) -> Result<(), StreamError> {
        self.core.push_value(&event.to_value()).await
    }

    /// Close the stream, optionally sending a final `done` event first.
    pub async fn close(&self, notify_peer: bool) {
        self.core.close(notify_peer).await;
    }

    /// Completes once the stream is closed by either side.
    pub fn done(&self) -> WaitForCancellationFuture<'_> {
        self.core.shared.token.cancelled()
    }

    pub fn is_closed(&self) -> bool {
        self.core.state() == StreamState::Closed
    }

    pub fn state(&self) -> StreamState {
        self.core.state()
    }

    /// Interval between keep-alive pings; applies from the next ping on.
    pub fn set_ping_interval(&self, interval: Duration) {
        self.core.set_ping_interval(interval);
    }
}

/// Held by the dispatcher until the response body exists.
///
/// Dropping it armed means the request went away before any body could
/// notice, so the stream is torn down and `done()` fires.
pub(crate) struct PendingStream {
    core: Option<StreamCore>,
}

impl PendingStream {
    pub(crate) fn new(core: StreamCore) -> Self {
        Self { core: Some(core) }
    }

    /// The response has been handed off.
    pub(crate) fn disarm(mut self) {
        self.core = None;
    }
}

impl Drop for PendingStream {
    fn drop(&mut self) {
        if let Some(core) = self.core.take() {
            core.mark_disconnected();
        }
    }
}

/// Response body side: drains frames and notices client disconnects.
struct FrameStream {
    frames: mpsc::Receiver<Bytes>,
    core: StreamCore,
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        if self.core.state() != StreamState::Closed {
            self.core.mark_disconnected();
        }
    }
}

/// Build the event-stream response around the frame channel.
pub(crate) fn sse_response(
    frames: mpsc::Receiver<Bytes>,
    core: StreamCore,
    version: Version,
) -> Response {
    let body = futures::stream::unfold(FrameStream { frames, core }, |mut body| async move {
        body.frames
            .recv()
            .await
            .map(|frame| (Ok::<_, Infallible>(frame), body))
    });
    let mut response = Response::new(Body::from_stream(body));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    if version < Version::HTTP_2 {
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    fn controller(ping: Duration) -> (StreamController<()>, StreamParts) {
        let encoder = EventEncoder::new(Arc::new(Registry::new()), CodecOptions::default(), None);
        let (core, parts) = StreamCore::new("test.watch", encoder, ping);
        (StreamController::from_core(core), parts)
    }

    async fn next_frame(frames: &mut mpsc::Receiver<Bytes>) -> Option<String> {
        timeout(WAIT, frames.recv())
            .await
            .expect("frame in time")
            .map(|b| String::from_utf8(b.to_vec()).expect("utf8"))
    }

    #[tokio::test]
    async fn test_first_push_starts_stream() {
        let (stream, mut parts) = controller(Duration::from_secs(60));
        assert_eq!(stream.state(), StreamState::Idle);
        assert!(parts.started.try_recv().is_err());

        stream.push(&()).await.expect("push");
        assert_eq!(stream.state(), StreamState::Streaming);
        assert!(parts.started.try_recv().is_ok());
        assert_eq!(
            next_frame(&mut parts.frames).await.as_deref(),
            Some("event: message\ndata: {}\n\n")
        );
    }

    #[tokio::test]
    async fn test_close_with_notify_sends_done_and_ends() {
        let (stream, mut parts) = controller(Duration::from_secs(60));
        stream.push(&()).await.expect("push");
        assert!(next_frame(&mut parts.frames).await.is_some());

        let closer = stream.clone();
        let close = tokio::spawn(async move { closer.close(true).await });
        assert_eq!(next_frame(&mut parts.frames).await.as_deref(), Some(DONE_FRAME));
        close.await.expect("close task");
        assert_eq!(next_frame(&mut parts.frames).await, None);

        assert!(stream.is_closed());
        timeout(WAIT, stream.done()).await.expect("done resolves");
        assert_eq!(stream.push(&()).await, Err(StreamError::Closed));
        // Idempotent.
        stream.close(true).await;
    }

    #[tokio::test]
    async fn test_close_from_idle_starts_then_closes() {
        let (stream, mut parts) = controller(Duration::from_secs(60));
        stream.close(false).await;
        assert!(parts.started.try_recv().is_ok());
        assert_eq!(next_frame(&mut parts.frames).await, None);
    }

    #[tokio::test]
    async fn test_pings_follow_interval() {
        let (stream, mut parts) = controller(Duration::from_millis(20));
        stream.push(&()).await.expect("push");
        assert!(next_frame(&mut parts.frames).await.is_some());
        assert_eq!(next_frame(&mut parts.frames).await.as_deref(), Some(PING_FRAME));
        assert_eq!(next_frame(&mut parts.frames).await.as_deref(), Some(PING_FRAME));
        stream.close(false).await;
        // A ping queued before the close may still drain.
        while let Some(frame) = next_frame(&mut parts.frames).await {
            assert_eq!(frame, PING_FRAME);
        }
    }

    #[tokio::test]
    async fn test_no_ping_before_start() {
        let (_stream, mut parts) = controller(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(parts.frames.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_push_waits_while_a_frame_is_undrained() {
        let (stream, mut parts) = controller(Duration::from_secs(60));
        stream.push(&()).await.expect("first");
        assert!(timeout(Duration::from_millis(50), stream.push(&())).await.is_err());
        assert!(next_frame(&mut parts.frames).await.is_some());
        timeout(WAIT, stream.push(&()))
            .await
            .expect("room after drain")
            .expect("second");
        assert!(next_frame(&mut parts.frames).await.is_some());
    }

    #[tokio::test]
    async fn test_peer_disconnect_closes_stream() {
        let (stream, parts) = controller(Duration::from_secs(60));
        drop(parts.frames);
        assert_eq!(stream.push(&()).await, Err(StreamError::Closed));
        assert!(stream.is_closed());
        assert!(stream.core.peer_gone());
        timeout(WAIT, stream.done()).await.expect("done resolves");
    }

    #[tokio::test]
    async fn test_dropped_body_marks_peer_gone() {
        let (stream, parts) = controller(Duration::from_secs(60));
        stream.push(&()).await.expect("push");
        let response = sse_response(parts.frames, stream.core.clone(), Version::HTTP_11);
        drop(response);
        assert!(stream.is_closed());
        assert!(stream.core.peer_gone());
    }

    #[tokio::test]
    async fn test_event_stream_headers() {
        let (stream, parts) = controller(Duration::from_secs(60));
        let response = sse_response(parts.frames, stream.core.clone(), Version::HTTP_11);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[CACHE_CONTROL], CACHE_CONTROL_VALUE);
        assert_eq!(headers["x-accel-buffering"], "no");
        assert_eq!(headers[CONNECTION], "keep-alive");

        let (stream, parts) = controller(Duration::from_secs(60));
        let response = sse_response(parts.frames, stream.core.clone(), Version::HTTP_2);
        assert!(response.headers().get(CONNECTION).is_none());
    }
}
