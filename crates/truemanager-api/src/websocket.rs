//! WebSocket/DDP client for the TrueNAS middleware.
//!
//! One [`DdpClient`] owns one socket. Method calls are correlated by a
//! UUID `id`: each call parks a oneshot sender in a concurrent pending
//! map, the reader task resolves it when the matching `result` frame
//! arrives. Collection updates (`added`/`changed`/`removed`) fan out
//! through a broadcast channel and are consumed as [`Subscription`]s.
//!
//! # Example
//!
//! ```rust,ignore
//! use truemanager_api::websocket::{DdpClient, DdpConfig};
//!
//! let client = DdpClient::new(DdpConfig::default());
//! client.connect(&"wss://nas.local/websocket".parse()?).await?;
//! client.login(&Authorization::api_key("1-abc")).await?;
//!
//! let info: serde_json::Value = client.call_method("system.info", vec![]).await?;
//! client.disconnect();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::ddp::{ClientMessage, CollectionUpdate, ServerMessage};
use crate::error::Error;
use crate::session::{Authorization, Session};
use crate::transport::TransportConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Reply = Result<Value, Error>;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ── Config & state ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DdpConfig {
    pub transport: TransportConfig,
    /// Upper bound on the `connect` → `connected` exchange. Default: 10s.
    pub handshake_timeout: Duration,
    /// Per-call deadline. `None` waits until the reply or a disconnect.
    pub call_timeout: Option<Duration>,
    /// Collection events buffered per subscriber before it lags.
    pub event_capacity: usize,
}

impl Default for DdpConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            handshake_timeout: Duration::from_secs(10),
            call_timeout: None,
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Kind of collection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

/// A collection update delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEvent {
    pub kind: ChangeKind,
    pub collection: String,
    pub id: Option<Value>,
    pub fields: Option<Value>,
}

impl CollectionEvent {
    fn new(kind: ChangeKind, update: CollectionUpdate) -> Self {
        Self {
            kind,
            collection: update.collection,
            id: update.id,
            fields: update.fields,
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Cheaply cloneable handle to a DDP connection.
#[derive(Clone)]
pub struct DdpClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: DdpConfig,
    state_tx: watch::Sender<ConnectionState>,
    pending: DashMap<String, oneshot::Sender<Reply>>,
    /// Writer channel of the live connection; `None` while disconnected.
    outbound: ArcSwapOption<mpsc::UnboundedSender<Message>>,
    events: ArcSwapOption<broadcast::Sender<Arc<CollectionEvent>>>,
    cancel: ArcSwapOption<CancellationToken>,
    session_id: ArcSwapOption<String>,
    /// Bumped whenever a connection is installed or torn down. A reader
    /// only tears down the connection it was spawned for.
    generation: AtomicU64,
}

impl DdpClient {
    pub fn new(config: DdpConfig) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                config,
                state_tx,
                pending: DashMap::new(),
                outbound: ArcSwapOption::empty(),
                events: ArcSwapOption::empty(),
                cancel: ArcSwapOption::empty(),
                session_id: ArcSwapOption::empty(),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Watch connection state transitions.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// DDP session id assigned by the server on the last handshake.
    pub fn session_id(&self) -> Option<String> {
        self.inner.session_id.load_full().map(|s| s.as_ref().clone())
    }

    /// Number of calls awaiting a reply.
    pub fn pending_calls(&self) -> usize {
        self.inner.pending.len()
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Connect to the websocket endpoint derived from `session`.
    pub async fn connect_session(&self, session: &Session) -> Result<(), Error> {
        let url = session.snapshot().websocket_url()?;
        self.connect(&url).await
    }

    /// Open the socket and perform the DDP handshake.
    ///
    /// Any existing connection is torn down first. Fails while another
    /// `connect` on this client is still in progress.
    pub async fn connect(&self, url: &Url) -> Result<(), Error> {
        let mut previous = ConnectionState::Disconnected;
        let claimed = self.inner.state_tx.send_if_modified(|state| {
            if *state == ConnectionState::Connecting {
                return false;
            }
            previous = *state;
            *state = ConnectionState::Connecting;
            true
        });
        if !claimed {
            return Err(Error::WebSocketConnect(
                "another connection attempt is in progress".to_owned(),
            ));
        }
        if previous == ConnectionState::Connected {
            self.inner.teardown_quiet();
        }
        tracing::info!(url = %url, "connecting to DDP endpoint");

        match self.open(url).await {
            Ok(session) => {
                tracing::info!(session = %session, "DDP connected");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "DDP connect failed");
                self.inner.set_state(ConnectionState::Failed);
                Err(e)
            }
        }
    }

    async fn open(&self, url: &Url) -> Result<String, Error> {
        let connector = self.inner.config.transport.websocket_connector()?;
        let (ws, _response) =
            tokio_tungstenite::connect_async_tls_with_config(url.as_str(), None, false, connector)
                .await
                .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        let (mut sink, mut stream) = ws.split();
        sink.send(Message::text(ClientMessage::connect().to_json()?))
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        let limit = self.inner.config.handshake_timeout;
        let session = tokio::time::timeout(limit, await_connected(&mut stream))
            .await
            .map_err(|_| Error::Handshake {
                reason: format!("no reply within {}s", limit.as_secs()),
            })??;

        let cancel = CancellationToken::new();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(self.inner.config.event_capacity);

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.session_id.store(Some(Arc::new(session.clone())));
        self.inner.events.store(Some(Arc::new(events_tx)));
        self.inner.outbound.store(Some(Arc::new(out_tx)));
        self.inner.cancel.store(Some(Arc::new(cancel.clone())));
        self.inner.set_state(ConnectionState::Connected);

        tokio::spawn(write_loop(sink, out_rx, cancel.clone()));
        tokio::spawn(read_loop(Arc::clone(&self.inner), stream, cancel, generation));

        Ok(session)
    }

    /// Close the connection. Every call still waiting fails with
    /// [`Error::Disconnected`].
    pub fn disconnect(&self) {
        tracing::info!("DDP disconnect requested");
        self.inner.teardown(ConnectionState::Disconnected);
    }

    // ── Calls ────────────────────────────────────────────────────────

    /// Invoke a middleware method and deserialize its result.
    pub async fn call_method<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, Error> {
        let value = self.call_value(method, params).await?;
        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: value.to_string(),
        })
    }

    /// Invoke a middleware method and return the raw JSON result.
    pub async fn call_value(&self, method: &str, params: Vec<Value>) -> Result<Value, Error> {
        if self.state() != ConnectionState::Connected {
            return Err(Error::Disconnected);
        }

        let id = Uuid::new_v4().to_string();
        let (rx, _guard) = self.inner.register(&id);
        self.inner.send(&ClientMessage::Method {
            id: id.clone(),
            method: method.to_owned(),
            params,
        })?;
        tracing::debug!(%id, method, "DDP call sent");

        self.inner.await_reply(rx).await
    }

    /// Authenticate the socket. Returns `false` when the server rejects
    /// the credential.
    pub async fn login(&self, authorization: &Authorization) -> Result<bool, Error> {
        let (method, params) = match authorization {
            Authorization::Basic { username, password } => (
                "auth.login",
                vec![
                    Value::from(username.as_str()),
                    Value::from(password.expose_secret()),
                ],
            ),
            Authorization::ApiKey(key) => {
                ("auth.login_with_api_key", vec![Value::from(key.expose_secret())])
            }
            Authorization::Token(token) => ("auth.token", vec![Value::from(token.expose_secret())]),
        };
        let ok: bool = self.call_method(method, params).await?;
        tracing::debug!(kind = authorization.kind(), ok, "DDP login");
        Ok(ok)
    }

    /// DDP-level ping. Returns the round-trip time.
    pub async fn ping(&self) -> Result<Duration, Error> {
        if self.state() != ConnectionState::Connected {
            return Err(Error::Disconnected);
        }

        let id = Uuid::new_v4().to_string();
        let (rx, _guard) = self.inner.register(&id);
        let started = Instant::now();
        self.inner.send(&ClientMessage::Ping { id: Some(id) })?;

        let limit = self
            .inner
            .config
            .call_timeout
            .unwrap_or(self.inner.config.handshake_timeout);
        match tokio::time::timeout(limit, rx).await {
            Ok(Ok(reply)) => reply.map(|_| started.elapsed()),
            Ok(Err(_)) => Err(Error::Disconnected),
            Err(_) => Err(Error::Timeout {
                timeout_secs: limit.as_secs(),
            }),
        }
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Subscribe to a collection (e.g. `"reporting.realtime"`).
    ///
    /// The subscription ends when the connection does.
    pub fn subscribe(&self, name: &str) -> Result<Subscription, Error> {
        let events = self.inner.events.load_full().ok_or(Error::Disconnected)?;
        let rx = events.subscribe();

        let id = Uuid::new_v4().to_string();
        self.inner.send(&ClientMessage::Sub {
            id: id.clone(),
            name: name.to_owned(),
        })?;
        tracing::debug!(%id, name, "DDP subscribe");

        Ok(Subscription {
            id,
            name: name.to_owned(),
            rx,
        })
    }

    pub fn unsubscribe(&self, id: &str) -> Result<(), Error> {
        tracing::debug!(id, "DDP unsubscribe");
        self.inner.send(&ClientMessage::Unsub { id: id.to_owned() })
    }
}

impl std::fmt::Debug for DdpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdpClient")
            .field("state", &self.state())
            .field("pending", &self.pending_calls())
            .finish_non_exhaustive()
    }
}

// ── Inner: pending map & frame dispatch ──────────────────────────────

/// Removes the pending entry when the waiting future goes away,
/// whether it completed or was cancelled.
struct PendingGuard<'a> {
    pending: &'a DashMap<String, oneshot::Sender<Reply>>,
    id: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

impl Inner {
    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    fn register(&self, id: &str) -> (oneshot::Receiver<Reply>, PendingGuard<'_>) {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.to_owned(), tx);
        let guard = PendingGuard {
            pending: &self.pending,
            id: id.to_owned(),
        };
        (rx, guard)
    }

    async fn await_reply(&self, rx: oneshot::Receiver<Reply>) -> Reply {
        let reply = match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, rx)
                .await
                .map_err(|_| Error::Timeout {
                    timeout_secs: limit.as_secs(),
                })?,
            None => rx.await,
        };
        reply.unwrap_or(Err(Error::Disconnected))
    }

    fn send(&self, message: &ClientMessage) -> Result<(), Error> {
        let text = message.to_json()?;
        let tx = self.outbound.load_full().ok_or(Error::Disconnected)?;
        tx.send(Message::text(text)).map_err(|_| Error::Disconnected)
    }

    fn resolve(&self, id: &str, reply: Reply) {
        if let Some((_, tx)) = self.pending.remove(id) {
            // Receiver gone means the caller was cancelled mid-flight.
            let _ = tx.send(reply);
        } else {
            tracing::debug!(id, "reply for unknown call dropped");
        }
    }

    fn publish(&self, event: CollectionEvent) {
        if let Some(events) = self.events.load_full() {
            // No receivers is fine.
            let _ = events.send(Arc::new(event));
        }
    }

    fn handle_text(&self, text: &str) {
        let message = match serde_json::from_str::<ServerMessage>(text) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(error = %e, "malformed DDP frame dropped");
                return;
            }
        };

        match message {
            ServerMessage::Result { id, result, error } => {
                let reply = match error {
                    Some(err) => Err(err.into()),
                    None => Ok(result.unwrap_or(Value::Null)),
                };
                self.resolve(&id, reply);
            }
            ServerMessage::Pong { id: Some(id) } => self.resolve(&id, Ok(Value::Null)),
            ServerMessage::Ping { id } => {
                if let Err(e) = self.send(&ClientMessage::Pong { id }) {
                    tracing::debug!(error = %e, "could not answer DDP ping");
                }
            }
            ServerMessage::Added(update) => self.publish(CollectionEvent::new(ChangeKind::Added, update)),
            ServerMessage::Changed(update) => {
                self.publish(CollectionEvent::new(ChangeKind::Changed, update));
            }
            ServerMessage::Removed(update) => {
                self.publish(CollectionEvent::new(ChangeKind::Removed, update));
            }
            ServerMessage::Ready { subs } => tracing::debug!(?subs, "DDP subscriptions ready"),
            ServerMessage::Nosub { id, error } => {
                tracing::warn!(%id, reason = ?error.and_then(|e| e.reason), "DDP subscription refused");
            }
            ServerMessage::Pong { id: None }
            | ServerMessage::Connected { .. }
            | ServerMessage::Failed { .. }
            | ServerMessage::Unknown => {
                tracing::debug!(frame = text, "unhandled DDP frame");
            }
        }
    }

    /// Drop the live connection, fail every waiter, and publish `state`.
    fn teardown(&self, state: ConnectionState) {
        self.teardown_quiet();
        self.set_state(state);
    }

    /// Tear down on behalf of the reader of `generation`. A no-op when a
    /// newer connection (or an explicit teardown) has taken over since.
    fn teardown_generation(&self, generation: u64, state: ConnectionState) {
        if self
            .generation
            .compare_exchange(generation, generation + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(generation, "stale DDP reader exiting without teardown");
            return;
        }
        self.release();
        self.set_state(state);
    }

    /// Invalidate the current generation and release its resources,
    /// leaving the published state alone.
    fn teardown_quiet(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.release();
    }

    /// The outbound channel is cleared before the pending map is drained,
    /// so a call racing with teardown either sees no channel or is drained.
    fn release(&self) {
        self.outbound.store(None);
        if let Some(cancel) = self.cancel.swap(None) {
            cancel.cancel();
        }
        self.events.store(None);
        self.session_id.store(None);

        let ids: Vec<String> = self.pending.iter().map(|e| e.key().clone()).collect();
        let drained = ids.len();
        for id in ids {
            if let Some((_, tx)) = self.pending.remove(&id) {
                let _ = tx.send(Err(Error::Disconnected));
            }
        }
        if drained > 0 {
            tracing::debug!(drained, "pending DDP calls failed on teardown");
        }
    }
}

// ── Socket tasks ─────────────────────────────────────────────────────

async fn await_connected(stream: &mut SplitStream<WsStream>) -> Result<String, Error> {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                Ok(ServerMessage::Connected { session }) => return Ok(session),
                Ok(ServerMessage::Failed { version }) => {
                    return Err(Error::Handshake {
                        reason: match version {
                            Some(v) => format!("server rejected protocol version (suggests {v})"),
                            None => "server rejected protocol version".to_owned(),
                        },
                    });
                }
                Ok(other) => tracing::debug!(?other, "frame before handshake ignored"),
                Err(e) => tracing::debug!(error = %e, "malformed frame before handshake"),
            },
            Ok(Message::Close(frame)) => {
                return Err(match frame {
                    Some(cf) => Error::WebSocketClosed {
                        code: u16::from(cf.code),
                        reason: cf.reason.to_string(),
                    },
                    None => Error::Handshake {
                        reason: "connection closed during handshake".to_owned(),
                    },
                });
            }
            Ok(_) => {}
            Err(e) => return Err(Error::WebSocketConnect(e.to_string())),
        }
    }
    Err(Error::Handshake {
        reason: "connection closed during handshake".to_owned(),
    })
}

async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                // Flush frames queued before the cancel (e.g. a final unsub).
                while let Ok(message) = rx.try_recv() {
                    if sink.send(message).await.is_err() {
                        break;
                    }
                }
                break;
            }
            message = rx.recv() => match message {
                Some(message) => {
                    if let Err(e) = sink.send(message).await {
                        tracing::warn!(error = %e, "DDP write failed");
                        break;
                    }
                }
                None => break,
            },
        }
    }
    let _ = sink.close().await;
    tracing::debug!("DDP writer exiting");
}

async fn read_loop(
    inner: Arc<Inner>,
    mut stream: SplitStream<WsStream>,
    cancel: CancellationToken,
    generation: u64,
) {
    let outcome = loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("DDP reader cancelled");
                return;
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => inner.handle_text(&text),
                Some(Ok(Message::Close(frame))) => {
                    if let Some(cf) = frame {
                        tracing::info!(code = %cf.code, reason = %cf.reason, "DDP close frame received");
                    } else {
                        tracing::info!("DDP close frame received");
                    }
                    break ConnectionState::Disconnected;
                }
                // Pings are answered by tungstenite; binary frames are not part of DDP.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "DDP socket error");
                    break ConnectionState::Failed;
                }
                None => {
                    tracing::info!("DDP stream ended");
                    break ConnectionState::Disconnected;
                }
            },
        }
    };
    inner.teardown_generation(generation, outcome);
}

// ── Subscription ─────────────────────────────────────────────────────

/// Live feed of one collection.
pub struct Subscription {
    id: String,
    name: String,
    rx: broadcast::Receiver<Arc<CollectionEvent>>,
}

impl Subscription {
    /// Subscription id, for [`DdpClient::unsubscribe`].
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Next event for this collection; `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<Arc<CollectionEvent>> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.collection == self.name => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, name = %self.name, "subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(mut self) -> impl Stream<Item = Arc<CollectionEvent>> {
        async_stream::stream! {
            while let Some(event) = self.recv().await {
                yield event;
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
