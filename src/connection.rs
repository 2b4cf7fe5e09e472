//! Realtime connection manager.
//!
//! Owns the single transport connection multiplexed across all registry
//! subscribers. Handles:
//!
//! - One live transport at a time (WebSocket preferred, polling fallback)
//! - Idempotent connect/disconnect
//! - Catch-all forwarding of every inbound envelope into the [`EventRegistry`]
//! - Automatic reconnection with exponential backoff, surfaced as
//!   `reconnect_attempt` / `reconnect` / `reconnect_error` / `reconnect_failed`
//!   events
//! - Keepalive pings with pong-timeout detection (WebSocket only)
//! - A connectivity probe (`test_connection`) with a bounded wait

use log::{debug, info, warn};
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant as TokioInstant;

use crate::auth::AuthProvider;
use crate::error::{PaperLinkError, Result};
use crate::event_handlers::{ConnectionFault, DisconnectReason, EventHandlers};
use crate::models::connection_state::StateCell;
use crate::models::{ClientMessage, ConnectionOptions, ConnectionState, EventKind, TransportKind};
use crate::registry::EventRegistry;
use crate::timeouts::PaperLinkTimeouts;
use crate::transport::{
    connect_websocket, resolve_stream_url, ActiveTransport, PollingTransport, TransportFrame,
};

/// Maximum sleep duration that won't overflow `Instant + Duration`.
/// ~100 years is far enough into the future to be effectively "never".
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Current time in millis since Unix epoch.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ── Commands ────────────────────────────────────────────────────────────────

/// Commands sent from the public handle to the background connection task.
enum ConnCmd {
    /// Gracefully shut down the connection.
    Shutdown,
}

/// Handle to a spawned connection task.
struct ConnHandle {
    cmd_tx: mpsc::Sender<ConnCmd>,
    task: JoinHandle<()>,
}

impl ConnHandle {
    /// Signal shutdown and wait briefly for the task to wind down.
    async fn shutdown(self) {
        let _ = self.cmd_tx.send(ConnCmd::Shutdown).await;
        if tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .is_err()
        {
            warn!("[paper-link] Connection task did not stop in time");
        }
    }
}

// ── Public handle ───────────────────────────────────────────────────────────

/// The realtime connection: one transport, many logical subscribers.
///
/// Constructed by the client builder; consumers interact with it through
/// [`PaperLinkClient`](crate::client::PaperLinkClient) or directly via the
/// accessor. All methods are safe to call from any task.
pub struct RealtimeConnection {
    base_url: String,
    http: reqwest::Client,
    auth: AuthProvider,
    timeouts: PaperLinkTimeouts,
    options: ConnectionOptions,
    registry: EventRegistry,
    handlers: EventHandlers,
    state: Arc<StateCell>,
    /// Monotonic count of transport establishment attempts.
    attempts: Arc<AtomicU64>,
    transport_label: Arc<StdMutex<Option<&'static str>>>,
    handle: Mutex<Option<ConnHandle>>,
}

impl RealtimeConnection {
    pub(crate) fn new(
        base_url: String,
        http: reqwest::Client,
        auth: AuthProvider,
        timeouts: PaperLinkTimeouts,
        options: ConnectionOptions,
        registry: EventRegistry,
        handlers: EventHandlers,
    ) -> Self {
        Self {
            base_url,
            http,
            auth,
            timeouts,
            options,
            registry,
            handlers,
            state: Arc::new(StateCell::default()),
            attempts: Arc::new(AtomicU64::new(0)),
            transport_label: Arc::new(StdMutex::new(None)),
            handle: Mutex::new(None),
        }
    }

    /// Open the realtime connection.
    ///
    /// No-op when already connected. Otherwise any previous transport is
    /// torn down first, then a background task establishes a new one
    /// following the configured transport preference order.
    ///
    /// `credential` overrides the client-level [`AuthProvider`] for this
    /// connection when given.
    ///
    /// Only configuration problems (e.g. an invalid base URL) are returned
    /// as errors; transport failures are logged, surfaced as events, and
    /// retried by the background task.
    pub async fn connect(&self, credential: Option<AuthProvider>) -> Result<()> {
        let stream_url = resolve_stream_url(&self.base_url)?;

        let mut handle = self.handle.lock().await;
        if handle.is_some() && self.state.is_connected() {
            debug!("[paper-link] connect() ignored: already connected");
            return Ok(());
        }
        if let Some(previous) = handle.take() {
            debug!("[paper-link] Tearing down previous transport");
            previous.shutdown().await;
        }

        self.state.set(ConnectionState::Connecting);
        let auth = credential.unwrap_or_else(|| self.auth.clone());

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (out_tx, out_rx) = mpsc::channel(256);
        self.registry.bind_outbound(out_tx, Arc::clone(&self.state));

        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();
        let ctx = TaskContext {
            stream_url,
            base_url: self.base_url.clone(),
            http: self.http.clone(),
            auth,
            timeouts: self.timeouts.clone(),
            options: self.options.clone(),
            registry: self.registry.clone(),
            handlers: self.handlers.clone(),
            state: Arc::clone(&self.state),
            attempts: Arc::clone(&self.attempts),
            transport_label: Arc::clone(&self.transport_label),
        };
        let task = tokio::spawn(connection_task(ctx, cmd_rx, out_rx, Some(ready_tx)));
        *handle = Some(ConnHandle { cmd_tx, task });
        drop(handle);

        // Wait for the initial establishment attempt to finish. Failure is
        // non-fatal: the task keeps retrying under auto-reconnect.
        match ready_rx.await {
            Ok(Ok(())) => {},
            Ok(Err(e)) => warn!("[paper-link] Initial connection failed: {}", e),
            Err(_) => warn!("[paper-link] Connection task exited before signalling readiness"),
        }
        Ok(())
    }

    /// Close the realtime connection. No-op when not connected.
    ///
    /// Registry subscriptions are untouched; they resume receiving events
    /// after the next [`connect`](Self::connect).
    pub async fn disconnect(&self) {
        let mut handle = self.handle.lock().await;
        match handle.take() {
            Some(h) => {
                debug!("[paper-link] Disconnecting");
                h.shutdown().await;
            },
            None => debug!("[paper-link] disconnect() ignored: not connected"),
        }
        self.registry.unbind_outbound();
        self.state.set(ConnectionState::Disconnected);
        *self.transport_label.lock().unwrap() = None;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Whether the transport is currently up and authenticated.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Name of the live transport ("websocket" / "polling"), if any.
    pub fn transport_name(&self) -> Option<&'static str> {
        *self.transport_label.lock().unwrap()
    }

    /// Monotonic count of transport establishment attempts.
    pub fn connection_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Round-trip connectivity probe.
    ///
    /// Returns `false` immediately when not connected. Otherwise emits a
    /// `ping` event carrying a timestamp and waits up to the configured
    /// probe timeout for a `pong` whose timestamp matches. The temporary
    /// `pong` subscription is removed on every path.
    pub async fn test_connection(&self) -> bool {
        if !self.is_connected() {
            debug!("[paper-link] test_connection: not connected");
            return false;
        }

        let timestamp = now_ms();
        let (ack_tx, ack_rx) = oneshot::channel::<()>();
        let ack_tx = StdMutex::new(Some(ack_tx));

        let subscription = self.registry.on(EventKind::Pong, move |payload| {
            let matches = payload.get("timestamp").and_then(JsonValue::as_u64) == Some(timestamp);
            if matches {
                if let Some(tx) = ack_tx.lock().unwrap().take() {
                    let _ = tx.send(());
                }
            }
        });

        if !self
            .registry
            .emit(EventKind::Ping, json!({ "timestamp": timestamp }))
        {
            subscription.unsubscribe();
            return false;
        }

        let acked = matches!(
            tokio::time::timeout(self.timeouts.probe_timeout, ack_rx).await,
            Ok(Ok(()))
        );
        subscription.unsubscribe();

        if !acked {
            debug!(
                "[paper-link] test_connection: no matching pong within {:?}",
                self.timeouts.probe_timeout
            );
        }
        acked
    }
}

impl Drop for RealtimeConnection {
    fn drop(&mut self) {
        // Best-effort shutdown signal for a still-running task.
        if let Ok(mut guard) = self.handle.try_lock() {
            if let Some(handle) = guard.take() {
                let _ = handle.cmd_tx.try_send(ConnCmd::Shutdown);
            }
        }
    }
}

// ── Background connection task ──────────────────────────────────────────────

/// Everything the background task needs, bundled once at spawn time.
struct TaskContext {
    stream_url: String,
    base_url: String,
    http: reqwest::Client,
    auth: AuthProvider,
    timeouts: PaperLinkTimeouts,
    options: ConnectionOptions,
    registry: EventRegistry,
    handlers: EventHandlers,
    state: Arc<StateCell>,
    attempts: Arc<AtomicU64>,
    transport_label: Arc<StdMutex<Option<&'static str>>>,
}

impl TaskContext {
    /// Publish a lifecycle event through the registry.
    fn lifecycle(&self, kind: EventKind, payload: JsonValue) {
        self.registry.dispatch(&kind, &payload);
    }

    fn mark_connected(&self, transport: TransportKind, reconnected: bool) {
        self.state.set(ConnectionState::Connected);
        *self.transport_label.lock().unwrap() = Some(transport.name());
        self.handlers.emit_connect();
        if reconnected {
            self.lifecycle(EventKind::Reconnect, json!({ "transport": transport.name() }));
        }
        self.lifecycle(
            EventKind::Connect,
            json!({
                "transport": transport.name(),
                "attempts": self.attempts.load(Ordering::SeqCst),
            }),
        );
    }

    fn mark_disconnected(&self, reason: DisconnectReason) {
        self.state.set(ConnectionState::Disconnected);
        *self.transport_label.lock().unwrap() = None;
        self.handlers.emit_disconnect(reason.clone());
        self.lifecycle(
            EventKind::Disconnect,
            json!({ "reason": reason.message, "code": reason.code }),
        );
    }

    fn report_error(&self, message: &str, recoverable: bool) {
        self.handlers
            .emit_error(ConnectionFault::new(message, recoverable));
        self.lifecycle(
            EventKind::Error,
            json!({ "message": message, "recoverable": recoverable }),
        );
    }
}

/// Try each configured transport flavor in preference order.
async fn establish_transport(ctx: &TaskContext) -> Result<ActiveTransport> {
    ctx.attempts.fetch_add(1, Ordering::SeqCst);

    let mut last_error =
        PaperLinkError::ConfigurationError("No transports configured".to_string());

    for kind in &ctx.options.transports {
        match kind {
            TransportKind::WebSocket => {
                match connect_websocket(&ctx.stream_url, &ctx.auth, &ctx.timeouts).await {
                    Ok(stream) => return Ok(ActiveTransport::WebSocket(stream)),
                    Err(e) => {
                        warn!("[paper-link] WebSocket transport unavailable: {}", e);
                        last_error = e;
                    },
                }
            },
            TransportKind::Polling => {
                match PollingTransport::open(
                    &ctx.base_url,
                    ctx.http.clone(),
                    ctx.auth.clone(),
                    &ctx.timeouts,
                )
                .await
                {
                    Ok(polling) => return Ok(ActiveTransport::Polling(polling)),
                    Err(e) => {
                        warn!("[paper-link] Polling transport unavailable: {}", e);
                        last_error = e;
                    },
                }
            },
        }
    }

    Err(last_error)
}

/// The main background task managing the realtime connection.
///
/// Lifecycle:
/// 1. Establish a transport (preference order) and mark connected
/// 2. Event loop: inbound frames + outbound events + keepalive pings
/// 3. On transport loss: auto-reconnect with exponential backoff
/// 4. On shutdown command: close the transport and exit
async fn connection_task(
    ctx: TaskContext,
    mut cmd_rx: mpsc::Receiver<ConnCmd>,
    mut out_rx: mpsc::Receiver<ClientMessage>,
    ready_tx: Option<oneshot::Sender<Result<()>>>,
) {
    let mut ready_tx = ready_tx;
    let mut transport: Option<ActiveTransport> = None;
    let mut shutdown_requested = false;
    let mut out_open = true;
    let mut ever_connected = false;
    let mut reconnect_round: u32 = 0;

    // Keepalive configuration (WebSocket transport only).
    let keepalive_dur = if ctx.timeouts.keepalive_interval.is_zero() {
        FAR_FUTURE
    } else {
        ctx.timeouts.keepalive_interval
    };
    let has_keepalive = !ctx.timeouts.keepalive_interval.is_zero();
    let mut idle_deadline = TokioInstant::now() + keepalive_dur;

    // Pong timeout: after sending a Ping, some frame must arrive within
    // this window or the connection is considered dead.
    let pong_timeout_dur = ctx.timeouts.pong_timeout;
    let has_pong_timeout = has_keepalive && !pong_timeout_dur.is_zero();
    let mut awaiting_pong = false;
    let mut pong_deadline = TokioInstant::now() + FAR_FUTURE;

    // Initial connection attempt.
    match establish_transport(&ctx).await {
        Ok(t) => {
            ctx.mark_connected(t.kind(), false);
            ever_connected = true;
            transport = Some(t);
            idle_deadline = TokioInstant::now() + keepalive_dur;
            if let Some(tx) = ready_tx.take() {
                let _ = tx.send(Ok(()));
            }
        },
        Err(e) => {
            ctx.report_error(
                &format!("Initial connection failed: {}", e),
                ctx.options.auto_reconnect,
            );
            if let Some(tx) = ready_tx.take() {
                let _ = tx.send(Err(e));
            }
        },
    }

    loop {
        if shutdown_requested {
            if let Some(ref mut t) = transport {
                t.close().await;
            }
            let was_connected = ctx.state.is_connected();
            ctx.state.set(ConnectionState::Disconnected);
            *ctx.transport_label.lock().unwrap() = None;
            if was_connected {
                ctx.handlers
                    .emit_disconnect(DisconnectReason::new("Client disconnected"));
                ctx.lifecycle(
                    EventKind::Disconnect,
                    json!({ "reason": "Client disconnected", "code": null }),
                );
            }
            return;
        }

        if let Some(ref mut t) = transport {
            let is_ws = t.is_websocket();

            let idle_sleep = tokio::time::sleep_until(idle_deadline);
            tokio::pin!(idle_sleep);

            let pong_sleep = tokio::time::sleep_until(pong_deadline);
            tokio::pin!(pong_sleep);

            tokio::select! {
                biased;

                // Pong timeout: no frame arrived since our keepalive Ping.
                _ = &mut pong_sleep, if has_pong_timeout && awaiting_pong && is_ws => {
                    warn!(
                        "[paper-link] Pong timeout ({:?}) — server unresponsive",
                        pong_timeout_dur,
                    );
                    ctx.mark_disconnected(DisconnectReason::new(format!(
                        "Pong timeout ({:?}) — server unresponsive",
                        pong_timeout_dur,
                    )));
                    awaiting_pong = false;
                    transport = None;
                    continue;
                }

                // Commands from the public handle.
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(ConnCmd::Shutdown) | None => {
                            shutdown_requested = true;
                            continue;
                        },
                    }
                }

                // Outbound application events from the registry.
                out = out_rx.recv(), if out_open => {
                    match out {
                        Some(message) => {
                            match serde_json::to_string(&message) {
                                Ok(raw) => {
                                    if let Err(e) = t.send(&message, &raw).await {
                                        ctx.report_error(&format!("Send failed: {}", e), true);
                                        ctx.mark_disconnected(DisconnectReason::new(
                                            format!("Send failed: {}", e),
                                        ));
                                        transport = None;
                                        continue;
                                    }
                                    ctx.handlers.emit_send(&raw);
                                },
                                Err(e) => {
                                    warn!("[paper-link] Failed to serialize outbound event: {}", e);
                                },
                            }
                        },
                        None => {
                            out_open = false;
                        },
                    }
                }

                // Keepalive ping.
                _ = &mut idle_sleep, if has_keepalive && is_ws && !awaiting_pong => {
                    debug!(
                        "[paper-link] Keepalive: sending Ping (interval={:?})",
                        keepalive_dur,
                    );
                    if let Err(e) = t.send_ping().await {
                        warn!("[paper-link] {}", e);
                        ctx.mark_disconnected(DisconnectReason::new(format!(
                            "Keepalive ping failed: {}",
                            e,
                        )));
                        awaiting_pong = false;
                        transport = None;
                        continue;
                    }
                    ctx.handlers.emit_send("[ping]");
                    if has_pong_timeout {
                        awaiting_pong = true;
                        pong_deadline = TokioInstant::now() + pong_timeout_dur;
                    }
                    idle_deadline = TokioInstant::now() + keepalive_dur;
                }

                // Inbound transport frames.
                frame = t.next_frame() => {
                    // Any frame proves the connection is alive.
                    idle_deadline = TokioInstant::now() + keepalive_dur;
                    if awaiting_pong {
                        awaiting_pong = false;
                        pong_deadline = TokioInstant::now() + FAR_FUTURE;
                    }

                    match frame {
                        Ok(TransportFrame::Inbound { event, raw }) => {
                            ctx.handlers.emit_receive(&raw);
                            let kind = event.kind();
                            ctx.registry.dispatch(&kind, &event.payload);
                        },
                        Ok(TransportFrame::Keepalive) => {},
                        Ok(TransportFrame::Closed(reason)) => {
                            ctx.mark_disconnected(reason);
                            transport = None;
                            continue;
                        },
                        Err(e) => {
                            let message = e.to_string();
                            ctx.report_error(&message, true);
                            ctx.mark_disconnected(DisconnectReason::new(message));
                            transport = None;
                            continue;
                        },
                    }
                }
            }
        } else {
            // ── Not connected — reconnect or wait for shutdown ──────────

            if !ctx.options.auto_reconnect {
                ctx.state.set(ConnectionState::Disconnected);
                tokio::select! {
                    biased;
                    cmd = cmd_rx.recv() => {
                        match cmd {
                            Some(ConnCmd::Shutdown) | None => {
                                shutdown_requested = true;
                            },
                        }
                    }
                    out = out_rx.recv(), if out_open => {
                        match out {
                            Some(_) => debug!("[paper-link] Dropping outbound event while disconnected"),
                            None => out_open = false,
                        }
                    }
                }
                continue;
            }

            ctx.state.set(ConnectionState::Connecting);

            let attempt = reconnect_round;
            if let Some(max) = ctx.options.max_reconnect_attempts {
                if attempt >= max {
                    warn!("[paper-link] Max reconnection attempts ({}) reached", max);
                    ctx.report_error(
                        &format!("Max reconnection attempts ({}) reached", max),
                        false,
                    );
                    ctx.lifecycle(EventKind::ReconnectFailed, json!({ "attempts": attempt }));
                    ctx.state.set(ConnectionState::Disconnected);
                    // Remain idle until explicitly shut down.
                    loop {
                        match cmd_rx.recv().await {
                            Some(ConnCmd::Shutdown) | None => return,
                        }
                    }
                }
            }
            reconnect_round = attempt + 1;

            let delay = std::cmp::min(
                ctx.options
                    .reconnect_delay_ms
                    .saturating_mul(2u64.saturating_pow(attempt)),
                ctx.options.max_reconnect_delay_ms,
            );

            info!(
                "[paper-link] Attempting reconnection in {}ms (attempt {})",
                delay,
                attempt + 1
            );
            ctx.lifecycle(
                EventKind::ReconnectAttempt,
                json!({ "attempt": attempt + 1, "delay_ms": delay }),
            );

            // Wait out the backoff delay, still listening for shutdown.
            let sleep_fut = tokio::time::sleep(Duration::from_millis(delay));
            tokio::pin!(sleep_fut);

            let mut got_shutdown = false;
            loop {
                tokio::select! {
                    biased;
                    cmd = cmd_rx.recv() => {
                        match cmd {
                            Some(ConnCmd::Shutdown) | None => {
                                got_shutdown = true;
                                break;
                            },
                        }
                    }
                    out = out_rx.recv(), if out_open => {
                        match out {
                            Some(_) => debug!("[paper-link] Dropping outbound event while reconnecting"),
                            None => out_open = false,
                        }
                    }
                    _ = &mut sleep_fut => {
                        break;
                    }
                }
            }

            if got_shutdown {
                shutdown_requested = true;
                continue;
            }

            match establish_transport(&ctx).await {
                Ok(t) => {
                    info!("[paper-link] Reconnection successful");
                    reconnect_round = 0;
                    ctx.mark_connected(t.kind(), ever_connected);
                    ever_connected = true;
                    transport = Some(t);
                    idle_deadline = TokioInstant::now() + keepalive_dur;
                    awaiting_pong = false;
                    pong_deadline = TokioInstant::now() + FAR_FUTURE;
                },
                Err(e) => {
                    warn!(
                        "[paper-link] Reconnection attempt {} failed: {}",
                        attempt + 1,
                        e
                    );
                    ctx.lifecycle(
                        EventKind::ReconnectError,
                        json!({ "attempt": attempt + 1, "message": e.to_string() }),
                    );
                    ctx.handlers
                        .emit_error(ConnectionFault::new(e.to_string(), true));
                },
            }
        }
    }
}
