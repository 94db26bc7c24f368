//! Persistent Realtime subscription
//!
//! Maintains a long-lived WebSocket connection joined to one
//! `postgres_changes` channel and forwards every change as a
//! [`FeedEvent::Change`]. Handles reconnection automatically with
//! exponential backoff.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::message::{PhoenixMessage, PHOENIX_TOPIC, PHX_CLOSE, PHX_ERROR, PHX_REPLY, SYSTEM};
use crate::error::{StoreError, StoreResult};
use crate::store::{ChangeFilter, ConnectionStatus, FeedCommand, FeedEvent, Subscription};

type WsRead = futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Configuration for a realtime subscription
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// WebSocket URL including apikey and vsn parameters
    pub url: String,
    /// Token sent with the join
    pub access_token: String,
    /// Table and events to listen for
    pub filter: ChangeFilter,
    /// Interval between socket heartbeats
    pub heartbeat_interval: Duration,
    /// Unanswered heartbeats before the connection is treated as dead
    pub max_missed_heartbeats: u32,
    /// How long to wait for the join reply
    pub join_timeout: Duration,
    /// Initial reconnect delay
    pub initial_reconnect_delay: Duration,
    /// Maximum reconnect delay
    pub max_reconnect_delay: Duration,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            access_token: String::new(),
            filter: ChangeFilter::all(crate::config::DEFAULT_SCHEMA, crate::config::DEFAULT_TABLE),
            heartbeat_interval: Duration::from_secs(25),
            max_missed_heartbeats: 2,
            join_timeout: Duration::from_secs(10),
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
        }
    }
}

/// Monotonic message reference counter
#[derive(Debug, Default)]
struct RefCounter(u64);

impl RefCounter {
    fn next(&mut self) -> String {
        self.0 += 1;
        self.0.to_string()
    }
}

/// Spawn a realtime subscription task
///
/// Returns a handle to receive change events and stop the task.
/// The task will automatically reconnect on disconnection.
pub fn spawn_realtime_task(config: RealtimeConfig) -> Subscription {
    let (command_tx, command_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::channel(64);
    let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);

    tokio::spawn(realtime_task_loop(config, command_rx, event_tx, status_tx));

    Subscription::new(event_rx, command_tx, status_rx)
}

/// Main subscription loop with reconnection
async fn realtime_task_loop(
    config: RealtimeConfig,
    mut command_rx: mpsc::Receiver<FeedCommand>,
    event_tx: mpsc::Sender<FeedEvent>,
    status_tx: watch::Sender<ConnectionStatus>,
) {
    let mut refs = RefCounter::default();
    let mut reconnect_delay = config.initial_reconnect_delay;

    loop {
        set_status(&status_tx, &event_tx, ConnectionStatus::Connecting).await;

        match connect_and_listen(
            &config,
            &mut refs,
            &mut command_rx,
            &event_tx,
            &status_tx,
        )
        .await
        {
            Ok(true) => {
                set_status(&status_tx, &event_tx, ConnectionStatus::Disconnected).await;
                info!("Realtime subscription to {} stopped", config.filter.topic());
                break;
            }
            Ok(false) => {
                // Connection closed normally, reset backoff
                reconnect_delay = config.initial_reconnect_delay;
            }
            Err(e) => {
                warn!("Realtime connection error: {}", e);
                let _ = event_tx
                    .send(FeedEvent::Error(format!("Connection error: {}", e)))
                    .await;
            }
        }

        set_status(&status_tx, &event_tx, ConnectionStatus::Disconnected).await;

        // Wait before reconnecting, but check for shutdown command
        tokio::select! {
            _ = tokio::time::sleep(reconnect_delay) => {
                reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
            }
            cmd = command_rx.recv() => {
                match cmd {
                    Some(FeedCommand::Shutdown) | None => break,
                }
            }
        }
    }
}

/// Connect, join the channel and forward events until disconnection
///
/// Returns `Ok(true)` on shutdown, `Ok(false)` when the server closed the
/// connection or the channel.
async fn connect_and_listen(
    config: &RealtimeConfig,
    refs: &mut RefCounter,
    command_rx: &mut mpsc::Receiver<FeedCommand>,
    event_tx: &mpsc::Sender<FeedEvent>,
    status_tx: &watch::Sender<ConnectionStatus>,
) -> StoreResult<bool> {
    let topic = config.filter.topic();

    debug!("Connecting to realtime endpoint");
    let (ws_stream, _) = connect_async(&config.url).await?;
    let (mut write, mut read) = ws_stream.split();

    let join_ref = refs.next();
    let join = PhoenixMessage::join(&config.filter, &config.access_token, &join_ref);
    write.send(Message::Text(join.encode())).await?;

    wait_for_join(&mut read, &topic, &join_ref, config.join_timeout).await?;

    info!("Subscribed to changes on {}", topic);
    set_status(status_tx, event_tx, ConnectionStatus::Subscribed).await;

    let start = tokio::time::Instant::now() + config.heartbeat_interval;
    let mut heartbeat = tokio::time::interval_at(start, config.heartbeat_interval);
    let mut pending_heartbeat: Option<String> = None;
    let mut missed_heartbeats = 0u32;

    loop {
        tokio::select! {
            cmd = command_rx.recv() => {
                match cmd {
                    Some(FeedCommand::Shutdown) | None => {
                        let leave = PhoenixMessage::leave(&topic, &refs.next());
                        write.send(Message::Text(leave.encode())).await.ok();
                        write.close().await.ok();
                        return Ok(true);
                    }
                }
            }

            _ = heartbeat.tick() => {
                if pending_heartbeat.is_some() {
                    missed_heartbeats += 1;
                    if missed_heartbeats >= config.max_missed_heartbeats {
                        return Err(StoreError::Realtime(format!(
                            "No heartbeat reply after {} attempts",
                            missed_heartbeats
                        )));
                    }
                    debug!("Heartbeat reply missing ({} so far)", missed_heartbeats);
                }

                let beat_ref = refs.next();
                let beat = PhoenixMessage::heartbeat(&beat_ref);
                write.send(Message::Text(beat.encode())).await?;
                pending_heartbeat = Some(beat_ref);
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let frame = match PhoenixMessage::decode(&text) {
                            Ok(frame) => frame,
                            Err(e) => {
                                debug!("Ignoring undecodable realtime frame: {}", e);
                                continue;
                            }
                        };

                        if frame.topic == PHOENIX_TOPIC {
                            if frame.event == PHX_REPLY
                                && frame.msg_ref.is_some()
                                && frame.msg_ref == pending_heartbeat
                            {
                                pending_heartbeat = None;
                                missed_heartbeats = 0;
                            }
                            continue;
                        }

                        if frame.topic != topic {
                            continue;
                        }

                        if let Some(change) = frame.as_change() {
                            debug!("Change notification: {:?}", change.kind);
                            let _ = event_tx.send(FeedEvent::Change(change)).await;
                            continue;
                        }

                        match frame.event.as_str() {
                            PHX_ERROR => {
                                return Err(StoreError::Realtime(
                                    frame.reason().unwrap_or_else(|| "channel error".to_string()),
                                ));
                            }
                            PHX_CLOSE => {
                                info!("Realtime channel {} closed by server", topic);
                                return Ok(false);
                            }
                            SYSTEM => {
                                if frame.payload.get("status").and_then(|s| s.as_str()) == Some("error") {
                                    let reason = frame.reason().unwrap_or_else(|| "subscription error".to_string());
                                    warn!("Realtime system error: {}", reason);
                                    let _ = event_tx.send(FeedEvent::Error(reason)).await;
                                }
                            }
                            _ => {}
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        // Connection closed
                        return Ok(false);
                    }
                    Some(Err(e)) => {
                        return Err(e.into());
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Wait for the reply to our join
async fn wait_for_join(
    read: &mut WsRead,
    topic: &str,
    join_ref: &str,
    timeout: Duration,
) -> StoreResult<()> {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return Err(StoreError::Realtime(
                "Timeout waiting for channel join reply".to_string(),
            ));
        }

        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(frame) = PhoenixMessage::decode(&text) else {
                            continue;
                        };
                        if frame.topic != topic
                            || frame.event != PHX_REPLY
                            || frame.msg_ref.as_deref() != Some(join_ref)
                        {
                            continue;
                        }
                        return match frame.reply_status() {
                            Some("ok") => Ok(()),
                            _ => Err(StoreError::Realtime(format!(
                                "Join rejected: {}",
                                frame.reason().unwrap_or_else(|| "unknown reason".to_string())
                            ))),
                        };
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(StoreError::Realtime(
                            "Connection closed during channel join".to_string(),
                        ));
                    }
                    Some(Err(e)) => return Err(e.into()),
                    _ => {}
                }
            }
            _ = tokio::time::sleep(remaining) => {
                return Err(StoreError::Realtime(
                    "Timeout waiting for channel join reply".to_string(),
                ));
            }
        }
    }
}

async fn set_status(
    status_tx: &watch::Sender<ConnectionStatus>,
    event_tx: &mpsc::Sender<FeedEvent>,
    status: ConnectionStatus,
) {
    let _ = status_tx.send(status);
    let _ = event_tx.send(FeedEvent::StatusChanged(status)).await;
}
