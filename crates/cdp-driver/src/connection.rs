use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use crate::{CdpError, Result};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// A protocol event (a message with `method` and no `id`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpEvent {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub session_id: Option<String>,
}

type Pending = Arc<Mutex<HashMap<u64, (String, oneshot::Sender<Result<Value>>)>>>;

/// JSON-RPC over the DevTools WebSocket.
///
/// Requests carry a monotonically increasing `id`; the reader task routes
/// each response to the caller waiting on that id. Everything else is an
/// event and goes to [`CdpConnection::subscribe`] receivers.
pub struct CdpConnection {
    outgoing: mpsc::UnboundedSender<String>,
    pending: Pending,
    events: broadcast::Sender<CdpEvent>,
    closed: Arc<AtomicBool>,
    next_id: AtomicU64,
    call_timeout: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl CdpConnection {
    pub async fn connect(ws_url: &str) -> Result<Self> {
        tracing::debug!(url = ws_url, "connecting to DevTools");
        let (stream, _resp) = connect_async(ws_url).await?;
        let (mut sink, mut stream) = stream.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (events, _) = broadcast::channel(256);
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let writer = tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if let Err(e) = sink.send(WsMessage::text(text)).await {
                    tracing::warn!(error = %e, "DevTools write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = {
            let pending = Arc::clone(&pending);
            let events = events.clone();
            let closed = Arc::clone(&closed);
            tokio::spawn(async move {
                while let Some(frame) = stream.next().await {
                    match frame {
                        Ok(WsMessage::Text(txt)) => dispatch(txt.as_str(), &pending, &events),
                        Ok(WsMessage::Close(_)) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "DevTools read failed");
                            break;
                        }
                        _ => {}
                    }
                }
                closed.store(true, Ordering::SeqCst);
                fail_all(&pending);
                tracing::debug!("DevTools connection closed");
            })
        };

        Ok(Self {
            outgoing: out_tx,
            pending,
            events,
            closed,
            next_id: AtomicU64::new(1),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            tasks: vec![writer, reader],
        })
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CdpEvent> {
        self.events.subscribe()
    }

    /// Send `method` and wait for its response `result`.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        if self.is_closed() {
            return Err(CdpError::ConnectionClosed);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, (method.to_string(), tx));

        // The reader may have drained `pending` between the check and insert.
        if self.is_closed() {
            lock(&self.pending).remove(&id);
            return Err(CdpError::ConnectionClosed);
        }

        let frame = json!({ "id": id, "method": method, "params": params }).to_string();
        tracing::debug!(id, method, "cdp call");
        if self.outgoing.send(frame).is_err() {
            lock(&self.pending).remove(&id);
            return Err(CdpError::ConnectionClosed);
        }

        match tokio::time::timeout(self.call_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::ConnectionClosed),
            Err(_) => {
                lock(&self.pending).remove(&id);
                Err(CdpError::Timeout {
                    what: format!("response to {method}"),
                    waited: self.call_timeout,
                })
            }
        }
    }
}

impl Drop for CdpConnection {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn dispatch(text: &str, pending: &Pending, events: &broadcast::Sender<CdpEvent>) {
    let msg: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed DevTools frame");
            return;
        }
    };

    if let Some(id) = msg.get("id").and_then(Value::as_u64) {
        let Some((method, tx)) = lock(pending).remove(&id) else {
            tracing::debug!(id, "response for unknown or expired call");
            return;
        };
        let outcome = match msg.get("error") {
            Some(err) => Err(CdpError::Protocol {
                method,
                code: err.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            }),
            None => Ok(msg.get("result").cloned().unwrap_or(Value::Null)),
        };
        let _ = tx.send(outcome);
        return;
    }

    if msg.get("method").is_some() {
        match serde_json::from_value::<CdpEvent>(msg) {
            Ok(event) => {
                tracing::trace!(method = %event.method, "cdp event");
                // No receivers is fine.
                let _ = events.send(event);
            }
            Err(e) => tracing::warn!(error = %e, "ignoring malformed DevTools event"),
        }
    }
}

fn fail_all(pending: &Pending) {
    for (_, (_, tx)) in lock(pending).drain() {
        let _ = tx.send(Err(CdpError::ConnectionClosed));
    }
}
