//! CDP websocket client.
//!
//! One websocket per browser. Page sessions are multiplexed over it with
//! flattened `sessionId`s, so the connection (sink, id counter, pending map)
//! is shared between the client and every [`PageSession`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::error::CdpError;
use crate::protocol::{BrowserVersion, CdpRequest, CdpResponse, PageInfo};
use crate::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;

/// Upper bound on a single command round trip.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) struct Connection {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Pending,
}

impl Connection {
    pub(crate) async fn call(&self, method: &str, params: Option<Value>, session_id: Option<&str>) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(str::to_string),
        };
        let text = serde_json::to_string(&request)?;
        trace!(%text, "cdp send");

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let sent = {
            let mut ws = self.ws_tx.lock().await;
            ws.send(Message::Text(text.into())).await
        };
        if let Err(e) = sent {
            self.pending.lock().remove(&id);
            return Err(e.into());
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("{method} got no response")))
            }
        }
    }
}

pub struct CdpClient {
    http_endpoint: String,
    conn: Arc<Connection>,
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to a browser exposing `endpoint` (e.g. `http://127.0.0.1:9222`).
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();
        let version = fetch_version(&http_endpoint).await?;
        debug!(browser = %version.browser, protocol = %version.protocol_version, "found browser");

        let ws_url = url::Url::parse(&version.web_socket_debugger_url)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(ws_url.as_str())
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("websocket: {e}")))?;
        let (sink, source) = ws_stream.split();

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let recv_task = tokio::spawn(receive_loop(source, pending.clone()));

        debug!(url = %ws_url, "cdp client connected");
        Ok(Self {
            http_endpoint,
            conn: Arc::new(Connection {
                ws_tx: tokio::sync::Mutex::new(sink),
                request_id: AtomicU64::new(1),
                pending,
            }),
            recv_task,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.http_endpoint
    }

    /// Browser-level command (no session).
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.conn.call(method, params, None).await
    }

    /// Open a blank tab and attach a flattened session to it.
    pub async fn new_page(&self) -> Result<PageSession, CdpError> {
        // Chrome only accepts PUT on /json/new.
        let page: PageInfo = reqwest::Client::new()
            .put(format!("{}/json/new", self.http_endpoint))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(target_id = %page.id, kind = %page.page_type, "created page");

        // Close a tab we opened but could not drive.
        let attached = self.attach(&page.id).await;
        close_on_error(attached, || self.close_page(&page.id)).await
    }

    async fn attach(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call("Target.attachToTarget", Some(json!({"targetId": target_id, "flatten": true})))
            .await?;
        let session_id = session_id_from(&result)?;

        let session = PageSession::new(target_id.to_string(), session_id, self.conn.clone());
        session.enable_domains().await?;
        Ok(session)
    }

    pub async fn close_page(&self, target_id: &str) -> Result<(), CdpError> {
        self.call("Target.closeTarget", Some(json!({"targetId": target_id})))
            .await
            .map(|_| ())
    }

    /// Ask the browser process to exit.
    pub async fn close_browser(&self) -> Result<(), CdpError> {
        self.call("Browser.close", None).await.map(|_| ())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

/// GET `/json/version`; any failure means nothing usable is listening.
pub async fn fetch_version(http_endpoint: &str) -> Result<BrowserVersion, CdpError> {
    let url = format!("{http_endpoint}/json/version");
    let unavailable = |e: reqwest::Error| CdpError::ChromeNotAvailable(format!("{http_endpoint}: {e}"));
    reqwest::get(&url).await.map_err(unavailable)?.json().await.map_err(unavailable)
}

async fn receive_loop(mut source: WsSource, pending: Pending) {
    while let Some(msg) = source.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                trace!(text = %text.as_str(), "cdp recv");
                match serde_json::from_str::<CdpResponse>(&text) {
                    Ok(resp) => dispatch(resp, &pending),
                    Err(e) => warn!(error = %e, "unparseable cdp message"),
                }
            }
            Ok(Message::Close(_)) => {
                debug!("cdp websocket closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "cdp websocket error");
                break;
            }
            _ => {}
        }
    }
    // Wake every waiter; their senders drop here and they see SessionClosed.
    pending.lock().clear();
}

fn dispatch(resp: CdpResponse, pending: &Pending) {
    let Some(id) = resp.id else {
        if let Some(method) = resp.method {
            trace!(%method, session = resp.session_id.as_deref().unwrap_or(""), "cdp event");
        }
        return;
    };
    let Some(tx) = pending.lock().remove(&id) else {
        return;
    };
    let result = match resp.error {
        Some(err) => Err(CdpError::Protocol {
            code: err.code,
            message: err.message,
        }),
        None => Ok(resp.result.unwrap_or(Value::Null)),
    };
    let _ = tx.send(result);
}

fn session_id_from(result: &Value) -> Result<String, CdpError> {
    result["sessionId"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| CdpError::InvalidResponse("missing sessionId".to_string()))
}

/// Run `close` when `result` failed, keeping the original error.
async fn close_on_error<T, C, Fut>(result: Result<T, CdpError>, close: C) -> Result<T, CdpError>
where
    C: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<(), CdpError>>,
{
    if let Err(err) = &result {
        if let Err(close_err) = close().await {
            warn!(error = %close_err, cause = %err, "failed to close page after setup error");
        }
    }
    result
}
