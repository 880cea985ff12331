//! Virtual device WebSocket server
//!
//! Binds a loopback port and answers the StreamMagic JSON protocol the way a
//! device does. Each connection runs in its own task and shares one device
//! state, so tests can inspect what a client sent after the fact.
//!
//! Before every response the server pushes an unsolicited update, which a
//! client has to skip while waiting for its answer.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use sm_control::protocol::{
    DeviceMessage, MessageKind, Request, SetUserEq, RESULT_OK, SMOIP_PATH, SYSTEM_INFO, ZONE_AUDIO,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request as HttpRequest, Response};
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};
use tracing::{debug, info, warn};

use crate::device::VirtualDeviceConfig;

/// Path of the update pushed before every response
const UPDATE_PATH: &str = "/zone/state";

#[derive(Debug, Default)]
struct DeviceState {
    config: VirtualDeviceConfig,
    user_eq_requests: Vec<SetUserEq>,
    origins: Vec<String>,
    rejection: Option<(i64, String)>,
    muted: bool,
}

/// Loopback WebSocket server simulating one device
pub struct VirtualServer {
    addr: SocketAddr,
    state: Arc<Mutex<DeviceState>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl VirtualServer {
    /// Bind `127.0.0.1` on an ephemeral port and start serving
    pub async fn start(config: VirtualDeviceConfig) -> io::Result<Self> {
        Self::start_on(SocketAddr::from(([127, 0, 0, 1], 0)), config).await
    }

    /// Bind `addr` and start serving
    pub async fn start_on(addr: SocketAddr, config: VirtualDeviceConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(DeviceState {
            config,
            ..Default::default()
        }));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        info!("Virtual StreamMagic listening on {}", addr);
        let task = tokio::spawn(accept_loop(listener, state.clone(), shutdown_rx));

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }

    /// Address the server listens on
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        lock(&self.state)
    }

    /// User EQ requests accepted so far, oldest first
    pub fn user_eq_requests(&self) -> Vec<SetUserEq> {
        self.state().user_eq_requests.clone()
    }

    /// `Origin` headers sent by clients during the handshake
    pub fn origins(&self) -> Vec<String> {
        self.state().origins.clone()
    }

    /// Answer user EQ requests with an error result
    pub fn reject_user_eq(&self, code: i64, message: impl Into<String>) {
        self.state().rejection = Some((code, message.into()));
    }

    /// Stop answering requests, connections stay open
    pub fn set_muted(&self, muted: bool) {
        self.state().muted = muted;
    }

    /// Stop accepting connections and wait for the accept loop to end
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            warn!("Virtual server task ended abnormally: {}", e);
        }
    }
}

fn lock(state: &Mutex<DeviceState>) -> MutexGuard<'_, DeviceState> {
    // A panicking connection task must not hide the recorded requests.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn accept_loop(
    listener: TcpListener,
    state: Arc<Mutex<DeviceState>>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                debug!("Virtual server shutting down");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("Virtual server accepted {}", peer);
                    tokio::spawn(serve_connection(stream, state.clone()));
                }
                Err(e) => {
                    warn!("Virtual server accept failed: {}", e);
                    break;
                }
            }
        }
    }
}

async fn serve_connection(stream: TcpStream, state: Arc<Mutex<DeviceState>>) {
    let handshake_state = state.clone();
    let callback = move |req: &HttpRequest, resp: Response| -> Result<Response, ErrorResponse> {
        if req.uri().path() != SMOIP_PATH {
            let mut error = ErrorResponse::new(Some("not found".to_string()));
            *error.status_mut() = StatusCode::NOT_FOUND;
            return Err(error);
        }
        if let Some(origin) = req.headers().get(ORIGIN).and_then(|v| v.to_str().ok()) {
            lock(&handshake_state).origins.push(origin.to_string());
        }
        Ok(resp)
    };

    let mut ws = match accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!("Virtual server handshake failed: {}", e);
            return;
        }
    };

    while let Some(frame) = ws.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!("Virtual server connection error: {}", e);
                break;
            }
        };

        let request: Request = match serde_json::from_str(&text) {
            Ok(request) => request,
            Err(e) => {
                warn!("Virtual server got undecodable request: {}", e);
                continue;
            }
        };

        let Some(response) = handle_request(&state, &request) else {
            continue;
        };

        let update = DeviceMessage {
            path: UPDATE_PATH.to_string(),
            kind: MessageKind::Update,
            result: None,
            message: None,
            params: json!({"data": {"power": true}}),
        };
        if send(&mut ws, &update).await.is_err() || send(&mut ws, &response).await.is_err() {
            break;
        }
    }
}

fn handle_request(state: &Mutex<DeviceState>, request: &Request) -> Option<DeviceMessage> {
    let mut state = lock(state);
    if state.muted {
        debug!("Virtual server muted, dropping {}", request.path);
        return None;
    }

    let response = match request.path.as_str() {
        SYSTEM_INFO => match serde_json::to_value(state.config.system_info()) {
            Ok(info) => respond(&request.path, RESULT_OK, "OK", info),
            Err(e) => respond(&request.path, 500, &e.to_string(), Value::Null),
        },
        ZONE_AUDIO => match serde_json::from_value::<SetUserEq>(request.params.clone()) {
            Ok(params) => {
                if let Some((code, message)) = state.rejection.clone() {
                    respond(&request.path, code, &message, Value::Null)
                } else {
                    state.user_eq_requests.push(params);
                    respond(&request.path, RESULT_OK, "OK", json!({}))
                }
            }
            Err(e) => respond(&request.path, 400, &e.to_string(), Value::Null),
        },
        _ => respond(&request.path, 404, "Not Found", Value::Null),
    };
    Some(response)
}

fn respond(path: &str, code: i64, message: &str, data: Value) -> DeviceMessage {
    DeviceMessage {
        path: path.to_string(),
        kind: MessageKind::Response,
        result: Some(code),
        message: Some(message.to_string()),
        params: json!({ "data": data }),
    }
}

async fn send(
    ws: &mut WebSocketStream<TcpStream>,
    message: &DeviceMessage,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    // DeviceMessage only holds strings, numbers and JSON values.
    let text = serde_json::to_string(message).unwrap_or_default();
    ws.send(Message::Text(text)).await
}
