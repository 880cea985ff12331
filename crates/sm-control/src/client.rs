//! WebSocket session with a StreamMagic device
//!
//! One request is in flight at a time. While waiting for a response,
//! unsolicited updates and responses for other paths are discarded.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rew_eq::BandSet;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{client_async, WebSocketStream};
use tracing::{debug, info, trace, warn};

use crate::address::DeviceAddress;
use crate::error::SessionError;
use crate::protocol::{
    DeviceMessage, Request, SetUserEq, SystemInfo, UserEq, DEFAULT_ZONE, SMOIP_PATH, SYSTEM_INFO,
    ZONE_AUDIO,
};
use crate::session::DeviceSession;

type Socket = WebSocketStream<TcpStream>;

/// Port the device serves its control endpoint on
pub const DEFAULT_PORT: u16 = 80;

/// Configuration for a device session
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Limit for the handshake and for each request
    pub timeout: Duration,
    /// Zone whose user EQ is set
    pub zone: String,
    /// TCP port, `None` for [`DEFAULT_PORT`]
    pub port: Option<u16>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            zone: DEFAULT_ZONE.to_string(),
            port: None,
        }
    }
}

/// StreamMagic control client
pub struct StreamMagicClient {
    address: DeviceAddress,
    config: ClientConfig,
    socket: Option<Socket>,
}

impl StreamMagicClient {
    /// Create a client with default configuration
    pub fn new(address: DeviceAddress) -> Self {
        Self::with_config(address, ClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(address: DeviceAddress, config: ClientConfig) -> Self {
        Self {
            address,
            config,
            socket: None,
        }
    }

    /// Returns true once `connect` succeeded and until `close`
    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn authority(&self) -> String {
        match self.config.port {
            Some(port) => format!("{}:{}", self.address.url_host(), port),
            None => self.address.url_host(),
        }
    }

    /// WebSocket URL of the device's control endpoint
    pub fn url(&self) -> String {
        format!("ws://{}{}", self.authority(), SMOIP_PATH)
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout.as_millis() as u64
    }

    async fn open(&mut self) -> Result<(), SessionError> {
        let url = self.url();
        let connect_failed = |reason: String| SessionError::ConnectFailed {
            url: url.clone(),
            reason,
        };

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| connect_failed(e.to_string()))?;
        let origin = HeaderValue::from_str(&format!("ws://{}", self.authority()))
            .map_err(|e| connect_failed(e.to_string()))?;
        request.headers_mut().insert(ORIGIN, origin);

        // Connect the socket directly so a zone reaches it as a scope id,
        // the URL only feeds the handshake headers.
        let target = self
            .address
            .socket_addr(self.config.port.unwrap_or(DEFAULT_PORT))
            .map_err(|e| connect_failed(e.reason))?;

        debug!("Connecting to {} ({})", url, target);
        let handshake = async {
            let stream = TcpStream::connect(target).await.map_err(WsError::Io)?;
            client_async(request, stream).await
        };
        let (socket, _) = timeout(self.config.timeout, handshake)
            .await
            .map_err(|_| connect_failed(format!("timed out after {}ms", self.timeout_ms())))?
            .map_err(|e| connect_failed(e.to_string()))?;

        info!("Connected to StreamMagic device at {}", self.address);
        self.socket = Some(socket);
        Ok(())
    }

    /// Send a request and wait for its response
    pub async fn request(&mut self, path: &str, params: Value) -> Result<DeviceMessage, SessionError> {
        let after_ms = self.timeout_ms();
        let limit = self.config.timeout;
        let socket = self.socket.as_mut().ok_or(SessionError::NotConnected)?;

        let text = serde_json::to_string(&Request::new(path, params)).map_err(|e| {
            SessionError::Encode {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })?;
        trace!("-> {}", text);
        socket
            .send(Message::Text(text))
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let response = timeout(limit, wait_for_response(socket, path))
            .await
            .map_err(|_| SessionError::Timeout {
                path: path.to_string(),
                after_ms,
            })??;

        if !response.is_ok() {
            return Err(SessionError::Rejected {
                path: path.to_string(),
                code: response.result.unwrap_or_default(),
                message: response.message.clone().unwrap_or_default(),
            });
        }
        Ok(response)
    }

    /// Fetch `/system/info`
    pub async fn system_info(&mut self) -> Result<SystemInfo, SessionError> {
        let response = self.request(SYSTEM_INFO, json!({})).await?;
        let data = response
            .data()
            .cloned()
            .ok_or_else(|| SessionError::InvalidResponse("system info without data".into()))?;
        serde_json::from_value(data).map_err(|e| SessionError::InvalidResponse(e.to_string()))
    }

    /// Replace the zone's user EQ
    pub async fn set_user_eq(&mut self, bands: &BandSet) -> Result<(), SessionError> {
        let params = SetUserEq {
            zone: self.config.zone.clone(),
            user_eq: UserEq::from(bands),
        };
        let params = serde_json::to_value(params).map_err(|e| SessionError::Encode {
            path: ZONE_AUDIO.to_string(),
            reason: e.to_string(),
        })?;
        self.request(ZONE_AUDIO, params).await?;
        Ok(())
    }

    /// Close the connection
    pub async fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.close(None).await {
                debug!("Error closing connection to {}: {}", self.address, e);
            }
        }
    }
}

async fn wait_for_response(socket: &mut Socket, path: &str) -> Result<DeviceMessage, SessionError> {
    loop {
        let frame = socket
            .next()
            .await
            .ok_or(SessionError::Closed)?
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => return Err(SessionError::Closed),
            other => {
                trace!("Ignoring non-text frame: {:?}", other);
                continue;
            }
        };
        trace!("<- {}", text);

        let message: DeviceMessage = match serde_json::from_str(&text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Ignoring undecodable message: {}", e);
                continue;
            }
        };

        if message.answers(path) {
            return Ok(message);
        }
        trace!("Skipping {:?} message for {}", message.kind, message.path);
    }
}

impl DeviceSession for StreamMagicClient {
    async fn connect(&mut self) -> Result<(), SessionError> {
        if self.is_connected() {
            return Ok(());
        }
        self.open().await
    }

    async fn api_version(&mut self) -> Result<String, SessionError> {
        let info = self.system_info().await?;
        debug!(
            "Device {} reports API {}",
            info.name.as_deref().unwrap_or("<unnamed>"),
            info.api_version
        );
        Ok(info.api_version)
    }

    async fn apply_bands(&mut self, bands: &BandSet) -> Result<(), SessionError> {
        self.set_user_eq(bands).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url() {
        let client = StreamMagicClient::new("192.168.1.29".parse().unwrap());
        assert_eq!(client.url(), "ws://192.168.1.29/smoip");

        let client = StreamMagicClient::new("fe80::1%eth0".parse().unwrap());
        assert_eq!(client.url(), "ws://[fe80::1%25eth0]/smoip");

        let config = ClientConfig {
            port: Some(8080),
            ..Default::default()
        };
        let client = StreamMagicClient::with_config("::1".parse().unwrap(), config);
        assert_eq!(client.url(), "ws://[::1]:8080/smoip");
    }

    #[tokio::test]
    async fn test_requests_need_connection() {
        let mut client = StreamMagicClient::new("127.0.0.1".parse().unwrap());
        assert!(!client.is_connected());
        assert_eq!(
            client.api_version().await,
            Err(SessionError::NotConnected)
        );
        assert_eq!(
            client.apply_bands(&BandSet::default()).await,
            Err(SessionError::NotConnected)
        );
    }
}
