//! StreamMagic WebSocket message format
//!
//! The device serves a JSON protocol on `ws://<host>/smoip`. Every request
//! names an endpoint path and carries a `params` object:
//!
//! ```text
//! -> {"path": "/system/info", "params": {}}
//! <- {"path": "/system/info", "type": "response", "result": 200,
//!     "message": "OK", "params": {"data": {"api": "1.9", ...}}}
//! ```
//!
//! The device also pushes `"type": "update"` messages for subscribed paths,
//! which may arrive between a request and its response.

use rew_eq::{Band, BandSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// WebSocket endpoint on the device
pub const SMOIP_PATH: &str = "/smoip";

/// System information endpoint
pub const SYSTEM_INFO: &str = "/system/info";

/// Zone audio settings endpoint, carries user EQ
pub const ZONE_AUDIO: &str = "/zone/audio";

/// Zone addressed when none is configured
pub const DEFAULT_ZONE: &str = "ZONE1";

/// Result code of a successful request
pub const RESULT_OK: i64 = 200;

/// Request sent to the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub path: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    pub fn new(path: impl Into<String>, params: Value) -> Self {
        Self {
            path: path.into(),
            params,
        }
    }
}

/// Kind of message received from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Answer to a request
    Response,
    /// Unsolicited state update
    Update,
    #[serde(other)]
    Other,
}

/// Message received from the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMessage {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub params: Value,
}

impl DeviceMessage {
    /// Returns true if this is the response to a request on `path`
    pub fn answers(&self, path: &str) -> bool {
        self.kind == MessageKind::Response && self.path == path
    }

    /// Returns true if the result code signals success
    ///
    /// A response without a result code is treated as success.
    pub fn is_ok(&self) -> bool {
        self.result.map_or(true, |code| code == RESULT_OK)
    }

    /// The `params.data` payload
    pub fn data(&self) -> Option<&Value> {
        self.params.get("data")
    }
}

/// Fields of `/system/info` this tool reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Control API version, dotted numeric
    #[serde(rename = "api")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
}

/// One band of the device's user EQ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEqBand {
    pub index: u32,
    pub filter: String,
    pub freq: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<f64>,
}

impl From<&Band> for UserEqBand {
    fn from(band: &Band) -> Self {
        Self {
            index: band.index,
            filter: band.kind.as_str().to_string(),
            freq: band.frequency_hz,
            gain: band.gain_db,
            q: band.q,
        }
    }
}

/// The device's user EQ
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserEq {
    pub bands: Vec<UserEqBand>,
}

impl From<&BandSet> for UserEq {
    fn from(bands: &BandSet) -> Self {
        Self {
            bands: bands.iter().map(UserEqBand::from).collect(),
        }
    }
}

/// `params` of a `/zone/audio` request setting user EQ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetUserEq {
    pub zone: String,
    pub user_eq: UserEq,
}
