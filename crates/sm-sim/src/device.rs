//! Virtual device session
//!
//! Provides an in-memory device that answers like a StreamMagic unit and
//! keeps a record of what was asked of it.

use rew_eq::BandSet;
use serde::{Deserialize, Serialize};
use sm_control::protocol::SystemInfo;
use sm_control::{DeviceSession, SessionError};
use tracing::debug;

/// Configuration for creating a virtual device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDeviceConfig {
    /// Friendly name reported in system info
    pub name: String,
    /// Model reported in system info
    pub model: String,
    /// API version reported in system info, returned as-is
    pub api_version: String,
}

impl Default for VirtualDeviceConfig {
    fn default() -> Self {
        Self {
            name: "Virtual StreamMagic".to_string(),
            model: "CXN (v2)".to_string(),
            api_version: "1.9".to_string(),
        }
    }
}

impl VirtualDeviceConfig {
    /// Default device reporting a different API version
    pub fn with_api_version(api_version: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            ..Default::default()
        }
    }

    /// System info payload for this device
    pub fn system_info(&self) -> SystemInfo {
        SystemInfo {
            api_version: self.api_version.clone(),
            name: Some(self.name.clone()),
            model: Some(self.model.clone()),
            unit_id: Some("virtual-0001".to_string()),
        }
    }
}

/// A simulated device session
#[derive(Debug, Default)]
pub struct VirtualStreamMagic {
    config: VirtualDeviceConfig,
    connected: bool,
    connect_failure: Option<SessionError>,
    apply_failure: Option<SessionError>,
    connect_calls: usize,
    version_calls: usize,
    apply_calls: usize,
    applied: Vec<BandSet>,
}

impl VirtualStreamMagic {
    /// Create a device reporting `api_version`
    pub fn new(api_version: impl Into<String>) -> Self {
        Self::from_config(VirtualDeviceConfig::with_api_version(api_version))
    }

    /// Create a device from configuration
    pub fn from_config(config: VirtualDeviceConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Make `connect` fail with `error`
    pub fn fail_connect(mut self, error: SessionError) -> Self {
        self.connect_failure = Some(error);
        self
    }

    /// Make `apply_bands` fail with `error`
    pub fn fail_apply(mut self, error: SessionError) -> Self {
        self.apply_failure = Some(error);
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Number of `connect` calls
    pub fn connect_calls(&self) -> usize {
        self.connect_calls
    }

    /// Number of `api_version` calls
    pub fn version_calls(&self) -> usize {
        self.version_calls
    }

    /// Number of `apply_bands` calls, failed ones included
    pub fn apply_calls(&self) -> usize {
        self.apply_calls
    }

    /// Number of calls that touched the network
    pub fn network_calls(&self) -> usize {
        self.connect_calls + self.version_calls + self.apply_calls
    }

    /// Band sets accepted, oldest first
    pub fn applied(&self) -> &[BandSet] {
        &self.applied
    }

    /// Current user EQ, if any was applied
    pub fn user_eq(&self) -> Option<&BandSet> {
        self.applied.last()
    }
}

impl DeviceSession for VirtualStreamMagic {
    async fn connect(&mut self) -> Result<(), SessionError> {
        self.connect_calls += 1;
        if let Some(error) = self.connect_failure.clone() {
            return Err(error);
        }
        self.connected = true;
        debug!("Virtual device {} connected", self.config.name);
        Ok(())
    }

    async fn api_version(&mut self) -> Result<String, SessionError> {
        self.version_calls += 1;
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        Ok(self.config.api_version.clone())
    }

    async fn apply_bands(&mut self, bands: &BandSet) -> Result<(), SessionError> {
        self.apply_calls += 1;
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        if let Some(error) = self.apply_failure.clone() {
            return Err(error);
        }
        debug!(
            "Virtual device {} accepted {} bands",
            self.config.name,
            bands.len()
        );
        self.applied.push(bands.clone());
        Ok(())
    }
}
