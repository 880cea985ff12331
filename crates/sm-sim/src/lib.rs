//! StreamMagic Simulation Library
//!
//! This crate provides virtual StreamMagic devices for exercising the apply
//! flow without hardware:
//!
//! - **VirtualStreamMagic**: in-memory [`DeviceSession`](sm_control::DeviceSession)
//!   that records every call and can be told to fail
//! - **VirtualServer**: loopback WebSocket server speaking the device's JSON
//!   protocol, for driving a real [`StreamMagicClient`](sm_control::StreamMagicClient)
//!
//! # Example
//!
//! ```rust
//! use sm_control::{apply_user_eq, DeviceSession};
//! use sm_sim::VirtualStreamMagic;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let bands = rew_eq::parse_str("Filter 1: ON PK Fc 63 Hz Gain -3.5 dB Q 2.0").unwrap();
//!
//! let mut device = VirtualStreamMagic::new("1.8");
//! device.connect().await.unwrap();
//! let outcome = apply_user_eq(&bands, &mut device).await.unwrap();
//!
//! assert!(!outcome.is_applied());
//! assert_eq!(device.apply_calls(), 0);
//! # });
//! ```

pub mod device;
pub mod server;

pub use device::{VirtualDeviceConfig, VirtualStreamMagic};
pub use server::VirtualServer;
