//! StreamMagic Control Library
//!
//! This crate pushes parametric equalizer bands to a Cambridge Audio
//! StreamMagic device, but only when the device reports an API version that
//! supports user EQ.
//!
//! # Architecture
//!
//! - [`DeviceSession`] is the seam between the apply logic and the network.
//!   [`StreamMagicClient`] implements it over the device's WebSocket control
//!   protocol; the `sm-sim` crate provides virtual implementations.
//! - [`apply_user_eq`] reads the reported version once, compares it with
//!   [`USER_EQ_MIN_VERSION`] and sends the bands at most once.
//! - [`ApiVersion`] is a dotted numeric version, so `1.10` sorts after `1.9`.
//! - [`DeviceAddress`] validates the IP literal a session is built from.
//!
//! # Example
//!
//! ```rust,no_run
//! use sm_control::{apply_user_eq, DeviceAddress, DeviceSession, StreamMagicClient};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let bands = rew_eq::parse_str("Filter 1: ON PK Fc 63 Hz Gain -3.5 dB Q 2.0")?;
//! let address: DeviceAddress = "192.168.1.29".parse()?;
//!
//! let mut client = StreamMagicClient::new(address);
//! client.connect().await?;
//! let outcome = apply_user_eq(&bands, &mut client).await?;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod apply;
pub mod client;
pub mod error;
pub mod protocol;
pub mod session;
pub mod version;

pub use address::DeviceAddress;
pub use apply::{apply_user_eq, ApplyOutcome};
pub use client::{ClientConfig, StreamMagicClient};
pub use error::{AddressError, ApplyError, SessionError, VersionError};
pub use session::DeviceSession;
pub use version::{ApiVersion, USER_EQ_MIN_VERSION};
