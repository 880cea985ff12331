//! Device session abstraction

use std::future::Future;

use rew_eq::BandSet;

use crate::error::SessionError;

/// An open control connection to a StreamMagic device
///
/// Implemented by [`StreamMagicClient`](crate::StreamMagicClient) for real
/// hardware and by the virtual devices in `sm-sim` for tests. Timeouts are
/// the implementation's concern.
pub trait DeviceSession {
    /// Establish the connection
    fn connect(&mut self) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Fetch the API version the device advertises, unparsed
    fn api_version(&mut self) -> impl Future<Output = Result<String, SessionError>> + Send;

    /// Replace the device's user EQ with these bands in one request
    fn apply_bands(
        &mut self,
        bands: &BandSet,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;
}
