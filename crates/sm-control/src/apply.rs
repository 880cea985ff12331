//! Capability-gated user EQ apply

use std::fmt;

use rew_eq::BandSet;
use tracing::{debug, info, warn};

use crate::error::ApplyError;
use crate::session::DeviceSession;
use crate::version::ApiVersion;

/// How an apply run ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Bands were sent to the device
    Applied { api_version: ApiVersion },
    /// Device API is too old, nothing was sent
    Unsupported {
        api_version: ApiVersion,
        required: ApiVersion,
    },
}

impl ApplyOutcome {
    /// Returns true if the device was changed
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Version the device reported
    pub fn api_version(&self) -> &ApiVersion {
        match self {
            Self::Applied { api_version } | Self::Unsupported { api_version, .. } => api_version,
        }
    }
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied { .. } => write!(f, "User EQ applied"),
            Self::Unsupported {
                api_version,
                required,
            } => write!(
                f,
                "Device API {} does not support user EQ (requires {} or newer), no changes made",
                api_version, required
            ),
        }
    }
}

/// Send `bands` to the device if its API supports user EQ
///
/// The session must already be connected. The device is not contacted at
/// all for an empty set; otherwise the version is read once and the bands
/// are sent at most once. Session errors are returned unchanged.
pub async fn apply_user_eq<S>(bands: &BandSet, session: &mut S) -> Result<ApplyOutcome, ApplyError>
where
    S: DeviceSession,
{
    if bands.is_empty() {
        return Err(ApplyError::NothingToApply);
    }

    let reported = session.api_version().await?;
    let api_version: ApiVersion = reported.parse()?;
    let required = ApiVersion::user_eq_minimum();
    debug!("device reports API {}, user EQ needs {}", api_version, required);

    if api_version < required {
        warn!(
            "device API {} is older than {}, skipping user EQ",
            api_version, required
        );
        return Ok(ApplyOutcome::Unsupported {
            api_version,
            required,
        });
    }

    session.apply_bands(bands).await?;
    info!("applied {} bands (API {})", bands.len(), api_version);

    Ok(ApplyOutcome::Applied { api_version })
}
