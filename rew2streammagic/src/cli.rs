//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;
use sm_control::{AddressError, DeviceAddress};

use crate::settings::Settings;

/// Apply the first seven bands of a REW filter export to a StreamMagic device.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// REW filter settings export (text format).
    pub file: PathBuf,

    /// Device IP address, IPv4 or IPv6 (e.g. 192.168.1.29, 2001:db8::1, fe80::1%eth0).
    pub address: Option<String>,

    /// Device IP address, alternative to the positional argument.
    #[arg(long, conflicts_with = "address")]
    pub host: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Zone whose user EQ is replaced.
    #[arg(long)]
    pub zone: Option<String>,

    /// Parse and print the bands without contacting the device.
    #[arg(long)]
    pub dry_run: bool,

    /// Settings file to use instead of the default location.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log more (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Device address from the arguments, falling back to the settings
    pub fn target_address(&self, settings: &Settings) -> Result<DeviceAddress, AddressError> {
        let raw = self
            .address
            .as_deref()
            .or(self.host.as_deref())
            .unwrap_or(&settings.default_host);
        DeviceAddress::parse(raw)
    }

    /// Settings with command-line overrides applied
    pub fn apply_overrides(&self, mut settings: Settings) -> Settings {
        if let Some(timeout_ms) = self.timeout_ms {
            settings.timeout_ms = timeout_ms;
        }
        if let Some(zone) = &self.zone {
            settings.zone = zone.clone();
        }
        settings
    }

    /// Default log filter for the verbosity level
    pub fn log_filter(&self) -> String {
        let level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        format!(
            "rew2streammagic={level},rew_eq={level},sm_control={level}",
            level = level
        )
    }
}
