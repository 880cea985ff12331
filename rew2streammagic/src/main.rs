//! REW to StreamMagic
//!
//! Reads a Room EQ Wizard filter export, prints the first seven active
//! bands and writes them to a Cambridge Audio StreamMagic device as its
//! user EQ, provided the device API is recent enough.

mod cli;
mod settings;

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use cli::Args;
use rew_eq::BandSet;
use settings::Settings;
use sm_control::{apply_user_eq, ApplyError, DeviceSession, StreamMagicClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so the band listing on stdout stays clean.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut stdout = io::stdout().lock();
    match run(&args, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = stdout.flush();
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let settings = match &args.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    Ok(args.apply_overrides(settings))
}

fn read_bands(args: &Args) -> anyhow::Result<BandSet> {
    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let bands = rew_eq::parse_reader(BufReader::new(file))
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    Ok(bands)
}

async fn run(args: &Args, out: &mut impl Write) -> anyhow::Result<()> {
    let settings = load_settings(args)?;

    if !args.file.exists() {
        bail!("File not found: {}", args.file.display());
    }

    let address = if args.dry_run {
        None
    } else {
        Some(args.target_address(&settings)?)
    };

    let bands = read_bands(args)?;
    if bands.is_empty() {
        bail!("No equalizer bands found in the file.");
    }

    writeln!(out, "First {} Equalizer Bands:", rew_eq::MAX_BANDS)?;
    for band in &bands {
        writeln!(out, "{}", band)?;
    }

    let Some(address) = address else {
        tracing::info!("Dry run, device not contacted");
        return Ok(());
    };

    let mut client = StreamMagicClient::with_config(address, settings.client_config());
    client.connect().await?;
    let result = apply_user_eq(&bands, &mut client).await;
    client.close().await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(ApplyError::InvalidVersion(e)) => bail!("Device reported an unusable API version: {}", e),
        Err(e) => return Err(e.into()),
    };
    writeln!(out, "API: {}", outcome.api_version())?;
    writeln!(out, "{}", outcome)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_sim::{VirtualDeviceConfig, VirtualServer};
    use std::path::Path;

    const EXPORT: &str = "\
Filter Settings file
Filter  1: ON  PK       Fc   63.0 Hz  Gain  -3.5 dB  Q  2.000
Filter  2: ON  LP       Fc   80 Hz
";

    fn write_export(dir: &Path, content: &str) -> std::path::PathBuf {
        let path = dir.join("eq.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn write_settings(dir: &Path, port: u16) -> std::path::PathBuf {
        let path = dir.join("settings.json");
        let settings = Settings {
            default_host: "127.0.0.1".into(),
            timeout_ms: 2000,
            port: Some(port),
            ..Default::default()
        };
        std::fs::write(&path, serde_json::to_string(&settings).unwrap()).unwrap();
        path
    }

    fn args(list: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("rew2streammagic").chain(list.iter().copied()))
            .unwrap()
    }

    async fn run_capture(args: &Args) -> (anyhow::Result<()>, String) {
        let mut out = Vec::new();
        let result = run(args, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        let args = args(&[missing.to_str().unwrap(), "--dry-run"]);

        let (result, out) = run_capture(&args).await;
        let message = result.unwrap_err().to_string();
        assert!(message.starts_with("File not found:"), "{}", message);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_no_bands() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_export(dir.path(), "Filter 1: OFF PK Fc 100 Hz\n");
        let args = args(&[file.to_str().unwrap(), "--dry-run"]);

        let (result, _) = run_capture(&args).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No equalizer bands found in the file."
        );
    }

    #[tokio::test]
    async fn test_invalid_address_stops_before_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_export(dir.path(), EXPORT);
        let args = args(&[file.to_str().unwrap(), "999.1.1.1"]);

        let (result, out) = run_capture(&args).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Invalid IP address '999.1.1.1': does not appear to be an IPv4 or IPv6 address"
        );
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_number_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_export(dir.path(), "Filter 1: ON PK Fc 1.2.3 Hz\n");
        let args = args(&[file.to_str().unwrap(), "--dry-run"]);

        let (result, _) = run_capture(&args).await;
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("line 1: invalid frequency: 1.2.3"), "{}", message);
    }

    #[tokio::test]
    async fn test_dry_run_prints_bands() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_export(dir.path(), EXPORT);
        let args = args(&[file.to_str().unwrap(), "--dry-run"]);

        let (result, out) = run_capture(&args).await;
        result.unwrap();
        assert_eq!(
            out,
            "First 7 Equalizer Bands:\n\
             Band 0: PEAKING Freq=63Hz, Gain=-3.5dB, Q=2\n\
             Band 1: LOWPASS Freq=80Hz\n"
        );
    }

    #[tokio::test]
    async fn test_applies_to_device() {
        let server = VirtualServer::start(VirtualDeviceConfig::with_api_version("1.10"))
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let file = write_export(dir.path(), EXPORT);
        let config = write_settings(dir.path(), server.local_addr().port());
        let args = args(&[
            file.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]);

        let (result, out) = run_capture(&args).await;
        result.unwrap();
        assert!(out.contains("API: 1.10\nUser EQ applied\n"), "{}", out);
        assert_eq!(server.user_eq_requests().len(), 1);
        assert_eq!(server.user_eq_requests()[0].user_eq.bands.len(), 2);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_old_device_succeeds_without_change() {
        let server = VirtualServer::start(VirtualDeviceConfig::with_api_version("1.8.5"))
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let file = write_export(dir.path(), EXPORT);
        let config = write_settings(dir.path(), server.local_addr().port());
        let args = args(&[
            file.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]);

        let (result, out) = run_capture(&args).await;
        result.unwrap();
        assert!(out.contains("API: 1.8.5\n"), "{}", out);
        assert!(out.contains("does not support user EQ"), "{}", out);
        assert!(server.user_eq_requests().is_empty());
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_bad_device_version_fails() {
        let server = VirtualServer::start(VirtualDeviceConfig::with_api_version("latest"))
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let file = write_export(dir.path(), EXPORT);
        let config = write_settings(dir.path(), server.local_addr().port());
        let args = args(&[
            file.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]);

        let (result, _) = run_capture(&args).await;
        let message = result.unwrap_err().to_string();
        assert!(message.starts_with("Device reported an unusable API version"), "{}", message);
        assert!(server.user_eq_requests().is_empty());
        server.shutdown().await;
    }
}
