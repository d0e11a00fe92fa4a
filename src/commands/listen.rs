//! The interactive record → identify → download surface.
//!
//! Loads configuration and the recognition credential, wires the concrete
//! workflow implementations together, and runs the idle/trigger loop. Each
//! trigger executes one complete invocation before input is polled again.

use std::path::Path;
use std::process::Command;

use crate::capture::CpalClipSource;
use crate::config;
use crate::downloader::YtDlpFetcher;
use crate::recognition::ShazamClient;
use crate::ui::{show_fatal, ListenScreen, ScreenCommand};
use crate::workflow::{run_invocation, SessionSettings};

/// Fixed clip file name, reused and overwritten per invocation.
const CLIP_FILE_NAME: &str = "trackdown-clip.wav";

/// Runs the listen surface until the user quits.
///
/// # Errors
/// - If configuration is malformed
/// - If the recognition API key is missing (fatal before the surface opens)
/// - If the terminal cannot be initialized
pub fn handle_listen() -> Result<(), anyhow::Error> {
    tracing::info!("=== trackdown listen started ===");

    let config_data = match config::TrackdownConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            show_fatal(&format!(
                "Configuration error:\n\n{err}\n\nCheck ~/.config/trackdown/trackdown.toml and try again."
            ))?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    // The credential check gates everything: no key, no surface.
    let api_key = match config::load_api_key() {
        Ok(key) => key,
        Err(err) => {
            tracing::error!("Credential check failed");
            show_fatal(&err.to_string())?;
            return Err(err);
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, download={}, download_dir={}",
        config_data.audio.device,
        config_data.audio.sample_rate,
        config_data.download.enabled,
        config_data.download.directory.display()
    );

    let mut source = CpalClipSource::new(
        config_data.audio.sample_rate,
        config_data.audio.device.clone(),
    );

    let identifier = ShazamClient::new(
        config_data.recognition.endpoint.clone(),
        config_data.recognition.api_host.clone(),
        api_key,
    )?;

    let fetcher = match YtDlpFetcher::new(config_data.download.directory.clone()) {
        Ok(fetcher) => fetcher,
        Err(err) => {
            tracing::error!("Downloader setup failed: {err}");
            show_fatal(&err.to_string())?;
            return Err(err);
        }
    };

    let clip_path = std::env::temp_dir().join(CLIP_FILE_NAME);

    let settings = SessionSettings {
        download_enabled: config_data.download.enabled,
        ..SessionSettings::default()
    };

    let mut screen = ListenScreen::new(settings)?;
    screen.draw()?;

    loop {
        match screen.handle_input() {
            Ok(ScreenCommand::Continue) => {}
            Ok(ScreenCommand::Quit) => break,
            Ok(ScreenCommand::Trigger) => {
                // Snapshot the controls; the invocation runs to completion
                // before input is polled again, so nothing can change below us.
                let snapshot = screen.settings;
                tracing::info!(
                    "Trigger: duration={}s, download={}",
                    snapshot.duration_secs,
                    snapshot.download_enabled
                );

                screen.begin_invocation();
                let outcome = run_invocation(
                    &snapshot,
                    &clip_path,
                    &mut source,
                    &identifier,
                    &fetcher,
                    &mut |event| screen.push_status(event),
                );
                screen.set_last_download(outcome.downloaded);
                screen.draw()?;
            }
            Ok(ScreenCommand::Play) => {
                if let Some(path) = screen.last_download() {
                    let path = path.to_path_buf();
                    if let Err(e) = play_file(&path) {
                        tracing::warn!("Playback failed: {e}");
                    }
                }
            }
            Err(e) => {
                tracing::error!("Input handling error: {e}");
                screen.cleanup().ok();
                return Err(anyhow::anyhow!("Input handling error: {e}"));
            }
        }
    }

    screen.cleanup()?;
    tracing::info!("=== trackdown listen exited ===");
    Ok(())
}

/// Plays a downloaded file with the system audio player.
///
/// macOS: `open`. Linux: `xdg-open`, falling back to common players.
/// The player is spawned detached so the surface stays responsive.
fn play_file(path: &Path) -> Result<(), anyhow::Error> {
    tracing::info!("Playing {}", path.display());

    #[cfg(target_os = "macos")]
    {
        Command::new("open")
            .arg(path)
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to open audio player: {e}"))?;
        return Ok(());
    }

    #[cfg(target_os = "linux")]
    {
        if Command::new("xdg-open").arg(path).spawn().is_ok() {
            return Ok(());
        }

        for player in ["mpv", "vlc", "ffplay", "paplay"] {
            if Command::new(player).arg(path).spawn().is_ok() {
                return Ok(());
            }
        }

        return Err(anyhow::anyhow!(
            "No audio player found. Install mpv, vlc, ffplay, or paplay"
        ));
    }

    #[allow(unreachable_code)]
    Err(anyhow::anyhow!("Playback not supported on this platform"))
}
