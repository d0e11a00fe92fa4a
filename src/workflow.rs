//! Per-invocation workflow: capture, recognize, optionally download.
//!
//! Each button press runs one invocation of `run_invocation` from start to
//! finish. The steps are strictly sequential and never retried; progress and
//! results are reported through a status event sink so the surface rendering
//! stays out of the control flow. The concrete capture, recognition and
//! download implementations plug in through small traits, which also keeps
//! every step substitutable in tests.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::downloader::search_query;
use crate::recognition::{Recognition, Track};

/// Minimum recording duration offered by the duration slider.
pub const MIN_DURATION_SECS: u16 = 3;
/// Maximum recording duration offered by the duration slider.
pub const MAX_DURATION_SECS: u16 = 15;
/// Default recording duration.
pub const DEFAULT_DURATION_SECS: u16 = 5;

/// Immutable snapshot of the surface controls for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Recording duration in seconds, within [MIN_DURATION_SECS, MAX_DURATION_SECS]
    pub duration_secs: u16,
    /// Whether the download step runs after a successful identification
    pub download_enabled: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            download_enabled: true,
        }
    }
}

/// Severity of a status line shown in the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Neutral progress information
    Info,
    /// A step completed
    Success,
    /// Non-error outcome the user should notice (e.g. no match)
    Warning,
    /// A step failed
    Error,
    /// A blocking step is underway
    Progress,
}

/// One user-visible status line emitted by the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusEvent {
    fn new(level: StatusLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Captures a fixed-duration clip into a file.
pub trait ClipSource {
    /// Blocks until the clip is captured and written, returns the clip path.
    fn record(&mut self, duration_secs: u16, out_path: &Path) -> Result<PathBuf>;
}

/// Identifies the song in a captured clip.
pub trait TrackIdentifier {
    fn identify(&self, clip_path: &Path) -> Result<Recognition>;
}

/// Searches the video platform for a track and downloads its audio.
pub trait TrackFetcher {
    /// Returns the path of the locally saved media file.
    fn fetch(&self, track: &Track) -> Result<PathBuf>;
}

/// What one invocation produced.
#[derive(Debug, Default)]
pub struct InvocationOutcome {
    /// The identified track, when recognition succeeded with a match
    pub track: Option<Track>,
    /// Path of the downloaded file, when the download step succeeded
    pub downloaded: Option<PathBuf>,
}

/// Runs one capture → recognize → download invocation.
///
/// Failure semantics:
/// - capture failure aborts the invocation immediately
/// - a recognition error or a no-match result ends the invocation after the
///   corresponding error/warning event; no download is attempted
/// - a download failure is reported but the invocation still completes
///
/// The function itself never fails; every error becomes a status event and
/// the caller returns to idle regardless.
pub fn run_invocation<S, I, F, E>(
    settings: &SessionSettings,
    clip_path: &Path,
    source: &mut S,
    identifier: &I,
    fetcher: &F,
    emit: &mut E,
) -> InvocationOutcome
where
    S: ClipSource,
    I: TrackIdentifier,
    F: TrackFetcher,
    E: FnMut(StatusEvent),
{
    let mut outcome = InvocationOutcome::default();

    emit(StatusEvent::new(
        StatusLevel::Info,
        format!("Recording for {} seconds...", settings.duration_secs),
    ));

    let clip = match source.record(settings.duration_secs, clip_path) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!("Capture failed: {e}");
            emit(StatusEvent::new(
                StatusLevel::Error,
                format!("Recording failed: {e}"),
            ));
            return outcome;
        }
    };

    emit(StatusEvent::new(
        StatusLevel::Success,
        "Audio recorded. Identifying...",
    ));

    let track = match identifier.identify(&clip) {
        Ok(Recognition::Match(track)) => track,
        Ok(Recognition::NoMatch) => {
            emit(StatusEvent::new(StatusLevel::Warning, "No match found."));
            return outcome;
        }
        Err(e) => {
            tracing::error!("Recognition failed: {e}");
            emit(StatusEvent::new(StatusLevel::Error, e.to_string()));
            return outcome;
        }
    };

    emit(StatusEvent::new(
        StatusLevel::Success,
        format!("Identified: {}", track.summary()),
    ));
    emit(StatusEvent::new(
        StatusLevel::Info,
        format!("Album: {}", track.album_display()),
    ));
    emit(StatusEvent::new(
        StatusLevel::Info,
        format!("Genre: {}", track.genre_display()),
    ));

    if settings.download_enabled {
        emit(StatusEvent::new(
            StatusLevel::Info,
            format!("Searching YouTube for: {}", search_query(&track)),
        ));
        emit(StatusEvent::new(
            StatusLevel::Progress,
            "Downloading audio from YouTube...",
        ));

        match fetcher.fetch(&track) {
            Ok(path) if path.exists() => {
                emit(StatusEvent::new(
                    StatusLevel::Success,
                    format!("Song downloaded: {}", path.display()),
                ));
                outcome.downloaded = Some(path);
            }
            Ok(path) => {
                tracing::warn!("Download reported {} but the file is missing", path.display());
                emit(StatusEvent::new(
                    StatusLevel::Error,
                    format!("Download finished but no file at {}", path.display()),
                ));
            }
            Err(e) => {
                tracing::error!("Download failed: {e}");
                emit(StatusEvent::new(
                    StatusLevel::Error,
                    format!("Download failed: {e}"),
                ));
            }
        }
    }

    outcome.track = Some(track);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::track::Genres;
    use anyhow::anyhow;
    use std::cell::Cell;

    struct OkSource;

    impl ClipSource for OkSource {
        fn record(&mut self, _duration_secs: u16, out_path: &Path) -> Result<PathBuf> {
            Ok(out_path.to_path_buf())
        }
    }

    struct FailingSource;

    impl ClipSource for FailingSource {
        fn record(&mut self, _duration_secs: u16, _out_path: &Path) -> Result<PathBuf> {
            Err(anyhow!("no input device available"))
        }
    }

    struct FixedIdentifier {
        outcome: Result<Recognition>,
        calls: Cell<usize>,
    }

    impl FixedIdentifier {
        fn new(outcome: Result<Recognition>) -> Self {
            Self {
                outcome,
                calls: Cell::new(0),
            }
        }
    }

    impl TrackIdentifier for FixedIdentifier {
        fn identify(&self, _clip_path: &Path) -> Result<Recognition> {
            self.calls.set(self.calls.get() + 1);
            match &self.outcome {
                Ok(r) => Ok(r.clone()),
                Err(e) => Err(anyhow!("{e}")),
            }
        }
    }

    struct FixedFetcher {
        result: Result<PathBuf>,
        calls: Cell<usize>,
    }

    impl FixedFetcher {
        fn new(result: Result<PathBuf>) -> Self {
            Self {
                result,
                calls: Cell::new(0),
            }
        }
    }

    impl TrackFetcher for FixedFetcher {
        fn fetch(&self, _track: &Track) -> Result<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            match &self.result {
                Ok(p) => Ok(p.clone()),
                Err(e) => Err(anyhow!("{e}")),
            }
        }
    }

    fn sample_track() -> Track {
        Track {
            title: "X".to_string(),
            subtitle: "Y".to_string(),
            album: Some("Z".to_string()),
            genres: Some(Genres { primary: None }),
        }
    }

    fn settings(download: bool) -> SessionSettings {
        SessionSettings {
            duration_secs: 5,
            download_enabled: download,
        }
    }

    fn collect(events: &mut Vec<StatusEvent>) -> impl FnMut(StatusEvent) + '_ {
        |e| events.push(e)
    }

    #[test]
    fn match_with_download_disabled_shows_metadata_and_skips_fetcher() {
        let identifier = FixedIdentifier::new(Ok(Recognition::Match(sample_track())));
        let fetcher = FixedFetcher::new(Err(anyhow!("must not be called")));
        let mut events = Vec::new();

        let outcome = run_invocation(
            &settings(false),
            Path::new("clip.wav"),
            &mut OkSource,
            &identifier,
            &fetcher,
            &mut collect(&mut events),
        );

        assert_eq!(fetcher.calls.get(), 0);
        assert_eq!(outcome.track.as_ref().unwrap().title, "X");
        assert!(outcome.downloaded.is_none());

        let texts: Vec<&str> = events.iter().map(|e| e.text.as_str()).collect();
        assert!(texts.contains(&"Identified: X by Y"));
        assert!(texts.contains(&"Album: Z"));
        assert!(texts.contains(&"Genre: N/A"));
    }

    #[test]
    fn capture_failure_aborts_before_recognition() {
        let identifier = FixedIdentifier::new(Ok(Recognition::NoMatch));
        let fetcher = FixedFetcher::new(Err(anyhow!("unused")));
        let mut events = Vec::new();

        let outcome = run_invocation(
            &settings(true),
            Path::new("clip.wav"),
            &mut FailingSource,
            &identifier,
            &fetcher,
            &mut collect(&mut events),
        );

        assert_eq!(identifier.calls.get(), 0);
        assert!(outcome.track.is_none());
        assert_eq!(events.last().unwrap().level, StatusLevel::Error);
    }

    #[test]
    fn no_match_is_a_warning_and_stops_the_invocation() {
        let identifier = FixedIdentifier::new(Ok(Recognition::NoMatch));
        let fetcher = FixedFetcher::new(Err(anyhow!("unused")));
        let mut events = Vec::new();

        let outcome = run_invocation(
            &settings(true),
            Path::new("clip.wav"),
            &mut OkSource,
            &identifier,
            &fetcher,
            &mut collect(&mut events),
        );

        assert!(outcome.track.is_none());
        assert_eq!(fetcher.calls.get(), 0);
        let last = events.last().unwrap();
        assert_eq!(last.level, StatusLevel::Warning);
        assert_eq!(last.text, "No match found.");
    }

    #[test]
    fn recognition_error_is_surfaced_with_status_code() {
        let identifier =
            FixedIdentifier::new(Err(anyhow!("Recognition service error: status 502")));
        let fetcher = FixedFetcher::new(Err(anyhow!("unused")));
        let mut events = Vec::new();

        run_invocation(
            &settings(true),
            Path::new("clip.wav"),
            &mut OkSource,
            &identifier,
            &fetcher,
            &mut collect(&mut events),
        );

        assert_eq!(fetcher.calls.get(), 0);
        let last = events.last().unwrap();
        assert_eq!(last.level, StatusLevel::Error);
        assert!(last.text.contains("502"));
    }

    #[test]
    fn download_failure_does_not_escape_and_invocation_completes() {
        let identifier = FixedIdentifier::new(Ok(Recognition::Match(sample_track())));
        let fetcher = FixedFetcher::new(Err(anyhow!("yt-dlp exited with status 1")));
        let mut events = Vec::new();

        let outcome = run_invocation(
            &settings(true),
            Path::new("clip.wav"),
            &mut OkSource,
            &identifier,
            &fetcher,
            &mut collect(&mut events),
        );

        assert_eq!(fetcher.calls.get(), 1);
        assert!(outcome.track.is_some());
        assert!(outcome.downloaded.is_none());
        assert_eq!(events.last().unwrap().level, StatusLevel::Error);
    }

    #[test]
    fn successful_download_with_existing_file_is_retained() {
        let dir = tempfile::tempdir().unwrap();
        let saved = dir.path().join("X - Y.opus");
        std::fs::write(&saved, b"audio").unwrap();

        let identifier = FixedIdentifier::new(Ok(Recognition::Match(sample_track())));
        let fetcher = FixedFetcher::new(Ok(saved.clone()));
        let mut events = Vec::new();

        let outcome = run_invocation(
            &settings(true),
            Path::new("clip.wav"),
            &mut OkSource,
            &identifier,
            &fetcher,
            &mut collect(&mut events),
        );

        assert_eq!(outcome.downloaded.as_deref(), Some(saved.as_path()));
        assert_eq!(events.last().unwrap().level, StatusLevel::Success);
    }

    #[test]
    fn download_path_that_does_not_exist_is_not_retained() {
        let identifier = FixedIdentifier::new(Ok(Recognition::Match(sample_track())));
        let fetcher = FixedFetcher::new(Ok(PathBuf::from("/nonexistent/X.opus")));
        let mut events = Vec::new();

        let outcome = run_invocation(
            &settings(true),
            Path::new("clip.wav"),
            &mut OkSource,
            &identifier,
            &fetcher,
            &mut collect(&mut events),
        );

        assert!(outcome.downloaded.is_none());
        assert_eq!(events.last().unwrap().level, StatusLevel::Error);
    }

    #[test]
    fn search_query_is_announced_before_the_download() {
        let identifier = FixedIdentifier::new(Ok(Recognition::Match(sample_track())));
        let dir = tempfile::tempdir().unwrap();
        let saved = dir.path().join("out.opus");
        std::fs::write(&saved, b"x").unwrap();
        let fetcher = FixedFetcher::new(Ok(saved));
        let mut events = Vec::new();

        run_invocation(
            &settings(true),
            Path::new("clip.wav"),
            &mut OkSource,
            &identifier,
            &fetcher,
            &mut collect(&mut events),
        );

        assert!(events
            .iter()
            .any(|e| e.text == "Searching YouTube for: X Y official audio"));
    }
}
