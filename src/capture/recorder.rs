//! Fixed-duration clip capture from the system microphone.
//!
//! Captures i16 PCM from the default (or configured) input device via cpal,
//! averages multi-channel input down to mono, blocks until the requested
//! number of samples has arrived, and writes an uncompressed 16-bit mono WAV
//! with hound. The clip file name is fixed and overwritten per invocation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::WavWriter;

use crate::workflow::ClipSource;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Extra wall-clock slack allowed beyond the nominal clip duration before
/// the capture is considered stalled (device unplugged, stream error).
const CAPTURE_GRACE: Duration = Duration::from_secs(5);

/// Records one fixed-duration mono clip from an input device.
pub struct ClipRecorder {
    /// Actual recording sample rate, updated from the device config on start
    sample_rate: u32,
    /// Captured audio samples (i16 PCM mono)
    samples: Arc<Mutex<Vec<i16>>>,
    /// Active input stream, kept alive for the duration of the capture
    stream: Option<cpal::Stream>,
    /// Device name, index, or "default"
    device_name: String,
}

impl ClipRecorder {
    /// Creates a recorder for the given device at the requested sample rate.
    ///
    /// The actual rate may differ based on device capabilities; the WAV is
    /// written at whatever rate the device delivers.
    pub fn new(requested_sample_rate: u32, device_name: String) -> Self {
        Self {
            sample_rate: requested_sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            device_name,
        }
    }

    /// Captures exactly `duration_secs * sample_rate` mono samples and writes
    /// them to `out_path`, blocking the calling thread until done.
    ///
    /// # Errors
    /// - If no input device is available or the stream cannot be built
    /// - If the stream stops delivering samples before the clip is complete
    /// - If the WAV file cannot be written
    pub fn record_clip(&mut self, duration_secs: u16, out_path: &Path) -> Result<PathBuf> {
        self.start()?;

        let target = duration_secs as usize * self.sample_rate as usize;
        let deadline =
            Instant::now() + Duration::from_secs(u64::from(duration_secs)) + CAPTURE_GRACE;

        loop {
            std::thread::sleep(Duration::from_millis(50));
            if self.samples.lock().unwrap().len() >= target {
                break;
            }
            if Instant::now() >= deadline {
                self.stream = None;
                return Err(anyhow!(
                    "Capture stalled: device stopped delivering samples"
                ));
            }
        }

        // Drop the stream before touching the sample buffer for the last time
        self.stream = None;

        let mut samples = self.samples.lock().unwrap().clone();
        samples.truncate(target);

        tracing::info!(
            "Captured {} samples ({duration_secs}s at {}Hz)",
            samples.len(),
            self.sample_rate
        );

        write_clip(&samples, self.sample_rate, out_path)?;
        Ok(out_path.to_path_buf())
    }

    /// Opens the input device and starts the capture stream.
    fn start(&mut self) -> Result<()> {
        self.samples.lock().unwrap().clear();

        // Get device while suppressing ALSA library warnings
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_label = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {device_label}");

        let device_config = device.default_input_config()?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if device_sample_rate != self.sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                self.sample_rate,
                device_sample_rate
            );
        }
        self.sample_rate = device_sample_rate;

        let samples_arc = Arc::clone(&self.samples);

        let stream = device.build_input_stream(
            &device_config.into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                push_mono(data, &samples_arc, num_channels);
            },
            |err| {
                tracing::error!("Audio stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);

        tracing::debug!("Audio stream started ({device_sample_rate}Hz, {num_channels} channels)");
        Ok(())
    }
}

/// Appends incoming device samples to the buffer, averaged down to mono.
fn push_mono(data: &[i16], samples_arc: &Arc<Mutex<Vec<i16>>>, num_channels: usize) {
    let mut samples = samples_arc.lock().unwrap();

    match num_channels {
        1 => samples.extend_from_slice(data),
        2 => {
            for chunk in data.chunks_exact(2) {
                let mono = ((chunk[0] as i32 + chunk[1] as i32) / 2) as i16;
                samples.push(mono);
            }
        }
        _ => {
            for chunk in data.chunks_exact(num_channels) {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                samples.push((sum / num_channels as i32) as i16);
            }
        }
    }
}

/// Writes mono i16 samples as an uncompressed PCM WAV file.
///
/// An existing file at `path` is overwritten; the workflow reuses one fixed
/// clip path across invocations.
pub fn write_clip(samples: &[i16], sample_rate: u32, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    tracing::debug!("Clip written: {}", path.display());
    Ok(())
}

/// `ClipSource` backed by a cpal device; a fresh recorder per invocation.
pub struct CpalClipSource {
    sample_rate: u32,
    device: String,
}

impl CpalClipSource {
    pub fn new(sample_rate: u32, device: String) -> Self {
        Self {
            sample_rate,
            device,
        }
    }
}

impl ClipSource for CpalClipSource {
    fn record(&mut self, duration_secs: u16, out_path: &Path) -> Result<PathBuf> {
        let mut recorder = ClipRecorder::new(self.sample_rate, self.device.clone());
        recorder.record_clip(duration_secs, out_path)
    }
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();

        if index < devices.len() {
            return Ok(devices.into_iter().nth(index).unwrap());
        }
        return Err(anyhow!(
            "Device index {} is out of range (0-{})",
            index,
            devices.len().saturating_sub(1)
        ));
    }

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'trackdown list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(path: &Path) -> (hound::WavSpec, Vec<i16>) {
        let mut reader = hound::WavReader::open(path).unwrap();
        let spec = reader.spec();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    #[test]
    fn clip_holds_exactly_duration_times_rate_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let sample_rate = 44_100u32;

        for duration in [3u16, 5, 15] {
            let n = duration as usize * sample_rate as usize;
            let samples: Vec<i16> = (0..n).map(|i| (i % 97) as i16).collect();
            write_clip(&samples, sample_rate, &path).unwrap();

            let (spec, read_back) = read_all(&path);
            assert_eq!(read_back.len(), n, "duration {duration}s");
            assert_eq!(spec.channels, 1);
            assert_eq!(spec.sample_rate, sample_rate);
            assert_eq!(spec.bits_per_sample, 16);
        }
    }

    #[test]
    fn rewriting_the_same_path_overwrites_the_previous_clip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");

        write_clip(&vec![1i16; 1000], 44_100, &path).unwrap();
        write_clip(&vec![2i16; 10], 44_100, &path).unwrap();

        let (_, samples) = read_all(&path);
        assert_eq!(samples, vec![2i16; 10]);
    }

    #[test]
    fn stereo_input_is_averaged_to_mono() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        push_mono(&[100, 200, -50, 50], &buf, 2);
        assert_eq!(*buf.lock().unwrap(), vec![150, 0]);
    }

    #[test]
    fn mono_input_is_passed_through() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        push_mono(&[1, 2, 3], &buf, 1);
        assert_eq!(*buf.lock().unwrap(), vec![1, 2, 3]);
    }
}
