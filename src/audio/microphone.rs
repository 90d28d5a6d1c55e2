//! Microphone capture using cpal

use super::{AudioSource, CapturedAudio, PhraseDetector, PhraseState};
use crate::config::{Config, RecognizerTuning};
use crate::error::{VoiceError, VoiceResult};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long to wait for the device before declaring the stream dead
const STREAM_STALL: Duration = Duration::from_secs(5);

/// How often the capture thread checks for cancellation
const POLL: Duration = Duration::from_millis(100);

/// Captures one phrase per call from an input device
#[derive(Debug, Clone)]
pub struct MicrophoneSource {
    device_index: Option<usize>,
    tuning: RecognizerTuning,
    temp_dir: PathBuf,
    cancel: Arc<AtomicBool>,
}

impl MicrophoneSource {
    pub fn new(config: &Config) -> Self {
        Self {
            device_index: config.input_device,
            tuning: config.recognizer.clone(),
            temp_dir: PathBuf::from(&config.temp_dir),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that aborts any capture in progress once set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Names of the available input devices
    pub fn list_devices() -> VoiceResult<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| VoiceError::Audio(e.to_string()))?;
        Ok(devices
            .enumerate()
            .map(|(i, device)| {
                let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
                format!("[{}] {}", i, name)
            })
            .collect())
    }

    fn select_device(&self) -> VoiceResult<cpal::Device> {
        let host = cpal::default_host();
        let device = match self.device_index {
            Some(idx) => host
                .input_devices()
                .map_err(|e| VoiceError::Audio(e.to_string()))?
                .nth(idx),
            None => host.default_input_device(),
        };
        device.ok_or_else(|| VoiceError::Audio("No usable input device".to_string()))
    }

    /// Runs on a blocking thread: the cpal stream is not Send
    fn record_phrase(&self) -> VoiceResult<Vec<i16>> {
        let device = self.select_device()?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        debug!("Using audio device: {}", device_name);

        let stream_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.tuning.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (tx, rx) = mpsc::channel::<Vec<i16>>();
        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    // receiver gone means the phrase is already complete
                    let _ = tx.send(data.to_vec());
                },
                |err| {
                    warn!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| VoiceError::Audio(e.to_string()))?;
        stream
            .play()
            .map_err(|e| VoiceError::Audio(e.to_string()))?;

        info!("🎤 Speak now (say 'exit' to quit)...");
        let mut detector = PhraseDetector::new(self.tuning.clone());
        listen(&rx, &mut detector, &self.cancel)?;
        drop(stream);

        Ok(detector.take_phrase())
    }
}

/// Feed chunks into `detector` until a phrase completes.
///
/// Returns early on listen timeout, a stalled or closed stream, or when
/// `cancel` is set.
fn listen(
    rx: &Receiver<Vec<i16>>,
    detector: &mut PhraseDetector,
    cancel: &AtomicBool,
) -> VoiceResult<()> {
    let mut stalled = Duration::ZERO;
    loop {
        if cancel.load(Ordering::SeqCst) {
            return Err(VoiceError::Audio("Capture cancelled".to_string()));
        }
        match rx.recv_timeout(POLL) {
            Ok(chunk) => {
                stalled = Duration::ZERO;
                match detector.feed(&chunk) {
                    PhraseState::Complete => return Ok(()),
                    PhraseState::TimedOut => {
                        info!("⏱️ No speech detected. Please try again.");
                        return Err(VoiceError::CaptureTimeout);
                    }
                    PhraseState::Waiting | PhraseState::Speaking => {}
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                stalled += POLL;
                if stalled >= STREAM_STALL {
                    return Err(VoiceError::Audio("Audio stream stalled".to_string()));
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(VoiceError::Audio("Audio stream closed".to_string()));
            }
        }
    }
}

#[async_trait]
impl AudioSource for MicrophoneSource {
    async fn capture(&self) -> VoiceResult<CapturedAudio> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || -> VoiceResult<CapturedAudio> {
            let samples = source.record_phrase()?;
            CapturedAudio::persist(samples, source.tuning.sample_rate, &source.temp_dir)
        })
        .await
        .map_err(|e| VoiceError::Audio(format!("Capture task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHUNK: usize = 1600;

    #[test]
    fn test_listen_completes_phrase() {
        let (tx, rx) = mpsc::channel();
        for _ in 0..3 {
            tx.send(vec![2000i16; CHUNK]).unwrap();
        }
        for _ in 0..10 {
            tx.send(vec![0i16; CHUNK]).unwrap();
        }

        let mut detector = PhraseDetector::new(RecognizerTuning::default());
        listen(&rx, &mut detector, &AtomicBool::new(false)).expect("phrase");
        assert!(!detector.take_phrase().is_empty());
    }

    #[test]
    fn test_cancel_stops_silent_capture() {
        let (tx, rx) = mpsc::channel::<Vec<i16>>();
        let cancel = Arc::new(AtomicBool::new(false));

        let flag = cancel.clone();
        let worker = std::thread::spawn(move || {
            let mut detector = PhraseDetector::new(RecognizerTuning::default());
            listen(&rx, &mut detector, &flag)
        });

        // the stream stays open and silent, as in a quiet room
        tx.send(vec![0i16; CHUNK]).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        cancel.store(true, Ordering::SeqCst);

        let result = worker.join().expect("capture thread");
        assert!(matches!(result, Err(VoiceError::Audio(_))));
        drop(tx);
    }

    #[test]
    fn test_closed_stream_is_audio_error() {
        let (tx, rx) = mpsc::channel::<Vec<i16>>();
        drop(tx);
        let mut detector = PhraseDetector::new(RecognizerTuning::default());
        let result = listen(&rx, &mut detector, &AtomicBool::new(false));
        assert!(matches!(result, Err(VoiceError::Audio(_))));
    }
}
