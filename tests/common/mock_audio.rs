//! Mock microphone
//!
//! Each capture follows the next scripted step; an empty script yields a
//! short phrase written to the mock's temp directory.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use voicebuddy::audio::{AudioSource, CapturedAudio};
use voicebuddy::error::{VoiceError, VoiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Phrase,
    Timeout,
    DeviceError,
    Panic,
}

pub struct MockAudio {
    dir: PathBuf,
    script: Mutex<VecDeque<Capture>>,
    /// Paths of every WAV file handed out
    pub captured: Mutex<Vec<PathBuf>>,
}

impl MockAudio {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            script: Mutex::new(VecDeque::new()),
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, step: Capture) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn captured_paths(&self) -> Vec<PathBuf> {
        self.captured.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioSource for MockAudio {
    async fn capture(&self) -> VoiceResult<CapturedAudio> {
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Capture::Phrase);

        match step {
            Capture::Phrase => {
                let audio = CapturedAudio::persist(vec![1200; 1600], 16000, &self.dir)?;
                self.captured
                    .lock()
                    .unwrap()
                    .push(audio.path().to_path_buf());
                Ok(audio)
            }
            Capture::Timeout => Err(VoiceError::CaptureTimeout),
            Capture::DeviceError => Err(VoiceError::Audio("mock device unplugged".to_string())),
            Capture::Panic => panic!("mock microphone exploded"),
        }
    }
}
