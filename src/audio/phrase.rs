//! Energy-based phrase detection
//!
//! Pure state machine fed with chunks of mono samples. It knows nothing about
//! devices, which keeps the recognizer tuning testable without a microphone.
//! All durations are tracked as sample counts.

use super::calculate_energy;
use crate::config::RecognizerTuning;
use std::collections::VecDeque;

/// Where the detector is after consuming a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseState {
    /// No speech yet
    Waiting,
    /// Inside a phrase
    Speaking,
    /// A phrase ended; take it with [`PhraseDetector::take_phrase`]
    Complete,
    /// Nobody spoke within the listen timeout
    TimedOut,
}

pub struct PhraseDetector {
    energy_threshold: f32,
    pause_samples: usize,
    phrase_min_samples: usize,
    non_speaking_samples: usize,
    timeout_samples: Option<usize>,
    limit_samples: usize,

    pre_roll: VecDeque<Vec<i16>>,
    pre_roll_len: usize,
    phrase: Vec<i16>,
    in_phrase: bool,
    speaking: usize,
    silence: usize,
    waited: usize,
}

impl PhraseDetector {
    pub fn new(tuning: RecognizerTuning) -> Self {
        let rate = tuning.sample_rate as f32;
        let to_samples = |secs: f32| (secs.max(0.0) * rate).round() as usize;
        Self {
            energy_threshold: tuning.energy_threshold,
            pause_samples: to_samples(tuning.pause_threshold),
            phrase_min_samples: to_samples(tuning.phrase_threshold),
            non_speaking_samples: to_samples(tuning.non_speaking_duration),
            timeout_samples: tuning.listen_timeout.map(to_samples),
            limit_samples: to_samples(tuning.phrase_time_limit),
            pre_roll: VecDeque::new(),
            pre_roll_len: 0,
            phrase: Vec::new(),
            in_phrase: false,
            speaking: 0,
            silence: 0,
            waited: 0,
        }
    }

    /// Consume one chunk of mono samples
    pub fn feed(&mut self, chunk: &[i16]) -> PhraseState {
        if chunk.is_empty() {
            return if self.in_phrase {
                PhraseState::Speaking
            } else {
                PhraseState::Waiting
            };
        }
        let is_speech = calculate_energy(chunk) > self.energy_threshold;

        if !self.in_phrase {
            self.waited += chunk.len();
            self.push_pre_roll(chunk);

            if is_speech {
                self.in_phrase = true;
                self.phrase = self.pre_roll.drain(..).flatten().collect();
                self.pre_roll_len = 0;
                self.speaking = chunk.len();
                self.silence = 0;
                return PhraseState::Speaking;
            }

            if let Some(timeout) = self.timeout_samples {
                if self.waited >= timeout {
                    return PhraseState::TimedOut;
                }
            }
            return PhraseState::Waiting;
        }

        self.phrase.extend_from_slice(chunk);
        if is_speech {
            self.speaking += chunk.len();
            self.silence = 0;
        } else {
            self.silence += chunk.len();
        }

        if self.phrase.len() >= self.limit_samples {
            return PhraseState::Complete;
        }

        if self.silence >= self.pause_samples {
            if self.speaking >= self.phrase_min_samples {
                self.trim_trailing_silence();
                return PhraseState::Complete;
            }
            // too short to be speech, treat as noise
            self.discard_phrase();
            return PhraseState::Waiting;
        }

        PhraseState::Speaking
    }

    /// Hand out the finished phrase and reset for the next one
    pub fn take_phrase(&mut self) -> Vec<i16> {
        let phrase = std::mem::take(&mut self.phrase);
        self.discard_phrase();
        self.waited = 0;
        phrase
    }

    fn push_pre_roll(&mut self, chunk: &[i16]) {
        self.pre_roll.push_back(chunk.to_vec());
        self.pre_roll_len += chunk.len();
        while self.pre_roll_len > self.non_speaking_samples && self.pre_roll.len() > 1 {
            match self.pre_roll.pop_front() {
                Some(old) => self.pre_roll_len -= old.len(),
                None => break,
            }
        }
    }

    /// Keep at most `non_speaking_duration` of the closing silence
    fn trim_trailing_silence(&mut self) {
        let excess = self.silence.saturating_sub(self.non_speaking_samples);
        let keep = self.phrase.len().saturating_sub(excess);
        self.phrase.truncate(keep);
    }

    fn discard_phrase(&mut self) {
        self.phrase.clear();
        self.in_phrase = false;
        self.speaking = 0;
        self.silence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0.1s at 16 kHz
    const CHUNK: usize = 1600;

    fn tuning() -> RecognizerTuning {
        RecognizerTuning::default()
    }

    fn loud() -> Vec<i16> {
        vec![2000; CHUNK]
    }

    fn quiet() -> Vec<i16> {
        vec![0; CHUNK]
    }

    fn feed_n(detector: &mut PhraseDetector, chunk: &[i16], n: usize) -> PhraseState {
        let mut state = PhraseState::Waiting;
        for _ in 0..n {
            state = detector.feed(chunk);
        }
        state
    }

    #[test]
    fn test_silence_keeps_waiting() {
        let mut detector = PhraseDetector::new(tuning());
        assert_eq!(feed_n(&mut detector, &quiet(), 50), PhraseState::Waiting);
    }

    #[test]
    fn test_phrase_completes_after_pause() {
        let mut detector = PhraseDetector::new(tuning());
        feed_n(&mut detector, &quiet(), 10);
        assert_eq!(feed_n(&mut detector, &loud(), 5), PhraseState::Speaking);
        // 0.9s of silence is below the 1.0s pause threshold
        assert_eq!(feed_n(&mut detector, &quiet(), 9), PhraseState::Speaking);
        assert_eq!(detector.feed(&quiet()), PhraseState::Complete);

        let phrase = detector.take_phrase();
        // 0.5s pre-roll ending in the first loud chunk, 0.4s more speech,
        // 0.5s of kept trailing silence
        assert_eq!(phrase.len(), CHUNK * 14);
        assert_eq!(feed_n(&mut detector, &quiet(), 3), PhraseState::Waiting);
    }

    #[test]
    fn test_short_noise_is_discarded() {
        let mut detector = PhraseDetector::new(tuning());
        // 0.1s burst is under the 0.2s phrase threshold
        detector.feed(&loud());
        assert_eq!(feed_n(&mut detector, &quiet(), 10), PhraseState::Waiting);
        assert!(detector.take_phrase().is_empty());
    }

    #[test]
    fn test_listen_timeout() {
        let mut config = tuning();
        config.listen_timeout = Some(1.0);
        let mut detector = PhraseDetector::new(config);
        assert_eq!(feed_n(&mut detector, &quiet(), 9), PhraseState::Waiting);
        assert_eq!(detector.feed(&quiet()), PhraseState::TimedOut);
    }

    #[test]
    fn test_phrase_time_limit() {
        let mut config = tuning();
        config.phrase_time_limit = 1.0;
        let mut detector = PhraseDetector::new(config);
        assert_eq!(feed_n(&mut detector, &loud(), 9), PhraseState::Speaking);
        assert_eq!(detector.feed(&loud()), PhraseState::Complete);
    }
}
