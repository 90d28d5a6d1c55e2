//! Intent Router
//!
//! Maps a transcribed utterance to exactly one [`Intent`]. Rules are plain
//! substring tests on the lowercased text, evaluated top to bottom; the first
//! match wins and `Chat` catches everything else.
//!
//! Priority: NameIntroduction, QrRequest, WeatherRequest, Exit, Chat.

use super::text::title_case;
use std::fmt;
use tracing::debug;

const NAME_PHRASE: &str = "my name is";

const QR_KEYWORDS: &[&str] = &["create qr code", "make qr code", "qrcode", "qr code"];

const WEATHER_KEYWORDS: &[&str] = &["weather", "feels in"];

const EXIT_KEYWORDS: &[&str] = &["exit", "good bye", "go away"];

/// The classified purpose of an utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    NameIntroduction { name: String },
    QrRequest,
    WeatherRequest,
    Exit,
    Chat,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::NameIntroduction { name } => write!(f, "name_introduction({})", name),
            Intent::QrRequest => f.write_str("qr_request"),
            Intent::WeatherRequest => f.write_str("weather_request"),
            Intent::Exit => f.write_str("exit"),
            Intent::Chat => f.write_str("chat"),
        }
    }
}

/// One routing rule: a name for logs and a matcher over lowercased text
struct Rule {
    name: &'static str,
    matcher: fn(&str) -> Option<Intent>,
}

pub struct IntentRouter {
    rules: Vec<Rule>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentRouter {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Rule {
                    name: "name",
                    matcher: match_name,
                },
                Rule {
                    name: "qr",
                    matcher: match_qr,
                },
                Rule {
                    name: "weather",
                    matcher: match_weather,
                },
                Rule {
                    name: "exit",
                    matcher: match_exit,
                },
            ],
        }
    }

    /// Classify `text`. Total: anything unmatched is `Chat`.
    ///
    /// Callers must not pass blank text; the turn loop filters it out first.
    pub fn classify(&self, text: &str) -> Intent {
        let lower = text.to_lowercase();
        for rule in &self.rules {
            if let Some(intent) = (rule.matcher)(&lower) {
                debug!("🎯 Matched rule '{}' -> {}", rule.name, intent);
                return intent;
            }
        }
        Intent::Chat
    }
}

fn match_name(text: &str) -> Option<Intent> {
    extract_name(text).map(|name| Intent::NameIntroduction { name })
}

fn match_qr(text: &str) -> Option<Intent> {
    contains_any(text, QR_KEYWORDS).then_some(Intent::QrRequest)
}

fn match_weather(text: &str) -> Option<Intent> {
    contains_any(text, WEATHER_KEYWORDS).then_some(Intent::WeatherRequest)
}

fn match_exit(text: &str) -> Option<Intent> {
    contains_any(text, EXIT_KEYWORDS).then_some(Intent::Exit)
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// First word after the last "my name is", trailing punctuation dropped, title-cased
fn extract_name(lower: &str) -> Option<String> {
    let (_, rest) = lower.rsplit_once(NAME_PHRASE)?;
    let token = rest.split_whitespace().next()?;
    let token = token.trim_matches(|c: char| !c.is_alphanumeric());
    if token.is_empty() {
        return None;
    }
    Some(title_case(token))
}
