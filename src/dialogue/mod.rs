//! Dialogue core
//!
//! Conversation cache, intent routing, action handlers and the turn loop
//! that ties them to the audio, speech and web collaborators.

pub mod cache;
pub mod handlers;
pub mod intent;
pub mod prompt;
pub mod text;
pub mod turn_loop;
pub mod voice;

pub use cache::{CacheEvent, ConversationCache, Role, Turn};
pub use handlers::{weather_summary, ActionOutcome, Utterance};
pub use intent::{Intent, IntentRouter};
pub use prompt::{PayloadPrompt, StdinPrompt};
pub use turn_loop::{Collaborators, LoopSettings, LoopState, TurnLoop, TurnOutcome, TurnReport};
pub use voice::Voice;
