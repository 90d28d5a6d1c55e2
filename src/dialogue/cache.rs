//! Bounded conversation history
//!
//! The cache is a full-reset log: once it holds `threshold` turns it is
//! cleared in one step. Recency plays no part in eviction.

use crate::error::{VoiceError, VoiceResult};
use std::fmt;
use tracing::info;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("User"),
            Role::Assistant => f.write_str("Assistant"),
        }
    }
}

/// One recorded utterance or reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Turn {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Emitted by [`ConversationCache::append`] when the threshold was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    /// History was cleared; `discarded` turns were dropped
    Evicted { discarded: usize },
}

#[derive(Debug, Clone)]
pub struct ConversationCache {
    turns: Vec<Turn>,
    threshold: usize,
}

impl ConversationCache {
    /// Cache holding up to `max_exchanges` user/assistant pairs
    pub fn new(max_exchanges: usize) -> Self {
        Self::with_threshold(max_exchanges.saturating_mul(2))
    }

    /// Cache that resets once it holds `threshold` turns
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            turns: Vec::new(),
            threshold: threshold.max(1),
        }
    }

    /// Record a turn. Fails with `InvalidTurn` on blank text.
    ///
    /// Returns `Some(CacheEvent::Evicted)` when this append filled the cache
    /// and the history was cleared.
    pub fn append(&mut self, role: Role, text: impl Into<String>) -> VoiceResult<Option<CacheEvent>> {
        let text = text.into();
        let text = text.trim();
        if text.is_empty() {
            return Err(VoiceError::InvalidTurn);
        }

        self.turns.push(Turn {
            role,
            text: text.to_string(),
        });

        if self.turns.len() >= self.threshold {
            let discarded = self.turns.len();
            info!("🧹 Clearing conversation cache ({} turns)...", discarded);
            self.reset();
            return Ok(Some(CacheEvent::Evicted { discarded }));
        }
        Ok(None)
    }

    /// Drop every turn
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    /// History as "User: ..." / "Assistant: ..." lines in insertion order
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_preserves_order() {
        let mut cache = ConversationCache::new(10);
        cache.append(Role::User, "hi there").unwrap();
        cache.append(Role::Assistant, "hello!").unwrap();
        cache.append(Role::User, "tell me a joke").unwrap();

        assert_eq!(
            cache.render(),
            "User: hi there\nAssistant: hello!\nUser: tell me a joke"
        );
        assert_eq!(cache.render().lines().count(), cache.len());
    }

    #[test]
    fn test_empty_render() {
        let cache = ConversationCache::new(10);
        assert_eq!(cache.render(), "");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_blank_text_is_invalid_turn() {
        let mut cache = ConversationCache::new(10);
        assert!(matches!(
            cache.append(Role::User, "   "),
            Err(VoiceError::InvalidTurn)
        ));
        assert!(matches!(cache.append(Role::User, ""), Err(VoiceError::InvalidTurn)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_text_is_trimmed() {
        let mut cache = ConversationCache::new(10);
        cache.append(Role::User, "  hello \n").unwrap();
        assert_eq!(cache.turns()[0].text(), "hello");
        assert_eq!(cache.turns()[0].role(), Role::User);
    }

    #[test]
    fn test_reset_happens_exactly_at_threshold() {
        let mut cache = ConversationCache::new(10);
        assert_eq!(cache.threshold(), 20);

        for i in 0..95 {
            let before = cache.len();
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            let event = cache.append(role, format!("turn {}", i)).unwrap();

            if before == cache.threshold() - 1 {
                assert_eq!(event, Some(CacheEvent::Evicted { discarded: 20 }));
                assert_eq!(cache.len(), 0);
            } else {
                assert_eq!(event, None);
                assert_eq!(cache.len(), before + 1);
            }
        }
    }

    #[test]
    fn test_render_after_reset_only_shows_current_window() {
        let mut cache = ConversationCache::with_threshold(4);
        for i in 0..4 {
            cache.append(Role::User, format!("old {}", i)).unwrap();
        }
        assert!(cache.is_empty());

        cache.append(Role::User, "new 0").unwrap();
        cache.append(Role::Assistant, "new 1").unwrap();
        assert_eq!(cache.render(), "User: new 0\nAssistant: new 1");
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut cache = ConversationCache::new(2);
        cache.append(Role::User, "a").unwrap();
        cache.reset();
        cache.reset();
        assert_eq!(cache.len(), 0);
    }
}
