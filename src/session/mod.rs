//! Bounded per-session conversation memory.
//!
//! Sessions are created implicitly, never expire, and are destroyed only by
//! an explicit clear. Each session keeps a sliding window of the most recent
//! exchanges, rendered into a history string for the model's system prompt.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// One question/answer pair within a session.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub query: String,
    pub answer: String,
}

/// Manages conversation history across sessions.
///
/// Appends are serialized by an interior lock; concurrent queries on
/// different sessions do not contend on anything but the map itself.
pub struct SessionManager {
    sessions: Mutex<HashMap<String, Vec<Exchange>>>,
    max_history: usize,
}

impl SessionManager {
    /// Create a manager keeping at most `max_history` exchanges per session.
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_history,
        }
    }

    /// Allocate a fresh session identifier. No content yet.
    pub fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        debug!("Created session {}", id);
        id
    }

    /// Render a session's exchanges as alternating "User:" / "Assistant:"
    /// lines, oldest first. None when the session is unknown or empty.
    pub fn get_conversation_history(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.lock().unwrap();
        let exchanges = sessions.get(session_id)?;
        if exchanges.is_empty() {
            return None;
        }

        let lines: Vec<String> = exchanges
            .iter()
            .flat_map(|e| {
                [
                    format!("User: {}", e.query),
                    format!("Assistant: {}", e.answer),
                ]
            })
            .collect();

        Some(lines.join("\n"))
    }

    /// Append an exchange, creating the session implicitly. Once the count
    /// exceeds the configured maximum the oldest exchanges are dropped.
    pub fn add_exchange(&self, session_id: &str, query: &str, answer: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        let exchanges = sessions.entry(session_id.to_string()).or_default();

        exchanges.push(Exchange {
            query: query.to_string(),
            answer: answer.to_string(),
        });

        if exchanges.len() > self.max_history {
            let excess = exchanges.len() - self.max_history;
            exchanges.drain(..excess);
        }
    }

    /// Remove all exchanges for a session. Idempotent.
    pub fn clear_session(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(session_id);
        debug!("Cleared session {}", session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_session_ids_are_unique() {
        let manager = SessionManager::new(2);
        let a = manager.create_session();
        let b = manager.create_session();
        assert_ne!(a, b);
    }

    #[test]
    fn test_history_rendering() {
        let manager = SessionManager::new(5);
        manager.add_exchange("s1", "What is Python?", "A programming language.");
        manager.add_exchange("s1", "Who made it?", "Guido van Rossum.");

        let history = manager.get_conversation_history("s1").unwrap();
        assert_eq!(
            history,
            "User: What is Python?\n\
             Assistant: A programming language.\n\
             User: Who made it?\n\
             Assistant: Guido van Rossum."
        );
    }

    #[test]
    fn test_history_none_for_unknown_or_empty_session() {
        let manager = SessionManager::new(2);
        assert!(manager.get_conversation_history("missing").is_none());

        let id = manager.create_session();
        // Created but no exchanges yet
        assert!(manager.get_conversation_history(&id).is_none());
    }

    #[test]
    fn test_sliding_window_keeps_most_recent() {
        let manager = SessionManager::new(2);
        manager.add_exchange("s1", "q1", "a1");
        manager.add_exchange("s1", "q2", "a2");
        manager.add_exchange("s1", "q3", "a3");

        let history = manager.get_conversation_history("s1").unwrap();
        assert!(!history.contains("q1"));
        assert!(history.contains("q2"));
        assert!(history.contains("q3"));
        // Original order preserved
        assert!(history.find("q2").unwrap() < history.find("q3").unwrap());
    }

    #[test]
    fn test_clear_session_is_idempotent() {
        let manager = SessionManager::new(2);
        manager.add_exchange("s1", "q", "a");
        manager.clear_session("s1");
        assert!(manager.get_conversation_history("s1").is_none());

        // Clearing again, or clearing a session that never existed, is fine
        manager.clear_session("s1");
        manager.clear_session("never-existed");
    }

    #[test]
    fn test_sessions_are_independent() {
        let manager = SessionManager::new(2);
        manager.add_exchange("s1", "q1", "a1");
        manager.add_exchange("s2", "q2", "a2");

        assert!(manager
            .get_conversation_history("s1")
            .unwrap()
            .contains("q1"));
        assert!(manager
            .get_conversation_history("s2")
            .unwrap()
            .contains("q2"));

        manager.clear_session("s1");
        assert!(manager.get_conversation_history("s1").is_none());
        assert!(manager.get_conversation_history("s2").is_some());
    }
}
