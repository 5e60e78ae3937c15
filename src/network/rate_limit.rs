//! Per-Event Rate Limiting
//!
//! Sliding-window counters keyed by event kind and caller. Windows are
//! configurable per event; events without a rule pass freely. The
//! limiter is a collaborator: the orchestrator consults it before every
//! dispatch and surfaces RATE_LIMITED to the offender.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::game::state::{SessionId, UserId};

/// Rate-limit bucket for an inbound event.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    JoinGame,
    CreateRoom,
    JoinRoom,
    LeaveRoom,
    SetReady,
    StartGame,
    SubmitHint,
    SubmitVote,
    PlayAgain,
    SendMessage,
    GetRooms,
    /// All friend operations share one bucket.
    Friend,
}

/// A per-event window rule.
#[derive(Debug, Clone, Copy)]
pub struct WindowRule {
    /// Maximum events inside the window.
    pub limit: usize,
    /// Window length.
    pub window: Duration,
    /// Key by user id when available (falls back to session id for
    /// guests); otherwise always by session id.
    pub per_user: bool,
}

/// Rate-limit collaborator consulted before dispatch.
pub trait RateLimiter: Send + Sync {
    /// Whether the caller may perform this event now. Recording happens
    /// on admission; denied calls are not recorded.
    fn allow(&self, kind: EventKind, session_id: &SessionId, user_id: Option<&UserId>) -> bool;
}

/// Sliding-window limiter backed by per-key timestamp deques.
pub struct SlidingWindowLimiter {
    rules: HashMap<EventKind, WindowRule>,
    hits: Mutex<HashMap<(EventKind, String), VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    /// Limiter with explicit rules.
    pub fn new(rules: HashMap<EventKind, WindowRule>) -> Self {
        Self {
            rules,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Production defaults.
    pub fn with_defaults() -> Self {
        let mut rules = HashMap::new();
        rules.insert(
            EventKind::JoinGame,
            WindowRule {
                limit: 3,
                window: Duration::from_secs(60),
                per_user: false,
            },
        );
        rules.insert(
            EventKind::CreateRoom,
            WindowRule {
                limit: 5,
                window: Duration::from_secs(60),
                per_user: true,
            },
        );
        rules.insert(
            EventKind::JoinRoom,
            WindowRule {
                limit: 10,
                window: Duration::from_secs(60),
                per_user: false,
            },
        );
        rules.insert(
            EventKind::SendMessage,
            WindowRule {
                limit: 20,
                window: Duration::from_secs(10),
                per_user: false,
            },
        );
        rules.insert(
            EventKind::SubmitHint,
            WindowRule {
                limit: 5,
                window: Duration::from_secs(10),
                per_user: false,
            },
        );
        rules.insert(
            EventKind::SubmitVote,
            WindowRule {
                limit: 10,
                window: Duration::from_secs(10),
                per_user: false,
            },
        );
        rules.insert(
            EventKind::GetRooms,
            WindowRule {
                limit: 10,
                window: Duration::from_secs(10),
                per_user: false,
            },
        );
        Self::new(rules)
    }

    /// Internal: check + record with an explicit clock (for testing).
    fn allow_at(
        &self,
        kind: EventKind,
        session_id: &SessionId,
        user_id: Option<&UserId>,
        now: Instant,
    ) -> bool {
        let Some(rule) = self.rules.get(&kind) else {
            return true;
        };

        let key_id = if rule.per_user {
            user_id
                .map(|u| u.to_string())
                .unwrap_or_else(|| session_id.to_string())
        } else {
            session_id.to_string()
        };

        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        let deque = hits.entry((kind, key_id)).or_default();
        while let Some(front) = deque.front() {
            if now.duration_since(*front) > rule.window {
                deque.pop_front();
            } else {
                break;
            }
        }
        if deque.len() >= rule.limit {
            return false;
        }
        deque.push_back(now);
        true
    }
}

impl RateLimiter for SlidingWindowLimiter {
    fn allow(&self, kind: EventKind, session_id: &SessionId, user_id: Option<&UserId>) -> bool {
        self.allow_at(kind, session_id, user_id, Instant::now())
    }
}

/// Limiter that admits everything; used in tests and library embedding.
pub struct AllowAll;

impl RateLimiter for AllowAll {
    fn allow(&self, _: EventKind, _: &SessionId, _: Option<&UserId>) -> bool {
        true
    }
}
