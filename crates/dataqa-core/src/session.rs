//! Per-session state: one agent slot per browser session.
//!
//! The slot lives behind a `tokio::sync::Mutex` that a render pass holds from start to
//! finish, so passes for the same session never overlap and at most one question is in
//! flight per session. Different sessions never share a lock.
//!
//! Sessions idle for longer than `session_idle_secs` are swept by `SessionStore::evict_idle`;
//! a later request with the same cookie starts over with a fresh, uninitialized slot.

use crate::agent::{Agent, AgentFactory};
use crate::config::AppConfig;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Accepts only well-formed UUIDs, so cookie junk never becomes a session key.
    pub fn parse(raw: &str) -> Option<Self> {
        uuid::Uuid::parse_str(raw.trim())
            .ok()
            .map(|u| Self(u.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Agent lifecycle within one session. `Ready` and `Failed` are terminal.
#[derive(Clone, Default)]
pub enum AgentSlot {
    #[default]
    Uninitialized,
    Ready(Arc<dyn Agent>),
    Failed(String),
}

impl AgentSlot {
    pub fn agent(&self) -> Option<Arc<dyn Agent>> {
        match self {
            AgentSlot::Ready(a) => Some(Arc::clone(a)),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AgentSlot::Ready(_))
    }
}

impl fmt::Debug for AgentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentSlot::Uninitialized => f.write_str("Uninitialized"),
            AgentSlot::Ready(a) => write!(f, "Ready({})", a.name()),
            AgentSlot::Failed(e) => write!(f, "Failed({})", e),
        }
    }
}

/// Outcome of `ensure_agent` for the current pass.
pub enum EnsureOutcome {
    /// Agent reused or freshly built.
    Available(Arc<dyn Agent>),
    /// Construction failed during this pass; the message is shown once.
    JustFailed(String),
    /// Construction failed in an earlier pass.
    PreviouslyFailed,
}

#[derive(Debug)]
pub struct Session {
    slot: Mutex<AgentSlot>,
    last_seen: std::sync::Mutex<Instant>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            slot: Mutex::new(AgentSlot::Uninitialized),
            last_seen: std::sync::Mutex::new(Instant::now()),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&self) {
        if let Ok(mut seen) = self.last_seen.lock() {
            *seen = Instant::now();
        }
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .map(|seen| seen.elapsed())
            .unwrap_or_default()
    }

    /// Exclusive access for one render pass.
    pub async fn lock(&self) -> SessionGuard<'_> {
        SessionGuard {
            slot: self.slot.lock().await,
        }
    }
}

pub struct SessionGuard<'a> {
    slot: MutexGuard<'a, AgentSlot>,
}

impl SessionGuard<'_> {
    pub fn slot(&self) -> &AgentSlot {
        &self.slot
    }

    /// Build the agent on first use; afterwards reuse it (or stay failed).
    pub fn ensure_agent(&mut self, factory: &dyn AgentFactory, config: &AppConfig) -> EnsureOutcome {
        match &*self.slot {
            AgentSlot::Ready(agent) => return EnsureOutcome::Available(Arc::clone(agent)),
            AgentSlot::Failed(_) => return EnsureOutcome::PreviouslyFailed,
            AgentSlot::Uninitialized => {}
        }

        match factory.build(config) {
            Ok(agent) => {
                tracing::info!(agent = agent.name(), "agent initialized");
                *self.slot = AgentSlot::Ready(Arc::clone(&agent));
                EnsureOutcome::Available(agent)
            }
            Err(e) => {
                let msg = e.to_string();
                tracing::warn!(error = %msg, "agent initialization failed");
                *self.slot = AgentSlot::Failed(msg.clone());
                EnsureOutcome::JustFailed(msg)
            }
        }
    }
}

/// All live sessions, keyed by cookie id.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, Arc<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, id: &SessionId) -> Arc<Session> {
        let entry = self.sessions.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(session = %id, "session created");
            Arc::new(Session::new())
        });
        entry.value().touch();
        Arc::clone(entry.value())
    }

    /// Drop sessions idle for at least `ttl`. Sessions with a render pass in flight
    /// (someone else holds their `Arc`) are kept. Returns how many were removed.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| Arc::strong_count(session) > 1 || session.idle_for() < ttl);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.sessions.len(), "idle sessions evicted");
        }
        removed
    }

    pub fn remove(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DataQaError, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo;

    #[async_trait::async_trait]
    impl Agent for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        async fn invoke(&self, question: &str) -> Result<String> {
            Ok(question.to_string())
        }
    }

    struct Counting {
        builds: AtomicUsize,
        fail: bool,
    }

    impl AgentFactory for Counting {
        fn build(&self, _config: &AppConfig) -> Result<Arc<dyn Agent>> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DataQaError::Configuration("no key".into()))
            } else {
                Ok(Arc::new(Echo))
            }
        }
    }

    #[test]
    fn session_id_parse_rejects_garbage() {
        assert!(SessionId::parse("not-a-uuid").is_none());
        let id = SessionId::new();
        assert_eq!(SessionId::parse(id.as_str()), Some(id));
    }

    #[tokio::test]
    async fn agent_built_once_and_reused() {
        let factory = Counting { builds: AtomicUsize::new(0), fail: false };
        let cfg = AppConfig::default();
        let session = Session::new();

        for _ in 0..3 {
            let mut guard = session.lock().await;
            assert!(matches!(guard.ensure_agent(&factory, &cfg), EnsureOutcome::Available(_)));
        }
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
        assert!(session.lock().await.slot().is_ready());
    }

    #[tokio::test]
    async fn failure_is_terminal() {
        let factory = Counting { builds: AtomicUsize::new(0), fail: true };
        let cfg = AppConfig::default();
        let session = Session::new();

        let mut guard = session.lock().await;
        match guard.ensure_agent(&factory, &cfg) {
            EnsureOutcome::JustFailed(msg) => assert_eq!(msg, "no key"),
            _ => panic!("expected JustFailed"),
        }
        assert!(matches!(guard.ensure_agent(&factory, &cfg), EnsureOutcome::PreviouslyFailed));
        drop(guard);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn store_returns_same_session_for_same_id() {
        let store = SessionStore::new();
        let id = SessionId::new();
        let a = store.get_or_create(&id);
        let b = store.get_or_create(&id);
        assert!(Arc::ptr_eq(&a, &b));
        store.get_or_create(&SessionId::new());
        assert_eq!(store.len(), 2);
        assert!(store.remove(&id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let store = SessionStore::new();
        let idle = SessionId::new();
        store.get_or_create(&idle);
        std::thread::sleep(Duration::from_millis(30));

        let fresh = SessionId::new();
        store.get_or_create(&fresh);

        assert_eq!(store.evict_idle(Duration::from_millis(20)), 1);
        assert_eq!(store.len(), 1);

        // Same cookie comes back: a brand-new session with an empty slot.
        let again = store.get_or_create(&idle);
        assert_eq!(store.len(), 2);
        assert!(matches!(
            again.slot.try_lock().map(|s| s.is_ready()),
            Ok(false)
        ));
    }

    #[test]
    fn sessions_in_use_survive_eviction() {
        let store = SessionStore::new();
        let id = SessionId::new();
        let held = store.get_or_create(&id);
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(store.evict_idle(Duration::ZERO), 0);
        drop(held);
        assert_eq!(store.evict_idle(Duration::ZERO), 1);
        assert!(store.is_empty());
    }
}
