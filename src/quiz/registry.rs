// src/quiz/registry.rs

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::{sync::Mutex, task::JoinHandle};
use uuid::Uuid;

use crate::quiz::{attempt::Attempt, integrity::IntegrityMonitor};

/// A live attempt and its integrity monitor.
#[derive(Debug)]
pub struct AttemptSession {
    pub attempt: Attempt,
    pub monitor: IntegrityMonitor,
    last_activity: Instant,
}

impl AttemptSession {
    pub fn new(attempt: Attempt) -> Self {
        Self {
            attempt,
            monitor: IntegrityMonitor::new(),
            last_activity: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

/// Each session has its own lock. Holding it for a whole transition, persistence
/// included, serializes the events of one attempt in arrival order.
pub type SharedSession = Arc<Mutex<AttemptSession>>;

/// A registry entry. The owner is readable without taking the session lock.
#[derive(Debug, Clone)]
pub struct LiveAttempt {
    pub student_id: i64,
    pub session: SharedSession,
}

/// In-process store of live attempts, keyed by attempt ID.
#[derive(Debug, Default)]
pub struct AttemptRegistry {
    sessions: DashMap<Uuid, LiveAttempt>,
}

impl AttemptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, attempt: Attempt) -> SharedSession {
        let id = attempt.id();
        let student_id = attempt.student_id();
        let session = Arc::new(Mutex::new(AttemptSession::new(attempt)));
        self.sessions.insert(
            id,
            LiveAttempt {
                student_id,
                session: session.clone(),
            },
        );
        session
    }

    pub fn get(&self, id: &Uuid) -> Option<LiveAttempt> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops sessions idle for longer than `max_idle`. Sessions currently locked are in use and kept.
    /// Unfinished attempts dropped here leave no record.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, live| match live.session.try_lock() {
            Ok(guard) => guard.idle_for() < max_idle,
            Err(_) => true,
        });
        before.saturating_sub(self.sessions.len())
    }
}

/// Periodically sweeps idle attempts out of the registry.
pub fn spawn_sweeper(
    registry: Arc<AttemptRegistry>,
    max_idle: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let dropped = registry.sweep_idle(max_idle);
            if dropped > 0 {
                tracing::info!(
                    "Dropped {} idle attempt(s), {} still live",
                    dropped,
                    registry.len()
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let registry = AttemptRegistry::new();
        let attempt = Attempt::new(1, "Capitals");
        let id = attempt.id();
        registry.insert(attempt);

        let live = registry.get(&id).expect("session present");
        assert_eq!(live.student_id, 1);
        assert_eq!(live.session.lock().await.attempt.student_id(), 1);
        assert!(registry.get(&Uuid::new_v4()).is_none());
    }

    #[tokio::test]
    async fn test_owner_is_readable_while_session_is_locked() {
        let registry = AttemptRegistry::new();
        let attempt = Attempt::new(7, "Capitals");
        let id = attempt.id();
        let session = registry.insert(attempt);
        let _guard = session.lock().await;

        let live = registry.get(&id).expect("session present");
        assert_eq!(live.student_id, 7);
        assert!(live.session.try_lock().is_err());
    }

    #[tokio::test]
    async fn test_attempts_are_independent() {
        let registry = AttemptRegistry::new();
        let first = registry.insert(Attempt::new(1, "Capitals"));
        let second = registry.insert(Attempt::new(2, "Capitals"));
        assert_eq!(registry.len(), 2);
        assert_ne!(
            first.lock().await.attempt.id(),
            second.lock().await.attempt.id()
        );
    }

    #[tokio::test]
    async fn test_sweep_drops_idle_sessions_only() {
        let registry = AttemptRegistry::new();
        registry.insert(Attempt::new(1, "Capitals"));
        assert_eq!(registry.sweep_idle(Duration::from_secs(60)), 0);
        assert_eq!(registry.len(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(registry.sweep_idle(Duration::from_millis(5)), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_keeps_locked_sessions() {
        let registry = AttemptRegistry::new();
        let session = registry.insert(Attempt::new(1, "Capitals"));
        let _guard = session.lock().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(registry.sweep_idle(Duration::from_millis(5)), 0);
    }
}
