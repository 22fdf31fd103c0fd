// src/session/registry.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;

use crate::error::AppError;
use crate::store::SessionStore;

use super::engine::{TestSession, TickOutcome};
use super::pipeline;

/// Identity of one session: exactly one live session may exist per
/// (student, test) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub student_id: i64,
    pub test_id: i64,
}

impl SessionKey {
    pub fn new(student_id: i64, test_id: i64) -> Self {
        SessionKey {
            student_id,
            test_id,
        }
    }

    pub fn for_session(session: &TestSession) -> Self {
        SessionKey {
            student_id: session.student_id(),
            test_id: session.test().id,
        }
    }
}

pub type SharedSession = Arc<Mutex<TestSession>>;

struct ActiveSession {
    session: SharedSession,
    ticker: AbortHandle,
}

/// In-process map of live sessions plus their countdown tickers.
///
/// Policy for a second start request on the same (student, test) from
/// another tab or device: it joins the existing session rather than
/// forking a competing one. The ticker task is the only autonomous
/// source of mutation and is aborted when the session ends, so nothing
/// writes after teardown.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<SessionKey, ActiveSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: SessionKey) -> Option<SharedSession> {
        self.inner
            .lock()
            .await
            .get(&key)
            .map(|active| active.session.clone())
    }

    /// Starts a session, or resumes the live one for this key.
    ///
    /// A fresh start loads the test and its questions concurrently,
    /// then seeds from the persisted snapshot if one exists. Snapshot
    /// read failures are non-fatal; the session starts from defaults.
    pub async fn start(
        &self,
        store: Arc<dyn SessionStore>,
        key: SessionKey,
    ) -> Result<SharedSession, AppError> {
        if let Some(existing) = self.get(key).await {
            return Ok(existing);
        }

        let test = store.fetch_test(key.test_id).await?;
        if !test.is_active {
            return Err(AppError::NotFound(format!(
                "Test {} is not available",
                key.test_id
            )));
        }
        let questions = store.fetch_questions(&test).await?;

        let snapshot = match store.load_snapshot(key).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    student_id = key.student_id,
                    test_id = key.test_id,
                    "failed to load resume snapshot, starting fresh: {}",
                    e
                );
                None
            }
        };

        let session = match snapshot {
            Some(snapshot) => TestSession::resume(test, questions, key.student_id, snapshot)?,
            None => TestSession::new(test, questions, key.student_id)?,
        };
        let shared = Arc::new(Mutex::new(session));

        let mut map = self.inner.lock().await;
        // Two concurrent starts may have both loaded; only one wins.
        if let Some(existing) = map.get(&key) {
            return Ok(existing.session.clone());
        }
        let ticker = self.spawn_ticker(store, key, shared.clone());
        map.insert(
            key,
            ActiveSession {
                session: shared.clone(),
                ticker,
            },
        );

        tracing::info!(
            student_id = key.student_id,
            test_id = key.test_id,
            "session started"
        );
        Ok(shared)
    }

    /// Removes a finished session and cancels its ticker.
    pub async fn finish(&self, key: SessionKey) {
        let mut map = self.inner.lock().await;
        if let Some(active) = map.remove(&key) {
            active.ticker.abort();
        }
    }

    /// One task per session drives the countdown: tick, write-through
    /// the snapshot, and on expiry run the submission pipeline exactly
    /// once. On expiry-submission failure the ticker stops (no
    /// automatic retry); the session stays live for a manual submit.
    fn spawn_ticker(
        &self,
        store: Arc<dyn SessionStore>,
        key: SessionKey,
        shared: SharedSession,
    ) -> AbortHandle {
        let registry = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut session = shared.lock().await;
                match session.tick() {
                    TickOutcome::Running(_) => {
                        let snapshot = session.snapshot();
                        drop(session);
                        if let Err(e) = store.save_snapshot(key, &snapshot).await {
                            tracing::debug!(
                                student_id = key.student_id,
                                test_id = key.test_id,
                                "snapshot write failed: {}",
                                e
                            );
                        }
                    }
                    TickOutcome::Expired => {
                        tracing::info!(
                            student_id = key.student_id,
                            test_id = key.test_id,
                            "time expired, auto-submitting"
                        );
                        match pipeline::submit(store.as_ref(), &mut session, Utc::now()).await {
                            Ok(_) => {
                                drop(session);
                                registry.finish(key).await;
                            }
                            Err(e) => {
                                tracing::error!(
                                    student_id = key.student_id,
                                    test_id = key.test_id,
                                    "auto-submission failed: {}",
                                    e
                                );
                            }
                        }
                        break;
                    }
                    TickOutcome::Halted => break,
                }
            }
        });
        handle.abort_handle()
    }
}
