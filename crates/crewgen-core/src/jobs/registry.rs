//! Job registry.

use super::{JobError, JobStatus, SessionId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;

/// Storage for session status records.
///
/// Records are replaced whole; readers always get a complete snapshot.
pub trait JobRegistry: Send + Sync {
    /// Registers a new session.
    fn create(&self, status: JobStatus) -> Result<(), JobError>;

    /// Replaces a session's record, enforcing the stage order.
    fn update(&self, status: JobStatus) -> Result<(), JobError>;

    /// Current record of a session.
    fn get(&self, session_id: &SessionId) -> Result<Arc<JobStatus>, JobError>;

    /// Drops finished sessions older than the retention time; returns how many.
    fn expire(&self, now: DateTime<Utc>) -> Result<usize, JobError>;

    /// Number of sessions held.
    fn len(&self) -> Result<usize, JobError>;

    /// Whether no session is held.
    fn is_empty(&self) -> Result<bool, JobError> {
        Ok(self.len()? == 0)
    }
}

/// Process-local registry.
#[derive(Debug, Default)]
pub struct InMemoryJobRegistry {
    records: RwLock<HashMap<SessionId, Arc<JobStatus>>>,
    capacity: Option<usize>,
    ttl: Option<Duration>,
}

impl InMemoryJobRegistry {
    /// Creates an unbounded registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the number of sessions held.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets how long finished sessions are kept.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    fn poisoned(e: impl std::fmt::Display) -> JobError {
        JobError::LockPoisoned(e.to_string())
    }

    fn check_transition(current: &JobStatus, next: &JobStatus) -> Result<(), JobError> {
        let session_id = current.session_id;
        if current.is_terminal() {
            return Err(JobError::Terminal { session_id, stage: current.stage });
        }
        if !current.stage.can_advance_to(next.stage) {
            return Err(JobError::InvalidTransition {
                session_id,
                from: current.stage,
                to: next.stage,
            });
        }
        if next.progress < current.progress || next.progress > 100 {
            return Err(JobError::ProgressRegression {
                session_id,
                from: current.progress,
                to: next.progress,
            });
        }
        Ok(())
    }
}

impl JobRegistry for InMemoryJobRegistry {
    fn create(&self, status: JobStatus) -> Result<(), JobError> {
        let mut records = self.records.write().map_err(Self::poisoned)?;

        if records.contains_key(&status.session_id) {
            return Err(JobError::AlreadyExists(status.session_id));
        }

        if let Some(capacity) = self.capacity {
            if records.len() >= capacity {
                let oldest_finished = records
                    .values()
                    .filter(|record| record.is_terminal())
                    .min_by_key(|record| record.updated_at)
                    .map(|record| record.session_id);

                let Some(evicted) = oldest_finished else {
                    return Err(JobError::CapacityExceeded(records.len()));
                };
                records.remove(&evicted);
                debug!(session_id = %evicted, "Evicted finished session");
            }
        }

        records.insert(status.session_id, Arc::new(status));
        Ok(())
    }

    fn update(&self, status: JobStatus) -> Result<(), JobError> {
        let mut records = self.records.write().map_err(Self::poisoned)?;

        let current = records
            .get(&status.session_id)
            .ok_or(JobError::UnknownSession(status.session_id))?;
        Self::check_transition(current, &status)?;

        records.insert(status.session_id, Arc::new(status));
        Ok(())
    }

    fn get(&self, session_id: &SessionId) -> Result<Arc<JobStatus>, JobError> {
        let records = self.records.read().map_err(Self::poisoned)?;
        records.get(session_id).cloned().ok_or(JobError::UnknownSession(*session_id))
    }

    fn expire(&self, now: DateTime<Utc>) -> Result<usize, JobError> {
        let Some(ttl) = self.ttl else {
            return Ok(0);
        };

        let mut records = self.records.write().map_err(Self::poisoned)?;
        let before = records.len();
        records.retain(|_, record| {
            let expired = record.is_terminal()
                && now.signed_duration_since(record.updated_at).to_std().is_ok_and(|age| age >= ttl);
            !expired
        });

        let removed = before - records.len();
        if removed > 0 {
            debug!(removed, "Expired finished sessions");
        }
        Ok(removed)
    }

    fn len(&self) -> Result<usize, JobError> {
        Ok(self.records.read().map_err(Self::poisoned)?.len())
    }
}
