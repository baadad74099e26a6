//! Process-wide archive job store (§3.4, §5, §9): in-memory only, owned
//! by the archive engine for the life of the process. Reads (status
//! lookups, lineage listing) may overlap; any mutation (create,
//! transition, add-artifact) is exclusive. The lock is held across no
//! `.await` points — every mutation here is synchronous map/deque work —
//! so a plain `tokio::sync::RwLock` is sufficient without reaching for a
//! blocking `parking_lot` lock (noted in DESIGN.md).

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{ArchiveJob, ArchiveStatus, LineageEntry};
use crate::error::QueryError;

#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, ArchiveJob>>>,
    lineage: Arc<RwLock<VecDeque<LineageEntry>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: ArchiveJob) {
        self.jobs.write().await.insert(job.id, job);
    }

    pub async fn get(&self, id: Uuid) -> Result<ArchiveJob, QueryError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| QueryError::NotFound(format!("archive job {id}")))
    }

    /// Apply `f` to the job's record under the exclusive lock. Used for
    /// every state transition (§4.6 lifecycle) so transitions are atomic.
    pub async fn update(&self, id: Uuid, f: impl FnOnce(&mut ArchiveJob)) -> Result<(), QueryError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or_else(|| QueryError::NotFound(format!("archive job {id}")))?;
        f(job);
        Ok(())
    }

    /// Appends a completed job to the lineage log, most-recent-first.
    /// Only called on a successful `complete` transition — failed jobs are
    /// never appended (§4.6).
    pub async fn append_lineage(&self, entry: LineageEntry) {
        self.lineage.write().await.push_front(entry);
    }

    pub async fn lineage(&self, asset: Option<&str>, limit: usize) -> Vec<LineageEntry> {
        let log = self.lineage.read().await;
        log.iter()
            .filter(|e| asset.map(|a| e.asset == a).unwrap_or(true))
            .take(limit)
            .cloned()
            .collect()
    }
}

pub fn new_job(id: Uuid, summary: crate::domain::ArchiveRequestSummary) -> ArchiveJob {
    ArchiveJob {
        id,
        asset: summary.asset.clone(),
        request: summary,
        status: ArchiveStatus::Pending,
        artifacts: Vec::new(),
        error: None,
        created_at: Utc::now(),
        completed_at: None,
    }
}
