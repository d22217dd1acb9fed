//! Storage of GPT-Bypass rewrite jobs.
//!
//! Jobs are kept in process memory and lost on restart. The store sits behind
//! the [`RewriteJobStore`] trait so a durable backend can replace it without
//! touching the handlers. The in-memory store is bounded: once full, the
//! least recently updated finished jobs make room for new ones.

use std::collections::HashMap;
use std::sync::Arc;

use jiff::Timestamp;
use redraft_core::ProviderKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Tracing target for rewrite job storage.
const TRACING_TARGET: &str = "redraft_server::service::rewrite_jobs";

/// Default number of rewrite jobs kept in memory.
pub const DEFAULT_MAX_REWRITE_JOBS: usize = 1024;

/// Status of a rewrite job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[derive(strum::Display, strum::AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum RewriteStatus {
    /// The rewrite is in progress.
    Pending,
    /// The rewrite finished and `outputText` is set.
    Completed,
    /// The rewrite failed and `errorMessage` is set.
    Error,
}

/// A single GPT-Bypass rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteJob {
    pub id: Uuid,
    pub input_text: String,
    pub style_text: Option<String>,
    pub provider: ProviderKind,
    pub output_text: Option<String>,
    pub status: RewriteStatus,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RewriteJob {
    /// Creates a pending job.
    pub fn pending(input_text: String, style_text: Option<String>, provider: ProviderKind) -> Self {
        let now = Timestamp::now();
        Self {
            id: Uuid::now_v7(),
            input_text,
            style_text,
            provider,
            output_text: None,
            status: RewriteStatus::Pending,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persistence of rewrite jobs.
#[async_trait::async_trait]
pub trait RewriteJobStore: Send + Sync {
    /// Stores a new job.
    async fn create(&self, job: RewriteJob) -> RewriteJob;

    /// Marks a job completed with its output.
    async fn complete(&self, id: Uuid, output_text: String) -> Option<RewriteJob>;

    /// Marks a job failed with an error message.
    async fn fail(&self, id: Uuid, error_message: String) -> Option<RewriteJob>;

    /// Returns a job by identifier.
    async fn find(&self, id: Uuid) -> Option<RewriteJob>;

    /// Returns at most `limit` jobs, newest first.
    async fn list(&self, limit: usize) -> Vec<RewriteJob>;
}

/// Shared handle to the rewrite job store.
pub type RewriteJobs = Arc<dyn RewriteJobStore>;

/// In-memory [`RewriteJobStore`] holding at most `capacity` jobs.
#[derive(Debug, Clone)]
pub struct InMemoryRewriteJobs {
    jobs: Arc<RwLock<HashMap<Uuid, RewriteJob>>>,
    capacity: usize,
}

impl Default for InMemoryRewriteJobs {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_REWRITE_JOBS)
    }
}

impl InMemoryRewriteJobs {
    /// Creates an empty store with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store holding at most `capacity` jobs.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: Arc::default(),
            capacity: capacity.max(1),
        }
    }

    /// Returns the store as a shared handle.
    pub fn shared(self) -> RewriteJobs {
        Arc::new(self)
    }

    async fn update(&self, id: Uuid, apply: impl FnOnce(&mut RewriteJob)) -> Option<RewriteJob> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id)?;
        apply(job);
        job.updated_at = Timestamp::now();
        Some(job.clone())
    }

    /// Removes jobs until one more fits, oldest `updated_at` first.
    ///
    /// Finished jobs go first. Pending jobs are only dropped when nothing
    /// else is left; their handler then fails to record the outcome, which
    /// it tolerates.
    fn evict(&self, jobs: &mut HashMap<Uuid, RewriteJob>) {
        if jobs.len() < self.capacity {
            return;
        }

        let mut candidates: Vec<(bool, Timestamp, Uuid)> = jobs
            .values()
            .map(|job| (job.status == RewriteStatus::Pending, job.updated_at, job.id))
            .collect();
        candidates.sort_unstable();

        let excess = jobs.len() + 1 - self.capacity;
        for (pending, _, id) in candidates.into_iter().take(excess) {
            jobs.remove(&id);
            tracing::debug!(
                target: TRACING_TARGET,
                job_id = %id,
                pending,
                "Rewrite job evicted"
            );
        }
    }
}

#[async_trait::async_trait]
impl RewriteJobStore for InMemoryRewriteJobs {
    async fn create(&self, job: RewriteJob) -> RewriteJob {
        tracing::debug!(
            target: TRACING_TARGET,
            job_id = %job.id,
            provider = %job.provider,
            "Rewrite job created"
        );

        let mut jobs = self.jobs.write().await;
        self.evict(&mut jobs);
        jobs.insert(job.id, job.clone());
        job
    }

    async fn complete(&self, id: Uuid, output_text: String) -> Option<RewriteJob> {
        self.update(id, |job| {
            job.output_text = Some(output_text);
            job.error_message = None;
            job.status = RewriteStatus::Completed;
        })
        .await
    }

    async fn fail(&self, id: Uuid, error_message: String) -> Option<RewriteJob> {
        self.update(id, |job| {
            job.error_message = Some(error_message);
            job.status = RewriteStatus::Error;
        })
        .await
    }

    async fn find(&self, id: Uuid) -> Option<RewriteJob> {
        self.jobs.read().await.get(&id).cloned()
    }

    async fn list(&self, limit: usize) -> Vec<RewriteJob> {
        let jobs = self.jobs.read().await;
        let mut list: Vec<RewriteJob> = jobs.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        list.truncate(limit);
        list
    }
}
