//! Single-slot background job execution for `crawl` and `embed`, each kind
//! tracked independently so a running crawl doesn't block starting an embed
//! pass (or vice versa).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Crawl,
    Embed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub state: JobState,
    pub total: usize,
    pub completed: usize,
    pub success: usize,
    pub errors: usize,
    pub current_item: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            state: JobState::Idle,
            total: 0,
            completed: 0,
            success: 0,
            errors: 0,
            current_item: None,
            started_at: None,
            finished_at: None,
            error_message: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("a {0:?} job is already running")]
    Busy(JobKind),
}

/// Process-local singleton progress tracker, one slot per `JobKind`. Cloning
/// a `JobRunner` shares the same underlying state (it holds only `Arc`s), so
/// the HTTP server and CLI can each hold their own handle to the same jobs.
#[derive(Clone)]
pub struct JobRunner {
    slots: Arc<RwLock<HashMap<JobKind, Progress>>>,
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn status(&self, kind: JobKind) -> Progress {
        self.slots.read().await.get(&kind).cloned().unwrap_or_default()
    }

    /// Claim the slot for `kind` and spawn a background task that runs
    /// `items` through `process_one` sequentially, in the order given.
    /// Returns as soon as the slot is claimed, not when the job finishes —
    /// callers poll `status` for progress. Fails with `Busy` (without
    /// touching progress) if a job of this kind is already running.
    /// `process_one` returning `Err` counts as a per-item failure and does
    /// not abort the run; only a panic inside it would leave the slot stuck
    /// at `Running`, which is the "unexpected fatal error" case this type
    /// does not protect against on its own — callers processing fallible
    /// work should catch their own errors rather than let them panic.
    pub async fn start<T, F, Fut>(
        &self,
        kind: JobKind,
        items: Vec<T>,
        label: impl Fn(&T) -> String + Send + 'static,
        mut process_one: F,
    ) -> Result<(), JobError>
    where
        T: Send + 'static,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), String>> + Send,
    {
        {
            let mut slots = self.slots.write().await;
            if matches!(slots.get(&kind), Some(p) if p.state == JobState::Running) {
                return Err(JobError::Busy(kind));
            }
            slots.insert(
                kind,
                Progress {
                    state: JobState::Running,
                    total: items.len(),
                    started_at: Some(Utc::now()),
                    ..Default::default()
                },
            );
        }
        info!(?kind, total = items.len(), "job started");

        let slots = self.slots.clone();
        tokio::spawn(async move {
            for item in items {
                let item_label = label(&item);
                {
                    let mut slots = slots.write().await;
                    if let Some(p) = slots.get_mut(&kind) {
                        p.current_item = Some(item_label.clone());
                    }
                }
                let result = process_one(item).await;
                let mut slots = slots.write().await;
                if let Some(p) = slots.get_mut(&kind) {
                    p.completed += 1;
                    match result {
                        Ok(()) => p.success += 1,
                        Err(msg) => {
                            p.errors += 1;
                            error!(?kind, item = %item_label, error = %msg, "job item failed");
                        }
                    }
                }
            }

            let mut slots = slots.write().await;
            if let Some(p) = slots.get_mut(&kind) {
                p.state = JobState::Completed;
                p.current_item = None;
                p.finished_at = Some(Utc::now());
            }
            info!(?kind, "job completed");
        });

        Ok(())
    }

    /// Force a slot into `Error` with a message, for a caller that wants to
    /// record a fatal failure that happened outside the per-item loop (e.g.
    /// the embedder being unconfigured at job start).
    pub async fn mark_fatal(&self, kind: JobKind, message: impl Into<String>) {
        let mut slots = self.slots.write().await;
        let p = slots.entry(kind).or_default();
        p.state = JobState::Error;
        p.error_message = Some(message.into());
        p.finished_at = Some(Utc::now());
    }
}
