//! # Worker Pool
//!
//! Scatter-gather over a [`JoinSet`] with settle-all semantics: every
//! submitted task is awaited, and a task that fails or panics only affects
//! its own slot. Results come back in submission order.

use std::future::Future;
use tokio::task::JoinSet;

use crate::error::{AgentError, AgentResult};

/// Outcome of one pool member
#[derive(Debug)]
pub enum Settled<T> {
    Fulfilled(T),
    Rejected(AgentError),
}

type Job<T> = (String, std::pin::Pin<Box<dyn Future<Output = AgentResult<T>> + Send>>);

/// Collects tasks, then runs them all concurrently
pub struct WorkerPool<T> {
    jobs: Vec<Job<T>>,
}

impl<T: Send + 'static> Default for WorkerPool<T> {
    fn default() -> Self {
        Self { jobs: Vec::new() }
    }
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task. `label` names the member in errors and logs.
    pub fn submit<F>(&mut self, label: impl Into<String>, task: F)
    where
        F: Future<Output = AgentResult<T>> + Send + 'static,
    {
        self.jobs.push((label.into(), Box::pin(task)));
    }

    /// Run every queued task and wait for all of them
    #[tracing::instrument(skip_all, fields(members = self.jobs.len()))]
    pub async fn settle(self) -> Vec<Settled<T>> {
        let total = self.jobs.len();
        let mut labels = Vec::with_capacity(total);
        let mut join_set = JoinSet::new();

        // SCATTER
        for (index, (label, task)) in self.jobs.into_iter().enumerate() {
            labels.push(label);
            join_set.spawn(async move {
                // The inner task absorbs panics so the slot index survives
                let outcome = tokio::spawn(task).await;
                (index, outcome)
            });
        }

        // GATHER
        let mut slots: Vec<Option<Settled<T>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            let (index, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "Pool task was cancelled");
                    continue;
                }
            };

            let label = &labels[index];
            slots[index] = Some(match outcome {
                Ok(Ok(value)) => Settled::Fulfilled(value),
                Ok(Err(err)) => {
                    tracing::warn!(member = %label, error = %err, "Pool member failed");
                    Settled::Rejected(err)
                }
                Err(join_err) => {
                    tracing::warn!(member = %label, error = %join_err, "Pool member panicked");
                    Settled::Rejected(AgentError::task(label, join_err))
                }
            });
        }

        slots
            .into_iter()
            .zip(labels)
            .map(|(slot, label)| {
                slot.unwrap_or_else(|| Settled::Rejected(AgentError::task(&label, "cancelled")))
            })
            .collect()
    }
}
