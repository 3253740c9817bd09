//! Store traits for the task catalog and submission store.
//!
//! These async traits are implemented by the `answercheck-store` crate and
//! consumed by the recheck driver in [`crate::engine`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Subject, SubmissionRecord, SubmissionUpdate, TaskRecord};

/// Default number of rows fetched per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

// ---------------------------------------------------------------------------
// Task catalog
// ---------------------------------------------------------------------------

/// Read access to the authoritative answer keys.
#[async_trait]
pub trait TaskCatalog: Send + Sync {
    /// Look up one task. `Ok(None)` means the task does not exist.
    async fn get_task(&self, subject: Subject, task_id: i64) -> anyhow::Result<Option<TaskRecord>>;
}

// ---------------------------------------------------------------------------
// Submission store
// ---------------------------------------------------------------------------

/// A window into the submission rows of one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    pub fn next(self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}

/// Bulk read and point update of stored submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Human-readable backend name (e.g. "postgrest").
    fn name(&self) -> &str;

    /// Fetch one page of submissions in a stable order.
    async fn fetch_submissions(
        &self,
        subject: Subject,
        page: PageRequest,
    ) -> anyhow::Result<Vec<SubmissionRecord>>;

    /// Overwrite the score of the submission keyed by `(user_id, task_id)`.
    async fn update_submission(
        &self,
        subject: Subject,
        user_id: &str,
        task_id: i64,
        update: &SubmissionUpdate,
    ) -> anyhow::Result<()>;
}

/// A backend that is both a task catalog and a submission store.
pub trait RecheckStore: TaskCatalog + SubmissionStore {}

impl<T: TaskCatalog + SubmissionStore + ?Sized> RecheckStore for T {}

/// Submission table name for a subject.
pub fn progress_table(subject: Subject) -> String {
    format!("{subject}_ege_progress")
}

/// Task catalog table name for a subject.
pub fn task_bank_table(subject: Subject) -> String {
    format!("{subject}_ege_task_bank")
}
