//! Store wrapper that logs every failed call before passing the error on.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use answercheck_core::model::{Subject, SubmissionRecord, SubmissionUpdate, TaskRecord};
use answercheck_core::traits::{PageRequest, RecheckStore, SubmissionStore, TaskCatalog};

/// Wraps any store and emits an `error!` event for each failure, carrying the
/// method name, its arguments as debug fields, an RFC 3339 timestamp and the
/// error. Errors are returned unchanged.
pub struct LoggingStore {
    inner: Arc<dyn RecheckStore>,
}

impl LoggingStore {
    pub fn new(inner: Arc<dyn RecheckStore>) -> Self {
        Self { inner }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

#[async_trait]
impl TaskCatalog for LoggingStore {
    async fn get_task(&self, subject: Subject, task_id: i64) -> anyhow::Result<Option<TaskRecord>> {
        self.inner
            .get_task(subject, task_id)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    method = "get_task",
                    ?subject,
                    task_id,
                    timestamp = %now(),
                    error = %format!("{e:#}"),
                    "store call failed"
                )
            })
    }
}

#[async_trait]
impl SubmissionStore for LoggingStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_submissions(
        &self,
        subject: Subject,
        page: PageRequest,
    ) -> anyhow::Result<Vec<SubmissionRecord>> {
        self.inner
            .fetch_submissions(subject, page)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    method = "fetch_submissions",
                    ?subject,
                    ?page,
                    timestamp = %now(),
                    error = %format!("{e:#}"),
                    "store call failed"
                )
            })
    }

    async fn update_submission(
        &self,
        subject: Subject,
        user_id: &str,
        task_id: i64,
        update: &SubmissionUpdate,
    ) -> anyhow::Result<()> {
        self.inner
            .update_submission(subject, user_id, task_id, update)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    method = "update_submission",
                    ?subject,
                    ?user_id,
                    task_id,
                    ?update,
                    timestamp = %now(),
                    error = %format!("{e:#}"),
                    "store call failed"
                )
            })
    }
}
