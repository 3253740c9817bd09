//! Batch recheck driver.
//!
//! Walks every stored submission of a subject page by page, regrades it
//! against the current answer key, and writes back rows whose score changed.
//! Subjects are processed sequentially and one row at a time; pacing between
//! updates is configurable so the remote store is not flooded.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::grader::Grader;
use crate::model::{GradingRequest, Subject, SubmissionRecord, SubmissionUpdate};
use crate::report::{RecheckReport, ScoreChange, SubjectReport};
use crate::traits::{PageRequest, RecheckStore, DEFAULT_PAGE_SIZE};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Configuration for the recheck driver.
#[derive(Debug, Clone)]
pub struct RecheckConfig {
    /// Rows fetched per page.
    pub page_size: usize,
    /// Upper bound on rows read per subject.
    pub max_rows: usize,
    /// Pause after each issued update.
    pub update_delay: Duration,
    /// Retries on transient store errors while fetching pages.
    pub max_retries: u32,
    /// Initial delay between retries, doubled each time.
    pub retry_delay: Duration,
    /// Compute changes without writing them.
    pub dry_run: bool,
}

impl Default for RecheckConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_rows: 20_000,
            update_delay: Duration::ZERO,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            dry_run: false,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_subject_start(&self, subject: Subject);
    fn on_change(&self, subject: Subject, change: &ScoreChange);
    fn on_subject_complete(&self, report: &SubjectReport);
    fn on_run_complete(&self, report: &RecheckReport);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_subject_start(&self, _: Subject) {}
    fn on_change(&self, _: Subject, _: &ScoreChange) {}
    fn on_subject_complete(&self, _: &SubjectReport) {}
    fn on_run_complete(&self, _: &RecheckReport) {}
}

/// Regrades stored submissions against the current task catalog.
pub struct RecheckEngine {
    store: Arc<dyn RecheckStore>,
    grader: Grader,
    config: RecheckConfig,
}

impl RecheckEngine {
    pub fn new(store: Arc<dyn RecheckStore>, grader: Grader, config: RecheckConfig) -> Self {
        Self {
            store,
            grader,
            config,
        }
    }

    /// Recheck every listed subject in order.
    ///
    /// A subject that cannot be read is recorded as failed; the remaining
    /// subjects still run.
    pub async fn run(&self, subjects: &[Subject], progress: &dyn ProgressReporter) -> RecheckReport {
        let start = Instant::now();
        let created_at = Utc::now();
        let mut reports = Vec::with_capacity(subjects.len());

        for &subject in subjects {
            progress.on_subject_start(subject);
            let report = self.recheck_subject(subject, progress).await;
            tracing::info!(
                %subject,
                rows = report.rows_scanned,
                changed = report.changes.len(),
                updated = report.updated,
                invalid_task_id = report.skipped_invalid_task_id,
                missing_task = report.missing_task,
                "subject recheck finished"
            );
            progress.on_subject_complete(&report);
            reports.push(report);
        }

        let report = RecheckReport {
            id: Uuid::new_v4(),
            created_at,
            dry_run: self.config.dry_run,
            subjects: reports,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        progress.on_run_complete(&report);
        report
    }

    async fn recheck_subject(&self, subject: Subject, progress: &dyn ProgressReporter) -> SubjectReport {
        let mut report = SubjectReport::new(subject);
        let page_size = self.config.page_size.max(1);
        let mut offset = 0usize;

        while offset < self.config.max_rows {
            let limit = page_size.min(self.config.max_rows - offset);
            let page = PageRequest { offset, limit };
            let rows = match self.fetch_page(subject, page).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::error!(%subject, offset, "failed to fetch submissions: {e:#}");
                    report.failed = Some(format!("{e:#}"));
                    break;
                }
            };

            let fetched = rows.len();
            for row in rows {
                self.recheck_row(subject, row, &mut report, progress).await;
            }

            if fetched < limit {
                break;
            }
            offset += fetched;
        }

        report
    }

    /// Fetch one page, retrying transient store errors with exponential backoff.
    async fn fetch_page(
        &self,
        subject: Subject,
        page: PageRequest,
    ) -> Result<Vec<SubmissionRecord>> {
        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;

        for retry in 0..=self.config.max_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            match self.store.fetch_submissions(subject, page).await {
                Ok(rows) => return Ok(rows),
                Err(e) => {
                    if let Some(store_err) = e.downcast_ref::<StoreError>() {
                        if store_err.is_permanent() {
                            return Err(e);
                        }
                        if let Some(ms) = store_err.retry_after_ms() {
                            retry_delay = Duration::from_millis(ms);
                        }
                    }
                    tracing::warn!(%subject, offset = page.offset, retry, "page fetch failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
    }

    async fn recheck_row(
        &self,
        subject: Subject,
        row: SubmissionRecord,
        report: &mut SubjectReport,
        progress: &dyn ProgressReporter,
    ) {
        report.rows_scanned += 1;

        let Some(task_id) = row.parsed_task_id() else {
            tracing::warn!(
                %subject,
                user_id = %row.user_id,
                task_id = ?row.task_id,
                "skipping submission with invalid task id"
            );
            report.skipped_invalid_task_id += 1;
            return;
        };

        let task = match self.store.get_task(subject, task_id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                tracing::warn!(%subject, task_id, user_id = %row.user_id, "task not found");
                report.missing_task += 1;
                return;
            }
            Err(e) => {
                tracing::warn!(%subject, task_id, user_id = %row.user_id, "task lookup failed: {e:#}");
                report.missing_task += 1;
                return;
            }
        };

        let was_empty = row
            .user_answer
            .as_deref()
            .map_or(true, |answer| answer.trim().is_empty());
        let result = self.grader.grade(&GradingRequest {
            submitted: row.user_answer,
            answer_key: task.answer,
            points: task.points,
            subject: Some(subject),
            task_number: task.task_number,
        });
        report.distribution.record(&result, was_empty);

        if row.score == Some(i64::from(result.score)) {
            report.unchanged += 1;
            return;
        }

        let change = ScoreChange {
            user_id: row.user_id,
            task_id,
            old_score: row.score,
            new_score: result.score,
        };
        tracing::info!(
            %subject,
            user_id = %change.user_id,
            task_id,
            old = ?change.old_score,
            new = change.new_score,
            "score changed"
        );
        progress.on_change(subject, &change);

        if !self.config.dry_run {
            let update = SubmissionUpdate::from_result(&result, Utc::now());
            match self
                .store
                .update_submission(subject, &change.user_id, task_id, &update)
                .await
            {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    tracing::error!(
                        %subject,
                        user_id = %change.user_id,
                        task_id,
                        "update failed: {e:#}"
                    );
                    report.update_failures += 1;
                }
            }
            if !self.config.update_delay.is_zero() {
                tokio::time::sleep(self.config.update_delay).await;
            }
        }

        report.changes.push(change);
    }
}
