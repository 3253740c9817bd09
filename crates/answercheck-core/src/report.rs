//! Recheck report types with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Subject;
use crate::statistics::ScoreDistribution;

/// A complete recheck run across one or more subjects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecheckReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the run started.
    pub created_at: DateTime<Utc>,
    /// Whether updates were computed without being written.
    pub dry_run: bool,
    /// Per-subject outcomes, in the order they ran.
    pub subjects: Vec<SubjectReport>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Outcome of rechecking one subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectReport {
    pub subject: Option<Subject>,
    /// Rows read from the submission store.
    pub rows_scanned: u64,
    /// Rows whose score changed and were written back.
    pub updated: u64,
    /// Rows whose recomputed score matched the stored one.
    pub unchanged: u64,
    /// Rows whose update was rejected by the store.
    pub update_failures: u64,
    /// Rows with an unusable task id.
    pub skipped_invalid_task_id: u64,
    /// Rows whose task could not be found.
    pub missing_task: u64,
    /// Set when the subject was aborted early.
    #[serde(default)]
    pub failed: Option<String>,
    /// Every score change that was detected.
    #[serde(default)]
    pub changes: Vec<ScoreChange>,
    /// Distribution of recomputed results.
    #[serde(default)]
    pub distribution: ScoreDistribution,
}

impl SubjectReport {
    pub fn new(subject: Subject) -> Self {
        Self {
            subject: Some(subject),
            ..Default::default()
        }
    }
}

/// One submission whose score differs after regrading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreChange {
    pub user_id: String,
    pub task_id: i64,
    pub old_score: Option<i64>,
    pub new_score: u8,
}

/// Counters summed across every subject of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecheckTotals {
    pub rows_scanned: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub update_failures: u64,
    pub skipped_invalid_task_id: u64,
    pub missing_task: u64,
    pub failed_subjects: usize,
}

impl RecheckReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: RecheckReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    pub fn totals(&self) -> RecheckTotals {
        self.subjects
            .iter()
            .fold(RecheckTotals::default(), |mut acc, s| {
                acc.rows_scanned += s.rows_scanned;
                acc.updated += s.updated;
                acc.unchanged += s.unchanged;
                acc.update_failures += s.update_failures;
                acc.skipped_invalid_task_id += s.skipped_invalid_task_id;
                acc.missing_task += s.missing_task;
                acc.failed_subjects += usize::from(s.failed.is_some());
                acc
            })
    }

    /// Every detected score change, across subjects.
    pub fn changes(&self) -> impl Iterator<Item = (Option<Subject>, &ScoreChange)> + '_ {
        self.subjects
            .iter()
            .flat_map(|s| s.changes.iter().map(move |c| (s.subject, c)))
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let totals = self.totals();

        md.push_str(&format!(
            "**Recheck {}{}:** {} rows, {} changed, {} updated, {} unchanged, {} update failures\n\n",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            if self.dry_run { " (dry run)" } else { "" },
            totals.rows_scanned,
            self.changes().count(),
            totals.updated,
            totals.unchanged,
            totals.update_failures,
        ));

        md.push_str("| Subject | Rows | Changed | Invalid task id | Missing task | Accuracy | Status |\n");
        md.push_str("|---------|------|---------|-----------------|--------------|----------|--------|\n");
        for s in &self.subjects {
            let subject = s.subject.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
            let status = s.failed.as_deref().unwrap_or("ok");
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {:.1}% | {} |\n",
                subject,
                s.rows_scanned,
                s.changes.len(),
                s.skipped_invalid_task_id,
                s.missing_task,
                s.distribution.accuracy() * 100.0,
                status,
            ));
        }

        let changes: Vec<_> = self.changes().collect();
        if !changes.is_empty() {
            md.push_str("\n### Score changes\n\n");
            md.push_str("| Subject | User | Task | Old | New |\n");
            md.push_str("|---------|------|------|-----|-----|\n");
            for (subject, c) in changes {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {} |\n",
                    subject.map(|s| s.to_string()).unwrap_or_default(),
                    c.user_id,
                    c.task_id,
                    c.old_score.map(|s| s.to_string()).unwrap_or_else(|| "null".into()),
                    c.new_score,
                ));
            }
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_report() -> RecheckReport {
        let mut chemistry = SubjectReport::new(Subject::Chemistry);
        chemistry.rows_scanned = 3;
        chemistry.updated = 1;
        chemistry.unchanged = 1;
        chemistry.missing_task = 1;
        chemistry.changes.push(ScoreChange {
            user_id: "u1".into(),
            task_id: 14,
            old_score: Some(2),
            new_score: 1,
        });

        let mut biology = SubjectReport::new(Subject::Biology);
        biology.failed = Some("authentication failed".into());

        RecheckReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            dry_run: false,
            subjects: vec![chemistry, biology],
            duration_ms: 10,
        }
    }

    #[test]
    fn totals_sum_subjects() {
        let totals = make_report().totals();
        assert_eq!(totals.rows_scanned, 3);
        assert_eq!(totals.updated, 1);
        assert_eq!(totals.missing_task, 1);
        assert_eq!(totals.failed_subjects, 1);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = RecheckReport::load_json(&path).unwrap();

        assert_eq!(loaded.subjects.len(), 2);
        assert_eq!(loaded.subjects[0].changes[0].task_id, 14);
        assert_eq!(loaded.subjects[1].failed.as_deref(), Some("authentication failed"));
    }

    #[test]
    fn markdown_lists_changes_and_failures() {
        let md = make_report().to_markdown();
        assert!(md.contains("Score changes"));
        assert!(md.contains("| chemistry | u1 | 14 | 2 | 1 |"));
        assert!(md.contains("authentication failed"));
    }

    #[test]
    fn markdown_header_counts_changes_in_dry_run() {
        let mut report = make_report();
        report.dry_run = true;
        report.subjects[0].updated = 0;

        let md = report.to_markdown();
        let header = md.lines().next().unwrap();
        assert!(header.contains("(dry run)"));
        assert!(header.contains("3 rows, 1 changed, 0 updated, 1 unchanged"));
    }

    #[test]
    fn load_missing_file_fails() {
        assert!(RecheckReport::load_json(Path::new("/no/such/report.json")).is_err());
    }
}
