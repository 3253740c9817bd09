//! The `answercheck recheck` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use answercheck_core::engine::{ProgressReporter, RecheckEngine};
use answercheck_core::model::Subject;
use answercheck_core::report::{RecheckReport, ScoreChange, SubjectReport};
use answercheck_core::traits::RecheckStore;
use answercheck_core::Grader;
use answercheck_store::config::{create_store, load_config_from};
use answercheck_store::{InMemoryStore, LoggingStore};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_subject_start(&self, subject: Subject) {
        eprintln!("  Rechecking: {subject}");
    }

    fn on_change(&self, subject: Subject, change: &ScoreChange) {
        let old = change
            .old_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        eprintln!(
            "  Changed: {subject} :: user {} task {} {old} -> {}",
            change.user_id, change.task_id, change.new_score
        );
    }

    fn on_subject_complete(&self, report: &SubjectReport) {
        let name = report
            .subject
            .map(|s| s.to_string())
            .unwrap_or_else(|| "?".to_string());
        match &report.failed {
            Some(reason) => eprintln!("  FAILED: {name}: {reason}"),
            None => eprintln!(
                "  Done: {name} ({} rows, {} changed)",
                report.rows_scanned,
                report.changes.len()
            ),
        }
    }

    fn on_run_complete(&self, report: &RecheckReport) {
        let totals = report.totals();
        eprintln!(
            "\nComplete: {} rows, {} updated, {} unchanged ({:.1}s)",
            totals.rows_scanned,
            totals.updated,
            totals.unchanged,
            report.duration_ms as f64 / 1000.0
        );
    }
}

pub async fn execute(
    subjects_str: Option<String>,
    snapshot: Option<PathBuf>,
    dry_run: bool,
    output: PathBuf,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let subjects: Vec<Subject> = match &subjects_str {
        Some(s) => s
            .split(',')
            .map(|name| name.trim().parse::<Subject>())
            .collect::<Result<Vec<_>, _>>()?,
        None => config.subjects.clone(),
    };
    anyhow::ensure!(!subjects.is_empty(), "no subjects to recheck");

    // A snapshot store is kept concrete so it can be written back afterwards.
    let (store, snapshot_store): (Arc<dyn RecheckStore>, Option<Arc<InMemoryStore>>) =
        match &snapshot {
            Some(path) => {
                let memory = Arc::new(InMemoryStore::load_json(path)?);
                let store: Arc<dyn RecheckStore> = Arc::new(LoggingStore::new(memory.clone()));
                (store, Some(memory))
            }
            None => {
                let store_config = config.store.as_ref().context(
                    "no store configured; add a [store] section to answercheck.toml or pass --snapshot",
                )?;
                tracing::debug!(?store_config, "creating store");
                (create_store(store_config)?, None)
            }
        };

    let grader = Grader::new(config.grader_config()?);
    let engine = RecheckEngine::new(store.clone(), grader, config.recheck_config(dry_run));

    eprintln!(
        "answercheck v{} - Rechecking {} subject(s) via {}{}",
        env!("CARGO_PKG_VERSION"),
        subjects.len(),
        store.name(),
        if dry_run { " (dry run)" } else { "" }
    );
    eprintln!();

    let report = engine.run(&subjects, &ConsoleReporter).await;

    print_summary(&report);

    if let (Some(memory), Some(path)) = (&snapshot_store, &snapshot) {
        if !dry_run {
            memory.save_json(path)?;
            eprintln!("Snapshot updated: {}", path.display());
        }
    }

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "markdown"]
    } else {
        format.split(',').collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("recheck-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "markdown" | "md" => {
                let path = output.join(format!("recheck-{timestamp}.md"));
                std::fs::write(&path, report.to_markdown())?;
                eprintln!("Markdown report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    let failed = report.totals().failed_subjects;
    if failed > 0 {
        anyhow::bail!("{failed} subject(s) could not be rechecked");
    }
    Ok(())
}

fn print_summary(report: &RecheckReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Subject",
        "Rows",
        "Changed",
        "Updated",
        "Update failures",
        "Invalid task id",
        "Missing task",
        "Accuracy",
    ]);

    for s in &report.subjects {
        let name = s
            .subject
            .map(|s| s.to_string())
            .unwrap_or_else(|| "?".to_string());
        table.add_row(vec![
            Cell::new(name),
            Cell::new(s.rows_scanned),
            Cell::new(s.changes.len()),
            Cell::new(s.updated),
            Cell::new(s.update_failures),
            Cell::new(s.skipped_invalid_task_id),
            Cell::new(s.missing_task),
            Cell::new(format!("{:.1}%", s.distribution.accuracy() * 100.0)),
        ]);
    }

    eprintln!("\n{table}");
}
