//! In-memory store backed by a JSON snapshot, for offline rechecks and tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use answercheck_core::model::{Subject, SubmissionRecord, SubmissionUpdate, TaskRecord};
use answercheck_core::traits::{PageRequest, SubmissionStore, TaskCatalog};

/// Full contents of a store: task catalogs and submission tables per subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub tasks: BTreeMap<Subject, Vec<TaskRecord>>,
    #[serde(default)]
    pub submissions: BTreeMap<Subject, Vec<SubmissionRecord>>,
}

impl StoreSnapshot {
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse snapshot: {}", path.display()))
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot: {}", path.display()))?;
        Ok(())
    }
}

/// A store that keeps everything in memory.
///
/// Submissions are served in insertion order. Updates are applied to every
/// row matching `(user_id, task_id)`; an update that matches nothing is a no-op.
pub struct InMemoryStore {
    data: Mutex<StoreSnapshot>,
    fetch_count: AtomicU32,
    update_count: AtomicU32,
}

impl InMemoryStore {
    pub fn new(snapshot: StoreSnapshot) -> Self {
        Self {
            data: Mutex::new(snapshot),
            fetch_count: AtomicU32::new(0),
            update_count: AtomicU32::new(0),
        }
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        Ok(Self::new(StoreSnapshot::load_json(path)?))
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        self.snapshot().save_json(path)
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.data().clone()
    }

    /// Number of page fetches served.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    /// Number of update calls received.
    pub fn update_count(&self) -> u32 {
        self.update_count.load(Ordering::Relaxed)
    }

    fn data(&self) -> MutexGuard<'_, StoreSnapshot> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TaskCatalog for InMemoryStore {
    async fn get_task(&self, subject: Subject, task_id: i64) -> Result<Option<TaskRecord>> {
        Ok(self
            .data()
            .tasks
            .get(&subject)
            .and_then(|tasks| tasks.iter().find(|t| t.id == task_id))
            .cloned())
    }
}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_submissions(
        &self,
        subject: Subject,
        page: PageRequest,
    ) -> Result<Vec<SubmissionRecord>> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .data()
            .submissions
            .get(&subject)
            .map(|rows| {
                rows.iter()
                    .skip(page.offset)
                    .take(page.limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_submission(
        &self,
        subject: Subject,
        user_id: &str,
        task_id: i64,
        update: &SubmissionUpdate,
    ) -> Result<()> {
        self.update_count.fetch_add(1, Ordering::Relaxed);
        let mut data = self.data();
        if let Some(rows) = data.submissions.get_mut(&subject) {
            rows.iter_mut()
                .filter(|r| r.user_id == user_id && r.parsed_task_id() == Some(task_id))
                .for_each(|r| r.apply(update));
        }
        Ok(())
    }
}
