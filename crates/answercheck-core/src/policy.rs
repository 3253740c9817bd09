//! Ordering policy: which tasks grade digit order, per subject.

use std::collections::{BTreeSet, HashMap};

use crate::error::ConfigError;
use crate::model::{normalize_task_number, PointValue, Subject};

const CHEMISTRY_ORDERED: [u32; 8] = [6, 7, 8, 14, 15, 22, 23, 24];
const BIOLOGY_ORDERED: [u32; 9] = [2, 6, 8, 10, 12, 14, 16, 19, 20];

/// Maps a subject to the task numbers whose numeric answers are order-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingPolicy {
    ordered: HashMap<Subject, BTreeSet<u32>>,
}

impl Default for OrderingPolicy {
    /// The built-in exam table.
    fn default() -> Self {
        Self::empty()
            .with_tasks(Subject::Chemistry, CHEMISTRY_ORDERED)
            .with_tasks(Subject::Biology, BIOLOGY_ORDERED)
    }
}

impl OrderingPolicy {
    /// A policy under which order never matters.
    pub fn empty() -> Self {
        Self {
            ordered: HashMap::new(),
        }
    }

    /// Replace the ordered task set for `subject`.
    pub fn with_tasks(mut self, subject: Subject, tasks: impl IntoIterator<Item = u32>) -> Self {
        self.ordered.insert(subject, tasks.into_iter().collect());
        self
    }

    /// Build a policy from a table keyed by subject code, as found in config files.
    pub fn from_table<K: AsRef<str>>(
        table: impl IntoIterator<Item = (K, Vec<u32>)>,
    ) -> Result<Self, ConfigError> {
        table
            .into_iter()
            .try_fold(Self::empty(), |policy, (code, tasks)| {
                Ok(policy.with_tasks(code.as_ref().parse()?, tasks))
            })
    }

    pub fn is_ordered(&self, subject: Subject, task: u32) -> bool {
        self.ordered
            .get(&subject)
            .is_some_and(|tasks| tasks.contains(&task))
    }

    /// Ordered task numbers for a subject, ascending.
    pub fn tasks(&self, subject: Subject) -> impl Iterator<Item = u32> + '_ {
        self.ordered.get(&subject).into_iter().flatten().copied()
    }

    /// Order matters only for two-point tasks of a known subject whose task
    /// number normalizes to an entry in that subject's table.
    pub fn order_matters(
        &self,
        points: PointValue,
        subject: Option<Subject>,
        task_number: Option<&str>,
    ) -> bool {
        if points != PointValue::Two {
            return false;
        }
        match (subject, task_number.and_then(normalize_task_number)) {
            (Some(subject), Some(task)) => self.is_ordered(subject, task),
            _ => false,
        }
    }
}
