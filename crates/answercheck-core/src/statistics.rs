//! Score distribution statistics for recheck runs.

use serde::{Deserialize, Serialize};

use crate::model::GradingResult;

/// How a batch of graded submissions split across outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    /// Full matches.
    pub correct: u64,
    /// Partial credit.
    pub partial: u64,
    /// Non-empty answers with no credit.
    pub incorrect: u64,
    /// Missing or whitespace-only answers.
    pub empty: u64,
}

impl ScoreDistribution {
    /// Count one graded submission.
    pub fn record(&mut self, result: &GradingResult, was_empty: bool) {
        if result.is_correct {
            self.correct += 1;
        } else if result.is_partially_correct {
            self.partial += 1;
        } else if was_empty {
            self.empty += 1;
        } else {
            self.incorrect += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.correct + self.partial + self.incorrect + self.empty
    }

    /// Share of fully correct submissions, `0.0` when nothing was graded.
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct as f64 / total as f64,
        }
    }

    /// Share of submissions that earned any credit.
    pub fn credit_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.correct + self.partial) as f64 / total as f64,
        }
    }

    pub fn merge(&mut self, other: &ScoreDistribution) {
        self.correct += other.correct;
        self.partial += other.partial;
        self.incorrect += other.incorrect;
        self.empty += other.empty;
    }
}
