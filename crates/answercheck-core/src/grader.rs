//! Grading orchestrator.
//!
//! Splits the answer key into variants, routes each variant to the numeric or
//! text matcher, and folds the outcomes into a [`GradingResult`]. The first
//! full match wins; a partial match is only kept if no later variant matches
//! fully.

use std::sync::LazyLock;

use crate::model::{GradingRequest, GradingResult, PointValue, Subject};
use crate::numeric::{is_numeric_sequence, match_numeric, NumericMode};
use crate::policy::OrderingPolicy;
use crate::text::{match_text, TextNormalization};
use crate::variants::split_variants;

static DEFAULT_GRADER: LazyLock<Grader> = LazyLock::new(Grader::default);

/// Configuration for the grader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraderConfig {
    /// Which tasks grade digit order.
    pub policy: OrderingPolicy,
    /// How numeric answers are recognized and split.
    pub numeric_mode: NumericMode,
    /// How text answers are normalized.
    pub text_normalization: TextNormalization,
}

/// Stateless answer grader. Safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct Grader {
    config: GraderConfig,
}

impl Grader {
    pub fn new(config: GraderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    /// Grade one submitted answer against its answer key.
    pub fn grade(&self, request: &GradingRequest) -> GradingResult {
        let submitted = request.submitted.as_deref().unwrap_or_default().trim();
        if submitted.is_empty() {
            return GradingResult::incorrect();
        }

        let order_matters = self.config.policy.order_matters(
            request.points,
            request.subject,
            request.task_number.as_deref(),
        );
        let mode = self.config.numeric_mode;
        let submitted_is_numeric = is_numeric_sequence(submitted, mode);
        let mut any_partial = false;

        for variant in split_variants(&request.answer_key) {
            if submitted_is_numeric && is_numeric_sequence(variant, mode) {
                let outcome = match_numeric(submitted, variant, request.points, order_matters, mode);
                tracing::trace!(variant, order_matters, ?outcome, "numeric comparison");
                if outcome.full {
                    return GradingResult::correct(request.points);
                }
                any_partial |= outcome.partial;
            } else if match_text(submitted, variant, self.config.text_normalization) {
                tracing::trace!(variant, "text match");
                return GradingResult::correct(request.points);
            }
        }

        if any_partial {
            GradingResult::partial()
        } else {
            GradingResult::incorrect()
        }
    }
}

/// Grade with the built-in ordering table and canonical normalization.
pub fn grade(
    submitted: Option<&str>,
    answer_key: &str,
    points: PointValue,
    subject: Option<Subject>,
    task_number: Option<&str>,
) -> GradingResult {
    DEFAULT_GRADER.grade(&GradingRequest {
        submitted: submitted.map(str::to_string),
        answer_key: answer_key.to_string(),
        points,
        subject,
        task_number: task_number.map(str::to_string),
    })
}
