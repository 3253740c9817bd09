//! Core data model types for answercheck.
//!
//! These types describe a single grading call, its result, and the rows the
//! recheck driver reads from the task catalog and submission store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Exam subjects with a known ordering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Chemistry,
    Biology,
}

impl Subject {
    /// Every subject, in declaration order.
    pub const ALL: [Subject; 2] = [Subject::Chemistry, Subject::Biology];

    /// Short lowercase code used in table names and config files.
    pub fn code(&self) -> &'static str {
        match self {
            Subject::Chemistry => "chemistry",
            Subject::Biology => "biology",
        }
    }

    /// Recover the subject from a store table name such as `chemistry_ege_progress`.
    pub fn from_table_name(table: &str) -> Option<Subject> {
        let lower = table.to_lowercase();
        Subject::ALL
            .into_iter()
            .find(|subject| lower.contains(subject.code()))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Subject {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chemistry" => Ok(Subject::Chemistry),
            "biology" => Ok(Subject::Biology),
            other => Err(ConfigError::UnknownSubject(other.to_string())),
        }
    }
}

/// How many points a task is worth. Only one- and two-point tasks exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum PointValue {
    One,
    Two,
}

impl PointValue {
    /// The score awarded for a full match.
    pub fn as_score(self) -> u8 {
        match self {
            PointValue::One => 1,
            PointValue::Two => 2,
        }
    }
}

impl TryFrom<i64> for PointValue {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PointValue::One),
            2 => Ok(PointValue::Two),
            other => Err(ConfigError::InvalidPointValue(other)),
        }
    }
}

impl TryFrom<u8> for PointValue {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PointValue::try_from(i64::from(value))
    }
}

impl TryFrom<u32> for PointValue {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PointValue::try_from(i64::from(value))
    }
}

impl From<PointValue> for u8 {
    fn from(value: PointValue) -> Self {
        value.as_score()
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_score())
    }
}

impl FromStr for PointValue {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<i64>()
            .map_err(|_| ConfigError::UnknownOption {
                kind: "point value",
                value: trimmed.to_string(),
            })?;
        PointValue::try_from(value)
    }
}

/// Extract the first run of ASCII digits from a task number such as `"№14"` or `"14."`.
///
/// Returns `None` when there are no digits or the run does not fit in a `u32`.
pub fn normalize_task_number(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let start = trimmed.find(|c: char| c.is_ascii_digit())?;
    let digits: &str = trimmed[start..]
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or_default();
    digits.parse().ok()
}

/// One grading call: a submitted answer checked against an answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingRequest {
    /// The learner's raw answer. `None` is graded like an empty answer.
    #[serde(default)]
    pub submitted: Option<String>,
    /// Raw answer key, possibly holding several variants.
    pub answer_key: String,
    /// Point value of the task.
    pub points: PointValue,
    /// Subject, used to look up the ordering policy.
    #[serde(default)]
    pub subject: Option<Subject>,
    /// Raw task number as stored in the catalog.
    #[serde(default)]
    pub task_number: Option<String>,
}

impl GradingRequest {
    pub fn new(submitted: impl Into<String>, answer_key: impl Into<String>, points: PointValue) -> Self {
        Self {
            submitted: Some(submitted.into()),
            answer_key: answer_key.into(),
            points,
            subject: None,
            task_number: None,
        }
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_task_number(mut self, task_number: impl Into<String>) -> Self {
        self.task_number = Some(task_number.into());
        self
    }
}

/// Outcome of grading one answer.
///
/// `is_correct` and `is_partially_correct` are never both set; build values
/// through the constructors to keep `score` consistent with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    pub score: u8,
    pub is_correct: bool,
    pub is_partially_correct: bool,
}

impl GradingResult {
    pub fn correct(points: PointValue) -> Self {
        Self {
            score: points.as_score(),
            is_correct: true,
            is_partially_correct: false,
        }
    }

    pub fn partial() -> Self {
        Self {
            score: 1,
            is_correct: false,
            is_partially_correct: true,
        }
    }

    pub fn incorrect() -> Self {
        Self {
            score: 0,
            is_correct: false,
            is_partially_correct: false,
        }
    }

    /// Whether the submission counts as completed in the store.
    pub fn is_completed(&self) -> bool {
        self.is_correct || self.is_partially_correct
    }
}

/// One row of the task catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub answer: String,
    pub points: PointValue,
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub task_number: Option<String>,
}

/// A task id exactly as the store returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTaskId {
    Number(i64),
    Text(String),
}

impl RawTaskId {
    /// Integers are accepted as-is; strings only when they are all digits after trimming.
    pub fn parse(&self) -> Option<i64> {
        match self {
            RawTaskId::Number(n) => Some(*n),
            RawTaskId::Text(s) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
                    trimmed.parse().ok()
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for RawTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTaskId::Number(n) => write!(f, "{n}"),
            RawTaskId::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One row of the submission store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub user_id: String,
    #[serde(default)]
    pub task_id: Option<RawTaskId>,
    #[serde(default)]
    pub user_answer: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl SubmissionRecord {
    pub fn parsed_task_id(&self) -> Option<i64> {
        self.task_id.as_ref().and_then(RawTaskId::parse)
    }

    /// Apply an update in place, as the store would.
    pub fn apply(&mut self, update: &SubmissionUpdate) {
        self.score = Some(i64::from(update.score));
        self.is_completed = Some(update.is_completed);
        self.last_updated = Some(update.last_updated);
    }
}

/// Point update written back to the submission store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionUpdate {
    pub score: u8,
    pub is_completed: bool,
    pub last_updated: DateTime<Utc>,
}

impl SubmissionUpdate {
    pub fn from_result(result: &GradingResult, now: DateTime<Utc>) -> Self {
        Self {
            score: result.score,
            is_completed: result.is_completed(),
            last_updated: now,
        }
    }
}

/// Accept either a JSON string or number and keep it as a string.
fn deserialize_loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Loose>::deserialize(deserializer)?.map(|v| match v {
        Loose::Text(s) => s,
        Loose::Int(n) => n.to_string(),
        Loose::Float(f) => f.to_string(),
    }))
}
