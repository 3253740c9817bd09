//! TOML answer-sheet parser.
//!
//! Answer sheets are fixture files that pair submitted answers with answer
//! keys and, optionally, the score they are expected to earn. They pin the
//! grader's behaviour on real exam tasks and are loaded by the `check` and
//! `validate` commands.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::grader::Grader;
use crate::model::{GradingRequest, GradingResult, PointValue, Subject};
use crate::policy::OrderingPolicy;
use crate::variants::split_variants;

/// Intermediate TOML structure for parsing answer-sheet files.
#[derive(Debug, Deserialize)]
struct TomlSheetFile {
    sheet: TomlSheetHeader,
    #[serde(default)]
    cases: Vec<TomlCase>,
}

#[derive(Debug, Deserialize)]
struct TomlSheetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    subject: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlCase {
    id: String,
    #[serde(default)]
    submitted: Option<String>,
    answer_key: String,
    points: i64,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    task_number: Option<toml::Value>,
    #[serde(default)]
    expect_score: Option<u8>,
    #[serde(default)]
    description: String,
}

/// A collection of grading cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSheet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Subject applied to cases that don't name one.
    #[serde(default)]
    pub subject: Option<Subject>,
    #[serde(default)]
    pub cases: Vec<SheetCase>,
}

/// One submitted answer and what it should score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetCase {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub request: GradingRequest,
    #[serde(default)]
    pub expect_score: Option<u8>,
}

/// Parse a single TOML file into an `AnswerSheet`.
pub fn parse_answer_sheet(path: &Path) -> Result<AnswerSheet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer sheet: {}", path.display()))?;

    parse_answer_sheet_str(&content, path)
}

/// Parse a TOML string into an `AnswerSheet` (useful for testing).
pub fn parse_answer_sheet_str(content: &str, source_path: &Path) -> Result<AnswerSheet> {
    let parsed: TomlSheetFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let default_subject = parsed
        .sheet
        .subject
        .as_deref()
        .map(str::parse::<Subject>)
        .transpose()?;

    let cases = parsed
        .cases
        .into_iter()
        .map(|c| {
            let points = PointValue::try_from(c.points)
                .with_context(|| format!("case '{}'", c.id))?;
            let subject = c
                .subject
                .as_deref()
                .map(str::parse::<Subject>)
                .transpose()
                .with_context(|| format!("case '{}'", c.id))?
                .or(default_subject);
            let task_number = c.task_number.map(|v| match v {
                toml::Value::String(s) => s,
                other => other.to_string(),
            });

            Ok(SheetCase {
                id: c.id,
                description: c.description,
                request: GradingRequest {
                    submitted: c.submitted,
                    answer_key: c.answer_key,
                    points,
                    subject,
                    task_number,
                },
                expect_score: c.expect_score,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AnswerSheet {
        id: parsed.sheet.id,
        name: parsed.sheet.name,
        description: parsed.sheet.description,
        subject: default_subject,
        cases,
    })
}

/// Recursively load all `.toml` answer sheets from a directory.
pub fn load_sheet_directory(dir: &Path) -> Result<Vec<AnswerSheet>> {
    let mut sheets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            sheets.extend(load_sheet_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_answer_sheet(&path) {
                Ok(sheet) => sheets.push(sheet),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sheets)
}

/// Load a single sheet file, or every sheet under a directory.
pub fn load_sheets(path: &Path) -> Result<Vec<AnswerSheet>> {
    if path.is_dir() {
        load_sheet_directory(path)
    } else {
        Ok(vec![parse_answer_sheet(path)?])
    }
}

/// A warning from answer-sheet validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The case ID (if applicable).
    pub case_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate an answer sheet for common issues.
///
/// `policy` is consulted to flag ordered tasks that are declared as one-point.
pub fn validate_answer_sheet(sheet: &AnswerSheet, policy: &OrderingPolicy) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let warn = |case_id: &str, message: String| ValidationWarning {
        case_id: Some(case_id.to_string()),
        message,
    };

    if sheet.cases.is_empty() {
        warnings.push(ValidationWarning {
            case_id: None,
            message: "sheet has no cases".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for case in &sheet.cases {
        let request = &case.request;

        if !seen_ids.insert(&case.id) {
            warnings.push(warn(&case.id, format!("duplicate case ID: {}", case.id)));
        }

        if request.answer_key.trim().is_empty() {
            warnings.push(warn(&case.id, "answer key is empty".into()));
        } else if split_variants(&request.answer_key).is_empty() {
            warnings.push(warn(&case.id, "answer key contains no variants".into()));
        }

        if let Some(expected) = case.expect_score {
            if expected > request.points.as_score() {
                warnings.push(warn(
                    &case.id,
                    format!(
                        "expect_score {expected} exceeds the task's {} point(s)",
                        request.points
                    ),
                ));
            }
        }

        if request.points == PointValue::One
            && policy.order_matters(
                PointValue::Two,
                request.subject,
                request.task_number.as_deref(),
            )
        {
            warnings.push(warn(
                &case.id,
                "ordered task graded as one point; order will be ignored".into(),
            ));
        }
    }

    warnings
}

/// A case whose grade differs from its `expect_score`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetMismatch {
    pub case_id: String,
    pub expected: u8,
    pub actual: GradingResult,
}

/// Result of grading every case of a sheet.
#[derive(Debug, Clone, Default)]
pub struct SheetOutcome {
    /// Each case with its grade, in sheet order.
    pub results: Vec<(String, GradingResult)>,
    /// Cases that did not earn their expected score.
    pub mismatches: Vec<SheetMismatch>,
}

impl SheetOutcome {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Grade every case of a sheet and compare against its expectations.
pub fn check_sheet(grader: &Grader, sheet: &AnswerSheet) -> SheetOutcome {
    let mut outcome = SheetOutcome::default();
    for case in &sheet.cases {
        let result = grader.grade(&case.request);
        if let Some(expected) = case.expect_score {
            if expected != result.score {
                outcome.mismatches.push(SheetMismatch {
                    case_id: case.id.clone(),
                    expected,
                    actual: result,
                });
            }
        }
        outcome.results.push((case.id.clone(), result));
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[sheet]
id = "chemistry-ege"
name = "Chemistry EGE"
subject = "chemistry"

[[cases]]
id = "ordered-exact"
submitted = "123"
answer_key = "123"
points = 2
task_number = "№14"
expect_score = 2

[[cases]]
id = "ordered-one-mistake"
submitted = "124"
answer_key = "123"
points = 2
task_number = 14
expect_score = 1

[[cases]]
id = "text-variant"
submitted = "ACID"
answer_key = "кислота/acid"
points = 1
subject = "biology"
expect_score = 1
"#;

    #[test]
    fn parse_valid_toml() {
        let sheet = parse_answer_sheet_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(sheet.id, "chemistry-ege");
        assert_eq!(sheet.subject, Some(Subject::Chemistry));
        assert_eq!(sheet.cases.len(), 3);
        assert_eq!(sheet.cases[0].request.task_number.as_deref(), Some("№14"));
        assert_eq!(sheet.cases[1].request.task_number.as_deref(), Some("14"));
        assert_eq!(sheet.cases[1].request.subject, Some(Subject::Chemistry));
        assert_eq!(sheet.cases[2].request.subject, Some(Subject::Biology));
    }

    #[test]
    fn check_valid_sheet_passes() {
        let sheet = parse_answer_sheet_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        let outcome = check_sheet(&Grader::default(), &sheet);
        assert!(outcome.passed(), "mismatches: {:?}", outcome.mismatches);
        assert_eq!(outcome.results.len(), 3);
    }

    #[test]
    fn check_reports_mismatch() {
        let toml = r#"
[sheet]
id = "wrong"
name = "Wrong"

[[cases]]
id = "c1"
submitted = "12"
answer_key = "123"
points = 2
expect_score = 2
"#;
        let sheet = parse_answer_sheet_str(toml, &PathBuf::from("test.toml")).unwrap();
        let outcome = check_sheet(&Grader::default(), &sheet);
        assert_eq!(outcome.mismatches.len(), 1);
        assert_eq!(outcome.mismatches[0].expected, 2);
        assert_eq!(outcome.mismatches[0].actual, GradingResult::partial());
    }

    #[test]
    fn parse_rejects_bad_points_and_subjects() {
        let bad_points = r#"
[sheet]
id = "x"
name = "X"

[[cases]]
id = "c1"
answer_key = "1"
points = 3
"#;
        let err = parse_answer_sheet_str(bad_points, &PathBuf::from("x.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("invalid point value 3"));

        let bad_subject = "[sheet]\nid = \"x\"\nname = \"X\"\nsubject = \"physics\"\n";
        assert!(parse_answer_sheet_str(bad_subject, &PathBuf::from("x.toml")).is_err());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_answer_sheet_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_flags_common_issues() {
        let toml = r#"
[sheet]
id = "issues"
name = "Issues"
subject = "biology"

[[cases]]
id = "same"
submitted = "1"
answer_key = " / "
points = 1
expect_score = 2

[[cases]]
id = "same"
submitted = "1"
answer_key = ""
points = 1
task_number = "2"
"#;
        let sheet = parse_answer_sheet_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_answer_sheet(&sheet, &OrderingPolicy::default());
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("duplicate")));
        assert!(messages.iter().any(|m| m.contains("no variants")));
        assert!(messages.iter().any(|m| m.contains("is empty")));
        assert!(messages.iter().any(|m| m.contains("exceeds")));
        assert!(messages.iter().any(|m| m.contains("order will be ignored")));
    }

    #[test]
    fn validate_empty_sheet() {
        let sheet = parse_answer_sheet_str("[sheet]\nid = \"e\"\nname = \"E\"\n", &PathBuf::from("e.toml")).unwrap();
        let warnings = validate_answer_sheet(&sheet, &OrderingPolicy::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].case_id.is_none());
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("bad.toml"), "not toml [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("again.toml"), VALID_TOML).unwrap();

        let sheets = load_sheet_directory(dir.path()).unwrap();
        assert_eq!(sheets.len(), 2);
        assert!(sheets.iter().all(|s| s.id == "chemistry-ege"));
    }

    #[test]
    fn load_sheets_accepts_file_or_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sheet.toml");
        std::fs::write(&file, VALID_TOML).unwrap();
        assert_eq!(load_sheets(&file).unwrap().len(), 1);
        assert_eq!(load_sheets(dir.path()).unwrap().len(), 1);
        assert!(load_sheets(&dir.path().join("missing.toml")).is_err());
    }
}
