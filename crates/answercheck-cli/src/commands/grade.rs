//! The `answercheck grade` command.

use std::path::PathBuf;

use anyhow::Result;

use answercheck_core::model::{GradingRequest, PointValue, Subject};
use answercheck_core::numeric::NumericMode;
use answercheck_core::text::TextNormalization;
use answercheck_core::Grader;
use answercheck_store::config::load_config_from;

pub struct GradeArgs {
    pub answer: Option<String>,
    pub key: String,
    pub points: i64,
    pub subject: Option<String>,
    pub task_number: Option<String>,
    pub strip_whitespace: bool,
    pub multi_digit: bool,
    pub format: String,
    pub config: Option<PathBuf>,
}

pub fn execute(args: GradeArgs) -> Result<()> {
    let points = PointValue::try_from(args.points)?;
    let subject = args
        .subject
        .as_deref()
        .map(str::parse::<Subject>)
        .transpose()?;

    let config = load_config_from(args.config.as_deref())?;
    let mut grader_config = config.grader_config()?;
    if args.strip_whitespace {
        grader_config.text_normalization = TextNormalization::StripWhitespace;
    }
    if args.multi_digit {
        grader_config.numeric_mode = NumericMode::MultiDigitTokens;
    }

    let request = GradingRequest {
        submitted: args.answer,
        answer_key: args.key,
        points,
        subject,
        task_number: args.task_number,
    };
    let result = Grader::new(grader_config).grade(&request);

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            let verdict = if result.is_correct {
                "correct"
            } else if result.is_partially_correct {
                "partially correct"
            } else {
                "incorrect"
            };
            println!("Score: {}/{} ({verdict})", result.score, points);
        }
    }

    Ok(())
}
