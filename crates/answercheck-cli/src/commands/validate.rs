//! The `answercheck validate` command.

use std::path::PathBuf;

use anyhow::Result;

use answercheck_core::parser::{load_sheets, validate_answer_sheet};
use answercheck_core::OrderingPolicy;

pub fn execute(sheet_path: PathBuf) -> Result<()> {
    let sheets = load_sheets(&sheet_path)?;
    let policy = OrderingPolicy::default();

    let mut total_warnings = 0;

    for sheet in &sheets {
        println!("Answer sheet: {} ({} cases)", sheet.name, sheet.cases.len());

        let warnings = validate_answer_sheet(sheet, &policy);
        for w in &warnings {
            let prefix = w
                .case_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All answer sheets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
