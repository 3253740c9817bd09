//! The `answercheck check` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use answercheck_core::parser::{check_sheet, load_sheets};
use answercheck_core::Grader;
use answercheck_store::config::load_config_from;

pub fn execute(sheet_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let grader = Grader::new(config.grader_config()?);
    let sheets = load_sheets(&sheet_path)?;
    anyhow::ensure!(!sheets.is_empty(), "no answer sheets found in {}", sheet_path.display());

    let mut table = Table::new();
    table.set_header(vec!["Sheet", "Cases", "Checked", "Mismatches"]);

    let mut total_mismatches = 0;
    for sheet in &sheets {
        let outcome = check_sheet(&grader, sheet);
        let checked = sheet.cases.iter().filter(|c| c.expect_score.is_some()).count();

        for m in &outcome.mismatches {
            println!(
                "  MISMATCH {} :: {}: expected {}, got {}",
                sheet.id, m.case_id, m.expected, m.actual.score
            );
        }

        table.add_row(vec![
            Cell::new(&sheet.name),
            Cell::new(sheet.cases.len()),
            Cell::new(checked),
            Cell::new(outcome.mismatches.len()),
        ]);
        total_mismatches += outcome.mismatches.len();
    }

    println!("{table}");

    if total_mismatches > 0 {
        anyhow::bail!("{total_mismatches} case(s) did not earn their expected score");
    }
    println!("All expected scores matched.");
    Ok(())
}
