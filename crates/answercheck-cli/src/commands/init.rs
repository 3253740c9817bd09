//! The `answercheck init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("answercheck.toml").exists() {
        println!("answercheck.toml already exists, skipping.");
    } else {
        std::fs::write("answercheck.toml", SAMPLE_CONFIG)?;
        println!("Created answercheck.toml");
    }

    std::fs::create_dir_all("answer-sheets")?;
    let example_path = std::path::Path::new("answer-sheets/example.toml");
    if example_path.exists() {
        println!("answer-sheets/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_SHEET)?;
        println!("Created answer-sheets/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit answercheck.toml with your store URL and key");
    println!("  2. Run: answercheck check --sheet answer-sheets/example.toml");
    println!("  3. Run: answercheck recheck --dry-run");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# answercheck configuration

subjects = ["chemistry", "biology"]
page_size = 1000
max_rows = 20000
update_delay_ms = 0
max_retries = 3
retry_delay_ms = 1000

# "collapse" (default) or "strip"
text_normalization = "collapse"
# "single-digit" (default) or "multi-digit"
numeric_mode = "single-digit"

[store]
type = "postgrest"
url = "${ANSWERCHECK_STORE_URL}"
api_key = "${ANSWERCHECK_STORE_KEY}"

# Uncomment to replace the built-in ordered-task table.
# [ordered_tasks]
# chemistry = [6, 7, 8, 14, 15, 22, 23, 24]
# biology = [2, 6, 8, 10, 12, 14, 16, 19, 20]
"#;

const EXAMPLE_SHEET: &str = r#"[sheet]
id = "example"
name = "Example Answer Sheet"
description = "A few graded answers to get started"
subject = "chemistry"

[[cases]]
id = "unordered_full"
description = "Digit order is ignored on unordered two-point tasks"
submitted = "321"
answer_key = "123"
points = 2
task_number = 1
expect_score = 2

[[cases]]
id = "ordered_partial"
description = "Task 14 is ordered: one wrong position earns one point"
submitted = "124"
answer_key = "123"
points = 2
task_number = "№14"
expect_score = 1

[[cases]]
id = "text_variant"
submitted = "  Серная   кислота "
answer_key = "азотная кислота / серная кислота"
points = 1
expect_score = 1
"#;
