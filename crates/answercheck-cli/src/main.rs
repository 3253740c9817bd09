//! answercheck CLI — grade answers, check answer sheets and recheck stored scores.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "answercheck", version, about = "Exam answer grading and score rechecks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a single answer
    Grade {
        /// Submitted answer (omit for an empty submission)
        #[arg(long)]
        answer: Option<String>,

        /// Answer key; variants separated by "/" or "ИЛИ"
        #[arg(long)]
        key: String,

        /// Point value of the task: 1 or 2
        #[arg(long, default_value = "1")]
        points: i64,

        /// Subject: chemistry or biology
        #[arg(long)]
        subject: Option<String>,

        /// Task number within the exam (e.g. "14" or "№14")
        #[arg(long)]
        task_number: Option<String>,

        /// Remove all whitespace from text answers before comparing
        #[arg(long)]
        strip_whitespace: bool,

        /// Treat space/comma separated multi-digit tokens as numeric elements
        #[arg(long)]
        multi_digit: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade answer sheets and compare against expected scores
    Check {
        /// Path to .toml answer sheet or directory
        #[arg(long)]
        sheet: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate answer sheet TOML files
    Validate {
        /// Path to answer sheet file or directory
        #[arg(long)]
        sheet: PathBuf,
    },

    /// Regrade stored submissions and write back changed scores
    Recheck {
        /// Subjects to recheck (comma-separated, default: from config)
        #[arg(long)]
        subjects: Option<String>,

        /// Use a JSON store snapshot instead of the configured store
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Report changes without writing them
        #[arg(long)]
        dry_run: bool,

        /// Output directory for reports
        #[arg(long, default_value = "./answercheck-results")]
        output: PathBuf,

        /// Report format: json, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example answer sheet
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("answercheck=info".parse().unwrap())
                .add_directive("answercheck_core=info".parse().unwrap())
                .add_directive("answercheck_store=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            answer,
            key,
            points,
            subject,
            task_number,
            strip_whitespace,
            multi_digit,
            format,
            config,
        } => commands::grade::execute(commands::grade::GradeArgs {
            answer,
            key,
            points,
            subject,
            task_number,
            strip_whitespace,
            multi_digit,
            format,
            config,
        }),
        Commands::Check { sheet, config } => commands::check::execute(sheet, config),
        Commands::Validate { sheet } => commands::validate::execute(sheet),
        Commands::Recheck {
            subjects,
            snapshot,
            dry_run,
            output,
            format,
            config,
        } => commands::recheck::execute(subjects, snapshot, dry_run, output, format, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
