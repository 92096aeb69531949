use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use schema_lab_core::{Severity, ValidationFinding, build_model_lossy, render_mermaid, validate_ddl};
use schema_lab_sqlite::{QueryOutcome, TestStatus, apply_schema, run_statement, run_suite};

/// Output format for validation findings.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum FindingsFormat {
    Json,
    Table,
}

#[derive(Debug, Parser)]
#[command(name = "schema-lab")]
#[command(about = "Parse, validate, diagram, and sandbox-execute SQL schemas")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a schema file as a Mermaid ER diagram.
    Diagram(DiagramArgs),
    /// Run static validation checks over a schema file.
    Check(CheckArgs),
    /// Apply a schema file to a (new or existing) database file.
    InitDb(InitDbArgs),
    /// Execute one SQL statement against a database file.
    Query(QueryArgs),
    /// Run a JSON test suite against a database file.
    Test(TestArgs),
}

#[derive(Debug, Args)]
struct DiagramArgs {
    /// Schema SQL file.
    schema: PathBuf,
    /// Write the diagram here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Schema SQL file.
    schema: PathBuf,
    /// Output format for findings (default: table).
    #[arg(long, default_value = "table")]
    format: FindingsFormat,
}

#[derive(Debug, Args)]
struct InitDbArgs {
    /// Schema SQL file.
    schema: PathBuf,
    /// Database file to create or extend.
    #[arg(long)]
    db: PathBuf,
}

#[derive(Debug, Args)]
struct QueryArgs {
    /// Database file.
    #[arg(long)]
    db: PathBuf,
    /// SQL statement text.
    #[arg(long, conflicts_with = "file")]
    sql: Option<String>,
    /// Read the statement from a file instead.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Persist write effects instead of previewing and rolling back.
    #[arg(long)]
    commit: bool,
}

#[derive(Debug, Args)]
struct TestArgs {
    /// Test suite JSON file.
    suite: PathBuf,
    /// Database file.
    #[arg(long)]
    db: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command {
        Command::Diagram(args) => cmd_diagram(args),
        Command::Check(args) => cmd_check(args),
        Command::InitDb(args) => cmd_init_db(args),
        Command::Query(args) => cmd_query(args),
        Command::Test(args) => cmd_test(args),
    }
}

fn cmd_diagram(args: DiagramArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let sql = fs::read_to_string(&args.schema)?;
    // Render whatever was parseable; parse failures still yield a
    // diagram from the partial model.
    let (model, error) = build_model_lossy(&sql);
    if let Some(e) = error {
        eprintln!("warning: {e}");
    }
    let diagram = render_mermaid(&model);

    match args.output {
        Some(path) => fs::write(path, diagram)?,
        None => println!("{diagram}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_check(args: CheckArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let sql = fs::read_to_string(&args.schema)?;
    let findings = validate_ddl(&sql);

    match args.format {
        FindingsFormat::Json => println!("{}", serde_json::to_string_pretty(&findings)?),
        FindingsFormat::Table => print_findings_table(&findings),
    }

    let has_errors = findings.iter().any(|f| f.severity == Severity::Error);
    Ok(if has_errors {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_findings_table(findings: &[ValidationFinding]) {
    for finding in findings {
        let severity = match finding.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
            Severity::Success => "OK   ",
        };
        match &finding.table {
            Some(table) => println!("{severity}  [{table}] {}", finding.message),
            None => println!("{severity}  {}", finding.message),
        }
    }
}

fn cmd_init_db(args: InitDbArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let sql = fs::read_to_string(&args.schema)?;
    apply_schema(&args.db, &sql)?;
    println!("applied schema to {}", args.db.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_query(args: QueryArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let sql = match (args.sql, args.file) {
        (Some(sql), _) => sql,
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => return Err("provide --sql or --file".into()),
    };

    let outcome = run_statement(&args.db, &sql, args.commit);
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(match outcome {
        QueryOutcome::Error { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

fn cmd_test(args: TestArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(&args.suite)?;
    let suite = schema_lab_sqlite::load_suite(&json)?;
    let outcomes = run_suite(&args.db, &suite)?;

    let mut failed = 0usize;
    for outcome in &outcomes {
        match outcome.status {
            TestStatus::Ok => println!("ok    {}", outcome.name),
            TestStatus::Error => {
                failed += 1;
                println!(
                    "fail  {} ({})",
                    outcome.name,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    println!("{} passed, {} failed", outcomes.len() - failed, failed);

    Ok(if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
