mod db;
mod export;
mod input;
mod parser;
mod settings;
mod summary;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser as ClapParser, Subcommand};
use tracing::{info, warn};

use parser::aggregate::PropertyRecord;
use parser::lots::PlanStrategy;
use parser::normalize::normalize_section;
use parser::{Document, DocumentResult, Parser};
use settings::Settings;

#[derive(ClapParser)]
#[command(
    name = "releve_parser",
    about = "Extract owners and lots from French cadastral property statements"
)]
struct Cli {
    /// Configuration file (default: ./releve.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse statements (PDF or text) and list the lots of one section
    Parse {
        /// Statement files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Cadastral section code (e.g. AS)
        #[arg(short, long)]
        section: String,
        /// Lines scanned after each section occurrence
        #[arg(short, long)]
        window: Option<usize>,
        /// Where the plan number comes from
        #[arg(long, value_enum)]
        plan_strategy: Option<PlanStrategy>,
        /// Write a `;`-separated export to this file (`-` for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the export to a generated file name in the current directory
        #[arg(long, conflicts_with = "output")]
        export: bool,
        /// Print records as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Ask the summary endpoint for a French summary
        #[arg(long)]
        summary: bool,
        /// Persist results to the SQLite database
        #[arg(long)]
        save: bool,
    },
    /// List saved records
    History {
        /// Only this section
        #[arg(short, long)]
        section: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Show database statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Parse {
            files,
            section,
            window,
            plan_strategy,
            output,
            export: auto_export,
            json,
            summary: want_summary,
            save,
        } => {
            if let Some(w) = window {
                settings.window_lines = w;
            }
            if let Some(p) = plan_strategy {
                settings.plan_strategy = p;
            }
            let section = normalize_section(&section);
            let engine = Parser::new(&settings.labels, settings.parser_options())?;
            info!(
                section = %section,
                window = engine.options().window_lines,
                plan = ?engine.options().plan_strategy,
                "Parsing {} file(s)",
                files.len()
            );

            let docs = load_documents(&files);
            if docs.is_empty() {
                println!("No readable document.");
                return Ok(());
            }

            let results = process_documents(&engine, &docs, &section);
            let records = parser::flatten(&results);

            if records.is_empty() {
                println!("No data found for section {}. Check the section code.", section);
            } else if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_records(&records);
                println!(
                    "\n{} lots | {} document(s) | section {}",
                    records.len(),
                    docs.len(),
                    section
                );
            }

            let export_path = output.or_else(|| auto_export.then(|| export::default_path(&section)));
            match export_path {
                Some(path) if path.as_os_str() == "-" => print!("{}", export::to_delimited(&records)?),
                Some(path) => {
                    export::write_file(&path, &records)?;
                    println!("Exported {} rows to {}", records.len(), path.display());
                }
                None => {}
            }

            if save {
                let conn = db::connect(&settings.db_path)?;
                db::init_schema(&conn)?;
                let n = db::save_results(&conn, &section, &results)?;
                println!("Saved {} records to {}", n, settings.db_path);
            }

            if want_summary && !records.is_empty() {
                let text = summary::Summarizer::from_settings(&settings)
                    .summarize(&records)
                    .await;
                println!("\n--- Summary ---\n{}", text);
            }
            Ok(())
        }
        Commands::History { section, limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let section = section.map(|s| normalize_section(&s));
            let rows = db::fetch_history(&conn, section.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No saved records.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<20} | {:<19} | {:<28} | {:<8} | {:<4} | {:>10}",
                "#", "Document", "Processed", "Owner", "Lot", "Sect", "Quote-part"
            );
            println!("{}", "-".repeat(110));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<20} | {:<19} | {:<28} | {:<8} | {:<4} | {:>10}",
                    i + 1,
                    truncate(&r.document, 20),
                    r.processed_at,
                    truncate(&r.record.proprietaire, 28),
                    r.record.lot,
                    r.record.section,
                    r.record.quote_part
                );
            }
            println!("\n{} records", rows.len());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Documents: {}", s.documents);
            println!("No data:   {}", s.empty_documents);
            println!("Records:   {}", s.records);
            println!("Sections:  {}", s.sections);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Unreadable files are reported and skipped; the rest of the batch goes on.
fn load_documents(files: &[PathBuf]) -> Vec<Document> {
    let mut docs = Vec::with_capacity(files.len());
    for path in files {
        match input::load_document(path) {
            Ok(doc) => docs.push(doc),
            Err(e) => warn!("Skipping {}: {:#}", path.display(), e),
        }
    }
    docs
}

fn process_documents(engine: &Parser, docs: &[Document], section: &str) -> Vec<DocumentResult> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(docs.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut results = Vec::with_capacity(docs.len());
    for chunk in docs.chunks(64) {
        results.extend(engine.process_batch(chunk, section));
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    for r in results.iter().filter(|r| r.records.is_empty()) {
        info!(document = %r.document, owners = r.owners, "No lot for section {}", section);
    }
    results
}

fn print_records(records: &[PropertyRecord]) {
    println!(
        "{:>3} | {:<32} | {:<36} | {:<8} | {:<4} | {:>10}",
        "#", "Propriétaire", "Adresse", "Lot", "Sect", "Quote-part"
    );
    println!("{}", "-".repeat(110));
    for (i, r) in records.iter().enumerate() {
        println!(
            "{:>3} | {:<32} | {:<36} | {:<8} | {:<4} | {:>10}",
            i + 1,
            truncate(&r.proprietaire, 32),
            truncate(&r.adresse, 36),
            r.lot,
            r.section,
            r.quote_part
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
