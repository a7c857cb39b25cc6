mod classifier;
mod crawler;
mod download;
mod parser;
mod pdf;
mod report;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use classifier::DeviceClassifier;

#[derive(Parser)]
#[command(
    name = "invima_alerts",
    about = "INVIMA medical-device alert scraper and report builder"
)]
struct Cli {
    /// Listing page to crawl
    #[arg(long, default_value = crawler::BASE_URL)]
    base_url: String,
    /// Folder for downloaded PDFs
    #[arg(long, default_value = "pdfs_invima")]
    dest: PathBuf,
    /// Excel report to create or update
    #[arg(long, default_value = "alertas_invima.xlsx")]
    report: PathBuf,
    /// Device-type classifier artifact (JSON)
    #[arg(long, default_value = "modelo_dispositivos.json")]
    model: PathBuf,
    /// Only keep PDF links mentioning this year
    #[arg(long, default_value = "2025")]
    year: String,
    /// Max listing pages to crawl
    #[arg(long, default_value_t = 2)]
    pages: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover and print candidate PDF URLs
    Crawl,
    /// Crawl the listing and download the PDFs
    Download,
    /// Extract already-downloaded PDFs and merge them into the report
    Process {
        /// Folder of PDFs to process (default: the download destination)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Full pipeline: crawl, download, extract, merge, save
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Crawl => {
            let client = crawler::build_client()?;
            let urls =
                crawler::discover_pdf_urls(&client, &cli.base_url, &cli.year, cli.pages).await?;
            for url in &urls {
                println!("{}", url);
            }
            println!("{} PDF links found", urls.len());
            Ok(())
        }
        Commands::Download => {
            let client = crawler::build_client()?;
            let urls =
                crawler::discover_pdf_urls(&client, &cli.base_url, &cli.year, cli.pages).await?;
            if urls.is_empty() {
                println!("No PDF links found.");
                return Ok(());
            }
            let files = download::download_all(&client, &urls, &cli.dest).await?;
            println!(
                "Downloaded {} of {} PDFs to {}",
                files.len(),
                urls.len(),
                cli.dest.display()
            );
            Ok(())
        }
        Commands::Process { dir } => {
            let dir = dir.unwrap_or_else(|| cli.dest.clone());
            let files = pdf_files_in(&dir)?;
            if files.is_empty() {
                println!("No PDFs found in {}. Run 'download' first.", dir.display());
                return Ok(());
            }
            println!("Processing {} PDFs...", files.len());
            let stats = process_and_update(&files, &cli.model, &cli.report)?;
            print_stats(&stats, &cli.report);
            Ok(())
        }
        Commands::Run => {
            let client = crawler::build_client()?;
            let urls =
                crawler::discover_pdf_urls(&client, &cli.base_url, &cli.year, cli.pages).await?;
            if urls.is_empty() {
                println!("No PDF links found.");
                return Ok(());
            }
            println!("Found {} PDF links, downloading...", urls.len());

            let files = download::download_all(&client, &urls, &cli.dest).await?;
            if files.is_empty() {
                println!("Nothing downloaded.");
                return Ok(());
            }
            println!("Processing {} PDFs...", files.len());

            let stats = process_and_update(&files, &cli.model, &cli.report)?;
            print_stats(&stats, &cli.report);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Extract every document sequentially and merge the records into the
/// report. A missing classifier degrades predictions to the failure
/// sentinel instead of stopping the run; a report load/save failure is
/// fatal.
fn process_and_update(
    files: &[PathBuf],
    model: &Path,
    report_path: &Path,
) -> Result<report::ReportStats> {
    let classifier = match DeviceClassifier::load(model) {
        Ok(classifier) => classifier,
        Err(e) => {
            warn!("Classifier unavailable, predictions will be marked failed: {}", e);
            DeviceClassifier::disabled()
        }
    };

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len}")?
            .progress_chars("=> "),
    );

    let mut records = Vec::with_capacity(files.len());
    for file in files {
        records.push(parser::process_document(file, &classifier));
        pb.inc(1);
    }
    pb.finish_and_clear();

    report::update(report_path, records)
}

fn print_stats(stats: &report::ReportStats, report: &Path) {
    println!(
        "Report {}: {} rows ({} existing, {} new)",
        report.display(),
        stats.total,
        stats.existing,
        stats.added
    );
}

fn pdf_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
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
