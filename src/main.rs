mod db;
mod export;
mod extract;
mod fetch;
mod pipeline;
mod store;
mod words;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::export::ExportFormat;
use crate::fetch::Fetcher;
use crate::pipeline::CrawlOptions;
use crate::store::AppendLog;

#[derive(Parser)]
#[command(name = "oed_scraper", about = "OED search-result scraper and converter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl search-result pages into the append log
    Scrape {
        /// Page number to start from
        #[arg(long, default_value = "1")]
        starting_page: u32,
        /// Pages to crawl, counted from the starting page (default: no limit)
        #[arg(long)]
        max_pages: Option<u32>,
        /// Seconds to wait between page requests
        #[arg(long, default_value = "1")]
        request_delay: u64,
        /// Seconds to wait before retrying a failed status
        #[arg(long, default_value = "60")]
        error_delay: u64,
        /// Retries per page after the first attempt
        #[arg(long, default_value = "1")]
        max_retries: u32,
        /// Append-log path
        #[arg(long, default_value = "output/oed-words.txt")]
        output_file: PathBuf,
        /// Append-log field delimiter ("~~" for the legacy format)
        #[arg(long, default_value = ",")]
        delimiter: String,
    },
    /// Deduplicate an append log and write it out as csv, txt, or json
    Convert {
        /// Append log to read
        #[arg(short = 'i', long)]
        input_file: PathBuf,
        /// File to write
        #[arg(short = 'o', long)]
        output_file: PathBuf,
        /// Output format
        #[arg(short = 'f', long, value_enum)]
        format: ExportFormat,
        /// Minify the JSON output
        #[arg(short = 'm', long)]
        minified: bool,
        /// Append-log field delimiter
        #[arg(long, default_value = ",")]
        delimiter: String,
    },
    /// Report word counts for an append log
    Stats {
        /// Append log to read
        #[arg(short = 'i', long)]
        input_file: PathBuf,
        /// Append-log field delimiter
        #[arg(long, default_value = ",")]
        delimiter: String,
    },
    /// Bulk-load a converted CSV into the oxford_words table
    Load {
        /// CSV file to import
        #[arg(short = 'i', long)]
        input_file: PathBuf,
    },
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
        Commands::Scrape {
            starting_page,
            max_pages,
            request_delay,
            error_delay,
            max_retries,
            output_file,
            delimiter,
        } => {
            let mut fetcher = Fetcher::new(error_delay, max_retries)?;
            let log = AppendLog::new(output_file, &delimiter);
            let opts = CrawlOptions {
                starting_page,
                max_pages,
                request_delay,
            };
            let summary = pipeline::run(&mut fetcher, &log, &opts).await?;
            summary.print();
            Ok(())
        }
        Commands::Convert {
            input_file,
            output_file,
            format,
            minified,
            delimiter,
        } => {
            let (map, report) = words::load_words(&input_file, &delimiter)?;
            report.print();
            export::write_output(&output_file, format, minified, &map)?;
            println!("Wrote {} records to {}", map.len(), output_file.display());
            Ok(())
        }
        Commands::Stats {
            input_file,
            delimiter,
        } => {
            let (_, report) = words::load_words(&input_file, &delimiter)?;
            report.print();
            Ok(())
        }
        Commands::Load { input_file } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let inserted = db::load_csv(&conn, &input_file)?;
            println!("Loaded {} rows into oxford_words", inserted);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
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
