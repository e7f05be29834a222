use clap::{Parser, Subcommand};
use indicatif::{HumanBytes, HumanDuration};
use sprite_fetch::config::{default_jobs, FetchConfig, DEFAULT_TIMEOUT_SECS};
use sprite_fetch::logging::init_logging;
use sprite_fetch::utils::files::count_category_images;
use sprite_fetch::{Dispatcher, Strategy};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Download item sprites listed in CSV files into per-category folders
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch every image referenced by the input CSV files
    Fetch {
        /// CSV files with `Pokemon`, `Type1` and `Sprite` columns
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory; images land in <path>/<type>/<name>.png
        #[arg(short, long, default_value = "output")]
        path: PathBuf,

        /// Concurrency strategy to run the downloads with
        #[arg(short, long, value_enum, default_value_t = Strategy::Tasks)]
        strategy: Strategy,

        /// Maximum number of downloads in flight
        #[arg(short, long, default_value_t = default_jobs())]
        jobs: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// Show a progress bar instead of per-image log lines
        #[arg(long, default_value_t = false)]
        progress: bool,
    },
    /// Count the images stored in each category folder
    Stats {
        /// Output directory to inspect
        #[arg(short, long, default_value = "output")]
        path: PathBuf,

        /// Print the counts as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Fetch {
            inputs,
            path,
            strategy,
            jobs,
            timeout,
            progress,
        } => {
            init_logging(if progress { "warn" } else { "info" });

            let config = FetchConfig {
                jobs,
                timeout: Duration::from_secs(timeout),
                ..FetchConfig::default()
            };

            let dispatcher = match Dispatcher::new(strategy, &config) {
                Ok(d) => d.with_progress(progress),
                Err(e) => {
                    eprintln!("Error building HTTP client: {}", e);
                    std::process::exit(1);
                }
            };

            println!("Strategy: {:?}", strategy);
            println!("Path: {}", path.display());
            println!("Concurrent downloads: {}", config.jobs.max(1));

            let started = Instant::now();
            dispatcher.run(&path, &inputs).await;
            let summary = dispatcher.tally().snapshot();

            println!();
            println!(
                "Downloaded {} images ({})",
                summary.stored,
                HumanBytes(summary.bytes)
            );
            if summary.skipped > 0 {
                println!("Skipped {} images (already existed)", summary.skipped);
            }
            if summary.failed > 0 {
                println!("Failed to download {} images", summary.failed);
            }
            println!("Completed in {}", HumanDuration(started.elapsed()));
        }
        Commands::Stats { path, json } => {
            init_logging("warn");

            if !path.is_dir() {
                println!("Output directory {} does not exist yet.", path.display());
                return Ok(());
            }

            let counts = count_category_images(&path)?;
            if json {
                let out = serde_json::to_string_pretty(&counts)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
                println!("{}", out);
                return Ok(());
            }

            for count in &counts {
                println!("{:<12} {}", count.category, count.images);
            }
            let total: usize = counts.iter().map(|c| c.images).sum();
            println!(
                "Total images: {} in {} category folders",
                total,
                counts.len()
            );
        }
    }

    Ok(())
}
