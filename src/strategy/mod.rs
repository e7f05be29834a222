//! Bounded fan-out of records to the fetch-and-store worker.
//!
//! Three interchangeable executors share one contract: run every record through
//! [`Worker::ensure`] with at most `jobs` in flight, and return only once all of
//! them have finished. Failures stay inside their record.

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::record::{read_records, Record};
use crate::utils::files::ensure_root;
use crate::utils::http::{Fetcher, HttpFetcher};
use crate::worker::{Outcome, Worker};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

mod pool;
mod tasks;
mod threads;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Dedicated OS worker threads pulling from a shared queue
    Threads,
    /// Rayon thread pool
    Pool,
    /// Cooperative tokio tasks
    Tasks,
}

/// Counts of outcomes over one or more runs
#[derive(Debug, Default)]
pub struct Tally {
    stored: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    bytes: AtomicU64,
}

/// Point-in-time copy of a [`Tally`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes: u64,
}

impl Tally {
    fn record(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Stored(bytes) => {
                self.stored.fetch_add(1, Ordering::Relaxed);
                self.bytes.fetch_add(*bytes, Ordering::Relaxed);
            }
            Outcome::Skipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Failed(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> Summary {
        Summary {
            stored: self.stored.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

// Everything a single unit of work needs, shared by all executors
struct Job {
    root: PathBuf,
    worker: Worker,
    tally: Arc<Tally>,
    progress: ProgressBar,
}

impl Job {
    async fn process(&self, record: Record) {
        let outcome = self.worker.ensure(&self.root, &record).await;
        self.tally.record(&outcome);
        self.progress.inc(1);
    }
}

/// Runs the read -> fetch -> write pipeline with one of the [`Strategy`] executors.
pub struct Dispatcher {
    strategy: Strategy,
    jobs: usize,
    fetcher: Arc<dyn Fetcher>,
    tally: Arc<Tally>,
    show_progress: bool,
}

impl Dispatcher {
    /// Dispatcher that downloads over HTTP with the configured timeout and user agent
    pub fn new(strategy: Strategy, config: &FetchConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(config)?;
        Ok(Self::with_fetcher(strategy, config, Arc::new(fetcher)))
    }

    pub fn with_fetcher(
        strategy: Strategy,
        config: &FetchConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            strategy,
            jobs: config.jobs.max(1),
            fetcher,
            tally: Arc::new(Tally::default()),
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr while running
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    /// Fetch every record found in `inputs` into `root`, waiting for all of them.
    ///
    /// Per-record failures are logged and counted, never returned.
    pub async fn run(&self, root: &Path, inputs: &[PathBuf]) {
        let records: Vec<Record> = read_records(inputs).collect();

        if let Err(e) = ensure_root(root) {
            tracing::warn!(
                path = %root.display(),
                error = %e,
                "Could not create output directory"
            );
        }

        tracing::info!(
            records = records.len(),
            strategy = ?self.strategy,
            jobs = self.jobs,
            "Dispatching downloads"
        );

        let progress = self.progress_bar(records.len());
        let job = Arc::new(Job {
            root: root.to_path_buf(),
            worker: Worker::new(self.fetcher.clone()),
            tally: self.tally.clone(),
            progress: progress.clone(),
        });

        let jobs = self.jobs;
        match self.strategy {
            Strategy::Tasks => tasks::dispatch(&job, records, jobs).await,
            Strategy::Threads | Strategy::Pool => {
                let handle = tokio::runtime::Handle::current();
                let strategy = self.strategy;
                let joined = tokio::task::spawn_blocking(move || match strategy {
                    Strategy::Pool => pool::dispatch(&handle, &job, records, jobs),
                    _ => threads::dispatch(&handle, &job, records, jobs),
                })
                .await;

                if let Err(e) = joined {
                    tracing::error!(error = %e, "Worker threads terminated abnormally");
                }
            }
        }

        progress.finish_with_message("Download complete!");
    }
}

/// Run one pass with default settings: fetch every record in `inputs` into `output_dir`.
pub async fn run(strategy: Strategy, output_dir: impl AsRef<Path>, inputs: &[PathBuf]) {
    match Dispatcher::new(strategy, &FetchConfig::default()) {
        Ok(dispatcher) => dispatcher.run(output_dir.as_ref(), inputs).await,
        Err(e) => tracing::error!(error = %e, "Could not build HTTP client"),
    }
}
