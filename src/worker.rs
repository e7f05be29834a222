//! Fetch-and-store step: make sure one record's image exists on disk.

use crate::error::WorkerError;
use crate::record::Record;
use crate::utils::files::{write_new_file, Persisted};
use crate::utils::http::Fetcher;
use std::path::Path;
use std::sync::Arc;

/// What happened to one record
#[derive(Debug)]
pub enum Outcome {
    /// The image was already on disk; nothing was fetched or written
    Skipped,
    /// Freshly downloaded, with the number of bytes written
    Stored(u64),
    Failed(WorkerError),
}

/// Fetch-and-store step for a single record.
///
/// Safe to share between any number of concurrent callers. The only shared
/// state it touches is the output tree.
pub struct Worker {
    fetcher: Arc<dyn Fetcher>,
}

impl Worker {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Ensure `root/<category>/<name>.png` exists, downloading it if absent.
    ///
    /// Never fails: every error is turned into [`Outcome::Failed`] and logged here.
    pub async fn ensure(&self, root: &Path, record: &Record) -> Outcome {
        let outcome = self
            .try_ensure(root, record)
            .await
            .unwrap_or_else(Outcome::Failed);

        match &outcome {
            Outcome::Stored(bytes) => tracing::info!(
                name = %record.name,
                category = %record.category,
                bytes,
                "Downloaded {}.png into '{}'",
                record.name,
                record.category
            ),
            Outcome::Skipped => tracing::info!(
                name = %record.name,
                category = %record.category,
                "Skipped {}.png, already exists",
                record.name
            ),
            Outcome::Failed(e) => tracing::warn!(
                name = %record.name,
                url = %record.source_url,
                error = %e,
                "Failed to download {}",
                record.name
            ),
        }

        outcome
    }

    async fn try_ensure(&self, root: &Path, record: &Record) -> Result<Outcome, WorkerError> {
        let dir = root.join(&record.category);
        let file = record.destination(root);

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| WorkerError::io(&dir, e))?;

        // Unlocked check: two records with the same destination may both fetch,
        // but only the first write lands
        if tokio::fs::try_exists(&file)
            .await
            .map_err(|e| WorkerError::io(&file, e))?
        {
            return Ok(Outcome::Skipped);
        }

        let bytes = self.fetcher.fetch(&record.source_url).await?;

        let target = file.clone();
        let persisted = tokio::task::spawn_blocking(move || write_new_file(&target, &bytes))
            .await?
            .map_err(|e| WorkerError::io(&file, e))?;

        Ok(match persisted {
            Persisted::Written(bytes) => Outcome::Stored(bytes),
            Persisted::AlreadyExists => Outcome::Skipped,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory [`Fetcher`] that records calls and peak concurrency.
    ///
    /// URLs missing from the table answer with HTTP 404.
    #[derive(Default)]
    pub(crate) struct MockFetcher {
        bodies: HashMap<String, Vec<u8>>,
        delay: Duration,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MockFetcher {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_body(mut self, url: &str, body: &[u8]) -> Self {
            self.bodies.insert(url.to_string(), body.to_vec());
            self
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub(crate) fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    fn bulbasaur() -> Record {
        Record::new("Bulbasaur", "Grass", "http://x/b.png").unwrap()
    }

    #[tokio::test]
    async fn stores_fetched_bytes_at_destination() {
        let temp = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new().with_body("http://x/b.png", b"sprite"));
        let worker = Worker::new(fetcher.clone());

        let outcome = worker.ensure(temp.path(), &bulbasaur()).await;
        assert!(matches!(outcome, Outcome::Stored(6)));
        assert_eq!(
            std::fs::read(temp.path().join("grass").join("bulbasaur.png")).unwrap(),
            b"sprite"
        );
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn skips_existing_file_without_fetching() {
        let temp = tempfile::tempdir().unwrap();
        let grass = temp.path().join("grass");
        std::fs::create_dir_all(&grass).unwrap();
        // Any size counts, even empty
        std::fs::write(grass.join("bulbasaur.png"), b"").unwrap();

        let fetcher = Arc::new(MockFetcher::new().with_body("http://x/b.png", b"sprite"));
        let worker = Worker::new(fetcher.clone());

        let outcome = worker.ensure(temp.path(), &bulbasaur()).await;
        assert!(matches!(outcome, Outcome::Skipped));
        assert_eq!(fetcher.calls(), 0);
        assert!(std::fs::read(grass.join("bulbasaur.png")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_failed_and_writes_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let worker = Worker::new(Arc::new(MockFetcher::new()));

        let outcome = worker.ensure(temp.path(), &bulbasaur()).await;
        match outcome {
            Outcome::Failed(WorkerError::Fetch(FetchError::Status { status, .. })) => {
                assert_eq!(status, 404)
            }
            other => panic!("expected HTTP failure, got {:?}", other),
        }
        assert!(!temp.path().join("grass").join("bulbasaur.png").exists());
        // The category folder is created before the fetch
        assert!(temp.path().join("grass").is_dir());
    }

    #[tokio::test]
    async fn filesystem_error_is_failed() {
        let temp = tempfile::tempdir().unwrap();
        // A regular file where the root directory should be
        let root = temp.path().join("blocked");
        std::fs::write(&root, b"").unwrap();

        let fetcher = Arc::new(MockFetcher::new().with_body("http://x/b.png", b"sprite"));
        let worker = Worker::new(fetcher.clone());

        let outcome = worker.ensure(&root, &bulbasaur()).await;
        assert!(matches!(outcome, Outcome::Failed(WorkerError::Io { .. })));
        assert_eq!(fetcher.calls(), 0);
    }
}
