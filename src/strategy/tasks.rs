use super::Job;
use crate::record::Record;
use futures::stream::StreamExt;

/// Drive every record as a future on the current task, `jobs` at a time
pub(super) async fn dispatch(job: &Job, records: Vec<Record>, jobs: usize) {
    futures::stream::iter(records)
        .map(|record| job.process(record))
        .buffer_unordered(jobs)
        .for_each(|()| async {})
        .await;
}
