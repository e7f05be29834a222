use super::Job;
use crate::record::Record;
use std::sync::Mutex;
use std::thread;
use tokio::runtime::Handle;

/// Spawn up to `jobs` OS threads that pull records off a shared queue until it is empty.
///
/// Each thread blocks on one record at a time, so the thread count is the
/// concurrency bound. Returns once every thread has drained the queue.
pub(super) fn dispatch(handle: &Handle, job: &Job, records: Vec<Record>, jobs: usize) {
    let workers = jobs.min(records.len());
    let queue = Mutex::new(records.into_iter());

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let next = queue.lock().unwrap_or_else(|e| e.into_inner()).next();
                let Some(record) = next else {
                    break;
                };
                handle.block_on(job.process(record));
            });
        }
    });
}
