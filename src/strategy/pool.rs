use super::Job;
use crate::record::Record;
use rayon::prelude::*;
use tokio::runtime::Handle;

/// Run every record on a dedicated rayon pool of `jobs` threads
pub(super) fn dispatch(handle: &Handle, job: &Job, records: Vec<Record>, jobs: usize) {
    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .thread_name(|i| format!("fetch-pool-{}", i))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Could not build thread pool, using plain threads");
            return super::threads::dispatch(handle, job, records, jobs);
        }
    };

    pool.install(|| {
        records
            .into_par_iter()
            .for_each(|record| handle.block_on(job.process(record)));
    });
}
