//! Download item images listed in CSV files into `<root>/<category>/<name>.png`.
//!
//! Rows come from [`record::read_records`], each one is handled by
//! [`worker::Worker::ensure`], and [`strategy::Dispatcher`] fans them out with a
//! bounded amount of concurrency using threads, a rayon pool, or tokio tasks.

pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod strategy;
pub mod utils;
pub mod worker;

pub use config::FetchConfig;
pub use record::{read_records, Record};
pub use strategy::{run, Dispatcher, Strategy, Summary};
pub use worker::Outcome;
