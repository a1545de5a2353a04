pub mod fetch_unit;
pub mod worker_pool;

pub use fetch_unit::{FetchUnit, HttpFetchUnit};
pub use worker_pool::WorkerPool;
