mod pool;

pub use pool::{create_pool, create_pool_in_memory, run_migrations};
