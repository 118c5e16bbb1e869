pub mod job;
pub mod pool;
