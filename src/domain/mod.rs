pub mod task;
pub mod task_collection;
pub mod task_filter;
pub mod throughput;
