/// Handle and worker loop implementation.
pub mod handle;
