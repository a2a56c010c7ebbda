//! Background tasks.

pub mod sync_task;
