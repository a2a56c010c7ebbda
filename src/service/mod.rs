//! Orchestration of sync runs.

pub mod error;
pub mod sync_service;
