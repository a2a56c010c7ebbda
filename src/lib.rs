//! signup-sync - Syncs form signups to a mailing list and announces them in chat.
//!
//! Each run:
//! - reads the processed-row checkpoint
//! - fetches the next window of form responses from the spreadsheet
//! - subscribes every respondent on the mailing list
//! - optionally notifies the matching interest-group leads in chat
//! - advances the checkpoint by the number of rows fetched

pub mod chat;
pub mod checkpoint;
pub mod config;
pub mod credential;
pub mod error;
pub mod form;
pub mod logging;
pub mod mailing;
pub mod notify;
pub mod service;
pub mod sheets;
pub mod task;
