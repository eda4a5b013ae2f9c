//! Intake Storage
//!
//! Persistence for completed intakes: a SQLite repository holding the
//! `submissions` and `files` tables, and a flat directory of uploaded files.

pub mod db;
pub mod error;
pub mod file_store;

pub use db::{DbConfig, SubmissionRepository, SubmissionTx, SCHEMA};
pub use error::{Result, StorageError};
pub use file_store::FileStore;
