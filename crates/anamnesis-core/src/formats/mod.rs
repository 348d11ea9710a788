//! # Persistence Formats
//!
//! Pure byte-level formats, no file I/O — reading and writing files is the
//! app layer's job.

pub mod backup;

pub use backup::{BackupData, export_backup, import_backup};
