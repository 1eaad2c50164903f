//! Command implementations.

pub mod backlog;
pub mod ingest;
pub mod init;
pub mod list;
pub mod log;
pub mod show;
pub mod stats;
pub mod sweep;
pub mod transition;
pub mod watch;
pub mod zone;
