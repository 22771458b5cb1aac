//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is open.
//!
//! # Tasks
//! - Cleanup: removes expired and corrupt entries at the configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
