//! Background Tasks Module
//!
//! Optional tasks that run alongside a cache.
//!
//! # Tasks
//! - Sweeper: runs the eviction sweep at a fixed interval

mod sweeper;

pub use sweeper::spawn_sweep_task;
