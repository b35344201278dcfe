//! Concurrent fan-out coordination for data-fetch tasks.

pub mod fanout;
pub mod retry;
