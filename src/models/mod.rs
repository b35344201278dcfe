//! Domain model module declarations.

pub mod approval;
pub mod fetch;
pub mod session;
