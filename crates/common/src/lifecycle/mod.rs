//! Lifecycle management utilities for async components
//!
//! - **[`status`]**: lifecycle status and a shared status holder

pub mod status;

pub use status::{ManagerStatus, StatusCell};
