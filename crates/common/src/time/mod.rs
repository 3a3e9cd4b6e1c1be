//! Time utilities and abstractions
//!
//! - **[`clock`]**: real and mock clocks
//! - **[`format`]**: stopwatch and compact duration formatting
//! - **[`ticker`]**: the shared tick source that drives running timers

pub mod clock;
pub mod format;
pub mod ticker;

pub use clock::{Clock, MockClock, SystemClock};
pub use format::{ceil_minutes, format_clock, format_duration};
pub use ticker::{TickCallback, TickReport, TickSource};
