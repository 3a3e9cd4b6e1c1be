//! Daily work sessions

pub mod ports;
pub mod tracker;

pub use ports::WorkDayRepository;
pub use tracker::WorkSessionTracker;
