//! Task timers and the registry that owns them

pub mod registry;
pub mod task_timer;

pub use registry::{SharedRegistry, StartRejection, TaskRef, TimerRegistry};
pub use task_timer::TaskTimer;
