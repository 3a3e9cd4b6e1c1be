//! Lifecycle status shared by long-running components.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Component lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerStatus {
    /// Created but not initialized
    Created,
    /// Initializing
    Initializing,
    /// Running and operational
    Running,
    /// Shutting down
    ShuttingDown,
    /// Shut down
    Shutdown,
    /// Initialization failed
    Error,
}

impl ManagerStatus {
    /// Whether the component accepts work in this state.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether `init` may be attempted from this state.
    pub fn can_initialize(self) -> bool {
        matches!(self, Self::Created | Self::Error)
    }
}

impl fmt::Display for ManagerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Running => write!(f, "Running"),
            Self::ShuttingDown => write!(f, "Shutting Down"),
            Self::Shutdown => write!(f, "Shutdown"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Shared, cloneable holder for a component's [`ManagerStatus`].
#[derive(Debug, Clone)]
pub struct StatusCell {
    inner: Arc<RwLock<ManagerStatus>>,
}

impl Default for StatusCell {
    fn default() -> Self {
        Self { inner: Arc::new(RwLock::new(ManagerStatus::Created)) }
    }
}

impl StatusCell {
    pub fn get(&self) -> ManagerStatus {
        *self.inner.read()
    }

    pub fn set(&self, status: ManagerStatus) {
        *self.inner.write() = status;
    }

    /// Move to `next` only if the current status satisfies `allowed`.
    ///
    /// Returns the status observed before the attempt.
    pub fn transition_if(
        &self,
        allowed: impl FnOnce(ManagerStatus) -> bool,
        next: ManagerStatus,
    ) -> Result<ManagerStatus, ManagerStatus> {
        let mut guard = self.inner.write();
        let current = *guard;
        if allowed(current) {
            *guard = next;
            Ok(current)
        } else {
            Err(current)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for lifecycle::status.
    use super::*;

    /// Validates `ManagerStatus` display strings.
    ///
    /// Assertions:
    /// - Confirms `ShuttingDown` renders as `"Shutting Down"`.
    #[test]
    fn test_manager_status_display() {
        assert_eq!(ManagerStatus::Created.to_string(), "Created");
        assert_eq!(ManagerStatus::ShuttingDown.to_string(), "Shutting Down");
        assert_eq!(ManagerStatus::Error.to_string(), "Error");
    }

    /// Validates `StatusCell::transition_if` for the double init scenario.
    ///
    /// Assertions:
    /// - Confirms the first transition out of `Created` succeeds.
    /// - Confirms a second attempt is rejected with the current status.
    #[test]
    fn test_transition_if_guards_state() {
        let cell = StatusCell::default();

        assert_eq!(
            cell.transition_if(ManagerStatus::can_initialize, ManagerStatus::Initializing),
            Ok(ManagerStatus::Created)
        );
        assert_eq!(
            cell.transition_if(ManagerStatus::can_initialize, ManagerStatus::Initializing),
            Err(ManagerStatus::Initializing)
        );

        cell.set(ManagerStatus::Running);
        assert!(cell.get().is_running());
    }
}
