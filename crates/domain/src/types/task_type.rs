//! Task type catalog entries

use serde::{Deserialize, Serialize};

/// A catalog entry an actor can run a timer against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskType {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
