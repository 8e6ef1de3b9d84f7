//! Order status state machine.

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Created ──► Assigned ──► Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order is waiting for a courier.
    #[default]
    Created,

    /// A courier has taken the order and is on the way.
    Assigned,

    /// The order has been delivered (terminal state).
    Completed,
}

impl OrderStatus {
    /// Returns true if a courier can be assigned in this status.
    pub fn can_assign(&self) -> bool {
        matches!(self, OrderStatus::Created)
    }

    /// Returns true if the order can be completed in this status.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Assigned)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Assigned => "assigned",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(OrderStatus::Created),
            "assigned" => Ok(OrderStatus::Assigned),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}
