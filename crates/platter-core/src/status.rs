//! # Order Status
//!
//! The order lifecycle as an explicit state machine.
//!
//! ## Allowed Transitions
//! ```text
//! ┌───────────┬────────────────────────────────┐
//! │ From      │ To                             │
//! ├───────────┼────────────────────────────────┤
//! │ PENDING   │ CONFIRMED, PAID, CANCELLED     │
//! │ CONFIRMED │ PAID, SHIPPING, CANCELLED      │
//! │ PAID      │ CONFIRMED, SHIPPING, CANCELLED │
//! │ SHIPPING  │ DELIVERED                      │
//! │ DELIVERED │ (terminal)                     │
//! │ CANCELLED │ (terminal)                     │
//! └───────────┴────────────────────────────────┘
//! ```
//! `DELIVERED` and `CANCELLED` are terminal. Re-applying the current status
//! is rejected so that status churn never reaches the notification path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Initial status set at checkout.
    Pending,
    /// Accepted by the restaurant.
    Confirmed,
    /// Payment received.
    Paid,
    /// Out for delivery.
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Paid,
        OrderStatus::Shipping,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipping => "SHIPPING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Statuses reachable from `self` in one step.
    pub const fn allowed_next(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Paid, Cancelled],
            Confirmed => &[Paid, Shipping, Cancelled],
            Paid => &[Confirmed, Shipping, Cancelled],
            Shipping => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Validates a transition, returning the new status.
    pub fn transition_to(&self, next: OrderStatus) -> CoreResult<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                from: *self,
                to: next,
            })
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    /// Admin input is free text; it is trimmed and uppercased first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        OrderStatus::ALL
            .iter()
            .find(|status| status.as_str() == wanted)
            .copied()
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.to_string()).collect(),
            })
    }
}
