//! Status transition tables for workflow entities.
//!
//! Each status type lists, per state, which states it may move to. A single
//! generic [`apply_transition`] consults that table, so every lifecycle shares
//! the same rules: requesting the current state is a no-op, terminal states
//! accept nothing else, and anything not in the table is rejected.

use crate::errors::ServiceError;
use crate::models::{AppointmentStatus, PurchaseOrderStatus, WorkOrderStatus};
use std::fmt::Display;

pub trait LifecycleStatus: Copy + Eq + Display + 'static {
    /// Human-readable entity name used in error details.
    const ENTITY: &'static str;

    /// States reachable in one step from `self`.
    fn allowed_targets(self) -> &'static [Self];

    fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }

    fn can_transition_to(self, target: Self) -> bool {
        self == target || self.allowed_targets().contains(&target)
    }
}

/// Outcome of a valid status request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    Unchanged(S),
    Changed { from: S, to: S },
}

impl<S: Copy> Transition<S> {
    pub fn target(&self) -> S {
        match *self {
            Transition::Unchanged(s) => s,
            Transition::Changed { to, .. } => to,
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(self, Transition::Changed { .. })
    }
}

pub fn apply_transition<S: LifecycleStatus>(
    current: S,
    requested: S,
) -> Result<Transition<S>, ServiceError> {
    if current == requested {
        return Ok(Transition::Unchanged(current));
    }
    if current.allowed_targets().contains(&requested) {
        Ok(Transition::Changed {
            from: current,
            to: requested,
        })
    } else {
        Err(ServiceError::InvalidTransition {
            entity: S::ENTITY,
            from: current.to_string(),
            to: requested.to_string(),
        })
    }
}

impl LifecycleStatus for WorkOrderStatus {
    const ENTITY: &'static str = "work order";

    fn allowed_targets(self) -> &'static [Self] {
        use WorkOrderStatus::*;
        match self {
            Pending => &[InProgress, Cancelled],
            InProgress => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }
}

impl LifecycleStatus for AppointmentStatus {
    const ENTITY: &'static str = "appointment";

    fn allowed_targets(self) -> &'static [Self] {
        use AppointmentStatus::*;
        match self {
            Scheduled => &[Confirmed, Cancelled, NoShow],
            Confirmed => &[InProgress, Cancelled, NoShow],
            InProgress => &[Completed],
            Completed | Cancelled | NoShow => &[],
        }
    }
}

impl LifecycleStatus for PurchaseOrderStatus {
    const ENTITY: &'static str = "purchase order";

    fn allowed_targets(self) -> &'static [Self] {
        use PurchaseOrderStatus::*;
        match self {
            Draft => &[Ordered, Cancelled],
            Ordered => &[Received, Cancelled],
            Received | Cancelled => &[],
        }
    }
}
