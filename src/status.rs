use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state shared by users, roles, and permissions.
///
/// Every entity starts in [`Status::Pending`] and moves through the directed
/// transition graph below. [`Status::Archived`] is terminal; there is no way
/// back to [`Status::Pending`]. Only [`Status::Active`] entities contribute
/// authority at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Status {
    /// Initial state, awaiting activation.
    Pending,
    /// Currently enabled and in use.
    Active,
    /// Disabled but may be reactivated.
    Inactive,
    /// Temporarily disabled, can be reactivated or archived.
    Suspended,
    /// Permanently retired, no further transitions allowed.
    Archived,
}

impl Status {
    /// All states, in declaration order.
    pub const ALL: [Status; 5] = [
        Status::Pending,
        Status::Active,
        Status::Inactive,
        Status::Suspended,
        Status::Archived,
    ];

    /// Returns the uppercase label of this state.
    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Active => "ACTIVE",
            Status::Inactive => "INACTIVE",
            Status::Suspended => "SUSPENDED",
            Status::Archived => "ARCHIVED",
        }
    }

    /// Returns the states this state may transition to.
    pub fn allowed_transitions(self) -> &'static [Status] {
        match self {
            Status::Pending => &[Status::Active, Status::Archived],
            Status::Active => &[Status::Inactive, Status::Suspended],
            Status::Inactive => &[Status::Active, Status::Archived],
            Status::Suspended => &[Status::Active, Status::Archived],
            Status::Archived => &[],
        }
    }

    /// Returns whether a transition to `target` is allowed.
    pub fn can_transition_to(self, target: Status) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Validates a transition to `target` and returns the new state.
    ///
    /// Pure and side-effect free; the caller persists the result.
    pub fn transition(self, target: Status) -> Result<Status> {
        if !self.can_transition_to(target) {
            return Err(Error::InvalidTransition {
                from: self,
                to: target,
            });
        }
        Ok(target)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = Error;

    /// Parses a status label, case-insensitively.
    fn from_str(value: &str) -> Result<Self> {
        Status::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| Error::InvalidStatus(value.to_string()))
    }
}
