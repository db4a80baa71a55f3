//! Diff computation between desired and observed grants

use crate::entity::PermissionsEntity;
use crate::object_type::ObjectRef;
use crate::types::{AccessControlChange, AccessControlChangeList, Principal};
use std::collections::BTreeMap;

/// Difference in one principal's direct grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantDiff {
    /// Principal whose grant differs
    pub principal: Principal,
    /// Level currently held, if any
    pub current: Option<String>,
    /// Level wanted, if any
    pub desired: Option<String>,
}

impl GrantDiff {
    /// Check if this diff grants a principal that holds nothing
    pub fn is_addition(&self) -> bool {
        self.current.is_none() && self.desired.is_some()
    }

    /// Check if this diff revokes a principal's grant
    pub fn is_removal(&self) -> bool {
        self.current.is_some() && self.desired.is_none()
    }

    /// Check if this diff changes a principal's level
    pub fn is_modification(&self) -> bool {
        self.current.is_some() && self.desired.is_some()
    }
}

/// All grant differences for one object, ordered by principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclDiff {
    /// Per-principal differences
    pub grants: Vec<GrantDiff>,
}

impl AclDiff {
    /// Compare two grant lists.
    ///
    /// Order within either list does not matter. Equal lists give an empty
    /// diff, meaning no write is needed.
    pub fn compute(desired: &[AccessControlChange], observed: &[AccessControlChange]) -> Self {
        let mut levels: BTreeMap<&Principal, (Option<&str>, Option<&str>)> = BTreeMap::new();
        for change in observed {
            levels.entry(&change.principal).or_default().0 = Some(change.permission_level.as_str());
        }
        for change in desired {
            levels.entry(&change.principal).or_default().1 = Some(change.permission_level.as_str());
        }

        let grants = levels
            .into_iter()
            .filter(|(_, (current, desired))| current != desired)
            .map(|(principal, (current, desired))| GrantDiff {
                principal: principal.clone(),
                current: current.map(str::to_string),
                desired: desired.map(str::to_string),
            })
            .collect();
        Self { grants }
    }

    /// Principals gaining a grant
    pub fn added(&self) -> impl Iterator<Item = &GrantDiff> {
        self.grants.iter().filter(|g| g.is_addition())
    }

    /// Principals losing their grant
    pub fn removed(&self) -> impl Iterator<Item = &GrantDiff> {
        self.grants.iter().filter(|g| g.is_removal())
    }

    /// Principals whose level changes
    pub fn changed(&self) -> impl Iterator<Item = &GrantDiff> {
        self.grants.iter().filter(|g| g.is_modification())
    }

    /// Check if nothing differs
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Summary counts
    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_diffs(&self.grants)
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Number of grants to add
    pub additions: usize,
    /// Number of grants to remove
    pub removals: usize,
    /// Number of grants to modify
    pub modifications: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[GrantDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            if diff.is_addition() {
                summary.additions += 1;
            } else if diff.is_removal() {
                summary.removals += 1;
            } else {
                summary.modifications += 1;
            }
        }
        summary
    }

    /// Add another summary's counts to this one
    pub fn merge(&mut self, other: Self) {
        self.additions += other.additions;
        self.removals += other.removals;
        self.modifications += other.modifications;
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }
}

/// What reconciling one declaration would do
#[derive(Debug, Clone)]
pub struct Plan {
    /// Resolved target object
    pub object: ObjectRef,
    /// Declared grants in comparable form
    pub desired: PermissionsEntity,
    /// Current grants; `None` if the object does not exist
    pub observed: Option<PermissionsEntity>,
    /// Differences between desired and observed
    pub diff: AclDiff,
    /// Payload an apply would write, invariants included
    pub payload: AccessControlChangeList,
}

impl Plan {
    /// Check if the object exists and already matches
    pub fn is_noop(&self) -> bool {
        self.observed.is_some() && self.diff.is_empty()
    }
}
