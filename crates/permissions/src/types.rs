//! Wire and domain types for object access-control lists.
//!
//! Two response shapes exist: most object types nest each principal's
//! grants under `all_permissions`, while SQL assets report a single flat
//! `permission_level` per entry. [`AccessControl`] accepts both.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the workspace administrators group.
pub const ADMINS_GROUP: &str = "admins";

/// Permission level granting full control over an object.
pub const CAN_MANAGE: &str = "CAN_MANAGE";

/// Permission level marking the owner of a job or pipeline.
pub const IS_OWNER: &str = "IS_OWNER";

/// The identity a grant applies to.
///
/// Exactly one kind is ever set, which is why this is an enum rather than
/// three optional names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Principal {
    /// A workspace user, by user name.
    User(String),
    /// A workspace group, by display name.
    Group(String),
    /// A service principal, by application ID.
    ServicePrincipal(String),
}

impl Principal {
    /// Create a user principal.
    pub fn user(name: impl Into<String>) -> Self {
        Self::User(name.into())
    }

    /// Create a group principal.
    pub fn group(name: impl Into<String>) -> Self {
        Self::Group(name.into())
    }

    /// Create a service principal.
    pub fn service_principal(name: impl Into<String>) -> Self {
        Self::ServicePrincipal(name.into())
    }

    /// The workspace administrators group.
    pub fn admins() -> Self {
        Self::Group(ADMINS_GROUP.to_string())
    }

    /// The principal's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::User(name) | Self::Group(name) | Self::ServicePrincipal(name) => name,
        }
    }

    /// The JSON field this principal is serialized under.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::User(_) => "user_name",
            Self::Group(_) => "group_name",
            Self::ServicePrincipal(_) => "service_principal_name",
        }
    }

    /// Whether this is the `admins` group.
    #[must_use]
    pub fn is_admins(&self) -> bool {
        matches!(self, Self::Group(name) if name == ADMINS_GROUP)
    }

    /// Whether this principal is the given acting identity.
    ///
    /// Callers are users or service principals; groups never match.
    #[must_use]
    pub fn is_identity(&self, identity: &str) -> bool {
        match self {
            Self::User(name) | Self::ServicePrincipal(name) => name == identity,
            Self::Group(_) => false,
        }
    }

    /// Build a principal from the three optional wire fields.
    ///
    /// Returns `None` unless exactly one of them is non-empty.
    pub fn from_fields(
        user_name: Option<&str>,
        group_name: Option<&str>,
        service_principal_name: Option<&str>,
    ) -> Option<Self> {
        let set = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);
        match (
            set(user_name),
            set(group_name),
            set(service_principal_name),
        ) {
            (Some(user), None, None) => Some(Self::User(user)),
            (None, Some(group), None) => Some(Self::Group(group)),
            (None, None, Some(sp)) => Some(Self::ServicePrincipal(sp)),
            _ => None,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Wire form shared by change entries: three optional principal fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_principal_name: Option<String>,
    #[serde(default)]
    permission_level: String,
}

/// One requested grant: a principal and the level it should hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawChange", into = "RawChange")]
pub struct AccessControlChange {
    /// Who the grant applies to.
    pub principal: Principal,
    /// API-defined level, e.g. `CAN_READ`.
    pub permission_level: String,
}

impl AccessControlChange {
    /// Create a change entry.
    pub fn new(principal: Principal, permission_level: impl Into<String>) -> Self {
        Self {
            principal,
            permission_level: permission_level.into(),
        }
    }

    /// Grant a level to a user.
    pub fn user(name: impl Into<String>, level: impl Into<String>) -> Self {
        Self::new(Principal::user(name), level)
    }

    /// Grant a level to a group.
    pub fn group(name: impl Into<String>, level: impl Into<String>) -> Self {
        Self::new(Principal::group(name), level)
    }

    /// Grant a level to a service principal.
    pub fn service_principal(name: impl Into<String>, level: impl Into<String>) -> Self {
        Self::new(Principal::service_principal(name), level)
    }
}

impl TryFrom<RawChange> for AccessControlChange {
    type Error = String;

    fn try_from(raw: RawChange) -> Result<Self, Self::Error> {
        let principal = Principal::from_fields(
            raw.user_name.as_deref(),
            raw.group_name.as_deref(),
            raw.service_principal_name.as_deref(),
        )
        .ok_or("exactly one of user_name, group_name, service_principal_name must be set")?;
        Ok(Self::new(principal, raw.permission_level))
    }
}

impl From<AccessControlChange> for RawChange {
    fn from(change: AccessControlChange) -> Self {
        let mut raw = RawChange {
            permission_level: change.permission_level,
            ..Default::default()
        };
        match change.principal {
            Principal::User(name) => raw.user_name = Some(name),
            Principal::Group(name) => raw.group_name = Some(name),
            Principal::ServicePrincipal(name) => raw.service_principal_name = Some(name),
        }
        raw
    }
}

impl fmt::Display for AccessControlChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.principal, self.permission_level)
    }
}

/// Ordered write payload for a permissions request.
///
/// Order is insertion order. The list holds at most one entry per
/// principal; [`upsert`](Self::upsert) replaces an existing entry in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlChangeList {
    /// Entries to send.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_control_list: Vec<AccessControlChange>,
}

impl AccessControlChangeList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a change, replacing any entry for the same principal.
    pub fn upsert(&mut self, change: AccessControlChange) {
        match self
            .access_control_list
            .iter_mut()
            .find(|c| c.principal == change.principal)
        {
            Some(existing) => *existing = change,
            None => self.access_control_list.push(change),
        }
    }

    /// Find the entry for a principal.
    #[must_use]
    pub fn get(&self, principal: &Principal) -> Option<&AccessControlChange> {
        self.access_control_list
            .iter()
            .find(|c| &c.principal == principal)
    }

    /// Whether any entry holds the given level.
    #[must_use]
    pub fn has_level(&self, level: &str) -> bool {
        self.access_control_list
            .iter()
            .any(|c| c.permission_level == level)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.access_control_list.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_control_list.is_empty()
    }

    /// Iterate over entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, AccessControlChange> {
        self.access_control_list.iter()
    }
}

impl FromIterator<AccessControlChange> for AccessControlChangeList {
    fn from_iter<I: IntoIterator<Item = AccessControlChange>>(iter: I) -> Self {
        let mut list = Self::new();
        for change in iter {
            list.upsert(change);
        }
        list
    }
}

/// One concrete grant observed on an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Granted level.
    pub permission_level: String,
    /// Whether the grant comes from a parent object.
    #[serde(default)]
    pub inherited: bool,
    /// Ancestors the grant was inherited from; empty for direct grants.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inherited_from_object: Vec<String>,
}

impl Permission {
    /// A direct (non-inherited) grant.
    pub fn direct(level: impl Into<String>) -> Self {
        Self {
            permission_level: level.into(),
            ..Default::default()
        }
    }

    /// An inherited grant.
    pub fn inherited(level: impl Into<String>, from: &[&str]) -> Self {
        Self {
            permission_level: level.into(),
            inherited: true,
            inherited_from_object: from.iter().map(ToString::to_string).collect(),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inherited_from_object.is_empty() {
            write!(f, "{}", self.permission_level)
        } else {
            write!(
                f,
                "{} (from [{}])",
                self.permission_level,
                self.inherited_from_object.join(" ")
            )
        }
    }
}

/// One principal's observed state on an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    /// User the entry belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Group the entry belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// Service principal the entry belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_principal_name: Option<String>,
    /// Nested grants (most object types).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_permissions: Vec<Permission>,
    /// Flat grant (SQL assets).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_level: Option<String>,
}

impl AccessControl {
    /// An entry holding a single direct grant.
    pub fn direct(principal: &Principal, level: impl Into<String>) -> Self {
        let mut entry = Self {
            all_permissions: vec![Permission::direct(level)],
            ..Default::default()
        };
        entry.set_principal(principal);
        entry
    }

    /// An entry in the flat SQL-asset shape.
    pub fn flat(principal: &Principal, level: impl Into<String>) -> Self {
        let mut entry = Self {
            permission_level: Some(level.into()),
            ..Default::default()
        };
        entry.set_principal(principal);
        entry
    }

    fn set_principal(&mut self, principal: &Principal) {
        let name = Some(principal.name().to_string());
        match principal {
            Principal::User(_) => self.user_name = name,
            Principal::Group(_) => self.group_name = name,
            Principal::ServicePrincipal(_) => self.service_principal_name = name,
        }
    }

    /// The principal this entry belongs to, if exactly one is set.
    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        Principal::from_fields(
            self.user_name.as_deref(),
            self.group_name.as_deref(),
            self.service_principal_name.as_deref(),
        )
    }

    /// The level this principal holds directly on the object.
    ///
    /// The first non-inherited nested grant wins; later direct grants for
    /// the same principal are ignored. Without nested grants, the flat
    /// SQL-asset level is used.
    #[must_use]
    pub fn direct_level(&self) -> Option<&str> {
        self.all_permissions
            .iter()
            .find(|p| !p.inherited)
            .map(|p| p.permission_level.as_str())
            .or(self.permission_level.as_deref())
            .filter(|level| !level.is_empty())
    }

    /// Convert to a change entry.
    ///
    /// Returns `None` ("no change") when the entry has no principal or no
    /// direct level, e.g. when every grant is inherited.
    #[must_use]
    pub fn to_change(&self) -> Option<AccessControlChange> {
        let level = self.direct_level()?;
        Some(AccessControlChange::new(self.principal()?, level))
    }
}

impl fmt::Display for AccessControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let permissions: Vec<String> =
            self.all_permissions.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{}{}{}[{}]",
            self.group_name.as_deref().unwrap_or_default(),
            self.user_name.as_deref().unwrap_or_default(),
            self.service_principal_name.as_deref().unwrap_or_default(),
            permissions.join(" ")
        )
    }
}

/// Full server-side ACL snapshot for one object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectAcl {
    /// Object path as reported by the server, e.g. `/clusters/abc`.
    #[serde(default)]
    pub object_id: String,
    /// Server's own type label, e.g. `cluster` or `dashboard`.
    #[serde(default)]
    pub object_type: String,
    /// One entry per principal.
    #[serde(default)]
    pub access_control_list: Vec<AccessControl>,
}
