//! Declared permissions and their pre-write validation.
//!
//! A declaration names exactly one object through one identifier field and
//! lists the grants it should carry:
//!
//! ```toml
//! cluster_id = "abc"
//! access_control = [
//!   { user_name = "ben", permission_level = "CAN_ATTACH_TO" },
//! ]
//! ```
//!
//! Validation runs before any request is sent and reports every problem it
//! finds, not just the first.

use crate::error::{Error, FieldError, Result};
use crate::object_type::{IdentifierField, ObjectType};
use crate::types::{AccessControlChange, Principal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const ACCESS_CONTROL: &str = "access_control";

/// An identifier value; IDs may be written as numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentifierValue {
    /// Numeric ID, e.g. `job_id = 9`.
    Number(i64),
    /// Textual ID or workspace path.
    Text(String),
}

impl IdentifierValue {
    fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl fmt::Display for IdentifierValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for IdentifierValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for IdentifierValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for IdentifierValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// One declared grant, as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlEntry {
    /// Grantee user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Grantee group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// Grantee service principal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_principal_name: Option<String>,
    /// Level to grant.
    #[serde(default)]
    pub permission_level: String,
}

impl AccessControlEntry {
    /// Grant a level to a user.
    pub fn user(name: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            user_name: Some(name.into()),
            permission_level: level.into(),
            ..Default::default()
        }
    }

    /// Grant a level to a group.
    pub fn group(name: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            group_name: Some(name.into()),
            permission_level: level.into(),
            ..Default::default()
        }
    }

    /// Grant a level to a service principal.
    pub fn service_principal(name: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            service_principal_name: Some(name.into()),
            permission_level: level.into(),
            ..Default::default()
        }
    }

    fn to_change(&self) -> std::result::Result<AccessControlChange, &'static str> {
        let principal = Principal::from_fields(
            self.user_name.as_deref(),
            self.group_name.as_deref(),
            self.service_principal_name.as_deref(),
        )
        .ok_or("exactly one of user_name, group_name, service_principal_name must be set")?;
        check_grant(&principal, &self.permission_level)?;
        Ok(AccessControlChange::new(principal, self.permission_level.trim()))
    }
}

/// Rules every declared grant must follow.
fn check_grant(principal: &Principal, level: &str) -> std::result::Result<(), &'static str> {
    if principal.is_admins() {
        return Err("It is not possible to restrict any permissions from `admins`.");
    }
    if level.trim().is_empty() {
        return Err("permission_level must be set");
    }
    Ok(())
}

/// Check grants that did not come from a `PermissionsConfig`.
///
/// # Errors
///
/// Returns `Error::Validation` listing every grant on `admins` and every
/// empty permission level.
pub(crate) fn validate_changes(changes: &[AccessControlChange]) -> Result<()> {
    let errors: Vec<FieldError> = changes
        .iter()
        .filter_map(|c| check_grant(&c.principal, &c.permission_level).err())
        .map(|message| FieldError::new(ACCESS_CONTROL, message))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

/// A declared permissions block.
///
/// Identifier fields are kept by name so that unknown or conflicting
/// fields can be reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsConfig {
    /// Optional label for output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Declared grants; required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_control: Option<Vec<AccessControlEntry>>,
    /// Identifier fields by name, e.g. `cluster_id`.
    #[serde(flatten)]
    pub identifiers: BTreeMap<String, IdentifierValue>,
}

/// A validated declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// The single identifier field set.
    pub field: IdentifierField,
    /// Its value.
    pub value: String,
    /// Nominal object type; path fields are finalized by lookup.
    pub object_type: ObjectType,
    /// Desired grants, in declaration order.
    pub access_control: Vec<AccessControlChange>,
}

impl PermissionsConfig {
    /// Create an empty declaration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an identifier field.
    #[must_use]
    pub fn with(mut self, field: IdentifierField, value: impl Into<IdentifierValue>) -> Self {
        self.identifiers.insert(field.name().to_string(), value.into());
        self
    }

    /// Add a grant, creating the `access_control` block if needed.
    #[must_use]
    pub fn grant(mut self, entry: AccessControlEntry) -> Self {
        self.access_control.get_or_insert_with(Vec::new).push(entry);
        self
    }

    /// A label for output: the declared name, or `field = value`.
    #[must_use]
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.identifiers
            .iter()
            .find(|(_, v)| !v.is_empty())
            .map_or_else(|| "<unidentified>".to_string(), |(k, v)| format!("{k} = {v}"))
    }

    /// Classify and validate the declaration.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingIdentifier` if no identifier field is set, and
    /// `Error::Validation` listing every conflicting identifier, unknown
    /// field, and malformed or forbidden grant otherwise.
    pub fn validate(&self) -> Result<Declaration> {
        let mut errors = Vec::new();
        let mut set = Vec::new();

        for (key, value) in &self.identifiers {
            match IdentifierField::from_name(key) {
                Some(_) if value.is_empty() => {}
                Some(field) => set.push((field, value.to_string())),
                None => errors.push(FieldError::new(key.as_str(), "unknown field")),
            }
        }
        set.sort_by_key(|(field, _)| *field);

        if set.is_empty() {
            return Err(if errors.is_empty() {
                Error::MissingIdentifier
            } else {
                Error::Validation(errors)
            });
        }

        if set.len() > 1 {
            for (field, _) in &set {
                errors.push(FieldError::new(
                    field.name(),
                    "Conflicting configuration arguments",
                ));
            }
        }

        let (field, value) = set.swap_remove(0);
        let object_type = match field.object_type(&value) {
            Ok(object_type) => Some(object_type),
            Err(Error::Validation(mut field_errors)) => {
                errors.append(&mut field_errors);
                None
            }
            Err(err) => return Err(err),
        };

        let mut access_control: Vec<AccessControlChange> = Vec::new();
        match &self.access_control {
            None => errors.push(FieldError::new(ACCESS_CONTROL, "Missing required argument")),
            Some(entries) => {
                for entry in entries {
                    match entry.to_change() {
                        Ok(change)
                            if access_control.iter().any(|c| c.principal == change.principal) =>
                        {
                            errors.push(FieldError::new(
                                ACCESS_CONTROL,
                                format!("{} is declared more than once", change.principal),
                            ));
                        }
                        Ok(change) => access_control.push(change),
                        Err(message) => errors.push(FieldError::new(ACCESS_CONTROL, message)),
                    }
                }
            }
        }

        match object_type {
            Some(object_type) if errors.is_empty() => Ok(Declaration {
                field,
                value,
                object_type,
                access_control,
            }),
            _ => Err(Error::Validation(errors)),
        }
    }
}
