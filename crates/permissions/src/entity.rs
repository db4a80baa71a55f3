//! Comparison-ready view of an ACL.

use crate::error::Result;
use crate::object_type::ObjectType;
use crate::types::{AccessControl, AccessControlChange, AccessControlChangeList, ObjectAcl};
use serde::Serialize;

/// Direct grants of one object, as they would be declared.
///
/// Inherited-only principals, the caller, and (except on passwords) the
/// `admins` group are absent. Each principal appears once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionsEntity {
    /// Classified object type.
    pub object_type: ObjectType,
    /// Direct grants, in server order.
    pub access_control: Vec<AccessControlChange>,
}

impl PermissionsEntity {
    /// Build an entity from declared grants, applying the same filters as
    /// [`ObjectAcl::to_entity`].
    #[must_use]
    pub fn from_declared(
        object_type: ObjectType,
        declared: &[AccessControlChange],
        caller: &str,
    ) -> Self {
        let mut entity = Self {
            object_type,
            access_control: Vec::new(),
        };
        for change in declared {
            entity.admit(change.clone(), caller);
        }
        entity
    }

    fn admit(&mut self, change: AccessControlChange, caller: &str) {
        if change.principal.is_identity(caller)
            || (change.principal.is_admins() && self.object_type.hides_admins())
            || self
                .access_control
                .iter()
                .any(|c| c.principal == change.principal)
        {
            return;
        }
        self.access_control.push(change);
    }

    /// Convert to a write payload.
    #[must_use]
    pub fn to_change_list(&self) -> AccessControlChangeList {
        to_change_list(&self.access_control)
    }

    /// Render back into direct-grant ACL form.
    ///
    /// SQL dashboards, alerts and queries use the flat entry shape.
    #[must_use]
    pub fn to_object_acl(&self, object_path: &str) -> ObjectAcl {
        let flat = self.object_type.is_sql() && self.object_type != ObjectType::SqlEndpoint;
        ObjectAcl {
            object_id: object_path.to_string(),
            object_type: self.object_type.server_labels()[0].to_string(),
            access_control_list: self
                .access_control
                .iter()
                .map(|c| {
                    if flat {
                        AccessControl::flat(&c.principal, c.permission_level.clone())
                    } else {
                        AccessControl::direct(&c.principal, c.permission_level.clone())
                    }
                })
                .collect(),
        }
    }
}

impl ObjectAcl {
    /// Flatten a server ACL into a comparable entity.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownObjectType` if the server's `object_type`
    /// label is not in the registry.
    pub fn to_entity(&self, caller: &str) -> Result<PermissionsEntity> {
        let object_type = ObjectType::from_server_label(&self.object_type)?;
        let mut entity = PermissionsEntity {
            object_type,
            access_control: Vec::new(),
        };
        for change in self.access_control_list.iter().filter_map(AccessControl::to_change) {
            entity.admit(change, caller);
        }
        Ok(entity)
    }
}

/// Convert declared or observed grants into a write payload.
#[must_use]
pub fn to_change_list(entries: &[AccessControlChange]) -> AccessControlChangeList {
    entries.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Permission;
    use serde_json::json;

    fn cluster_acl() -> ObjectAcl {
        serde_json::from_value(json!({
            "object_id": "/clusters/abc",
            "object_type": "cluster",
            "access_control_list": [
                {
                    "user_name": "ben",
                    "all_permissions": [{"permission_level": "CAN_RESTART", "inherited": false}]
                },
                {
                    "user_name": "admin",
                    "all_permissions": [{"permission_level": "CAN_MANAGE", "inherited": false}]
                },
                {
                    "group_name": "admins",
                    "all_permissions": [{"permission_level": "CAN_MANAGE", "inherited": false}]
                },
                {
                    "group_name": "readers",
                    "all_permissions": [{
                        "permission_level": "CAN_ATTACH_TO",
                        "inherited": true,
                        "inherited_from_object": ["/cluster-policies/p1"]
                    }]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_to_entity_filters() {
        let entity = cluster_acl().to_entity("admin").unwrap();
        assert_eq!(entity.object_type, ObjectType::Cluster);
        assert_eq!(
            entity.access_control,
            vec![AccessControlChange::user("ben", "CAN_RESTART")]
        );
    }

    #[test]
    fn test_to_entity_unknown_type() {
        let acl = ObjectAcl {
            object_type: "bananas".to_string(),
            ..Default::default()
        };
        assert_eq!(
            acl.to_entity("admin").unwrap_err().to_string(),
            "unknown object type bananas"
        );
    }

    #[test]
    fn test_passwords_keep_admins() {
        let acl = ObjectAcl {
            object_id: "/authorization/passwords".to_string(),
            object_type: "passwords".to_string(),
            access_control_list: vec![AccessControl {
                group_name: Some("admins".to_string()),
                all_permissions: vec![Permission::direct("CAN_USE")],
                ..Default::default()
            }],
        };
        let entity = acl.to_entity("admin").unwrap();
        assert_eq!(
            entity.access_control,
            vec![AccessControlChange::group("admins", "CAN_USE")]
        );
    }

    #[test]
    fn test_sql_flat_shape() {
        let acl: ObjectAcl = serde_json::from_value(json!({
            "object_id": "dashboards/abc",
            "object_type": "dashboard",
            "access_control_list": [
                {"user_name": "admin", "permission_level": "CAN_MANAGE"},
                {"user_name": "ben", "permission_level": "CAN_RUN"}
            ]
        }))
        .unwrap();
        let entity = acl.to_entity("admin").unwrap();
        assert_eq!(entity.object_type, ObjectType::SqlDashboard);
        assert_eq!(
            entity.access_control,
            vec![AccessControlChange::user("ben", "CAN_RUN")]
        );
    }

    #[test]
    fn test_to_entity_is_idempotent() {
        let entity = cluster_acl().to_entity("admin").unwrap();
        let again = entity.to_object_acl("/clusters/abc").to_entity("admin").unwrap();
        assert_eq!(entity, again);

        let dashboard = PermissionsEntity::from_declared(
            ObjectType::SqlDashboard,
            &[AccessControlChange::group("analysts", "CAN_VIEW")],
            "admin",
        );
        let again = dashboard
            .to_object_acl("/sql/dashboards/abc")
            .to_entity("admin")
            .unwrap();
        assert_eq!(dashboard, again);
    }

    #[test]
    fn test_round_trip_to_change_list() {
        let list = cluster_acl().to_entity("admin").unwrap().to_change_list();
        assert_eq!(list.len(), 1);
        assert_eq!(
            list.get(&crate::types::Principal::user("ben"))
                .map(|c| c.permission_level.as_str()),
            Some("CAN_RESTART")
        );
    }

    #[test]
    fn test_from_declared_drops_caller() {
        let entity = PermissionsEntity::from_declared(
            ObjectType::Job,
            &[
                AccessControlChange::user("admin", "IS_OWNER"),
                AccessControlChange::user("ben", "CAN_VIEW"),
            ],
            "admin",
        );
        assert_eq!(
            entity.access_control,
            vec![AccessControlChange::user("ben", "CAN_VIEW")]
        );
    }
}
