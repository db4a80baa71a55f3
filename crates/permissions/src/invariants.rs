//! Mandatory entries the API does not enforce on its own.
//!
//! Writes replace an object's whole ACL, so a payload built only from the
//! declared grants could lock administrators or the caller out. The two
//! functions here add the entries every write must carry.

use crate::object_type::ObjectType;
use crate::types::{
    AccessControlChange, AccessControlChangeList, CAN_MANAGE, IS_OWNER, ObjectAcl, Principal,
};

/// Build the write payload for a desired ACL.
///
/// Rules, in order:
/// 1. the caller is granted [`ObjectType::caller_grant`]; for owner-bearing
///    types only when `desired` names no owner;
/// 2. `admins CAN_MANAGE` is added for types that force it, and re-asserted
///    for non-exempt types when `observed` holds a direct `admins` grant.
///
/// Mandatory entries replace desired entries for the same principal. An
/// empty `caller` skips rule 1.
#[must_use]
pub fn augment(
    object_type: ObjectType,
    caller: &str,
    desired: &[AccessControlChange],
    observed: Option<&ObjectAcl>,
) -> AccessControlChangeList {
    let mut payload: AccessControlChangeList = desired.iter().cloned().collect();

    if !caller.is_empty() {
        match object_type.caller_grant() {
            Some(IS_OWNER) if payload.has_level(IS_OWNER) => {}
            Some(level) => payload.upsert(AccessControlChange::user(caller, level)),
            None => {}
        }
    }

    if object_type.forces_admin_grant()
        || (!object_type.exempt_from_admin_retention() && observed.is_some_and(has_direct_admins))
    {
        payload.upsert(AccessControlChange::new(Principal::admins(), CAN_MANAGE));
    }

    payload
}

/// Build the payload that resets an object's ACL on delete.
///
/// Administrators are retained as in [`augment`], then `creator` is
/// assigned as owner. The result is empty only when neither applies.
#[must_use]
pub fn reset_payload(
    object_type: ObjectType,
    observed: &ObjectAcl,
    creator: Option<&str>,
) -> AccessControlChangeList {
    let mut payload = augment(object_type, "", &[], Some(observed));
    if let Some(creator) = creator.filter(|c| !c.is_empty()) {
        payload.upsert(AccessControlChange::user(creator, IS_OWNER));
    }
    payload
}

fn has_direct_admins(acl: &ObjectAcl) -> bool {
    acl.access_control_list
        .iter()
        .filter_map(|ac| ac.to_change())
        .any(|change| change.principal.is_admins())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessControl, Permission};

    fn observed_with_admins(direct: bool) -> ObjectAcl {
        let permission = if direct {
            Permission::direct("CAN_MANAGE")
        } else {
            Permission::inherited("CAN_MANAGE", &["/directories/0"])
        };
        ObjectAcl {
            object_id: "/clusters/abc".to_string(),
            object_type: "cluster".to_string(),
            access_control_list: vec![AccessControl {
                group_name: Some("admins".to_string()),
                all_permissions: vec![permission],
                ..Default::default()
            }],
        }
    }

    fn entries(list: &AccessControlChangeList) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_plain_type_passes_desired_through() {
        let payload = augment(
            ObjectType::Cluster,
            "admin",
            &[AccessControlChange::user("ben", "CAN_ATTACH_TO")],
            None,
        );
        assert_eq!(entries(&payload), ["ben CAN_ATTACH_TO"]);
    }

    #[test]
    fn test_sql_types_keep_caller_as_manager() {
        let payload = augment(
            ObjectType::SqlDashboard,
            "admin",
            &[AccessControlChange::user("ben", "CAN_RUN")],
            None,
        );
        assert_eq!(entries(&payload), ["ben CAN_RUN", "admin CAN_MANAGE"]);
    }

    #[test]
    fn test_mandatory_entry_replaces_desired() {
        let payload = augment(
            ObjectType::SqlEndpoint,
            "admin",
            &[
                AccessControlChange::user("admin", "CAN_USE"),
                AccessControlChange::user("ben", "CAN_USE"),
            ],
            None,
        );
        assert_eq!(entries(&payload), ["admin CAN_MANAGE", "ben CAN_USE"]);
    }

    #[test]
    fn test_job_gets_caller_as_owner() {
        let payload = augment(
            ObjectType::Job,
            "admin",
            &[AccessControlChange::user("ben", "CAN_VIEW")],
            None,
        );
        assert_eq!(entries(&payload), ["ben CAN_VIEW", "admin IS_OWNER"]);
    }

    #[test]
    fn test_declared_owner_is_kept() {
        let payload = augment(
            ObjectType::Pipeline,
            "admin",
            &[AccessControlChange::service_principal("app-1", "IS_OWNER")],
            None,
        );
        assert_eq!(entries(&payload), ["app-1 IS_OWNER"]);
    }

    #[test]
    fn test_tokens_always_carry_admins() {
        let payload = augment(
            ObjectType::Tokens,
            "me",
            &[AccessControlChange::user("me", "CAN_MANAGE")],
            None,
        );
        assert_eq!(entries(&payload), ["me CAN_MANAGE", "admins CAN_MANAGE"]);
    }

    #[test]
    fn test_observed_admins_retained() {
        let payload = augment(
            ObjectType::Cluster,
            "admin",
            &[AccessControlChange::user("ben", "CAN_RESTART")],
            Some(&observed_with_admins(true)),
        );
        assert_eq!(entries(&payload), ["ben CAN_RESTART", "admins CAN_MANAGE"]);
    }

    #[test]
    fn test_inherited_admins_not_retained() {
        let payload = augment(
            ObjectType::Cluster,
            "admin",
            &[],
            Some(&observed_with_admins(false)),
        );
        assert!(payload.is_empty());
    }

    #[test]
    fn test_passwords_exempt() {
        let payload = augment(
            ObjectType::Passwords,
            "admin",
            &[AccessControlChange::group("users", "CAN_USE")],
            Some(&observed_with_admins(true)),
        );
        assert_eq!(entries(&payload), ["users CAN_USE"]);
    }

    #[test]
    fn test_reset_payload_with_creator() {
        let payload = reset_payload(
            ObjectType::Job,
            &observed_with_admins(true),
            Some("creator@example.com"),
        );
        assert_eq!(
            entries(&payload),
            ["admins CAN_MANAGE", "creator@example.com IS_OWNER"]
        );
    }

    #[test]
    fn test_reset_payload_without_admins() {
        let observed = ObjectAcl {
            object_type: "cluster".to_string(),
            ..Default::default()
        };
        assert!(reset_payload(ObjectType::Cluster, &observed, None).is_empty());
    }

    #[test]
    fn test_reset_payload_never_drops_admins() {
        for object_type in ObjectType::ALL {
            if object_type.exempt_from_admin_retention() {
                continue;
            }
            let payload = reset_payload(object_type, &observed_with_admins(true), None);
            assert!(
                payload.get(&Principal::admins()).is_some(),
                "{object_type}"
            );
        }
    }
}
