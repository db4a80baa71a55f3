//! Permissions endpoints: read, write and reset an object's ACL.

use crate::backend::{Request, Session};
use crate::error::Result;
use crate::invariants;
use crate::lookup;
use crate::object_type::ObjectRef;
use crate::types::{AccessControlChangeList, ObjectAcl};
use log::info;

/// Typed access to the permissions endpoints of one session.
pub struct PermissionsApi<'a> {
    session: &'a Session<'a>,
}

impl<'a> PermissionsApi<'a> {
    /// Create the API wrapper.
    pub fn new(session: &'a Session<'a>) -> Self {
        Self { session }
    }

    /// Fetch an object's ACL.
    pub fn get(&self, object: &ObjectRef) -> Result<ObjectAcl> {
        self.session.get(&Request::get(object.endpoint()))
    }

    /// Replace an object's ACL, using the verb its type requires.
    pub fn set(&self, object: &ObjectRef, changes: &AccessControlChangeList) -> Result<()> {
        let method = object.object_type.write_method();
        info!("{method} {object} ({} entries)", changes.len());
        self.session.write(method, &object.endpoint(), changes)
    }

    /// Reset an object's ACL to administrators plus owner.
    ///
    /// An object that no longer exists counts as already reset.
    pub fn delete(&self, object: &ObjectRef) -> Result<()> {
        let observed = match self.get(object) {
            Ok(acl) => acl,
            Err(err) if err.is_not_found() => {
                info!("{object} no longer exists, nothing to reset");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let creator = if object.object_type.has_owner() {
            Some(lookup::creator(self.session, object)?)
        } else {
            None
        };

        let payload = invariants::reset_payload(object.object_type, &observed, creator.as_deref());
        self.set(object, &payload)
    }
}
