//! Turns a declared identifier into a canonical object reference.

use crate::backend::Session;
use crate::error::{Error, Result};
use crate::lookup;
use crate::object_type::{IdLookup, IdentifierField, ObjectRef, ObjectType};
use log::debug;

/// Resolve an identifier field and its value into an object reference.
///
/// Opaque IDs are substituted directly. Workspace paths are looked up
/// through `get-status`, and the reported subtype picks the family.
///
/// # Errors
///
/// An ID that cannot be a single path segment is a validation error naming
/// the field. A failed path lookup is returned as `Error::Resolution` naming the path
/// and keeping the cause as its source.
pub fn resolve(session: &Session<'_>, field: IdentifierField, value: &str) -> Result<ObjectRef> {
    match field.lookup() {
        IdLookup::Direct | IdLookup::Authorization => {
            let object_type = field.object_type(value)?;
            if !object_type.accepts_id(value) {
                return Err(Error::invalid(
                    field.name(),
                    format!("{value} is not a valid {object_type} ID"),
                ));
            }
            Ok(ObjectRef::new(object_type, value))
        }
        IdLookup::WorkspacePath => resolve_path(session, value),
    }
}

fn resolve_path(session: &Session<'_>, path: &str) -> Result<ObjectRef> {
    let target = format!("path {path}");
    let status = lookup::object_status(session, path).map_err(|e| lookup::wrap(target.clone(), e))?;

    let object_type = match status.object_type.to_ascii_uppercase().as_str() {
        "NOTEBOOK" => ObjectType::Notebook,
        "DIRECTORY" => ObjectType::Directory,
        "REPO" => ObjectType::Repo,
        _ => {
            return Err(Error::resolution(
                target,
                Error::UnknownObjectType(status.object_type),
            ));
        }
    };

    let object = ObjectRef::new(object_type, status.object_id);
    debug!("resolved {path} to {object}");
    Ok(object)
}
