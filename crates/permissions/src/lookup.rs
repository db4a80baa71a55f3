//! Collaborator lookups: current identity, workspace paths and creators.

use crate::backend::{Request, Session};
use crate::error::{Error, Result};
use crate::object_type::{ObjectRef, ObjectType};
use serde::Deserialize;

/// SCIM endpoint describing the calling identity.
pub const SCIM_ME: &str = "/api/2.0/preview/scim/v2/Me";

/// Workspace object status endpoint.
pub const GET_STATUS: &str = "/api/2.0/workspace/get-status";

const JOBS_GET: &str = "/api/2.0/jobs/get";
const PIPELINES: &str = "/api/2.0/pipelines";

#[derive(Debug, Deserialize)]
struct ScimMe {
    #[serde(rename = "userName", default)]
    user_name: String,
}

/// Workspace object as reported by `get-status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectStatus {
    /// Numeric object ID.
    pub object_id: i64,
    /// Reported subtype, e.g. `NOTEBOOK`.
    pub object_type: String,
}

#[derive(Debug, Deserialize)]
struct CreatorInfo {
    #[serde(default)]
    creator_user_name: String,
}

/// The user name of the calling identity.
pub fn current_user(session: &Session<'_>) -> Result<String> {
    let me: ScimMe = session.get(&Request::get(SCIM_ME))?;
    if me.user_name.is_empty() {
        return Err(Error::InvalidResponse("identity has no userName".to_string()));
    }
    Ok(me.user_name)
}

/// Status of a workspace object by path.
pub fn object_status(session: &Session<'_>, path: &str) -> Result<ObjectStatus> {
    session.get(&Request::get(GET_STATUS).with_query("path", path))
}

/// User name of whoever created a job or pipeline.
///
/// # Errors
///
/// Fails with `Error::Resolution` if the lookup fails, returns no creator,
/// or the object type has no creator.
pub fn creator(session: &Session<'_>, object: &ObjectRef) -> Result<String> {
    let request = match object.object_type {
        ObjectType::Job => Request::get(JOBS_GET).with_query("job_id", object.id()),
        ObjectType::Pipeline => Request::get(format!("{PIPELINES}/{}", object.id())),
        _ => {
            return Err(Error::resolution(
                format!("creator of {object}"),
                Error::UnsupportedObjectId(object.path.clone()),
            ));
        }
    };

    let info: CreatorInfo = session
        .get(&request)
        .map_err(|err| wrap(format!("creator of {object}"), err))?;
    if info.creator_user_name.is_empty() {
        return Err(Error::resolution(
            format!("creator of {object}"),
            Error::InvalidResponse("no creator_user_name".to_string()),
        ));
    }
    Ok(info.creator_user_name)
}

/// Wrap a lookup failure as a resolution error, leaving cancellation alone.
pub(crate) fn wrap(target: String, err: Error) -> Error {
    match err {
        Error::Cancelled => Error::Cancelled,
        err => Error::resolution(target, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Method, MockBackend};
    use crate::cancel::CancelToken;
    use serde_json::json;

    #[test]
    fn test_current_user() {
        let mut mock = MockBackend::new();
        mock.respond(Method::Get, SCIM_ME, json!({"userName": "admin"}));
        let token = CancelToken::new();

        assert_eq!(current_user(&Session::new(&mock, &token)).unwrap(), "admin");
    }

    #[test]
    fn test_job_creator() {
        let mut mock = MockBackend::new();
        mock.respond_query(
            Method::Get,
            JOBS_GET,
            &[("job_id", "123")],
            json!({"creator_user_name": "creator@example.com"}),
        );
        let token = CancelToken::new();
        let job = ObjectRef::new(ObjectType::Job, 123);

        assert_eq!(
            creator(&Session::new(&mock, &token), &job).unwrap(),
            "creator@example.com"
        );
    }

    #[test]
    fn test_pipeline_creator() {
        let mut mock = MockBackend::new();
        mock.respond(
            Method::Get,
            "/api/2.0/pipelines/p1",
            json!({"creator_user_name": "ana"}),
        );
        let token = CancelToken::new();
        let pipeline = ObjectRef::new(ObjectType::Pipeline, "p1");

        assert_eq!(creator(&Session::new(&mock, &token), &pipeline).unwrap(), "ana");
    }

    #[test]
    fn test_creator_failures_are_resolution_errors() {
        let mut mock = MockBackend::new();
        mock.respond(Method::Get, JOBS_GET, json!({}));
        let token = CancelToken::new();
        let session = Session::new(&mock, &token);

        let err = creator(&session, &ObjectRef::new(ObjectType::Job, 1)).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));

        let err = creator(&session, &ObjectRef::new(ObjectType::Cluster, "abc")).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }

    #[test]
    fn test_wrap_keeps_cancellation() {
        assert!(matches!(wrap("x".into(), Error::Cancelled), Error::Cancelled));
    }
}
