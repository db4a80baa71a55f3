//! # permissions
//!
//! Reconcile Databricks object access-control lists against declared state.
//!
//! This crate provides functionality for:
//! - Classifying a declaration by its single identifier field
//! - Resolving workspace paths to object IDs
//! - Adding the entries every write must carry (administrators, caller, owner)
//! - Comparing declared and observed grants, ignoring inherited ones
//! - Writing with the verb and endpoint each object type requires
//!
//! ## Example
//!
//! ```no_run
//! use permissions::{AccessControlEntry, Client, IdentifierField, PermissionsConfig};
//! use permissions::backend::http::HttpConfig;
//!
//! let client = Client::new(&HttpConfig::new("https://example.cloud.databricks.com", "dapi..."))?;
//! let me = client.me()?;
//!
//! let config = PermissionsConfig::new()
//!     .with(IdentifierField::ClusterId, "0123-456789-abc")
//!     .grant(AccessControlEntry::user("ben@example.com", "CAN_ATTACH_TO"));
//!
//! let plan = client.plan(&me, &config)?;
//! if !plan.is_noop() {
//!     client.apply(&plan)?;
//! }
//! # Ok::<(), permissions::Error>(())
//! ```
//!
//! ## Object Types
//!
//! | Family            | Declared by                                 | Write verb |
//! |-------------------|---------------------------------------------|------------|
//! | clusters, jobs... | `cluster_id`, `job_id`, ...                 | PUT        |
//! | notebooks etc.    | `notebook_id` or `notebook_path`            | PUT        |
//! | tokens, passwords | `authorization = "tokens"`                  | PUT        |
//! | SQL endpoints     | `sql_endpoint_id`                           | PATCH      |
//! | SQL dashboards... | `sql_dashboard_id`, `sql_alert_id`, ...     | POST       |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod backend;
pub mod cancel;
pub mod config;
pub mod diff;
pub mod entity;
pub mod error;
pub mod invariants;
pub mod lookup;
pub mod object_type;
pub mod resolver;
pub mod types;

pub use cancel::CancelToken;
pub use config::{AccessControlEntry, Declaration, IdentifierValue, PermissionsConfig};
pub use diff::{AclDiff, DiffSummary, GrantDiff, Plan};
pub use entity::PermissionsEntity;
pub use error::{Error, ErrorCategory, FieldError, Result};
pub use object_type::{IdentifierField, ObjectRef, ObjectType};
pub use types::{
    AccessControl, AccessControlChange, AccessControlChangeList, ObjectAcl, Permission, Principal,
};

use api::PermissionsApi;
use backend::Backend;
pub use backend::MockBackend;
use backend::Session;
use backend::http::{HttpBackend, HttpConfig};
use log::info;

/// High-level client for permission reconciliation.
///
/// Every call runs synchronously and issues at most one identity lookup,
/// one path lookup, one creator lookup, one ACL read and one ACL write.
/// Nothing is cached between calls.
///
/// # Example
///
/// ```
/// use permissions::{Client, MockBackend};
/// use permissions::backend::Method;
/// use serde_json::json;
///
/// let mut mock = MockBackend::new();
/// mock.respond(Method::Get, "/api/2.0/preview/scim/v2/Me", json!({"userName": "admin"}));
///
/// let client = Client::with_backend(Box::new(mock));
/// assert_eq!(client.me().unwrap(), "admin");
/// ```
pub struct Client {
    backend: Box<dyn Backend>,
    cancel: CancelToken,
}

impl Client {
    /// Create a client talking to a workspace over HTTP.
    ///
    /// # Errors
    ///
    /// Returns a validation error if host or token is missing.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self::with_backend(Box::new(HttpBackend::new(config)?)))
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            cancel: CancelToken::new(),
        }
    }

    /// Use a shared cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The cancellation token checked before every request.
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn session(&self) -> Session<'_> {
        Session::new(self.backend.as_ref(), &self.cancel)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// User name of the calling identity.
    pub fn me(&self) -> Result<String> {
        lookup::current_user(&self.session())
    }

    /// Validate a declaration and resolve its target object.
    ///
    /// Returns the object and the declared grants. Path identifiers cost
    /// one lookup request; everything else is resolved locally.
    pub fn resolve(
        &self,
        config: &PermissionsConfig,
    ) -> Result<(ObjectRef, Vec<AccessControlChange>)> {
        let declaration = config.validate()?;
        let object = resolver::resolve(&self.session(), declaration.field, &declaration.value)?;
        Ok((object, declaration.access_control))
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Read an object's direct grants.
    ///
    /// Returns `None` if the object no longer exists.
    pub fn read(&self, caller: &str, object_path: &str) -> Result<Option<PermissionsEntity>> {
        let object = ObjectRef::parse(object_path)?;
        let session = self.session();
        match PermissionsApi::new(&session).get(&object) {
            Ok(acl) => acl.to_entity(caller).map(Some),
            Err(err) if err.is_not_found() => {
                info!("{object} no longer exists");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Write a declaration to its object for the first time.
    ///
    /// Observed state is not consulted, so only the caller and forced
    /// administrator entries are added.
    pub fn create(&self, caller: &str, config: &PermissionsConfig) -> Result<ObjectRef> {
        let (object, desired) = self.resolve(config)?;
        let payload = invariants::augment(object.object_type, caller, &desired, None);
        let session = self.session();
        PermissionsApi::new(&session).set(&object, &payload)?;
        Ok(object)
    }

    /// Replace an object's grants with `desired`, keeping mandatory entries.
    ///
    /// Grants on `admins` and empty levels are rejected before any request.
    pub fn update(
        &self,
        caller: &str,
        object_path: &str,
        desired: &[AccessControlChange],
    ) -> Result<()> {
        let object = ObjectRef::parse(object_path)?;
        config::validate_changes(desired)?;
        let session = self.session();
        let api = PermissionsApi::new(&session);
        let observed = api.get(&object)?;
        let payload = invariants::augment(object.object_type, caller, desired, Some(&observed));
        api.set(&object, &payload)
    }

    /// Reset an object's grants to administrators plus owner.
    ///
    /// Succeeds without writing if the object no longer exists.
    pub fn delete(&self, object_path: &str) -> Result<()> {
        let object = ObjectRef::parse(object_path)?;
        let session = self.session();
        PermissionsApi::new(&session).delete(&object)
    }

    /// Compute what reconciling a declaration would change, without writing.
    pub fn plan(&self, caller: &str, config: &PermissionsConfig) -> Result<Plan> {
        let (object, desired) = self.resolve(config)?;
        let session = self.session();

        let acl = match PermissionsApi::new(&session).get(&object) {
            Ok(acl) => Some(acl),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err),
        };
        let observed = acl.as_ref().map(|a| a.to_entity(caller)).transpose()?;
        let desired_entity = PermissionsEntity::from_declared(object.object_type, &desired, caller);
        let diff = AclDiff::compute(
            &desired_entity.access_control,
            observed
                .as_ref()
                .map(|o| o.access_control.as_slice())
                .unwrap_or_default(),
        );
        let payload = invariants::augment(object.object_type, caller, &desired, acl.as_ref());

        Ok(Plan {
            object,
            desired: desired_entity,
            observed,
            diff,
            payload,
        })
    }

    /// Write a plan's payload.
    ///
    /// # Errors
    ///
    /// Returns a not-found API error if the object did not exist when the
    /// plan was made.
    pub fn apply(&self, plan: &Plan) -> Result<()> {
        if plan.observed.is_none() {
            return Err(Error::api(
                404,
                "RESOURCE_DOES_NOT_EXIST",
                format!("{} does not exist", plan.object),
            ));
        }
        let session = self.session();
        PermissionsApi::new(&session).set(&plan.object, &plan.payload)
    }
}
