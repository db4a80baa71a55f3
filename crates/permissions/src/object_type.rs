//! Registry of object types and the identifier fields that select them.
//!
//! Every object type Databricks exposes permissions for is a variant of
//! [`ObjectType`]. Per-type behavior (request path, write verb, which
//! invariants apply) is answered by exhaustive matches here, so adding a
//! type is a compile-checked change.

use crate::backend::Method;
use crate::error::{Error, Result};
use crate::types::{CAN_MANAGE, IS_OWNER};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request prefix for the generic permissions API.
const PERMISSIONS_API: &str = "/api/2.0/permissions";

/// Request prefix for legacy SQL asset permissions.
const SQL_PERMISSIONS_API: &str = "/api/2.0/preview/sql/permissions";

/// Object types whose permissions can be managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectType {
    /// Cluster policy.
    ClusterPolicy,
    /// Instance pool.
    InstancePool,
    /// Interactive or job cluster.
    Cluster,
    /// Delta Live Tables pipeline.
    Pipeline,
    /// Job.
    Job,
    /// Workspace notebook.
    Notebook,
    /// Workspace directory.
    Directory,
    /// Git folder.
    Repo,
    /// Personal access token usage.
    Tokens,
    /// Password login usage.
    Passwords,
    /// SQL endpoint (warehouse).
    SqlEndpoint,
    /// Legacy SQL dashboard.
    SqlDashboard,
    /// Legacy SQL alert.
    SqlAlert,
    /// Legacy SQL query.
    SqlQuery,
    /// MLflow experiment.
    Experiment,
    /// MLflow registered model.
    RegisteredModel,
}

impl ObjectType {
    /// All object types, in registry order.
    pub const ALL: [ObjectType; 16] = [
        ObjectType::ClusterPolicy,
        ObjectType::InstancePool,
        ObjectType::Cluster,
        ObjectType::Pipeline,
        ObjectType::Job,
        ObjectType::Notebook,
        ObjectType::Directory,
        ObjectType::Repo,
        ObjectType::Tokens,
        ObjectType::Passwords,
        ObjectType::SqlEndpoint,
        ObjectType::SqlDashboard,
        ObjectType::SqlAlert,
        ObjectType::SqlQuery,
        ObjectType::Experiment,
        ObjectType::RegisteredModel,
    ];

    /// Stable kebab-case name, used in output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClusterPolicy => "cluster-policy",
            Self::InstancePool => "instance-pool",
            Self::Cluster => "cluster",
            Self::Pipeline => "pipeline",
            Self::Job => "job",
            Self::Notebook => "notebook",
            Self::Directory => "directory",
            Self::Repo => "repo",
            Self::Tokens => "authorization-tokens",
            Self::Passwords => "authorization-passwords",
            Self::SqlEndpoint => "sql-endpoint",
            Self::SqlDashboard => "sql-dashboard",
            Self::SqlAlert => "sql-alert",
            Self::SqlQuery => "sql-query",
            Self::Experiment => "experiment",
            Self::RegisteredModel => "registered-model",
        }
    }

    /// Path segment objects of this type live under.
    #[must_use]
    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::ClusterPolicy => "cluster-policies",
            Self::InstancePool => "instance-pools",
            Self::Cluster => "clusters",
            Self::Pipeline => "pipelines",
            Self::Job => "jobs",
            Self::Notebook => "notebooks",
            Self::Directory => "directories",
            Self::Repo => "repos",
            Self::Tokens | Self::Passwords => "authorization",
            Self::SqlEndpoint => "sql/endpoints",
            Self::SqlDashboard => "sql/dashboards",
            Self::SqlAlert => "sql/alerts",
            Self::SqlQuery => "sql/queries",
            Self::Experiment => "experiments",
            Self::RegisteredModel => "registered-models",
        }
    }

    /// Labels the server uses for this type in `object_type`.
    ///
    /// Matching is case-insensitive. The plural path segment is always
    /// accepted alongside the singular label.
    #[must_use]
    pub fn server_labels(&self) -> &'static [&'static str] {
        match self {
            Self::ClusterPolicy => &["cluster-policy", "cluster-policies"],
            Self::InstancePool => &["instance-pool", "instance-pools"],
            Self::Cluster => &["cluster", "clusters"],
            Self::Pipeline => &["pipelines", "pipeline"],
            Self::Job => &["job", "jobs"],
            Self::Notebook => &["notebook", "notebooks"],
            Self::Directory => &["directory", "directories"],
            Self::Repo => &["repo", "repos"],
            Self::Tokens => &["tokens"],
            Self::Passwords => &["passwords"],
            Self::SqlEndpoint => &["endpoints", "endpoint", "warehouses", "warehouse"],
            Self::SqlDashboard => &["dashboard", "dashboards"],
            Self::SqlAlert => &["alert", "alerts"],
            Self::SqlQuery => &["query", "queries"],
            Self::Experiment => &["mlflowExperiment", "experiment", "experiments"],
            Self::RegisteredModel => &["registered-model", "registered-models"],
        }
    }

    /// Classify a server-reported `object_type` label.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownObjectType` if no type carries the label.
    pub fn from_server_label(label: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.server_labels().iter().any(|l| l.eq_ignore_ascii_case(label)))
            .ok_or_else(|| Error::UnknownObjectType(label.to_string()))
    }

    /// HTTP verb used to write permissions.
    #[must_use]
    pub fn write_method(&self) -> Method {
        match self {
            Self::SqlEndpoint => Method::Patch,
            Self::SqlDashboard | Self::SqlAlert | Self::SqlQuery => Method::Post,
            _ => Method::Put,
        }
    }

    /// Request path for an object path of this type.
    ///
    /// Legacy SQL assets are served by a separate API; everything else sits
    /// under `/api/2.0/permissions`.
    #[must_use]
    pub fn endpoint(&self, object_path: &str) -> String {
        match self {
            Self::SqlDashboard | Self::SqlAlert | Self::SqlQuery => {
                let rest = object_path.strip_prefix("/sql").unwrap_or(object_path);
                format!("{SQL_PERMISSIONS_API}{rest}")
            }
            _ => format!("{PERMISSIONS_API}{object_path}"),
        }
    }

    /// Whether this is one of the SQL families.
    #[must_use]
    pub fn is_sql(&self) -> bool {
        matches!(
            self,
            Self::SqlEndpoint | Self::SqlDashboard | Self::SqlAlert | Self::SqlQuery
        )
    }

    /// Whether an observed `admins` grant is left alone on writes.
    #[must_use]
    pub fn exempt_from_admin_retention(&self) -> bool {
        matches!(self, Self::Tokens | Self::Passwords)
    }

    /// Whether every write must carry `admins CAN_MANAGE`.
    #[must_use]
    pub fn forces_admin_grant(&self) -> bool {
        matches!(self, Self::Tokens)
    }

    /// Whether the `admins` group is hidden from the comparable entity.
    #[must_use]
    pub fn hides_admins(&self) -> bool {
        !matches!(self, Self::Passwords)
    }

    /// Whether objects of this type have an owner and a creator.
    #[must_use]
    pub fn has_owner(&self) -> bool {
        matches!(self, Self::Job | Self::Pipeline)
    }

    /// Level the caller is granted on writes, if any.
    ///
    /// SQL families always carry the caller at `CAN_MANAGE`. Owner-bearing
    /// families carry the caller as `IS_OWNER`, but only when the payload
    /// names no other owner.
    #[must_use]
    pub fn caller_grant(&self) -> Option<&'static str> {
        if self.is_sql() {
            Some(CAN_MANAGE)
        } else if self.has_owner() {
            Some(IS_OWNER)
        } else {
            None
        }
    }

    /// Whether `id` is acceptable as the last path segment.
    pub(crate) fn accepts_id(&self, id: &str) -> bool {
        match self {
            Self::Tokens => id == "tokens",
            Self::Passwords => id == "passwords",
            _ => !matches!(id, "" | "." | "..") && !id.contains('/'),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A resolved object: its type and canonical object path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object type.
    pub object_type: ObjectType,
    /// Canonical path, e.g. `/clusters/abc`.
    pub path: String,
}

impl ObjectRef {
    /// Build a reference from a type and an opaque ID.
    pub fn new(object_type: ObjectType, id: impl fmt::Display) -> Self {
        Self {
            object_type,
            path: format!("/{}/{}", object_type.resource_type(), id),
        }
    }

    /// Parse a canonical object path back into a reference.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedObjectId` if no type owns the path.
    pub fn parse(path: &str) -> Result<Self> {
        ObjectType::ALL
            .into_iter()
            .find(|t| {
                path.strip_prefix('/')
                    .and_then(|p| p.strip_prefix(t.resource_type()))
                    .and_then(|p| p.strip_prefix('/'))
                    .is_some_and(|id| t.accepts_id(id))
            })
            .map(|object_type| Self {
                object_type,
                path: path.to_string(),
            })
            .ok_or_else(|| Error::UnsupportedObjectId(path.to_string()))
    }

    /// The opaque ID: the last path segment.
    #[must_use]
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Request path for this object's permissions.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.object_type.endpoint(&self.path)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// How an identifier value becomes an object path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdLookup {
    /// The value is the object's opaque ID.
    Direct,
    /// The value is a workspace path resolved through `get-status`.
    WorkspacePath,
    /// The value names an authorization object (`tokens` or `passwords`).
    Authorization,
}

/// Mutually-exclusive identifier fields of a permissions declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentifierField {
    /// `cluster_policy_id`
    ClusterPolicyId,
    /// `instance_pool_id`
    InstancePoolId,
    /// `cluster_id`
    ClusterId,
    /// `pipeline_id`
    PipelineId,
    /// `job_id`
    JobId,
    /// `notebook_id`
    NotebookId,
    /// `notebook_path`
    NotebookPath,
    /// `directory_id`
    DirectoryId,
    /// `directory_path`
    DirectoryPath,
    /// `repo_id`
    RepoId,
    /// `repo_path`
    RepoPath,
    /// `authorization`
    Authorization,
    /// `sql_endpoint_id`
    SqlEndpointId,
    /// `sql_dashboard_id`
    SqlDashboardId,
    /// `sql_alert_id`
    SqlAlertId,
    /// `sql_query_id`
    SqlQueryId,
    /// `experiment_id`
    ExperimentId,
    /// `registered_model_id`
    RegisteredModelId,
}

impl IdentifierField {
    /// All identifier fields, in registry order.
    pub const ALL: [IdentifierField; 18] = [
        IdentifierField::ClusterPolicyId,
        IdentifierField::InstancePoolId,
        IdentifierField::ClusterId,
        IdentifierField::PipelineId,
        IdentifierField::JobId,
        IdentifierField::NotebookId,
        IdentifierField::NotebookPath,
        IdentifierField::DirectoryId,
        IdentifierField::DirectoryPath,
        IdentifierField::RepoId,
        IdentifierField::RepoPath,
        IdentifierField::Authorization,
        IdentifierField::SqlEndpointId,
        IdentifierField::SqlDashboardId,
        IdentifierField::SqlAlertId,
        IdentifierField::SqlQueryId,
        IdentifierField::ExperimentId,
        IdentifierField::RegisteredModelId,
    ];

    /// Field name as declared in configuration.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClusterPolicyId => "cluster_policy_id",
            Self::InstancePoolId => "instance_pool_id",
            Self::ClusterId => "cluster_id",
            Self::PipelineId => "pipeline_id",
            Self::JobId => "job_id",
            Self::NotebookId => "notebook_id",
            Self::NotebookPath => "notebook_path",
            Self::DirectoryId => "directory_id",
            Self::DirectoryPath => "directory_path",
            Self::RepoId => "repo_id",
            Self::RepoPath => "repo_path",
            Self::Authorization => "authorization",
            Self::SqlEndpointId => "sql_endpoint_id",
            Self::SqlDashboardId => "sql_dashboard_id",
            Self::SqlAlertId => "sql_alert_id",
            Self::SqlQueryId => "sql_query_id",
            Self::ExperimentId => "experiment_id",
            Self::RegisteredModelId => "registered_model_id",
        }
    }

    /// Look up a field by its declared name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// How the field's value is turned into an object path.
    #[must_use]
    pub fn lookup(&self) -> IdLookup {
        match self {
            Self::NotebookPath | Self::DirectoryPath | Self::RepoPath => IdLookup::WorkspacePath,
            Self::Authorization => IdLookup::Authorization,
            _ => IdLookup::Direct,
        }
    }

    /// Object type a value of this field selects.
    ///
    /// Workspace path fields report their nominal family; the lookup
    /// response decides the final one.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an `authorization` value other than
    /// `tokens` or `passwords`.
    pub fn object_type(&self, value: &str) -> Result<ObjectType> {
        Ok(match self {
            Self::ClusterPolicyId => ObjectType::ClusterPolicy,
            Self::InstancePoolId => ObjectType::InstancePool,
            Self::ClusterId => ObjectType::Cluster,
            Self::PipelineId => ObjectType::Pipeline,
            Self::JobId => ObjectType::Job,
            Self::NotebookId | Self::NotebookPath => ObjectType::Notebook,
            Self::DirectoryId | Self::DirectoryPath => ObjectType::Directory,
            Self::RepoId | Self::RepoPath => ObjectType::Repo,
            Self::Authorization => match value {
                "tokens" => ObjectType::Tokens,
                "passwords" => ObjectType::Passwords,
                _ => {
                    return Err(Error::invalid(
                        self.name(),
                        format!("expected tokens or passwords, got {value}"),
                    ));
                }
            },
            Self::SqlEndpointId => ObjectType::SqlEndpoint,
            Self::SqlDashboardId => ObjectType::SqlDashboard,
            Self::SqlAlertId => ObjectType::SqlAlert,
            Self::SqlQueryId => ObjectType::SqlQuery,
            Self::ExperimentId => ObjectType::Experiment,
            Self::RegisteredModelId => ObjectType::RegisteredModel,
        })
    }
}

impl fmt::Display for IdentifierField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
