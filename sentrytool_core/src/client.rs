//! Sentry client interface
//!
//! [`SentryClient`] is the seam between the CLI and whatever talks to the
//! Sentry service. The API is the same for the legacy (Hive) and the generic
//! policy protocols.

use std::fmt::Display;

use async_trait::async_trait;
use thiserror::Error;

use crate::privilege::Privilege;
use crate::role::Role;

/// Default Thrift port of the Sentry service.
pub const DEFAULT_PORT: u16 = 8038;

/// The Sentry protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolType {
    /// The legacy Hive-model protocol
    Policy,
    /// The generic protocol, scoped to a component such as `solr` or `kafka`
    Generic,
}

impl ProtocolType {
    /// Name of the multiplexed Thrift service for this protocol.
    pub fn service_name(&self) -> &'static str {
        match self {
            ProtocolType::Policy => "SentryPolicyService",
            ProtocolType::Generic => "SentryGenericPolicyService",
        }
    }
}

impl Display for ProtocolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.service_name())
    }
}

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Sentry server host
    pub host: String,
    /// Sentry server port
    pub port: u16,
    /// User on whose behalf requests are made
    pub user: String,
    /// Component for the generic protocol. Empty for the legacy protocol.
    pub component: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: DEFAULT_PORT,
            user: String::new(),
            component: String::new(),
        }
    }
}

impl ConnectionSettings {
    /// The generic protocol is used whenever a component is given.
    pub fn protocol(&self) -> ProtocolType {
        if self.component.is_empty() {
            ProtocolType::Policy
        } else {
            ProtocolType::Generic
        }
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Errors returned by Sentry clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The service answered with a failure status.
    #[error("{message}")]
    Server {
        /// Status message
        message: String,
        /// Stack trace of the server, if it sent one
        stack: Option<String>,
    },
    /// The request never got an answer.
    #[error("transport error: {0}")]
    Transport(String),
    /// The role doesn't exist.
    #[error("role {0} doesn't exist")]
    RoleNotFound(String),
    /// The role already exists.
    #[error("role {0} already exists")]
    RoleExists(String),
}

impl ApiError {
    /// Error message, with the server stack trace appended when asked for
    /// and available.
    pub fn with_stack(&self, show_stack: bool) -> String {
        match self {
            ApiError::Server {
                message,
                stack: Some(stack),
            } if show_stack && !stack.is_empty() => {
                format!("{message}\nServer Stacktrace:\n{stack}")
            }
            other => other.to_string(),
        }
    }
}

/// The Sentry API shared by all protocols.
#[async_trait]
pub trait SentryClient: Send + Sync {
    /// The protocol this client speaks.
    fn protocol(&self) -> ProtocolType;
    /// Create a role with the given name.
    async fn create_role(&self, name: &str) -> Result<(), ApiError>;
    /// Remove the role with the given name.
    async fn remove_role(&self, name: &str) -> Result<(), ApiError>;
    /// List the roles for a group, or all roles if no group is given.
    async fn list_roles_by_group(&self, group: Option<&str>) -> Result<Vec<Role>, ApiError>;
    /// Add groups to a role.
    async fn add_groups_to_role(&self, role: &str, groups: &[String]) -> Result<(), ApiError>;
    /// Remove groups from a role.
    async fn remove_groups_from_role(&self, role: &str, groups: &[String])
        -> Result<(), ApiError>;
    /// Grant a privilege to a role.
    async fn grant_privilege(&self, role: &str, privilege: &Privilege) -> Result<(), ApiError>;
    /// Revoke a privilege from a role.
    async fn revoke_privilege(&self, role: &str, privilege: &Privilege) -> Result<(), ApiError>;
    /// List the privileges of a role. With a template, only privileges on
    /// the template's resource hierarchy are returned.
    async fn list_privileges_by_role(
        &self,
        role: &str,
        template: Option<&Privilege>,
    ) -> Result<Vec<Privilege>, ApiError>;
}

/// True if `name` is one of the roles known to the service.
pub async fn is_valid_role(client: &dyn SentryClient, name: &str) -> Result<bool, ApiError> {
    Ok(client
        .list_roles_by_group(None)
        .await?
        .iter()
        .any(|r| r.name == name))
}
