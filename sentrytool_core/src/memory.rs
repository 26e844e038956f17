//! In-process Sentry service.
//!
//! [`MemoryClient`] keeps roles, groups and privileges in memory. The CLI
//! uses it to run commands against a policy file without a Sentry server.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::client::{ApiError, ProtocolType, SentryClient};
use crate::logging::debug;
use crate::policy_file::PolicyFile;
use crate::privilege::Privilege;
use crate::role::Role;

#[derive(Debug, Default)]
struct RoleState {
    groups: Vec<String>,
    privileges: Vec<Privilege>,
}

/// A [`SentryClient`] backed by in-memory state.
#[derive(Debug)]
pub struct MemoryClient {
    protocol: ProtocolType,
    roles: RwLock<BTreeMap<String, RoleState>>,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new(ProtocolType::Policy)
    }
}

impl MemoryClient {
    /// An empty service for the given protocol.
    pub fn new(protocol: ProtocolType) -> Self {
        Self {
            protocol,
            roles: Default::default(),
        }
    }

    /// A service holding the roles, groups and privileges of a policy file.
    pub fn from_policy(protocol: ProtocolType, policy: &PolicyFile) -> Self {
        let mut roles: BTreeMap<String, RoleState> = BTreeMap::new();
        for name in policy.role_names() {
            let state = roles.entry(name.to_owned()).or_default();
            state.groups = policy.groups_for_role(name);
            if let Some(privileges) = policy.roles.get(name) {
                for privilege in privileges {
                    if !state.privileges.contains(privilege) {
                        state.privileges.push(privilege.clone());
                    }
                }
            }
        }
        debug!("loaded {} roles into memory", roles.len());

        Self {
            protocol,
            roles: RwLock::new(roles),
        }
    }
}

#[async_trait]
impl SentryClient for MemoryClient {
    fn protocol(&self) -> ProtocolType {
        self.protocol
    }

    async fn create_role(&self, name: &str) -> Result<(), ApiError> {
        let mut roles = self.roles.write().await;
        if roles.contains_key(name) {
            return Err(ApiError::RoleExists(name.to_owned()));
        }
        roles.insert(name.to_owned(), RoleState::default());
        Ok(())
    }

    async fn remove_role(&self, name: &str) -> Result<(), ApiError> {
        self.roles
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ApiError::RoleNotFound(name.to_owned()))
    }

    async fn list_roles_by_group(&self, group: Option<&str>) -> Result<Vec<Role>, ApiError> {
        Ok(self
            .roles
            .read()
            .await
            .iter()
            .map(|(name, state)| Role::new(name.to_owned(), state.groups.clone()))
            .filter(|role| group.map_or(true, |g| role.has_group(g)))
            .collect())
    }

    async fn add_groups_to_role(&self, role: &str, groups: &[String]) -> Result<(), ApiError> {
        let mut roles = self.roles.write().await;
        let state = roles
            .get_mut(role)
            .ok_or_else(|| ApiError::RoleNotFound(role.to_owned()))?;
        state.groups.extend(groups.iter().cloned());
        state.groups.sort();
        state.groups.dedup();
        Ok(())
    }

    async fn remove_groups_from_role(
        &self,
        role: &str,
        groups: &[String],
    ) -> Result<(), ApiError> {
        let mut roles = self.roles.write().await;
        let state = roles
            .get_mut(role)
            .ok_or_else(|| ApiError::RoleNotFound(role.to_owned()))?;
        state.groups.retain(|g| !groups.contains(g));
        Ok(())
    }

    async fn grant_privilege(&self, role: &str, privilege: &Privilege) -> Result<(), ApiError> {
        let mut roles = self.roles.write().await;
        let state = roles
            .get_mut(role)
            .ok_or_else(|| ApiError::RoleNotFound(role.to_owned()))?;

        let mut granted = privilege.clone();
        if granted.unset_grant_option {
            granted.grant_option = false;
            granted.unset_grant_option = false;
        }
        if !state.privileges.contains(&granted) {
            state.privileges.push(granted);
        }
        Ok(())
    }

    async fn revoke_privilege(&self, role: &str, privilege: &Privilege) -> Result<(), ApiError> {
        let mut roles = self.roles.write().await;
        let state = roles
            .get_mut(role)
            .ok_or_else(|| ApiError::RoleNotFound(role.to_owned()))?;
        state.privileges.retain(|p| {
            !(p.same_grant(privilege) && (!privilege.grant_option || p.grant_option))
        });
        Ok(())
    }

    async fn list_privileges_by_role(
        &self,
        role: &str,
        template: Option<&Privilege>,
    ) -> Result<Vec<Privilege>, ApiError> {
        let roles = self.roles.read().await;
        let state = roles
            .get(role)
            .ok_or_else(|| ApiError::RoleNotFound(role.to_owned()))?;

        Ok(state
            .privileges
            .iter()
            .filter(|p| template.map_or(true, |t| on_hierarchy(t, p)))
            .cloned()
            .collect())
    }
}

/// True if `privilege` sits on the resource hierarchy described by
/// `template`. Empty template fields match anything.
fn on_hierarchy(template: &Privilege, privilege: &Privilege) -> bool {
    [
        (&template.server, &privilege.server),
        (&template.database, &privilege.database),
        (&template.table, &privilege.table),
        (&template.column, &privilege.column),
        (&template.uri, &privilege.uri),
    ]
    .iter()
    .all(|(want, have)| want.is_empty() || want == have)
}
