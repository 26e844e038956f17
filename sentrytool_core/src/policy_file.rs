//! Sentry policy files
//!
//! The policy file lists the roles of each group and the privileges of each
//! role. Long lines may be continued with a trailing backslash:
//!
//! ```text
//! [groups]
//! analyst = analyst_role
//! admin = admin_role, analyst_role
//!
//! [roles]
//! analyst_role = server=server1->db=analyst1, \
//!     server=server1->db=jranalyst1->table=*->action=select
//! admin_role = server=server1
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use thiserror::Error;

use crate::client::{ApiError, SentryClient};
use crate::codec::{ParseError, PrivilegeCodec};
use crate::privilege::Privilege;

const GROUPS_SECTION: &str = "groups";
const ROLES_SECTION: &str = "roles";
const SEGMENT_SEPARATOR: &str = "->";
const GRANT_OPTION_ENTRY: &str = "grantoption=true";

/// Errors found while reading a policy file. Line numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Section header other than `[groups]` or `[roles]`.
    #[error("line {line}: unknown section [{name}]")]
    UnknownSection {
        /// Line of the header
        line: usize,
        /// Section name
        name: String,
    },
    /// An entry appeared before any section header.
    #[error("line {line}: entry outside of a section")]
    OutsideSection {
        /// Line of the entry
        line: usize,
    },
    /// An entry without `=`.
    #[error("line {line}: expected 'name = value, ...'")]
    MissingSeparator {
        /// Line of the entry
        line: usize,
    },
    /// An entry with nothing before the `=`.
    #[error("line {line}: missing name before '='")]
    EmptyName {
        /// Line of the entry
        line: usize,
    },
    /// A role entry with a bad privilege.
    #[error("line {line}: {source}")]
    Privilege {
        /// Line of the entry
        line: usize,
        /// What was wrong with the privilege
        source: ParseError,
    },
}

#[derive(Clone, Copy)]
enum Section {
    Groups,
    Roles,
}

/// Contents of a policy file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyFile {
    /// Group name to role names
    pub groups: BTreeMap<String, Vec<String>>,
    /// Role name to privileges
    pub roles: BTreeMap<String, Vec<Privilege>>,
}

impl PolicyFile {
    /// Parse a policy file. Privileges are read with the strict codec.
    pub fn parse(text: &str) -> Result<Self, PolicyError> {
        let codec = PrivilegeCodec::default();
        let template = Privilege::default();
        let mut policy = PolicyFile::default();
        let mut section = None;

        for (line, content) in logical_lines(text) {
            let content = content.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }

            if let Some(name) = content
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                section = Some(match name.trim() {
                    GROUPS_SECTION => Section::Groups,
                    ROLES_SECTION => Section::Roles,
                    other => {
                        return Err(PolicyError::UnknownSection {
                            line,
                            name: other.to_owned(),
                        })
                    }
                });
                continue;
            }

            let section = section.ok_or(PolicyError::OutsideSection { line })?;
            let (name, values) = content
                .split_once('=')
                .ok_or(PolicyError::MissingSeparator { line })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(PolicyError::EmptyName { line });
            }
            let values = values.split(',').map(str::trim).filter(|v| !v.is_empty());

            match section {
                Section::Groups => policy
                    .groups
                    .entry(name.to_owned())
                    .or_default()
                    .extend(values.map(str::to_owned)),
                Section::Roles => {
                    let privileges = policy.roles.entry(name.to_owned()).or_default();
                    for value in values {
                        let privilege = codec
                            .parse(value, &template)
                            .map_err(|source| PolicyError::Privilege { line, source })?;
                        if !privileges.contains(&privilege) {
                            privileges.push(privilege);
                        }
                    }
                }
            }
        }

        Ok(policy)
    }

    /// Read every role with its groups and privileges from the service.
    pub async fn export(client: &dyn SentryClient) -> Result<Self, ApiError> {
        let mut policy = PolicyFile::default();
        for role in client.list_roles_by_group(None).await? {
            for group in &role.groups {
                policy
                    .groups
                    .entry(group.to_owned())
                    .or_default()
                    .push(role.name.clone());
            }
            let privileges = client.list_privileges_by_role(&role.name, None).await?;
            policy.roles.insert(role.name, privileges);
        }
        for roles in policy.groups.values_mut() {
            roles.sort();
        }
        Ok(policy)
    }

    /// Every role mentioned in the file, whether in `[roles]` or `[groups]`.
    pub fn role_names(&self) -> BTreeSet<&str> {
        self.roles
            .keys()
            .map(String::as_str)
            .chain(self.groups.values().flatten().map(String::as_str))
            .collect()
    }

    /// Group names associated with `role`.
    pub fn groups_for_role(&self, role: &str) -> Vec<String> {
        self.groups
            .iter()
            .filter(|(_, roles)| roles.iter().any(|r| r == role))
            .map(|(group, _)| group.to_owned())
            .collect()
    }
}

impl Display for PolicyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codec = PrivilegeCodec::default();

        writeln!(f, "[{GROUPS_SECTION}]")?;
        for (group, roles) in &self.groups {
            writeln!(f, "{group} = {}", roles.join(", "))?;
        }
        writeln!(f)?;
        writeln!(f, "[{ROLES_SECTION}]")?;
        for (role, privileges) in &self.roles {
            let privileges = privileges
                .iter()
                .map(|p| policy_entry(&codec, p))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "{role} = {privileges}")?;
        }
        Ok(())
    }
}

/// Canonical form plus the grant option, which plain rendering leaves out.
fn policy_entry(codec: &PrivilegeCodec, privilege: &Privilege) -> String {
    let mut entry = codec.render(privilege);
    if privilege.grant_option {
        if !entry.is_empty() {
            entry.push_str(SEGMENT_SEPARATOR);
        }
        entry.push_str(GRANT_OPTION_ENTRY);
    }
    entry
}

/// Join backslash-continued lines, keeping the number of the first line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = vec![];
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let trimmed = raw.trim_end();
        let (content, continued) = match trimmed.strip_suffix('\\') {
            Some(content) => (content, true),
            None => (trimmed, false),
        };
        let (start, mut buffer) = pending.take().unwrap_or((idx + 1, String::new()));
        buffer.push_str(content);
        if continued {
            pending = Some((start, buffer));
        } else {
            lines.push((start, buffer));
        }
    }
    lines.extend(pending);
    lines
}
