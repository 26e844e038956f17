//! Sentry roles.

/// A Sentry role: a name and the groups associated with it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Role {
    /// Role name
    pub name: String,
    /// Groups granted this role
    pub groups: Vec<String>,
}

impl Role {
    /// Basic constructor
    pub fn new(name: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            name: name.into(),
            groups,
        }
    }

    /// True if `group` is associated with this role.
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}
