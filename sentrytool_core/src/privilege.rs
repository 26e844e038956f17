//! The Sentry privilege model.
//!
//! A [`Privilege`] combines the generic model and the legacy Hive model into
//! one flat record. An empty string means "not set".

use std::fmt::Display;

use crate::codec::PrivilegeCodec;

/// A single authorization grant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Privilege {
    /// Free-form scope, carried for the remote object model only.
    pub scope: String,
    /// Server name
    pub server: String,
    /// Database name
    pub database: String,
    /// Table name
    pub table: String,
    /// Column name
    pub column: String,
    /// URI, the alternate way of addressing a resource
    pub uri: String,
    /// The permitted operation, e.g. `select`, `insert` or `all`.
    pub action: String,
    /// Service name for the generic model.
    pub service: String,
    /// True if the grantee may re-grant this privilege.
    pub grant_option: bool,
    /// True if the grant option should be sent as "unset". Takes precedence
    /// over `grant_option`.
    pub unset_grant_option: bool,
}

impl Privilege {
    /// True if no resource field or action is set.
    pub fn is_empty(&self) -> bool {
        self.server.is_empty()
            && self.database.is_empty()
            && self.table.is_empty()
            && self.column.is_empty()
            && self.uri.is_empty()
            && self.action.is_empty()
    }

    /// True if both privileges address the same resource with the same action.
    pub fn same_grant(&self, other: &Privilege) -> bool {
        self.server == other.server
            && self.database == other.database
            && self.table == other.table
            && self.column == other.column
            && self.uri == other.uri
            && self.action == other.action
    }
}

impl Display for Privilege {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", PrivilegeCodec::default().render(self))
    }
}

/// Client-side filter for privilege listings.
///
/// Every non-empty string field of the filter must equal the corresponding
/// field of a listed privilege. A set `grant_option` only lets through
/// privileges that carry the grant option.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrivilegeFilter(pub Privilege);

impl PrivilegeFilter {
    /// Wrap a privilege to use as a filter.
    pub fn new(filter: Privilege) -> Self {
        Self(filter)
    }

    /// Check a privilege against the filter.
    pub fn matches(&self, privilege: &Privilege) -> bool {
        let f = &self.0;
        let field_matches = |want: &str, have: &str| want.is_empty() || want == have;

        field_matches(&f.action, &privilege.action)
            && field_matches(&f.server, &privilege.server)
            && field_matches(&f.database, &privilege.database)
            && field_matches(&f.table, &privilege.table)
            && field_matches(&f.column, &privilege.column)
            && field_matches(&f.uri, &privilege.uri)
            && field_matches(&f.scope, &privilege.scope)
            && field_matches(&f.service, &privilege.service)
            && (!f.grant_option || privilege.grant_option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select_on_sales() -> Privilege {
        Privilege {
            server: "server1".to_owned(),
            database: "sales".to_owned(),
            table: "orders".to_owned(),
            action: "select".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = PrivilegeFilter::default();
        assert!(filter.matches(&select_on_sales()));
        assert!(filter.matches(&Privilege::default()));
    }

    #[test]
    fn filter_compares_set_fields_only() {
        let filter = PrivilegeFilter::new(Privilege {
            database: "sales".to_owned(),
            ..Default::default()
        });
        assert!(filter.matches(&select_on_sales()));

        let filter = PrivilegeFilter::new(Privilege {
            database: "sales".to_owned(),
            action: "insert".to_owned(),
            ..Default::default()
        });
        assert!(!filter.matches(&select_on_sales()));
    }

    #[test]
    fn grant_option_filter_requires_grant_option() {
        let filter = PrivilegeFilter::new(Privilege {
            grant_option: true,
            ..Default::default()
        });
        assert!(!filter.matches(&select_on_sales()));

        let mut with_grant = select_on_sales();
        with_grant.grant_option = true;
        assert!(filter.matches(&with_grant));
    }

    #[test]
    fn same_grant_ignores_grant_option() {
        let mut other = select_on_sales();
        other.grant_option = true;
        assert!(select_on_sales().same_grant(&other));
        other.table = "items".to_owned();
        assert!(!select_on_sales().same_grant(&other));
    }

    #[test]
    fn display_uses_canonical_form() {
        assert_eq!(
            select_on_sales().to_string(),
            "server=server1->db=sales->table=orders->action=select"
        );
        assert!(Privilege::default().is_empty());
    }
}
