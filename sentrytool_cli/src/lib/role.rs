//! Role commands

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::{bail, Context, Result};
use regex::Regex;

use sentrytool_core::{logging::info, Role};

use crate::session::{Session, Tally};

/// Roles known to the service, sorted by name.
///
/// Named roles have to exist. `pattern` is a regular expression matched
/// anywhere in the role name.
pub(crate) async fn select_roles(
    session: &Session<'_>,
    names: &[String],
    pattern: Option<&str>,
    group: Option<&str>,
) -> Result<Vec<Role>> {
    let matcher = pattern
        .map(Regex::new)
        .transpose()
        .context("invalid match expression")?;

    let mut roles = session
        .client
        .list_roles_by_group(group)
        .await
        .map_err(|e| session.api(e))?;
    roles.sort_by(|a, b| a.name.cmp(&b.name));

    if !names.is_empty() {
        for name in names {
            if !roles.iter().any(|r| &r.name == name) {
                bail!("role {name} doesn't exist");
            }
        }
        roles.retain(|r| names.contains(&r.name));
    }
    if let Some(matcher) = matcher {
        roles.retain(|r| matcher.is_match(&r.name));
    }
    Ok(roles)
}

pub(crate) async fn list(
    session: &Session<'_>,
    pattern: Option<&str>,
    group: Option<&str>,
    verbose: bool,
    out: &mut dyn Write,
) -> Result<()> {
    for role in select_roles(session, &[], pattern, group).await? {
        if verbose && !role.groups.is_empty() {
            let mut groups = role.groups.clone();
            groups.sort();
            writeln!(out, "{}: ({})", role.name, groups.join(","))?;
        } else {
            writeln!(out, "{}", role.name)?;
        }
    }
    Ok(())
}

pub(crate) async fn create(
    session: &Session<'_>,
    names: &[String],
    noverify: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let mut existing: BTreeSet<String> = if noverify {
        BTreeSet::new()
    } else {
        session
            .client
            .list_roles_by_group(None)
            .await
            .map_err(|e| session.api(e))?
            .into_iter()
            .map(|r| r.name)
            .collect()
    };

    let mut tally = Tally::default();
    for name in names {
        if existing.contains(name) {
            writeln!(out, "role {name} already exists, not created")?;
            continue;
        }
        let created = session
            .client
            .create_role(name)
            .await
            .map_err(|e| session.api(e));
        if tally.record(name, created).is_some() {
            existing.insert(name.to_owned());
            if session.verbose {
                writeln!(out, "created role {name}")?;
            }
        }
    }
    tally.finish("roles")
}

pub(crate) async fn delete(
    session: &Session<'_>,
    names: &[String],
    pattern: Option<&str>,
    force: bool,
    out: &mut dyn Write,
) -> Result<()> {
    if names.is_empty() && pattern.is_none() {
        bail!("give the roles to delete or a match expression");
    }

    let mut tally = Tally::default();
    for role in select_roles(session, names, pattern, None).await? {
        if !force && !(session.confirm)(&format!("delete '{}'?", role.name))? {
            info!("keeping role {}", role.name);
            continue;
        }
        let removed = session
            .client
            .remove_role(&role.name)
            .await
            .map_err(|e| session.api(e));
        if tally.record(&role.name, removed).is_some() && session.verbose {
            writeln!(out, "removed role {}", role.name)?;
        }
    }
    tally.finish("roles")
}

#[cfg(test)]
mod tests {
    use sentrytool_core::{memory::MemoryClient, SentryClient};

    use super::*;
    use crate::session::tests::{output, session};

    async fn client_with(roles: &[&str]) -> MemoryClient {
        let client = MemoryClient::default();
        for role in roles {
            client.create_role(role).await.unwrap();
        }
        client
    }

    #[tokio::test]
    async fn list_sorted_and_filtered() {
        let client = client_with(&["etl", "admin", "analyst"]).await;
        client
            .add_groups_to_role("admin", &["ops".to_owned(), "dba".to_owned()])
            .await
            .unwrap();
        let session = session(&client);

        let mut out = vec![];
        list(&session, None, None, false, &mut out).await.unwrap();
        assert_eq!(output(out), "admin\nanalyst\netl\n");

        let mut out = vec![];
        list(&session, Some("^a"), None, true, &mut out).await.unwrap();
        assert_eq!(output(out), "admin: (dba,ops)\nanalyst\n");

        let mut out = vec![];
        list(&session, None, Some("ops"), false, &mut out).await.unwrap();
        assert_eq!(output(out), "admin\n");
    }

    #[tokio::test]
    async fn bad_match_expression() {
        let client = client_with(&[]).await;
        let mut out = vec![];
        assert!(list(&session(&client), Some("("), None, false, &mut out)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn create_skips_existing_roles() {
        let client = client_with(&["admin"]).await;
        let mut session = session(&client);
        session.verbose = true;

        let mut out = vec![];
        create(
            &session,
            &["admin".to_owned(), "etl".to_owned(), "etl".to_owned()],
            false,
            &mut out,
        )
        .await
        .unwrap();
        assert_eq!(
            output(out),
            "role admin already exists, not created\ncreated role etl\nrole etl already exists, not created\n"
        );
    }

    #[tokio::test]
    async fn create_without_verification_reports_server_errors() {
        let client = client_with(&["admin"]).await;
        let mut out = vec![];
        let err = create(
            &session(&client),
            &["admin".to_owned(), "etl".to_owned()],
            true,
            &mut out,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 roles failed");
        assert!(client
            .list_roles_by_group(None)
            .await
            .unwrap()
            .iter()
            .any(|r| r.name == "etl"));
    }

    #[tokio::test]
    async fn delete_by_pattern() {
        let client = client_with(&["tmp_1", "tmp_2", "admin"]).await;
        let mut out = vec![];
        delete(&session(&client), &[], Some("^tmp_"), true, &mut out)
            .await
            .unwrap();
        let left = client.list_roles_by_group(None).await.unwrap();
        assert_eq!(left, vec![Role::new("admin", vec![])]);
    }

    #[tokio::test]
    async fn delete_asks_first() {
        let client = client_with(&["admin"]).await;
        let mut session = session(&client);
        session.confirm = |question| {
            assert_eq!(question, "delete 'admin'?");
            Ok(false)
        };
        let mut out = vec![];
        delete(&session, &["admin".to_owned()], None, false, &mut out)
            .await
            .unwrap();
        assert_eq!(client.list_roles_by_group(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_needs_a_target() {
        let client = client_with(&["admin"]).await;
        let mut out = vec![];
        assert!(delete(&session(&client), &[], None, true, &mut out)
            .await
            .is_err());
        assert!(delete(&session(&client), &["nope".to_owned()], None, true, &mut out)
            .await
            .is_err());
    }
}
