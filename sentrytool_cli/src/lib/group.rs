//! Group commands

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{bail, Result};

use crate::session::{role_and_rest, Session};

/// Print `group = role1, role2` for every group, or just the given ones.
pub(crate) async fn list(
    session: &Session<'_>,
    groups: &[String],
    out: &mut dyn Write,
) -> Result<()> {
    let roles = session
        .client
        .list_roles_by_group(None)
        .await
        .map_err(|e| session.api(e))?;

    let mut by_group: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for role in roles {
        for group in role.groups {
            if groups.is_empty() || groups.contains(&group) {
                by_group.entry(group).or_default().push(role.name.clone());
            }
        }
    }

    for (group, mut roles) in by_group {
        roles.sort();
        writeln!(out, "{group} = {}", roles.join(", "))?;
    }
    Ok(())
}

pub(crate) async fn grant(
    session: &Session<'_>,
    role: Option<String>,
    args: Vec<String>,
    out: &mut dyn Write,
) -> Result<()> {
    let (role, groups) = role_and_groups(role, args)?;
    session.ensure_role(&role).await?;
    session
        .client
        .add_groups_to_role(&role, &groups)
        .await
        .map_err(|e| session.api(e))?;
    if session.verbose {
        list(session, &groups, out).await?;
    }
    Ok(())
}

pub(crate) async fn revoke(
    session: &Session<'_>,
    role: Option<String>,
    args: Vec<String>,
    out: &mut dyn Write,
) -> Result<()> {
    let (role, groups) = role_and_groups(role, args)?;
    session.ensure_role(&role).await?;
    session
        .client
        .remove_groups_from_role(&role, &groups)
        .await
        .map_err(|e| session.api(e))?;
    if session.verbose {
        writeln!(out, "revoked {} from role {role}", groups.join(", "))?;
    }
    Ok(())
}

fn role_and_groups(role: Option<String>, args: Vec<String>) -> Result<(String, Vec<String>)> {
    let (role, groups) = role_and_rest(role, args)?;
    if groups.is_empty() {
        bail!("missing group name");
    }
    Ok((role, groups))
}

#[cfg(test)]
mod tests {
    use sentrytool_core::{memory::MemoryClient, SentryClient};

    use super::*;
    use crate::session::tests::{output, session};

    async fn client() -> MemoryClient {
        let client = MemoryClient::default();
        for role in ["admin", "analyst"] {
            client.create_role(role).await.unwrap();
        }
        client
            .add_groups_to_role("analyst", &["finance".to_owned(), "admins".to_owned()])
            .await
            .unwrap();
        client
            .add_groups_to_role("admin", &["admins".to_owned()])
            .await
            .unwrap();
        client
    }

    #[tokio::test]
    async fn list_groups_with_their_roles() {
        let client = client().await;
        let mut out = vec![];
        list(&session(&client), &[], &mut out).await.unwrap();
        assert_eq!(output(out), "admins = admin, analyst\nfinance = analyst\n");

        let mut out = vec![];
        list(&session(&client), &["finance".to_owned()], &mut out)
            .await
            .unwrap();
        assert_eq!(output(out), "finance = analyst\n");
    }

    #[tokio::test]
    async fn grant_with_role_argument_or_flag() {
        let client = client().await;
        let mut out = vec![];
        grant(
            &session(&client),
            None,
            vec!["admin".to_owned(), "ops".to_owned()],
            &mut out,
        )
        .await
        .unwrap();
        grant(
            &session(&client),
            Some("analyst".to_owned()),
            vec!["ops".to_owned()],
            &mut out,
        )
        .await
        .unwrap();

        let mut session = session(&client);
        session.verbose = true;
        let mut out = vec![];
        grant(&session, Some("admin".to_owned()), vec!["ops".to_owned()], &mut out)
            .await
            .unwrap();
        assert_eq!(output(out), "ops = admin, analyst\n");
    }

    #[tokio::test]
    async fn revoke_groups() {
        let client = client().await;
        let mut out = vec![];
        revoke(
            &session(&client),
            Some("analyst".to_owned()),
            vec!["finance".to_owned()],
            &mut out,
        )
        .await
        .unwrap();
        assert!(client
            .list_roles_by_group(Some("finance"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unknown_role_or_missing_groups() {
        let client = client().await;
        let mut out = vec![];
        let err = grant(
            &session(&client),
            Some("nope".to_owned()),
            vec!["g".to_owned()],
            &mut out,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "role nope doesn't exist");

        let err = revoke(&session(&client), None, vec!["admin".to_owned()], &mut out)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "missing group name");
    }
}
