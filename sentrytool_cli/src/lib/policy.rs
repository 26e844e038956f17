//! Policy file import and export

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use sentrytool_core::{logging::info, policy_file::PolicyFile};

use crate::session::{Session, Tally};

/// Create the roles of a policy file that don't exist yet, then grant the
/// file's groups and privileges to each of them.
pub(crate) async fn import(session: &Session<'_>, file: &Path, out: &mut dyn Write) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading policy file {}", file.display()))?;
    let policy = PolicyFile::parse(&raw)
        .with_context(|| format!("parsing policy file {}", file.display()))?;

    let existing: BTreeSet<String> = session
        .client
        .list_roles_by_group(None)
        .await
        .map_err(|e| session.api(e))?
        .into_iter()
        .map(|r| r.name)
        .collect();

    let mut tally = Tally::default();
    let roles = policy.role_names();
    for &role in &roles {
        if !existing.contains(role) {
            let created = session
                .client
                .create_role(role)
                .await
                .map_err(|e| session.api(e));
            if tally.record(role, created).is_none() {
                continue;
            }
            if session.verbose {
                writeln!(out, "created role {role}")?;
            }
        }

        let groups = policy.groups_for_role(role);
        if !groups.is_empty() {
            let added = session
                .client
                .add_groups_to_role(role, &groups)
                .await
                .map_err(|e| session.api(e));
            tally.record(role, added);
        }

        for privilege in policy.roles.get(role).into_iter().flatten() {
            let granted = session
                .client
                .grant_privilege(role, privilege)
                .await
                .map_err(|e| session.api(e));
            tally.record(&format!("{role}: {privilege}"), granted);
        }
    }
    tally.finish("policy changes")?;

    info!("imported {}", file.display());
    writeln!(
        out,
        "{}",
        format!("Imported {} roles from {}", roles.len(), file.display()).green()
    )?;
    Ok(())
}

/// Write every role with its groups and privileges as a policy file.
pub(crate) async fn export(
    session: &Session<'_>,
    output: Option<&Path>,
    out: &mut dyn Write,
) -> Result<()> {
    let policy = PolicyFile::export(session.client)
        .await
        .map_err(|e| session.api(e))?;

    match output {
        Some(path) => {
            tokio::fs::write(path, policy.to_string())
                .await
                .with_context(|| format!("writing policy file {}", path.display()))?;
            if session.verbose {
                writeln!(
                    out,
                    "wrote {} roles to {}",
                    policy.roles.len(),
                    path.display()
                )?;
            }
        }
        None => write!(out, "{policy}")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use sentrytool_core::{client::ProtocolType, memory::MemoryClient, SentryClient};

    use super::*;
    use crate::session::tests::{output, session};

    const POLICY: &str = r"[groups]
finance = analyst_role
admins = admin_role, analyst_role

[roles]
analyst_role = server=server1->db=analyst1->action=select, \
    server=server1->uri=hdfs:///landing
admin_role = server=server1->action=all
";

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sentrytool-{}-{name}", std::process::id()))
    }

    #[tokio::test]
    async fn import_creates_roles_groups_and_privileges() {
        let path = temp_file("import.ini");
        tokio::fs::write(&path, POLICY).await.unwrap();

        let client = MemoryClient::default();
        client.create_role("admin_role").await.unwrap();
        let mut out = vec![];
        import(&session(&client), &path, &mut out).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert!(output(out).contains("Imported 2 roles from"));
        let admins = client.list_roles_by_group(Some("admins")).await.unwrap();
        assert_eq!(admins.len(), 2);
        assert_eq!(
            client
                .list_privileges_by_role("analyst_role", None)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn import_rejects_bad_files() {
        let path = temp_file("bad.ini");
        tokio::fs::write(&path, "[roles]\nr = database=d\n")
            .await
            .unwrap();
        let client = MemoryClient::default();
        let mut out = vec![];
        let err = import(&session(&client), &path, &mut out)
            .await
            .unwrap_err();
        tokio::fs::remove_file(&path).await.unwrap();

        assert!(format!("{err:#}").contains("line 2: invalid scope name 'database'"));
        assert!(client.list_roles_by_group(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn export_reproduces_the_imported_policy() {
        let client =
            MemoryClient::from_policy(ProtocolType::Policy, &PolicyFile::parse(POLICY).unwrap());
        let mut out = vec![];
        export(&session(&client), None, &mut out).await.unwrap();
        assert_eq!(
            PolicyFile::parse(&output(out)).unwrap(),
            PolicyFile::parse(POLICY).unwrap()
        );
    }

    #[tokio::test]
    async fn export_to_a_file() {
        let path = temp_file("export.ini");
        let client =
            MemoryClient::from_policy(ProtocolType::Policy, &PolicyFile::parse(POLICY).unwrap());
        let mut out = vec![];
        export(&session(&client), Some(&path), &mut out)
            .await
            .unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert!(written.starts_with("[groups]\nadmins = admin_role, analyst_role\n"));
        assert!(output(out).is_empty());
    }
}
