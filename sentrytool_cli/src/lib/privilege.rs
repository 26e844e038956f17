//! Privilege commands

use std::io::Write;

use anyhow::{bail, Result};

use sentrytool_core::{logging::debug, Privilege, PrivilegeFilter};

use crate::role::select_roles;
use crate::session::{role_and_rest, Session, Tally};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Change {
    Grant,
    Revoke,
}

impl Change {
    fn verb(&self) -> &'static str {
        match self {
            Change::Grant => "granted",
            Change::Revoke => "revoked",
        }
    }
}

/// Print `role = p1, p2` for each selected role, showing only privileges
/// that match `filter`.
pub(crate) async fn list(
    session: &Session<'_>,
    roles: &[String],
    pattern: Option<&str>,
    group: Option<&str>,
    filter: Privilege,
    out: &mut dyn Write,
) -> Result<()> {
    let filter = PrivilegeFilter::new(filter);
    let mut tally = Tally::default();

    for role in select_roles(session, roles, pattern, group).await? {
        let privileges = session
            .client
            .list_privileges_by_role(&role.name, None)
            .await
            .map_err(|e| session.api(e));
        let Some(privileges) = tally.record(&role.name, privileges) else {
            continue;
        };

        let shown = privileges
            .iter()
            .filter(|p| filter.matches(p))
            .map(|p| session.codec.render(p))
            .collect::<Vec<_>>();
        if shown.is_empty() {
            writeln!(out, "{}", role.name)?;
        } else {
            writeln!(out, "{} = {}", role.name, shown.join(", "))?;
        }
    }
    tally.finish("roles")
}

/// Grant or revoke privileges.
///
/// Without specs the template itself is sent. Otherwise every spec is
/// parsed against the template and sent on its own, and a failing spec
/// doesn't stop the rest.
pub(crate) async fn change(
    session: &Session<'_>,
    change: Change,
    role: Option<String>,
    args: Vec<String>,
    template: Privilege,
    out: &mut dyn Write,
) -> Result<()> {
    let (role, specs) = role_and_rest(role, args)?;
    session.ensure_role(&role).await?;

    let privileges = if specs.is_empty() {
        if template.is_empty() {
            bail!("missing privilege: give a privilege spec or privilege options");
        }
        vec![(session.codec.render(&template), Ok(template))]
    } else {
        specs
            .iter()
            .map(|spec| (spec.to_owned(), session.codec.parse(spec, &template)))
            .collect()
    };

    let mut tally = Tally::default();
    for (spec, parsed) in privileges {
        let sent = match parsed {
            Err(e) => Err(anyhow::Error::from(e)),
            Ok(privilege) => {
                debug!("{:?} {privilege:?} for {role}", change);
                match change {
                    Change::Grant => session.client.grant_privilege(&role, &privilege).await,
                    Change::Revoke => session.client.revoke_privilege(&role, &privilege).await,
                }
                .map(|_| privilege)
                .map_err(|e| session.api(e))
            }
        };
        if let Some(privilege) = tally.record(&spec, sent) {
            if session.verbose {
                writeln!(
                    out,
                    "{} {} {} {role}",
                    change.verb(),
                    session.codec.render(&privilege),
                    if change == Change::Grant { "to" } else { "from" }
                )?;
            }
        }
    }
    tally.finish("privileges")
}
