//! Full CLI library for sentrytool
//!

#![deny(missing_docs)]

mod cmd;
mod group;
mod policy;
mod privilege;
mod prompt;
mod role;
mod session;

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use human_panic::setup_panic;

use sentrytool_core::{
    config::{FileConfig, Overrides, Settings},
    logging::{self, debug},
    Privilege,
};

use crate::{
    cmd::{
        GlobalArgs, GroupCommand, PolicyCommand, PrivilegeCommand, RoleCommand, SentryArgs,
        SentryCommand,
    },
    privilege::Change,
    session::Session,
};

/// Main CLI entrypoint.
pub async fn cli() -> Result<()> {
    setup_panic!(Metadata {
        name: env!("CARGO_PKG_NAME").into(),
        version: env!("CARGO_PKG_VERSION").into(),
        authors: env!("CARGO_PKG_AUTHORS").into(),
        homepage: "https://sentry.apache.org".into(),
    });
    let args = SentryArgs::parse();
    logging::setup(args.global.log_level);

    let settings = settings(&args.global)?;
    debug!("connecting with {:?}", settings.connection);
    let client = session::connect(&settings).await?;
    debug!("talking to {}", client.protocol());
    let session = Session::new(client.as_ref(), &settings);

    let mut out = std::io::stdout();
    run(&session, args.command, &mut out).await
}

fn settings(global: &GlobalArgs) -> Result<Settings> {
    let file = FileConfig::load(global.config.as_deref())?;
    let overrides = Overrides {
        host: global.host.clone(),
        port: global.port.clone(),
        user: global.username.clone(),
        component: global.component.clone(),
        verbose: global.verbose,
        jstack: global.jstack,
        policy_file: global.policy_file.clone(),
    };
    Settings::from_env(overrides, file)
}

async fn run(
    session: &Session<'_>,
    command: Option<SentryCommand>,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        None => show_all(session, out).await,
        Some(SentryCommand::Role { command }) => match command {
            None => role::list(session, None, None, session.verbose, out).await,
            Some(RoleCommand::List { pattern, group }) => {
                role::list(
                    session,
                    pattern.as_deref(),
                    group.as_deref(),
                    session.verbose,
                    out,
                )
                .await
            }
            Some(RoleCommand::Create { names, noverify }) => {
                role::create(session, &names, noverify, out).await
            }
            Some(RoleCommand::Delete {
                names,
                pattern,
                force,
            }) => role::delete(session, &names, pattern.as_deref(), force, out).await,
        },
        Some(SentryCommand::Group { command }) => match command {
            None => group::list(session, &[], out).await,
            Some(GroupCommand::List { groups }) => group::list(session, &groups, out).await,
            Some(GroupCommand::Grant { role, args }) => {
                group::grant(session, role, args, out).await
            }
            Some(GroupCommand::Revoke { role, args }) => {
                group::revoke(session, role, args, out).await
            }
        },
        Some(SentryCommand::Privilege { command }) => match command {
            None => privilege::list(session, &[], None, None, Privilege::default(), out).await,
            Some(PrivilegeCommand::List {
                roles,
                pattern,
                group,
                filter,
            }) => {
                privilege::list(
                    session,
                    &roles,
                    pattern.as_deref(),
                    group.as_deref(),
                    Privilege::from(&filter),
                    out,
                )
                .await
            }
            Some(PrivilegeCommand::Grant {
                role,
                args,
                template,
                unsetgrant,
            }) => {
                let mut template = Privilege::from(&template);
                template.unset_grant_option = unsetgrant;
                privilege::change(session, Change::Grant, role, args, template, out).await
            }
            Some(PrivilegeCommand::Revoke {
                role,
                args,
                template,
            }) => {
                let template = Privilege::from(&template);
                privilege::change(session, Change::Revoke, role, args, template, out).await
            }
        },
        Some(SentryCommand::Policy { command }) => match command {
            PolicyCommand::Import { file } => policy::import(session, &file, out).await,
            PolicyCommand::Export { output } => {
                policy::export(session, output.as_deref(), out).await
            }
        },
    }
}

/// Roles with their groups, then groups, then privileges.
async fn show_all(session: &Session<'_>, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "[roles]")?;
    role::list(session, None, None, true, out).await?;
    writeln!(out, "\n[groups]")?;
    group::list(session, &[], out).await?;
    writeln!(out, "\n[privileges]")?;
    privilege::list(session, &[], None, None, Privilege::default(), out).await
}

#[cfg(test)]
mod tests {
    use sentrytool_core::{client::ProtocolType, memory::MemoryClient, policy_file::PolicyFile};

    use super::*;
    use crate::session::tests::{output, session};

    const POLICY: &str = "[groups]\nops = admin\n[roles]\nadmin = server=server1\netl = db=raw\n";

    fn client() -> MemoryClient {
        MemoryClient::from_policy(ProtocolType::Policy, &PolicyFile::parse(POLICY).unwrap())
    }

    async fn run_args(client: &MemoryClient, argv: &[&str]) -> Result<String> {
        let args = SentryArgs::parse_from(std::iter::once("sentrytool").chain(argv.iter().copied()));
        let mut session = session(client);
        session.verbose = args.global.verbose;
        let mut out = vec![];
        run(&session, args.command, &mut out).await?;
        Ok(output(out))
    }

    #[tokio::test]
    async fn no_command_shows_everything() {
        let client = client();
        assert_eq!(
            run_args(&client, &[]).await.unwrap(),
            "[roles]\nadmin: (ops)\netl\n\n[groups]\nops = admin\n\n\
             [privileges]\nadmin = server=server1\netl = db=raw\n"
        );
    }

    #[tokio::test]
    async fn grant_then_list_through_the_command_line() {
        let client = client();
        run_args(
            &client,
            &["p", "add", "etl", "-d", "raw", "-a", "select", "table=events", "table=users"],
        )
        .await
        .unwrap();
        assert_eq!(
            run_args(&client, &["priv", "show", "etl", "-a", "select"])
                .await
                .unwrap(),
            "etl = db=raw->table=events->action=select, db=raw->table=users->action=select\n"
        );
    }

    #[tokio::test]
    async fn unset_grant_option_flag() {
        let client = client();
        run_args(
            &client,
            &["privilege", "grant", "-r", "etl", "--grantoption", "--unsetgrant", "db=clean"],
        )
        .await
        .unwrap();
        assert_eq!(
            run_args(&client, &["privilege", "list", "etl", "-d", "clean"])
                .await
                .unwrap(),
            "etl = db=clean\n"
        );
    }

    #[tokio::test]
    async fn role_and_group_commands() {
        let client = client();
        run_args(&client, &["role", "create", "bi"]).await.unwrap();
        run_args(&client, &["group", "add", "-r", "bi", "ops", "sales"])
            .await
            .unwrap();
        assert_eq!(
            run_args(&client, &["group", "ls", "ops"]).await.unwrap(),
            "ops = admin, bi\n"
        );
        run_args(&client, &["group", "rm", "bi", "ops"]).await.unwrap();
        run_args(&client, &["role", "rm", "--force", "-m", "^e"])
            .await
            .unwrap();
        assert_eq!(
            run_args(&client, &["role", "-v"]).await.unwrap(),
            "admin: (ops)\nbi: (sales)\n"
        );
    }
}
