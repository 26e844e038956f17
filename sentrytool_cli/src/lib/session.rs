//! Everything a command needs to talk to the service

use std::fmt::Display;

use anyhow::{anyhow, bail, Context, Result};

use sentrytool_core::{
    client::is_valid_role,
    config::Settings,
    logging::{debug, error},
    memory::MemoryClient,
    policy_file::PolicyFile,
    ApiError, PrivilegeCodec, SentryClient,
};

/// Asks a yes/no question.
pub(crate) type Confirm = fn(&str) -> Result<bool>;

pub(crate) struct Session<'a> {
    pub(crate) client: &'a dyn SentryClient,
    pub(crate) verbose: bool,
    pub(crate) jstack: bool,
    pub(crate) codec: PrivilegeCodec,
    pub(crate) confirm: Confirm,
}

impl<'a> Session<'a> {
    pub(crate) fn new(client: &'a dyn SentryClient, settings: &Settings) -> Self {
        Self {
            client,
            verbose: settings.verbose,
            jstack: settings.jstack,
            codec: PrivilegeCodec::default(),
            confirm: crate::prompt::ask_yn,
        }
    }

    /// Turn a service error into a reportable one.
    pub(crate) fn api(&self, err: ApiError) -> anyhow::Error {
        anyhow!(err.with_stack(self.jstack))
    }

    /// Fail unless `role` is known to the service.
    pub(crate) async fn ensure_role(&self, role: &str) -> Result<()> {
        if !is_valid_role(self.client, role)
            .await
            .map_err(|e| self.api(e))?
        {
            bail!("role {role} doesn't exist");
        }
        Ok(())
    }
}

/// Build the client for the configured backend.
///
/// With a policy file the service is simulated in memory and changes are
/// lost when the process exits.
pub(crate) async fn connect(settings: &Settings) -> Result<Box<dyn SentryClient>> {
    let protocol = settings.connection.protocol();
    match &settings.policy_file {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading policy file {}", path.display()))?;
            let policy = PolicyFile::parse(&raw)
                .with_context(|| format!("parsing policy file {}", path.display()))?;
            debug!(
                "using policy file {} as {} for {}",
                path.display(),
                protocol,
                settings.connection.user
            );
            Ok(Box::new(MemoryClient::from_policy(protocol, &policy)))
        }
        None => bail!(
            "no {} transport is available to reach {}; use --policy-file to run against a local policy file",
            protocol,
            settings.connection.address()
        ),
    }
}

/// Counts the outcome of each item of a multi-item command.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    attempted: usize,
    failed: usize,
}

impl Tally {
    /// Record the result for `item`, logging a failure.
    pub(crate) fn record<T, E: Display>(&mut self, item: &str, result: Result<T, E>) -> Option<T> {
        self.attempted += 1;
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.failed += 1;
                error!("{item}: {e}");
                None
            }
        }
    }

    /// Fail if any recorded item failed.
    pub(crate) fn finish(self, what: &str) -> Result<()> {
        if self.failed > 0 {
            bail!("{} of {} {what} failed", self.failed, self.attempted);
        }
        Ok(())
    }
}

/// Split `[ROLE] REST...` arguments, with `-r` taking the place of the
/// first argument.
pub(crate) fn role_and_rest(
    role: Option<String>,
    mut args: Vec<String>,
) -> Result<(String, Vec<String>)> {
    match role {
        Some(role) => Ok((role, args)),
        None if args.is_empty() => bail!("missing role name"),
        None => {
            let role = args.remove(0);
            Ok((role, args))
        }
    }
}
