//! Commands for sentrytool
//!

use std::path::PathBuf;

use clap::{self, Args, Parser, Subcommand};

use sentrytool_core::{logging::LevelFilter, Privilege};

const LONG_ABOUT: &str = "Command-line interface to Apache Sentry.

The tool can be configured using command-line flags, environment variables or
a YAML config file (by default ~/.sentrytool.yaml). The following environment
variables are used:

  SENTRY_HOST         Sentry server host name or IP address ('host' in the config file)
  SENTRY_PORT         Listening port for the Sentry server ('port')
  SENTRY_USER         User name on whose behalf the request is made ('user')
  SENTRY_COMPONENT    Component name, e.g. 'kafka' ('component')
  SENTRY_VERBOSE      Use verbose mode if set ('verbose')
  SENTRY_JSTACK       Show server stack traces if set ('jstack')
  SENTRY_POLICY_FILE  Work against a local policy file ('policy_file')

When a component is specified the tool uses the generic client model,
otherwise it uses the legacy model.";

/// Command-line interface to Apache Sentry
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = LONG_ABOUT)]
pub(crate) struct SentryArgs {
    /// Without a command, everything is shown.
    #[clap(subcommand)]
    pub(crate) command: Option<SentryCommand>,
    #[clap(flatten)]
    pub(crate) global: GlobalArgs,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct GlobalArgs {
    /// Config file (default is $HOME/.sentrytool.yaml)
    #[clap(global = true, long)]
    pub(crate) config: Option<PathBuf>,
    /// Hostname for the Sentry server
    #[clap(global = true, short = 'H', long)]
    pub(crate) host: Option<String>,
    /// Port for the Sentry server
    #[clap(global = true, short = 'P', long)]
    pub(crate) port: Option<String>,
    /// User name
    #[clap(global = true, short = 'U', long)]
    pub(crate) username: Option<String>,
    /// Sentry client component
    #[clap(global = true, short = 'C', long)]
    pub(crate) component: Option<String>,
    /// Verbose mode
    #[clap(global = true, short, long)]
    pub(crate) verbose: bool,
    /// Show the server stack trace for errors
    #[clap(global = true, short = 'J', long)]
    pub(crate) jstack: bool,
    /// Run against a local policy file instead of a Sentry server
    #[clap(global = true, long)]
    pub(crate) policy_file: Option<PathBuf>,
    #[clap(global = true, short = 'l', long)]
    pub(crate) log_level: Option<LevelFilter>,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum SentryCommand {
    /// Create, list or delete roles
    Role {
        #[clap(subcommand)]
        command: Option<RoleCommand>,
    },
    /// List, grant or revoke groups of a role
    Group {
        #[clap(subcommand)]
        command: Option<GroupCommand>,
    },
    /// List, grant or revoke privileges
    #[clap(visible_aliases = ["priv", "p"])]
    Privilege {
        #[clap(subcommand)]
        command: Option<PrivilegeCommand>,
    },
    /// Import or export Sentry policy files
    Policy {
        #[clap(subcommand)]
        command: PolicyCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum RoleCommand {
    /// List roles
    #[clap(visible_alias = "ls")]
    List {
        /// Only list roles matching this regular expression
        #[clap(short = 'm', long = "match")]
        pattern: Option<String>,
        /// Only list roles of this group
        #[clap(short, long)]
        group: Option<String>,
    },
    /// Create roles
    Create {
        /// Role names
        #[clap(required = true)]
        names: Vec<String>,
        /// Do not check whether the roles exist first
        #[clap(long)]
        noverify: bool,
    },
    /// Delete roles
    #[clap(visible_alias = "rm")]
    Delete {
        /// Role names
        names: Vec<String>,
        /// Delete the roles matching this regular expression
        #[clap(short = 'm', long = "match")]
        pattern: Option<String>,
        /// Don't ask for confirmation
        #[clap(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum GroupCommand {
    /// List groups and their roles
    #[clap(visible_alias = "ls")]
    List {
        /// Only show these groups
        groups: Vec<String>,
    },
    /// Grant groups to a role
    ///
    /// The role is either given with -r or is the first argument, followed by
    /// the group names.
    #[clap(visible_alias = "add")]
    Grant {
        /// Role name
        #[clap(short, long)]
        role: Option<String>,
        /// [ROLE] GROUP...
        args: Vec<String>,
    },
    /// Revoke groups from a role
    #[clap(visible_aliases = ["remove", "rm"])]
    Revoke {
        /// Role name
        #[clap(short, long)]
        role: Option<String>,
        /// [ROLE] GROUP...
        args: Vec<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum PrivilegeCommand {
    /// List matching privileges for the given roles
    ///
    /// If any of the filtering options (server, database, table, etc.) are
    /// given, only matching privileges are shown.
    #[clap(visible_aliases = ["show", "ls"])]
    List {
        /// Roles to show; all roles when empty
        roles: Vec<String>,
        /// Only show roles matching this regular expression
        #[clap(short = 'm', long = "match")]
        pattern: Option<String>,
        /// Only show roles of this group
        #[clap(short, long)]
        group: Option<String>,
        #[clap(flatten)]
        filter: PrivilegeArgs,
    },
    /// Grant privileges to a role
    ///
    /// Privileges are given as options or as Sentry-style specifications such
    /// as 'db=db4->table=mytable->action=insert'. A specification overrides
    /// the options, which fill in whatever it leaves out.
    #[clap(visible_aliases = ["add", "create"])]
    Grant {
        /// Role name
        #[clap(short, long)]
        role: Option<String>,
        /// [ROLE] [SPEC...]
        args: Vec<String>,
        #[clap(flatten)]
        template: PrivilegeArgs,
        /// Set the grant option to 'unset'
        #[clap(long)]
        unsetgrant: bool,
    },
    /// Revoke privileges from a role
    #[clap(visible_aliases = ["remove", "delete", "rm"])]
    Revoke {
        /// Role name
        #[clap(short, long)]
        role: Option<String>,
        /// [ROLE] [SPEC...]
        args: Vec<String>,
        #[clap(flatten)]
        template: PrivilegeArgs,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum PolicyCommand {
    /// Create roles, grant groups and grant privileges from a policy file
    Import {
        /// Policy file to read
        file: PathBuf,
    },
    /// Write roles, groups and privileges as a policy file
    Export {
        /// Write to this file instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

/// Privilege fields given as options.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct PrivilegeArgs {
    /// Action
    #[clap(short, long)]
    pub(crate) action: Option<String>,
    /// Server name
    #[clap(short, long)]
    pub(crate) server: Option<String>,
    /// Database name
    #[clap(short, long)]
    pub(crate) database: Option<String>,
    /// Table name
    #[clap(short, long)]
    pub(crate) table: Option<String>,
    /// Column name
    #[clap(short, long)]
    pub(crate) column: Option<String>,
    /// URI
    #[clap(short, long)]
    pub(crate) uri: Option<String>,
    /// Scope
    #[clap(long)]
    pub(crate) scope: Option<String>,
    /// Service name
    #[clap(long)]
    pub(crate) service: Option<String>,
    /// Grant option
    #[clap(long = "grantoption")]
    pub(crate) grant_option: bool,
}

impl From<&PrivilegeArgs> for Privilege {
    fn from(args: &PrivilegeArgs) -> Self {
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        Privilege {
            scope: field(&args.scope),
            server: field(&args.server),
            database: field(&args.database),
            table: field(&args.table),
            column: field(&args.column),
            uri: field(&args.uri),
            action: field(&args.action),
            service: field(&args.service),
            grant_option: args.grant_option,
            unset_grant_option: false,
        }
    }
}
