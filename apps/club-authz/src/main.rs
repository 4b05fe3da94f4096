//! # club-authz
//!
//! Command-line interface over the club authorization core:
//! - `club-authz roles` — print the role → capability table
//! - `club-authz resolve <ROLE>...` — resolve a role list into capabilities
//! - `club-authz check ...` — evaluate one policy decision, auditing on allow
//! - `club-authz audit verify/tail` — inspect the tamper-evident audit trail

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use club_audit::AuditConfig;
use tracing_subscriber::EnvFilter;

/// Club authorization CLI — inspect roles, decisions and the audit trail.
#[derive(Parser)]
#[command(name = "club-authz", version, about)]
struct Cli {
    /// Config file holding the `[audit]` table (optional).
    #[arg(long, global = true, default_value = "club-authz.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every role and the capabilities it grants.
    Roles {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
        /// Only list roles that grant this capability token.
        #[arg(long)]
        capability: Option<String>,
    },
    /// Resolve role names into a deduplicated capability list (JSON).
    Resolve {
        /// Role names; unknown names are ignored.
        roles: Vec<String>,
    },
    /// Evaluate a policy decision for one actor, action and resource.
    Check(commands::check::CheckArgs),
    /// Inspect the audit trail.
    Audit {
        #[command(subcommand)]
        command: commands::audit::AuditCommands,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("club_authz=info".parse()?)
                .add_directive("club_audit=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config = AuditConfig::load_or_default(&cli.config)?;
    tracing::debug!(sink = ?config.sink, path = %config.path.display(), "audit config");

    match &cli.command {
        Commands::Roles { json, capability } => {
            commands::roles::execute_roles(*json, capability.as_deref())
        }
        Commands::Resolve { roles } => commands::roles::execute_resolve(roles),
        Commands::Check(args) => commands::check::execute(args, &config),
        Commands::Audit { command } => commands::audit::execute(command, &config),
    }
}
