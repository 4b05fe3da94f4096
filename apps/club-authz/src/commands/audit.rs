// audit.rs — Audit subcommands: verify, tail.

use std::path::PathBuf;

use clap::Subcommand;
use club_audit::{AuditConfig, AuditError, JsonlAuditWriter};

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Verify the audit log hash chain integrity.
    Verify {
        /// Path to audit log (defaults to the configured path).
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Show recent audit entries.
    Tail {
        /// Path to audit log (defaults to the configured path).
        #[arg(long)]
        log: Option<PathBuf>,
        /// Number of entries to show.
        #[arg(short, default_value = "10")]
        n: usize,
    },
}

pub fn execute(cmd: &AuditCommands, config: &AuditConfig) -> anyhow::Result<()> {
    match cmd {
        AuditCommands::Verify { log } => {
            let path = log.clone().unwrap_or_else(|| config.path.clone());
            if !path.exists() {
                println!("No audit log found at {}", path.display());
                return Ok(());
            }

            match JsonlAuditWriter::verify_chain(&path) {
                Ok(count) => {
                    println!("Audit log verified: {} entry(ies), hash chain intact.", count);
                }
                Err(AuditError::IntegrityViolation {
                    line,
                    expected,
                    actual,
                }) => {
                    println!("INTEGRITY VIOLATION at line {}:", line);
                    println!("  Expected previous_hash: {}", expected);
                    println!("  Actual previous_hash:   {}", actual);
                    println!();
                    println!("The audit log may have been tampered with.");
                    anyhow::bail!("Audit log integrity check failed");
                }
                Err(e) => return Err(e.into()),
            }
        }

        AuditCommands::Tail { log, n } => {
            let path = log.clone().unwrap_or_else(|| config.path.clone());
            if !path.exists() {
                println!("No audit log found at {}", path.display());
                return Ok(());
            }

            let records = JsonlAuditWriter::read_all(&path)?;
            let start = records.len().saturating_sub(*n);
            let recent = &records[start..];

            if recent.is_empty() {
                println!("No audit entries.");
                return Ok(());
            }

            println!(
                "{:<20} {:<12} {:<20} {:<30} RESOURCE",
                "TIMESTAMP", "USER", "ACTION", "DECISION"
            );
            println!("{}", "-".repeat(100));

            for record in recent {
                let entry = &record.entry;
                println!(
                    "{:<20} {:<12} {:<20} {:<30} {}:{}@{}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.actor.user_id.as_str(),
                    entry.action.as_str(),
                    entry.decision.reason_code.as_str(),
                    entry.resource.resource_type,
                    entry.resource.id,
                    entry.resource.organization_id,
                );
            }
        }
    }

    Ok(())
}
