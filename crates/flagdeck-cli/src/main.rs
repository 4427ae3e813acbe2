//! Flagdeck CLI - feature flag lifecycle management

use clap::{Parser, Subcommand};
use flagdeck_core::config::Config;
use flagdeck_core::domain::flag::{FlagManager, FlagType};
use flagdeck_core::storage::{Database, DatabaseConfig};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "flagdeck")]
#[command(author, version, about = "Feature flag lifecycle management", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Acting user ID recorded in the audit trail
    #[arg(long, global = true, default_value = "00000000-0000-0000-0000-000000000000")]
    actor: Uuid,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage flags
    Flags {
        #[command(subcommand)]
        action: FlagAction,
    },

    /// Manage flag revisions
    Revisions {
        #[command(subcommand)]
        action: RevisionAction,
    },

    /// Toggle an environment on or off
    Toggle {
        /// Flag ID
        flag_id: Uuid,
        /// Environment name
        environment: String,
    },

    /// Audit trail operations
    Audit {
        #[command(subcommand)]
        action: AuditAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum FlagAction {
    /// Create a new flag
    Create {
        /// Flag name
        name: String,
        /// Organization ID
        #[arg(short, long)]
        org: Uuid,
        /// Value type (boolean, json, string, number)
        #[arg(short = 't', long, default_value = "boolean")]
        flag_type: String,
        /// Default value served when no revision is live
        #[arg(short, long, default_value = "false")]
        default_value: String,
        /// Environment names (repeatable)
        #[arg(short, long = "env", required = true)]
        environments: Vec<String>,
    },
    /// List flags for an organization
    List {
        /// Organization ID
        #[arg(short, long)]
        org: Uuid,
        /// Maximum number of flags to show
        #[arg(short, long)]
        limit: Option<i32>,
    },
    /// Show flag details
    Show {
        /// Flag ID
        flag_id: Uuid,
    },
    /// Soft-delete a flag
    Delete {
        /// Flag ID
        flag_id: Uuid,
    },
}

#[derive(Subcommand)]
enum RevisionAction {
    /// Add a draft revision
    Draft {
        /// Flag ID
        flag_id: Uuid,
        /// Default value for the revision
        #[arg(short, long)]
        default_value: String,
    },
    /// Approve a draft revision, making it live
    Approve {
        /// Flag ID
        flag_id: Uuid,
        /// Revision ID
        revision_id: Uuid,
    },
    /// Roll the live revision back one step
    Rollback {
        /// Flag ID
        flag_id: Uuid,
    },
    /// List a flag's revision timeline
    List {
        /// Flag ID
        flag_id: Uuid,
    },
}

#[derive(Subcommand)]
enum AuditAction {
    /// Show the audit trail for a flag
    Show {
        /// Flag ID
        flag_id: Uuid,
    },
    /// Delete audit events older than the retention window
    Prune {
        /// Override the configured retention in days
        #[arg(long)]
        days: Option<i64>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("flagdeck=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Lazily open the database only for commands that need it
    let open_db = || async {
        let config = Config::load()?;
        let db_config = DatabaseConfig::with_path(config.database_path())
            .max_connections(config.storage.max_connections);
        Database::new(db_config).await
    };

    match cli.command {
        Commands::Flags { action } => {
            let db = open_db().await?;
            cmd_flags(&db, action, cli.actor, cli.quiet).await
        }

        Commands::Revisions { action } => {
            let db = open_db().await?;
            cmd_revisions(&db, action, cli.actor, cli.quiet).await
        }

        Commands::Toggle {
            flag_id,
            environment,
        } => {
            let db = open_db().await?;
            cmd_toggle(&db, flag_id, &environment, cli.actor, cli.quiet).await
        }

        Commands::Audit { action } => {
            let db = open_db().await?;
            cmd_audit(&db, action, cli.quiet).await
        }

        Commands::Config { action } => cmd_config(action, cli.quiet),

        Commands::Doctor => cmd_doctor(cli.quiet).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_flags(
    db: &Database,
    action: FlagAction,
    actor: Uuid,
    quiet: bool,
) -> anyhow::Result<()> {
    let manager = FlagManager::new(db.pool().clone());

    match action {
        FlagAction::Create {
            name,
            org,
            flag_type,
            default_value,
            environments,
        } => {
            let flag_type = FlagType::from_str(&flag_type).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid flag type '{}'. Valid types: boolean, json, string, number",
                    flag_type
                )
            })?;

            let flag = manager
                .create_flag(name, flag_type, default_value, vec![], environments, org, actor)
                .await?;

            if !quiet {
                println!("Flag created successfully!");
                println!("  ID: {}", flag.id);
                println!("  Name: {}", flag.name);
                println!("  Type: {}", flag.flag_type);
                println!(
                    "  Environments: {}",
                    flag.environments
                        .iter()
                        .map(|e| e.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                println!("\nNext steps:");
                println!("  1. Run `flagdeck revisions draft {} -d <value>` to stage a change", flag.id);
                println!("  2. Run `flagdeck revisions approve {} <revision-id>` to ship it", flag.id);
            }
        }
        FlagAction::List { org, limit } => {
            let flags = manager.list_by_org(org, limit).await?;
            if flags.is_empty() {
                if !quiet {
                    println!("No flags found.");
                    println!("\nCreate one with: flagdeck flags create <name> --org <org-id> --env <env>");
                }
            } else {
                if !quiet {
                    println!("Flags:");
                }
                for f in flags {
                    println!("  {} - {} ({}) v{}", f.id, f.name, f.flag_type, f.version);
                }
            }
        }
        FlagAction::Show { flag_id } => {
            let flag = manager.get(flag_id).await?;
            println!("Flag: {}", flag.name);
            println!("  ID: {}", flag.id);
            println!("  Type: {}", flag.flag_type);
            println!("  Default: {}", flag.default_value);
            println!("  Version: {}", flag.version);
            println!("  Environments:");
            for env in &flag.environments {
                let state = if env.is_enabled { "on" } else { "off" };
                println!("    {} [{}]", env.name, state);
            }
            match flag.live_revision() {
                Some(revision) => println!("  Live revision: {}", revision.id),
                None => println!("  Live revision: none (serving flag default)"),
            }
            println!("  Created: {}", flag.created_at.format("%Y-%m-%d %H:%M:%S"));
            println!("  Updated: {}", flag.updated_at.format("%Y-%m-%d %H:%M:%S"));
        }
        FlagAction::Delete { flag_id } => {
            manager.soft_delete(flag_id, actor).await?;
            if !quiet {
                println!("Flag '{}' deleted.", flag_id);
            }
        }
    }
    Ok(())
}

async fn cmd_revisions(
    db: &Database,
    action: RevisionAction,
    actor: Uuid,
    quiet: bool,
) -> anyhow::Result<()> {
    let manager = FlagManager::new(db.pool().clone());

    match action {
        RevisionAction::Draft {
            flag_id,
            default_value,
        } => {
            let revision = manager
                .create_draft(flag_id, default_value, vec![], actor)
                .await?;
            if !quiet {
                println!("Draft revision created: {}", revision.id);
                println!("Approve it with: flagdeck revisions approve {} {}", flag_id, revision.id);
            }
        }
        RevisionAction::Approve {
            flag_id,
            revision_id,
        } => {
            let flag = manager.approve_revision(flag_id, revision_id, actor).await?;
            if !quiet {
                println!("Revision {} is now live.", revision_id);
                println!("Flag version: {}", flag.version);
            }
        }
        RevisionAction::Rollback { flag_id } => {
            let restored = manager.rollback(flag_id, actor).await?;
            if !quiet {
                match restored {
                    Some(revision) => println!("Rolled back; revision {} is live again.", revision.id),
                    None => println!("Rolled back; no revision is live (serving flag default)."),
                }
            }
        }
        RevisionAction::List { flag_id } => {
            let flag = manager.get(flag_id).await?;
            if flag.revisions.is_empty() {
                if !quiet {
                    println!("No revisions yet.");
                }
            } else {
                if !quiet {
                    println!("Revisions for '{}':", flag.name);
                }
                for revision in &flag.revisions {
                    println!(
                        "  {} [{}] default={} created {}",
                        revision.id,
                        revision.status,
                        revision.default_value,
                        revision.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
        }
    }
    Ok(())
}

async fn cmd_toggle(
    db: &Database,
    flag_id: Uuid,
    environment: &str,
    actor: Uuid,
    quiet: bool,
) -> anyhow::Result<()> {
    let manager = FlagManager::new(db.pool().clone());
    let flag = manager.toggle_environment(flag_id, environment, actor).await?;

    if !quiet {
        match flag.environment(environment) {
            Some(env) => {
                let state = if env.is_enabled { "on" } else { "off" };
                println!("Environment '{}' is now {}.", env.name, state);
            }
            None => {
                println!(
                    "Flag '{}' has no environment named '{}'; nothing changed.",
                    flag.name, environment
                );
            }
        }
    }
    Ok(())
}

async fn cmd_audit(db: &Database, action: AuditAction, quiet: bool) -> anyhow::Result<()> {
    let manager = FlagManager::new(db.pool().clone());

    match action {
        AuditAction::Show { flag_id } => {
            let events = manager.audit_trail(flag_id).await?;
            if events.is_empty() {
                if !quiet {
                    println!("No audit events recorded.");
                }
            } else {
                if !quiet {
                    println!("Audit trail:");
                }
                for event in events {
                    let detail = event
                        .data
                        .as_ref()
                        .map(|d| format!(" {}", d))
                        .unwrap_or_default();
                    println!(
                        "  {} {} by {}{}",
                        event.created_at.format("%Y-%m-%d %H:%M:%S"),
                        event.kind,
                        event.actor_id,
                        detail
                    );
                }
            }
        }
        AuditAction::Prune { days } => {
            let config = Config::load()?;
            let days = days.unwrap_or(config.audit.retention_days);
            if days < 1 {
                return Err(anyhow::anyhow!("--days must be at least 1, got {}", days));
            }
            let removed = manager.recorder().delete_older_than(days).await?;
            if !quiet {
                println!("Removed {} audit events older than {} days.", removed, days);
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Flagdeck Health Check");
        println!("=====================");
        println!();
    }

    let mut all_ok = true;

    // Check configuration
    match Config::load() {
        Ok(_) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {}", e);
            }
        }
    }

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) => {
                if path.exists() {
                    println!("[OK] Config file: {}", path.display());
                } else {
                    println!("[--] Config file: {} (using defaults)", path.display());
                }
            }
            Err(e) => {
                println!("[!!] Config file: Error - {}", e);
            }
        }
    }

    // Check database
    match Config::load() {
        Ok(config) => {
            let db_config = DatabaseConfig::with_path(config.database_path())
                .max_connections(config.storage.max_connections);
            match Database::new(db_config).await {
                Ok(db) => match db.health_check().await {
                    Ok(()) => {
                        if !quiet {
                            println!("[OK] Database: Connected");
                            println!("     Path: {}", db.path().display());

                            match db.migration_status().await {
                                Ok(status) => {
                                    if status.needs_migration {
                                        println!(
                                            "[!!] Database: Migrations pending (v{} -> v{})",
                                            status.current_version, status.target_version
                                        );
                                    } else {
                                        println!("[OK] Database: Schema v{}", status.current_version);
                                    }
                                }
                                Err(e) => {
                                    println!("[!!] Database: Migration check failed - {}", e);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        all_ok = false;
                        if !quiet {
                            println!("[!!] Database: Health check failed - {}", e);
                        }
                    }
                },
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] Database: Failed to initialize - {}", e);
                    }
                }
            }
        }
        Err(_) => {
            // Already reported above
        }
    }

    // Summary
    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}
