//! # Workflow Rules Inspector
//!
//! Command-line tool for operators: validates the recorder configuration and
//! prints the workflow rules table as seen by a given status or role.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use recorder_workflow::config::ConfigManager;
use recorder_workflow::logging::init_structured_logging;
use recorder_workflow::models::WorkflowUser;
use recorder_workflow::services::dto::{map_commands, CommandDto};
use recorder_workflow::state_machine::{TransactionStatus, WorkflowRole, WorkflowRules};
use std::path::PathBuf;
use std::process;
use tracing::error;

#[derive(Parser)]
#[command(name = "workflow-rules")]
#[command(about = "Inspect recorder workflow rules and configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to load (development, test, production)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate configuration
    Validate,

    /// Print every row of the rules table
    Rules,

    /// Commands a role can issue on any status
    Role {
        /// Role name, e.g. control_desk
        role: WorkflowRole,
    },

    /// Commands available on a status for a set of roles
    Commands {
        /// Transaction status, e.g. on_sign
        #[arg(short, long)]
        status: TransactionStatus,

        /// Roles held by the user
        #[arg(short, long = "role", required = true)]
        roles: Vec<WorkflowRole>,
    },

    /// Report non-terminal statuses with no way out
    Lint,
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Validate) | None => validate_config(&cli),
        Some(Commands::Rules) => print_rules(&cli),
        Some(Commands::Role { role }) => print_role(&cli, *role),
        Some(Commands::Commands { status, roles }) => print_commands(&cli, *status, roles),
        Some(Commands::Lint) => lint_rules(),
    };

    if let Err(e) = result {
        error!("workflow-rules failed: {e:#}");
        eprintln!("❌ {e:#}");
        process::exit(1);
    }
}

fn validate_config(cli: &Cli) -> anyhow::Result<()> {
    let manager =
        ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment)
            .with_context(|| format!("loading configuration for '{}'", cli.environment))?;
    init_structured_logging(&manager.config().logging);

    println!("✅ Configuration valid");
    println!("Environment: {}", manager.environment());
    println!("Directory: {}", manager.config_directory().display());
    println!(
        "{}",
        serde_json::to_string_pretty(&manager.config().sanitized())?
    );
    Ok(())
}

fn print_rules(cli: &Cli) -> anyhow::Result<()> {
    let rules = WorkflowRules::default();

    if cli.format == "json" {
        let rows: Vec<serde_json::Value> = rules
            .rules()
            .iter()
            .map(|rule| {
                serde_json::json!({
                    "command": rule.command,
                    "from": rule.from,
                    "targets": rule.targets,
                    "roles": rule.roles,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<22} {:<40} {:<40} ROLES", "COMMAND", "FROM", "TO");
    for rule in rules.rules() {
        println!(
            "{:<22} {:<40} {:<40} {}",
            rule.command.name(),
            join(rule.from),
            join(rule.targets),
            join(rule.roles)
        );
    }
    Ok(())
}

fn print_role(cli: &Cli, role: WorkflowRole) -> anyhow::Result<()> {
    let commands = map_commands(&WorkflowRules::default().commands_for_role(role));
    print_command_list(cli, &commands)
}

fn print_commands(
    cli: &Cli,
    status: TransactionStatus,
    roles: &[WorkflowRole],
) -> anyhow::Result<()> {
    let user = WorkflowUser::new(0, "operator").with_roles(roles.iter().copied());
    let commands = map_commands(&WorkflowRules::default().commands_for(status, &user));
    print_command_list(cli, &commands)
}

fn lint_rules() -> anyhow::Result<()> {
    let rules = WorkflowRules::default();
    let stuck: Vec<TransactionStatus> = TransactionStatus::ALL
        .iter()
        .copied()
        .filter(|status| !status.is_terminal())
        .filter(|status| {
            !WorkflowRole::ALL
                .iter()
                .any(|role| rules.has_transition(*status, *role))
        })
        .collect();

    if !stuck.is_empty() {
        bail!("statuses without outgoing commands: {}", join(&stuck));
    }
    println!("✅ Every non-terminal status has an outgoing command");
    Ok(())
}

fn print_command_list(cli: &Cli, commands: &[CommandDto]) -> anyhow::Result<()> {
    if cli.format == "json" {
        println!("{}", serde_json::to_string_pretty(commands)?);
        return Ok(());
    }

    if commands.is_empty() {
        println!("(no commands)");
    }
    for command in commands {
        let targets: Vec<&str> = command
            .next_statuses
            .iter()
            .map(|status| status.name.as_str())
            .collect();
        println!("{:<22} -> {}", command.name, targets.join(", "));
    }
    Ok(())
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
