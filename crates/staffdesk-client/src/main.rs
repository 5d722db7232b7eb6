//! `staffdesk` command line client
//!
//! Lists, reviews and edits dashboard records against the REST API using the
//! same collection, view and transition machinery as the dashboard itself.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use staffdesk_client::{HttpGateway, render};
use staffdesk_core::{
    Config, Employee, Error, Portal, Record, RecordId, Result, Task, TaskStatus, WorkLog,
    WorkLogStatus,
};
use staffdesk_records::{Collection, Predicate, SortSpec, ViewQuery};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Command line interface for the staffdesk dashboard
#[derive(Parser)]
#[command(
    name = "staffdesk",
    version = env!("CARGO_PKG_VERSION"),
    about = "Employee dashboard client",
    long_about = "Review work logs, update tasks and browse employees from the command line."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long)]
    log_format: Option<String>,

    /// Portal to act as (admin, employee)
    #[arg(long, value_parser = parse_portal)]
    portal: Option<Portal>,

    /// Bearer token for the API
    #[arg(long, env = "STAFFDESK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Work log review
    Worklogs {
        /// Work log action
        #[command(subcommand)]
        action: WorkLogCommands,
    },

    /// Task management
    Tasks {
        /// Task action
        #[command(subcommand)]
        action: TaskCommands,
    },

    /// Employee directory
    Employees {
        /// Employee action
        #[command(subcommand)]
        action: EmployeeCommands,
    },

    /// Show or validate configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,
    },
}

/// Paging and sorting shared by every list command
#[derive(Args)]
struct ListArgs {
    /// Case-insensitive search text
    #[arg(short, long)]
    search: Option<String>,

    /// Page number, starting at 1
    #[arg(short, long, default_value = "1")]
    page: i64,

    /// Rows per page (defaults to the configured size)
    #[arg(long)]
    page_size: Option<i64>,

    /// Field to sort by
    #[arg(long)]
    sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    desc: bool,
}

/// Work log commands
#[derive(Subcommand)]
enum WorkLogCommands {
    /// List work logs
    List {
        /// Paging and sorting
        #[command(flatten)]
        list: ListArgs,

        /// Only logs with this status
        #[arg(long)]
        status: Option<String>,

        /// Only logs of this employee
        #[arg(long)]
        employee: Option<String>,

        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Latest date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Approve one or more work logs
    Approve {
        /// Work log ids
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,
    },

    /// Reject one or more work logs
    Reject {
        /// Work log ids
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,
    },

    /// Delete a work log
    Delete {
        /// Work log id
        #[arg(value_name = "ID")]
        id: String,
    },
}

/// Task commands
#[derive(Subcommand)]
enum TaskCommands {
    /// List tasks
    List {
        /// Paging and sorting
        #[command(flatten)]
        list: ListArgs,

        /// Only tasks with this status
        #[arg(long)]
        status: Option<String>,

        /// Only tasks assigned to this employee
        #[arg(long)]
        assignee: Option<String>,
    },

    /// Change the status of a task
    Status {
        /// Task id
        #[arg(value_name = "ID")]
        id: String,

        /// New status (pending, in-progress, completed)
        #[arg(value_name = "STATUS")]
        status: String,
    },
}

/// Employee commands
#[derive(Subcommand)]
enum EmployeeCommands {
    /// List employees
    List {
        /// Paging and sorting
        #[command(flatten)]
        list: ListArgs,

        /// Only employees of this department
        #[arg(long)]
        department: Option<String>,
    },
}

fn parse_portal(value: &str) -> std::result::Result<Portal, String> {
    match value.to_ascii_lowercase().as_str() {
        "admin" => Ok(Portal::Admin),
        "employee" => Ok(Portal::Employee),
        other => Err(format!("unknown portal '{other}' (expected admin or employee)")),
    }
}

/// Main entry point for the command line client
///
/// # Errors
///
/// Returns error if configuration, logging or the requested command fails
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    staffdesk_core::init_logging(&config.logging)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        portal = %config.api.portal,
        base_url = %config.api.base_url,
        "staffdesk client starting"
    );

    let result = match cli.command {
        Commands::Worklogs { action } => handle_worklogs(action, &config).await,
        Commands::Tasks { action } => handle_tasks(action, &config).await,
        Commands::Employees { action } => handle_employees(action, &config).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(err) = &result {
        error!(error = %err, "Command failed");
        eprintln!("{}", err.user_message());
    }
    result
}

/// Load configuration and apply command line overrides
///
/// # Errors
///
/// Returns error if the configuration cannot be read, parsed or validated
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if let Some(format) = &cli.log_format {
        config.logging.format.clone_from(format);
    }
    if let Some(portal) = cli.portal {
        config.api.portal = portal;
    }
    if cli.token.is_some() {
        config.api.token.clone_from(&cli.token);
    }

    config.validate()?;
    Ok(config)
}

fn gateway(config: &Config) -> Result<Arc<HttpGateway>> {
    HttpGateway::new(&config.api).map(Arc::new)
}

/// Build a view query from the shared list arguments
fn base_query<R: Record>(list: &ListArgs, config: &Config, search_fields: &[&str]) -> ViewQuery<R> {
    let page_size = list
        .page_size
        .unwrap_or_else(|| i64::from(config.view.page_size));
    let mut query = ViewQuery::new(page_size).page(list.page);

    if let Some(text) = &list.search {
        query = query.filter(Predicate::search(text.as_str(), search_fields));
    }
    if let Some(field) = &list.sort {
        query = query.sort_by(if list.desc {
            SortSpec::descending(field.as_str())
        } else {
            SortSpec::ascending(field.as_str())
        });
    }
    query
}

fn record_ids(ids: Vec<String>) -> Vec<RecordId> {
    ids.into_iter().map(RecordId::from).collect()
}

/// Handle work log commands
///
/// # Errors
///
/// Returns error if the API call or the transition fails
async fn handle_worklogs(action: WorkLogCommands, config: &Config) -> Result<()> {
    let logs: Collection<WorkLog, HttpGateway> = Collection::new(gateway(config)?);
    logs.load().await?;

    match action {
        WorkLogCommands::List {
            list,
            status,
            employee,
            from,
            to,
        } => {
            let mut query = base_query(
                &list,
                config,
                &["employee_name", "project", "first_half", "second_half"],
            );
            if let Some(status) = status {
                query = query.filter(Predicate::Status(status.parse::<WorkLogStatus>()?));
            }
            if let Some(employee) = employee {
                query = query.filter(Predicate::equals("employee", employee));
            }
            if from.is_some() || to.is_some() {
                query = query.filter(Predicate::DateRange {
                    field: "date".to_string(),
                    from,
                    to,
                });
            }
            println!("{}", render::worklogs(&logs.view(&query)?));
            Ok(())
        }
        WorkLogCommands::Approve { ids } => {
            review(&logs, record_ids(ids), WorkLogStatus::Approved).await
        }
        WorkLogCommands::Reject { ids } => {
            review(&logs, record_ids(ids), WorkLogStatus::Rejected).await
        }
        WorkLogCommands::Delete { id } => {
            let removed = logs.delete(&RecordId::from(id)).await?;
            println!("Deleted work log {} ({})", removed.id, removed.date);
            Ok(())
        }
    }
}

/// Approve or reject work logs, one request per selection
///
/// # Errors
///
/// Returns error if any id is unknown or the server rejects the change
async fn review(
    logs: &Collection<WorkLog, HttpGateway>,
    ids: Vec<RecordId>,
    target: WorkLogStatus,
) -> Result<()> {
    let updated = if let [id] = ids.as_slice() {
        vec![logs.transition(id, target).await?]
    } else {
        logs.bulk_transition(&ids, target).await?
    };

    for log in &updated {
        println!("{} -> {}", log.id, log.status);
    }
    Ok(())
}

/// Handle task commands
///
/// # Errors
///
/// Returns error if the API call or the transition fails
async fn handle_tasks(action: TaskCommands, config: &Config) -> Result<()> {
    let tasks: Collection<Task, HttpGateway> = Collection::new(gateway(config)?);
    tasks.load().await?;

    match action {
        TaskCommands::List {
            list,
            status,
            assignee,
        } => {
            let mut query = base_query(&list, config, &["title", "description"]);
            if let Some(status) = status {
                query = query.filter(Predicate::Status(status.parse::<TaskStatus>()?));
            }
            if let Some(assignee) = assignee {
                query = query.filter(Predicate::member("assigned_to", assignee));
            }
            println!("{}", render::tasks(&tasks.view(&query)?));
            Ok(())
        }
        TaskCommands::Status { id, status } => {
            let target = status.parse::<TaskStatus>()?;
            let task = tasks.transition(&RecordId::from(id), target).await?;
            println!("{} -> {}", task.id, task.status);
            Ok(())
        }
    }
}

/// Handle employee commands
///
/// # Errors
///
/// Returns error if the API call fails
async fn handle_employees(action: EmployeeCommands, config: &Config) -> Result<()> {
    if config.api.portal != Portal::Admin {
        return Err(Error::config("The employee directory requires the admin portal"));
    }
    let employees: Collection<Employee, HttpGateway> = Collection::new(gateway(config)?);
    employees.load().await?;

    match action {
        EmployeeCommands::List { list, department } => {
            let mut query = base_query(&list, config, &["name", "email", "designation"]);
            if let Some(department) = department {
                query = query.filter(Predicate::equals("department", department));
            }
            println!("{}", render::employees(&employees.view(&query)?));
            Ok(())
        }
    }
}

/// Show configuration as TOML
///
/// # Errors
///
/// Returns error if configuration cannot be serialized
fn handle_config_command(config: &Config, show: bool) -> Result<()> {
    if show {
        let config_toml = toml::to_string_pretty(config)
            .map_err(|e| Error::config(format!("Failed to serialize configuration: {e}")))?;
        println!("{config_toml}");
    } else {
        println!("Configuration is valid");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bulk_approve() {
        let cli = Cli::try_parse_from(["staffdesk", "--portal", "admin", "worklogs", "approve", "a", "b"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Worklogs {
                action: WorkLogCommands::Approve { ids }
            }) if ids == ["a", "b"]
        ));
    }

    #[test]
    fn test_portal_parser() {
        assert_eq!(parse_portal("ADMIN"), Ok(Portal::Admin));
        assert!(parse_portal("guest").is_err());
    }
}
