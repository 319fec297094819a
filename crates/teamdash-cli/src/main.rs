//! teamdash CLI
//!
//! Command-line interface for teamdash - servers, IPs and domains for teams.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing_subscriber::EnvFilter;

use teamdash_core::{Config, Dashboard, DashboardError, Notice};

mod commands;
mod output;
mod prompt;
mod resolve;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "teamdash")]
#[command(about = "teamdash - Track your team's servers, IPs and domains")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and the local database
    Init,
    /// Manage servers
    Server {
        #[command(subcommand)]
        command: ServerCommands,
    },
    /// Manage IPs bound to a server
    Ip {
        #[command(subcommand)]
        command: IpCommands,
    },
    /// Manage domains bound to an IP
    Domains {
        #[command(subcommand)]
        command: DomainsCommands,
    },
    /// Manage team members
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Show dashboard statistics
    Stats,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ServerCommands {
    /// List servers
    #[command(alias = "ls")]
    List {
        /// Filter by name, main IP or assigned user
        #[arg(short, long)]
        search: Option<String>,
        /// Sort column (name, main-ip, status, user, ips, domains)
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
        /// Page to show
        #[arg(short, long, default_value_t = 1)]
        page: usize,
        /// Servers per page (defaults to page_size from config)
        #[arg(long)]
        page_size: Option<usize>,
        /// Show every matching server on one page
        #[arg(long, conflicts_with_all = ["page", "page_size"])]
        all: bool,
    },
    /// Show server details with IPs and domains
    Show {
        /// Server ID (full, prefix) or name
        server: String,
    },
    /// Add a server
    #[command(alias = "create")]
    Add {
        /// Server name
        name: String,
        /// Main IP (defaults to 0.0.0.0)
        #[arg(long)]
        ip: Option<String>,
        /// Status (Production, Test, Down, Timed out)
        #[arg(short, long)]
        status: Option<String>,
        /// Assigned user (ID, prefix or name)
        #[arg(short, long)]
        user: Option<String>,
        /// Notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Edit server fields
    Edit {
        /// Server ID (full, prefix) or name
        server: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New main IP
        #[arg(long)]
        ip: Option<String>,
        /// New status
        #[arg(short, long)]
        status: Option<String>,
        /// Assigned user (ID, prefix or name; "none" to unassign)
        #[arg(short, long)]
        user: Option<String>,
        /// Notes ("" to clear)
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Change a server's status
    Status {
        /// Server ID (full, prefix) or name
        server: String,
        /// New status (Production, Test, Down, Timed out)
        status: String,
    },
    /// Delete a server with its IPs and domains
    #[command(alias = "rm")]
    Delete {
        /// Server ID (full, prefix) or name
        server: String,
    },
}

#[derive(Subcommand)]
enum IpCommands {
    /// Add one or more IPs to a server
    Add {
        /// Server ID (full, prefix) or name
        server: String,
        /// Addresses (space or comma separated)
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Remove an IP and its domains
    #[command(alias = "rm")]
    Delete {
        /// Server ID (full, prefix) or name
        server: String,
        /// IP address or IP ID
        ip: String,
    },
}

#[derive(Subcommand)]
enum DomainsCommands {
    /// Replace the domain list of an IP
    Set {
        /// Server ID (full, prefix) or name
        server: String,
        /// IP address or IP ID
        ip: String,
        /// Domains as name[:found|production]; none clears the list
        domains: Vec<String>,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users with their server counts
    #[command(alias = "ls")]
    List {
        /// Filter by name
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a user
    #[command(alias = "create")]
    Add {
        /// User name
        name: String,
    },
    /// Rename a user
    Edit {
        /// User ID (full, prefix) or name
        user: String,
        /// New name
        name: String,
    },
    /// Delete a user and unassign their servers
    #[command(alias = "rm")]
    Delete {
        /// User ID (full, prefix) or name
        user: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, backend, rest_url, api_key,
        /// request_timeout_secs, page_size, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work even when the config file is broken
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    if let Commands::Init = cli.command {
        return commands::init::run(&config, config_path, &output).await;
    }

    let mut dashboard = Dashboard::open(&config)?;
    let mut notices = dashboard
        .take_notices()
        .context("Notice receiver already taken")?;

    let result = match dashboard.refresh().await {
        Ok(()) => run_command(cli.command, &mut dashboard, &config, &output).await,
        Err(e) => Err(e.into()),
    };

    print_notices(&mut notices, &output);

    match result {
        // Already reported through a notice
        Err(e) if e.downcast_ref::<DashboardError>().is_some() => std::process::exit(1),
        other => other,
    }
}

async fn run_command(
    command: Commands,
    dashboard: &mut Dashboard,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        Commands::Server { command } => handle_server_command(command, dashboard, config, output).await,
        Commands::Ip { command } => handle_ip_command(command, dashboard, output).await,
        Commands::Domains { command } => handle_domains_command(command, dashboard, output).await,
        Commands::User { command } => handle_user_command(command, dashboard, output).await,
        Commands::Stats => commands::stats::show(dashboard, output),
        Commands::Init | Commands::Config { .. } => unreachable!(), // Handled in main
    }
}

async fn handle_server_command(
    command: ServerCommands,
    dashboard: &mut Dashboard,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        ServerCommands::List {
            search,
            sort,
            desc,
            page,
            page_size,
            all,
        } => {
            let query = commands::server::ListQuery {
                search,
                sort,
                desc,
                page,
                page_size: page_size.unwrap_or(config.page_size),
                all,
            };
            commands::server::list(dashboard, query, output)
        }
        ServerCommands::Show { server } => commands::server::show(dashboard, &server, output),
        ServerCommands::Add {
            name,
            ip,
            status,
            user,
            notes,
        } => {
            let fields = commands::server::ServerFields {
                name: Some(name),
                ip,
                status,
                user,
                notes,
            };
            commands::server::add(dashboard, fields, output).await
        }
        ServerCommands::Edit {
            server,
            name,
            ip,
            status,
            user,
            notes,
        } => {
            let fields = commands::server::ServerFields {
                name,
                ip,
                status,
                user,
                notes,
            };
            commands::server::edit(dashboard, &server, fields, output).await
        }
        ServerCommands::Status { server, status } => {
            commands::server::set_status(dashboard, &server, &status, output).await
        }
        ServerCommands::Delete { server } => commands::server::delete(dashboard, &server, output).await,
    }
}

async fn handle_ip_command(command: IpCommands, dashboard: &mut Dashboard, output: &Output) -> Result<()> {
    match command {
        IpCommands::Add { server, addresses } => {
            commands::ip::add(dashboard, &server, addresses, output).await
        }
        IpCommands::Delete { server, ip } => commands::ip::delete(dashboard, &server, &ip, output).await,
    }
}

async fn handle_domains_command(
    command: DomainsCommands,
    dashboard: &mut Dashboard,
    output: &Output,
) -> Result<()> {
    match command {
        DomainsCommands::Set { server, ip, domains } => {
            commands::domains::set(dashboard, &server, &ip, domains, output).await
        }
    }
}

async fn handle_user_command(command: UserCommands, dashboard: &mut Dashboard, output: &Output) -> Result<()> {
    match command {
        UserCommands::List { search } => commands::user::list(dashboard, search, output),
        UserCommands::Add { name } => commands::user::add(dashboard, &name, output).await,
        UserCommands::Edit { user, name } => commands::user::edit(dashboard, &user, &name, output).await,
        UserCommands::Delete { user } => commands::user::delete(dashboard, &user, output).await,
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Print every pending notice
fn print_notices(notices: &mut UnboundedReceiver<Notice>, output: &Output) {
    while let Ok(notice) = notices.try_recv() {
        output.notice(&notice);
    }
}

/// Initialize logging when TEAMDASH_LOG is set
///
/// Logs go to `log_file` when configured, otherwise to stderr.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("TEAMDASH_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "teamdash_core={},teamdash_cli={}",
        log_level, log_level
    ));

    match config.log_file {
        Some(ref log_path) => {
            let log_file = match File::create(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
                    return;
                }
            };
            // Ignore error if already initialized
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();
            info!("Logging initialized to {:?}", log_path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
