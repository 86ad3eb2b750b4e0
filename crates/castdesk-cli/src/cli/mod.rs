//! CLI entry and dispatch.

use anyhow::{Context, Result};
use castdesk_core::Console;
use castdesk_core::config::Config;
use castdesk_core::entities::EntityId;
use castdesk_core::guard::GuardDecision;
use castdesk_core::session::{Hydration, SESSION_EXPIRED};
use clap::Parser;
use tracing::debug;

use crate::logging;

mod commands;
mod render;

pub const NOT_LOGGED_IN: &str = "Not logged in. Run `castdesk login` first.";

#[derive(Parser)]
#[command(name = "castdesk")]
#[command(version)]
#[command(about = "Operator console for the castdesk broadcast CRM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with an admin account
    Login {
        /// Read from stdin when omitted
        #[arg(short, long)]
        username: Option<String>,
        /// Read from stdin when omitted
        #[arg(long, env = "CASTDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Create an admin account (does not log in)
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(long, env = "CASTDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Show who is logged in and when the session expires
    Status,

    /// Manage customers
    Customers {
        #[command(subcommand)]
        command: ResourceCommands,
    },
    /// Manage broadcasts
    Broadcasts {
        #[command(subcommand)]
        command: BroadcastCommands,
    },
    /// Manage message templates
    Templates {
        #[command(subcommand)]
        command: ResourceCommands,
    },
    /// Manage admin accounts
    Admins {
        #[command(subcommand)]
        command: ResourceCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// List filters shared by every resource.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long)]
    pub status: Option<String>,
    /// Tags (customer levels for customers); repeat or comma-separate
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,
    /// Range start (YYYY-MM-DD or RFC 3339)
    #[arg(long, requires = "to")]
    pub from: Option<String>,
    /// Range end, inclusive of the whole day when given as YYYY-MM-DD
    #[arg(long, requires = "from")]
    pub to: Option<String>,
    /// Free-text filter
    #[arg(long)]
    pub filter: Option<String>,
    /// Print raw JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum ResourceCommands {
    /// List one page
    List(ListArgs),
    /// Show one record
    Show {
        id: EntityId,
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a record from a JSON payload
    Create {
        #[arg(long, value_name = "JSON")]
        data: String,
    },
    /// Update a record with a partial JSON payload
    Update {
        id: EntityId,
        #[arg(long, value_name = "JSON")]
        data: String,
    },
    /// Delete a record
    Delete { id: EntityId },
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum BroadcastCommands {
    #[command(flatten)]
    Common(ResourceCommands),
    /// List the tags offered by the broadcast filter
    Tags,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Persist the API base URL
    SetBaseUrl { url: String },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("load config")?;
    let _log_guard = logging::init(&config.log);

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli, &config).await })
}

async fn dispatch(cli: Cli, config: &Config) -> Result<()> {
    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetBaseUrl { url } => commands::config::set_base_url(&url),
        },

        Commands::Login { username, password } => {
            let console = Console::from_config(config)?;
            commands::auth::login(&console, username, password).await
        }
        Commands::Logout => {
            let console = Console::from_config(config)?;
            commands::auth::logout(&console);
            Ok(())
        }
        Commands::Register {
            email,
            username,
            password,
        } => {
            let console = Console::from_config(config)?;
            commands::auth::register(&console, &email, &username, password).await
        }
        Commands::Status => {
            let console = Console::from_config(config)?;
            commands::auth::status(&console);
            Ok(())
        }

        Commands::Customers { command } => {
            let console = protected(config)?;
            let _guard = console.mount_guard();
            let result = commands::resources::run(&console.customers, command, &console.ui).await;
            render::flush(&console.ui);
            result
        }
        Commands::Broadcasts { command } => {
            let console = protected(config)?;
            let _guard = console.mount_guard();
            let result = match command {
                BroadcastCommands::Common(command) => {
                    commands::resources::run(&console.broadcasts, command, &console.ui).await
                }
                BroadcastCommands::Tags => commands::resources::broadcast_tags(&console).await,
            };
            render::flush(&console.ui);
            result
        }
        Commands::Templates { command } => {
            let console = protected(config)?;
            let _guard = console.mount_guard();
            let result = commands::resources::run(&console.templates, command, &console.ui).await;
            render::flush(&console.ui);
            result
        }
        Commands::Admins { command } => {
            let console = protected(config)?;
            let _guard = console.mount_guard();
            let result = commands::resources::run(&console.admins, command, &console.ui).await;
            render::flush(&console.ui);
            result
        }
    }
}

/// Builds a console and applies the route guard to the restored session.
fn protected(config: &Config) -> Result<Console> {
    let console = Console::from_config(config)?;
    if console.hydrate() == Hydration::Expired {
        eprintln!("{SESSION_EXPIRED}.");
    }
    match console.decide() {
        GuardDecision::Admit => Ok(console),
        decision @ (GuardDecision::Wait | GuardDecision::Redirect { .. }) => {
            debug!(?decision, "protected command refused");
            anyhow::bail!(NOT_LOGGED_IN)
        }
    }
}
