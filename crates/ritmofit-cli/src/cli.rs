use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "ritmofit")]
#[command(about = "RitmoFit client: class notifications from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the config file (defaults to ./ritmofit.toml when present)
    #[arg(short, long, global = true, env = "RITMOFIT_CONFIG")]
    pub config: Option<String>,

    /// API base URL (overrides config and RITMOFIT__API__BASE_URL)
    #[arg(short, long, global = true, env = "RITMOFIT_URL")]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store the signed-in user and API token
    Login(LoginArgs),
    /// End the session (stop polling, forget user, token and notifications)
    Logout,
    /// Show the stored session
    Whoami,
    /// Poll pending notifications until Ctrl-C
    Poll(PollArgs),
    /// Simulate tapping a notification for a class
    Tap(TapArgs),
    /// Show the last fetched notification batch
    Notifications,
    /// Register a device push token with the backend
    RegisterToken(RegisterTokenArgs),
    /// Inspect CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// User id as issued by the backend
    #[arg(short, long)]
    pub user_id: String,
    /// API bearer token
    #[arg(short, long, env = "RITMOFIT_TOKEN")]
    pub token: String,
    /// Display name kept with the stored user
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(clap::Args)]
pub struct PollArgs {
    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
    /// Poll for this user instead of the stored one
    #[arg(short, long)]
    pub user_id: Option<String>,
}

#[derive(clap::Args)]
pub struct TapArgs {
    /// Class id carried by the notification
    pub clase_id: String,
    /// Reservation JSON embedded in the notification
    #[arg(long)]
    pub reserva: Option<String>,
}

#[derive(clap::Args)]
pub struct RegisterTokenArgs {
    /// Push token (e.g. ExponentPushToken[...])
    pub token: String,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show effective config
    Show,
}
