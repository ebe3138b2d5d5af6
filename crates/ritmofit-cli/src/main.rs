mod cli;
mod commands;
mod config;
mod console;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use config::AppConfig;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        // .env is optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    let cli = Cli::parse();

    let mut cfg = match config::loader::load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    };
    if let Some(base_url) = &cli.base_url {
        cfg.api.base_url = base_url.clone();
    }

    observability::init_tracing_with_level(&cfg.logging.level);

    if let Err(e) = run(&cli, &cfg).await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, cfg: &AppConfig) -> Result<()> {
    let format = cli.format.unwrap_or_default();

    match &cli.command {
        Commands::Login(args) => commands::session::login(cfg, args).await?,
        Commands::Logout => commands::session::logout(cfg).await?,
        Commands::Whoami => commands::session::whoami(cfg).await?,
        Commands::Poll(args) => commands::notifications::poll(cfg, args, format).await?,
        Commands::Tap(args) => commands::notifications::tap(cfg, args, format).await?,
        Commands::Notifications => commands::notifications::list(cfg, format).await?,
        Commands::RegisterToken(args) => {
            commands::notifications::register_token(cfg, &args.token).await?;
        }
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => match format {
                cli::OutputFormat::Json => output::print_json(cfg)?,
                cli::OutputFormat::Table => {
                    println!("{}: {}", "API".cyan(), cfg.api.base_url);
                    println!(
                        "{}: {}s",
                        "Request timeout".cyan(),
                        cfg.api.request_timeout_secs
                    );
                    println!("{}: {}s", "Poll interval".cyan(), cfg.polling.interval_secs);
                    println!(
                        "{}: {} ids, ttl {}s",
                        "Dedup window".cyan(),
                        cfg.polling.dedup_capacity,
                        cfg.polling.dedup_ttl_secs
                    );
                    println!("{}: {}", "Log level".cyan(), cfg.logging.level);
                    println!(
                        "{}: {}",
                        "Session file".cyan(),
                        cfg.session_path()?.display()
                    );
                }
            },
        },
    }

    Ok(())
}
